//! Token tree parsing.
//!
//! [`parse_tokens`] walks a decoded document depth-first in key order and
//! emits one [`Token`] per token node. Rules, applied to each key of a group:
//!
//! - `$`-prefixed keys are metadata and never become tokens. Under Draft,
//!   `$root` is an ordinary key.
//! - A root key (`$root` in 2025.10, a configured marker in Draft) yields a
//!   token at the enclosing group's own path. Its own children are parsed with
//!   that same path as their base.
//! - A node with `$value` (or with `$ref` in 2025.10) is a token. Its children
//!   are only parsed when one of them is a root key.
//! - Anything else is a group. In 2025.10 a group's `$extends` is recorded for
//!   the resolver.
//!
//! Group `$type` values are inherited by tokens that do not declare their own.
//!
//! ```rust
//! use dtls_core::parser::{parse_document, parse_tokens, ParseOptions, SourceFormat};
//! use dtls_core::SchemaVersion;
//!
//! let source = r##"{"color": {"primary": {
//!     "_": {"$value": "#ff0000", "$type": "color"},
//!     "hover": {"$value": "#cc0000"}
//! }}}"##;
//! let doc = parse_document(source, SourceFormat::Json, "tokens.json").unwrap();
//! let options = ParseOptions {
//!     version: SchemaVersion::Draft,
//!     group_markers: vec!["_".into()],
//!     ..Default::default()
//! };
//! let tree = parse_tokens(&doc, source, &options).unwrap();
//! let names: Vec<_> = tree.tokens.iter().map(|t| t.name.as_str()).collect();
//! assert_eq!(names, ["color-primary", "color-primary-hover"]);
//! ```

use std::io::Read;
use std::path::Path;

use json_comments::StripComments;
use serde_json::{Map, Value};

use crate::color::parse_color_value;
use crate::error::{Error, Result};
use crate::position::KeyLocator;
use crate::root::{default_group_markers, is_root_token, root_token_path, ROOT_KEY};
use crate::schema::SchemaVersion;
use crate::token::Token;

/// Options for a single parse.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub version: SchemaVersion,
    /// Legacy root markers, consulted only under Draft.
    pub group_markers: Vec<String>,
    /// CSS variable prefix applied to every token.
    pub prefix: String,
    pub file_path: String,
    pub definition_uri: String,
    /// Fail on the first malformed token instead of recording a warning.
    pub strict: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            version: SchemaVersion::Draft,
            group_markers: default_group_markers(),
            prefix: String::new(),
            file_path: String::new(),
            definition_uri: String::new(),
            strict: false,
        }
    }
}

/// A group that inherits from another through `$extends`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupExtension {
    pub group_path: Vec<String>,
    /// The raw `$extends` value, e.g. `#/button/base` or `{button.base}`.
    pub target: String,
}

/// Output of a parse.
#[derive(Debug, Clone, Default)]
pub struct TokenTree {
    pub tokens: Vec<Token>,
    pub extensions: Vec<GroupExtension>,
    /// Problems with individual tokens that did not abort the parse.
    pub warnings: Vec<Error>,
}

/// Document syntax of a token file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Yaml,
}

impl SourceFormat {
    /// YAML for `.yaml`/`.yml`, JSON otherwise (`.json`, `.jsonc` and the rest).
    pub fn from_path(path: &str) -> Self {
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                SourceFormat::Yaml
            }
            _ => SourceFormat::Json,
        }
    }
}

/// JSON text with `//` and `/* */` comments blanked out.
///
/// Comments become whitespace, so byte offsets into the result match the
/// input. Text the stripper rejects is returned unchanged for the JSON
/// decoder to report.
pub fn strip_json_comments(content: &str) -> String {
    let mut stripped = String::with_capacity(content.len());
    match StripComments::new(content.as_bytes()).read_to_string(&mut stripped) {
        Ok(_) => stripped,
        Err(_) => content.to_string(),
    }
}

/// Decodes a token document into a JSON object. JSON may carry comments.
pub fn parse_document(content: &str, format: SourceFormat, file_path: &str) -> Result<Map<String, Value>> {
    let value: Value = match format {
        SourceFormat::Json => serde_json::from_str(&strip_json_comments(content))
            .map_err(|e| Error::syntax(file_path, e.to_string()))?,
        SourceFormat::Yaml => {
            serde_yaml::from_str(content).map_err(|e| Error::syntax(file_path, e.to_string()))?
        }
    };
    match value {
        Value::Object(map) => Ok(map),
        // An empty YAML document decodes to null.
        Value::Null => Ok(Map::new()),
        _ => Err(Error::syntax(file_path, "top-level value must be an object")),
    }
}

/// Parses the tokens of a decoded document.
///
/// `source` is the original text and is only used to locate token keys.
pub fn parse_tokens(document: &Map<String, Value>, source: &str, options: &ParseOptions) -> Result<TokenTree> {
    let mut walker = Walker {
        options,
        locator: KeyLocator::new(source),
        tree: TokenTree::default(),
    };
    walker.walk_group(document, &[], None)?;
    tracing::debug!(
        file = %options.file_path,
        version = %options.version,
        tokens = walker.tree.tokens.len(),
        "parsed token tree"
    );
    Ok(walker.tree)
}

struct Walker<'a> {
    options: &'a ParseOptions,
    locator: KeyLocator<'a>,
    tree: TokenTree,
}

impl Walker<'_> {
    fn version(&self) -> SchemaVersion {
        self.options.version
    }

    fn is_root(&self, key: &str) -> bool {
        is_root_token(key, self.version(), &self.options.group_markers)
    }

    fn is_reserved(&self, key: &str) -> bool {
        key.starts_with('$') && !(key == ROOT_KEY && self.version() == SchemaVersion::Draft)
    }

    fn is_token_node(&self, node: &Map<String, Value>) -> bool {
        node.contains_key("$value")
            || (self.version() == SchemaVersion::V2025_10
                && node.get("$ref").is_some_and(Value::is_string))
    }

    fn walk_group(
        &mut self,
        group: &Map<String, Value>,
        path: &[String],
        inherited_type: Option<&str>,
    ) -> Result<()> {
        let group_type = group.get("$type").and_then(Value::as_str).or(inherited_type);

        for (key, value) in group {
            let Some(node) = value.as_object() else {
                continue;
            };

            if self.is_root(key) {
                let location = [path, std::slice::from_ref(key)].concat();
                if self.is_token_node(node) {
                    let token_path = root_token_path(path, key, self.version());
                    self.emit(token_path, &location, node, group_type)?;
                }
                self.walk_group(&children(node), path, group_type)?;
                continue;
            }

            if self.is_reserved(key) {
                continue;
            }

            let child_path = [path, std::slice::from_ref(key)].concat();
            if self.is_token_node(node) {
                self.emit(child_path.clone(), &child_path, node, group_type)?;
                // A token is a leaf; a root child would repeat its name.
                if let Some(root) = node.keys().find(|k| self.is_root(k)) {
                    let err = Error::malformed(
                        &self.options.file_path,
                        child_path.join("."),
                        format!("a token cannot also hold a root token, '{root}' is ignored"),
                    );
                    self.report(err)?;
                }
                continue;
            }

            if self.version() == SchemaVersion::V2025_10 {
                if let Some(target) = node.get("$extends").and_then(Value::as_str) {
                    self.tree.extensions.push(GroupExtension {
                        group_path: child_path.clone(),
                        target: target.to_string(),
                    });
                }
            }
            self.walk_group(node, &child_path, group_type)?;
        }
        Ok(())
    }

    fn emit(
        &mut self,
        path: Vec<String>,
        location: &[String],
        node: &Map<String, Value>,
        inherited_type: Option<&str>,
    ) -> Result<()> {
        let raw_value = match node.get("$value") {
            Some(value) => value.clone(),
            None => {
                let mut pointer = Map::new();
                if let Some(r) = node.get("$ref") {
                    pointer.insert("$ref".to_string(), r.clone());
                }
                Value::Object(pointer)
            }
        };

        let mut token = Token::new(path, raw_value, self.version());
        token.token_type = node
            .get("$type")
            .and_then(Value::as_str)
            .or(inherited_type)
            .map(str::to_string);
        token.description = node
            .get("$description")
            .and_then(Value::as_str)
            .map(str::to_string);
        match node.get("$deprecated") {
            Some(Value::Bool(deprecated)) => token.deprecated = *deprecated,
            Some(Value::String(message)) => {
                token.deprecated = true;
                token.deprecation_message = Some(message.clone());
            }
            _ => {}
        }
        token.extensions = node.get("$extensions").and_then(Value::as_object).cloned();
        token.prefix = self.options.prefix.clone();
        token.file_path = self.options.file_path.clone();
        token.definition_uri = self.options.definition_uri.clone();
        if let Some(pos) = self.locator.locate(location) {
            token.line = pos.line;
            token.character = pos.character;
        }

        self.check_color(&token)?;
        self.tree.tokens.push(token);
        Ok(())
    }

    /// Records or raises a malformed color value. Aliases are checked after
    /// resolution instead.
    fn check_color(&mut self, token: &Token) -> Result<()> {
        if !token.is_color() || is_alias_value(&token.raw_value) {
            return Ok(());
        }
        let Err(err) = parse_color_value(&token.raw_value, self.version()) else {
            return Ok(());
        };
        let err = with_token_path(err, &token.path.join("."), &self.options.file_path);
        self.report(err)
    }

    /// Fails in strict mode, otherwise records a warning and carries on.
    fn report(&mut self, err: Error) -> Result<()> {
        if self.options.strict {
            return Err(err);
        }
        tracing::warn!(error = %err, "malformed token");
        self.tree.warnings.push(err);
        Ok(())
    }
}

fn children(node: &Map<String, Value>) -> Map<String, Value> {
    node.iter()
        .filter(|(k, _)| !k.starts_with('$') || k.as_str() == ROOT_KEY)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn is_alias_value(value: &Value) -> bool {
    match value {
        Value::String(s) => crate::references::is_alias(s),
        Value::Object(obj) => obj.contains_key("$ref"),
        _ => false,
    }
}

fn with_token_path(err: Error, path: &str, file_path: &str) -> Error {
    match err {
        Error::InvalidColorFormat {
            schema,
            expected_format,
            found_format,
            ..
        } => Error::InvalidColorFormat {
            file_path: file_path.to_string(),
            token_path: path.to_string(),
            schema,
            expected_format,
            found_format,
        },
        Error::MalformedValue { reason, .. } => Error::malformed(file_path, path, reason),
        other => other.with_file_path(file_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn parse(source: &str, version: SchemaVersion) -> TokenTree {
        let doc = parse_document(source, SourceFormat::Json, "t.json").unwrap();
        let options = ParseOptions {
            version,
            file_path: "t.json".into(),
            ..Default::default()
        };
        parse_tokens(&doc, source, &options).unwrap()
    }

    fn names(tree: &TokenTree) -> Vec<&str> {
        tree.tokens.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn test_simple_tokens_and_metadata() {
        let source = r##"{
  "$schema": "https://www.designtokens.org/schemas/draft.json",
  "color": {
    "$type": "color",
    "primary": {
      "$value": "#ff0000",
      "$description": "Brand red",
      "$deprecated": "use color.brand",
      "$extensions": {"com.example": {"x": 1}}
    },
    "muted": {"$value": "#999", "$deprecated": true}
  },
  "size": {"sm": {"$type": "dimension", "$value": "4px"}}
}"##;
        let tree = parse(source, SchemaVersion::Draft);
        assert_eq!(names(&tree), ["color-muted", "color-primary", "size-sm"]);

        let primary = &tree.tokens[1];
        assert_eq!(primary.path, ["color", "primary"]);
        assert_eq!(primary.value, "#ff0000");
        assert_eq!(primary.token_type.as_deref(), Some("color"));
        assert_eq!(primary.description.as_deref(), Some("Brand red"));
        assert!(primary.deprecated);
        assert_eq!(primary.deprecation_message.as_deref(), Some("use color.brand"));
        assert!(primary.extensions.as_ref().unwrap().contains_key("com.example"));
        assert_eq!(primary.file_path, "t.json");
        assert_eq!((primary.line, primary.character), (4, 5));

        let muted = &tree.tokens[0];
        assert!(muted.deprecated);
        assert_eq!(muted.deprecation_message, None);
    }

    #[test]
    fn test_group_marker_in_draft() {
        let source = r##"{"color": {"primary": {
            "_": {"$value": "#ff0000", "$type": "color"},
            "hover": {"$value": "#cc0000"}
        }}}"##;
        let doc = parse_document(source, SourceFormat::Json, "").unwrap();
        let options = ParseOptions {
            group_markers: vec!["_".into()],
            ..Default::default()
        };
        let tree = parse_tokens(&doc, source, &options).unwrap();
        assert_eq!(names(&tree), ["color-primary", "color-primary-hover"]);
        assert_eq!(tree.tokens[0].path, ["color", "primary"]);
        assert_eq!(tree.tokens[0].value, "#ff0000");
        assert_eq!(tree.tokens[1].path, ["color", "primary", "hover"]);
        assert_eq!(tree.tokens[1].value, "#cc0000");
    }

    #[test]
    fn test_root_in_2025_matches_marker_in_draft() {
        let modern = r#"{"space": {"$root": {"$value": {"value": 4, "unit": "px"}}, "lg": {"$value": {"value": 8, "unit": "px"}}}}"#;
        let legacy = r#"{"space": {"DEFAULT": {"$value": {"value": 4, "unit": "px"}}, "lg": {"$value": {"value": 8, "unit": "px"}}}}"#;
        let a = parse(modern, SchemaVersion::V2025_10);
        let b = parse(legacy, SchemaVersion::Draft);
        assert_eq!(names(&a), names(&b));
        assert_eq!(names(&a), ["space", "space-lg"]);
    }

    #[test]
    fn test_root_key_is_ordinary_in_draft() {
        let tree = parse(r#"{"g": {"$root": {"$value": 1}}}"#, SchemaVersion::Draft);
        assert_eq!(names(&tree), ["g-$root"]);
    }

    #[test]
    fn test_marker_ignored_in_2025() {
        let tree = parse(r#"{"g": {"_": {"$value": 1}}}"#, SchemaVersion::V2025_10);
        assert_eq!(names(&tree), ["g-_"]);
    }

    #[test]
    fn test_schema_never_a_token() {
        let tree = parse(
            r#"{"$schema": "x", "g": {"$schema": {"$value": 1}, "a": {"$value": 2}}}"#,
            SchemaVersion::V2025_10,
        );
        assert_eq!(names(&tree), ["g-a"]);
    }

    #[test]
    fn test_token_children_not_traversed() {
        let tree = parse(
            r#"{"a": {"$value": 1, "b": {"$value": 2}}}"#,
            SchemaVersion::Draft,
        );
        assert_eq!(names(&tree), ["a"]);
    }

    #[test]
    fn test_root_child_of_token_is_not_a_second_token() {
        let source = r#"{"a": {"$value": "1px", "_": {"$value": "2px"}, "b": {"$value": "3px"}}}"#;
        let doc = parse_document(source, SourceFormat::Json, "t.json").unwrap();
        let mut options = ParseOptions {
            version: SchemaVersion::Draft,
            file_path: "t.json".into(),
            group_markers: vec!["_".into()],
            ..Default::default()
        };
        let tree = parse_tokens(&doc, source, &options).unwrap();
        let found: Vec<_> = tree
            .tokens
            .iter()
            .map(|t| (t.name.as_str(), t.value.as_str()))
            .collect();
        assert_eq!(found, [("a", "1px")]);
        assert_eq!(tree.warnings.len(), 1);
        assert_eq!(tree.warnings[0].kind(), ErrorKind::MalformedValue);

        options.strict = true;
        let err = parse_tokens(&doc, source, &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedValue);
    }

    #[test]
    fn test_pointer_token_in_2025() {
        let source = r##"{"color": {
            "primary": {"$type": "color", "$value": {"colorSpace": "srgb", "components": [1, 0, 0]}},
            "secondary": {"$type": "color", "$ref": "#/color/primary"}
        }}"##;
        let tree = parse(source, SchemaVersion::V2025_10);
        assert_eq!(names(&tree), ["color-primary", "color-secondary"]);
        let secondary = &tree.tokens[1];
        assert_eq!(secondary.raw_value, serde_json::json!({"$ref": "#/color/primary"}));
        assert_eq!(secondary.value, "#/color/primary");
        assert!(tree.warnings.is_empty());
    }

    #[test]
    fn test_extends_recorded_in_2025_only() {
        let source = r##"{
            "button": {"base": {"pad": {"$value": 1}}, "primary": {"$extends": "#/button/base", "bg": {"$value": 2}}}
        }"##;
        let tree = parse(source, SchemaVersion::V2025_10);
        assert_eq!(
            tree.extensions,
            vec![GroupExtension {
                group_path: vec!["button".into(), "primary".into()],
                target: "#/button/base".into()
            }]
        );
        assert!(parse(source, SchemaVersion::Draft).extensions.is_empty());
    }

    #[test]
    fn test_malformed_color_is_warning() {
        let source = r#"{"a": {"$type": "color", "$value": {"colorSpace": "srgb"}}, "b": {"$value": 1}}"#;
        let tree = parse(source, SchemaVersion::V2025_10);
        assert_eq!(tree.tokens.len(), 2);
        assert_eq!(tree.warnings.len(), 1);
        assert_eq!(tree.warnings[0].kind(), ErrorKind::MalformedValue);
        assert!(tree.warnings[0].to_string().contains("'a'"));
    }

    #[test]
    fn test_malformed_color_strict() {
        let source = r#"{"a": {"$type": "color", "$value": {"colorSpace": "srgb"}}}"#;
        let doc = parse_document(source, SourceFormat::Json, "").unwrap();
        let options = ParseOptions {
            version: SchemaVersion::V2025_10,
            strict: true,
            ..Default::default()
        };
        let err = parse_tokens(&doc, source, &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedValue);
    }

    #[test]
    fn test_yaml_document() {
        let source = "color:\n  primary:\n    $type: color\n    $value: '#f00'\n";
        let doc = parse_document(source, SourceFormat::Yaml, "t.yaml").unwrap();
        let tree = parse_tokens(&doc, source, &ParseOptions::default()).unwrap();
        assert_eq!(names(&tree), ["color-primary"]);
        assert_eq!((tree.tokens[0].line, tree.tokens[0].character), (1, 2));
    }

    #[test]
    fn test_syntax_errors() {
        let err = parse_document("{", SourceFormat::Json, "a.json").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert_eq!(err.file_path(), "a.json");
        let err = parse_document("a: [", SourceFormat::Yaml, "a.yaml").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert!(parse_document("[]", SourceFormat::Json, "").is_err());
    }

    #[test]
    fn test_json_comments_are_accepted() {
        let source = "{\n  // brand\n  \"a\": {\"$value\": \"1px\"}, /* \"b\": {} */\n  \"b\": {\"$value\": 2}\n}";
        let doc = parse_document(source, SourceFormat::Json, "t.jsonc").unwrap();
        assert_eq!(doc.len(), 2);
        let stripped = strip_json_comments(source);
        assert_eq!(stripped.len(), source.len());
        assert!(!stripped.contains("brand"));
    }

    #[test]
    fn test_source_format_from_path() {
        assert_eq!(SourceFormat::from_path("a/tokens.YAML"), SourceFormat::Yaml);
        assert_eq!(SourceFormat::from_path("tokens.yml"), SourceFormat::Yaml);
        assert_eq!(SourceFormat::from_path("tokens.json"), SourceFormat::Json);
        assert_eq!(SourceFormat::from_path("tokens"), SourceFormat::Json);
    }
}
