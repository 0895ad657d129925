//! Loading a whole token file.
//!
//! [`TokenFile::load`] runs the full pipeline over one file's content:
//! decode, choose a version, validate, parse, then resolve. Validation errors
//! stop the load; nothing from an invalid file is returned.
//!
//! ```rust
//! use dtls_core::{LoadOptions, SchemaVersion, TokenFile};
//!
//! let content = r##"{
//!   "$schema": "https://www.designtokens.org/schemas/2025.10.json",
//!   "color": {
//!     "primary": {"$type": "color", "$value": {"colorSpace": "srgb", "components": [1, 0, 0]}},
//!     "secondary": {"$type": "color", "$ref": "#/color/primary"}
//!   }
//! }"##;
//! let file = TokenFile::load("tokens.json", content, &LoadOptions::default()).unwrap();
//! assert_eq!(file.schema_version, SchemaVersion::V2025_10);
//! assert_eq!(file.tokens[0].resolved_value, file.tokens[1].resolved_value);
//! ```

use std::borrow::Cow;
use std::path::Path;

use crate::error::{Error, Result};
use crate::parser::{parse_document, parse_tokens, strip_json_comments, ParseOptions, SourceFormat};
use crate::resolver::{resolve_aliases, resolve_extends};
use crate::root::default_group_markers;
use crate::schema::{declared_version, detect_version_in, validate_document, DetectionConfig, SchemaVersion};
use crate::token::Token;

/// Options for [`TokenFile::load`].
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Version assumed when the file declares none. `Unknown` defers to duck typing.
    pub default_version: SchemaVersion,
    /// Version forced for files that declare none, ahead of detection.
    pub version_override: Option<SchemaVersion>,
    pub group_markers: Vec<String>,
    pub prefix: String,
    pub definition_uri: String,
    /// Resolve aliases within the file. Callers that resolve across several
    /// files turn this off and resolve the combined set instead.
    pub resolve_aliases: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            default_version: SchemaVersion::Unknown,
            version_override: None,
            group_markers: default_group_markers(),
            prefix: String::new(),
            definition_uri: String::new(),
            resolve_aliases: true,
        }
    }
}

/// The tokens of one loaded file.
#[derive(Debug, Clone)]
pub struct TokenFile {
    pub file_path: String,
    pub schema_version: SchemaVersion,
    pub tokens: Vec<Token>,
    /// Problems with single tokens that did not stop the load.
    pub warnings: Vec<Error>,
}

impl TokenFile {
    /// Loads a token file from its content.
    pub fn load(file_path: &str, content: &str, options: &LoadOptions) -> Result<Self> {
        let format = SourceFormat::from_path(file_path);
        let document = parse_document(content, format, file_path)?;

        let schema_version = declared_version(&document)
            .or(options.version_override)
            .unwrap_or_else(|| {
                let config = DetectionConfig {
                    default_version: options.default_version,
                };
                detect_version_in(&document, Some(&config))
            });

        validate_document(file_path, &document, schema_version, &options.group_markers)?;

        let parse_options = ParseOptions {
            version: schema_version,
            group_markers: options.group_markers.clone(),
            prefix: options.prefix.clone(),
            file_path: file_path.to_string(),
            definition_uri: options.definition_uri.clone(),
            strict: false,
        };
        // Keys are located in the text the decoder saw.
        let source = match format {
            SourceFormat::Json => Cow::Owned(strip_json_comments(content)),
            SourceFormat::Yaml => Cow::Borrowed(content),
        };
        let tree = parse_tokens(&document, &source, &parse_options)?;

        let mut tokens = tree.tokens;
        if options.resolve_aliases {
            resolve_aliases(&mut tokens, file_path)?;
        }
        resolve_extends(&mut tokens, &tree.extensions, file_path)?;

        tracing::info!(
            file = %file_path,
            version = %schema_version,
            tokens = tokens.len(),
            warnings = tree.warnings.len(),
            "token file loaded"
        );

        Ok(Self {
            file_path: file_path.to_string(),
            schema_version,
            tokens,
            warnings: tree.warnings,
        })
    }

    /// Reads and loads a token file from disk.
    pub fn from_path(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Self> {
        let path = path.as_ref();
        let file_path = path.to_string_lossy();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(file_path.as_ref(), &e))?;
        Self::load(&file_path, &content, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_declared_schema_beats_override() {
        let content = r#"{"$schema": "https://www.designtokens.org/schemas/draft.json", "a": {"$value": 1}}"#;
        let options = LoadOptions {
            version_override: Some(SchemaVersion::V2025_10),
            ..Default::default()
        };
        let file = TokenFile::load("t.json", content, &options).unwrap();
        assert_eq!(file.schema_version, SchemaVersion::Draft);
    }

    #[test]
    fn test_override_beats_detection() {
        let content = r#"{"a": {"$value": 1}}"#;
        let options = LoadOptions {
            version_override: Some(SchemaVersion::V2025_10),
            default_version: SchemaVersion::Draft,
            ..Default::default()
        };
        let file = TokenFile::load("t.json", content, &options).unwrap();
        assert_eq!(file.schema_version, SchemaVersion::V2025_10);
        assert_eq!(file.tokens[0].schema_version, SchemaVersion::V2025_10);
    }

    #[test]
    fn test_commented_json_locates_keys_past_comments() {
        let content = "{\n  // \"a\": {\"$value\": 0}\n  \"a\": {\"$value\": 1} /* } */\n}";
        let file = TokenFile::load("t.jsonc", content, &LoadOptions::default()).unwrap();
        assert_eq!(file.tokens.len(), 1);
        assert_eq!((file.tokens[0].line, file.tokens[0].character), (2, 3));
    }

    #[test]
    fn test_validation_failure_stops_load() {
        let content = r##"{
            "$schema": "https://www.designtokens.org/schemas/draft.json",
            "a": {"$value": 1},
            "b": {"$ref": "#/a"}
        }"##;
        let err = TokenFile::load("t.json", content, &LoadOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MixedSchemaFeatures);
        assert_eq!(err.file_path(), "t.json");
    }

    #[test]
    fn test_options_flow_into_tokens() {
        let content = r#"{"a": {"b": {"$value": "{a.c}"}, "c": {"$value": "1px"}}}"#;
        let options = LoadOptions {
            prefix: "ds".into(),
            definition_uri: "file:///t.json".into(),
            resolve_aliases: false,
            ..Default::default()
        };
        let file = TokenFile::load("t.json", content, &options).unwrap();
        let b = &file.tokens[0];
        assert_eq!(b.css_variable_name(), "--ds-a-b");
        assert_eq!(b.definition_uri, "file:///t.json");
        assert!(!b.is_resolved);
    }

    #[test]
    fn test_missing_file() {
        let err = TokenFile::from_path("/definitely/not/here.json", &LoadOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(err.file_path(), "/definitely/not/here.json");
    }
}
