//! The token model and a multi-file token set.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Error;
use crate::schema::SchemaVersion;

/// A design token parsed from a token file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    /// Dash-joined path, e.g. `color-primary`.
    pub name: String,
    /// Raw key segments from the document root. Root markers are not included.
    pub path: Vec<String>,
    /// Display string of `raw_value`.
    pub value: String,
    /// The `$value` as written, or the `{"$ref": ..}` object for pointer aliases.
    pub raw_value: Value,
    pub resolved_value: Option<Value>,
    pub is_resolved: bool,
    #[serde(rename = "type")]
    pub token_type: Option<String>,
    pub description: Option<String>,
    pub deprecated: bool,
    pub deprecation_message: Option<String>,
    pub extensions: Option<Map<String, Value>>,
    pub schema_version: SchemaVersion,
    pub definition_uri: String,
    pub file_path: String,
    /// Zero-based line of the token's key.
    pub line: u32,
    /// UTF-16 column of the token's key.
    pub character: u32,
    /// CSS variable prefix, without dashes.
    pub prefix: String,
}

impl Token {
    pub fn new(path: Vec<String>, raw_value: Value, schema_version: SchemaVersion) -> Self {
        Self {
            name: path.join("-"),
            value: display_value(&raw_value),
            path,
            raw_value,
            resolved_value: None,
            is_resolved: false,
            token_type: None,
            description: None,
            deprecated: false,
            deprecation_message: None,
            extensions: None,
            schema_version,
            definition_uri: String::new(),
            file_path: String::new(),
            line: 0,
            character: 0,
            prefix: String::new(),
        }
    }

    /// `--prefix-name`, or `--name` without a prefix.
    pub fn css_variable_name(&self) -> String {
        if self.prefix.is_empty() {
            format!("--{}", self.name)
        } else {
            format!("--{}-{}", self.prefix, self.name)
        }
    }

    /// Curly-brace reference that points at this token.
    pub fn reference(&self) -> String {
        format!("{{{}}}", self.path.join("."))
    }

    /// The resolved value when available, otherwise the raw value.
    pub fn effective_value(&self) -> &Value {
        self.resolved_value.as_ref().unwrap_or(&self.raw_value)
    }

    /// Display string of [`effective_value`](Token::effective_value).
    pub fn display_value(&self) -> String {
        display_value(self.effective_value())
    }

    pub fn is_color(&self) -> bool {
        self.token_type.as_deref() == Some("color")
    }
}

/// Strings render bare; everything else renders as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(obj) => match obj.get("$ref").and_then(Value::as_str) {
            Some(pointer) => pointer.to_string(),
            None => value.to_string(),
        },
        other => other.to_string(),
    }
}

/// Tokens from several files.
///
/// Names are unique within a file. When two files define the same name, the
/// file added most recently wins an unqualified lookup; [`TokenSet::get_qualified`]
/// reaches a specific file's token.
#[derive(Debug, Default, Clone)]
pub struct TokenSet {
    files: Vec<(String, Vec<Token>)>,
    index: HashMap<String, (usize, usize)>,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the tokens of `file_path`, replacing any it already had.
    pub fn add_file(&mut self, file_path: impl Into<String>, tokens: Vec<Token>) {
        let file_path = file_path.into();
        self.files.retain(|(path, _)| *path != file_path);
        self.files.push((file_path, tokens));
        self.reindex();
    }

    /// Removes the tokens of `file_path` and returns how many there were.
    pub fn remove_file(&mut self, file_path: &str) -> usize {
        let Some(pos) = self.files.iter().position(|(path, _)| path == file_path) else {
            return 0;
        };
        let (_, removed) = self.files.remove(pos);
        self.reindex();
        removed.len()
    }

    pub fn clear(&mut self) {
        self.files.clear();
        self.index.clear();
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (f, (_, tokens)) in self.files.iter().enumerate() {
            for (t, token) in tokens.iter().enumerate() {
                self.index.insert(token.name.clone(), (f, t));
                self.index.insert(token.css_variable_name(), (f, t));
            }
        }
    }

    /// Looks up a token by dash name, dotted path or CSS variable name.
    pub fn get(&self, name: &str) -> Option<&Token> {
        let lookup = |key: &str| {
            self.index
                .get(key)
                .map(|&(f, t)| &self.files[f].1[t])
        };
        lookup(name)
            .or_else(|| lookup(&name.replace('.', "-")))
            .or_else(|| name.strip_prefix("--").and_then(|n| lookup(n)))
    }

    /// Looks up a token within one file.
    pub fn get_qualified(&self, file_path: &str, name: &str) -> Option<&Token> {
        self.files
            .iter()
            .find(|(path, _)| path == file_path)?
            .1
            .iter()
            .find(|t| t.name == name || t.css_variable_name() == name)
    }

    /// All tokens in load order.
    pub fn all(&self) -> impl Iterator<Item = &Token> {
        self.files.iter().flat_map(|(_, tokens)| tokens.iter())
    }

    pub fn by_schema_version(&self, version: SchemaVersion) -> Vec<&Token> {
        self.all().filter(|t| t.schema_version == version).collect()
    }

    pub fn by_source_file(&self, file_path: &str) -> Vec<&Token> {
        self.all().filter(|t| t.file_path == file_path).collect()
    }

    /// Tokens whose name starts with `prefix`.
    pub fn find_by_prefix(&self, prefix: &str) -> Vec<&Token> {
        self.all().filter(|t| t.name.starts_with(prefix)).collect()
    }

    pub fn source_files(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|(path, _)| path.as_str())
    }

    pub fn schema_version_for_file(&self, file_path: &str) -> SchemaVersion {
        self.by_source_file(file_path)
            .first()
            .map(|t| t.schema_version)
            .unwrap_or_default()
    }

    /// Resolves aliases across all files, starting over from raw values.
    ///
    /// A reference to a name defined in several files binds to the most
    /// recently added one. Tokens that cannot be resolved are kept with no
    /// resolved value; every other token resolves. The returned errors each
    /// name the file of the token they are about.
    pub fn resolve_aliases(&mut self) -> Vec<Error> {
        let counts: Vec<usize> = self.files.iter().map(|(_, tokens)| tokens.len()).collect();
        let mut all: Vec<Token> = self
            .files
            .iter_mut()
            .flat_map(|(_, tokens)| tokens.drain(..))
            .collect();
        for token in &mut all {
            token.resolved_value = None;
            token.is_resolved = false;
        }

        let errors = crate::resolver::resolve_aliases_partial(&mut all, "");

        let mut rest = all.into_iter();
        for ((_, tokens), count) in self.files.iter_mut().zip(counts) {
            tokens.extend(rest.by_ref().take(count));
        }
        errors
    }

    pub fn len(&self) -> usize {
        self.files.iter().map(|(_, tokens)| tokens.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
