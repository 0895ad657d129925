//! Server configuration.
//!
//! Clients send settings either in `initializationOptions` or through
//! `workspace/didChangeConfiguration`, nested under `designTokensLanguageServer`
//! or at the top level:
//!
//! ```json
//! {
//!   "designTokensLanguageServer": {
//!     "tokensFiles": ["./tokens.json", {"path": "~/brand.yaml", "prefix": "brand"}],
//!     "prefix": "ds",
//!     "groupMarkers": ["_", "DEFAULT"],
//!     "defaultSchema": "draft"
//!   }
//! }
//! ```

use std::path::{Path, PathBuf};

use dtls_core::root::default_group_markers;
use dtls_core::{LoadOptions, SchemaVersion};
use serde::Deserialize;
use serde_json::Value;

/// Settings section name used by clients.
pub const SECTION: &str = "designTokensLanguageServer";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub tokens_files: Vec<TokenFileSpec>,
    /// Global CSS variable prefix; a file spec may override it.
    pub prefix: String,
    pub group_markers: Vec<String>,
    /// Schema version or URL assumed for files without `$schema`.
    pub default_schema: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tokens_files: Vec::new(),
            prefix: String::new(),
            group_markers: default_group_markers(),
            default_schema: None,
        }
    }
}

/// A configured token file: a bare path or a path with overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TokenFileSpec {
    Path(String),
    #[serde(rename_all = "camelCase")]
    Detailed {
        path: String,
        prefix: Option<String>,
        group_markers: Option<Vec<String>>,
    },
}

impl TokenFileSpec {
    pub fn path(&self) -> &str {
        match self {
            TokenFileSpec::Path(path) | TokenFileSpec::Detailed { path, .. } => path,
        }
    }
}

impl ServerConfig {
    /// Reads settings from a client payload. `null` yields the defaults.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(mut obj) => match obj.remove(SECTION) {
                Some(section) => serde_json::from_value(section),
                None => serde_json::from_value(Value::Object(obj)),
            },
            other => serde_json::from_value(other),
        }
    }

    /// The configured default schema, or `Unknown` when unset or unrecognized.
    pub fn default_version(&self) -> SchemaVersion {
        let Some(schema) = self.default_schema.as_deref() else {
            return SchemaVersion::Unknown;
        };
        SchemaVersion::from_identifier(schema).unwrap_or_else(|err| {
            tracing::warn!(%schema, error = %err, "ignoring unrecognized defaultSchema");
            SchemaVersion::Unknown
        })
    }

    /// Load options for one configured file.
    pub fn load_options(&self, spec: &TokenFileSpec) -> LoadOptions {
        let (prefix, group_markers) = match spec {
            TokenFileSpec::Path(_) => (None, None),
            TokenFileSpec::Detailed {
                prefix,
                group_markers,
                ..
            } => (prefix.clone(), group_markers.clone()),
        };
        LoadOptions {
            default_version: self.default_version(),
            group_markers: group_markers
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| self.group_markers.clone()),
            prefix: prefix.unwrap_or_else(|| self.prefix.clone()),
            // Aliases may point into other files; the loader resolves the whole set.
            resolve_aliases: false,
            ..LoadOptions::default()
        }
    }
}

/// Resolves a configured path: `~/` against `HOME`, relative paths against
/// the workspace root.
pub fn resolve_path(path: &str, root: Option<&Path>) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    let path = Path::new(path);
    match root {
        Some(root) if path.is_relative() => root.join(path),
        _ => path.to_path_buf(),
    }
}
