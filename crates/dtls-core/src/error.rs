//! Error types for token file processing.
//!
//! Every error carries the path of the file it was raised for (empty when the
//! caller has not supplied one yet) and, where the failure is actionable, a
//! `Suggestion:` line as part of its display text.
//!
//! Callers that only need to classify an error compare [`Error::kind`] against
//! an [`ErrorKind`]:
//!
//! ```rust
//! use dtls_core::{detect_version, ErrorKind};
//!
//! let err = detect_version("{ not json", None).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::SchemaDetectionFailed);
//! ```

use thiserror::Error;

use crate::schema::SchemaVersion;

/// Errors raised while detecting, validating, parsing or resolving token files.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Content could not be decoded at all, so no version could be chosen.
    #[error(
        "failed to detect schema version for {file_path}: {reason}\nSuggestion: Add explicit $schema field to the file"
    )]
    SchemaDetectionFailed { file_path: String, reason: String },

    /// Unrecognized `$schema` value, or a construct illegal for the declared version.
    #[error("invalid schema {schema} in {file_path}: {reason}")]
    InvalidSchema {
        file_path: String,
        schema: String,
        reason: String,
    },

    /// Constructs from another schema version were found.
    #[error(
        "file {file_path} declares schema '{declared_schema}' but contains features from other schema versions: {}\nSuggestion: Remove incompatible features or update $schema field",
        .conflicting_features.join(", ")
    )]
    MixedSchemaFeatures {
        file_path: String,
        declared_schema: String,
        conflicting_features: Vec<String>,
    },

    /// A group declares both `$root` and a legacy group marker.
    #[error(
        "file {file_path} has conflicting root tokens in group '{group_path}': both '{root_token}' and '{marker}' found\nSuggestion: Use only $root for 2025.10+ schemas, or only groupMarkers for draft schemas"
    )]
    ConflictingRootTokens {
        file_path: String,
        group_path: String,
        root_token: String,
        marker: String,
    },

    /// A color value has the wrong shape for its schema version.
    #[error(
        "invalid color format for token '{token_path}' in {file_path}: schema '{schema}' expects {expected_format}, but found {found_format}\nSuggestion: Convert color value to match schema version, or update $schema field"
    )]
    InvalidColorFormat {
        file_path: String,
        token_path: String,
        schema: String,
        expected_format: String,
        found_format: String,
    },

    /// An alias or `$extends` chain revisits a node. The chain starts and ends
    /// with the repeated name.
    #[error(
        "circular reference detected in {file_path}: {}\nSuggestion: Break the circular dependency chain",
        .chain.join(" → ")
    )]
    CircularReference { file_path: String, chain: Vec<String> },

    /// A reference points at a token or group that does not exist.
    #[error(
        "unresolved reference in {file_path}: '{token}' references '{target}', which is not defined\nSuggestion: Define the referenced token or correct the reference path"
    )]
    UnresolvedReference {
        file_path: String,
        token: String,
        target: String,
    },

    /// A value has the expected shape but is missing required parts.
    #[error("malformed value for '{token_path}' in {file_path}: {reason}")]
    MalformedValue {
        file_path: String,
        token_path: String,
        reason: String,
    },

    /// No handler has been registered for the requested version.
    #[error("no handler registered for schema version {version}")]
    NoHandler { version: SchemaVersion },

    /// JSON or YAML syntax error.
    #[error("failed to parse {file_path}: {message}")]
    Syntax { file_path: String, message: String },

    /// The file could not be read.
    #[error("failed to read {file_path}: {message}")]
    Io { file_path: String, message: String },
}

/// Fieldless classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    SchemaDetectionFailed,
    InvalidSchema,
    MixedSchemaFeatures,
    ConflictingRootTokens,
    InvalidColorFormat,
    CircularReference,
    UnresolvedReference,
    MalformedValue,
    NoHandler,
    Syntax,
    Io,
}

impl Error {
    pub fn detection_failed(file_path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaDetectionFailed {
            file_path: file_path.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_schema(
        file_path: impl Into<String>,
        schema: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidSchema {
            file_path: file_path.into(),
            schema: schema.into(),
            reason: reason.into(),
        }
    }

    pub fn mixed_features(
        file_path: impl Into<String>,
        declared: SchemaVersion,
        features: Vec<String>,
    ) -> Self {
        Self::MixedSchemaFeatures {
            file_path: file_path.into(),
            declared_schema: declared.to_string(),
            conflicting_features: features,
        }
    }

    pub fn conflicting_roots(
        file_path: impl Into<String>,
        group_path: impl Into<String>,
        root_token: impl Into<String>,
        marker: impl Into<String>,
    ) -> Self {
        Self::ConflictingRootTokens {
            file_path: file_path.into(),
            group_path: group_path.into(),
            root_token: root_token.into(),
            marker: marker.into(),
        }
    }

    pub fn invalid_color(
        file_path: impl Into<String>,
        token_path: impl Into<String>,
        schema: SchemaVersion,
        expected_format: impl Into<String>,
        found_format: impl Into<String>,
    ) -> Self {
        Self::InvalidColorFormat {
            file_path: file_path.into(),
            token_path: token_path.into(),
            schema: schema.to_string(),
            expected_format: expected_format.into(),
            found_format: found_format.into(),
        }
    }

    pub fn circular(file_path: impl Into<String>, chain: Vec<String>) -> Self {
        Self::CircularReference {
            file_path: file_path.into(),
            chain,
        }
    }

    pub fn unresolved(
        file_path: impl Into<String>,
        token: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self::UnresolvedReference {
            file_path: file_path.into(),
            token: token.into(),
            target: target.into(),
        }
    }

    pub fn malformed(
        file_path: impl Into<String>,
        token_path: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedValue {
            file_path: file_path.into(),
            token_path: token_path.into(),
            reason: reason.into(),
        }
    }

    pub fn syntax(file_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Syntax {
            file_path: file_path.into(),
            message: message.into(),
        }
    }

    pub fn io(file_path: impl Into<String>, err: &std::io::Error) -> Self {
        Self::Io {
            file_path: file_path.into(),
            message: err.to_string(),
        }
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::SchemaDetectionFailed { .. } => ErrorKind::SchemaDetectionFailed,
            Error::InvalidSchema { .. } => ErrorKind::InvalidSchema,
            Error::MixedSchemaFeatures { .. } => ErrorKind::MixedSchemaFeatures,
            Error::ConflictingRootTokens { .. } => ErrorKind::ConflictingRootTokens,
            Error::InvalidColorFormat { .. } => ErrorKind::InvalidColorFormat,
            Error::CircularReference { .. } => ErrorKind::CircularReference,
            Error::UnresolvedReference { .. } => ErrorKind::UnresolvedReference,
            Error::MalformedValue { .. } => ErrorKind::MalformedValue,
            Error::NoHandler { .. } => ErrorKind::NoHandler,
            Error::Syntax { .. } => ErrorKind::Syntax,
            Error::Io { .. } => ErrorKind::Io,
        }
    }

    /// Returns the actionable hint for this error, if it has one.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::SchemaDetectionFailed { .. } => Some("Add explicit $schema field to the file"),
            Error::MixedSchemaFeatures { .. } => {
                Some("Remove incompatible features or update $schema field")
            }
            Error::ConflictingRootTokens { .. } => Some(
                "Use only $root for 2025.10+ schemas, or only groupMarkers for draft schemas",
            ),
            Error::InvalidColorFormat { .. } => {
                Some("Convert color value to match schema version, or update $schema field")
            }
            Error::CircularReference { .. } => Some("Break the circular dependency chain"),
            Error::UnresolvedReference { .. } => {
                Some("Define the referenced token or correct the reference path")
            }
            _ => None,
        }
    }

    /// Returns the file path the error was raised for.
    pub fn file_path(&self) -> &str {
        match self {
            Error::SchemaDetectionFailed { file_path, .. }
            | Error::InvalidSchema { file_path, .. }
            | Error::MixedSchemaFeatures { file_path, .. }
            | Error::ConflictingRootTokens { file_path, .. }
            | Error::InvalidColorFormat { file_path, .. }
            | Error::CircularReference { file_path, .. }
            | Error::UnresolvedReference { file_path, .. }
            | Error::MalformedValue { file_path, .. }
            | Error::Syntax { file_path, .. }
            | Error::Io { file_path, .. } => file_path,
            Error::NoHandler { .. } => "",
        }
    }

    /// Fills in the file path if the error was raised without one.
    pub fn with_file_path(mut self, path: &str) -> Self {
        match &mut self {
            Error::SchemaDetectionFailed { file_path, .. }
            | Error::InvalidSchema { file_path, .. }
            | Error::MixedSchemaFeatures { file_path, .. }
            | Error::ConflictingRootTokens { file_path, .. }
            | Error::InvalidColorFormat { file_path, .. }
            | Error::CircularReference { file_path, .. }
            | Error::UnresolvedReference { file_path, .. }
            | Error::MalformedValue { file_path, .. }
            | Error::Syntax { file_path, .. }
            | Error::Io { file_path, .. } => {
                if file_path.is_empty() {
                    *file_path = path.to_string();
                }
            }
            Error::NoHandler { .. } => {}
        }
        self
    }
}

/// Result type for token file operations.
pub type Result<T> = std::result::Result<T, Error>;
