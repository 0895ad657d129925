//! Schema version detection.
//!
//! Detection is a strict cascade; the first step that yields a version wins:
//!
//! 1. Content must parse as a JSON object, otherwise detection fails.
//! 2. A top-level `$schema` naming a known schema URL.
//! 3. The configured default version, unless it is `Unknown`.
//! 4. Duck typing: any `$ref`, `$extends`, `resolutionOrder` or structured
//!    color value anywhere in the tree means 2025.10.
//! 5. Draft.
//!
//! Ambiguous content is never an error; it falls back to Draft.
//!
//! ```rust
//! use dtls_core::{detect_version, DetectionConfig, SchemaVersion};
//!
//! let content = r##"{"color": {"a": {"$type": "color", "$value": "#fff"}}}"##;
//! assert_eq!(detect_version(content, None).unwrap(), SchemaVersion::Draft);
//!
//! let config = DetectionConfig { default_version: SchemaVersion::V2025_10 };
//! assert_eq!(detect_version(content, Some(&config)).unwrap(), SchemaVersion::V2025_10);
//! ```

use serde_json::{Map, Value};

use super::validation::{contains_key, has_structured_color, validate_document};
use super::version::SchemaVersion;
use crate::error::{Error, Result};
use crate::parser::strip_json_comments;
use crate::root::DEFAULT_GROUP_MARKERS;

/// Options that influence detection when a file does not declare `$schema`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectionConfig {
    /// Version to assume before falling back to duck typing.
    pub default_version: SchemaVersion,
}

/// Detects the schema version of raw JSON content.
pub fn detect_version(content: &str, config: Option<&DetectionConfig>) -> Result<SchemaVersion> {
    let root = parse_object(content)?;
    Ok(detect_version_in(&root, config))
}

/// Detects the schema version of an already decoded document.
pub fn detect_version_in(root: &Map<String, Value>, config: Option<&DetectionConfig>) -> SchemaVersion {
    if let Some(version) = declared_version(root) {
        tracing::debug!(%version, "schema declared by $schema");
        return version;
    }

    if let Some(config) = config.filter(|c| c.default_version != SchemaVersion::Unknown) {
        tracing::debug!(version = %config.default_version, "schema taken from configuration");
        return config.default_version;
    }

    let version = duck_type(root).unwrap_or(SchemaVersion::Draft);
    tracing::debug!(%version, "schema inferred from content");
    version
}

/// Returns the version named by a top-level `$schema`, if it is a known URL.
///
/// An unrecognized URL is ignored here; detection continues down the cascade.
pub fn declared_version(root: &Map<String, Value>) -> Option<SchemaVersion> {
    root.get("$schema")
        .and_then(Value::as_str)
        .and_then(|url| SchemaVersion::from_url(url).ok())
}

/// Detects the version and validates the content against it.
///
/// The detected version is returned even when validation fails, so callers can
/// report both. A detection failure yields `Unknown` together with the error.
pub fn detect_version_with_validation(
    file_path: &str,
    content: &str,
    config: Option<&DetectionConfig>,
) -> (SchemaVersion, Result<()>) {
    let root = match parse_object(content) {
        Ok(root) => root,
        Err(err) => return (SchemaVersion::Unknown, Err(err.with_file_path(file_path))),
    };
    let version = detect_version_in(&root, config);
    let validation = validate_document(file_path, &root, version, DEFAULT_GROUP_MARKERS);
    (version, validation)
}

fn duck_type(root: &Map<String, Value>) -> Option<SchemaVersion> {
    let signals = ["$ref", "$extends", "resolutionOrder"];
    if signals.iter().any(|key| contains_key(root, key)) || has_structured_color(root) {
        return Some(SchemaVersion::V2025_10);
    }
    None
}

pub(crate) fn parse_object(content: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(&strip_json_comments(content)) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(Error::detection_failed(
            "",
            "invalid JSON: top-level value must be an object",
        )),
        Err(e) => Err(Error::detection_failed("", format!("invalid JSON: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn detect(content: &str) -> SchemaVersion {
        detect_version(content, None).unwrap()
    }

    #[test]
    fn test_malformed_json_fails() {
        let err = detect_version("{\"color\": ", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaDetectionFailed);
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn test_non_object_fails() {
        let err = detect_version("[1, 2]", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaDetectionFailed);
    }

    #[test]
    fn test_explicit_schema_wins_over_config() {
        let content = r##"{"$schema": "https://www.designtokens.org/schemas/draft.json", "a": {"$ref": "#/b"}}"##;
        let config = DetectionConfig {
            default_version: SchemaVersion::V2025_10,
        };
        assert_eq!(
            detect_version(content, Some(&config)).unwrap(),
            SchemaVersion::Draft
        );
    }

    #[test]
    fn test_unknown_schema_url_falls_through() {
        let content = r#"{"$schema": "https://example.com/x.json", "a": {"$value": 1}}"#;
        assert_eq!(detect(content), SchemaVersion::Draft);
    }

    #[test]
    fn test_config_unknown_is_ignored() {
        let content = r##"{"a": {"$extends": "#/b"}}"##;
        let config = DetectionConfig::default();
        assert_eq!(
            detect_version(content, Some(&config)).unwrap(),
            SchemaVersion::V2025_10
        );
    }

    #[test]
    fn test_duck_typing_signals() {
        assert_eq!(detect(r##"{"a": {"b": {"$ref": "#/c"}}}"##), SchemaVersion::V2025_10);
        assert_eq!(detect(r##"{"a": {"$extends": "#/c"}}"##), SchemaVersion::V2025_10);
        assert_eq!(detect(r#"{"resolutionOrder": []}"#), SchemaVersion::V2025_10);
        assert_eq!(
            detect(r#"{"c": {"$type": "color", "$value": {"colorSpace": "srgb", "components": [1, 0, 0]}}}"#),
            SchemaVersion::V2025_10
        );
    }

    #[test]
    fn test_ambiguous_defaults_to_draft() {
        assert_eq!(detect("{}"), SchemaVersion::Draft);
        assert_eq!(
            detect(r#"{"size": {"$type": "dimension", "$value": "4px"}}"#),
            SchemaVersion::Draft
        );
    }

    #[test]
    fn test_with_validation_returns_version_on_failure() {
        let content = r##"{"$schema": "https://www.designtokens.org/schemas/draft.json", "a": {"$type": "color", "$value": "#fff"}, "b": {"$ref": "#/a"}}"##;
        let (version, result) = detect_version_with_validation("t.json", content, None);
        assert_eq!(version, SchemaVersion::Draft);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MixedSchemaFeatures);
        assert_eq!(err.file_path(), "t.json");
    }

    #[test]
    fn test_with_validation_detection_failure() {
        let (version, result) = detect_version_with_validation("bad.json", "nope", None);
        assert_eq!(version, SchemaVersion::Unknown);
        assert_eq!(result.unwrap_err().file_path(), "bad.json");
    }
}
