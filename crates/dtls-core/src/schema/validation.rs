//! Schema consistency validation.
//!
//! A file must contain only the constructs of the one version it declares or
//! is detected as. Validation is pure and runs before a file is parsed.
//!
//! For Draft, any of these is a conflicting feature:
//! structured color objects, `$ref`, `$extends`, `resolutionOrder`.
//! A structured color on its own is reported as an invalid color format;
//! anything more is reported as mixed schema features.
//!
//! For 2025.10, any non-empty string color value is an invalid color format.
//!
//! Independent of version, a group holding token children may not contain both
//! `$root` and a legacy group marker, and 2025.10 groups may not use legacy
//! markers at all. Draft groups that only use `$root` are accepted, since
//! `$root` may be an ordinary key there.

use serde_json::{Map, Value};

use super::detector::parse_object;
use super::version::SchemaVersion;
use crate::error::{Error, Result};
use crate::root::{DEFAULT_GROUP_MARKERS, ROOT_KEY};

const STRUCTURED_COLORS: &str = "structured color objects (2025.10+ only)";
const REF: &str = "$ref (2025.10+ only)";
const EXTENDS: &str = "$extends (2025.10+ only)";
const RESOLUTION_ORDER: &str = "resolutionOrder (2025.10+ only)";

const STRING_FORMAT: &str = "string value";
const OBJECT_FORMAT: &str = "structured object with colorSpace";

/// Validates raw JSON content against `version`.
pub fn validate_schema_consistency(content: &str, version: SchemaVersion) -> Result<()> {
    validate_schema_consistency_with_path("", content, version)
}

/// Validates raw JSON content, naming `file_path` in any error.
pub fn validate_schema_consistency_with_path(
    file_path: &str,
    content: &str,
    version: SchemaVersion,
) -> Result<()> {
    let root = parse_object(content).map_err(|e| match e {
        Error::SchemaDetectionFailed { reason, .. } => Error::syntax(file_path, reason),
        other => other.with_file_path(file_path),
    })?;
    validate_document(file_path, &root, version, DEFAULT_GROUP_MARKERS)
}

/// Validates an already decoded document using the given legacy marker set.
pub fn validate_document<S: AsRef<str>>(
    file_path: &str,
    root: &Map<String, Value>,
    version: SchemaVersion,
    group_markers: &[S],
) -> Result<()> {
    let mut conflicts = Vec::new();
    let mut color_conflict = false;

    match version {
        SchemaVersion::Draft => {
            if has_structured_color(root) {
                conflicts.push(STRUCTURED_COLORS.to_string());
                color_conflict = true;
            }
            for (key, label) in [
                ("$ref", REF),
                ("$extends", EXTENDS),
                ("resolutionOrder", RESOLUTION_ORDER),
            ] {
                if contains_key(root, key) {
                    conflicts.push(label.to_string());
                }
            }
        }
        SchemaVersion::V2025_10 => {
            if has_string_color(root) {
                return Err(Error::invalid_color(
                    file_path,
                    "color tokens",
                    version,
                    OBJECT_FORMAT,
                    STRING_FORMAT,
                ));
            }
        }
        SchemaVersion::Unknown => {}
    }

    check_root_conflicts(file_path, root, "", version, group_markers)?;

    match conflicts.len() {
        0 => Ok(()),
        1 if color_conflict => Err(Error::invalid_color(
            file_path,
            "color tokens",
            version,
            STRING_FORMAT,
            OBJECT_FORMAT,
        )),
        _ => Err(Error::mixed_features(file_path, version, conflicts)),
    }
}

/// Reports whether `key` appears in `obj` or any nested object.
pub(crate) fn contains_key(obj: &Map<String, Value>, key: &str) -> bool {
    obj.contains_key(key)
        || obj
            .values()
            .filter_map(Value::as_object)
            .any(|child| contains_key(child, key))
}

/// Reports whether any color token holds an object value with `colorSpace`.
pub(crate) fn has_structured_color(obj: &Map<String, Value>) -> bool {
    find_color(obj, &|value: &Value| {
        value
            .as_object()
            .is_some_and(|v| v.contains_key("colorSpace"))
    })
}

/// Reports whether any color token holds a non-empty string value. Curly
/// aliases count: a 2025.10 color alias is written with `$ref`.
pub(crate) fn has_string_color(obj: &Map<String, Value>) -> bool {
    find_color(obj, &|value: &Value| value.as_str().is_some_and(|s| !s.is_empty()))
}

fn find_color(obj: &Map<String, Value>, matches: &dyn Fn(&Value) -> bool) -> bool {
    let is_color = obj.get("$type").and_then(Value::as_str) == Some("color");
    if is_color && obj.get("$value").is_some_and(matches) {
        return true;
    }
    obj.values()
        .filter_map(Value::as_object)
        .any(|child| find_color(child, matches))
}

fn check_root_conflicts<S: AsRef<str>>(
    file_path: &str,
    obj: &Map<String, Value>,
    current_path: &str,
    version: SchemaVersion,
    group_markers: &[S],
) -> Result<()> {
    for (key, value) in obj {
        if key.starts_with('$') && key != ROOT_KEY {
            continue;
        }
        let Some(child) = value.as_object() else {
            continue;
        };
        let group_path = if current_path.is_empty() {
            key.clone()
        } else {
            format!("{current_path}.{key}")
        };

        if has_token_children(child) {
            let has_root = child.contains_key(ROOT_KEY);
            let marker = group_markers
                .iter()
                .map(AsRef::<str>::as_ref)
                .find(|m| child.contains_key(*m));

            match (has_root, marker) {
                (true, Some(marker)) => {
                    return Err(Error::conflicting_roots(
                        file_path, group_path, ROOT_KEY, marker,
                    ));
                }
                (false, Some(marker)) if version == SchemaVersion::V2025_10 => {
                    return Err(Error::invalid_schema(
                        file_path,
                        version.as_str(),
                        format!("group '{group_path}' uses draft-style marker '{marker}' instead of $root"),
                    ));
                }
                _ => {}
            }
        }

        check_root_conflicts(file_path, child, &group_path, version, group_markers)?;
    }
    Ok(())
}

/// A group looks like a token group when it is not a token itself and at least
/// one non-reserved child carries `$value` or `$type`.
fn has_token_children(obj: &Map<String, Value>) -> bool {
    if is_token_like(obj) {
        return false;
    }
    obj.iter()
        .filter(|(key, _)| !key.starts_with('$'))
        .filter_map(|(_, value)| value.as_object())
        .any(is_token_like)
}

fn is_token_like(obj: &Map<String, Value>) -> bool {
    obj.contains_key("$value") || obj.contains_key("$type")
}
