//! Per-version schema handlers.
//!
//! A [`SchemaHandler`] bundles the hooks that differ between schema versions
//! and that callers may want to swap out: token node validation, CSS color
//! formatting and feature flags. The built-in handlers cover Draft and 2025.10.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use super::version::SchemaVersion;
use crate::color::parse_color_value;
use crate::error::{Error, Result};

/// Optional capabilities a schema version may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    CurlyBraceReferences,
    JsonPointer,
    Extends,
    Root,
    ResolutionOrder,
}

impl Feature {
    pub const ALL: [Feature; 5] = [
        Feature::CurlyBraceReferences,
        Feature::JsonPointer,
        Feature::Extends,
        Feature::Root,
        Feature::ResolutionOrder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::CurlyBraceReferences => "curly-brace-references",
            Feature::JsonPointer => "json-pointer",
            Feature::Extends => "extends",
            Feature::Root => "root",
            Feature::ResolutionOrder => "resolution-order",
        }
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| format!("unknown feature: {s}"))
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Version-specific hooks.
pub trait SchemaHandler: Send + Sync {
    fn version(&self) -> SchemaVersion;

    /// Checks a single token node for constructs illegal in this version.
    fn validate_token_node(&self, node: &Value) -> Result<()>;

    /// CSS text for a color `$value`, or `None` when it is not a valid color
    /// in this version.
    fn format_color_for_css(&self, value: &Value) -> Option<String> {
        parse_color_value(value, self.version())
            .ok()
            .filter(|c| c.is_valid())
            .map(|c| c.to_css())
    }

    fn supports(&self, feature: Feature) -> bool;

    /// Looks a feature up by name. Unknown names are unsupported.
    fn supports_feature(&self, name: &str) -> bool {
        name.parse::<Feature>().is_ok_and(|f| self.supports(f))
    }
}

fn color_value(node: &Value) -> Option<&Value> {
    let obj = node.as_object()?;
    if obj.get("$type").and_then(Value::as_str) != Some("color") {
        return None;
    }
    obj.get("$value")
}

/// Handler for the draft schema.
#[derive(Debug, Default, Clone, Copy)]
pub struct DraftHandler;

impl SchemaHandler for DraftHandler {
    fn version(&self) -> SchemaVersion {
        SchemaVersion::Draft
    }

    fn validate_token_node(&self, node: &Value) -> Result<()> {
        let Some(obj) = node.as_object() else {
            return Ok(());
        };
        let features: Vec<String> = [("$ref", "$ref (2025.10+ only)"), ("$extends", "$extends (2025.10+ only)")]
            .into_iter()
            .filter(|(key, _)| obj.contains_key(*key))
            .map(|(_, label)| label.to_string())
            .collect();
        if !features.is_empty() {
            return Err(Error::mixed_features("", self.version(), features));
        }
        match color_value(node) {
            Some(value) => parse_color_value(value, self.version()).map(|_| ()),
            None => Ok(()),
        }
    }

    fn supports(&self, feature: Feature) -> bool {
        matches!(feature, Feature::CurlyBraceReferences)
    }
}

/// Handler for the 2025.10 schema.
#[derive(Debug, Default, Clone, Copy)]
pub struct V2025_10Handler;

impl SchemaHandler for V2025_10Handler {
    fn version(&self) -> SchemaVersion {
        SchemaVersion::V2025_10
    }

    fn validate_token_node(&self, node: &Value) -> Result<()> {
        match color_value(node) {
            Some(value) => parse_color_value(value, self.version()).map(|_| ()),
            None => Ok(()),
        }
    }

    fn supports(&self, feature: Feature) -> bool {
        match feature {
            Feature::CurlyBraceReferences | Feature::JsonPointer | Feature::Extends | Feature::Root => {
                true
            }
            // Detected but not resolved.
            Feature::ResolutionOrder => false,
        }
    }
}
