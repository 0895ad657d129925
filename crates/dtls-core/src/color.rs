//! Color values across schema versions.
//!
//! Draft color tokens hold a CSS color string. 2025.10 color tokens hold a
//! structured object:
//!
//! ```json
//! { "colorSpace": "srgb", "components": [1, 0.42, "none"], "alpha": 0.5, "hex": "#ff6b35" }
//! ```
//!
//! Both shapes share one contract: [`ColorValue::to_css`], [`ColorValue::is_valid`]
//! and [`ColorValue::schema_version`].
//!
//! # Example
//!
//! ```rust
//! use dtls_core::color::parse_color_value;
//! use dtls_core::SchemaVersion;
//! use serde_json::json;
//!
//! let draft = parse_color_value(&json!("#FF6B35"), SchemaVersion::Draft).unwrap();
//! assert_eq!(draft.to_css(), "#FF6B35");
//!
//! let structured = parse_color_value(
//!     &json!({"colorSpace": "srgb", "components": [1.0, "none", 0.21]}),
//!     SchemaVersion::V2025_10,
//! ).unwrap();
//! assert_eq!(structured.to_css(), "color(srgb 1 none 0.21 / 1)");
//! ```

use std::fmt;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::schema::SchemaVersion;

/// Keyword marking a missing component in CSS Color Level 4.
pub const NONE_KEYWORD: &str = "none";

/// A color value in the shape its schema version prescribes.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorValue {
    /// Draft: an uninterpreted CSS color string.
    String(StringColorValue),
    /// 2025.10: a structured color object.
    Object(ObjectColorValue),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringColorValue {
    pub value: String,
    pub schema: SchemaVersion,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectColorValue {
    pub color_space: String,
    pub components: Vec<ColorComponent>,
    pub alpha: Option<f64>,
    pub hex: Option<String>,
    pub schema: SchemaVersion,
}

/// One channel of a structured color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorComponent {
    Number(f64),
    /// The `none` keyword, kept verbatim.
    None,
}

impl fmt::Display for ColorComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorComponent::Number(n) => f.write_str(&format_significant(*n, 4)),
            ColorComponent::None => f.write_str(NONE_KEYWORD),
        }
    }
}

impl ColorValue {
    /// CSS text for the color.
    ///
    /// Strings are returned unchanged. Objects return their `hex` when it is
    /// present and non-empty, otherwise `color(<space> <c1> <c2> <c3> / <alpha>)`.
    pub fn to_css(&self) -> String {
        match self {
            ColorValue::String(s) => s.value.clone(),
            ColorValue::Object(o) => o.to_css(),
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            ColorValue::String(s) => !s.value.is_empty(),
            ColorValue::Object(o) => !o.color_space.is_empty() && !o.components.is_empty(),
        }
    }

    pub fn schema_version(&self) -> SchemaVersion {
        match self {
            ColorValue::String(s) => s.schema,
            ColorValue::Object(o) => o.schema,
        }
    }
}

impl ObjectColorValue {
    fn to_css(&self) -> String {
        if let Some(hex) = self.hex.as_deref().filter(|h| !h.is_empty()) {
            return hex.to_string();
        }
        let components = self
            .components
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            "color({} {} / {})",
            self.color_space,
            components,
            format_significant(self.alpha.unwrap_or(1.0), 4)
        )
    }
}

/// Parses a color token's `$value` under the rules of `version`.
///
/// A value of the wrong shape for the version is an invalid color format. An
/// object missing `colorSpace` or `components` is malformed. A malformed
/// `alpha` or `hex` is treated as absent.
pub fn parse_color_value(value: &Value, version: SchemaVersion) -> Result<ColorValue> {
    match version {
        SchemaVersion::Draft => match value {
            Value::String(s) => Ok(ColorValue::String(StringColorValue {
                value: s.clone(),
                schema: version,
            })),
            other => Err(Error::invalid_color(
                "",
                "",
                version,
                "string value",
                describe_shape(other),
            )),
        },
        SchemaVersion::V2025_10 => {
            let Value::Object(obj) = value else {
                return Err(Error::invalid_color(
                    "",
                    "",
                    version,
                    "structured object with colorSpace",
                    describe_shape(value),
                ));
            };

            let color_space = obj
                .get("colorSpace")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    Error::malformed("", "", "missing or invalid colorSpace field in color object")
                })?;

            let components = match obj.get("components") {
                Some(Value::Array(items)) => items
                    .iter()
                    .map(parse_component)
                    .collect::<Result<Vec<_>>>()?,
                Some(_) => return Err(Error::malformed("", "", "components must be an array")),
                None => {
                    return Err(Error::malformed(
                        "",
                        "",
                        "missing components field in color object",
                    ))
                }
            };

            Ok(ColorValue::Object(ObjectColorValue {
                color_space: color_space.to_string(),
                components,
                alpha: obj.get("alpha").and_then(Value::as_f64),
                hex: obj.get("hex").and_then(Value::as_str).map(str::to_string),
                schema: version,
            }))
        }
        SchemaVersion::Unknown => Err(Error::invalid_schema(
            "",
            version.as_str(),
            "no color model for this schema version",
        )),
    }
}

fn parse_component(value: &Value) -> Result<ColorComponent> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(ColorComponent::Number)
            .ok_or_else(|| Error::malformed("", "", format!("component {n} is not a finite number"))),
        Value::String(s) if s == NONE_KEYWORD => Ok(ColorComponent::None),
        other => Err(Error::malformed(
            "",
            "",
            format!("color component must be a number or \"none\", found {other}"),
        )),
    }
}

fn describe_shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string value",
        Value::Array(_) => "array",
        Value::Object(_) => "structured object",
    }
}

/// Formats `n` with at most `digits` significant digits, trimming trailing
/// zeros. Exponent notation is used for very small or very large magnitudes.
pub fn format_significant(n: f64, digits: usize) -> String {
    if n == 0.0 || !n.is_finite() {
        return if n == 0.0 { "0".to_string() } else { n.to_string() };
    }

    let precision = digits.saturating_sub(1);
    let sci = format!("{:.*e}", precision, n);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exponent < -4 || exponent >= digits as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            sign,
            exponent.unsigned_abs()
        );
    }

    let decimals = (precision as i32 - exponent).max(0) as usize;
    trim_fraction(&format!("{:.*}", decimals, n)).to_string()
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_draft_string_round_trips() {
        let c = parse_color_value(&json!("#FF6B35"), SchemaVersion::Draft).unwrap();
        assert_eq!(c.to_css(), "#FF6B35");
        assert!(c.is_valid());
        assert_eq!(c.schema_version(), SchemaVersion::Draft);
    }

    #[test]
    fn test_draft_empty_string_is_invalid() {
        let c = parse_color_value(&json!(""), SchemaVersion::Draft).unwrap();
        assert!(!c.is_valid());
    }

    #[test]
    fn test_draft_rejects_object() {
        let err = parse_color_value(
            &json!({"colorSpace": "srgb", "components": [0, 0, 0]}),
            SchemaVersion::Draft,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidColorFormat);
    }

    #[test]
    fn test_hex_wins() {
        let c = parse_color_value(
            &json!({"colorSpace": "srgb", "components": [1.0, 0.42, 0.21], "hex": "#FF6B35"}),
            SchemaVersion::V2025_10,
        )
        .unwrap();
        assert_eq!(c.to_css(), "#FF6B35");
    }

    #[test]
    fn test_empty_hex_is_ignored() {
        let c = parse_color_value(
            &json!({"colorSpace": "srgb", "components": [1, 0, 0], "hex": ""}),
            SchemaVersion::V2025_10,
        )
        .unwrap();
        assert_eq!(c.to_css(), "color(srgb 1 0 0 / 1)");
    }

    #[test]
    fn test_none_keyword_preserved() {
        let c = parse_color_value(
            &json!({"colorSpace": "oklch", "components": [1.0, "none", 0.21], "alpha": 0.5}),
            SchemaVersion::V2025_10,
        )
        .unwrap();
        assert_eq!(c.to_css(), "color(oklch 1 none 0.21 / 0.5)");
    }

    #[test]
    fn test_component_precision() {
        let c = parse_color_value(
            &json!({"colorSpace": "display-p3", "components": [0.123456, 12.3456, 1234.4]}),
            SchemaVersion::V2025_10,
        )
        .unwrap();
        assert_eq!(c.to_css(), "color(display-p3 0.1235 12.35 1234 / 1)");
    }

    #[test]
    fn test_malformed_optional_fields_are_absent() {
        let c = parse_color_value(
            &json!({"colorSpace": "srgb", "components": [0, 0, 0], "alpha": "half", "hex": 12}),
            SchemaVersion::V2025_10,
        )
        .unwrap();
        match c {
            ColorValue::Object(o) => {
                assert_eq!(o.alpha, None);
                assert_eq!(o.hex, None);
            }
            other => panic!("expected object color, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_required_fields_are_malformed() {
        for value in [
            json!({"components": [0, 0, 0]}),
            json!({"colorSpace": "srgb"}),
            json!({"colorSpace": "srgb", "components": "0 0 0"}),
            json!({"colorSpace": "srgb", "components": [0, "zero", 0]}),
        ] {
            let err = parse_color_value(&value, SchemaVersion::V2025_10).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedValue, "{value}");
        }
    }

    #[test]
    fn test_2025_rejects_string() {
        let err = parse_color_value(&json!("#fff"), SchemaVersion::V2025_10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidColorFormat);
        assert!(err.to_string().contains("found string value"));
    }

    #[test]
    fn test_empty_components_is_invalid() {
        let c = parse_color_value(
            &json!({"colorSpace": "srgb", "components": []}),
            SchemaVersion::V2025_10,
        )
        .unwrap();
        assert!(!c.is_valid());
    }

    #[test]
    fn test_format_significant() {
        assert_eq!(format_significant(1.0, 4), "1");
        assert_eq!(format_significant(0.42, 4), "0.42");
        assert_eq!(format_significant(0.123456, 4), "0.1235");
        assert_eq!(format_significant(12346.0, 4), "1.235e+04");
        assert_eq!(format_significant(0.00001234, 4), "1.234e-05");
        assert_eq!(format_significant(0.0001, 4), "0.0001");
        assert_eq!(format_significant(-0.5, 4), "-0.5");
        assert_eq!(format_significant(0.0, 4), "0");
    }
}
