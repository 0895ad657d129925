//! Color swatches and presentations.

use dtls_core::position::{
    byte_offset_to_utf16, normalize_line_endings, utf16_len, utf16_to_byte_offset,
};
use dtls_core::{Token, TokenSet};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tower_lsp::lsp_types::{Color, ColorInformation, ColorPresentation, Position, Range};

use crate::css::find_var_calls;

/// Quoted hex color literals in token files.
static HEX_STRING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"["'](#[0-9a-fA-F]{3,8})["']"#).expect("hex string pattern is valid")
});

/// Parses `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`.
pub fn parse_hex(hex: &str) -> Option<Color> {
    let digits = hex.trim().strip_prefix('#')?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);
    let short = |i: usize| channel(&digits[i..i + 1].repeat(2));
    let long = |i: usize| channel(&digits[i * 2..i * 2 + 2]);

    let (red, green, blue, alpha) = match digits.len() {
        3 => (short(0)?, short(1)?, short(2)?, 1.0),
        4 => (short(0)?, short(1)?, short(2)?, short(3)?),
        6 => (long(0)?, long(1)?, long(2)?, 1.0),
        8 => (long(0)?, long(1)?, long(2)?, long(3)?),
        _ => return None,
    };
    Some(Color {
        red,
        green,
        blue,
        alpha,
    })
}

/// Parses any CSS color string: hex, `rgb()`, `hsl()`, `hwb()`, named colors
/// and `transparent`.
pub fn parse_css_color(text: &str) -> Option<Color> {
    if let Some(color) = parse_hex(text) {
        return Some(color);
    }
    let [red, green, blue, alpha] = csscolorparser::parse(text.trim()).ok()?.to_rgba8();
    let unit = |v: u8| v as f32 / 255.0;
    Some(Color {
        red: unit(red),
        green: unit(green),
        blue: unit(blue),
        alpha: unit(alpha),
    })
}

/// `#rrggbb`, or `#rrggbbaa` when the color is not opaque.
pub fn to_hex(color: &Color) -> String {
    let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    let rgb = format!(
        "#{:02x}{:02x}{:02x}",
        byte(color.red),
        byte(color.green),
        byte(color.blue)
    );
    if byte(color.alpha) == 255 {
        rgb
    } else {
        format!("{rgb}{:02x}", byte(color.alpha))
    }
}

/// The color a token holds, if it is a color token in a form that can be
/// shown: a CSS color string, or an object with a hex or sRGB components.
pub fn token_color(token: &Token) -> Option<Color> {
    if !token.is_color() {
        return None;
    }
    match token.effective_value() {
        Value::String(s) => parse_css_color(s),
        Value::Object(obj) => {
            if let Some(color) = obj.get("hex").and_then(Value::as_str).and_then(parse_hex) {
                return Some(Color {
                    alpha: alpha_of(obj).unwrap_or(color.alpha),
                    ..color
                });
            }
            if obj.get("colorSpace").and_then(Value::as_str) != Some("srgb") {
                return None;
            }
            let components = obj.get("components")?.as_array()?;
            let [r, g, b] = components.as_slice() else {
                return None;
            };
            Some(Color {
                red: r.as_f64()? as f32,
                green: g.as_f64()? as f32,
                blue: b.as_f64()? as f32,
                alpha: alpha_of(obj).unwrap_or(1.0),
            })
        }
        _ => None,
    }
}

fn alpha_of(obj: &serde_json::Map<String, Value>) -> Option<f32> {
    obj.get("alpha").and_then(Value::as_f64).map(|a| a as f32)
}

/// Swatches for `var()` calls that name color tokens.
pub fn css_colors(tokens: &TokenSet, text: &str) -> Vec<ColorInformation> {
    find_var_calls(text)
        .into_iter()
        .filter_map(|call| {
            let color = token_color(tokens.get(&call.name)?)?;
            Some(ColorInformation {
                range: call.range,
                color,
            })
        })
        .collect()
}

/// Swatches for a token file: quoted hex literals, plus every other color
/// token loaded from `file_path` shown on its key. That covers structured
/// colors, named and functional colors, and aliases.
pub fn token_file_colors(tokens: &TokenSet, file_path: &str, text: &str) -> Vec<ColorInformation> {
    let text = normalize_line_endings(text);
    let lines: Vec<&str> = text.split('\n').collect();

    let mut colors: Vec<ColorInformation> = Vec::new();
    for (line_no, line) in lines.iter().enumerate() {
        for caps in HEX_STRING.captures_iter(line) {
            let Some(hex) = caps.get(1) else { continue };
            if let Some(color) = parse_hex(hex.as_str()) {
                colors.push(ColorInformation {
                    range: Range::new(
                        Position::new(line_no as u32, byte_offset_to_utf16(line, hex.start()) as u32),
                        Position::new(line_no as u32, byte_offset_to_utf16(line, hex.end()) as u32),
                    ),
                    color,
                });
            }
        }
    }

    for token in tokens.by_source_file(file_path) {
        if token.raw_value.as_str().and_then(parse_hex).is_some() {
            continue;
        }
        let Some(color) = token_color(token) else {
            continue;
        };
        let Some(line) = lines.get(token.line as usize) else {
            continue;
        };
        let start = utf16_to_byte_offset(line, token.character as usize);
        let key: String = line[start..]
            .chars()
            .take_while(|c| !matches!(c, '"' | '\'' | ':'))
            .collect();
        if key.is_empty() {
            continue;
        }
        colors.push(ColorInformation {
            range: Range::new(
                Position::new(token.line, token.character),
                Position::new(token.line, token.character + utf16_len(&key) as u32),
            ),
            color,
        });
    }
    colors
}

/// Presentations for a picked color: its hex form, then every color token
/// with the same hex as `var(--name)`.
pub fn presentations(tokens: &TokenSet, color: &Color) -> Vec<ColorPresentation> {
    let hex = to_hex(color);
    let mut labels = vec![hex.clone()];
    let mut names: Vec<String> = tokens
        .all()
        .filter(|t| token_color(t).is_some_and(|c| to_hex(&c) == hex))
        .map(|t| format!("var({})", t.css_variable_name()))
        .collect();
    names.sort();
    names.dedup();
    labels.extend(names);

    labels
        .into_iter()
        .map(|label| ColorPresentation {
            label,
            text_edit: None,
            additional_text_edits: None,
        })
        .collect()
}
