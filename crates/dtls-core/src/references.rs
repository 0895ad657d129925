//! Token references.
//!
//! Two syntaxes point from one token to another:
//!
//! - Curly braces inside a string value: `"{color.base}"`, with dot-separated segments.
//! - A JSON Pointer object (2025.10 only): `{"$ref": "#/color/base"}`, with
//!   slash-separated segments.
//!
//! The two path conventions are kept apart; [`json_pointer_to_token_path`] and
//! [`token_path_to_json_pointer`] convert explicitly when needed.
//!
//! ```rust
//! use dtls_core::references::{extract_references, ReferenceKind};
//! use dtls_core::SchemaVersion;
//!
//! let refs = extract_references("rgb({color.r}, {color.g}, {color.b})", SchemaVersion::Draft);
//! let paths: Vec<_> = refs.iter().map(|r| r.path.as_str()).collect();
//! assert_eq!(paths, ["color.r", "color.g", "color.b"]);
//! assert!(refs.iter().all(|r| r.kind == ReferenceKind::CurlyBrace));
//! ```

use std::fmt;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::position::{byte_offset_to_utf16, normalize_line_endings};
use crate::root::ROOT_KEY;
use crate::schema::SchemaVersion;

/// Matches `{a.b.c}` where segments hold letters, numbers, symbols, `_` or `-`.
/// Quotes, colons and whitespace never match, so embedded JSON is not mistaken
/// for a reference.
static CURLY_BRACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{([\p{L}\p{N}\p{S}_-]+(?:\.[\p{L}\p{N}\p{S}_-]+)*)\}")
        .expect("curly brace pattern is valid")
});

/// Matches a `$ref` entry in JSON (`"$ref": "#/a/b"`) or YAML (`$ref: '#/a/b'`).
static JSON_POINTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"["']?\$ref["']?\s*:\s*["'](#[^"']+)["']"#)
        .expect("json pointer pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    CurlyBrace,
    JsonPointer,
}

/// A reference to another token.
///
/// `path` is dot-separated for curly braces and slash-separated, without the
/// leading `#/`, for JSON Pointers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub path: String,
}

impl Reference {
    pub fn curly(path: impl Into<String>) -> Self {
        Self {
            kind: ReferenceKind::CurlyBrace,
            path: path.into(),
        }
    }

    pub fn pointer(path: impl Into<String>) -> Self {
        Self {
            kind: ReferenceKind::JsonPointer,
            path: path.into(),
        }
    }

    /// Path segments as written.
    ///
    /// Pointer segments are unescaped: `~1` is `/` and `~0` is `~`.
    pub fn segments(&self) -> Vec<String> {
        match self.kind {
            ReferenceKind::CurlyBrace => self.path.split('.').map(str::to_string).collect(),
            ReferenceKind::JsonPointer => self
                .path
                .split('/')
                .map(|s| s.replace("~1", "/").replace("~0", "~"))
                .collect(),
        }
    }

    /// Path segments of the referenced token in a file of `version`.
    ///
    /// In 2025.10 a trailing `$root` is dropped since a root token lives at its
    /// group's path. In Draft `$root` is an ordinary name and stays.
    pub fn segments_for(&self, version: SchemaVersion) -> Vec<String> {
        let mut segments = self.segments();
        if version == SchemaVersion::V2025_10
            && segments.len() > 1
            && segments.last().is_some_and(|s| s == ROOT_KEY)
        {
            segments.pop();
        }
        segments
    }

    /// Dash-joined name of the referenced token in a file of `version`.
    pub fn token_name(&self, version: SchemaVersion) -> String {
        self.segments_for(version).join("-")
    }
}

impl fmt::Display for Reference {
    /// The reference as it is written in a token file.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ReferenceKind::CurlyBrace => write!(f, "{{{}}}", self.path),
            ReferenceKind::JsonPointer => write!(f, "#/{}", self.path),
        }
    }
}

/// Reports whether `text` is exactly one curly-brace reference, such as `{color.base}`.
pub fn is_alias(text: &str) -> bool {
    CURLY_BRACE
        .find(text)
        .is_some_and(|m| m.start() == 0 && m.end() == text.len())
}

/// Finds every curly-brace reference in `text`, left to right.
pub fn extract_references(text: &str, _version: SchemaVersion) -> Vec<Reference> {
    CURLY_BRACE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| Reference::curly(m.as_str()))
        .collect()
}

/// Replaces each curly-brace reference in `text` with the string `lookup`
/// returns for it. References `lookup` declines are left as written.
pub fn interpolate(text: &str, mut lookup: impl FnMut(&Reference) -> Option<String>) -> String {
    CURLY_BRACE
        .replace_all(text, |caps: &Captures| {
            let reference = Reference::curly(&caps[1]);
            lookup(&reference).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Finds the references held directly by a token value.
///
/// Strings are scanned for curly braces. An object with a string `$ref` yields
/// one JSON Pointer reference, and fails under Draft where `$ref` does not
/// exist. Any other value holds no references.
pub fn extract_references_from_value(value: &Value, version: SchemaVersion) -> Result<Vec<Reference>> {
    match value {
        Value::String(s) => Ok(extract_references(s, version)),
        Value::Object(obj) => match obj.get("$ref").and_then(Value::as_str) {
            Some(_) if version == SchemaVersion::Draft => Err(Error::mixed_features(
                "",
                version,
                vec!["$ref (2025.10+ only)".to_string()],
            )),
            Some(pointer) => Ok(vec![Reference::pointer(
                pointer.strip_prefix("#/").unwrap_or(pointer),
            )]),
            None => Ok(Vec::new()),
        },
        _ => Ok(Vec::new()),
    }
}

/// Collects references from a value and everything nested in it.
pub fn collect_references(value: &Value, version: SchemaVersion) -> Result<Vec<Reference>> {
    let mut refs = extract_references_from_value(value, version)?;
    match value {
        Value::Object(obj) if !obj.contains_key("$ref") => {
            for child in obj.values() {
                refs.extend(collect_references(child, version)?);
            }
        }
        Value::Array(items) => {
            for child in items {
                refs.extend(collect_references(child, version)?);
            }
        }
        _ => {}
    }
    Ok(refs)
}

/// `color/base` to `color.base`.
pub fn json_pointer_to_token_path(pointer: &str) -> String {
    pointer.replace('/', ".")
}

/// `color.base` to `#/color/base`.
pub fn token_path_to_json_pointer(path: &str) -> String {
    format!("#/{}", path.replace('.', "/"))
}

/// A reference found in source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceMatch {
    pub reference: Reference,
    pub kind: ReferenceKind,
    pub line: u32,
    /// UTF-16 start of the whole match.
    pub start: u32,
    /// UTF-16 end of the whole match, exclusive.
    pub end: u32,
    /// UTF-16 start of the written path: after `{`, or at the pointer's `#`.
    pub path_start: u32,
}

/// Finds the reference covering a line and UTF-16 character in `content`.
///
/// Line endings are normalized first so CRLF, CR and LF documents agree. Both
/// ends of a match count as inside it. Curly braces are tried before pointers.
pub fn find_reference_at_position(content: &str, line: u32, character: u32) -> Option<ReferenceMatch> {
    let content = normalize_line_endings(content);
    let text = content.split('\n').nth(line as usize)?;
    line_matches(text, line)
        .into_iter()
        .find(|m| m.start <= character && character <= m.end)
}

/// Every reference in `content`, in document order.
pub fn find_references(content: &str) -> Vec<ReferenceMatch> {
    let content = normalize_line_endings(content);
    content
        .split('\n')
        .enumerate()
        .flat_map(|(line, text)| {
            let mut found = line_matches(text, line as u32);
            found.sort_by_key(|m| m.start);
            found
        })
        .collect()
}

/// Curly matches first, then pointers, each in line order.
fn line_matches(text: &str, line: u32) -> Vec<ReferenceMatch> {
    let utf16 = |byte: usize| byte_offset_to_utf16(text, byte) as u32;
    [
        (&*CURLY_BRACE, ReferenceKind::CurlyBrace),
        (&*JSON_POINTER, ReferenceKind::JsonPointer),
    ]
    .into_iter()
    .flat_map(|(pattern, kind)| {
        pattern.captures_iter(text).filter_map(move |caps| {
            let whole = caps.get(0)?;
            let path = caps.get(1)?;
            let captured = path.as_str();
            let reference = match kind {
                ReferenceKind::CurlyBrace => Reference::curly(captured),
                ReferenceKind::JsonPointer => {
                    Reference::pointer(captured.strip_prefix("#/").unwrap_or(captured))
                }
            };
            Some(ReferenceMatch {
                reference,
                kind,
                line,
                start: utf16(whole.start()),
                end: utf16(whole.end()),
                path_start: utf16(path.start()),
            })
        })
    })
    .collect()
}
