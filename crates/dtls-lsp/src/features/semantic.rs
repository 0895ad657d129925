//! Semantic tokens for token files.
//!
//! Curly references to known tokens are split into their segments, the group
//! as a class and the rest as properties. In 2025.10 files the `$ref` keyword,
//! its pointer and `$root` keys are marked too. References to deprecated
//! tokens carry the `deprecated` modifier.

use dtls_core::position::{normalize_line_endings, utf16_len, utf16_to_byte_offset};
use dtls_core::references::{find_references, ReferenceKind, ReferenceMatch};
use dtls_core::{detect_version, SchemaVersion, TokenSet};
use once_cell::sync::Lazy;
use regex::Regex;
use tower_lsp::lsp_types::{
    SemanticToken, SemanticTokenModifier, SemanticTokenType, SemanticTokensLegend,
};

use super::referenced_token;

/// Matches a `$root` key in JSON (`"$root":`) or YAML (`$root:`).
static ROOT_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"["']?(\$root)["']?\s*:"#).expect("root entry pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TokenType {
    /// First segment of a curly reference.
    Class = 0,
    /// Later segments of a curly reference.
    Property = 1,
    Keyword = 2,
    /// A JSON Pointer.
    String = 3,
}

impl TokenType {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenType::Class => "class",
            TokenType::Property => "property",
            TokenType::Keyword => "keyword",
            TokenType::String => "string",
        }
    }
}

/// Modifier bit for references to deprecated tokens.
pub const DEPRECATED: u32 = 1;

pub fn legend() -> SemanticTokensLegend {
    SemanticTokensLegend {
        token_types: [
            TokenType::Class,
            TokenType::Property,
            TokenType::Keyword,
            TokenType::String,
        ]
        .into_iter()
        .map(|t| SemanticTokenType::new(t.as_str()))
        .collect(),
        token_modifiers: vec![SemanticTokenModifier::DEPRECATED],
    }
}

#[derive(Debug)]
struct RawToken {
    line: u32,
    start: u32,
    length: u32,
    token_type: TokenType,
    modifiers: u32,
}

/// Semantic tokens for the token file at `file_path`.
///
/// The schema comes from the tokens loaded from that file, or from the text
/// itself when the file is not configured.
pub fn token_file_tokens(tokens: &TokenSet, file_path: &str, text: &str) -> Vec<SemanticToken> {
    let version = match tokens.schema_version_for_file(file_path) {
        SchemaVersion::Unknown => detect_version(text, None).unwrap_or(SchemaVersion::Draft),
        known => known,
    };
    let text = normalize_line_endings(text);
    let lines: Vec<&str> = text.split('\n').collect();

    let mut raw = Vec::new();
    for found in find_references(&text) {
        let modifiers = match referenced_token(tokens, &found.reference) {
            Some(target) if target.deprecated => DEPRECATED,
            Some(_) => 0,
            None if found.kind == ReferenceKind::CurlyBrace => continue,
            None => 0,
        };
        match found.kind {
            ReferenceKind::CurlyBrace => push_segments(&mut raw, &found, modifiers),
            ReferenceKind::JsonPointer if version == SchemaVersion::V2025_10 => {
                let line = lines.get(found.line as usize).copied().unwrap_or_default();
                push_pointer(&mut raw, line, &found, modifiers);
            }
            ReferenceKind::JsonPointer => {}
        }
    }

    if version == SchemaVersion::V2025_10 {
        for (index, line) in lines.iter().enumerate() {
            for caps in ROOT_ENTRY.captures_iter(line) {
                let Some(key) = caps.get(1) else { continue };
                raw.push(RawToken {
                    line: index as u32,
                    start: utf16_len(&line[..key.start()]) as u32,
                    length: utf16_len(key.as_str()) as u32,
                    token_type: TokenType::Keyword,
                    modifiers: 0,
                });
            }
        }
    }

    raw.sort_by_key(|t| (t.line, t.start));
    encode(&raw)
}

fn push_segments(raw: &mut Vec<RawToken>, found: &ReferenceMatch, modifiers: u32) {
    let mut start = found.path_start;
    for (index, segment) in found.reference.path.split('.').enumerate() {
        let length = utf16_len(segment) as u32;
        raw.push(RawToken {
            line: found.line,
            start,
            length,
            token_type: if index == 0 {
                TokenType::Class
            } else {
                TokenType::Property
            },
            modifiers,
        });
        start += length + 1;
    }
}

fn push_pointer(raw: &mut Vec<RawToken>, line: &str, found: &ReferenceMatch, modifiers: u32) {
    let from = utf16_to_byte_offset(line, found.start as usize);
    if let Some(offset) = line[from..].find("$ref") {
        raw.push(RawToken {
            line: found.line,
            start: utf16_len(&line[..from + offset]) as u32,
            length: 4,
            token_type: TokenType::Keyword,
            modifiers: 0,
        });
    }
    // The match ends after the pointer's closing quote.
    raw.push(RawToken {
        line: found.line,
        start: found.path_start,
        length: found.end.saturating_sub(found.path_start + 1),
        token_type: TokenType::String,
        modifiers,
    });
}

fn encode(raw: &[RawToken]) -> Vec<SemanticToken> {
    let mut result = Vec::with_capacity(raw.len());
    let mut prev_line = 0;
    let mut prev_start = 0;
    for token in raw {
        let delta_line = token.line - prev_line;
        let delta_start = if delta_line == 0 {
            token.start - prev_start
        } else {
            token.start
        };
        result.push(SemanticToken {
            delta_line,
            delta_start,
            length: token.length,
            token_type: token.token_type as u32,
            token_modifiers_bitset: token.modifiers,
        });
        prev_line = token.line;
        prev_start = token.start;
    }
    result
}
