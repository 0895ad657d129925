//! `var()` calls and rule blocks in CSS text.
//!
//! Stylesheets are tokenized with `cssparser`, so a brace or a `var(` inside a
//! comment or a string is never mistaken for the real thing. Positions are
//! LSP positions, so characters are UTF-16 code units.

use cssparser::{ParseError, Parser, ParserInput, Token};
use dtls_core::position::{byte_offset_to_utf16, normalize_line_endings, utf16_to_byte_offset};
use tower_lsp::lsp_types::{Position, Range};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarCall {
    /// The custom property name, including the leading `--`.
    pub name: String,
    /// Trimmed fallback text, if any.
    pub fallback: Option<String>,
    /// Range of the whole call.
    pub range: Range,
}

/// The language ids handled as stylesheets.
pub fn is_css_language(language_id: &str) -> bool {
    matches!(language_id, "css" | "scss" | "less" | "postcss" | "sass")
}

/// Byte offsets and LSP positions of one normalized text.
struct Lines<'a> {
    text: &'a str,
    starts: Vec<usize>,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { text, starts }
    }

    fn position(&self, offset: usize) -> Position {
        let line = self.starts.partition_point(|&start| start <= offset) - 1;
        let start = self.starts[line];
        Position::new(
            line as u32,
            byte_offset_to_utf16(&self.text[start..], offset - start) as u32,
        )
    }

    fn range(&self, start: usize, end: usize) -> Range {
        Range::new(self.position(start), self.position(end))
    }

    fn offset(&self, position: Position) -> Option<usize> {
        let line = position.line as usize;
        let start = *self.starts.get(line)?;
        let end = self
            .starts
            .get(line + 1)
            .map_or(self.text.len(), |next| next - 1);
        Some(start + utf16_to_byte_offset(&self.text[start..end], position.character as usize))
    }
}

/// Every `var()` call in `text`, outer calls before the calls nested in
/// their fallbacks.
pub fn find_var_calls(text: &str) -> Vec<VarCall> {
    let text = normalize_line_endings(text);
    let lines = Lines::new(&text);
    let mut input = ParserInput::new(&text);
    let mut parser = Parser::new(&mut input);
    let mut calls = Vec::new();
    collect_calls(&mut parser, &lines, &mut calls);
    calls
}

fn collect_calls<'i>(input: &mut Parser<'i, '_>, lines: &Lines, calls: &mut Vec<VarCall>) {
    loop {
        let start = input.position().byte_index();
        let token = match input.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => return,
        };
        match token {
            Token::Function(name) if name.eq_ignore_ascii_case("var") => {
                let index = calls.len();
                let parsed = input.parse_nested_block(|args| {
                    Ok::<_, ParseError<'i, ()>>(var_arguments(args, lines, calls))
                });
                if let Ok(Some((name, fallback))) = parsed {
                    let end = input.position().byte_index();
                    let call = VarCall {
                        name,
                        fallback,
                        range: lines.range(start, end),
                    };
                    calls.insert(index, call);
                }
            }
            Token::Function(_)
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::CurlyBracketBlock => {
                let _ = input.parse_nested_block(|nested| {
                    collect_calls(nested, lines, calls);
                    Ok::<_, ParseError<'i, ()>>(())
                });
            }
            _ => {}
        }
    }
}

/// The name and trimmed fallback of a `var()` call. Calls nested in the
/// fallback are added to `calls`.
fn var_arguments(
    args: &mut Parser<'_, '_>,
    lines: &Lines,
    calls: &mut Vec<VarCall>,
) -> Option<(String, Option<String>)> {
    let name = match args.next() {
        Ok(Token::Ident(name)) if name.starts_with("--") => name.to_string(),
        _ => return None,
    };
    match args.next() {
        Err(_) => return Some((name, None)),
        Ok(Token::Comma) => {}
        Ok(_) => return None,
    }
    let from = args.position().byte_index();
    collect_calls(args, lines, calls);
    let to = args.position().byte_index();
    Some((name, Some(lines.text[from..to].trim().to_string())))
}

/// The innermost `var()` call containing `position`. The end of a call is
/// exclusive.
pub fn var_call_at(text: &str, position: Position) -> Option<VarCall> {
    find_var_calls(text)
        .into_iter()
        .filter(|call| contains(&call.range, position))
        .max_by_key(|call| (call.range.start.line, call.range.start.character))
}

fn contains(range: &Range, position: Position) -> bool {
    let at = (position.line, position.character);
    (range.start.line, range.start.character) <= at && at < (range.end.line, range.end.character)
}

/// The custom property word ending at `position`, and its range.
///
/// Word characters are ASCII letters, digits, `-` and `_`. Returns `None` when
/// the cursor does not follow a word.
pub fn word_before(text: &str, position: Position) -> Option<(String, Range)> {
    let text = normalize_line_endings(text);
    let line = text.split('\n').nth(position.line as usize)?;
    let end = utf16_to_byte_offset(line, position.character as usize).min(line.len());
    let start = line[..end]
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .last()
        .map(|(i, _)| i)?;
    let range = Range::new(
        Position::new(position.line, byte_offset_to_utf16(line, start) as u32),
        position,
    );
    Some((line[start..end].to_string(), range))
}

/// Reports whether `position` is inside a `{ ... }` block.
pub fn in_block(text: &str, position: Position) -> bool {
    let text = normalize_line_endings(text);
    let lines = Lines::new(&text);
    let Some(offset) = lines.offset(position) else {
        return false;
    };
    let mut input = ParserInput::new(&text);
    let mut parser = Parser::new(&mut input);
    block_depth(&mut parser, offset, 0).unwrap_or(0) > 0
}

/// How many curly blocks enclose `offset`, or `None` when the current block
/// ends before reaching it.
fn block_depth<'i>(input: &mut Parser<'i, '_>, offset: usize, depth: u32) -> Option<u32> {
    loop {
        if input.position().byte_index() >= offset {
            return Some(depth);
        }
        let token = input.next_including_whitespace_and_comments().ok()?.clone();
        let inner = match token {
            Token::CurlyBracketBlock => depth + 1,
            Token::Function(_) | Token::ParenthesisBlock | Token::SquareBracketBlock => depth,
            _ => {
                // Inside a comment, string or other single token.
                if input.position().byte_index() > offset {
                    return Some(depth);
                }
                continue;
            }
        };
        let mut found = None;
        let _ = input.parse_nested_block(|nested| {
            found = block_depth(nested, offset, inner);
            Ok::<_, ParseError<'i, ()>>(())
        });
        if found.is_some() {
            return found;
        }
    }
}
