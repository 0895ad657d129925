//! Text positions in editor coordinates.
//!
//! Editors address characters in UTF-16 code units, while Rust strings and
//! regex matches are indexed in bytes. Everything that reports a character
//! offset goes through these conversions. Characters outside the Basic
//! Multilingual Plane occupy two UTF-16 units.

use std::borrow::Cow;
use std::collections::HashMap;

use regex::Regex;

/// Converts CRLF and lone CR line endings to LF.
pub fn normalize_line_endings(content: &str) -> Cow<'_, str> {
    if !content.contains('\r') {
        return Cow::Borrowed(content);
    }
    Cow::Owned(content.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Length of `s` in UTF-16 code units.
pub fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

/// Converts a byte offset within `line` to a UTF-16 offset.
///
/// Offsets past the end clamp to the line length. An offset inside a multi-byte
/// character counts that character as consumed.
pub fn byte_offset_to_utf16(line: &str, byte_offset: usize) -> usize {
    let end = byte_offset.min(line.len());
    line.char_indices()
        .take_while(|(i, _)| *i < end)
        .map(|(_, c)| c.len_utf16())
        .sum()
}

/// Converts a UTF-16 offset within `line` to a byte offset.
///
/// Offsets past the end clamp to the line length.
pub fn utf16_to_byte_offset(line: &str, utf16_offset: usize) -> usize {
    let mut units = 0;
    for (i, c) in line.char_indices() {
        if units >= utf16_offset {
            return i;
        }
        units += c.len_utf16();
    }
    line.len()
}

/// Returns line `index` of `content`, after line ending normalization.
pub fn line_at(content: &str, index: usize) -> Option<String> {
    normalize_line_endings(content)
        .split('\n')
        .nth(index)
        .map(str::to_string)
}

/// A zero-based line and UTF-16 character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

/// Finds where token keys are declared in JSON or YAML source.
///
/// Each path segment is searched inside the value of the previous one and at
/// that value's own nesting level, so `color.primary` resolves to the
/// `primary` key directly under `color`, never an earlier or deeper `primary`
/// elsewhere. Nesting is tracked by braces in JSON (ignoring those inside
/// strings) and by indentation in YAML block style. Both quoted JSON keys and
/// bare YAML keys are recognized.
pub struct KeyLocator<'a> {
    text: Cow<'a, str>,
    line_starts: Vec<usize>,
    layout: Layout,
    patterns: HashMap<String, Option<Regex>>,
}

enum Layout {
    /// Offsets of every structural brace or bracket, with the depth after it.
    Braces(Vec<(usize, u32)>),
    Indented,
}

/// Where the keys of one object may appear.
#[derive(Debug, Clone, Copy)]
struct Scope {
    start: usize,
    end: usize,
    /// Brace depth in JSON, indentation in YAML.
    level: u32,
}

impl<'a> KeyLocator<'a> {
    pub fn new(source: &'a str) -> Self {
        let text = normalize_line_endings(source);
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        let layout = if text.trim_start().starts_with('{') {
            Layout::Braces(brace_events(&text))
        } else {
            Layout::Indented
        };
        Self {
            text,
            line_starts,
            layout,
            patterns: HashMap::new(),
        }
    }

    /// Position of the last segment's key, if every segment is found.
    pub fn locate(&mut self, path: &[String]) -> Option<Position> {
        let mut scope = self.top_scope()?;
        let mut found = None;
        for (i, segment) in path.iter().enumerate() {
            let (start, value) = self.find_key(segment, scope)?;
            if i + 1 < path.len() {
                scope = self.value_scope(value, scope)?;
            }
            found = Some(start);
        }
        found.map(|offset| self.position_of(offset))
    }

    fn top_scope(&self) -> Option<Scope> {
        let level = match &self.layout {
            Layout::Braces(_) => 1,
            Layout::Indented => self
                .content_lines(0)
                .next()
                .map(|line| self.indent_of_line(line))?,
        };
        Some(Scope {
            start: 0,
            end: self.text.len(),
            level,
        })
    }

    /// The scope of the object whose value starts at `value`, right after a
    /// key found in `parent`.
    fn value_scope(&self, value: usize, parent: Scope) -> Option<Scope> {
        match &self.layout {
            Layout::Braces(events) => {
                let first = events.partition_point(|&(offset, _)| offset < value);
                let &(open, depth) = events.get(first)?;
                if depth != parent.level + 1 || !self.text[value..open].trim().is_empty() {
                    return None;
                }
                let end = events[first + 1..]
                    .iter()
                    .find(|&&(_, d)| d == parent.level)
                    .map_or(self.text.len(), |&(offset, _)| offset);
                Some(Scope {
                    start: open,
                    end,
                    level: depth,
                })
            }
            Layout::Indented => {
                let key_line = self.line_of(value);
                let child = self.content_lines(key_line + 1).next()?;
                let level = self.indent_of_line(child);
                if level <= parent.level {
                    return None;
                }
                let end = self
                    .content_lines(key_line + 1)
                    .find(|&line| self.indent_of_line(line) <= parent.level)
                    .map_or(parent.end, |line| self.line_starts[line]);
                Some(Scope {
                    start: self.line_starts[child],
                    end: end.min(parent.end),
                    level,
                })
            }
        }
    }

    /// Start of `key` within `scope` and the offset just past its colon.
    fn find_key(&mut self, key: &str, scope: Scope) -> Option<(usize, usize)> {
        let pattern = self
            .patterns
            .entry(key.to_string())
            .or_insert_with(|| {
                let escaped = regex::escape(key);
                Regex::new(&format!(
                    r#"(?m)(?:"({escaped})"|'({escaped})'|(?:^|[\s{{,\[-])({escaped}))\s*:"#
                ))
                .ok()
            })
            .clone()?;

        let haystack = &self.text[..scope.end];
        let mut from = scope.start;
        while let Some(caps) = pattern.captures_at(haystack, from) {
            let whole = caps.get(0)?;
            let key_match = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
            if self.level_at(key_match.start()) == scope.level {
                return Some((key_match.start(), whole.end()));
            }
            from = whole.end();
        }
        None
    }

    /// Brace depth of `offset` in JSON, or the indentation of the line that
    /// starts with the key at `offset` in YAML.
    fn level_at(&self, offset: usize) -> u32 {
        match &self.layout {
            Layout::Braces(events) => {
                let i = events.partition_point(|&(o, _)| o < offset);
                if i == 0 {
                    0
                } else {
                    events[i - 1].1
                }
            }
            Layout::Indented => {
                let line = self.line_of(offset);
                let indent = self.indent_of_line(line);
                let column = offset - self.line_starts[line];
                // The key must open its line, quoted or not.
                if column == indent as usize || column == indent as usize + 1 {
                    indent
                } else {
                    u32::MAX
                }
            }
        }
    }

    fn line_text(&self, line: usize) -> &str {
        let start = self.line_starts[line];
        let end = self
            .line_starts
            .get(line + 1)
            .map_or(self.text.len(), |next| next - 1);
        &self.text[start..end]
    }

    fn indent_of_line(&self, line: usize) -> u32 {
        let text = self.line_text(line);
        (text.len() - text.trim_start_matches(' ').len()) as u32
    }

    /// Lines from `first` on that hold YAML content: not blank, not a
    /// comment and not a document marker.
    fn content_lines(&self, first: usize) -> impl Iterator<Item = usize> + '_ {
        (first..self.line_starts.len()).filter(move |&line| {
            let text = self.line_text(line).trim();
            !text.is_empty() && !text.starts_with('#') && text != "---"
        })
    }

    fn line_of(&self, offset: usize) -> usize {
        match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        }
    }

    fn position_of(&self, offset: usize) -> Position {
        let line = self.line_of(offset);
        let start = self.line_starts[line];
        let character = byte_offset_to_utf16(&self.text[start..], offset - start);
        Position {
            line: line as u32,
            character: character as u32,
        }
    }
}

/// Structural braces and brackets of JSON text, skipping string contents.
fn brace_events(text: &str) -> Vec<(usize, u32)> {
    let mut events = Vec::new();
    let mut depth = 0u32;
    let mut in_string = false;
    let mut escaped = false;
    for (i, byte) in text.bytes().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                events.push((i, depth));
            }
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                events.push((i, depth));
            }
            _ => {}
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_line_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\n"), "a\nb\nc\n");
        assert!(matches!(normalize_line_endings("a\nb"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_utf16_len_counts_surrogate_pairs() {
        assert_eq!(utf16_len("abc"), 3);
        assert_eq!(utf16_len("é"), 1);
        assert_eq!(utf16_len("🎨"), 2);
    }

    #[test]
    fn test_byte_to_utf16() {
        let line = "🎨 {color.a}";
        // 4 bytes for the emoji, one space
        assert_eq!(byte_offset_to_utf16(line, 5), 3);
        assert_eq!(byte_offset_to_utf16(line, 0), 0);
        assert_eq!(byte_offset_to_utf16(line, 1000), utf16_len(line));
    }

    #[test]
    fn test_utf16_to_byte() {
        let line = "é🎨x";
        assert_eq!(utf16_to_byte_offset(line, 0), 0);
        assert_eq!(utf16_to_byte_offset(line, 1), 2);
        assert_eq!(utf16_to_byte_offset(line, 3), 6);
        assert_eq!(utf16_to_byte_offset(line, 99), line.len());
    }

    #[test]
    fn test_line_at() {
        assert_eq!(line_at("a\r\nb\rc", 2).as_deref(), Some("c"));
        assert_eq!(line_at("a", 3), None);
    }

    #[test]
    fn test_locate_nested_json_key() {
        let source = r##"{
  "primary": {"$value": "#000"},
  "color": {
    "primary": {"$value": "#f00"}
  }
}"##;
        let mut locator = KeyLocator::new(source);
        let pos = locator
            .locate(&["color".to_string(), "primary".to_string()])
            .unwrap();
        assert_eq!(pos, Position { line: 3, character: 5 });
    }

    #[test]
    fn test_locate_yaml_key() {
        let source = "color:\n  primary:\n    $value: '#f00'\n";
        let mut locator = KeyLocator::new(source);
        let pos = locator
            .locate(&["color".to_string(), "primary".to_string()])
            .unwrap();
        assert_eq!(pos, Position { line: 1, character: 2 });
    }

    #[test]
    fn test_locate_after_wide_characters() {
        let source = "{\"🎨\": {\"x\": {\"$value\": 1}}}";
        let mut locator = KeyLocator::new(source);
        let pos = locator.locate(&["🎨".to_string(), "x".to_string()]).unwrap();
        // `{"🎨": {"` is 1 + 1 + 2 + 1 + 1 + 1 + 1 + 1 units
        assert_eq!(pos, Position { line: 0, character: 9 });
    }

    #[test]
    fn test_locate_top_level_key_after_nested_namesake() {
        let source = r#"{"a": {"b": {"$value": 0}}, "b": {"$value": 1}}"#;
        let mut locator = KeyLocator::new(source);
        assert_eq!(
            locator.locate(&["b".to_string()]),
            Some(Position { line: 0, character: 29 })
        );
        assert_eq!(
            locator.locate(&["a".to_string(), "b".to_string()]),
            Some(Position { line: 0, character: 8 })
        );
    }

    #[test]
    fn test_locate_stays_inside_the_parent() {
        let source = r#"{"a": {"x": 1}, "c": {"b": {"$value": 1}}}"#;
        let mut locator = KeyLocator::new(source);
        assert_eq!(locator.locate(&["a".to_string(), "b".to_string()]), None);
        // Braces inside strings do not count.
        let source = r#"{"s": {"$value": "{ {"}, "b": {"$value": 1}}"#;
        let mut locator = KeyLocator::new(source);
        assert_eq!(
            locator.locate(&["b".to_string()]),
            Some(Position { line: 0, character: 26 })
        );
    }

    #[test]
    fn test_locate_yaml_by_indentation() {
        let source = "a:\n  b:\n    $value: 0\n# note\nb:\n  $value: 1\n";
        let mut locator = KeyLocator::new(source);
        assert_eq!(
            locator.locate(&["b".to_string()]),
            Some(Position { line: 4, character: 0 })
        );
        assert_eq!(
            locator.locate(&["a".to_string(), "b".to_string()]),
            Some(Position { line: 1, character: 2 })
        );
    }

    #[test]
    fn test_locate_missing_key() {
        let mut locator = KeyLocator::new("{\"a\": 1}");
        assert_eq!(locator.locate(&["b".to_string()]), None);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn utf16_round_trip_on_char_boundaries(s in "\\PC{0,24}") {
                for (i, _) in s.char_indices() {
                    let units = byte_offset_to_utf16(&s, i);
                    prop_assert_eq!(utf16_to_byte_offset(&s, units), i);
                }
            }

            #[test]
            fn utf16_len_matches_encode(s in "\\PC{0,24}") {
                prop_assert_eq!(utf16_len(&s), s.encode_utf16().count());
            }
        }
    }
}
