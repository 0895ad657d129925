//! Go to definition.

use dtls_core::references::find_reference_at_position;
use dtls_core::{Token, TokenSet};
use tower_lsp::lsp_types::{Location, Position, Range, Url};

use super::referenced_token;
use crate::css::var_call_at;

/// Where `token` is defined: its key in the source file.
///
/// Uses the token's definition URI when it parses, otherwise the file path.
pub fn token_location(token: &Token) -> Option<Location> {
    let uri = Url::parse(&token.definition_uri)
        .ok()
        .or_else(|| Url::from_file_path(&token.file_path).ok())?;
    let position = Position::new(token.line, token.character);
    Some(Location {
        uri,
        range: Range::new(position, position),
    })
}

/// Definition of the token named by the `var()` call at `position`.
pub fn css_definition(tokens: &TokenSet, text: &str, position: Position) -> Option<Location> {
    let call = var_call_at(text, position)?;
    token_location(tokens.get(&call.name)?)
}

/// Definition of the token a reference in a token file points at.
pub fn token_file_definition(tokens: &TokenSet, text: &str, position: Position) -> Option<Location> {
    let found = find_reference_at_position(text, position.line, position.character)?;
    token_location(referenced_token(tokens, &found.reference)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtls_core::SchemaVersion;
    use serde_json::json;

    fn set() -> TokenSet {
        let mut token = Token::new(
            vec!["color".into(), "primary".into()],
            json!("#f00"),
            SchemaVersion::V2025_10,
        );
        token.definition_uri = "file:///work/tokens.json".into();
        token.file_path = "/work/tokens.json".into();
        token.line = 3;
        token.character = 5;
        let mut set = TokenSet::new();
        set.add_file("/work/tokens.json", vec![token]);
        set
    }

    #[test]
    fn test_css_definition() {
        let location = css_definition(&set(), "a { color: var(--color-primary); }", Position::new(0, 14)).unwrap();
        assert_eq!(location.uri.as_str(), "file:///work/tokens.json");
        assert_eq!(location.range.start, Position::new(3, 5));
    }

    #[test]
    fn test_unknown_names_have_no_definition() {
        assert!(css_definition(&set(), "a { color: var(--nope); }", Position::new(0, 14)).is_none());
    }

    #[test]
    fn test_pointer_reference_definition() {
        let text = r##"{"link": {"$ref": "#/color/primary"}}"##;
        let location = token_file_definition(&set(), text, Position::new(0, 22)).unwrap();
        assert_eq!(location.range.start, Position::new(3, 5));
    }

    #[test]
    fn test_falls_back_to_file_path() {
        let mut token = Token::new(vec!["a".into()], json!(1), SchemaVersion::Draft);
        token.file_path = "/tmp/a.json".into();
        let location = token_location(&token).unwrap();
        assert_eq!(location.uri.as_str(), "file:///tmp/a.json");
    }
}
