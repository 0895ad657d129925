//! Hover content for tokens.
//!
//! Token hovers are rendered from a markdown template: the name as a heading,
//! then description, value, type, deprecation and source file, each only when
//! present.

use dtls_core::references::find_reference_at_position;
use dtls_core::{Token, TokenSet};
use minijinja::{context, Environment};
use once_cell::sync::Lazy;
use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position, Range};

use super::{css_value, referenced_token};
use crate::css::var_call_at;

const TOKEN_HOVER: &str = "token_hover";

const TOKEN_HOVER_TEMPLATE: &str = "# {{ name }}\n\
{% if description %}\n{{ description }}\n{% endif %}\n\
**Value**: `{{ value }}`\n\
{% if token_type %}**Type**: `{{ token_type }}`\n{% endif %}\
{% if deprecated %}\n⚠️ **DEPRECATED**{% if deprecation_message %}: {{ deprecation_message }}{% endif %}\n{% endif %}\
{% if file_path %}\n*Defined in: {{ file_path }}*\n{% endif %}";

static TEMPLATES: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.add_template(TOKEN_HOVER, TOKEN_HOVER_TEMPLATE)
        .expect("hover template is valid");
    env
});

/// Markdown describing `token`.
pub fn token_markdown(token: &Token) -> String {
    let name = token.css_variable_name();
    let rendered = TEMPLATES.get_template(TOKEN_HOVER).and_then(|template| {
        template.render(context! {
            name => &name,
            description => &token.description,
            value => css_value(token),
            token_type => &token.token_type,
            deprecated => token.deprecated,
            deprecation_message => &token.deprecation_message,
            file_path => &token.file_path,
        })
    });
    rendered.unwrap_or_else(|err| {
        tracing::warn!(error = %err, token = %name, "failed to render hover");
        format!("# {name}")
    })
}

/// Markdown for a `var()` name no loaded file defines.
pub fn unknown_token_markdown(name: &str) -> String {
    format!("❌ **Unknown token**: `{name}`\n\nThis token is not defined in any loaded token files.")
}

fn markdown(value: String, range: Range) -> Hover {
    Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value,
        }),
        range: Some(range),
    }
}

/// Hover over a `var()` call in a stylesheet.
pub fn css_hover(tokens: &TokenSet, text: &str, position: Position) -> Option<Hover> {
    let call = var_call_at(text, position)?;
    let value = match tokens.get(&call.name) {
        Some(token) => token_markdown(token),
        None => unknown_token_markdown(&call.name),
    };
    Some(markdown(value, call.range))
}

/// Hover over a `{path}` or `#/path` reference inside a token file.
pub fn token_file_hover(tokens: &TokenSet, text: &str, position: Position) -> Option<Hover> {
    let found = find_reference_at_position(text, position.line, position.character)?;
    let token = referenced_token(tokens, &found.reference)?;
    let range = Range::new(
        Position::new(found.line, found.start),
        Position::new(found.line, found.end),
    );
    Some(markdown(token_markdown(token), range))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtls_core::SchemaVersion;
    use serde_json::json;

    fn primary() -> Token {
        let mut token = Token::new(
            vec!["color".into(), "primary".into()],
            json!("#ff0000"),
            SchemaVersion::Draft,
        );
        token.token_type = Some("color".into());
        token.description = Some("Brand red".into());
        token.file_path = "tokens.json".into();
        token
    }

    #[test]
    fn test_full_hover() {
        insta::assert_snapshot!(token_markdown(&primary()).trim_end(), @r"
        # --color-primary

        Brand red

        **Value**: `#ff0000`
        **Type**: `color`

        *Defined in: tokens.json*
        ");
    }

    #[test]
    fn test_minimal_hover() {
        let token = Token::new(vec!["space".into()], json!("4px"), SchemaVersion::Draft);
        assert_eq!(token_markdown(&token), "# --space\n\n**Value**: `4px`\n");
    }

    #[test]
    fn test_deprecated_hover() {
        let mut token = primary();
        token.deprecated = true;
        token.deprecation_message = Some("Use --color-brand".into());
        let text = token_markdown(&token);
        assert!(text.contains("⚠️ **DEPRECATED**: Use --color-brand"), "{text}");

        token.deprecation_message = None;
        let text = token_markdown(&token);
        assert!(text.contains("⚠️ **DEPRECATED**\n"), "{text}");
    }

    #[test]
    fn test_structured_color_value() {
        let mut token = Token::new(
            vec!["c".into()],
            json!({"colorSpace": "srgb", "components": [1, 0.5, 0]}),
            SchemaVersion::V2025_10,
        );
        token.token_type = Some("color".into());
        assert!(token_markdown(&token).contains("**Value**: `color(srgb 1 0.5 0 / 1)`"));
    }

    #[test]
    fn test_css_hover() {
        let mut set = TokenSet::new();
        set.add_file("tokens.json", vec![primary()]);
        let text = "a { color: var(--color-primary); background: var(--missing); }";

        let hover = css_hover(&set, text, Position::new(0, 16)).unwrap();
        assert_eq!(hover.range, Some(Range::new(Position::new(0, 11), Position::new(0, 31))));
        let HoverContents::Markup(content) = hover.contents else {
            panic!("expected markup");
        };
        assert!(content.value.starts_with("# --color-primary"));

        let hover = css_hover(&set, text, Position::new(0, 50)).unwrap();
        let HoverContents::Markup(content) = hover.contents else {
            panic!("expected markup");
        };
        assert_eq!(
            content.value,
            "❌ **Unknown token**: `--missing`\n\nThis token is not defined in any loaded token files."
        );

        assert!(css_hover(&set, text, Position::new(0, 2)).is_none());
    }

    #[test]
    fn test_token_file_hover() {
        let mut set = TokenSet::new();
        set.add_file("tokens.json", vec![primary()]);
        let text = "{\n  \"link\": {\"$value\": \"{color.primary}\"}\n}";
        let hover = token_file_hover(&set, text, Position::new(1, 26)).unwrap();
        assert_eq!(hover.range, Some(Range::new(Position::new(1, 22), Position::new(1, 37))));
        assert!(token_file_hover(&set, text, Position::new(1, 4)).is_none());
    }
}
