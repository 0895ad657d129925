//! Language features.
//!
//! Each feature is a plain function over document text and the loaded
//! [`TokenSet`]; the server only moves data between these and the client.

pub mod color;
pub mod completion;
pub mod definition;
pub mod diagnostics;
pub mod hover;
pub mod semantic;

use dtls_core::references::Reference;
use dtls_core::{default_registry, SchemaVersion, Token, TokenSet};

/// The token a reference in a token file names.
///
/// A trailing `$root` is a literal name in Draft files and the group's own
/// token in 2025.10 files. The literal name is tried first.
pub fn referenced_token<'t>(tokens: &'t TokenSet, reference: &Reference) -> Option<&'t Token> {
    tokens
        .get(&reference.token_name(SchemaVersion::Draft))
        .or_else(|| tokens.get(&reference.token_name(SchemaVersion::V2025_10)))
}

/// The value shown for a token in CSS contexts.
///
/// Color tokens are formatted by their schema handler, so a 2025.10 color
/// object shows as its hex or `color()` text. Anything else falls back to the
/// token's display value.
pub fn css_value(token: &Token) -> String {
    if token.is_color() {
        let formatted = default_registry()
            .get(token.schema_version)
            .ok()
            .and_then(|handler| handler.format_color_for_css(token.effective_value()));
        if let Some(css) = formatted {
            return css;
        }
    }
    token.display_value()
}
