//! Diagnostics for stylesheets and token files.

use dtls_core::{Error, TokenSet};
use tower_lsp::lsp_types::{
    Diagnostic, DiagnosticRelatedInformation, DiagnosticSeverity, DiagnosticTag, Position, Range,
};

use super::css_value;
use super::definition::token_location;
use crate::css::find_var_calls;

pub const SOURCE: &str = "design-tokens";

/// Deprecated tokens and mismatched fallbacks in `var()` calls.
///
/// A fallback matches when it equals the token's value ignoring whitespace
/// and ASCII case. Unknown names produce nothing.
pub fn css_diagnostics(tokens: &TokenSet, text: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for call in find_var_calls(text) {
        let Some(token) = tokens.get(&call.name) else {
            continue;
        };

        if token.deprecated {
            let message = match token.deprecation_message.as_deref() {
                Some(reason) if !reason.is_empty() => format!("{} is deprecated: {reason}", call.name),
                _ => format!("{} is deprecated", call.name),
            };
            let related = token_location(token).map(|location| {
                vec![DiagnosticRelatedInformation {
                    location,
                    message: format!("{} is defined here", token.css_variable_name()),
                }]
            });
            diagnostics.push(Diagnostic {
                range: call.range,
                severity: Some(DiagnosticSeverity::INFORMATION),
                source: Some(SOURCE.to_string()),
                message,
                tags: Some(vec![DiagnosticTag::DEPRECATED]),
                related_information: related,
                ..Default::default()
            });
        }

        if let Some(fallback) = call.fallback.as_deref() {
            let expected = css_value(token);
            if normalize(fallback) != normalize(&expected) {
                diagnostics.push(Diagnostic {
                    range: call.range,
                    severity: Some(DiagnosticSeverity::ERROR),
                    source: Some(SOURCE.to_string()),
                    message: format!("Token fallback does not match expected value: {expected}"),
                    ..Default::default()
                });
            }
        }
    }
    diagnostics
}

fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// A file-level diagnostic for a token file that failed to load.
pub fn load_error(error: &Error) -> Diagnostic {
    file_level(error, DiagnosticSeverity::ERROR)
}

/// A file-level diagnostic for a problem that did not stop loading.
pub fn load_warning(warning: &Error) -> Diagnostic {
    file_level(warning, DiagnosticSeverity::WARNING)
}

/// A diagnostic for an alias that could not be resolved.
///
/// It sits on the key of the token that holds the alias when that token can be
/// found in its file, and at the top of the file otherwise.
pub fn resolution_error(tokens: &TokenSet, error: &Error) -> Diagnostic {
    let holder = match error {
        Error::UnresolvedReference { token, .. } => Some(token.as_str()),
        Error::CircularReference { chain, .. } => chain.first().map(String::as_str),
        _ => None,
    };
    let location = holder
        .and_then(|path| tokens.get_qualified(error.file_path(), &path.replace('.', "-")))
        .and_then(token_location);
    let mut diagnostic = load_error(error);
    if let Some(location) = location {
        diagnostic.range = location.range;
    }
    diagnostic
}

fn file_level(error: &Error, severity: DiagnosticSeverity) -> Diagnostic {
    let origin = Position::new(0, 0);
    Diagnostic {
        range: Range::new(origin, origin),
        severity: Some(severity),
        source: Some(SOURCE.to_string()),
        message: error.to_string(),
        ..Default::default()
    }
}
