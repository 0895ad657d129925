//! Completion of custom property names inside declaration blocks.

use dtls_core::TokenSet;
use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, CompletionItemTag, CompletionTextEdit, Documentation,
    InsertTextFormat, MarkupContent, MarkupKind, Position, TextEdit,
};

use super::css_value;
use super::hover::token_markdown;
use crate::css::{in_block, word_before};

/// Completions for the word before `position`.
///
/// Only offered inside a `{ ... }` block. The typed word and each token name
/// are compared without leading dashes, so `col`, `-col` and `--col` all match
/// `--color-primary`. Accepting an item replaces the word with a `var()`
/// snippet whose fallback placeholder holds the token's value.
pub fn completions(tokens: &TokenSet, text: &str, position: Position) -> Vec<CompletionItem> {
    if !in_block(text, position) {
        return Vec::new();
    }
    let Some((word, range)) = word_before(text, position) else {
        return Vec::new();
    };
    let typed = word.trim_start_matches('-');

    let mut items: Vec<CompletionItem> = tokens
        .all()
        .filter(|token| {
            token
                .css_variable_name()
                .trim_start_matches('-')
                .starts_with(typed)
        })
        .map(|token| {
            let name = token.css_variable_name();
            let value = css_value(token);
            CompletionItem {
                label: name.clone(),
                kind: Some(CompletionItemKind::VARIABLE),
                detail: Some(value.clone()),
                documentation: Some(Documentation::MarkupContent(MarkupContent {
                    kind: MarkupKind::Markdown,
                    value: token_markdown(token),
                })),
                tags: token
                    .deprecated
                    .then(|| vec![CompletionItemTag::DEPRECATED]),
                filter_text: Some(name.clone()),
                insert_text_format: Some(InsertTextFormat::SNIPPET),
                text_edit: Some(CompletionTextEdit::Edit(TextEdit {
                    range,
                    new_text: format!("var({name}${{1:, {}}})$0", escape_snippet(&value)),
                })),
                ..Default::default()
            }
        })
        .collect();
    items.sort_by(|a, b| a.label.cmp(&b.label));
    items.dedup_by(|a, b| a.label == b.label);
    items
}

/// Escapes text for use inside a snippet placeholder.
fn escape_snippet(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '$' | '}' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
