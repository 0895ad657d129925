//! Group inheritance through `$extends`.
//!
//! Groups form their own graph, separate from the token alias graph: each
//! extending group has one edge to its target. Targets are merged before the
//! groups that extend them, so inheritance chains compose.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::parser::GroupExtension;
use crate::references::{is_alias, Reference};
use crate::schema::SchemaVersion;
use crate::token::Token;

/// Path segments of an `$extends` target: `#/a/b`, `{a.b}` or a bare `a/b`.
fn target_path(target: &str) -> Vec<String> {
    let reference = if is_alias(target) {
        Reference::curly(&target[1..target.len() - 1])
    } else {
        Reference::pointer(target.strip_prefix("#/").unwrap_or(target))
    };
    reference.segments_for(SchemaVersion::V2025_10)
}

/// Copies each extended group's tokens under the extending group.
///
/// Tokens the extending group already defines win over inherited ones, at any
/// depth. Inherited tokens keep their source location and values, including
/// resolved values.
///
/// A target group with no tokens fails with [`Error::UnresolvedReference`].
/// An `$extends` cycle fails with [`Error::CircularReference`] naming the
/// groups by dotted path.
pub fn resolve_extends(
    tokens: &mut Vec<Token>,
    extensions: &[GroupExtension],
    file_path: &str,
) -> Result<()> {
    if extensions.is_empty() {
        return Ok(());
    }

    let edges: HashMap<&[String], (Vec<String>, &str)> = extensions
        .iter()
        .map(|ext| {
            (
                ext.group_path.as_slice(),
                (target_path(&ext.target), ext.target.as_str()),
            )
        })
        .collect();

    let mut done: HashSet<Vec<String>> = HashSet::new();
    for ext in extensions {
        // Follow the chain of targets until a group that needs no merge.
        let mut chain: Vec<&[String]> = vec![ext.group_path.as_slice()];
        loop {
            let Some(current) = chain.last().copied() else {
                break;
            };
            if done.contains(current) {
                chain.pop();
                break;
            }
            let Some((next, _)) = edges.get(current) else {
                chain.pop();
                break;
            };
            if let Some(from) = chain.iter().position(|g| *g == next.as_slice()) {
                let cycle = chain[from..]
                    .iter()
                    .chain(std::iter::once(&next.as_slice()))
                    .map(|g| g.join("."))
                    .collect();
                return Err(Error::circular(file_path, cycle));
            }
            chain.push(next.as_slice());
        }

        for group in chain.into_iter().rev() {
            if let Some((target, raw)) = edges.get(group) {
                let Some(inherited) = merge_group(tokens, group, target) else {
                    return Err(Error::unresolved(file_path, group.join("."), *raw));
                };
                tracing::debug!(
                    group = %group.join("."),
                    target = %raw,
                    inherited,
                    "group extended"
                );
            }
            done.insert(group.to_vec());
        }
    }
    Ok(())
}

/// Clones `target`'s tokens under `group`. Returns how many were added, or
/// `None` when the target has no tokens at all.
fn merge_group(tokens: &mut Vec<Token>, group: &[String], target: &[String]) -> Option<usize> {
    let existing: HashSet<Vec<String>> = tokens.iter().map(|t| t.path.clone()).collect();
    let mut found = false;
    let mut inherited = Vec::new();

    for token in tokens.iter() {
        let Some(relative) = token.path.strip_prefix(target) else {
            continue;
        };
        found = true;
        let path = [group, relative].concat();
        if existing.contains(&path) {
            continue;
        }
        inherited.push(rebase(token, path));
    }

    if !found {
        return None;
    }
    let count = inherited.len();
    tokens.extend(inherited);
    Some(count)
}

fn rebase(token: &Token, path: Vec<String>) -> Token {
    Token {
        name: path.join("-"),
        path,
        ..token.clone()
    }
}
