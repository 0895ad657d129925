//! Alias resolution.
//!
//! Tokens form a graph whose edges are the references in each token's raw
//! value. Resolution is a depth-first walk with an explicit stack: a target is
//! resolved before the token that references it, and tokens already marked
//! resolved are reused as they are.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::references::{collect_references, interpolate, is_alias, Reference, ReferenceKind};
use crate::schema::SchemaVersion;
use crate::token::{display_value, Token};

/// Outgoing edges of each token, by index.
struct Graph {
    index: HashMap<Vec<String>, usize>,
    edges: Vec<Vec<usize>>,
}

impl Graph {
    /// Builds the graph, recording one error for each token whose references
    /// cannot be followed. Such tokens are left without edges.
    fn build(tokens: &[Token], file_path: &str, errors: &mut Vec<(usize, Error)>) -> Self {
        let index: HashMap<Vec<String>, usize> = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.path.clone(), i))
            .collect();

        let mut edges = Vec::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            let file = origin(token, file_path);
            let targets = collect_references(&token.raw_value, token.schema_version)
                .map_err(|e| e.with_file_path(file))
                .and_then(|refs| {
                    refs.iter()
                        .map(|reference| {
                            index
                                .get(&reference.segments_for(token.schema_version))
                                .copied()
                                .ok_or_else(|| {
                                    Error::unresolved(file, token.path.join("."), reference.to_string())
                                })
                        })
                        .collect::<Result<Vec<_>>>()
                });
            match targets {
                Ok(targets) => edges.push(targets),
                Err(err) => {
                    errors.push((i, err));
                    edges.push(Vec::new());
                }
            }
        }
        Self { index, edges }
    }

    fn target<'t>(
        &self,
        tokens: &'t [Token],
        reference: &Reference,
        version: SchemaVersion,
    ) -> Option<&'t Token> {
        self.index
            .get(&reference.segments_for(version))
            .map(|&i| &tokens[i])
    }
}

/// The file a token's errors are reported against.
fn origin<'a>(token: &'a Token, file_path: &'a str) -> &'a str {
    if file_path.is_empty() {
        &token.file_path
    } else {
        file_path
    }
}

/// Resolves every alias in `tokens`.
///
/// Each token ends up with `resolved_value` set and `is_resolved` true:
///
/// - a value that is exactly one reference (`"{a.b}"` or `{"$ref": "#/a/b"}`)
///   takes the target's resolved value, structure included;
/// - references embedded in a longer string are replaced by the target's
///   display string;
/// - objects and arrays are resolved member by member;
/// - anything else resolves to itself.
///
/// A reference to a missing token fails with [`Error::UnresolvedReference`]. A
/// cycle fails with [`Error::CircularReference`] whose chain runs from the
/// first repeated token back to itself. See [`resolve_aliases_partial`] to
/// keep going past failures.
pub fn resolve_aliases(tokens: &mut [Token], file_path: &str) -> Result<()> {
    match resolve_aliases_partial(tokens, file_path).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Resolves every alias that can be resolved and returns the failures.
///
/// A token whose reference is missing, malformed or part of a cycle is left
/// unresolved, as is every token that depends on it. All other tokens resolve
/// as in [`resolve_aliases`]. Each error names the file of the token it is
/// about, or `file_path` when that is not empty. Reference errors come first,
/// in token order, followed by cycles in the order they are found.
pub fn resolve_aliases_partial(tokens: &mut [Token], file_path: &str) -> Vec<Error> {
    let mut broken = Vec::new();
    let graph = Graph::build(tokens, file_path, &mut broken);

    let mut failed = vec![false; tokens.len()];
    for &(i, _) in &broken {
        failed[i] = true;
    }
    let mut errors: Vec<Error> = broken.into_iter().map(|(_, err)| err).collect();
    let mut on_stack = vec![false; tokens.len()];

    for start in 0..tokens.len() {
        if tokens[start].is_resolved || failed[start] {
            continue;
        }

        // (token, next edge to follow)
        let mut stack = vec![(start, 0usize)];
        on_stack[start] = true;

        while let Some(frame) = stack.last_mut() {
            let (node, edge) = *frame;
            if let Some(&target) = graph.edges[node].get(edge) {
                frame.1 += 1;
                if tokens[target].is_resolved {
                    continue;
                }
                if on_stack[target] || failed[target] {
                    if on_stack[target] {
                        let file = origin(&tokens[target], file_path);
                        errors.push(Error::circular(file, cycle_chain(tokens, &stack, target)));
                    }
                    // Everything on the stack depends on the failure.
                    for (n, _) in stack.drain(..) {
                        failed[n] = true;
                        on_stack[n] = false;
                    }
                    break;
                }
                on_stack[target] = true;
                stack.push((target, 0));
                continue;
            }

            let version = tokens[node].schema_version;
            let resolved = substitute(&tokens[node].raw_value, tokens, &graph, version);
            let token = &mut tokens[node];
            token.resolved_value = Some(resolved);
            token.is_resolved = true;
            on_stack[node] = false;
            stack.pop();
        }
    }

    tracing::debug!(
        file = %file_path,
        tokens = tokens.len(),
        errors = errors.len(),
        "aliases resolved"
    );
    errors
}

fn cycle_chain(tokens: &[Token], stack: &[(usize, usize)], repeated: usize) -> Vec<String> {
    let from = stack.iter().position(|&(n, _)| n == repeated).unwrap_or(0);
    stack[from..]
        .iter()
        .map(|&(n, _)| n)
        .chain(std::iter::once(repeated))
        .map(|n| tokens[n].path.join("."))
        .collect()
}

fn substitute(value: &Value, tokens: &[Token], graph: &Graph, version: SchemaVersion) -> Value {
    let resolved_target = |reference: &Reference| {
        graph
            .target(tokens, reference, version)
            .map(|t| t.effective_value().clone())
    };

    match value {
        Value::String(s) if is_alias(s) => {
            let reference = Reference::curly(&s[1..s.len() - 1]);
            resolved_target(&reference).unwrap_or_else(|| value.clone())
        }
        Value::String(s) => Value::String(interpolate(s, |reference| {
            graph
                .target(tokens, reference, version)
                .map(|t| display_value(t.effective_value()))
        })),
        Value::Object(obj) => match obj.get("$ref").and_then(Value::as_str) {
            Some(pointer) => {
                let reference = Reference {
                    kind: ReferenceKind::JsonPointer,
                    path: pointer.strip_prefix("#/").unwrap_or(pointer).to_string(),
                };
                resolved_target(&reference).unwrap_or_else(|| value.clone())
            }
            None => Value::Object(
                obj.iter()
                    .map(|(k, v)| (k.clone(), substitute(v, tokens, graph, version)))
                    .collect::<Map<_, _>>(),
            ),
        },
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| substitute(v, tokens, graph, version))
                .collect(),
        ),
        other => other.clone(),
    }
}
