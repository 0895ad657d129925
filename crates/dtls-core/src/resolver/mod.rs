//! Alias and `$extends` resolution.
//!
//! Aliases are resolved first, then group inheritance is applied so inherited
//! tokens carry their resolved values along.

mod aliases;
mod extends;

pub use aliases::{resolve_aliases, resolve_aliases_partial};
pub use extends::resolve_extends;
