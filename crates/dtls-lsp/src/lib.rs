//! # dtls-lsp - Language server for DTCG design tokens
//!
//! Loads the token files named in the client's settings with [`dtls_core`]
//! and serves them to stylesheets and token files:
//!
//! - hover on `var(--name)` calls and on `{path}` / `#/path` references
//! - completion of custom property names inside declaration blocks
//! - go to definition of a token's key
//! - diagnostics for deprecated tokens, mismatched `var()` fallbacks and token
//!   files that fail to load
//! - color swatches and presentations
//! - semantic tokens for references in token files
//!
//! The features in [`features`] are plain functions over text and a
//! [`dtls_core::TokenSet`]; [`DesignTokensServer`] wires them to the protocol.

pub mod config;
pub mod css;
pub mod features;
pub mod loader;
mod server;

pub use config::{ServerConfig, TokenFileSpec};
pub use loader::{load_all, LoadReport};
pub use server::{run, DesignTokensServer};
