//! # dtls-core - Design token files across DTCG schema versions
//!
//! `dtls-core` reads design token files written against either the Draft
//! DTCG format or the 2025.10 format and turns them into a flat list of
//! resolved [`Token`]s.
//!
//! ## Pipeline
//!
//! 1. [`detect_version`] chooses a [`SchemaVersion`]: an explicit `$schema`
//!    first, then configuration, then duck typing, then Draft.
//! 2. [`schema::validate_document`] rejects files that mix features of
//!    different versions.
//! 3. [`parser::parse_tokens`] walks the tree into tokens, folding `$root` and
//!    legacy group markers into the group's own path.
//! 4. [`resolver::resolve_aliases`] and [`resolver::resolve_extends`] replace
//!    references with values and apply group inheritance.
//!
//! [`TokenFile::load`] runs all four steps. Failures are [`Error`]s that name
//! the file and, where useful, carry a suggestion.
//!
//! ## Quick start
//!
//! ```rust
//! use dtls_core::{LoadOptions, TokenFile, TokenSet};
//!
//! let content = r##"{
//!   "color": {
//!     "brand": {"_": {"$type": "color", "$value": "#0055ff"}},
//!     "link": {"$type": "color", "$value": "{color.brand}"}
//!   }
//! }"##;
//! let file = TokenFile::load("tokens.json", content, &LoadOptions::default()).unwrap();
//!
//! let mut set = TokenSet::new();
//! set.add_file(file.file_path, file.tokens);
//! let link = set.get("--color-link").unwrap();
//! assert_eq!(link.display_value(), "#0055ff");
//! ```

pub mod color;
mod error;
pub mod file;
pub mod parser;
pub mod position;
pub mod references;
pub mod resolver;
pub mod root;
pub mod schema;
pub mod token;

pub use color::{parse_color_value, ColorValue};
pub use error::{Error, ErrorKind, Result};
pub use file::{LoadOptions, TokenFile};
pub use parser::ParseOptions;
pub use schema::{
    default_registry, detect_version, validate_schema_consistency, DetectionConfig, Registry,
    SchemaHandler, SchemaVersion,
};
pub use token::{Token, TokenSet};
