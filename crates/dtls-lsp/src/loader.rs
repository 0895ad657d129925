//! Loading the configured token files into one [`TokenSet`].

use std::path::{Path, PathBuf};

use dtls_core::{Error, TokenFile, TokenSet};
use tower_lsp::lsp_types::Url;

use crate::config::{resolve_path, ServerConfig, TokenFileSpec};

/// The outcome of loading every configured file.
///
/// A file that fails to load is reported and skipped; the others still load.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub tokens: TokenSet,
    /// Files that failed to load.
    pub failures: Vec<(PathBuf, Error)>,
    /// Problems that did not stop a file from loading.
    pub warnings: Vec<(PathBuf, Error)>,
    /// Aliases that could not be resolved, by the file that holds them. The
    /// tokens stay loaded and everything else resolves.
    pub resolution_errors: Vec<(PathBuf, Error)>,
}

impl LoadReport {
    /// Paths of every configured file, loaded or not.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.tokens
            .source_files()
            .map(Path::new)
            .chain(self.failures.iter().map(|(path, _)| path.as_path()))
    }
}

/// Loads one configured file.
pub fn load_file(config: &ServerConfig, spec: &TokenFileSpec, root: Option<&Path>) -> dtls_core::Result<TokenFile> {
    let path = resolve_path(spec.path(), root);
    let mut options = config.load_options(spec);
    options.definition_uri = Url::from_file_path(&path)
        .map(|uri| uri.to_string())
        .unwrap_or_default();
    TokenFile::from_path(&path, &options)
}

/// Loads every configured file, then resolves aliases across all of them.
pub fn load_all(config: &ServerConfig, root: Option<&Path>) -> LoadReport {
    let mut report = LoadReport::default();
    for spec in &config.tokens_files {
        let path = resolve_path(spec.path(), root);
        match load_file(config, spec, root) {
            Ok(file) => {
                report
                    .warnings
                    .extend(file.warnings.into_iter().map(|w| (path.clone(), w)));
                report.tokens.add_file(file.file_path, file.tokens);
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to load token file");
                report.failures.push((path, err));
            }
        }
    }

    for err in report.tokens.resolve_aliases() {
        tracing::warn!(path = %err.file_path(), error = %err, "failed to resolve token alias");
        report
            .resolution_errors
            .push((PathBuf::from(err.file_path()), err));
    }

    tracing::info!(
        files = config.tokens_files.len(),
        tokens = report.tokens.len(),
        failures = report.failures.len(),
        unresolved = report.resolution_errors.len(),
        "token files loaded"
    );
    report
}
