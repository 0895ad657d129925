//! LSP server implementation

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};

use crate::config::{resolve_path, ServerConfig};
use crate::css::is_css_language;
use crate::features::{color, completion, definition, diagnostics, hover, semantic};
use crate::loader::{self, LoadReport};

/// What the server does with a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Stylesheet,
    TokenFile,
    Other,
}

impl DocumentKind {
    fn detect(uri: &Url, language_id: &str) -> Self {
        if is_css_language(language_id) {
            return DocumentKind::Stylesheet;
        }
        if matches!(language_id, "json" | "jsonc" | "yaml") {
            return DocumentKind::TokenFile;
        }
        let extension = Path::new(uri.path())
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("css" | "scss" | "less" | "pcss" | "sass") => DocumentKind::Stylesheet,
            Some("json" | "yaml" | "yml") => DocumentKind::TokenFile,
            _ => DocumentKind::Other,
        }
    }
}

/// An open document.
struct Document {
    text: String,
    kind: DocumentKind,
    version: i32,
}

/// Configuration and the tokens loaded from it.
#[derive(Default)]
struct Workspace {
    config: ServerConfig,
    root: Option<PathBuf>,
    report: LoadReport,
    /// Documents that currently have diagnostics on the client.
    published: HashSet<Url>,
}

impl Workspace {
    fn is_configured(&self, path: &Path) -> bool {
        self.config
            .tokens_files
            .iter()
            .any(|spec| resolve_path(spec.path(), self.root.as_deref()) == path)
    }

    /// Load errors, unresolved aliases and warnings keyed by the file they
    /// belong to.
    fn load_diagnostics(&self) -> HashMap<Url, Vec<Diagnostic>> {
        let mut out: HashMap<Url, Vec<Diagnostic>> = HashMap::new();
        let errors = self
            .report
            .failures
            .iter()
            .map(|(path, err)| (path, diagnostics::load_error(err)));
        let unresolved = self.report.resolution_errors.iter().map(|(path, err)| {
            (path, diagnostics::resolution_error(&self.report.tokens, err))
        });
        let warnings = self
            .report
            .warnings
            .iter()
            .map(|(path, warning)| (path, diagnostics::load_warning(warning)));
        for (path, diagnostic) in errors.chain(unresolved).chain(warnings) {
            if let Ok(uri) = Url::from_file_path(path) {
                out.entry(uri).or_default().push(diagnostic);
            }
        }
        out
    }
}

/// The design tokens language server
pub struct DesignTokensServer {
    /// LSP client for sending notifications
    client: Client,
    /// Open documents
    documents: Arc<RwLock<HashMap<Url, Document>>>,
    workspace: Arc<RwLock<Workspace>>,
}

impl DesignTokensServer {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: Arc::new(RwLock::new(HashMap::new())),
            workspace: Arc::new(RwLock::new(Workspace::default())),
        }
    }

    /// Reloads every configured token file and refreshes all diagnostics.
    async fn reload(&self) {
        let (config, root) = {
            let workspace = self.workspace.read().await;
            (workspace.config.clone(), workspace.root.clone())
        };
        let loaded =
            tokio::task::spawn_blocking(move || loader::load_all(&config, root.as_deref())).await;
        let report = match loaded {
            Ok(report) => report,
            Err(err) => {
                tracing::error!(error = %err, "token loading task failed");
                return;
            }
        };

        if !report.resolution_errors.is_empty() {
            self.client
                .log_message(
                    MessageType::WARNING,
                    format!(
                        "{} token alias(es) could not be resolved",
                        report.resolution_errors.len()
                    ),
                )
                .await;
        }
        for (path, err) in &report.failures {
            self.client
                .log_message(
                    MessageType::ERROR,
                    format!("{}: {}", path.display(), err),
                )
                .await;
        }

        self.workspace.write().await.report = report;
        self.publish_all().await;
    }

    /// Publishes diagnostics for every open stylesheet and every token file
    /// with load problems, and clears diagnostics that no longer apply.
    async fn publish_all(&self) {
        let (mut batch, stale) = {
            let workspace = self.workspace.read().await;
            let documents = self.documents.read().await;

            let mut batch: HashMap<Url, (Vec<Diagnostic>, Option<i32>)> = workspace
                .load_diagnostics()
                .into_iter()
                .map(|(uri, list)| (uri, (list, None)))
                .collect();
            for (uri, document) in documents.iter() {
                if document.kind == DocumentKind::Stylesheet {
                    let list = diagnostics::css_diagnostics(&workspace.report.tokens, &document.text);
                    batch.insert(uri.clone(), (list, Some(document.version)));
                }
            }
            let stale: Vec<Url> = workspace
                .published
                .iter()
                .filter(|uri| !batch.contains_key(*uri))
                .cloned()
                .collect();
            (batch, stale)
        };
        for uri in stale {
            batch.insert(uri, (Vec::new(), None));
        }

        {
            let mut workspace = self.workspace.write().await;
            workspace.published = batch
                .iter()
                .filter(|(_, (list, _))| !list.is_empty())
                .map(|(uri, _)| uri.clone())
                .collect();
        }
        for (uri, (list, version)) in batch {
            self.client.publish_diagnostics(uri, list, version).await;
        }
    }

    /// Publishes diagnostics for one stylesheet.
    async fn publish_document(&self, uri: Url) {
        let (list, version) = {
            let workspace = self.workspace.read().await;
            let documents = self.documents.read().await;
            let Some(document) = documents.get(&uri) else {
                return;
            };
            if document.kind != DocumentKind::Stylesheet {
                return;
            }
            (
                diagnostics::css_diagnostics(&workspace.report.tokens, &document.text),
                document.version,
            )
        };
        {
            let mut workspace = self.workspace.write().await;
            if list.is_empty() {
                workspace.published.remove(&uri);
            } else {
                workspace.published.insert(uri.clone());
            }
        }
        self.client
            .publish_diagnostics(uri, list, Some(version))
            .await;
    }

    /// Reloads when `uri` is one of the configured token files.
    async fn reload_if_configured(&self, uri: &Url) -> bool {
        let Ok(path) = uri.to_file_path() else {
            return false;
        };
        let configured = self.workspace.read().await.is_configured(&path);
        if configured {
            tracing::debug!(path = %path.display(), "configured token file changed");
            self.reload().await;
        }
        configured
    }

    async fn register_file_watcher(&self) {
        let options = DidChangeWatchedFilesRegistrationOptions {
            watchers: vec![FileSystemWatcher {
                glob_pattern: GlobPattern::String("**/*.{json,yaml,yml}".to_string()),
                kind: None,
            }],
        };
        let register_options = match serde_json::to_value(options) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, "failed to encode watcher registration");
                return;
            }
        };
        let registration = Registration {
            id: "design-tokens-watcher".to_string(),
            method: "workspace/didChangeWatchedFiles".to_string(),
            register_options: Some(register_options),
        };
        if let Err(err) = self.client.register_capability(vec![registration]).await {
            tracing::debug!(error = %err, "client does not accept file watchers");
        }
    }

    /// Runs `f` over the document at `uri` and the loaded tokens.
    async fn with_document<T>(
        &self,
        uri: &Url,
        f: impl FnOnce(&Document, &Workspace) -> Option<T>,
    ) -> Option<T> {
        let workspace = self.workspace.read().await;
        let documents = self.documents.read().await;
        f(documents.get(uri)?, &workspace)
    }
}

fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    if let Some(folder) = params.workspace_folders.as_ref().and_then(|f| f.first()) {
        return folder.uri.to_file_path().ok();
    }
    #[allow(deprecated)]
    let root_uri = params.root_uri.as_ref();
    root_uri.and_then(|uri| uri.to_file_path().ok())
}

#[tower_lsp::async_trait]
impl LanguageServer for DesignTokensServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let root = workspace_root(&params);
        let config = match params.initialization_options.clone() {
            Some(options) => ServerConfig::from_value(options).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "invalid initialization options, using defaults");
                ServerConfig::default()
            }),
            None => ServerConfig::default(),
        };
        tracing::info!(
            root = ?root,
            files = config.tokens_files.len(),
            "initializing"
        );
        {
            let mut workspace = self.workspace.write().await;
            workspace.root = root;
            workspace.config = config;
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::FULL),
                        save: Some(TextDocumentSyncSaveOptions::Supported(true)),
                        ..Default::default()
                    },
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec!["-".into()]),
                    resolve_provider: Some(false),
                    ..Default::default()
                }),
                definition_provider: Some(OneOf::Left(true)),
                color_provider: Some(ColorProviderCapability::Simple(true)),
                semantic_tokens_provider: Some(
                    SemanticTokensServerCapabilities::SemanticTokensOptions(
                        SemanticTokensOptions {
                            legend: semantic::legend(),
                            range: Some(false),
                            full: Some(SemanticTokensFullOptions::Bool(true)),
                            work_done_progress_options: WorkDoneProgressOptions::default(),
                        },
                    ),
                ),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "design-tokens-language-server".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.register_file_watcher().await;
        self.reload().await;
        self.client
            .log_message(MessageType::INFO, "Design tokens language server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let item = params.text_document;
        let kind = DocumentKind::detect(&item.uri, &item.language_id);
        tracing::debug!(uri = %item.uri, ?kind, "opened");
        self.documents.write().await.insert(
            item.uri.clone(),
            Document {
                text: item.text,
                kind,
                version: item.version,
            },
        );
        self.publish_document(item.uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        // Full sync: the last change holds the whole text.
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        {
            let mut documents = self.documents.write().await;
            let Some(document) = documents.get_mut(&uri) else {
                return;
            };
            document.text = change.text;
            document.version = params.text_document.version;
        }
        self.publish_document(uri).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        self.reload_if_configured(&params.text_document.uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        let removed = self.documents.write().await.remove(&uri);
        if removed.is_some_and(|d| d.kind == DocumentKind::Stylesheet) {
            self.workspace.write().await.published.remove(&uri);
            self.client.publish_diagnostics(uri, Vec::new(), None).await;
        }
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        match ServerConfig::from_value(params.settings) {
            Ok(config) => {
                tracing::info!(files = config.tokens_files.len(), "configuration changed");
                self.workspace.write().await.config = config;
                self.reload().await;
            }
            Err(err) => {
                self.client
                    .log_message(MessageType::ERROR, format!("invalid settings: {err}"))
                    .await;
            }
        }
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        for change in params.changes {
            // One reload covers every change in the batch.
            if self.reload_if_configured(&change.uri).await {
                break;
            }
        }
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        Ok(self
            .with_document(&uri, |document, workspace| {
                let tokens = &workspace.report.tokens;
                match document.kind {
                    DocumentKind::Stylesheet => hover::css_hover(tokens, &document.text, position),
                    DocumentKind::TokenFile => {
                        hover::token_file_hover(tokens, &document.text, position)
                    }
                    DocumentKind::Other => None,
                }
            })
            .await)
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        Ok(self
            .with_document(&uri, |document, workspace| {
                if document.kind != DocumentKind::Stylesheet {
                    return None;
                }
                let items =
                    completion::completions(&workspace.report.tokens, &document.text, position);
                (!items.is_empty()).then_some(CompletionResponse::Array(items))
            })
            .await)
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        Ok(self
            .with_document(&uri, |document, workspace| {
                let tokens = &workspace.report.tokens;
                let location = match document.kind {
                    DocumentKind::Stylesheet => {
                        definition::css_definition(tokens, &document.text, position)
                    }
                    DocumentKind::TokenFile => {
                        definition::token_file_definition(tokens, &document.text, position)
                    }
                    DocumentKind::Other => None,
                }?;
                Some(GotoDefinitionResponse::Scalar(location))
            })
            .await)
    }

    async fn document_color(&self, params: DocumentColorParams) -> Result<Vec<ColorInformation>> {
        let uri = params.text_document.uri;
        Ok(self
            .with_document(&uri, |document, workspace| {
                let tokens = &workspace.report.tokens;
                match document.kind {
                    DocumentKind::Stylesheet => Some(color::css_colors(tokens, &document.text)),
                    DocumentKind::TokenFile => {
                        let path = uri.to_file_path().ok()?;
                        Some(color::token_file_colors(
                            tokens,
                            &path.to_string_lossy(),
                            &document.text,
                        ))
                    }
                    DocumentKind::Other => None,
                }
            })
            .await
            .unwrap_or_default())
    }

    async fn semantic_tokens_full(
        &self,
        params: SemanticTokensParams,
    ) -> Result<Option<SemanticTokensResult>> {
        let uri = params.text_document.uri;
        Ok(self
            .with_document(&uri, |document, workspace| {
                if document.kind != DocumentKind::TokenFile {
                    return None;
                }
                let path = uri.to_file_path().ok()?;
                let data = semantic::token_file_tokens(
                    &workspace.report.tokens,
                    &path.to_string_lossy(),
                    &document.text,
                );
                Some(SemanticTokensResult::Tokens(SemanticTokens {
                    result_id: None,
                    data,
                }))
            })
            .await)
    }

    async fn color_presentation(
        &self,
        params: ColorPresentationParams,
    ) -> Result<Vec<ColorPresentation>> {
        let uri = params.text_document.uri;
        let color = params.color;
        Ok(self
            .with_document(&uri, |document, workspace| {
                let mut list = color::presentations(&workspace.report.tokens, &color);
                if document.kind == DocumentKind::TokenFile {
                    // Token files hold literal values; only the hex form applies.
                    list.truncate(1);
                }
                Some(list)
            })
            .await
            .unwrap_or_default())
    }
}

/// Serves the language server over stdin and stdout until the client exits.
pub async fn run() {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(DesignTokensServer::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_kind() {
        let css = Url::parse("file:///w/a.css").unwrap();
        let json = Url::parse("file:///w/tokens.json").unwrap();
        let other = Url::parse("file:///w/readme.md").unwrap();
        assert_eq!(DocumentKind::detect(&css, "css"), DocumentKind::Stylesheet);
        assert_eq!(DocumentKind::detect(&json, "json"), DocumentKind::TokenFile);
        assert_eq!(DocumentKind::detect(&json, "plaintext"), DocumentKind::TokenFile);
        assert_eq!(DocumentKind::detect(&css, "plaintext"), DocumentKind::Stylesheet);
        assert_eq!(DocumentKind::detect(&other, "markdown"), DocumentKind::Other);
    }

    #[test]
    fn test_is_configured() {
        let workspace = Workspace {
            config: ServerConfig::from_value(serde_json::json!({"tokensFiles": ["t.json"]})).unwrap(),
            root: Some(PathBuf::from("/w")),
            ..Default::default()
        };
        assert!(workspace.is_configured(Path::new("/w/t.json")));
        assert!(!workspace.is_configured(Path::new("/w/other.json")));
    }
}
