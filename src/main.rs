use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use clap::Parser;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};

use umbra::config::Settings;
use umbra::registry::ShadowRegistry;
use umbra::service::{AnalysisHost, NullHost};
use umbra::{completion, diagnostics, gotodef, highlights, hover, references, rename, signature};

struct Backend {
    client: Client,
    host: Arc<dyn AnalysisHost>,
    // Built during `initialize`, once settings and workspace root are known.
    registry: OnceLock<ShadowRegistry>,
}

impl Backend {
    fn new(client: Client, host: Arc<dyn AnalysisHost>) -> Backend {
        Backend {
            client,
            host,
            registry: OnceLock::new(),
        }
    }

    async fn publish_diagnostics(&self, uri: &Url) {
        let Some(registry) = self.registry.get() else {
            return;
        };
        let diagnostics = diagnostics::diagnostics(registry, uri).await;
        self.client
            .publish_diagnostics(uri.clone(), diagnostics, None)
            .await;
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        #[allow(deprecated)]
        let root_dir = params
            .root_uri
            .as_ref()
            .and_then(|uri| uri.to_file_path().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        let settings = match Settings::new(&root_dir, &params.capabilities) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!("failed to load settings, using defaults: {err}");
                Settings::default()
            }
        };

        let _ = self
            .registry
            .set(ShadowRegistry::new(Arc::clone(&self.host), settings));

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec![
                        ".".to_string(),
                        "\"".to_string(),
                        "'".to_string(),
                        "{".to_string(),
                    ]),
                    resolve_provider: Some(false),
                    ..Default::default()
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                definition_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                document_highlight_provider: Some(OneOf::Left(true)),
                rename_provider: Some(OneOf::Left(true)),
                signature_help_provider: Some(SignatureHelpOptions {
                    trigger_characters: Some(vec!["(".to_string(), ",".to_string()]),
                    retrigger_characters: None,
                    work_done_progress_options: Default::default(),
                }),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "umbra".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "umbra language server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let Some(registry) = self.registry.get() else {
            return;
        };
        let uri = params.text_document.uri;
        registry.register(&uri, &params.text_document.text);
        self.publish_diagnostics(&uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let Some(registry) = self.registry.get() else {
            return;
        };
        // Full document sync: the last change carries the whole text.
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        let uri = params.text_document.uri;
        registry.on_edit(&uri, &change.text);
        self.publish_diagnostics(&uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let Some(registry) = self.registry.get() else {
            return;
        };
        let uri = params.text_document.uri;
        registry.unregister(&uri);
        self.client
            .publish_diagnostics(uri, Vec::new(), None)
            .await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let Some(registry) = self.registry.get() else {
            return Ok(None);
        };
        let uri = params.text_document_position.text_document.uri.clone();
        Ok(completion::get_completions(registry, &params, &uri).await)
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let Some(registry) = self.registry.get() else {
            return Ok(None);
        };
        let uri = params
            .text_document_position_params
            .text_document
            .uri
            .clone();
        Ok(hover::hover(registry, &params, &uri).await)
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> Result<Option<GotoDefinitionResponse>> {
        let Some(registry) = self.registry.get() else {
            return Ok(None);
        };
        let position = params.text_document_position_params.position;
        let uri = params.text_document_position_params.text_document.uri;
        Ok(gotodef::goto_definition(registry, position, &uri)
            .await
            .map(GotoDefinitionResponse::Array))
    }

    async fn references(&self, params: ReferenceParams) -> Result<Option<Vec<Location>>> {
        let Some(registry) = self.registry.get() else {
            return Ok(None);
        };
        let position = params.text_document_position.position;
        let uri = params.text_document_position.text_document.uri;
        Ok(references::references(registry, position, &uri).await)
    }

    async fn document_highlight(
        &self,
        params: DocumentHighlightParams,
    ) -> Result<Option<Vec<DocumentHighlight>>> {
        let Some(registry) = self.registry.get() else {
            return Ok(None);
        };
        let position = params.text_document_position_params.position;
        let uri = params.text_document_position_params.text_document.uri;
        Ok(highlights::document_highlights(registry, position, &uri).await)
    }

    async fn rename(&self, params: RenameParams) -> Result<Option<WorkspaceEdit>> {
        let Some(registry) = self.registry.get() else {
            return Ok(None);
        };
        let uri = params.text_document_position.text_document.uri.clone();
        Ok(rename::rename(registry, &params, &uri).await)
    }

    async fn signature_help(&self, params: SignatureHelpParams) -> Result<Option<SignatureHelp>> {
        let Some(registry) = self.registry.get() else {
            return Ok(None);
        };
        let position = params.text_document_position_params.position;
        let uri = params.text_document_position_params.text_document.uri;
        Ok(signature::signature_help(registry, position, &uri).await)
    }
}

/// Language server for single-file components.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Log at debug level instead of the RUST_LOG default
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let default_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    // Logs go to stderr; stdout carries the protocol.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.into()),
        )
        .init();

    // The analysis backend is injected; until a real one is wired in, the
    // server runs against a host that answers every query empty.
    let host: Arc<dyn AnalysisHost> = Arc::new(NullHost);

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();
    let (service, socket) = LspService::new(move |client| Backend::new(client, Arc::clone(&host)));
    Server::new(stdin, stdout, socket).serve(service).await;
}
