//! SDL Language Server — diagnostics, completions, hover, document symbols.
//!
//! A `tower-lsp` based LSP server that wraps `sdl-core`'s property adapters
//! for live editor feedback while authoring scene files.

mod completion;
mod diagnostics;
mod hover;
mod position;
mod symbols;

use sdl_core::{AdapterSet, SceneConfig, SceneDocument, SdlConfig, compose, parse_document};
use std::collections::HashMap;
use std::io::Read;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};

/// Cached parse state for a single document.
struct DocumentState {
    text: String,
    doc: SceneDocument,
}

/// The SDL language server backend.
struct SdlLanguageServer {
    client: Client,
    adapters: AdapterSet,
    /// Replaced by `initializationOptions` during `initialize`.
    config: Mutex<SdlConfig>,
    /// Cached document state by URI.
    documents: Mutex<HashMap<Url, DocumentState>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SdlLanguageServer {
    fn new(client: Client, adapters: AdapterSet) -> Self {
        Self {
            client,
            adapters,
            config: Mutex::new(SdlConfig::default()),
            documents: Mutex::new(HashMap::new()),
        }
    }

    /// Reparse a document and publish diagnostics.
    async fn on_change(&self, uri: Url, text: String) {
        let config = lock(&self.config).clone();
        let doc = parse_document(&text, &config);
        let diags = diagnostics::compute_diagnostics(&self.adapters, &text, &doc);
        log::debug!("{uri}: {} component(s), {} diagnostic(s)", doc.components.len(), diags.len());

        lock(&self.documents).insert(uri.clone(), DocumentState { text, doc });

        self.client.publish_diagnostics(uri, diags, None).await;
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for SdlLanguageServer {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        if let Some(options) = params.initialization_options {
            match serde_json::from_value::<SdlConfig>(options) {
                Ok(config) => *lock(&self.config) = config,
                Err(e) => log::warn!("ignoring invalid initializationOptions: {e}"),
            }
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(vec!["!".to_string(), "-".to_string(), "=".to_string()]),
                    ..Default::default()
                }),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                document_symbol_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client.log_message(MessageType::INFO, "sdl-lsp initialized").await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let text = params.text_document.text;
        self.on_change(uri, text).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        if let Some(change) = params.content_changes.into_iter().next_back() {
            self.on_change(uri, change.text).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        lock(&self.documents).remove(&uri);
        self.client.publish_diagnostics(uri, Vec::new(), None).await;
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = &params.text_document_position.text_document.uri;
        let pos = params.text_document_position.position;

        let docs = lock(&self.documents);
        let items = docs
            .get(uri)
            .map(|doc| completion::compute_completions(&self.adapters, &doc.text, pos))
            .unwrap_or_default();

        Ok(Some(CompletionResponse::Array(items)))
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let uri = &params.text_document_position_params.text_document.uri;
        let pos = params.text_document_position_params.position;

        let docs = lock(&self.documents);
        Ok(docs.get(uri).and_then(|doc| hover::compute_hover(&self.adapters, &doc.text, pos)))
    }

    async fn document_symbol(&self, params: DocumentSymbolParams) -> Result<Option<DocumentSymbolResponse>> {
        let uri = &params.text_document.uri;

        let docs = lock(&self.documents);
        let syms = docs
            .get(uri)
            .map(|doc| symbols::compute_symbols(uri, &doc.text))
            .unwrap_or_default();
        Ok(Some(DocumentSymbolResponse::Flat(syms)))
    }
}

fn read_stdin() -> std::io::Result<String> {
    let mut text = String::new();
    std::io::stdin().read_to_string(&mut text)?;
    Ok(text)
}

/// Batch modes: `--format` and `--json`. Exit code 1 on any structural error.
fn run_batch(mode: &str) -> std::process::ExitCode {
    let text = match read_stdin() {
        Ok(text) => text,
        Err(e) => {
            eprintln!("sdl-lsp {mode} error: failed to read stdin: {e}");
            return std::process::ExitCode::FAILURE;
        }
    };

    let config = SdlConfig::default();
    let doc = parse_document(&text, &config);
    for error in &doc.errors {
        eprintln!("sdl-lsp {mode}: {error}");
    }
    if doc.has_structural_errors() {
        return std::process::ExitCode::FAILURE;
    }

    match mode {
        "--format" => print!("{}", compose(&SceneConfig::from_document("stdin", &doc), &config)),
        _ => match serde_json::to_string_pretty(&doc) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("sdl-lsp {mode} error: {e}");
                return std::process::ExitCode::FAILURE;
            }
        },
    }
    std::process::ExitCode::SUCCESS
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    // Logs go to stderr; stdout carries the LSP channel.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    // ── `sdl-lsp --format` / `sdl-lsp --json` ───────────────────────────
    // Read SDL from stdin; write canonical SDL or the parsed document as JSON.
    let args: Vec<String> = std::env::args().collect();
    if let Some(mode) = args.get(1).map(String::as_str)
        && matches!(mode, "--format" | "--json")
    {
        return run_batch(mode);
    }

    // ── Standard LSP server mode ─────────────────────────────────────────
    let adapters = match AdapterSet::new() {
        Ok(adapters) => adapters,
        Err(e) => {
            log::error!("refusing to start: {e}");
            eprintln!("sdl-lsp: {e}");
            return std::process::ExitCode::FAILURE;
        }
    };

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| SdlLanguageServer::new(client, adapters));
    Server::new(stdin, stdout, socket).serve(service).await;
    std::process::ExitCode::SUCCESS
}
