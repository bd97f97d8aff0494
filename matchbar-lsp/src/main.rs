//! matchbar LSP Server - live regex match status for any LSP-capable editor.
//!
//! Provides:
//! - Re-evaluation when the watched document is saved
//! - Re-evaluation when `matchbar` settings change, pushed by the client or
//!   written to `.matchbar.toml`
//! - `matchbar.setPattern` / `matchbar.setFilePath` / `matchbar.listFiles`
//!   / `matchbar.refresh` commands
//! - A `matchbar/status` notification carrying the current label
//!
//! Never panics: every evaluation failure becomes a label.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tower_lsp::jsonrpc::{Error as RpcError, Result as LspResult};
use tower_lsp::lsp_types::notification::Notification;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer, LspService, Server};

use matchbar_core::commands::{SET_FILE_PATH, SET_PATTERN};
use matchbar_core::{
    init_structured_logging, list_workspace_files, DiskFiles, Extension, FileStore, HostEvent,
    MatchReporter, MemoryStore, Settings, SettingsStore, StatusLabel, TargetSelection, NAMESPACE,
    SETTINGS_FILE,
};

const LIST_FILES: &str = "matchbar.listFiles";
const REFRESH: &str = "matchbar.refresh";
const WATCH_SETTINGS: &str = "matchbar.watchSettings";

/// Payload of the `matchbar/status` notification.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusParams {
    pub text: String,
    pub icon: String,
    pub rendered: String,
}

impl From<&StatusLabel> for StatusParams {
    fn from(label: &StatusLabel) -> Self {
        Self {
            text: label.text.clone(),
            icon: label.icon.codicon().to_string(),
            rendered: label.rendered(),
        }
    }
}

/// Custom notification pushed whenever the label changes.
pub enum StatusNotification {}

impl Notification for StatusNotification {
    type Params = StatusParams;
    const METHOD: &'static str = "matchbar/status";
}

/// Shape of the `matchbar` section inside `workspace/didChangeConfiguration`.
#[derive(Debug, Default, Deserialize)]
struct ClientSettings {
    pattern: Option<String>,
    #[serde(rename = "filePath")]
    file_path: Option<String>,
}

impl ClientSettings {
    /// Overwrite only the keys the client sent.
    fn apply_to(self, settings: &mut Settings) {
        if let Some(pattern) = self.pattern {
            settings.pattern = Some(pattern);
        }
        if let Some(file_path) = self.file_path {
            settings.file_path = Some(file_path);
        }
    }
}

/// Server state. The extension is created at `initialize` and torn down at
/// `shutdown`; the mutex serialises every event so each evaluation runs to
/// completion before the next one starts.
struct MatchbarLsp {
    client: Client,
    extension: Arc<Mutex<Option<Extension>>>,
}

impl MatchbarLsp {
    fn new(client: Client) -> Self {
        Self {
            client,
            extension: Arc::new(Mutex::new(None)),
        }
    }

    /// Run `f` against the live extension and push the label if it changed.
    async fn with_extension<T>(&self, f: impl FnOnce(&mut Extension) -> T) -> Option<T> {
        let (result, before, after) = {
            let mut guard = self.extension.lock().await;
            let extension = guard.as_mut()?;
            let before = extension.label().cloned();
            let result = f(extension);
            (result, before, extension.label().cloned())
        };

        if after != before {
            if let Some(label) = &after {
                self.publish(label).await;
            }
        }
        Some(result)
    }

    async fn publish(&self, label: &StatusLabel) {
        self.client
            .send_notification::<StatusNotification>(StatusParams::from(label))
            .await;
        self.log_info(&format!("status: {}", label.rendered())).await;
    }

    async fn show_error(&self, message: &str) {
        self.client.show_message(MessageType::ERROR, message).await;
    }

    async fn log_info(&self, message: &str) {
        self.client.log_message(MessageType::INFO, message).await;
    }

    async fn set_pattern(&self, arguments: &[Value]) -> LspResult<Option<Value>> {
        let pattern = arguments.first().and_then(Value::as_str).map(str::to_string);
        let result = self
            .with_extension(|ext| ext.set_pattern(pattern.as_deref()))
            .await;

        match result {
            Some(Ok(changed)) => Ok(Some(Value::Bool(changed))),
            Some(Err(e)) => {
                self.show_error(&e.to_string()).await;
                Ok(Some(Value::Bool(false)))
            }
            None => Err(RpcError::invalid_request()),
        }
    }

    async fn set_file_path(&self, arguments: &[Value]) -> LspResult<Option<Value>> {
        let Some(path) = arguments.first().and_then(Value::as_str).map(str::to_string) else {
            return Err(RpcError::invalid_params("expected a file path argument"));
        };
        let result = self
            .with_extension(|ext| ext.set_target_file(&TargetSelection::Typed(path)))
            .await;

        match result {
            Some(Ok(stored)) => Ok(Some(Value::String(stored))),
            Some(Err(e)) => {
                self.show_error(&e.to_string()).await;
                Ok(None)
            }
            None => Err(RpcError::invalid_request()),
        }
    }

    /// Ask the client to report edits of the settings file, which are then
    /// delivered as saves of that file.
    async fn watch_settings_file(&self) {
        let options = DidChangeWatchedFilesRegistrationOptions {
            watchers: vec![FileSystemWatcher {
                glob_pattern: GlobPattern::String(format!("**/{}", SETTINGS_FILE)),
                kind: None,
            }],
        };
        let registration = Registration {
            id: WATCH_SETTINGS.to_string(),
            method: "workspace/didChangeWatchedFiles".to_string(),
            register_options: serde_json::to_value(options).ok(),
        };
        if let Err(e) = self.client.register_capability(vec![registration]).await {
            self.log_info(&format!("settings file watch not registered: {}", e))
                .await;
        }
    }

    async fn list_files(&self) -> LspResult<Option<Value>> {
        let root = self
            .extension
            .lock()
            .await
            .as_ref()
            .and_then(|ext| ext.reporter().workspace_root().map(|r| r.to_path_buf()));
        let Some(root) = root else {
            self.show_error("No workspace is open").await;
            return Ok(None);
        };

        match list_workspace_files(&root) {
            Ok(files) => Ok(Some(Value::Array(
                files.into_iter().map(Value::String).collect(),
            ))),
            Err(e) => {
                self.show_error(&format!("{:#}", e)).await;
                Ok(None)
            }
        }
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for MatchbarLsp {
    async fn initialize(&self, params: InitializeParams) -> LspResult<InitializeResult> {
        #[allow(deprecated)]
        let root = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .and_then(|folder| folder.uri.to_file_path().ok())
            .or_else(|| params.root_uri.as_ref().and_then(|uri| uri.to_file_path().ok()));

        let store: Box<dyn SettingsStore> = match &root {
            Some(root) => Box::new(FileStore::in_workspace(root)),
            None => Box::new(MemoryStore::default()),
        };
        let reporter = MatchReporter::new(store, Box::new(DiskFiles), root);
        *self.extension.lock().await = Some(Extension::activate(reporter));

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::NONE),
                        save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                            include_text: Some(false),
                        })),
                        ..Default::default()
                    },
                )),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![
                        SET_PATTERN.to_string(),
                        SET_FILE_PATH.to_string(),
                        LIST_FILES.to_string(),
                        REFRESH.to_string(),
                    ],
                    work_done_progress_options: Default::default(),
                }),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: "matchbar-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.log_info("matchbar LSP server initialized").await;
        self.watch_settings_file().await;
        let label = self
            .extension
            .lock()
            .await
            .as_ref()
            .and_then(|ext| ext.label().cloned());
        if let Some(label) = label {
            self.publish(&label).await;
        }
    }

    async fn shutdown(&self) -> LspResult<()> {
        if let Some(mut extension) = self.extension.lock().await.take() {
            extension.handle(&HostEvent::Deactivated);
        }
        Ok(())
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let Some(section) = params.settings.get(NAMESPACE).cloned() else {
            return;
        };
        let incoming: ClientSettings = match serde_json::from_value(section) {
            Ok(s) => s,
            Err(e) => {
                self.show_error(&format!("Invalid matchbar settings: {}", e)).await;
                return;
            }
        };

        let saved = self
            .with_extension(|ext| {
                let store = ext.reporter_mut().store_mut();
                let mut settings = store.load()?;
                incoming.apply_to(&mut settings);
                store.save(&settings)?;
                ext.handle(&HostEvent::ConfigurationChanged {
                    sections: vec![NAMESPACE.to_string()],
                });
                Ok::<_, matchbar_core::MatchbarError>(())
            })
            .await;

        if let Some(Err(e)) = saved {
            self.show_error(&e.to_string()).await;
        }
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        let paths: Vec<_> = params
            .changes
            .iter()
            .filter_map(|change| change.uri.to_file_path().ok())
            .collect();
        self.with_extension(|ext| {
            for path in paths {
                ext.handle(&HostEvent::DocumentSaved { path });
            }
        })
        .await;
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        if let Ok(path) = params.text_document.uri.to_file_path() {
            self.with_extension(|ext| ext.reporter_mut().set_active_document(Some(path)))
                .await;
        }
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        let Ok(path) = params.text_document.uri.to_file_path() else {
            return;
        };
        self.with_extension(|ext| ext.handle(&HostEvent::DocumentSaved { path }))
            .await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let Ok(path) = params.text_document.uri.to_file_path() else {
            return;
        };
        self.with_extension(|ext| {
            let reporter = ext.reporter_mut();
            if reporter.active_document() == Some(path.as_path()) {
                reporter.set_active_document(None);
            }
        })
        .await;
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> LspResult<Option<Value>> {
        match params.command.as_str() {
            SET_PATTERN => self.set_pattern(&params.arguments).await,
            SET_FILE_PATH => self.set_file_path(&params.arguments).await,
            LIST_FILES => self.list_files().await,
            REFRESH => {
                self.with_extension(|ext| {
                    ext.reporter_mut().evaluate();
                })
                .await;
                Ok(None)
            }
            other => Err(RpcError::invalid_params(format!("unknown command: {}", other))),
        }
    }
}

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] matchbar-lsp internal error: {}", info);
    }));

    init_structured_logging();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(MatchbarLsp::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchbar_core::{Icon, MatchOutcome};

    #[test]
    fn test_status_params_from_label() {
        let label = StatusLabel::from_evaluation(&Ok(MatchOutcome::Captured("42".into())));
        let params = StatusParams::from(&label);
        assert_eq!(params.text, "Match: 42");
        assert_eq!(params.icon, Icon::Regex.codicon());
        assert_eq!(params.rendered, "$(regex) Match: 42");
    }

    #[test]
    fn test_client_settings_shape() {
        let value = serde_json::json!({ "pattern": "x(\\d)", "filePath": ".env" });
        let settings: ClientSettings = serde_json::from_value(value).unwrap();
        assert_eq!(settings.pattern.as_deref(), Some("x(\\d)"));
        assert_eq!(settings.file_path.as_deref(), Some(".env"));

        let partial: ClientSettings = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(partial.pattern.is_none());
    }

    #[test]
    fn test_partial_configuration_keeps_other_key() {
        let mut settings = Settings {
            pattern: Some("old".into()),
            file_path: Some("Cargo.toml".into()),
        };

        let pattern_only: ClientSettings =
            serde_json::from_value(serde_json::json!({ "pattern": "new(\\d+)" })).unwrap();
        pattern_only.apply_to(&mut settings);
        assert_eq!(settings.pattern(), Some("new(\\d+)"));
        assert_eq!(settings.file_path(), Some("Cargo.toml"));

        let file_only: ClientSettings =
            serde_json::from_value(serde_json::json!({ "filePath": ".env" })).unwrap();
        file_only.apply_to(&mut settings);
        assert_eq!(settings.pattern(), Some("new(\\d+)"));
        assert_eq!(settings.file_path(), Some(".env"));
    }
}
