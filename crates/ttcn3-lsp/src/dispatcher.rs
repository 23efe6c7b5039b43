use crate::cancel::Cancellation;
use crate::capabilities::{server_capabilities, server_info};
use crate::document::{to_path, DocumentStore};
use crate::error::{HandlerError, NOT_IMPLEMENTED};
use crate::registry::{NotificationContext, NotificationRoute, Registry, RequestContext, RequestRoute};
use anyhow::Result;
use lsp_server::{ErrorCode, Message, Notification, Request, RequestId, Response};
use lsp_types::notification::{Exit, Initialized, Notification as _};
use lsp_types::request::{Initialize, Request as _, Shutdown};
use lsp_types::{InitializeParams, InitializeResult};
use rayon::ThreadPool;
use std::ops::ControlFlow;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use ttcn3_core::fs::ttcn3_files;
use ttcn3_core::project::{ProjectConfig, MANIFEST_FILE};
use ttcn3_core::{BatchParseRunner, RealFileSystem};

/// Trait for sending LSP messages - allows mocking for tests
pub trait LspConnection: Send + Sync {
    fn send_response(&self, response: Response) -> Result<()>;
    fn send_notification(&self, notification: Notification) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Running,
    /// `shutdown` was answered; only `exit` is expected now.
    ShuttingDown,
}

/// Routes every incoming message of one editor session.
///
/// Notifications, document mutations included, are applied on the calling
/// thread in receipt order. Requests are answered on the worker pool from a
/// snapshot of the document store taken when they arrive.
pub struct Dispatcher<C: LspConnection + 'static> {
    connection: Arc<C>,
    registry: Arc<Registry>,
    store: Arc<DocumentStore>,
    cancellation: Arc<Cancellation>,
    pool: Arc<ThreadPool>,
    state: SessionState,
}

impl<C: LspConnection + 'static> Dispatcher<C> {
    pub fn new(connection: C, pool: ThreadPool) -> Self {
        Self::with_pool(connection, Arc::new(pool))
    }

    pub fn with_pool(connection: C, pool: Arc<ThreadPool>) -> Self {
        Dispatcher {
            connection: Arc::new(connection),
            registry: Arc::new(Registry::standard()),
            store: Arc::new(DocumentStore::new()),
            cancellation: Arc::new(Cancellation::new()),
            pool,
            state: SessionState::Uninitialized,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Handles one message. `Break(code)` ends the session with the process
    /// exit code: 0 after an orderly shutdown, 1 otherwise.
    pub fn handle(&mut self, message: Message) -> Result<ControlFlow<i32>> {
        match message {
            Message::Request(req) => {
                self.handle_request(req)?;
                Ok(ControlFlow::Continue(()))
            }
            Message::Notification(not) => self.handle_notification(not),
            Message::Response(resp) => {
                tracing::debug!(id = %resp.id, "ignoring client response");
                Ok(ControlFlow::Continue(()))
            }
        }
    }

    fn handle_request(&mut self, req: Request) -> Result<()> {
        match (self.state, req.method.as_str()) {
            (SessionState::Uninitialized, Initialize::METHOD) => return self.initialize(req),
            (SessionState::Uninitialized, _) => {
                return self.reply_error(
                    req.id,
                    ErrorCode::ServerNotInitialized as i32,
                    "server not initialized".to_string(),
                )
            }
            (SessionState::ShuttingDown, _) => {
                return self.reply_error(
                    req.id,
                    ErrorCode::InvalidRequest as i32,
                    format!("{} after shutdown", req.method),
                )
            }
            (SessionState::Running, Initialize::METHOD) => {
                return self.reply_error(
                    req.id,
                    ErrorCode::InvalidRequest as i32,
                    "server already initialized".to_string(),
                )
            }
            (SessionState::Running, Shutdown::METHOD) => {
                tracing::info!("shutdown requested");
                self.state = SessionState::ShuttingDown;
                return self.connection.send_response(Response::new_ok(req.id, ()));
            }
            (SessionState::Running, _) => {}
        }

        match self.registry.request(&req.method) {
            None => {
                tracing::warn!(method = %req.method, "unknown request");
                self.reply_error(
                    req.id,
                    ErrorCode::MethodNotFound as i32,
                    format!("method not found: {}", req.method),
                )
            }
            Some(RequestRoute::Stub) => {
                tracing::debug!(method = %req.method, "not implemented");
                let err = HandlerError::NotImplemented(req.method);
                self.reply_error(req.id, NOT_IMPLEMENTED, err.to_string())
            }
            Some(RequestRoute::Handler(_)) => {
                self.schedule(req);
                Ok(())
            }
        }
    }

    /// Runs a request on the pool. The cancel token is registered and the
    /// snapshot taken before the job is queued.
    fn schedule(&self, req: Request) {
        let token = self.cancellation.register(req.id.clone());
        let ctx = RequestContext {
            snapshot: self.store.snapshot(),
            token,
        };
        let registry = Arc::clone(&self.registry);
        let cancellation = Arc::clone(&self.cancellation);
        let connection = Arc::clone(&self.connection);

        self.pool.spawn(move || {
            let Request { id, method, params } = req;
            let response = match run_request(&registry, &method, &ctx, params) {
                Ok(result) => Response::new_ok(id.clone(), result),
                Err(HandlerError::Canceled) => {
                    tracing::debug!(%id, %method, "request canceled");
                    Response::new_err(
                        id.clone(),
                        ErrorCode::RequestCanceled as i32,
                        HandlerError::Canceled.to_string(),
                    )
                }
                Err(err) => {
                    tracing::warn!(%id, %method, error = %err, "request failed");
                    Response::new_err(id.clone(), err.code(), err.to_string())
                }
            };
            cancellation.finish(&id);
            if let Err(e) = connection.send_response(response) {
                tracing::error!(%id, error = %e, "failed to send response");
            }
        });
    }

    fn handle_notification(&mut self, not: Notification) -> Result<ControlFlow<i32>> {
        if not.method == Exit::METHOD {
            let code = if self.state == SessionState::ShuttingDown { 0 } else { 1 };
            tracing::info!(code, "exit");
            return Ok(ControlFlow::Break(code));
        }
        if self.state == SessionState::Uninitialized {
            tracing::warn!(method = %not.method, "notification before initialize dropped");
            return Ok(ControlFlow::Continue(()));
        }
        if not.method == Initialized::METHOD {
            tracing::info!("client initialized");
            return Ok(ControlFlow::Continue(()));
        }

        match self.registry.notification(&not.method) {
            Some(NotificationRoute::Handler(handler)) => {
                let ctx = NotificationContext {
                    store: &self.store,
                    cancellation: &self.cancellation,
                    connection: self.connection.as_ref(),
                };
                if let Err(e) = handler(&ctx, not.params) {
                    tracing::error!(method = %not.method, error = %e, "notification failed");
                }
            }
            Some(NotificationRoute::Stub) => {
                tracing::info!(method = %not.method, "notification not implemented");
            }
            None if not.method.starts_with("$/") => {
                tracing::debug!(method = %not.method, "ignoring notification");
            }
            None => tracing::warn!(method = %not.method, "unknown notification"),
        }
        Ok(ControlFlow::Continue(()))
    }

    fn initialize(&mut self, req: Request) -> Result<()> {
        let params: InitializeParams = match serde_json::from_value(req.params) {
            Ok(params) => params,
            Err(e) => {
                return self.reply_error(
                    req.id,
                    ErrorCode::InvalidParams as i32,
                    format!("initialize: {}", e),
                )
            }
        };

        if let Some(root) = workspace_root(&params) {
            self.load_workspace(root);
        }

        self.state = SessionState::Running;
        let result = InitializeResult {
            capabilities: server_capabilities(),
            server_info: Some(server_info()),
        };
        self.connection.send_response(Response::new_ok(req.id, result))
    }

    /// Parses the project files under `root`: the manifest's sources and
    /// imports when there is one, the TTCN-3 files of `root` otherwise.
    fn load_workspace(&self, root: PathBuf) {
        tracing::info!(root = %root.display(), "workspace root");
        let entries = if root.join(MANIFEST_FILE).exists() {
            match ProjectConfig::from_file(&root) {
                Ok(config) => config.sources.into_iter().chain(config.imports).collect(),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring project manifest");
                    vec![root]
                }
            }
        } else {
            vec![root]
        };

        let (files, errors) = ttcn3_files(&entries);
        for (path, e) in &errors {
            tracing::warn!(path = %path.display(), error = %e, "skipping workspace entry");
        }
        let report = BatchParseRunner::new(Arc::new(RealFileSystem::new())).run(&files);
        let trees = report
            .into_results()
            .into_iter()
            .filter_map(|result| result.tree().cloned())
            .collect();
        self.store.set_workspace(trees);
    }

    fn reply_error(&self, id: RequestId, code: i32, message: String) -> Result<()> {
        self.connection
            .send_response(Response::new_err(id, code, message))
    }
}

fn run_request(
    registry: &Registry,
    method: &str,
    ctx: &RequestContext,
    params: serde_json::Value,
) -> Result<serde_json::Value, HandlerError> {
    ctx.token.check()?;
    let Some(RequestRoute::Handler(handler)) = registry.request(method) else {
        return Err(HandlerError::NotImplemented(method.to_string()));
    };

    let result = match catch_unwind(AssertUnwindSafe(|| handler(ctx, params))) {
        Ok(result) => result,
        Err(panic) => {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!(%method, %message, "request handler panicked");
            return Err(HandlerError::Panicked(message));
        }
    }?;
    ctx.token.check()?;
    Ok(result)
}

#[allow(deprecated)]
fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    let uri = params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
        .map(|folder| &folder.uri)
        .or(params.root_uri.as_ref())?;
    to_path(uri)
}
