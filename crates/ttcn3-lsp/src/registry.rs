//! The method table of the server.
//!
//! Every method the server knows about has exactly one entry: either a typed
//! handler or a stub answering "not implemented". The table is built once
//! and shared read-only by the dispatch loop and the request workers.

use crate::cancel::{CancelToken, Cancellation};
use crate::document::{DocumentStore, Snapshot};
use crate::error::HandlerError;
use crate::handlers;
use crate::LspConnection;
use lsp_types::notification::{self, Notification};
use lsp_types::request::{self, Request};
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// What a request handler sees: the document snapshot taken when the
/// request arrived and its cancel token.
pub struct RequestContext {
    pub snapshot: Snapshot,
    pub token: CancelToken,
}

/// What a notification handler sees. Notifications run on the dispatch loop
/// in receipt order.
pub struct NotificationContext<'a> {
    pub store: &'a DocumentStore,
    pub cancellation: &'a Cancellation,
    pub connection: &'a dyn LspConnection,
}

type RequestFn = dyn Fn(&RequestContext, Value) -> Result<Value, HandlerError> + Send + Sync;
type NotificationFn = dyn Fn(&NotificationContext<'_>, Value) -> Result<(), HandlerError> + Send + Sync;

pub enum RequestRoute {
    Handler(Box<RequestFn>),
    Stub,
}

pub enum NotificationRoute {
    Handler(Box<NotificationFn>),
    Stub,
}

#[derive(Default)]
pub struct Registry {
    requests: FxHashMap<&'static str, RequestRoute>,
    notifications: FxHashMap<&'static str, NotificationRoute>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<R>(
        &mut self,
        handler: fn(&RequestContext, R::Params) -> Result<R::Result, HandlerError>,
    ) -> &mut Self
    where
        R: Request + 'static,
        R::Params: DeserializeOwned,
        R::Result: Serialize,
    {
        let route = RequestRoute::Handler(Box::new(move |ctx: &RequestContext, params: Value| {
            let params = decode::<R::Params>(R::METHOD, params)?;
            Ok(serde_json::to_value(handler(ctx, params)?)?)
        }));
        self.requests.insert(R::METHOD, route);
        self
    }

    pub fn stub<R: Request>(&mut self) -> &mut Self {
        self.requests.insert(R::METHOD, RequestRoute::Stub);
        self
    }

    pub fn on_notification<N>(
        &mut self,
        handler: fn(&NotificationContext<'_>, N::Params) -> Result<(), HandlerError>,
    ) -> &mut Self
    where
        N: Notification + 'static,
        N::Params: DeserializeOwned,
    {
        let route = NotificationRoute::Handler(Box::new(
            move |ctx: &NotificationContext<'_>, params: Value| {
                handler(ctx, decode::<N::Params>(N::METHOD, params)?)
            },
        ));
        self.notifications.insert(N::METHOD, route);
        self
    }

    pub fn stub_notification<N: Notification>(&mut self) -> &mut Self {
        self.notifications.insert(N::METHOD, NotificationRoute::Stub);
        self
    }

    pub fn request(&self, method: &str) -> Option<&RequestRoute> {
        self.requests.get(method)
    }

    pub fn notification(&self, method: &str) -> Option<&NotificationRoute> {
        self.notifications.get(method)
    }

    /// Methods answered with "not implemented", sorted.
    pub fn stubs(&self) -> Vec<&'static str> {
        let mut stubs: Vec<&'static str> = self
            .requests
            .iter()
            .filter(|(_, route)| matches!(route, RequestRoute::Stub))
            .map(|(method, _)| *method)
            .chain(
                self.notifications
                    .iter()
                    .filter(|(_, route)| matches!(route, NotificationRoute::Stub))
                    .map(|(method, _)| *method),
            )
            .collect();
        stubs.sort_unstable();
        stubs
    }

    /// The table served by `ttcn3-lsp`. Session lifecycle methods
    /// (`initialize`, `initialized`, `shutdown`, `exit`) are handled by the
    /// dispatcher itself.
    pub fn standard() -> Self {
        let mut registry = Registry::new();
        registry
            .on::<request::Completion>(handlers::completion)
            .on::<request::GotoDefinition>(handlers::definition)
            .on::<request::References>(handlers::references)
            .on::<request::DocumentSymbolRequest>(handlers::document_symbols)
            .on::<request::SemanticTokensFullRequest>(handlers::semantic_tokens)
            .on::<request::DocumentLinkRequest>(handlers::document_links)
            .on::<request::CodeLensRequest>(handlers::code_lens)
            .on::<request::ExecuteCommand>(handlers::execute_command);

        registry
            .on_notification::<notification::DidOpenTextDocument>(handlers::did_open)
            .on_notification::<notification::DidChangeTextDocument>(handlers::did_change)
            .on_notification::<notification::DidSaveTextDocument>(handlers::did_save)
            .on_notification::<notification::DidCloseTextDocument>(handlers::did_close)
            .on_notification::<notification::Cancel>(handlers::cancel_request)
            .on_notification::<notification::SetTrace>(handlers::set_trace);

        registry
            .stub::<request::ResolveCompletionItem>()
            .stub::<request::Formatting>()
            .stub::<request::RangeFormatting>()
            .stub::<request::OnTypeFormatting>()
            .stub::<request::Rename>()
            .stub::<request::PrepareRenameRequest>()
            .stub::<request::FoldingRangeRequest>()
            .stub::<request::CallHierarchyPrepare>()
            .stub::<request::CallHierarchyIncomingCalls>()
            .stub::<request::CallHierarchyOutgoingCalls>()
            .stub::<request::SemanticTokensFullDeltaRequest>()
            .stub::<request::SemanticTokensRangeRequest>()
            .stub::<request::MonikerRequest>()
            .stub::<request::LinkedEditingRange>()
            .stub::<request::WillCreateFiles>()
            .stub::<request::WillRenameFiles>()
            .stub::<request::WillDeleteFiles>()
            .stub::<request::WorkspaceSymbolRequest>()
            .stub::<request::SignatureHelpRequest>()
            .stub::<request::SelectionRangeRequest>()
            .stub::<request::ShowDocument>()
            .stub::<request::HoverRequest>()
            .stub::<request::GotoDeclaration>()
            .stub::<request::GotoImplementation>()
            .stub::<request::GotoTypeDefinition>()
            .stub::<request::CodeActionRequest>()
            .stub::<request::CodeActionResolveRequest>()
            .stub::<request::CodeLensResolve>()
            .stub::<request::DocumentLinkResolve>()
            .stub::<request::DocumentHighlightRequest>()
            .stub::<request::DocumentColor>()
            .stub::<request::ColorPresentationRequest>()
            .stub::<request::WillSaveWaitUntil>();

        registry
            .stub_notification::<notification::DidCreateFiles>()
            .stub_notification::<notification::DidRenameFiles>()
            .stub_notification::<notification::DidDeleteFiles>()
            .stub_notification::<notification::DidChangeConfiguration>()
            .stub_notification::<notification::DidChangeWatchedFiles>()
            .stub_notification::<notification::DidChangeWorkspaceFolders>()
            .stub_notification::<notification::WillSaveTextDocument>()
            .stub_notification::<notification::WorkDoneProgressCancel>();

        registry
    }
}

fn decode<T: DeserializeOwned>(method: &str, params: Value) -> Result<T, HandlerError> {
    serde_json::from_value(params)
        .map_err(|e| HandlerError::InvalidParams(format!("{}: {}", method, e)))
}
