//! Glue between the method table and the providers.

use crate::cancel::request_id;
use crate::error::HandlerError;
use crate::providers::*;
use crate::registry::{NotificationContext, RequestContext};
use lsp_server::Notification;
use lsp_types::notification::{Notification as _, PublishDiagnostics};
use lsp_types::*;
use serde_json::Value;

pub fn completion(
    ctx: &RequestContext,
    params: CompletionParams,
) -> Result<Option<CompletionResponse>, HandlerError> {
    let position = params.text_document_position;
    let items = CompletionProvider::new().provide(
        &ctx.snapshot,
        &position.text_document.uri,
        position.position,
    )?;
    Ok(Some(CompletionResponse::Array(items)))
}

pub fn definition(
    ctx: &RequestContext,
    params: GotoDefinitionParams,
) -> Result<Option<GotoDefinitionResponse>, HandlerError> {
    let position = params.text_document_position_params;
    DefinitionProvider::new().provide(
        &ctx.snapshot,
        &position.text_document.uri,
        position.position,
    )
}

pub fn references(
    ctx: &RequestContext,
    params: ReferenceParams,
) -> Result<Option<Vec<Location>>, HandlerError> {
    let position = params.text_document_position;
    ReferencesProvider::new().provide(
        &ctx.snapshot,
        &position.text_document.uri,
        position.position,
        params.context.include_declaration,
        &ctx.token,
    )
}

pub fn document_symbols(
    ctx: &RequestContext,
    params: DocumentSymbolParams,
) -> Result<Option<DocumentSymbolResponse>, HandlerError> {
    let document = ctx.snapshot.get(&params.text_document.uri)?;
    Ok(Some(DocumentSymbolResponse::Nested(
        SymbolsProvider::new().provide(document),
    )))
}

pub fn semantic_tokens(
    ctx: &RequestContext,
    params: SemanticTokensParams,
) -> Result<Option<SemanticTokensResult>, HandlerError> {
    let document = ctx.snapshot.get(&params.text_document.uri)?;
    Ok(Some(SemanticTokensResult::Tokens(
        SemanticTokensProvider::new().provide(document),
    )))
}

pub fn document_links(
    ctx: &RequestContext,
    params: DocumentLinkParams,
) -> Result<Option<Vec<DocumentLink>>, HandlerError> {
    DocumentLinkProvider::new()
        .provide(&ctx.snapshot, &params.text_document.uri)
        .map(Some)
}

pub fn code_lens(
    ctx: &RequestContext,
    params: CodeLensParams,
) -> Result<Option<Vec<CodeLens>>, HandlerError> {
    let document = ctx.snapshot.get(&params.text_document.uri)?;
    Ok(Some(CodeLensProvider::new().provide(document)))
}

pub fn execute_command(
    ctx: &RequestContext,
    params: ExecuteCommandParams,
) -> Result<Option<Value>, HandlerError> {
    CommandProvider::new().execute(&ctx.snapshot, params)
}

pub fn did_open(
    ctx: &NotificationContext<'_>,
    params: DidOpenTextDocumentParams,
) -> Result<(), HandlerError> {
    let item = params.text_document;
    tracing::debug!(uri = item.uri.as_str(), version = item.version, "open");
    let document = ctx.store.open(item.uri, item.text, item.version);
    publish(ctx, DiagnosticsProvider::new().publish_params(&document))
}

pub fn did_change(
    ctx: &NotificationContext<'_>,
    params: DidChangeTextDocumentParams,
) -> Result<(), HandlerError> {
    let id = params.text_document;
    let document = ctx
        .store
        .change(&id.uri, id.version, params.content_changes)?;
    publish(ctx, DiagnosticsProvider::new().publish_params(&document))
}

pub fn did_save(
    ctx: &NotificationContext<'_>,
    params: DidSaveTextDocumentParams,
) -> Result<(), HandlerError> {
    let document = ctx.store.save(&params.text_document.uri, params.text)?;
    publish(ctx, DiagnosticsProvider::new().publish_params(&document))
}

pub fn did_close(
    ctx: &NotificationContext<'_>,
    params: DidCloseTextDocumentParams,
) -> Result<(), HandlerError> {
    let uri = params.text_document.uri;
    ctx.store.close(&uri)?;
    publish(
        ctx,
        PublishDiagnosticsParams {
            uri,
            diagnostics: Vec::new(),
            version: None,
        },
    )
}

pub fn cancel_request(
    ctx: &NotificationContext<'_>,
    params: CancelParams,
) -> Result<(), HandlerError> {
    let id = request_id(params.id);
    if !ctx.cancellation.cancel(&id) {
        tracing::debug!(%id, "cancel for a request that is not running");
    }
    Ok(())
}

pub fn set_trace(ctx: &NotificationContext<'_>, params: SetTraceParams) -> Result<(), HandlerError> {
    tracing::info!(value = ?params.value, "trace level changed");
    ctx.store.set_trace(params.value == TraceValue::Verbose);
    Ok(())
}

fn publish(ctx: &NotificationContext<'_>, params: PublishDiagnosticsParams) -> Result<(), HandlerError> {
    let not = Notification::new(PublishDiagnostics::METHOD.to_string(), params);
    ctx.connection.send_notification(not)?;
    Ok(())
}
