use crate::providers::{CommandProvider, SemanticTokensProvider};
use lsp_types::*;

/// Capabilities advertised in the `initialize` response. Formatting,
/// renaming, folding and call hierarchy are advertised and answered
/// with "not implemented".
pub fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::INCREMENTAL),
                save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                    include_text: Some(true),
                })),
                ..Default::default()
            },
        )),
        completion_provider: Some(CompletionOptions {
            trigger_characters: Some(vec![".".to_string()]),
            ..Default::default()
        }),
        definition_provider: Some(OneOf::Left(true)),
        references_provider: Some(OneOf::Left(true)),
        document_symbol_provider: Some(OneOf::Left(true)),
        document_link_provider: Some(DocumentLinkOptions {
            resolve_provider: Some(false),
            work_done_progress_options: WorkDoneProgressOptions::default(),
        }),
        code_lens_provider: Some(CodeLensOptions {
            resolve_provider: Some(false),
        }),
        execute_command_provider: Some(ExecuteCommandOptions {
            commands: CommandProvider::commands(),
            work_done_progress_options: WorkDoneProgressOptions::default(),
        }),
        semantic_tokens_provider: Some(SemanticTokensServerCapabilities::SemanticTokensOptions(
            SemanticTokensOptions {
                legend: SemanticTokensProvider::legend(),
                full: Some(SemanticTokensFullOptions::Bool(true)),
                range: Some(false),
                ..Default::default()
            },
        )),
        document_formatting_provider: Some(OneOf::Left(true)),
        document_range_formatting_provider: Some(OneOf::Left(true)),
        rename_provider: Some(OneOf::Left(true)),
        folding_range_provider: Some(FoldingRangeProviderCapability::Simple(true)),
        call_hierarchy_provider: Some(CallHierarchyServerCapability::Simple(true)),
        ..Default::default()
    }
}

/// Request methods implied by [`server_capabilities`].
pub fn advertised_methods() -> Vec<&'static str> {
    use lsp_types::request::*;
    vec![
        Completion::METHOD,
        GotoDefinition::METHOD,
        References::METHOD,
        DocumentSymbolRequest::METHOD,
        DocumentLinkRequest::METHOD,
        CodeLensRequest::METHOD,
        ExecuteCommand::METHOD,
        SemanticTokensFullRequest::METHOD,
        Formatting::METHOD,
        RangeFormatting::METHOD,
        Rename::METHOD,
        FoldingRangeRequest::METHOD,
        CallHierarchyPrepare::METHOD,
        CallHierarchyIncomingCalls::METHOD,
        CallHierarchyOutgoingCalls::METHOD,
    ]
}

pub fn server_info() -> ServerInfo {
    ServerInfo {
        name: "ttcn3-lsp".to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
    }
}
