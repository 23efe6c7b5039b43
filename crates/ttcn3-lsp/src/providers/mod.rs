pub mod code_lens;
pub mod completion;
pub mod definition;
pub mod diagnostics;
pub mod document_link;
pub mod execute_command;
pub mod references;
pub mod semantic_tokens;
pub mod symbols;

pub use code_lens::CodeLensProvider;
pub use completion::CompletionProvider;
pub use definition::DefinitionProvider;
pub use diagnostics::DiagnosticsProvider;
pub use document_link::DocumentLinkProvider;
pub use execute_command::{CommandProvider, LIST_TESTS_COMMAND, RUN_TEST_COMMAND};
pub use references::ReferencesProvider;
pub use semantic_tokens::SemanticTokensProvider;
pub use symbols::SymbolsProvider;

use lsp_types::{Position, Range};
use ttcn3_core::{LineCol, Span, SyntaxTree};

pub(crate) fn span_to_range(tree: &SyntaxTree, span: &Span) -> Range {
    Range {
        start: to_position(tree.position(span.start)),
        end: to_position(tree.position(span.end)),
    }
}

pub(crate) fn to_position(pos: LineCol) -> Position {
    Position::new(pos.line, pos.character)
}

pub(crate) fn to_line_col(pos: Position) -> LineCol {
    LineCol::new(pos.line, pos.character)
}
