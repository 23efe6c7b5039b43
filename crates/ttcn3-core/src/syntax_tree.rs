use crate::ast::SourceFile;
use crate::diagnostics::{CollectingDiagnosticHandler, Diagnostic};
use crate::lexer::Lexer;
use crate::line_index::{LineCol, LineIndex};
use crate::parser::Parser;
use crate::source::SourceText;
use std::sync::Arc;

/// Immutable parse result of one [`SourceText`].
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    uri: String,
    version: i32,
    root: SourceFile,
    diagnostics: Vec<Diagnostic>,
    lines: LineIndex,
}

impl SyntaxTree {
    /// Parses `source`. Never fails: malformed input yields a partial tree
    /// and diagnostics.
    pub fn parse(source: &SourceText) -> Self {
        Self::parse_with_trace(source, false)
    }

    pub fn parse_with_trace(source: &SourceText, trace: bool) -> Self {
        let handler = Arc::new(CollectingDiagnosticHandler::new());
        let mut lexer = Lexer::new(source.content(), handler.clone());
        let tokens = lexer.tokenize();
        let root = Parser::new(tokens, handler.clone())
            .with_trace(trace)
            .parse();

        let diagnostics = handler.take();
        tracing::debug!(
            uri = source.uri(),
            version = source.version(),
            errors = diagnostics.len(),
            "parsed"
        );

        SyntaxTree {
            uri: source.uri().to_string(),
            version: source.version(),
            root,
            diagnostics,
            lines: LineIndex::new(source.shared_content()),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn root(&self) -> &SourceFile {
        &self.root
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn lines(&self) -> &LineIndex {
        &self.lines
    }

    pub fn text(&self) -> &str {
        self.lines.text()
    }

    pub fn offset(&self, position: LineCol) -> usize {
        self.lines.offset(position)
    }

    pub fn position(&self, offset: usize) -> LineCol {
        self.lines.line_col(offset)
    }
}
