pub mod ast;
pub mod batch;
pub mod diagnostics;
pub mod errors;
pub mod fs;
pub mod index;
pub mod lexer;
pub mod line_index;
pub mod parser;
pub mod project;
pub mod source;
pub mod span;
pub mod syntax_tree;

pub use batch::{BatchParseRunner, BatchReport, FileOutcome, FileResult};
pub use diagnostics::{CollectingDiagnosticHandler, Diagnostic, DiagnosticHandler, DiagnosticLevel};
pub use errors::{ConfigError, FileError, ResolveError};
pub use fs::{FileSystem, MemoryFileSystem, RealFileSystem};
pub use index::{Declaration, NodePath, SemanticToken, Symbol, SymbolClass, TokenClass, TreeIndex};
pub use line_index::{LineCol, LineIndex};
pub use source::SourceText;
pub use span::Span;
pub use syntax_tree::SyntaxTree;
