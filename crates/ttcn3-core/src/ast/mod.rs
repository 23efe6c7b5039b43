pub mod definition;
pub mod node;
pub mod walk;

use crate::span::Span;

pub use definition::*;
pub use node::Node;
pub use walk::{inspect, walk_module_defs};

/// Wrapper for AST nodes with span information
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Spanned { node, span }
    }
}

/// Identifier
pub type Ident = Spanned<String>;

/// Root of a parsed file. A file may hold several modules; runs of tokens
/// that could not be attached to any module are kept as error nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub items: Vec<TopLevel>,
    pub span: Span,
}

impl SourceFile {
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.items.iter().filter_map(|item| match item {
            TopLevel::Module(module) => Some(module),
            TopLevel::Error(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TopLevel {
    Module(Module),
    Error(ErrorNode),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub name: Ident,
    pub defs: Vec<ModuleDef>,
    pub span: Span,
}

/// Placeholder synthesized by error recovery for a run of skipped tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorNode {
    pub span: Span,
}
