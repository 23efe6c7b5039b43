use super::span_to_range;
use crate::document::Document;
use lsp_types::{DocumentSymbol, SymbolKind};
use ttcn3_core::{Symbol, SymbolClass, SyntaxTree, TreeIndex};

/// Provides document symbols (outline view)
pub struct SymbolsProvider;

impl SymbolsProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn provide(&self, document: &Document) -> Vec<DocumentSymbol> {
        let tree = document.tree();
        TreeIndex::new(tree)
            .document_symbols()
            .iter()
            .map(|symbol| to_document_symbol(tree, symbol))
            .collect()
    }
}

impl Default for SymbolsProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(deprecated)]
fn to_document_symbol(tree: &SyntaxTree, symbol: &Symbol) -> DocumentSymbol {
    let children: Vec<DocumentSymbol> = symbol
        .children
        .iter()
        .map(|child| to_document_symbol(tree, child))
        .collect();
    DocumentSymbol {
        name: symbol.name.clone(),
        detail: None,
        kind: symbol_kind(symbol.class),
        tags: None,
        deprecated: None,
        range: span_to_range(tree, &symbol.span),
        selection_range: span_to_range(tree, &symbol.selection_span),
        children: (!children.is_empty()).then_some(children),
    }
}

pub(crate) fn symbol_kind(class: SymbolClass) -> SymbolKind {
    match class {
        SymbolClass::Module => SymbolKind::MODULE,
        SymbolClass::Group => SymbolKind::NAMESPACE,
        SymbolClass::Testcase | SymbolClass::Control => SymbolKind::METHOD,
        SymbolClass::Function | SymbolClass::Altstep => SymbolKind::FUNCTION,
        SymbolClass::Import => SymbolKind::PACKAGE,
        SymbolClass::Const => SymbolKind::CONSTANT,
        SymbolClass::Variable | SymbolClass::Timer | SymbolClass::Port => SymbolKind::VARIABLE,
        SymbolClass::Template => SymbolKind::OBJECT,
        SymbolClass::ModulePar => SymbolKind::PROPERTY,
        SymbolClass::Type => SymbolKind::STRUCT,
        SymbolClass::Enum => SymbolKind::ENUM,
        SymbolClass::Component => SymbolKind::CLASS,
        SymbolClass::Field => SymbolKind::FIELD,
        SymbolClass::EnumItem => SymbolKind::ENUM_MEMBER,
        SymbolClass::Parameter => SymbolKind::TYPE_PARAMETER,
    }
}
