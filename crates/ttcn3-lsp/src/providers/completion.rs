use super::to_line_col;
use crate::document::Snapshot;
use crate::error::HandlerError;
use lsp_types::{CompletionItem, CompletionItemKind, Position, Uri};
use ttcn3_core::{SymbolClass, TreeIndex};

/// Offers the names visible at the cursor: locals, then module definitions,
/// then module names.
pub struct CompletionProvider;

impl CompletionProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn provide(
        &self,
        snapshot: &Snapshot,
        uri: &Uri,
        position: Position,
    ) -> Result<Vec<CompletionItem>, HandlerError> {
        let document = snapshot.get(uri)?;
        let trees = snapshot.trees();
        let candidates = TreeIndex::new(document.tree()).completions(to_line_col(position), &trees);

        Ok(candidates
            .into_iter()
            .enumerate()
            .map(|(rank, candidate)| CompletionItem {
                kind: Some(completion_kind(candidate.class)),
                // Keeps the innermost-first order in clients that sort.
                sort_text: Some(format!("{:04}", rank)),
                label: candidate.name,
                ..Default::default()
            })
            .collect())
    }
}

impl Default for CompletionProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn completion_kind(class: SymbolClass) -> CompletionItemKind {
    match class {
        SymbolClass::Module | SymbolClass::Import => CompletionItemKind::MODULE,
        SymbolClass::Group => CompletionItemKind::FOLDER,
        SymbolClass::Testcase | SymbolClass::Control => CompletionItemKind::METHOD,
        SymbolClass::Function | SymbolClass::Altstep => CompletionItemKind::FUNCTION,
        SymbolClass::Const => CompletionItemKind::CONSTANT,
        SymbolClass::Variable
        | SymbolClass::Timer
        | SymbolClass::Port
        | SymbolClass::Parameter => CompletionItemKind::VARIABLE,
        SymbolClass::Template => CompletionItemKind::VALUE,
        SymbolClass::ModulePar => CompletionItemKind::PROPERTY,
        SymbolClass::Type => CompletionItemKind::STRUCT,
        SymbolClass::Enum => CompletionItemKind::ENUM,
        SymbolClass::Component => CompletionItemKind::CLASS,
        SymbolClass::Field => CompletionItemKind::FIELD,
        SymbolClass::EnumItem => CompletionItemKind::ENUM_MEMBER,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentStore;
    use std::str::FromStr;

    #[test]
    fn test_locals_first_then_modules() {
        let store = DocumentStore::new();
        let a = Uri::from_str("file:///a.ttcn3").unwrap();
        let b = Uri::from_str("file:///b.ttcn3").unwrap();
        store.open(
            a.clone(),
            "module A {\n  const integer c := 1;\n  function f(integer p) {\n    var integer v := p;\n    \n  }\n}".into(),
            1,
        );
        store.open(b, "module B {}".into(), 1);

        let items = CompletionProvider::new()
            .provide(&store.snapshot(), &a, Position::new(4, 4))
            .unwrap();
        let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["v", "p", "c", "f", "A", "B"]);
        assert_eq!(items[2].kind, Some(CompletionItemKind::CONSTANT));
        assert_eq!(items[4].kind, Some(CompletionItemKind::MODULE));
        assert_eq!(items[0].sort_text.as_deref(), Some("0000"));
    }
}
