use super::{span_to_range, to_line_col};
use crate::document::{to_uri, Snapshot};
use crate::error::HandlerError;
use lsp_types::{GotoDefinitionResponse, Location, Position, Uri};
use ttcn3_core::{Declaration, SyntaxTree, TreeIndex};

/// Go to definition, across open documents and project files.
pub struct DefinitionProvider;

impl DefinitionProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn provide(
        &self,
        snapshot: &Snapshot,
        uri: &Uri,
        position: Position,
    ) -> Result<Option<GotoDefinitionResponse>, HandlerError> {
        let document = snapshot.get(uri)?;
        let trees = snapshot.trees();
        let index = TreeIndex::new(document.tree());

        Ok(index
            .definition(to_line_col(position), &trees)
            .and_then(|decl| declaration_location(&trees, &decl))
            .map(GotoDefinitionResponse::Scalar))
    }
}

impl Default for DefinitionProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Location of a declaration's name in whichever tree declares it.
pub(crate) fn declaration_location(
    trees: &[&SyntaxTree],
    decl: &Declaration<'_>,
) -> Option<Location> {
    let tree = trees.iter().find(|tree| tree.uri() == decl.uri)?;
    Some(Location {
        uri: to_uri(decl.uri)?,
        range: span_to_range(tree, &decl.name.span),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentStore;
    use std::str::FromStr;

    #[test]
    fn test_definition_in_other_document() {
        let store = DocumentStore::new();
        let a = Uri::from_str("file:///a.ttcn3").unwrap();
        let b = Uri::from_str("file:///b.ttcn3").unwrap();
        store.open(a.clone(), "module A {\n  const integer limit := 3;\n}".into(), 1);
        store.open(
            b.clone(),
            "module B {\n  import from A all;\n  control { log(limit); }\n}".into(),
            1,
        );

        let result = DefinitionProvider::new()
            .provide(&store.snapshot(), &b, Position::new(2, 17))
            .unwrap();
        let Some(GotoDefinitionResponse::Scalar(location)) = result else {
            panic!("expected a location, got {:?}", result);
        };
        assert_eq!(location.uri, a);
        assert_eq!(location.range.start, Position::new(1, 16));
        assert_eq!(location.range.end, Position::new(1, 21));
    }

    #[test]
    fn test_unknown_document() {
        let store = DocumentStore::new();
        let a = Uri::from_str("file:///a.ttcn3").unwrap();
        let err = DefinitionProvider::new()
            .provide(&store.snapshot(), &a, Position::new(0, 0))
            .unwrap_err();
        assert!(matches!(err, HandlerError::DocumentNotFound(_)));
    }
}
