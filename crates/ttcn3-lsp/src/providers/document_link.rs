use super::span_to_range;
use crate::document::{to_uri, Snapshot};
use crate::error::HandlerError;
use lsp_types::{DocumentLink, Uri};
use ttcn3_core::ast::{walk_module_defs, Definition};

/// Links the module name of every `import from X` to the file declaring X.
pub struct DocumentLinkProvider;

impl DocumentLinkProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn provide(&self, snapshot: &Snapshot, uri: &Uri) -> Result<Vec<DocumentLink>, HandlerError> {
        let document = snapshot.get(uri)?;
        let tree = document.tree();
        let trees = snapshot.trees();

        let mut links = Vec::new();
        for module in tree.root().modules() {
            walk_module_defs(&module.defs, &mut |def| {
                if let Definition::Import(import) = &def.def {
                    let target = trees
                        .iter()
                        .find(|t| t.root().modules().any(|m| m.name.node == import.module.node))
                        .and_then(|t| to_uri(t.uri()));
                    if let Some(target) = target {
                        links.push(DocumentLink {
                            range: span_to_range(tree, &import.module.span),
                            target: Some(target),
                            tooltip: Some(format!("module {}", import.module.node)),
                            data: None,
                        });
                    }
                }
                true
            });
        }
        Ok(links)
    }
}

impl Default for DocumentLinkProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentStore;
    use lsp_types::Position;
    use std::str::FromStr;
    use std::sync::Arc;
    use ttcn3_core::{SourceText, SyntaxTree};

    #[test]
    fn test_links_to_open_and_project_files() {
        let store = DocumentStore::new();
        let on_disk = SyntaxTree::parse(&SourceText::from_file("/p/lib.ttcn3", "module Lib {}"));
        store.set_workspace(vec![Arc::new(on_disk)]);

        let a = Uri::from_str("file:///p/a.ttcn3").unwrap();
        let b = Uri::from_str("file:///p/b.ttcn3").unwrap();
        store.open(b.clone(), "module B {}".into(), 1);
        store.open(
            a.clone(),
            "module A {\n  import from B all;\n  group g { import from Lib all; }\n  import from Missing all;\n}"
                .into(),
            1,
        );

        let links = DocumentLinkProvider::new().provide(&store.snapshot(), &a).unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].target.as_ref(), Some(&b));
        assert_eq!(links[0].range.start, Position::new(1, 14));
        assert_eq!(
            links[1].target.as_ref().map(|u| u.as_str()),
            Some("file:///p/lib.ttcn3")
        );
    }
}
