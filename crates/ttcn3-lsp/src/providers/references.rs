use super::{span_to_range, to_line_col};
use crate::cancel::CancelToken;
use crate::document::{to_uri, Snapshot};
use crate::error::HandlerError;
use lsp_types::{Location, Position, Uri};
use ttcn3_core::TreeIndex;

/// Find references of the declaration under the cursor in every known tree.
pub struct ReferencesProvider;

impl ReferencesProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn provide(
        &self,
        snapshot: &Snapshot,
        uri: &Uri,
        position: Position,
        include_declaration: bool,
        token: &CancelToken,
    ) -> Result<Option<Vec<Location>>, HandlerError> {
        let document = snapshot.get(uri)?;
        let trees = snapshot.trees();
        let Some(decl) = TreeIndex::new(document.tree()).definition(to_line_col(position), &trees)
        else {
            return Ok(None);
        };

        let mut locations = Vec::new();
        for tree in &trees {
            token.check()?;
            let Some(tree_uri) = to_uri(tree.uri()) else {
                continue;
            };
            for span in TreeIndex::new(tree).references_to(&decl, &trees) {
                if !include_declaration && tree.uri() == decl.uri && span == decl.name.span {
                    continue;
                }
                locations.push(Location {
                    uri: tree_uri.clone(),
                    range: span_to_range(tree, &span),
                });
            }
        }
        Ok(Some(locations))
    }
}

impl Default for ReferencesProvider {
    fn default() -> Self {
        Self::new()
    }
}
