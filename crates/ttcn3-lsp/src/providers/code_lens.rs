use super::span_to_range;
use super::execute_command::RUN_TEST_COMMAND;
use crate::document::Document;
use lsp_types::{CodeLens, Command};
use serde_json::json;
use ttcn3_core::project::{discover_units, UnitKind};

/// One "run" lens above every test case, control function and control part.
pub struct CodeLensProvider;

impl CodeLensProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn provide(&self, document: &Document) -> Vec<CodeLens> {
        let tree = document.tree();
        discover_units(tree.root())
            .into_iter()
            .map(|unit| CodeLens {
                range: span_to_range(tree, &unit.span),
                command: Some(Command {
                    title: match unit.kind {
                        UnitKind::Testcase => "run test".to_string(),
                        UnitKind::ControlFunction | UnitKind::Control => "run control".to_string(),
                    },
                    command: RUN_TEST_COMMAND.to_string(),
                    arguments: Some(vec![
                        json!(document.uri().as_str()),
                        json!(unit.name.as_str()),
                    ]),
                }),
                data: None,
            })
            .collect()
    }
}

impl Default for CodeLensProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentStore;
    use lsp_types::Uri;
    use std::str::FromStr;

    #[test]
    fn test_lens_per_unit() {
        let store = DocumentStore::new();
        let uri = Uri::from_str("file:///a.ttcn3").unwrap();
        let doc = store.open(
            uri,
            "module A {\n  testcase t1() {}\n  function f() {}\n  control { execute(t1()); }\n}".into(),
            1,
        );
        let lenses = CodeLensProvider::new().provide(&doc);
        assert_eq!(lenses.len(), 2);

        let run = lenses[0].command.as_ref().unwrap();
        assert_eq!(run.title, "run test");
        assert_eq!(run.command, "ttcn3.runTest");
        assert_eq!(
            run.arguments,
            Some(vec![json!("file:///a.ttcn3"), json!("A.t1")])
        );
        assert_eq!(lenses[0].range.start.line, 1);
        let control = lenses[1].command.as_ref().unwrap();
        assert_eq!(control.arguments.as_ref().unwrap()[1], json!("A.control"));
    }
}
