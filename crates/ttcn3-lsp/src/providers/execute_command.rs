use crate::document::Snapshot;
use crate::error::HandlerError;
use lsp_types::{ExecuteCommandParams, Uri};
use serde_json::Value;
use std::str::FromStr;
use ttcn3_core::project::discover_units;

/// Lists the qualified unit names of a document. Arguments: `[uri]`.
pub const LIST_TESTS_COMMAND: &str = "ttcn3.listTests";

/// Selects a unit for the client to run. Arguments: `[uri, qualifiedName]`.
/// Attached to code lenses. Returns the name once the document is known to
/// declare the unit; running it is up to the client.
pub const RUN_TEST_COMMAND: &str = "ttcn3.runTest";

pub struct CommandProvider;

impl CommandProvider {
    pub fn new() -> Self {
        Self
    }

    /// Commands served by this server.
    pub fn commands() -> Vec<String> {
        vec![
            LIST_TESTS_COMMAND.to_string(),
            RUN_TEST_COMMAND.to_string(),
        ]
    }

    pub fn execute(
        &self,
        snapshot: &Snapshot,
        params: ExecuteCommandParams,
    ) -> Result<Option<Value>, HandlerError> {
        match params.command.as_str() {
            LIST_TESTS_COMMAND => {
                let uri = document_arg(&params)?;
                let document = snapshot.get(&uri)?;
                let names: Vec<Value> = discover_units(document.tree().root())
                    .into_iter()
                    .map(|unit| Value::String(unit.name.to_string()))
                    .collect();
                Ok(Some(Value::Array(names)))
            }
            RUN_TEST_COMMAND => {
                let uri = document_arg(&params)?;
                let Some(Value::String(name)) = params.arguments.get(1) else {
                    return Err(HandlerError::InvalidParams(format!(
                        "{} expects a document uri and a unit name",
                        RUN_TEST_COMMAND
                    )));
                };
                let document = snapshot.get(&uri)?;
                let unit = discover_units(document.tree().root())
                    .into_iter()
                    .find(|unit| unit.name.as_str() == name)
                    .ok_or_else(|| {
                        HandlerError::InvalidParams(format!(
                            "{} declares no unit {:?}",
                            uri.as_str(),
                            name
                        ))
                    })?;
                tracing::info!(unit = unit.name.as_str(), "run requested");
                Ok(Some(Value::String(unit.name.to_string())))
            }
            other => Err(HandlerError::InvalidParams(format!(
                "unknown command {:?}",
                other
            ))),
        }
    }
}

/// The document uri every command takes as its first argument.
fn document_arg(params: &ExecuteCommandParams) -> Result<Uri, HandlerError> {
    match params.arguments.first() {
        Some(Value::String(uri)) => Uri::from_str(uri)
            .map_err(|e| HandlerError::InvalidParams(format!("invalid uri {:?}: {}", uri, e))),
        _ => Err(HandlerError::InvalidParams(format!(
            "{} expects a document uri",
            params.command
        ))),
    }
}

impl Default for CommandProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentStore;
    use serde_json::json;

    fn params(command: &str, arguments: Vec<Value>) -> ExecuteCommandParams {
        ExecuteCommandParams {
            command: command.to_string(),
            arguments,
            work_done_progress_params: Default::default(),
        }
    }

    #[test]
    fn test_list_tests() {
        let store = DocumentStore::new();
        let uri = Uri::from_str("file:///a.ttcn3").unwrap();
        store.open(
            uri,
            "module A {\n  group g { testcase t1() {} }\n  testcase t2() {}\n  control {}\n}".into(),
            1,
        );
        let result = CommandProvider::new()
            .execute(
                &store.snapshot(),
                params(LIST_TESTS_COMMAND, vec![json!("file:///a.ttcn3")]),
            )
            .unwrap();
        assert_eq!(result, Some(json!(["A.t1", "A.t2", "A.control"])));
    }

    #[test]
    fn test_run_test_accepts_lens_arguments() {
        let store = DocumentStore::new();
        let uri = Uri::from_str("file:///a.ttcn3").unwrap();
        store.open(uri, "module A {\n  testcase t1() {}\n}".into(), 1);
        let provider = CommandProvider::new();

        let result = provider
            .execute(
                &store.snapshot(),
                params(RUN_TEST_COMMAND, vec![json!("file:///a.ttcn3"), json!("A.t1")]),
            )
            .unwrap();
        assert_eq!(result, Some(json!("A.t1")));

        let unknown = provider
            .execute(
                &store.snapshot(),
                params(RUN_TEST_COMMAND, vec![json!("file:///a.ttcn3"), json!("A.t9")]),
            )
            .unwrap_err();
        assert!(matches!(unknown, HandlerError::InvalidParams(_)));
        let nameless = provider
            .execute(
                &store.snapshot(),
                params(RUN_TEST_COMMAND, vec![json!("file:///a.ttcn3")]),
            )
            .unwrap_err();
        assert!(matches!(nameless, HandlerError::InvalidParams(_)));
    }

    #[test]
    fn test_bad_arguments_and_unknown_command() {
        let store = DocumentStore::new();
        let provider = CommandProvider::new();
        let missing = provider
            .execute(&store.snapshot(), params(LIST_TESTS_COMMAND, Vec::new()))
            .unwrap_err();
        assert!(matches!(missing, HandlerError::InvalidParams(_)));
        let unknown = provider
            .execute(&store.snapshot(), params("ttcn3.reboot", Vec::new()))
            .unwrap_err();
        assert!(matches!(unknown, HandlerError::InvalidParams(_)));
        let closed = provider
            .execute(
                &store.snapshot(),
                params(LIST_TESTS_COMMAND, vec![json!("file:///gone.ttcn3")]),
            )
            .unwrap_err();
        assert!(matches!(closed, HandlerError::DocumentNotFound(_)));
    }
}
