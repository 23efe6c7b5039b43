use super::span_to_range;
use crate::document::Document;
use lsp_types::{Diagnostic, DiagnosticSeverity, PublishDiagnosticsParams};
use ttcn3_core::DiagnosticLevel;

/// Converts the syntax errors of a document's tree for publishing.
pub struct DiagnosticsProvider;

impl DiagnosticsProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn provide(&self, document: &Document) -> Vec<Diagnostic> {
        let tree = document.tree();
        tree.diagnostics()
            .iter()
            .map(|d| Diagnostic {
                range: span_to_range(tree, &d.span),
                severity: Some(match d.level {
                    DiagnosticLevel::Error => DiagnosticSeverity::ERROR,
                    DiagnosticLevel::Warning => DiagnosticSeverity::WARNING,
                    DiagnosticLevel::Info => DiagnosticSeverity::INFORMATION,
                }),
                source: Some("ttcn3".to_string()),
                message: d.message.clone(),
                ..Default::default()
            })
            .collect()
    }

    pub fn publish_params(&self, document: &Document) -> PublishDiagnosticsParams {
        PublishDiagnosticsParams {
            uri: document.uri().clone(),
            diagnostics: self.provide(document),
            version: Some(document.version()),
        }
    }
}

impl Default for DiagnosticsProvider {
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
    fn test_syntax_error_range() {
        let store = DocumentStore::new();
        let uri = Uri::from_str("file:///a.ttcn3").unwrap();
        let doc = store.open(uri.clone(), "module A {\n  testcase t() {\n}\n".into(), 4);
        let params = DiagnosticsProvider::new().publish_params(&doc);
        assert_eq!(params.uri, uri);
        assert_eq!(params.version, Some(4));
        assert_eq!(params.diagnostics.len(), 1);
        assert_eq!(params.diagnostics[0].severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(params.diagnostics[0].source.as_deref(), Some("ttcn3"));
    }

    #[test]
    fn test_clean_document() {
        let store = DocumentStore::new();
        let uri = Uri::from_str("file:///a.ttcn3").unwrap();
        let doc = store.open(uri, "module A { const integer x := 1; }".into(), 1);
        assert!(DiagnosticsProvider::new().provide(&doc).is_empty());
    }
}
