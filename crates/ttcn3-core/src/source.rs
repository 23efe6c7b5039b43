use std::sync::Arc;

/// An immutable snapshot of one file's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    uri: String,
    content: Arc<str>,
    version: i32,
}

impl SourceText {
    pub fn new(uri: impl Into<String>, content: impl Into<Arc<str>>, version: i32) -> Self {
        SourceText {
            uri: uri.into(),
            content: content.into(),
            version,
        }
    }

    /// Snapshot of a file read from disk outside an editor session.
    pub fn from_file(uri: impl Into<String>, content: impl Into<Arc<str>>) -> Self {
        Self::new(uri, content, 0)
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn shared_content(&self) -> Arc<str> {
        Arc::clone(&self.content)
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    /// A new snapshot of the same file with replaced content.
    pub fn with_content(&self, content: impl Into<Arc<str>>, version: i32) -> Self {
        SourceText {
            uri: self.uri.clone(),
            content: content.into(),
            version,
        }
    }
}
