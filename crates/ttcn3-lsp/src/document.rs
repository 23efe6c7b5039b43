use crate::error::HandlerError;
use lsp_types::{TextDocumentContentChangeEvent, Uri};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use ttcn3_core::{LineCol, LineIndex, SourceText, SyntaxTree};

/// An open document: its latest text and the tree parsed from it.
#[derive(Debug)]
pub struct Document {
    uri: Uri,
    source: SourceText,
    tree: SyntaxTree,
}

impl Document {
    fn parse(uri: Uri, source: SourceText, trace: bool) -> Self {
        let tree = SyntaxTree::parse_with_trace(&source, trace);
        Document { uri, source, tree }
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn version(&self) -> i32 {
        self.source.version()
    }

    pub fn text(&self) -> &str {
        self.source.content()
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }
}

type Slot = Arc<Mutex<Arc<Document>>>;

/// Open documents, one lock per URI.
///
/// The slot map is behind an `RwLock` held only to look up or insert a slot.
/// A mutation holds its slot's lock across the whole read-modify-write,
/// reparse included, so changes to one document are strictly ordered while
/// readers of other documents are never blocked.
#[derive(Debug, Default)]
pub struct DocumentStore {
    slots: RwLock<FxHashMap<Uri, Slot>>,
    /// Trees of project files that are not necessarily open.
    workspace: RwLock<Vec<Arc<SyntaxTree>>>,
    trace: AtomicBool,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser trace for every later (re)parse.
    pub fn set_trace(&self, trace: bool) {
        self.trace.store(trace, Ordering::Relaxed);
    }

    pub fn set_workspace(&self, trees: Vec<Arc<SyntaxTree>>) {
        tracing::info!(files = trees.len(), "loaded workspace files");
        *self
            .workspace
            .write()
            .unwrap_or_else(PoisonError::into_inner) = trees;
    }

    pub fn open(&self, uri: Uri, text: String, version: i32) -> Arc<Document> {
        let source = SourceText::new(uri.as_str(), text, version);
        let document = Arc::new(Document::parse(uri.clone(), source, self.trace()));
        let slot = Arc::new(Mutex::new(Arc::clone(&document)));
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(uri, slot);
        document
    }

    /// Applies `changes` in order. A change without a range replaces the
    /// whole text; ranged changes are in UTF-16 positions of the text
    /// produced by the previous change.
    pub fn change(
        &self,
        uri: &Uri,
        version: i32,
        changes: Vec<TextDocumentContentChangeEvent>,
    ) -> Result<Arc<Document>, HandlerError> {
        let slot = self.slot(uri)?;
        let mut current = slot.lock().unwrap_or_else(PoisonError::into_inner);

        let mut text = current.text().to_string();
        for change in changes {
            match change.range {
                Some(range) => {
                    let lines = LineIndex::new(Arc::from(text.as_str()));
                    let start = lines.offset(LineCol::new(range.start.line, range.start.character));
                    let end = lines.offset(LineCol::new(range.end.line, range.end.character));
                    if start > end {
                        return Err(HandlerError::InvalidParams(format!(
                            "change range ends before it starts in {}",
                            uri.as_str()
                        )));
                    }
                    text.replace_range(start..end, &change.text);
                }
                None => text = change.text,
            }
        }

        let source = current.source.with_content(text, version);
        let document = Arc::new(Document::parse(uri.clone(), source, self.trace()));
        *current = Arc::clone(&document);
        Ok(document)
    }

    /// Re-parses from `text` when the client included it on save.
    pub fn save(&self, uri: &Uri, text: Option<String>) -> Result<Arc<Document>, HandlerError> {
        let slot = self.slot(uri)?;
        let mut current = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(text) = text {
            let source = current.source.with_content(text, current.version());
            *current = Arc::new(Document::parse(uri.clone(), source, self.trace()));
        }
        Ok(Arc::clone(&*current))
    }

    pub fn close(&self, uri: &Uri) -> Result<(), HandlerError> {
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(uri)
            .map(|_| ())
            .ok_or_else(|| not_found(uri))
    }

    pub fn get(&self, uri: &Uri) -> Result<Arc<Document>, HandlerError> {
        let slot = self.slot(uri)?;
        let document = slot.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(&*document))
    }

    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The current version of every document, taken at once.
    pub fn snapshot(&self) -> Snapshot {
        let slots: Vec<Slot> = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        let mut documents: Vec<Arc<Document>> = slots
            .iter()
            .map(|slot| Arc::clone(&*slot.lock().unwrap_or_else(PoisonError::into_inner)))
            .collect();
        documents.sort_by(|a, b| a.uri.as_str().cmp(b.uri.as_str()));

        let workspace = self
            .workspace
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|tree| {
                !documents
                    .iter()
                    .any(|doc| doc.uri.as_str() == file_uri(tree.uri()))
            })
            .cloned()
            .collect();

        Snapshot {
            documents,
            workspace,
        }
    }

    fn slot(&self, uri: &Uri) -> Result<Slot, HandlerError> {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(uri)
            .cloned()
            .ok_or_else(|| not_found(uri))
    }

    fn trace(&self) -> bool {
        self.trace.load(Ordering::Relaxed)
    }
}

/// Immutable view of the store taken when a request began.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    documents: Vec<Arc<Document>>,
    workspace: Vec<Arc<SyntaxTree>>,
}

impl Snapshot {
    pub fn get(&self, uri: &Uri) -> Result<&Document, HandlerError> {
        self.documents
            .iter()
            .find(|doc| doc.uri == *uri)
            .map(Arc::as_ref)
            .ok_or_else(|| not_found(uri))
    }

    pub fn documents(&self) -> &[Arc<Document>] {
        &self.documents
    }

    /// Open documents first, then project files that are not open.
    pub fn trees(&self) -> Vec<&SyntaxTree> {
        self.documents
            .iter()
            .map(|doc| doc.tree())
            .chain(self.workspace.iter().map(Arc::as_ref))
            .collect()
    }
}

fn not_found(uri: &Uri) -> HandlerError {
    HandlerError::DocumentNotFound(uri.as_str().to_string())
}

/// Bytes escaped in the path of a `file://` URI.
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Trees of open documents are named by their URI, project files by their
/// path.
pub fn file_uri(name: &str) -> String {
    if name.contains("://") {
        name.to_string()
    } else {
        format!("file://{}", utf8_percent_encode(name, PATH))
    }
}

pub fn to_uri(name: &str) -> Option<Uri> {
    Uri::from_str(&file_uri(name)).ok()
}

/// The path a `file://` URI names, with percent escapes decoded.
pub fn to_path(uri: &Uri) -> Option<PathBuf> {
    let path = uri.as_str().strip_prefix("file://")?;
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    Some(PathBuf::from(decoded.as_ref()))
}
