use crate::errors::FileError;
use crate::fs::FileSystem;
use crate::source::SourceText;
use crate::syntax_tree::SyntaxTree;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug)]
pub enum FileOutcome {
    Parsed(Arc<SyntaxTree>),
    Failed(FileError),
}

#[derive(Debug)]
pub struct FileResult {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

impl FileResult {
    pub fn tree(&self) -> Option<&Arc<SyntaxTree>> {
        match &self.outcome {
            FileOutcome::Parsed(tree) => Some(tree),
            FileOutcome::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&FileError> {
        match &self.outcome {
            FileOutcome::Parsed(_) => None,
            FileOutcome::Failed(e) => Some(e),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.tree().is_some_and(|tree| !tree.has_errors())
    }
}

/// Results of one batch, in input order and addressable by path.
#[derive(Debug, Default)]
pub struct BatchReport {
    results: Vec<FileResult>,
    by_path: FxHashMap<PathBuf, usize>,
}

impl BatchReport {
    fn new(results: Vec<FileResult>) -> Self {
        let by_path = results
            .iter()
            .enumerate()
            .map(|(i, r)| (r.path.clone(), i))
            .collect();
        BatchReport { results, by_path }
    }

    pub fn get(&self, path: &Path) -> Option<&FileResult> {
        self.by_path.get(path).map(|&i| &self.results[i])
    }

    pub fn results(&self) -> &[FileResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<FileResult> {
        self.results
    }

    /// No load errors and no error-level diagnostics.
    pub fn success(&self) -> bool {
        self.results.iter().all(FileResult::is_ok)
    }

    pub fn exit_code(&self) -> i32 {
        if self.success() {
            0
        } else {
            1
        }
    }
}

/// Parses many files on a bounded rayon pool.
pub struct BatchParseRunner {
    file_system: Arc<dyn FileSystem>,
    max_threads: Option<usize>,
    trace: bool,
}

impl BatchParseRunner {
    pub fn new(file_system: Arc<dyn FileSystem>) -> Self {
        BatchParseRunner {
            file_system,
            max_threads: None,
            trace: false,
        }
    }

    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = Some(max_threads.max(1));
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn run(&self, files: &[PathBuf]) -> BatchReport {
        if files.is_empty() {
            return BatchReport::default();
        }

        let available = std::thread::available_parallelism().map_or(1, |n| n.get());
        let threads = self
            .max_threads
            .unwrap_or(available)
            .min(files.len())
            .max(1);
        debug!(files = files.len(), threads, "starting batch parse");

        let parse_all = || -> Vec<FileResult> {
            files.par_iter().map(|path| self.parse_file(path)).collect()
        };
        let results = match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(parse_all),
            Err(e) => {
                warn!(error = %e, "could not build parse pool, using the global pool");
                parse_all()
            }
        };

        BatchReport::new(results)
    }

    fn parse_file(&self, path: &Path) -> FileResult {
        let outcome = match self.file_system.read_to_string(path) {
            Ok(content) => {
                let source = SourceText::from_file(path.display().to_string(), content);
                FileOutcome::Parsed(Arc::new(SyntaxTree::parse_with_trace(&source, self.trace)))
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read file");
                FileOutcome::Failed(FileError::new(path, e))
            }
        };
        FileResult {
            path: path.to_path_buf(),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;

    fn runner(files: &[(&str, &str)]) -> BatchParseRunner {
        let fs = MemoryFileSystem::new();
        for (path, content) in files {
            fs.add_file(*path, *content);
        }
        BatchParseRunner::new(Arc::new(fs)).with_max_threads(2)
    }

    #[test]
    fn test_all_files_parse() {
        let runner = runner(&[("/a.ttcn3", "module A {}"), ("/b.ttcn3", "module B {}")]);
        let report = runner.run(&[PathBuf::from("/a.ttcn3"), PathBuf::from("/b.ttcn3")]);
        assert!(report.success());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.results()[1].path, PathBuf::from("/b.ttcn3"));
    }

    #[test]
    fn test_syntax_error_fails_batch() {
        let runner = runner(&[("/a.ttcn3", "module A {}"), ("/b.ttcn3", "module B {")]);
        let report = runner.run(&[PathBuf::from("/a.ttcn3"), PathBuf::from("/b.ttcn3")]);
        assert!(!report.success());
        assert_eq!(report.exit_code(), 1);
        assert!(report.get(Path::new("/a.ttcn3")).unwrap().is_ok());
        assert!(!report.get(Path::new("/b.ttcn3")).unwrap().is_ok());
    }

    #[test]
    fn test_missing_file_is_reported() {
        let runner = runner(&[("/a.ttcn3", "module A {}")]);
        let report = runner.run(&[PathBuf::from("/a.ttcn3"), PathBuf::from("/gone.ttcn3")]);
        assert_eq!(report.exit_code(), 1);
        let missing = report.get(Path::new("/gone.ttcn3")).unwrap();
        assert!(missing.error().is_some());
        assert!(missing.tree().is_none());
    }

    #[test]
    fn test_empty_batch_succeeds() {
        let report = runner(&[]).run(&[]);
        assert!(report.success());
        assert!(report.results().is_empty());
    }
}
