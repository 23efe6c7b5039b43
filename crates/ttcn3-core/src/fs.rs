use rustc_hash::FxHashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use walkdir::WalkDir;

/// File extensions of TTCN-3 sources.
pub const TTCN3_EXTENSIONS: &[&str] = &["ttcn3", "ttcn", "ttcnpp"];

/// File access used by the resolver and the batch runner.
pub trait FileSystem: Send + Sync {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
    fn exists(&self, path: &Path) -> bool;
}

/// Disk-backed file system.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl RealFileSystem {
    pub fn new() -> Self {
        RealFileSystem
    }
}

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// In-memory file system for tests.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: RwLock<FxHashMap<PathBuf, String>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(path.into(), content.into());
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains_key(path)
    }
}

pub fn is_ttcn3_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| TTCN3_EXTENSIONS.contains(&ext))
}

/// Expands source entries to TTCN-3 files. Files are kept as given;
/// directories contribute their TTCN-3 files, non-recursively and sorted.
/// Entries that exist as neither are returned as errors.
pub fn ttcn3_files(sources: &[PathBuf]) -> (Vec<PathBuf>, Vec<(PathBuf, io::Error)>) {
    let mut files = Vec::new();
    let mut errors = Vec::new();

    for source in sources {
        if source.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(source)
                .min_depth(1)
                .max_depth(1)
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        tracing::warn!(source = %source.display(), error = %e, "skipping entry");
                        None
                    }
                })
                .filter(|entry| entry.file_type().is_file() && is_ttcn3_file(entry.path()))
                .map(|entry| entry.into_path())
                .collect();
            found.sort();
            files.extend(found);
        } else if source.is_file() {
            files.push(source.clone());
        } else {
            errors.push((
                source.clone(),
                io::Error::new(io::ErrorKind::NotFound, "no such file or directory"),
            ));
        }
    }

    (files, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_file_system() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/a.ttcn3", "module A {}");
        assert!(fs.exists(Path::new("/a.ttcn3")));
        assert_eq!(fs.read_to_string(Path::new("/a.ttcn3")).unwrap(), "module A {}");
        assert_eq!(
            fs.read_to_string(Path::new("/b.ttcn3")).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn test_ttcn3_files_scans_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.ttcn3"), "").unwrap();
        std::fs::write(dir.path().join("a.ttcn"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("c.ttcn3"), "").unwrap();

        let missing = dir.path().join("missing");
        let (files, errors) = ttcn3_files(&[dir.path().to_path_buf(), missing.clone()]);
        let names: Vec<_> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.ttcn", "b.ttcn3"]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, missing);
    }
}
