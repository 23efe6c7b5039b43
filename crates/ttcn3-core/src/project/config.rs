use super::parameters::Parameters;
use crate::errors::{ConfigError, FileError};
use crate::fs::{FileSystem, RealFileSystem};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "package.yml";

/// Project manifest (`package.yml`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub name: String,

    /// Directory holding the manifest. Derived on load, never read from the
    /// file.
    #[serde(default, skip_deserializing)]
    pub root: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<PathBuf>,

    #[serde(default)]
    pub sources: Vec<PathBuf>,

    #[serde(default)]
    pub imports: Vec<PathBuf>,

    /// Separate YAML file holding the test parameters. Replaces
    /// `parameters` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lint_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, String>,

    #[serde(default)]
    pub parameters: Parameters,
}

impl ProjectConfig {
    /// Loads a manifest from disk. `path` may name the manifest itself or
    /// the directory containing it.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let manifest = if path.is_dir() {
            path.join(MANIFEST_FILE)
        } else {
            path.to_path_buf()
        };
        Self::load(&RealFileSystem::new(), &manifest)
    }

    pub fn load(fs: &dyn FileSystem, manifest: &Path) -> Result<Self, ConfigError> {
        let root = manifest
            .parent()
            .ok_or_else(|| ConfigError::NoRoot(manifest.to_path_buf()))?
            .to_path_buf();

        let mut config: ProjectConfig = read_yaml(fs, manifest)?;
        config.root = root;
        config.source_dir = config.source_dir.take().map(|dir| config.resolve(&dir));
        config.sources = config.sources.iter().map(|s| config.resolve(s)).collect();
        config.imports = config.imports.iter().map(|s| config.resolve(s)).collect();
        config.hooks_file = config.hooks_file.take().map(|f| config.resolve(&f));
        config.lint_file = config.lint_file.take().map(|f| config.resolve(&f));

        if let Some(file) = config.parameters_file.take() {
            let file = config.resolve(&file);
            config.parameters = read_yaml(fs, &file)?;
            config.parameters_file = Some(file);
        }

        tracing::debug!(
            name = %config.name,
            root = %config.root.display(),
            sources = config.sources.len(),
            "loaded project manifest"
        );
        Ok(config)
    }

    /// A configuration for loose files given on the command line, rooted at
    /// the current directory.
    pub fn from_sources(sources: Vec<PathBuf>) -> Self {
        ProjectConfig {
            root: PathBuf::from("."),
            sources,
            ..Default::default()
        }
    }

    /// `path` relative to the project root, unless already absolute.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Variables as `KEY=VALUE` strings, in declaration order.
    pub fn environ(&self) -> Vec<String> {
        self.variables
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect()
    }
}

fn read_yaml<T: serde::de::DeserializeOwned>(
    fs: &dyn FileSystem,
    path: &Path,
) -> Result<T, ConfigError> {
    let content = fs
        .read_to_string(path)
        .map_err(|e| FileError::new(path, e))?;
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryFileSystem;
    use serde_json::json;

    #[test]
    fn test_load_resolves_paths() {
        let fs = MemoryFileSystem::new();
        fs.add_file(
            "/proj/package.yml",
            "name: demo\nsources: [src, /abs/lib.ttcn3]\nhooks_file: hooks.sh\nvariables:\n  SUT: localhost\n",
        );
        let config = ProjectConfig::load(&fs, Path::new("/proj/package.yml")).unwrap();
        assert_eq!(config.name, "demo");
        assert_eq!(config.root, PathBuf::from("/proj"));
        assert_eq!(
            config.sources,
            vec![PathBuf::from("/proj/src"), PathBuf::from("/abs/lib.ttcn3")]
        );
        assert_eq!(config.hooks_file, Some(PathBuf::from("/proj/hooks.sh")));
        assert_eq!(config.environ(), vec!["SUT=localhost".to_string()]);
    }

    #[test]
    fn test_parameters_file_replaces_inline_parameters() {
        let fs = MemoryFileSystem::new();
        fs.add_file(
            "/proj/package.yml",
            "parameters_file: params.yml\nparameters:\n  global:\n    timeout: 1\n",
        );
        fs.add_file("/proj/params.yml", "global:\n  timeout: 9\n");
        let config = ProjectConfig::load(&fs, Path::new("/proj/package.yml")).unwrap();
        assert_eq!(config.parameters.global["timeout"], json!(9));
        assert_eq!(config.parameters_file, Some(PathBuf::from("/proj/params.yml")));
    }

    #[test]
    fn test_missing_manifest() {
        let fs = MemoryFileSystem::new();
        let err = ProjectConfig::load(&fs, Path::new("/proj/package.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::File(_)));
    }

    #[test]
    fn test_invalid_yaml() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/proj/package.yml", "sources: {");
        let err = ProjectConfig::load(&fs, Path::new("/proj/package.yml")).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }
}
