use std::path::PathBuf;
use thiserror::Error;

/// A source or configuration file that could not be loaded.
#[derive(Debug, Error)]
#[error("{}: {source}", .path.display())]
pub struct FileError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl FileError {
    pub fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FileError {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    File(#[from] FileError),

    #[error("{}: invalid manifest: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("manifest has no parent directory: {}", .0.display())]
    NoRoot(PathBuf),

    #[error("key {0:?} not found")]
    KeyNotFound(String),

    #[error("value of key {0:?} is not of type string or list of strings")]
    NotAValue(String),

    #[error("failed to encode configuration: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("preset {0:?} not found")]
    PresetNotFound(String),

    #[error("invalid test pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },
}
