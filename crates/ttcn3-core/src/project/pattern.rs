use crate::errors::ResolveError;
use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dotted name of a test unit, `module.unit`. Groups do not contribute a
/// segment; control parts are named `module.control`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QualifiedName(String);

impl QualifiedName {
    pub fn new(module: &str, unit: &str) -> Self {
        QualifiedName(format!("{}.{}", module, unit))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn module(&self) -> &str {
        self.0.split('.').next().unwrap_or_default()
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QualifiedName {
    fn from(s: &str) -> Self {
        QualifiedName(s.to_string())
    }
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    // Qualified names are not paths: `*` crosses dots.
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Compiled glob over qualified names: `*`, `?` and `[...]` classes,
/// matched case-sensitively against the whole name.
#[derive(Debug, Clone)]
pub struct TestPattern {
    source: String,
    pattern: Pattern,
}

impl TestPattern {
    pub fn new(source: &str) -> Result<Self, ResolveError> {
        let pattern = Pattern::new(source).map_err(|e| ResolveError::InvalidPattern {
            pattern: source.to_string(),
            message: e.msg.to_string(),
        })?;
        Ok(TestPattern {
            source: source.to_string(),
            pattern,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, name: &QualifiedName) -> bool {
        self.pattern.matches_with(name.as_str(), MATCH_OPTIONS)
    }

    /// Number of dot-separated segments free of wildcard characters.
    pub fn specificity(&self) -> usize {
        self.source
            .split('.')
            .filter(|segment| !segment.contains(['*', '?', '[']))
            .count()
    }
}
