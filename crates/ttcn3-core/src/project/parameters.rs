use super::pattern::{QualifiedName, TestPattern};
use crate::errors::ResolveError;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub type ParameterMap = IndexMap<String, serde_json::Value>;

/// Parameter overrides for every unit whose qualified name matches `test`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestConfig {
    pub test: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: ParameterMap,
}

impl TestConfig {
    pub fn new(test: impl Into<String>) -> Self {
        TestConfig {
            test: test.into(),
            parameters: ParameterMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

/// Test parameters of a project: global values, glob overrides and named
/// presets of further overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Applied to every unit before any override.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub global: ParameterMap,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub test_configs: Vec<TestConfig>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub presets: IndexMap<String, Vec<TestConfig>>,

    /// Resolved units. Only filled in by resolution, never read.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub execute: Vec<TestConfig>,
}

/// A test config together with where it came from: layer 0 is the base
/// list, layer `i` the `i`-th applied preset.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub pattern: TestPattern,
    pub parameters: ParameterMap,
    pub layer: usize,
    pub order: usize,
}

/// The accumulated override list after presets have been applied.
#[derive(Debug, Clone, Default)]
pub struct MergedConfigs {
    entries: Vec<LayeredConfig>,
}

impl MergedConfigs {
    /// Builds the base layer. Duplicate patterns within the base list merge
    /// into their first occurrence.
    pub fn new(base: &[TestConfig]) -> Result<Self, ResolveError> {
        let mut merged = MergedConfigs::default();
        merged.merge(base, 0)?;
        Ok(merged)
    }

    /// Merges `configs` as `layer`. An entry whose pattern equals an
    /// accumulated pattern merges into it key-wise and takes the new layer;
    /// any other entry is appended.
    pub fn merge(&mut self, configs: &[TestConfig], layer: usize) -> Result<(), ResolveError> {
        for config in configs {
            match self
                .entries
                .iter_mut()
                .find(|entry| entry.pattern.as_str() == config.test)
            {
                Some(entry) => {
                    for (key, value) in &config.parameters {
                        entry.parameters.insert(key.clone(), value.clone());
                    }
                    entry.layer = layer;
                }
                None => {
                    let order = self.entries.len();
                    self.entries.push(LayeredConfig {
                        pattern: TestPattern::new(&config.test)?,
                        parameters: config.parameters.clone(),
                        layer,
                        order,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn entries(&self) -> &[LayeredConfig] {
        &self.entries
    }

    /// Effective parameters of `name`: `global` first, then every matching
    /// entry ordered by layer, specificity and declaration order, later
    /// entries overriding earlier ones key by key.
    pub fn effective(&self, name: &QualifiedName, global: &ParameterMap) -> ParameterMap {
        let mut matching: Vec<&LayeredConfig> = self
            .entries
            .iter()
            .filter(|entry| entry.pattern.matches(name))
            .collect();
        matching.sort_by_key(|entry| (entry.layer, entry.pattern.specificity(), entry.order));

        let mut parameters = global.clone();
        for entry in matching {
            for (key, value) in &entry.parameters {
                parameters.insert(key.clone(), value.clone());
            }
        }
        parameters
    }

    /// Back to plain test configs, in accumulated order.
    pub fn to_test_configs(&self) -> Vec<TestConfig> {
        self.entries
            .iter()
            .map(|entry| TestConfig {
                test: entry.pattern.as_str().to_string(),
                parameters: entry.parameters.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_same_pattern_keywise() {
        let mut merged =
            MergedConfigs::new(&[TestConfig::new("a.*").with("timeout", 5).with("retries", 1)])
                .unwrap();
        merged
            .merge(&[TestConfig::new("a.*").with("timeout", 30)], 1)
            .unwrap();

        let entries = merged.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].layer, 1);
        assert_eq!(entries[0].parameters["timeout"], json!(30));
        assert_eq!(entries[0].parameters["retries"], json!(1));
    }

    #[test]
    fn test_merge_appends_new_patterns() {
        let mut merged = MergedConfigs::new(&[TestConfig::new("a.t1")]).unwrap();
        merged.merge(&[TestConfig::new("*")], 1).unwrap();
        let patterns: Vec<_> = merged
            .to_test_configs()
            .into_iter()
            .map(|c| c.test)
            .collect();
        assert_eq!(patterns, vec!["a.t1", "*"]);
    }

    #[test]
    fn test_specific_beats_wildcard_in_same_layer() {
        let merged = MergedConfigs::new(&[
            TestConfig::new("a.t1").with("timeout", 5),
            TestConfig::new("*").with("timeout", 1),
        ])
        .unwrap();
        let params = merged.effective(&QualifiedName::from("a.t1"), &ParameterMap::new());
        assert_eq!(params["timeout"], json!(5));
    }

    #[test]
    fn test_later_layer_beats_specificity() {
        let mut merged = MergedConfigs::new(&[TestConfig::new("a.t1").with("timeout", 5)]).unwrap();
        merged
            .merge(&[TestConfig::new("*").with("timeout", 30)], 1)
            .unwrap();
        let params = merged.effective(&QualifiedName::from("a.t1"), &ParameterMap::new());
        assert_eq!(params["timeout"], json!(30));
    }

    #[test]
    fn test_global_is_lowest() {
        let merged = MergedConfigs::new(&[TestConfig::new("a.*").with("timeout", 5)]).unwrap();
        let mut global = ParameterMap::new();
        global.insert("timeout".into(), json!(1));
        global.insert("verbose".into(), json!(true));

        let params = merged.effective(&QualifiedName::from("a.t1"), &global);
        assert_eq!(params["timeout"], json!(5));
        assert_eq!(params["verbose"], json!(true));
        let other = merged.effective(&QualifiedName::from("b.t1"), &global);
        assert_eq!(other["timeout"], json!(1));
    }

    #[test]
    fn test_parameters_from_yaml() {
        let yaml = r#"
global:
  timeout: 10
test_configs:
  - test: "a.*"
    parameters:
      timeout: 5
presets:
  slow:
    - test: "*"
      parameters:
        timeout: 60
"#;
        let params: Parameters = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(params.global["timeout"], json!(10));
        assert_eq!(params.test_configs[0].test, "a.*");
        assert_eq!(params.presets["slow"][0].parameters["timeout"], json!(60));
        assert!(params.execute.is_empty());
    }
}
