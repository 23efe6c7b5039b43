use super::pattern::QualifiedName;
use super::parameters::{MergedConfigs, ParameterMap, Parameters, TestConfig};
use super::units::{discover_units, UnitKind};
use crate::batch::{BatchParseRunner, FileOutcome};
use crate::errors::{FileError, ResolveError};
use crate::fs::FileSystem;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// One unit of a resolved execution with its effective parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedUnit {
    pub name: QualifiedName,
    pub kind: UnitKind,
    pub file: PathBuf,
    pub parameters: ParameterMap,
}

/// Ordered units of one resolution call: file order, then declaration
/// order within each file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedExecution {
    units: Vec<ResolvedUnit>,
}

impl ResolvedExecution {
    pub fn units(&self) -> &[ResolvedUnit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ResolvedUnit> {
        self.units.iter().find(|u| u.name.as_str() == name)
    }

    /// The execution as test configs named by qualified name.
    pub fn to_test_configs(&self) -> Vec<TestConfig> {
        self.units
            .iter()
            .map(|unit| TestConfig {
                test: unit.name.to_string(),
                parameters: unit.parameters.clone(),
            })
            .collect()
    }
}

/// Result of a resolution. Files that failed to load are listed in
/// `file_errors`; the units of every other file are still resolved.
#[derive(Debug, Default)]
pub struct Resolution {
    pub execution: ResolvedExecution,
    pub file_errors: Vec<FileError>,
    /// The override list after presets, in accumulated order.
    pub test_configs: Vec<TestConfig>,
}

pub struct ConfigResolver {
    runner: BatchParseRunner,
}

impl ConfigResolver {
    pub fn new(file_system: Arc<dyn FileSystem>) -> Self {
        ConfigResolver {
            runner: BatchParseRunner::new(file_system),
        }
    }

    pub fn with_runner(runner: BatchParseRunner) -> Self {
        ConfigResolver { runner }
    }

    /// Applies `presets` in order onto the base overrides of `parameters`,
    /// then resolves the effective parameters of every unit in `files`.
    ///
    /// Unknown presets fail before any file is read.
    pub fn resolve(
        &self,
        files: &[PathBuf],
        parameters: &Parameters,
        presets: &[String],
    ) -> Result<Resolution, ResolveError> {
        let merged = apply_presets(parameters, presets)?;

        let report = self.runner.run(files);
        let mut execution = ResolvedExecution::default();
        let mut file_errors = Vec::new();

        for result in report.into_results() {
            match result.outcome {
                FileOutcome::Parsed(tree) => {
                    for unit in discover_units(tree.root()) {
                        let effective = merged.effective(&unit.name, &parameters.global);
                        execution.units.push(ResolvedUnit {
                            name: unit.name,
                            kind: unit.kind,
                            file: result.path.clone(),
                            parameters: effective,
                        });
                    }
                }
                FileOutcome::Failed(e) => file_errors.push(e),
            }
        }

        info!(
            units = execution.len(),
            failed_files = file_errors.len(),
            "resolved test configuration"
        );
        Ok(Resolution {
            execution,
            file_errors,
            test_configs: merged.to_test_configs(),
        })
    }
}

pub fn apply_presets(
    parameters: &Parameters,
    presets: &[String],
) -> Result<MergedConfigs, ResolveError> {
    let mut merged = MergedConfigs::new(&parameters.test_configs)?;
    for (i, name) in presets.iter().enumerate() {
        let configs = parameters
            .presets
            .get(name)
            .ok_or_else(|| ResolveError::PresetNotFound(name.clone()))?;
        debug!(preset = %name, layer = i + 1, "applying preset");
        merged.merge(configs, i + 1)?;
    }
    Ok(merged)
}
