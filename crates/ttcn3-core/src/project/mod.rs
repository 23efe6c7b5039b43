//! Project configuration and test-unit resolution.

pub mod config;
pub mod pattern;
pub mod parameters;
pub mod report;
pub mod resolve;
pub mod units;

pub use config::{ProjectConfig, MANIFEST_FILE};
pub use pattern::{QualifiedName, TestPattern};
pub use parameters::{MergedConfigs, ParameterMap, Parameters, TestConfig};
pub use report::{lookup, ConfigReport};
pub use resolve::{apply_presets, ConfigResolver, Resolution, ResolvedExecution, ResolvedUnit};
pub use units::{discover_units, Unit, UnitKind};
