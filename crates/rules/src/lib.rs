//! YAML configuration documents for the explanation engine.
//!
//! This crate provides:
//! - `ExplainerConfig` and `ImportanceConfig` rule kinds carrying every
//!   threshold, weight table and domain table the scoring code reads
//! - `extends` inheritance with deep-merge
//! - Directory loading into a [`ConfigSet`] with validated, compiled specs

pub mod calibration;
pub mod explainer_config;
pub mod importance_config;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod weights;

pub use calibration::CalibrationThresholds;
pub use explainer_config::{CompiledExplainerConfig, ExplainerConfigRule, ExplainerConfigSpec};
pub use importance_config::{CompiledImportanceConfig, ImportanceConfigRule, ImportanceConfigSpec};
pub use loader::{ConfigSet, Result, RuleError};
pub use weights::MethodWeights;
