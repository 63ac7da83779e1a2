//! Per-method weights used when combining attribution signals.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use factorlens_core::AttributionMethod;

use crate::loader::{Result, RuleError};
use crate::validation::ensure_non_negative;

/// Weight per attribution method. Iteration order is the document order,
/// which is also the order method scores are collected in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodWeights(pub IndexMap<AttributionMethod, f64>);

impl MethodWeights {
    /// Dataset-level defaults: shap 0.30, permutation 0.25, model_based 0.20,
    /// mutual_info 0.15, correlation 0.10.
    pub fn global_defaults() -> Self {
        Self(IndexMap::from([
            (AttributionMethod::Shap, 0.30),
            (AttributionMethod::Permutation, 0.25),
            (AttributionMethod::ModelBased, 0.20),
            (AttributionMethod::MutualInfo, 0.15),
            (AttributionMethod::Correlation, 0.10),
        ]))
    }

    /// Per-instance defaults: shap 0.7, lime 0.3.
    pub fn local_defaults() -> Self {
        Self(IndexMap::from([
            (AttributionMethod::Shap, 0.7),
            (AttributionMethod::Lime, 0.3),
        ]))
    }

    pub fn weight(&self, method: AttributionMethod) -> Option<f64> {
        self.0.get(&method).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttributionMethod, f64)> + '_ {
        self.0.iter().map(|(m, w)| (*m, *w))
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn validate(&self, field: &str) -> Result<()> {
        for (method, weight) in self.iter() {
            ensure_non_negative(&format!("{}.{}", field, method), weight)?;
        }
        if self.total() <= 0.0 {
            return Err(RuleError::Validation(format!(
                "{} must contain at least one positive weight",
                field
            )));
        }
        Ok(())
    }
}
