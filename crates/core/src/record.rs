use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ExplainError, Result};

/// Feature values of one instance, keyed by feature name in model order.
pub type Instance = IndexMap<String, f64>;

/// A row of the historical dataset used for similar-case lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    #[serde(default)]
    pub case_id: Option<String>,
    pub features: Instance,
    /// Observed outcome. When absent the prediction service is asked.
    #[serde(default)]
    pub outcome: Option<f64>,
}

/// Tabular training data: `rows[i][j]` is feature `feature_names[j]` of sample `i`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
}

impl Dataset {
    pub fn new(feature_names: Vec<String>, rows: Vec<Vec<f64>>, targets: Vec<f64>) -> Self {
        Self {
            feature_names,
            rows,
            targets,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check shape and finiteness. Called once before any analysis runs.
    pub fn validate(&self) -> Result<()> {
        if self.rows.len() != self.targets.len() {
            return Err(ExplainError::InvalidInput(format!(
                "dataset has {} rows but {} targets",
                self.rows.len(),
                self.targets.len()
            )));
        }
        let width = self.feature_names.len();
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != width {
                return Err(ExplainError::InvalidInput(format!(
                    "row {} has {} values, expected {}",
                    i,
                    row.len(),
                    width
                )));
            }
            if let Some(j) = row.iter().position(|v| !v.is_finite()) {
                return Err(ExplainError::InvalidInput(format!(
                    "row {} has a non-finite value for '{}'",
                    i, self.feature_names[j]
                )));
            }
        }
        if let Some(i) = self.targets.iter().position(|v| !v.is_finite()) {
            return Err(ExplainError::InvalidInput(format!(
                "target {} is not finite",
                i
            )));
        }
        Ok(())
    }

    /// Column of feature `j` across all rows.
    pub fn column(&self, j: usize) -> Vec<f64> {
        self.rows.iter().map(|row| row[j]).collect()
    }

    /// Row `i` keyed by feature name.
    pub fn instance(&self, i: usize) -> Option<Instance> {
        let row = self.rows.get(i)?;
        Some(
            self.feature_names
                .iter()
                .cloned()
                .zip(row.iter().copied())
                .collect(),
        )
    }
}
