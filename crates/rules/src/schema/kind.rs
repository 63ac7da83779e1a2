//! Document kinds understood by the loader.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleKind {
    /// Calibration bands and counterfactual policy for single decisions.
    ExplainerConfig,
    /// Method weights and thresholds for dataset-level analysis.
    ImportanceConfig,
}

impl RuleKind {
    pub const ALL: [RuleKind; 2] = [RuleKind::ExplainerConfig, RuleKind::ImportanceConfig];

    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::ExplainerConfig => "ExplainerConfig",
            RuleKind::ImportanceConfig => "ImportanceConfig",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        RuleKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = RuleKind::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown document kind '{}' (known: {})", s, known.join(", "))
            })
    }
}
