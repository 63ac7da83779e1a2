//! Threshold bands mapping raw scores onto categorical levels.

use serde::{Deserialize, Serialize};

use crate::loader::{Result, RuleError};
use crate::validation::{ensure_descending, ensure_finite};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CalibrationThresholds {
    pub confidence: ConfidenceThresholds,
    pub impact: ImpactThresholds,
    pub significance: SignificanceThresholds,
}

/// Lower bounds (inclusive) for prediction-confidence levels. Anything
/// below `low` is very_low.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfidenceThresholds {
    pub very_high: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            very_high: 0.9,
            high: 0.8,
            medium: 0.7,
            low: 0.6,
        }
    }
}

/// Bounds on contribution / |prediction|. Positive bands are inclusive lower
/// bounds, negative bands inclusive upper bounds; in between is neutral.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ImpactThresholds {
    pub strong_positive: f64,
    pub positive: f64,
    pub negative: f64,
    pub strong_negative: f64,
}

impl Default for ImpactThresholds {
    fn default() -> Self {
        Self {
            strong_positive: 0.3,
            positive: 0.1,
            negative: -0.1,
            strong_negative: -0.3,
        }
    }
}

/// Exclusive lower bounds on importance × (1 − p) × stability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SignificanceThresholds {
    pub very_high: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for SignificanceThresholds {
    fn default() -> Self {
        Self {
            very_high: 0.8,
            high: 0.6,
            medium: 0.4,
            low: 0.2,
        }
    }
}

impl CalibrationThresholds {
    pub fn validate(&self) -> Result<()> {
        let c = &self.confidence;
        ensure_descending("calibration.confidence", &[c.very_high, c.high, c.medium, c.low])?;

        let s = &self.significance;
        ensure_descending("calibration.significance", &[s.very_high, s.high, s.medium, s.low])?;

        let i = &self.impact;
        for v in [i.strong_positive, i.positive, i.negative, i.strong_negative] {
            ensure_finite("calibration.impact", v)?;
        }
        let ordered = i.strong_negative <= i.negative
            && i.negative < i.positive
            && i.positive <= i.strong_positive;
        if !ordered {
            return Err(RuleError::Validation(format!(
                "calibration.impact must satisfy strong_negative <= negative < positive <= strong_positive, got {:?}",
                i
            )));
        }
        Ok(())
    }
}
