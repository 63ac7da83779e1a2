//! Score → categorical level mapping.
//!
//! All bands come from [`CalibrationThresholds`]; nothing here is hard-coded
//! beyond the order in which bands are scanned.

use factorlens_core::{ConfidenceLevel, ImpactLabel, SignificanceLevel};
use factorlens_rules::CalibrationThresholds;

/// Return the label of the first band whose bound `value` meets or exceeds,
/// scanning `bands` from the highest bound down. Falls back to `default`.
pub fn level_of<L: Copy>(value: f64, bands: &[(f64, L)], default: L) -> L {
    bands
        .iter()
        .find(|(bound, _)| value >= *bound)
        .map(|(_, label)| *label)
        .unwrap_or(default)
}

/// Like [`level_of`] but the bounds are exclusive.
pub fn level_above<L: Copy>(value: f64, bands: &[(f64, L)], default: L) -> L {
    bands
        .iter()
        .find(|(bound, _)| value > *bound)
        .map(|(_, label)| *label)
        .unwrap_or(default)
}

#[derive(Debug, Clone, Default)]
pub struct Calibrator {
    thresholds: CalibrationThresholds,
}

impl Calibrator {
    pub fn new(thresholds: CalibrationThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &CalibrationThresholds {
        &self.thresholds
    }

    pub fn confidence_level(&self, confidence: f64) -> ConfidenceLevel {
        let t = &self.thresholds.confidence;
        level_of(
            confidence,
            &[
                (t.very_high, ConfidenceLevel::VeryHigh),
                (t.high, ConfidenceLevel::High),
                (t.medium, ConfidenceLevel::Medium),
                (t.low, ConfidenceLevel::Low),
            ],
            ConfidenceLevel::VeryLow,
        )
    }

    /// Label a local contribution relative to the prediction it explains.
    /// A zero prediction leaves the contribution unscaled.
    pub fn impact_label(&self, contribution: f64, prediction: f64) -> ImpactLabel {
        let relative = if prediction.abs() > 0.0 {
            contribution / prediction.abs()
        } else {
            contribution
        };

        let t = &self.thresholds.impact;
        if relative >= t.strong_positive {
            ImpactLabel::StrongPositive
        } else if relative >= t.positive {
            ImpactLabel::Positive
        } else if relative <= t.strong_negative {
            ImpactLabel::StrongNegative
        } else if relative <= t.negative {
            ImpactLabel::Negative
        } else {
            ImpactLabel::Neutral
        }
    }

    /// Composite score = importance × (1 − p_value) × stability.
    pub fn significance_level(&self, importance: f64, p_value: f64, stability: f64) -> SignificanceLevel {
        let composite = importance * (1.0 - p_value) * stability;
        let t = &self.thresholds.significance;
        level_above(
            composite,
            &[
                (t.very_high, SignificanceLevel::VeryHigh),
                (t.high, SignificanceLevel::High),
                (t.medium, SignificanceLevel::Medium),
                (t.low, SignificanceLevel::Low),
            ],
            SignificanceLevel::VeryLow,
        )
    }
}
