//! Numeric sanity checks applied when a configuration document is compiled.
//!
//! Every helper returns [`RuleError::Validation`] naming the offending field
//! so a bad override fails at load time rather than producing NaN scores.

use crate::loader::{Result, RuleError};

/// Value must be finite.
pub fn ensure_finite(field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RuleError::Validation(format!("{} must be finite, got {}", field, value)))
    }
}

/// Value must lie in (0, 1].
pub fn ensure_unit_open(field: &str, value: f64) -> Result<()> {
    ensure_finite(field, value)?;
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(RuleError::Validation(format!("{} must be in (0, 1], got {}", field, value)))
    }
}

/// Value must lie in [0, 1].
pub fn ensure_unit_closed(field: &str, value: f64) -> Result<()> {
    ensure_finite(field, value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(RuleError::Validation(format!("{} must be in [0, 1], got {}", field, value)))
    }
}

pub fn ensure_non_negative(field: &str, value: f64) -> Result<()> {
    ensure_finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(RuleError::Validation(format!("{} must be >= 0, got {}", field, value)))
    }
}

pub fn ensure_positive_count(field: &str, value: usize) -> Result<()> {
    if value > 0 {
        Ok(())
    } else {
        Err(RuleError::Validation(format!("{} must be at least 1", field)))
    }
}

/// Bands must be strictly descending (highest label first).
pub fn ensure_descending(field: &str, values: &[f64]) -> Result<()> {
    for v in values {
        ensure_finite(field, *v)?;
    }
    if values.windows(2).all(|w| w[0] > w[1]) {
        Ok(())
    } else {
        Err(RuleError::Validation(format!(
            "{} thresholds must be strictly descending, got {:?}",
            field, values
        )))
    }
}
