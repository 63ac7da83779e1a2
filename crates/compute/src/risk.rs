//! Risk / opportunity framing of key factors.

use factorlens_core::{FactorMagnitude, KeyFactor};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskOpportunity {
    pub risks: Vec<FactorMagnitude>,
    pub opportunities: Vec<FactorMagnitude>,
}

/// Negative-impact factors are risks, positive-impact ones opportunities.
/// Both sides are sorted by |contribution| (stable) and capped at `limit`.
pub fn split_risk_opportunity(factors: &[KeyFactor], limit: usize) -> RiskOpportunity {
    let side = |keep: fn(&KeyFactor) -> bool| {
        let mut picked: Vec<FactorMagnitude> = factors
            .iter()
            .filter(|&f| keep(f))
            .map(|f| FactorMagnitude {
                feature_name: f.feature_name.clone(),
                magnitude: f.contribution.abs(),
            })
            .collect();
        picked.sort_by(|a, b| {
            b.magnitude
                .partial_cmp(&a.magnitude)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        picked.truncate(limit);
        picked
    };

    RiskOpportunity {
        risks: side(|f| f.impact.is_negative()),
        opportunities: side(|f| f.impact.is_positive()),
    }
}
