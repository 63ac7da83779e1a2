//! Single-feature counterfactual synthesis.

use indexmap::IndexMap;
use tracing::debug;

use factorlens_core::{Counterfactual, CounterfactualAction, FeatureChange, KeyFactor};
use factorlens_rules::explainer_config::{ActionTransform, CounterfactualPolicy};

/// Relative-change guard for features currently at zero.
const CHANGE_EPSILON: f64 = 1e-8;

pub struct CounterfactualSynthesizer<'a> {
    policy: &'a CounterfactualPolicy,
    candidates: usize,
    max_counterfactuals: usize,
}

impl<'a> CounterfactualSynthesizer<'a> {
    pub fn new(policy: &'a CounterfactualPolicy, candidates: usize, max_counterfactuals: usize) -> Self {
        Self {
            policy,
            candidates,
            max_counterfactuals,
        }
    }

    /// One counterfactual per leading factor, in factor order.
    ///
    /// `baseline` supplies each feature's current value; factors it has no
    /// value for are skipped.
    pub fn synthesize<F>(&self, factors: &[KeyFactor], baseline: F) -> Vec<Counterfactual>
    where
        F: Fn(&str) -> Option<f64>,
    {
        let mut out: Vec<Counterfactual> = factors
            .iter()
            .take(self.candidates)
            .filter_map(|factor| {
                let Some(current) = baseline(factor.feature_name.as_str()).filter(|v| v.is_finite()) else {
                    debug!(feature = %factor.feature_name, "No baseline value, skipping counterfactual");
                    return None;
                };
                self.build(factor, current)
            })
            .collect();
        out.truncate(self.max_counterfactuals);
        out
    }

    /// `None` when the transformed value or impact leaves the f64 range.
    fn build(&self, factor: &KeyFactor, current_value: f64) -> Option<Counterfactual> {
        let action = CounterfactualAction::for_impact(factor.impact);
        let transform = self.transform(action);
        let magnitude = factor.contribution.abs();
        let suggested_value = current_value * transform.value_factor;
        let expected_impact = magnitude * transform.impact_factor;
        if !suggested_value.is_finite() || !expected_impact.is_finite() {
            debug!(feature = %factor.feature_name, current_value, "Counterfactual overflows, skipping");
            return None;
        }

        let change = FeatureChange {
            current_value,
            suggested_value,
        };
        let mut feature_changes = IndexMap::new();
        feature_changes.insert(factor.feature_name.clone(), change);

        Some(Counterfactual {
            feature_changes,
            action,
            expected_impact,
            confidence: magnitude.min(self.policy.confidence_cap),
            feasibility: self.feasibility(&factor.feature_name, &change),
            implementation_cost: self.cost(&factor.feature_name, &change),
            description: describe(action, &factor.feature_name),
        })
    }

    fn transform(&self, action: CounterfactualAction) -> ActionTransform {
        match action {
            CounterfactualAction::Increase => self.policy.increase,
            CounterfactualAction::Maintain => self.policy.maintain,
            CounterfactualAction::Optimize => self.policy.optimize,
        }
    }

    fn feasibility(&self, feature: &str, change: &FeatureChange) -> f64 {
        let table = &self.policy.feasibility;
        let relative = change.delta().abs() / (change.current_value.abs() + CHANGE_EPSILON);
        table.base_for(feature) * table.attenuation_for(relative)
    }

    fn cost(&self, feature: &str, change: &FeatureChange) -> f64 {
        let table = &self.policy.cost;
        (table.base_for(feature) * (1.0 + change.delta().abs() * table.change_amplification)).min(1.0)
    }
}

pub fn describe(action: CounterfactualAction, feature: &str) -> String {
    match action {
        CounterfactualAction::Increase => {
            format!("Increase {} to strengthen its positive impact", feature)
        }
        CounterfactualAction::Maintain => {
            format!("Maintain the current level of {} to preserve its benefit", feature)
        }
        CounterfactualAction::Optimize => format!("Optimize {} for a better balance", feature),
    }
}
