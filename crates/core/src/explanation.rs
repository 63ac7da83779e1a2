use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::attribution::{
    ConfidenceLevel, CounterfactualAction, Direction, ExplanationKind, ImpactLabel,
    SignificanceLevel,
};
use crate::record::Instance;

/// Output of the prediction service for one instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub value: f64,
    /// In [0, 1].
    pub confidence: f64,
}

/// Closed interval around an importance estimate. `(0, 0)` when fewer than
/// two method scores were available.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub low: f64,
    pub high: f64,
}

impl ConfidenceInterval {
    pub const ZERO: ConfidenceInterval = ConfidenceInterval { low: 0.0, high: 0.0 };

    pub fn width(&self) -> f64 {
        self.high - self.low
    }
}

/// Another feature this one interacts with, and how strongly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureInteraction {
    pub feature_name: String,
    pub strength: f64,
}

/// One feature's calibrated importance after combining attribution methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedFactor {
    pub feature_name: String,
    pub importance_score: f64,
    /// importance_score / max importance_score of the batch, in [0, 1].
    pub normalized_score: f64,
    pub significance: SignificanceLevel,
    pub confidence_interval: ConfidenceInterval,
    pub direction: Direction,
    pub p_value: f64,
    pub stability_score: f64,
    pub interactions: Vec<FeatureInteraction>,
}

/// Local contribution of a feature to a single prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFactor {
    pub feature_name: String,
    pub contribution: f64,
    pub impact: ImpactLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureChange {
    pub current_value: f64,
    pub suggested_value: f64,
}

impl FeatureChange {
    pub fn delta(&self) -> f64 {
        self.suggested_value - self.current_value
    }
}

/// A single-feature hypothetical change with its expected payoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counterfactual {
    pub feature_changes: IndexMap<String, FeatureChange>,
    pub action: CounterfactualAction,
    pub expected_impact: f64,
    /// Never above the configured cap (0.8 by default).
    pub confidence: f64,
    pub feasibility: f64,
    pub implementation_cost: f64,
    pub description: String,
}

impl Counterfactual {
    /// Name of the (single) feature this counterfactual changes.
    pub fn feature_name(&self) -> Option<&str> {
        self.feature_changes.keys().next().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyDifference {
    pub feature_name: String,
    pub instance_value: f64,
    pub case_value: f64,
}

/// A historical record judged comparable to the explained instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarCase {
    pub case_id: String,
    pub features: Instance,
    pub prediction: f64,
    pub similarity: f64,
    pub key_differences: Vec<KeyDifference>,
    pub outcome_difference: f64,
}

/// (feature, |contribution|) pair used for risk/opportunity framing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorMagnitude {
    pub feature_name: String,
    pub magnitude: f64,
}

/// Full explanation of one prediction. Built fresh per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub prediction: f64,
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    pub key_factors: Vec<KeyFactor>,
    pub counterfactuals: Vec<Counterfactual>,
    pub similar_cases: Vec<SimilarCase>,
    pub decision_boundary: f64,
    pub risk_factors: Vec<FactorMagnitude>,
    pub opportunity_factors: Vec<FactorMagnitude>,
    pub explanation_type: ExplanationKind,
    pub rationale: String,
}
