//! Attribution aggregation: many method maps in, one calibrated ranking out.

use indexmap::IndexMap;
use tracing::debug;

use factorlens_core::{ConfidenceInterval, Direction, FeatureInteraction, RankedFactor};
use factorlens_rules::MethodWeights;

use crate::calibration::Calibrator;
use crate::providers::MethodScores;
use crate::stats;

/// Stability reported when fewer than two methods scored a feature.
pub const NEUTRAL_STABILITY: f64 = 0.5;

/// Pairwise interaction statistic in [0, 1].
pub trait InteractionEstimator: Send + Sync {
    fn strength(&self, feature_a: &str, feature_b: &str) -> Option<f64>;
}

/// Probability that a feature's importance is noise, in [0, 1].
pub trait PValueEstimator: Send + Sync {
    fn p_value(&self, feature: &str) -> Option<f64>;
}

/// Weighted combination of one feature's method scores.
#[derive(Debug, Clone, PartialEq)]
pub struct Combined {
    /// Σ score·weight / Σ weight over the methods that scored the feature.
    pub score: f64,
    /// The unweighted scores that went into `score`.
    pub raw_scores: Vec<f64>,
}

/// Combine the methods present for `feature`, renormalising by the weights
/// actually used. Methods without a positive weight are ignored.
pub fn combine(weights: &MethodWeights, scores: &MethodScores, feature: &str) -> Combined {
    let mut weighted = 0.0;
    let mut weight_used = 0.0;
    let mut raw_scores = Vec::new();

    for (method, map) in scores {
        let Some(value) = map.get(feature) else {
            continue;
        };
        let weight = weights.weight(*method).unwrap_or(0.0);
        if weight <= 0.0 {
            continue;
        }
        weighted += value * weight;
        weight_used += weight;
        raw_scores.push(*value);
    }

    let score = if weight_used > 0.0 { weighted / weight_used } else { 0.0 };
    Combined { score, raw_scores }
}

/// Combined score per feature, in `feature_names` order.
pub fn combine_all(
    weights: &MethodWeights,
    scores: &MethodScores,
    feature_names: &[String],
) -> Vec<(String, f64)> {
    feature_names
        .iter()
        .map(|name| (name.clone(), combine(weights, scores, name).score))
        .collect()
}

/// How the combined score becomes the ranked importance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreMode {
    /// importance = combined score; direction from the domain table.
    Signed,
    /// importance = |combined score|; direction = its sign.
    Magnitude,
}

pub struct Aggregator<'a> {
    weights: &'a MethodWeights,
    calibrator: &'a Calibrator,
    directions: Option<&'a IndexMap<String, Direction>>,
    interactions: Option<&'a dyn InteractionEstimator>,
    p_values: Option<&'a dyn PValueEstimator>,
    mode: ScoreMode,
    max_display_features: usize,
    max_interactions: usize,
    ci_z_score: f64,
}

impl<'a> Aggregator<'a> {
    pub fn new(weights: &'a MethodWeights, calibrator: &'a Calibrator) -> Self {
        Self {
            weights,
            calibrator,
            directions: None,
            interactions: None,
            p_values: None,
            mode: ScoreMode::Signed,
            max_display_features: 15,
            max_interactions: 5,
            ci_z_score: 1.96,
        }
    }

    pub fn with_directions(mut self, table: &'a IndexMap<String, Direction>) -> Self {
        self.directions = Some(table);
        self
    }

    pub fn with_interactions(mut self, estimator: &'a dyn InteractionEstimator) -> Self {
        self.interactions = Some(estimator);
        self
    }

    pub fn with_p_values(mut self, estimator: &'a dyn PValueEstimator) -> Self {
        self.p_values = Some(estimator);
        self
    }

    pub fn with_mode(mut self, mode: ScoreMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_limits(mut self, max_display_features: usize, max_interactions: usize) -> Self {
        self.max_display_features = max_display_features;
        self.max_interactions = max_interactions;
        self
    }

    pub fn with_ci_z_score(mut self, z: f64) -> Self {
        self.ci_z_score = z;
        self
    }

    /// Rank `feature_names` by their combined importance.
    ///
    /// Empty features or empty method maps give an empty ranking.
    pub fn rank(&self, feature_names: &[String], scores: &MethodScores) -> Vec<RankedFactor> {
        if feature_names.is_empty() || scores.is_empty() {
            return Vec::new();
        }

        let mut factors: Vec<RankedFactor> = feature_names
            .iter()
            .map(|name| self.assess(name, feature_names, scores))
            .collect();

        normalize(&mut factors);

        factors.sort_by(|a, b| {
            b.importance_score
                .partial_cmp(&a.importance_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        factors.truncate(self.max_display_features);

        debug!(
            features = feature_names.len(),
            methods = scores.len(),
            ranked = factors.len(),
            "Aggregated attribution scores"
        );
        factors
    }

    fn assess(&self, name: &str, feature_names: &[String], scores: &MethodScores) -> RankedFactor {
        let combined = combine(self.weights, scores, name);

        let (importance_score, direction) = match self.mode {
            ScoreMode::Signed => (combined.score, self.direction_of(name)),
            ScoreMode::Magnitude => (combined.score.abs(), Direction::from_sign(combined.score)),
        };

        let stability_score = if combined.raw_scores.len() >= 2 {
            stats::agreement_stability(&combined.raw_scores)
        } else {
            NEUTRAL_STABILITY
        };

        let confidence_interval = stats::normal_interval(&combined.raw_scores, self.ci_z_score)
            .map(|(low, high)| ConfidenceInterval { low, high })
            .unwrap_or(ConfidenceInterval::ZERO);

        let p_value = self
            .p_values
            .and_then(|e| e.p_value(name))
            .filter(|p| p.is_finite())
            .map(|p| p.clamp(0.0, 1.0))
            .unwrap_or(1.0);

        RankedFactor {
            feature_name: name.to_string(),
            importance_score,
            normalized_score: 0.0,
            significance: self
                .calibrator
                .significance_level(importance_score, p_value, stability_score),
            confidence_interval,
            direction,
            p_value,
            stability_score,
            interactions: self.interactions_of(name, feature_names),
        }
    }

    fn direction_of(&self, name: &str) -> Direction {
        self.directions
            .and_then(|table| table.get(name).copied())
            .unwrap_or_default()
    }

    /// Strongest partners first, at most `max_interactions`.
    fn interactions_of(&self, name: &str, feature_names: &[String]) -> Vec<FeatureInteraction> {
        let Some(estimator) = self.interactions else {
            return Vec::new();
        };
        let mut partners: Vec<FeatureInteraction> = feature_names
            .iter()
            .filter(|other| other.as_str() != name)
            .filter_map(|other| {
                let strength = estimator.strength(name, other)?;
                strength.is_finite().then(|| FeatureInteraction {
                    feature_name: other.clone(),
                    strength: strength.clamp(0.0, 1.0),
                })
            })
            .collect();
        partners.sort_by(|a, b| {
            b.strength
                .partial_cmp(&a.strength)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        partners.truncate(self.max_interactions);
        partners
    }
}

/// Divide by the batch maximum. A non-positive maximum zeroes every
/// normalized score; negatives under a positive maximum floor at 0.
fn normalize(factors: &mut [RankedFactor]) {
    let max = factors
        .iter()
        .map(|f| f.importance_score)
        .fold(f64::NEG_INFINITY, f64::max);
    for factor in factors.iter_mut() {
        factor.normalized_score = if max > 0.0 {
            (factor.importance_score / max).clamp(0.0, 1.0)
        } else {
            0.0
        };
    }
}
