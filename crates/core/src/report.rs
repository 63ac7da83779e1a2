use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::explanation::RankedFactor;

/// One observation of a feature's importance at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemporalPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Time-ordered importance observations keyed by feature name.
pub type TemporalData = IndexMap<String, Vec<TemporalPoint>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

/// Summary of how one feature's importance evolved over the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalSeries {
    pub feature_name: String,
    pub importance_series: Vec<TemporalPoint>,
    pub trend: TrendDirection,
    /// Least-squares slope per observation.
    pub slope: f64,
    pub volatility: f64,
    pub regime_changes: Vec<DateTime<Utc>>,
    pub seasonal_pattern: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEdge {
    pub feature_a: String,
    pub feature_b: String,
    pub strength: f64,
}

/// Undirected feature-pair interaction strengths above the configured threshold.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InteractionNetwork {
    pub edges: Vec<InteractionEdge>,
}

impl InteractionNetwork {
    /// Strength of the pair in either order, if it made the network.
    pub fn strength(&self, a: &str, b: &str) -> Option<f64> {
        self.edges
            .iter()
            .find(|e| {
                (e.feature_a == a && e.feature_b == b) || (e.feature_a == b && e.feature_b == a)
            })
            .map(|e| e.strength)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureStability {
    pub score: f64,
    pub is_stable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureSignificance {
    pub p_value: f64,
    /// 1 - p_value.
    pub confidence: f64,
    pub significant: bool,
}

/// Dataset-level importance analysis.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImportanceReport {
    pub global_importance: Vec<RankedFactor>,
    pub local_importance: IndexMap<String, Vec<RankedFactor>>,
    pub temporal_importance: IndexMap<String, TemporalSeries>,
    pub interaction_network: InteractionNetwork,
    pub stability_analysis: IndexMap<String, FeatureStability>,
    pub statistical_significance: IndexMap<String, FeatureSignificance>,
    /// Non-overlapping clusters of at least two correlated features.
    pub feature_groups: IndexMap<String, Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interaction_lookup_is_symmetric() {
        let network = InteractionNetwork {
            edges: vec![InteractionEdge {
                feature_a: "rsi".into(),
                feature_b: "macd".into(),
                strength: 0.4,
            }],
        };
        assert_eq!(network.strength("rsi", "macd"), Some(0.4));
        assert_eq!(network.strength("macd", "rsi"), Some(0.4));
        assert_eq!(network.strength("rsi", "beta"), None);
    }
}
