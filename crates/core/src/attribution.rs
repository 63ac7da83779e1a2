use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Attribution methods the engine knows how to weight. Closed set: a method
/// map keyed by anything else is rejected at deserialization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionMethod {
    Shap,
    Lime,
    Permutation,
    ModelBased,
    Correlation,
    MutualInfo,
}

impl AttributionMethod {
    pub const ALL: [AttributionMethod; 6] = [
        AttributionMethod::Shap,
        AttributionMethod::Lime,
        AttributionMethod::Permutation,
        AttributionMethod::ModelBased,
        AttributionMethod::Correlation,
        AttributionMethod::MutualInfo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttributionMethod::Shap => "shap",
            AttributionMethod::Lime => "lime",
            AttributionMethod::Permutation => "permutation",
            AttributionMethod::ModelBased => "model_based",
            AttributionMethod::Correlation => "correlation",
            AttributionMethod::MutualInfo => "mutual_info",
        }
    }
}

impl fmt::Display for AttributionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttributionMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        AttributionMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown attribution method: '{}'", s))
    }
}

/// Expected sign of a feature's effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Direction {
    pub fn from_sign(value: f64) -> Self {
        if value > 0.0 {
            Direction::Positive
        } else if value < 0.0 {
            Direction::Negative
        } else {
            Direction::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryHigh,
    High,
    Medium,
    Low,
    VeryLow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignificanceLevel {
    VeryHigh,
    High,
    Medium,
    Low,
    VeryLow,
}

/// Categorical effect of a contribution relative to the prediction magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLabel {
    StrongPositive,
    Positive,
    Neutral,
    Negative,
    StrongNegative,
}

impl ImpactLabel {
    pub fn is_positive(&self) -> bool {
        matches!(self, ImpactLabel::Positive | ImpactLabel::StrongPositive)
    }

    pub fn is_negative(&self) -> bool {
        matches!(self, ImpactLabel::Negative | ImpactLabel::StrongNegative)
    }
}

impl fmt::Display for ImpactLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImpactLabel::StrongPositive => write!(f, "strong_positive"),
            ImpactLabel::Positive => write!(f, "positive"),
            ImpactLabel::Neutral => write!(f, "neutral"),
            ImpactLabel::Negative => write!(f, "negative"),
            ImpactLabel::StrongNegative => write!(f, "strong_negative"),
        }
    }
}

/// What a counterfactual asks the user to do with a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterfactualAction {
    Increase,
    Maintain,
    Optimize,
}

impl CounterfactualAction {
    /// Negative factors get pushed up, positive ones kept, the rest tuned.
    pub fn for_impact(impact: ImpactLabel) -> Self {
        if impact.is_negative() {
            CounterfactualAction::Increase
        } else if impact.is_positive() {
            CounterfactualAction::Maintain
        } else {
            CounterfactualAction::Optimize
        }
    }
}

impl fmt::Display for CounterfactualAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterfactualAction::Increase => write!(f, "increase"),
            CounterfactualAction::Maintain => write!(f, "maintain"),
            CounterfactualAction::Optimize => write!(f, "optimize"),
        }
    }
}

/// Label carried on an explanation describing what the caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationKind {
    #[default]
    Counterfactual,
    FeatureAttribution,
    ExampleBased,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names_round_trip_through_from_str() {
        for method in AttributionMethod::ALL {
            assert_eq!(method.as_str().parse::<AttributionMethod>(), Ok(method));
        }
        assert!("gradcam".parse::<AttributionMethod>().is_err());
    }

    #[test]
    fn method_serializes_as_snake_case() {
        let json = serde_json::to_string(&AttributionMethod::ModelBased).unwrap();
        assert_eq!(json, "\"model_based\"");
    }

    #[test]
    fn action_follows_impact_sign() {
        assert_eq!(
            CounterfactualAction::for_impact(ImpactLabel::StrongNegative),
            CounterfactualAction::Increase
        );
        assert_eq!(
            CounterfactualAction::for_impact(ImpactLabel::Positive),
            CounterfactualAction::Maintain
        );
        assert_eq!(
            CounterfactualAction::for_impact(ImpactLabel::Neutral),
            CounterfactualAction::Optimize
        );
    }

    #[test]
    fn direction_from_sign() {
        assert_eq!(Direction::from_sign(0.3), Direction::Positive);
        assert_eq!(Direction::from_sign(-0.1), Direction::Negative);
        assert_eq!(Direction::from_sign(0.0), Direction::Neutral);
    }
}
