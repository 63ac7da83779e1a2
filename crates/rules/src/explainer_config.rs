//! ExplainerConfig rule kind with limits, calibration bands, local method
//! weights and the counterfactual policy (action transforms, feasibility
//! and cost tiers) used when explaining a single decision.

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationThresholds;
use crate::loader::Result;
use crate::schema::DocumentMeta;
use crate::validation::{
    ensure_finite, ensure_non_negative, ensure_positive_count, ensure_unit_closed,
    ensure_unit_open,
};
use crate::weights::MethodWeights;

// ── YAML-level types ────────────────────────────────────────────────

/// Top-level ExplainerConfig document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExplainerConfigRule {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: DocumentMeta,
    #[serde(default)]
    pub spec: ExplainerConfigSpec,
}

/// Specification section of an ExplainerConfig document. Every field
/// defaults, so a document only lists what it overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ExplainerConfigSpec {
    /// Upper bound on returned counterfactuals.
    pub max_counterfactuals: usize,
    /// Key factors kept after ranking by |contribution|.
    pub max_key_factors: usize,
    /// Top key factors considered for counterfactual generation.
    pub counterfactual_candidates: usize,
    pub max_similar_cases: usize,
    /// Similar cases below this similarity are dropped.
    pub similarity_threshold: f64,
    /// Prediction value the decision boundary is measured from.
    pub decision_threshold: f64,
    /// Relative difference above which a feature is reported as a key difference.
    pub key_difference_threshold: f64,
    pub max_key_differences: usize,
    /// Positive / negative factors named in the rationale.
    pub rationale_factor_count: usize,
    /// Cap on each of the risk and opportunity lists.
    pub max_risk_factors: usize,
    /// Weights for combining per-instance attribution methods.
    pub local_method_weights: MethodWeights,
    pub calibration: CalibrationThresholds,
    pub counterfactual: CounterfactualPolicy,
}

impl Default for ExplainerConfigSpec {
    fn default() -> Self {
        Self {
            max_counterfactuals: 5,
            max_key_factors: 10,
            counterfactual_candidates: 3,
            max_similar_cases: 3,
            similarity_threshold: 0.0,
            decision_threshold: 0.0,
            key_difference_threshold: 0.1,
            max_key_differences: 3,
            rationale_factor_count: 2,
            max_risk_factors: 5,
            local_method_weights: MethodWeights::local_defaults(),
            calibration: CalibrationThresholds::default(),
            counterfactual: CounterfactualPolicy::default(),
        }
    }
}

/// How a counterfactual is derived from a ranked factor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CounterfactualPolicy {
    /// Counterfactual confidence never exceeds this.
    pub confidence_cap: f64,
    pub increase: ActionTransform,
    pub maintain: ActionTransform,
    pub optimize: ActionTransform,
    pub feasibility: FeasibilityTable,
    pub cost: CostTable,
}

impl Default for CounterfactualPolicy {
    fn default() -> Self {
        Self {
            confidence_cap: 0.8,
            increase: ActionTransform {
                value_factor: 1.20,
                impact_factor: 0.8,
            },
            maintain: ActionTransform {
                value_factor: 1.05,
                impact_factor: 0.9,
            },
            optimize: ActionTransform {
                value_factor: 0.90,
                impact_factor: 0.5,
            },
            feasibility: FeasibilityTable::default(),
            cost: CostTable::default(),
        }
    }
}

/// suggested = current × value_factor; expected_impact = |contribution| × impact_factor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ActionTransform {
    pub value_factor: f64,
    pub impact_factor: f64,
}

/// Relative change below `below` scales feasibility by `factor`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AttenuationBand {
    pub below: f64,
    pub factor: f64,
}

/// Feature-category feasibility tiers. The first tier listing a feature wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FeasibilityTable {
    pub easy: Vec<String>,
    pub medium: Vec<String>,
    pub hard: Vec<String>,
    pub easy_score: f64,
    pub medium_score: f64,
    pub hard_score: f64,
    pub default_score: f64,
    /// Ascending by `below`; the first band the change falls under applies.
    pub attenuation: Vec<AttenuationBand>,
    /// Applied when the change exceeds every band.
    pub large_change_factor: f64,
}

impl Default for FeasibilityTable {
    fn default() -> Self {
        Self {
            easy: strings(&["rsi", "momentum", "volume_trend", "sentiment"]),
            medium: strings(&["volatility", "beta", "market_cap"]),
            hard: strings(&["pe_ratio", "dividend_yield", "sector_performance"]),
            easy_score: 0.8,
            medium_score: 0.6,
            hard_score: 0.4,
            default_score: 0.5,
            attenuation: vec![
                AttenuationBand {
                    below: 0.1,
                    factor: 0.9,
                },
                AttenuationBand {
                    below: 0.3,
                    factor: 0.7,
                },
            ],
            large_change_factor: 0.5,
        }
    }
}

impl FeasibilityTable {
    pub fn base_for(&self, feature: &str) -> f64 {
        tier_lookup(
            feature,
            [
                (&self.easy, self.easy_score),
                (&self.medium, self.medium_score),
                (&self.hard, self.hard_score),
            ],
        )
        .unwrap_or(self.default_score)
    }

    pub fn attenuation_for(&self, change_magnitude: f64) -> f64 {
        self.attenuation
            .iter()
            .find(|band| change_magnitude < band.below)
            .map(|band| band.factor)
            .unwrap_or(self.large_change_factor)
    }
}

/// Feature-category implementation-cost tiers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CostTable {
    pub low: Vec<String>,
    pub medium: Vec<String>,
    pub high: Vec<String>,
    pub low_cost: f64,
    pub medium_cost: f64,
    pub high_cost: f64,
    pub default_cost: f64,
    /// cost = min(base × (1 + change × amplification), 1).
    pub change_amplification: f64,
}

impl Default for CostTable {
    fn default() -> Self {
        Self {
            low: strings(&["technical_indicators", "sentiment", "momentum"]),
            medium: strings(&["volume", "volatility", "short_interest"]),
            high: strings(&["fundamental_ratios", "analyst_rating", "insider_buying"]),
            low_cost: 0.2,
            medium_cost: 0.5,
            high_cost: 0.8,
            default_cost: 0.5,
            change_amplification: 2.0,
        }
    }
}

impl CostTable {
    pub fn base_for(&self, feature: &str) -> f64 {
        tier_lookup(
            feature,
            [
                (&self.low, self.low_cost),
                (&self.medium, self.medium_cost),
                (&self.high, self.high_cost),
            ],
        )
        .unwrap_or(self.default_cost)
    }
}

fn tier_lookup(feature: &str, tiers: [(&Vec<String>, f64); 3]) -> Option<f64> {
    tiers
        .into_iter()
        .find(|(names, _)| names.iter().any(|n| n == feature))
        .map(|(_, score)| score)
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ── Compiled type ───────────────────────────────────────────────────

/// Validated explainer config, ready for the hot path.
pub type CompiledExplainerConfig = ExplainerConfigSpec;

impl ExplainerConfigRule {
    /// Validate and compile the YAML config.
    pub fn compile(&self) -> Result<CompiledExplainerConfig> {
        self.spec.validate()?;
        Ok(self.spec.clone())
    }
}

impl ExplainerConfigSpec {
    pub fn validate(&self) -> Result<()> {
        ensure_positive_count("max_key_factors", self.max_key_factors)?;
        ensure_unit_closed("similarity_threshold", self.similarity_threshold)?;
        ensure_finite("decision_threshold", self.decision_threshold)?;
        ensure_non_negative("key_difference_threshold", self.key_difference_threshold)?;
        self.local_method_weights.validate("local_method_weights")?;
        self.calibration.validate()?;

        let cf = &self.counterfactual;
        ensure_unit_open("counterfactual.confidence_cap", cf.confidence_cap)?;
        for (name, t) in [
            ("increase", cf.increase),
            ("maintain", cf.maintain),
            ("optimize", cf.optimize),
        ] {
            ensure_finite(&format!("counterfactual.{}.value_factor", name), t.value_factor)?;
            ensure_non_negative(&format!("counterfactual.{}.impact_factor", name), t.impact_factor)?;
        }

        let f = &cf.feasibility;
        for (name, v) in [
            ("easy_score", f.easy_score),
            ("medium_score", f.medium_score),
            ("hard_score", f.hard_score),
            ("default_score", f.default_score),
            ("large_change_factor", f.large_change_factor),
        ] {
            ensure_unit_open(&format!("counterfactual.feasibility.{}", name), v)?;
        }
        for band in &f.attenuation {
            ensure_non_negative("counterfactual.feasibility.attenuation.below", band.below)?;
            ensure_unit_open("counterfactual.feasibility.attenuation.factor", band.factor)?;
        }

        let c = &cf.cost;
        for (name, v) in [
            ("low_cost", c.low_cost),
            ("medium_cost", c.medium_cost),
            ("high_cost", c.high_cost),
            ("default_cost", c.default_cost),
        ] {
            ensure_unit_open(&format!("counterfactual.cost.{}", name), v)?;
        }
        ensure_non_negative("counterfactual.cost.change_amplification", c.change_amplification)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(ExplainerConfigSpec::default().validate().is_ok());
    }

    #[test]
    fn feasibility_tiers() {
        let table = FeasibilityTable::default();
        assert_eq!(table.base_for("momentum"), 0.8);
        assert_eq!(table.base_for("beta"), 0.6);
        assert_eq!(table.base_for("pe_ratio"), 0.4);
        assert_eq!(table.base_for("unknown_feature"), 0.5);
    }

    #[test]
    fn attenuation_bands() {
        let table = FeasibilityTable::default();
        assert_eq!(table.attenuation_for(0.05), 0.9);
        assert_eq!(table.attenuation_for(0.2), 0.7);
        assert_eq!(table.attenuation_for(0.3), 0.5);
    }

    #[test]
    fn cost_tiers() {
        let table = CostTable::default();
        assert_eq!(table.base_for("sentiment"), 0.2);
        assert_eq!(table.base_for("volume"), 0.5);
        assert_eq!(table.base_for("analyst_rating"), 0.8);
        assert_eq!(table.base_for("rsi"), 0.5);
    }

    #[test]
    fn spec_section_is_optional() {
        let yaml = r#"
apiVersion: v1
kind: ExplainerConfig
metadata:
  id: explainer-minimal
  name: Minimal
"#;
        let rule: ExplainerConfigRule = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rule.compile().unwrap(), ExplainerConfigSpec::default());
    }

    #[test]
    fn zero_feasibility_is_rejected() {
        let yaml = r#"
apiVersion: v1
kind: ExplainerConfig
metadata:
  id: explainer-bad
  name: Bad
spec:
  counterfactual:
    feasibility:
      hard_score: 0.0
"#;
        let rule: ExplainerConfigRule = serde_yaml::from_str(yaml).unwrap();
        assert!(rule.compile().is_err());
    }

    #[test]
    fn override_action_transform() {
        let yaml = r#"
apiVersion: v1
kind: ExplainerConfig
metadata:
  id: explainer-aggressive
  name: Aggressive
spec:
  max_counterfactuals: 2
  counterfactual:
    increase:
      value_factor: 1.5
      impact_factor: 0.8
"#;
        let rule: ExplainerConfigRule = serde_yaml::from_str(yaml).unwrap();
        let spec = rule.compile().unwrap();
        assert_eq!(spec.max_counterfactuals, 2);
        assert_eq!(spec.counterfactual.increase.value_factor, 1.5);
        assert_eq!(spec.counterfactual.maintain.value_factor, 1.05);
    }
}
