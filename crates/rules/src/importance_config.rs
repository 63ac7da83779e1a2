//! ImportanceConfig rule kind with global method weights, display limits,
//! statistical thresholds and the feature-direction domain table used by
//! dataset-level importance analysis.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use factorlens_core::Direction;

use crate::calibration::CalibrationThresholds;
use crate::loader::Result;
use crate::schema::DocumentMeta;
use crate::validation::{
    ensure_finite, ensure_non_negative, ensure_positive_count, ensure_unit_closed,
};
use crate::weights::MethodWeights;

// ── YAML-level types ────────────────────────────────────────────────

/// Top-level ImportanceConfig document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ImportanceConfigRule {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub metadata: DocumentMeta,
    #[serde(default)]
    pub spec: ImportanceConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ImportanceConfigSpec {
    /// Ranked factors kept per list.
    pub max_display_features: usize,
    /// Rows explained individually in `local_importance`.
    pub max_local_instances: usize,
    pub max_temporal_features: usize,
    /// Most recent points kept per temporal series.
    pub temporal_window: usize,
    /// Normal quantile for the method-score confidence interval (1.96 = 95%).
    pub ci_z_score: f64,
    pub stability_threshold: f64,
    pub significance_alpha: f64,
    /// Pairs weaker than this are left out of interaction lists and the network.
    pub interaction_threshold: f64,
    pub max_interactions: usize,
    pub stability_folds: usize,
    pub mutual_info_bins: usize,
    pub group_correlation_threshold: f64,
    pub max_group_size: usize,
    pub regime_z_threshold: f64,
    pub seasonal_lag: usize,
    pub seasonal_threshold: f64,
    pub method_weights: MethodWeights,
    pub calibration: CalibrationThresholds,
    /// Expected sign per known feature; unknown features are neutral.
    pub direction_table: IndexMap<String, Direction>,
}

impl Default for ImportanceConfigSpec {
    fn default() -> Self {
        Self {
            max_display_features: 15,
            max_local_instances: 5,
            max_temporal_features: 5,
            temporal_window: 30,
            ci_z_score: 1.96,
            stability_threshold: 0.8,
            significance_alpha: 0.05,
            interaction_threshold: 0.1,
            max_interactions: 5,
            stability_folds: 5,
            mutual_info_bins: 10,
            group_correlation_threshold: 0.7,
            max_group_size: 3,
            regime_z_threshold: 2.0,
            seasonal_lag: 7,
            seasonal_threshold: 0.5,
            method_weights: MethodWeights::global_defaults(),
            calibration: CalibrationThresholds::default(),
            direction_table: default_direction_table(),
        }
    }
}

fn default_direction_table() -> IndexMap<String, Direction> {
    [
        ("momentum", Direction::Positive),
        ("price_momentum", Direction::Positive),
        ("volatility", Direction::Negative),
        ("volume_trend", Direction::Positive),
        ("rsi", Direction::Positive),
        ("macd", Direction::Positive),
        ("market_cap", Direction::Positive),
        ("pe_ratio", Direction::Negative),
    ]
    .into_iter()
    .map(|(name, dir)| (name.to_string(), dir))
    .collect()
}

impl ImportanceConfigSpec {
    pub fn direction_of(&self, feature: &str) -> Direction {
        self.direction_table.get(feature).copied().unwrap_or_default()
    }

    pub fn validate(&self) -> Result<()> {
        ensure_positive_count("max_display_features", self.max_display_features)?;
        ensure_positive_count("mutual_info_bins", self.mutual_info_bins)?;
        ensure_positive_count("stability_folds", self.stability_folds)?;
        ensure_non_negative("ci_z_score", self.ci_z_score)?;
        ensure_finite("stability_threshold", self.stability_threshold)?;
        ensure_unit_closed("significance_alpha", self.significance_alpha)?;
        ensure_unit_closed("interaction_threshold", self.interaction_threshold)?;
        ensure_unit_closed("group_correlation_threshold", self.group_correlation_threshold)?;
        ensure_non_negative("regime_z_threshold", self.regime_z_threshold)?;
        ensure_unit_closed("seasonal_threshold", self.seasonal_threshold)?;
        ensure_positive_count("seasonal_lag", self.seasonal_lag)?;
        self.method_weights.validate("method_weights")?;
        self.calibration.validate()
    }
}

// ── Compiled type ───────────────────────────────────────────────────

pub type CompiledImportanceConfig = ImportanceConfigSpec;

impl ImportanceConfigRule {
    pub fn compile(&self) -> Result<CompiledImportanceConfig> {
        self.spec.validate()?;
        Ok(self.spec.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factorlens_core::AttributionMethod;

    #[test]
    fn defaults_validate() {
        assert!(ImportanceConfigSpec::default().validate().is_ok());
    }

    #[test]
    fn direction_lookup_defaults_to_neutral() {
        let spec = ImportanceConfigSpec::default();
        assert_eq!(spec.direction_of("momentum"), Direction::Positive);
        assert_eq!(spec.direction_of("volatility"), Direction::Negative);
        assert_eq!(spec.direction_of("dividend_yield"), Direction::Neutral);
    }

    #[test]
    fn direction_table_override_replaces_defaults() {
        let yaml = r#"
apiVersion: v1
kind: ImportanceConfig
metadata:
  id: importance-credit
  name: Credit scoring
spec:
  max_display_features: 8
  direction_table:
    income: positive
    debt_ratio: negative
  method_weights:
    shap: 0.6
    permutation: 0.4
"#;
        let rule: ImportanceConfigRule = serde_yaml::from_str(yaml).unwrap();
        let spec = rule.compile().unwrap();
        assert_eq!(spec.max_display_features, 8);
        assert_eq!(spec.direction_of("income"), Direction::Positive);
        assert_eq!(spec.direction_of("momentum"), Direction::Neutral);
        assert_eq!(spec.method_weights.weight(AttributionMethod::Correlation), None);
    }

    #[test]
    fn alpha_out_of_range_rejected() {
        let mut spec = ImportanceConfigSpec::default();
        spec.significance_alpha = 1.5;
        assert!(spec.validate().is_err());
    }
}
