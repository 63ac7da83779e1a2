//! Dataset-level importance analysis.

pub mod groups;
pub mod stability;
pub mod temporal;

use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{debug, info};

use factorlens_core::{
    CollaboratorError, Dataset, ExplainError, FeatureSignificance, ImportanceReport, InteractionEdge,
    InteractionNetwork, RankedFactor, Result, TemporalData, TemporalSeries,
};
use factorlens_rules::CompiledImportanceConfig;

use crate::aggregate::{Aggregator, InteractionEstimator, PValueEstimator, ScoreMode};
use crate::calibration::Calibrator;
use crate::estimators::{CorrelationInteractions, CorrelationSignificance};
use crate::providers::{collect_global, collect_local, AttributionProvider, GlobalAttributionProvider};

pub use groups::group_correlated;
pub use stability::fold_stability;
pub use temporal::analyze_series;

pub struct FeatureImportanceAnalyzer {
    config: CompiledImportanceConfig,
    calibrator: Calibrator,
}

impl FeatureImportanceAnalyzer {
    pub fn new(config: CompiledImportanceConfig) -> Self {
        let calibrator = Calibrator::new(config.calibration.clone());
        Self { config, calibrator }
    }

    /// Like [`new`](Self::new) for configs built in code rather than
    /// loaded from a document.
    pub fn try_new(config: CompiledImportanceConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| ExplainError::Config(e.to_string()))?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &CompiledImportanceConfig {
        &self.config
    }

    /// Global, local, temporal, interaction, stability, significance and
    /// grouping views of the same dataset.
    pub fn comprehensive_importance_analysis(
        &self,
        dataset: &Dataset,
        global_providers: &[&dyn GlobalAttributionProvider],
        local_providers: &[&dyn AttributionProvider],
        temporal: Option<&TemporalData>,
    ) -> Result<ImportanceReport> {
        info!(
            features = dataset.feature_names.len(),
            rows = dataset.len(),
            global_providers = global_providers.len(),
            local_providers = local_providers.len(),
            "Starting importance analysis"
        );
        dataset.validate()?;
        if dataset.feature_names.is_empty() {
            return Ok(ImportanceReport::default());
        }

        let interactions = CorrelationInteractions::from_dataset(dataset);
        let significance = CorrelationSignificance::from_dataset(dataset);

        let report = ImportanceReport {
            global_importance: self.global_importance(dataset, global_providers, &interactions, &significance)?,
            local_importance: self.local_importance(dataset, local_providers)?,
            temporal_importance: self.temporal_importance(&dataset.feature_names, temporal)?,
            interaction_network: self.interaction_network(&dataset.feature_names, &interactions),
            stability_analysis: fold_stability(
                dataset,
                self.config.stability_folds,
                self.config.stability_threshold,
            ),
            statistical_significance: self.significance(&dataset.feature_names, &significance),
            feature_groups: group_correlated(
                dataset,
                self.config.group_correlation_threshold,
                self.config.max_group_size,
            ),
        };

        info!(
            ranked = report.global_importance.len(),
            instances = report.local_importance.len(),
            temporal = report.temporal_importance.len(),
            interactions = report.interaction_network.len(),
            groups = report.feature_groups.len(),
            "Importance analysis complete"
        );
        Ok(report)
    }

    fn aggregator(&self) -> Aggregator<'_> {
        Aggregator::new(&self.config.method_weights, &self.calibrator)
            .with_limits(self.config.max_display_features, self.config.max_interactions)
            .with_ci_z_score(self.config.ci_z_score)
    }

    fn global_importance(
        &self,
        dataset: &Dataset,
        providers: &[&dyn GlobalAttributionProvider],
        interactions: &dyn InteractionEstimator,
        significance: &dyn PValueEstimator,
    ) -> Result<Vec<RankedFactor>> {
        let scores = collect_global(providers, dataset)?;
        Ok(self
            .aggregator()
            .with_directions(&self.config.direction_table)
            .with_interactions(interactions)
            .with_p_values(significance)
            .rank(&dataset.feature_names, &scores))
    }

    /// Per-instance rankings for the leading rows, computed in parallel.
    fn local_importance(
        &self,
        dataset: &Dataset,
        providers: &[&dyn AttributionProvider],
    ) -> Result<IndexMap<String, Vec<RankedFactor>>> {
        if providers.is_empty() {
            return Ok(IndexMap::new());
        }
        let count = self.config.max_local_instances.min(dataset.len());
        let ranked: Vec<(String, Vec<RankedFactor>)> = (0..count)
            .into_par_iter()
            .filter_map(|i| dataset.instance(i).map(|instance| (i, instance)))
            .map(|(i, instance)| {
                collect_local(providers, &instance, &dataset.feature_names).map(|scores| {
                    let factors = self
                        .aggregator()
                        .with_mode(ScoreMode::Magnitude)
                        .rank(&dataset.feature_names, &scores);
                    (format!("instance_{}", i), factors)
                })
            })
            .collect::<std::result::Result<_, CollaboratorError>>()?;

        debug!(instances = ranked.len(), "Computed local importance");
        Ok(ranked.into_iter().collect())
    }

    fn temporal_importance(
        &self,
        feature_names: &[String],
        temporal: Option<&TemporalData>,
    ) -> Result<IndexMap<String, TemporalSeries>> {
        let Some(temporal) = temporal else {
            return Ok(IndexMap::new());
        };

        let mut out = IndexMap::new();
        for name in feature_names {
            if out.len() >= self.config.max_temporal_features {
                break;
            }
            let Some(points) = temporal.get(name).filter(|p| !p.is_empty()) else {
                continue;
            };
            if points.iter().any(|p| !p.value.is_finite()) {
                return Err(ExplainError::InvalidInput(format!(
                    "temporal series for '{}' contains a non-finite value",
                    name
                )));
            }
            out.insert(name.clone(), analyze_series(name, points, &self.config));
        }
        debug!(series = out.len(), "Computed temporal importance");
        Ok(out)
    }

    /// Every unordered pair at or above the interaction threshold, in (i, j) order.
    fn interaction_network(
        &self,
        feature_names: &[String],
        estimator: &CorrelationInteractions,
    ) -> InteractionNetwork {
        let n = feature_names.len();
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect();

        let edges = pairs
            .par_iter()
            .filter_map(|&(i, j)| {
                let a = &feature_names[i];
                let b = &feature_names[j];
                let strength = estimator.strength(a, b)?;
                (strength >= self.config.interaction_threshold).then(|| InteractionEdge {
                    feature_a: a.clone(),
                    feature_b: b.clone(),
                    strength,
                })
            })
            .collect();
        InteractionNetwork { edges }
    }

    fn significance(
        &self,
        feature_names: &[String],
        estimator: &dyn PValueEstimator,
    ) -> IndexMap<String, FeatureSignificance> {
        feature_names
            .iter()
            .map(|name| {
                let p_value = estimator.p_value(name).unwrap_or(1.0).clamp(0.0, 1.0);
                (
                    name.clone(),
                    FeatureSignificance {
                        p_value,
                        confidence: 1.0 - p_value,
                        significant: p_value < self.config.significance_alpha,
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use factorlens_core::{AttributionMethod, Direction, Instance, TemporalPoint};
    use factorlens_rules::ImportanceConfigSpec;

    use super::*;
    use crate::estimators::{CorrelationImportance, MutualInfoImportance};

    /// Instance-scaled attribution: contribution = value × coefficient.
    struct Linear(Vec<(&'static str, f64)>);

    impl AttributionProvider for Linear {
        fn method(&self) -> AttributionMethod {
            AttributionMethod::Shap
        }

        fn attribute(
            &self,
            instance: &Instance,
            _: &[String],
        ) -> std::result::Result<IndexMap<String, f64>, CollaboratorError> {
            Ok(self
                .0
                .iter()
                .filter_map(|(name, coef)| instance.get(*name).map(|v| (name.to_string(), v * coef)))
                .collect())
        }
    }

    fn dataset() -> Dataset {
        let mut rows = Vec::new();
        let mut targets = Vec::new();
        for i in 0..30 {
            let momentum = i as f64;
            let volatility = ((i * 7) % 11) as f64;
            let echo = momentum * 0.5 + 1.0;
            rows.push(vec![momentum, volatility, echo]);
            targets.push(2.0 * momentum + 0.1 * volatility);
        }
        Dataset::new(
            vec!["momentum".into(), "volatility".into(), "echo".into()],
            rows,
            targets,
        )
    }

    #[test]
    fn full_report_shape() {
        let analyzer = FeatureImportanceAnalyzer::new(ImportanceConfigSpec::default());
        let ds = dataset();
        let linear = Linear(vec![("momentum", 0.1), ("volatility", -0.2)]);
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let mut temporal = TemporalData::new();
        temporal.insert(
            "momentum".into(),
            (0..10)
                .map(|d| TemporalPoint {
                    timestamp: start + Duration::days(d),
                    value: 0.1 * d as f64,
                })
                .collect(),
        );

        let report = analyzer
            .comprehensive_importance_analysis(
                &ds,
                &[&CorrelationImportance, &MutualInfoImportance::default()],
                &[&linear],
                Some(&temporal),
            )
            .unwrap();

        assert_eq!(report.global_importance.len(), 3);
        assert_eq!(report.global_importance[0].normalized_score, 1.0);
        let momentum = report
            .global_importance
            .iter()
            .find(|f| f.feature_name == "momentum")
            .unwrap();
        assert_eq!(momentum.direction, Direction::Positive);

        assert_eq!(report.local_importance.len(), 5);
        let first: Vec<&String> = report.local_importance.keys().collect();
        assert_eq!(first[0], "instance_0");
        let row3 = &report.local_importance["instance_3"];
        assert_eq!(row3[0].feature_name, "volatility");
        assert_eq!(row3[0].direction, Direction::Negative);

        assert_eq!(report.temporal_importance.len(), 1);
        assert!(report.statistical_significance["momentum"].significant);
        assert_eq!(report.feature_groups["group_0"], vec!["momentum", "echo"]);
        assert!(report.stability_analysis["momentum"].is_stable);
    }

    #[test]
    fn try_new_rejects_invalid_config() {
        let bad = ImportanceConfigSpec {
            ci_z_score: f64::NAN,
            ..ImportanceConfigSpec::default()
        };
        assert!(matches!(
            FeatureImportanceAnalyzer::try_new(bad),
            Err(ExplainError::Config(_))
        ));
        assert!(FeatureImportanceAnalyzer::try_new(ImportanceConfigSpec::default()).is_ok());
    }

    #[test]
    fn invalid_dataset_is_rejected() {
        let analyzer = FeatureImportanceAnalyzer::new(ImportanceConfigSpec::default());
        let ds = Dataset::new(vec!["a".into()], vec![vec![1.0, 2.0]], vec![1.0]);
        let err = analyzer
            .comprehensive_importance_analysis(&ds, &[&CorrelationImportance], &[], None)
            .unwrap_err();
        assert!(matches!(err, ExplainError::InvalidInput(_)));
    }

    #[test]
    fn no_features_gives_empty_report() {
        let analyzer = FeatureImportanceAnalyzer::new(ImportanceConfigSpec::default());
        let ds = Dataset::new(Vec::new(), vec![vec![], vec![]], vec![1.0, 2.0]);
        let report = analyzer
            .comprehensive_importance_analysis(&ds, &[&CorrelationImportance], &[], None)
            .unwrap();
        assert_eq!(report, ImportanceReport::default());
    }

    #[test]
    fn interaction_edges_respect_threshold_and_order() {
        let analyzer = FeatureImportanceAnalyzer::new(ImportanceConfigSpec {
            interaction_threshold: 0.0,
            ..ImportanceConfigSpec::default()
        });
        let ds = dataset();
        let report = analyzer
            .comprehensive_importance_analysis(&ds, &[], &[], None)
            .unwrap();
        let pairs: Vec<(&str, &str)> = report
            .interaction_network
            .edges
            .iter()
            .map(|e| (e.feature_a.as_str(), e.feature_b.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("momentum", "volatility"), ("momentum", "echo"), ("volatility", "echo")]
        );
        assert!(report.global_importance.is_empty());
    }

    #[test]
    fn analysis_is_repeatable() {
        let analyzer = FeatureImportanceAnalyzer::new(ImportanceConfigSpec::default());
        let ds = dataset();
        let linear = Linear(vec![("momentum", 0.1)]);
        let run = || {
            analyzer
                .comprehensive_importance_analysis(&ds, &[&CorrelationImportance], &[&linear], None)
                .unwrap()
        };
        assert_eq!(run(), run());
    }
}
