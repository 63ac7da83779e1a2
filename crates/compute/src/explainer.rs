//! Decision explanation: one prediction in, one [`Explanation`] out.

use tracing::{debug, info};

use factorlens_core::{
    ExplainError, Explanation, ExplanationKind, HistoricalRecord, Instance, KeyFactor, Result,
};
use factorlens_rules::CompiledExplainerConfig;

use crate::aggregate::combine_all;
use crate::calibration::Calibrator;
use crate::counterfactual::CounterfactualSynthesizer;
use crate::providers::{checked_prediction, collect_local, AttributionProvider, PredictionService};
use crate::rationale::RationaleComposer;
use crate::risk::split_risk_opportunity;
use crate::similar::{SimilarCaseRetriever, SimilarityMeasure, StandardizedDistance};
use crate::stats;

/// What to explain.
#[derive(Debug, Clone, Copy)]
pub struct ExplainRequest<'a> {
    pub instance: &'a Instance,
    pub feature_names: &'a [String],
    pub historical: Option<&'a [HistoricalRecord]>,
    pub kind: ExplanationKind,
}

impl<'a> ExplainRequest<'a> {
    pub fn new(instance: &'a Instance, feature_names: &'a [String]) -> Self {
        Self {
            instance,
            feature_names,
            historical: None,
            kind: ExplanationKind::default(),
        }
    }

    pub fn with_history(mut self, records: &'a [HistoricalRecord]) -> Self {
        self.historical = Some(records);
        self
    }

    pub fn with_kind(mut self, kind: ExplanationKind) -> Self {
        self.kind = kind;
        self
    }
}

pub struct DecisionExplainer {
    config: CompiledExplainerConfig,
    calibrator: Calibrator,
    similarity: Box<dyn SimilarityMeasure>,
}

impl DecisionExplainer {
    pub fn new(config: CompiledExplainerConfig) -> Self {
        let calibrator = Calibrator::new(config.calibration.clone());
        Self {
            config,
            calibrator,
            similarity: Box::new(StandardizedDistance),
        }
    }

    /// Like [`new`](Self::new) for configs built in code rather than
    /// loaded from a document.
    pub fn try_new(config: CompiledExplainerConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| ExplainError::Config(e.to_string()))?;
        Ok(Self::new(config))
    }

    pub fn with_similarity(mut self, measure: Box<dyn SimilarityMeasure>) -> Self {
        self.similarity = measure;
        self
    }

    pub fn config(&self) -> &CompiledExplainerConfig {
        &self.config
    }

    /// Predict, attribute, and assemble the full explanation. Any
    /// collaborator failure aborts the request.
    pub fn explain_decision(
        &self,
        model: &dyn PredictionService,
        providers: &[&dyn AttributionProvider],
        request: &ExplainRequest<'_>,
    ) -> Result<Explanation> {
        info!(
            features = request.feature_names.len(),
            providers = providers.len(),
            kind = ?request.kind,
            "Explaining decision"
        );
        validate_instance(request.instance)?;

        let prediction = checked_prediction(model, request.instance)?;
        let key_factors = self.key_factors(providers, request, prediction.value)?;

        let history = request.historical.unwrap_or(&[]);
        let counterfactuals = CounterfactualSynthesizer::new(
            &self.config.counterfactual,
            self.config.counterfactual_candidates,
            self.config.max_counterfactuals,
        )
        .synthesize(&key_factors, |feature| {
            request
                .instance
                .get(feature)
                .copied()
                .or_else(|| historical_mean(history, feature))
        });

        let similar_cases = SimilarCaseRetriever::new(self.similarity.as_ref())
            .with_limits(self.config.max_similar_cases, self.config.similarity_threshold)
            .with_key_differences(
                self.config.key_difference_threshold,
                self.config.max_key_differences,
            )
            .retrieve(request.instance, prediction.value, history, |record| {
                checked_prediction(model, &record.features).map(|p| p.value)
            })?;

        let split = split_risk_opportunity(&key_factors, self.config.max_risk_factors);
        let rationale = RationaleComposer::new(self.config.rationale_factor_count).compose(
            prediction.value,
            &key_factors,
            &counterfactuals,
            &similar_cases,
        );

        info!(
            prediction = prediction.value,
            key_factors = key_factors.len(),
            counterfactuals = counterfactuals.len(),
            similar_cases = similar_cases.len(),
            "Explanation complete"
        );

        Ok(Explanation {
            prediction: prediction.value,
            confidence: prediction.confidence,
            confidence_level: self.calibrator.confidence_level(prediction.confidence),
            key_factors,
            counterfactuals,
            similar_cases,
            decision_boundary: (prediction.value - self.config.decision_threshold).abs(),
            risk_factors: split.risks,
            opportunity_factors: split.opportunities,
            explanation_type: request.kind,
            rationale,
        })
    }

    /// Local contributions combined across providers, largest |contribution| first.
    fn key_factors(
        &self,
        providers: &[&dyn AttributionProvider],
        request: &ExplainRequest<'_>,
        prediction: f64,
    ) -> Result<Vec<KeyFactor>> {
        let scores = collect_local(providers, request.instance, request.feature_names)?;
        if scores.is_empty() || request.feature_names.is_empty() {
            debug!("No attribution signals, skipping key factors");
            return Ok(Vec::new());
        }

        let mut factors: Vec<KeyFactor> =
            combine_all(&self.config.local_method_weights, &scores, request.feature_names)
                .into_iter()
                .map(|(feature_name, contribution)| KeyFactor {
                    impact: self.calibrator.impact_label(contribution, prediction),
                    feature_name,
                    contribution,
                })
                .collect();
        factors.sort_by(|a, b| {
            b.contribution
                .abs()
                .partial_cmp(&a.contribution.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        factors.truncate(self.config.max_key_factors);

        debug!(methods = scores.len(), key_factors = factors.len(), "Combined local attributions");
        Ok(factors)
    }
}

fn validate_instance(instance: &Instance) -> Result<()> {
    match instance.iter().find(|(_, v)| !v.is_finite()) {
        Some((name, _)) => Err(ExplainError::InvalidInput(format!(
            "instance value for '{}' is not finite",
            name
        ))),
        None => Ok(()),
    }
}

/// Mean of `feature` over the records that carry a finite value for it.
fn historical_mean(records: &[HistoricalRecord], feature: &str) -> Option<f64> {
    let values: Vec<f64> = records
        .iter()
        .filter_map(|r| r.features.get(feature).copied())
        .filter(|v| v.is_finite())
        .collect();
    (!values.is_empty()).then(|| stats::mean(&values))
}
