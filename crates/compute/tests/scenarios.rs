//! End-to-end behaviour of the explanation and aggregation pipeline.

use indexmap::IndexMap;

use factorlens_compute::{
    Aggregator, AttributionProvider, Calibrator, CounterfactualSynthesizer, DecisionExplainer,
    ExplainRequest, MethodScores,
};
use factorlens_core::{
    AttributionMethod, CollaboratorError, ConfidenceInterval, CounterfactualAction, ExplainError,
    HistoricalRecord, ImpactLabel, Instance, KeyFactor, Prediction,
};
use factorlens_rules::explainer_config::CounterfactualPolicy;
use factorlens_rules::{ExplainerConfigSpec, MethodWeights};

struct Replay {
    method: AttributionMethod,
    values: IndexMap<String, f64>,
}

impl Replay {
    fn new(method: AttributionMethod, values: &[(&str, f64)]) -> Self {
        Self {
            method,
            values: values.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }
}

impl AttributionProvider for Replay {
    fn method(&self) -> AttributionMethod {
        self.method
    }

    fn attribute(&self, _: &Instance, _: &[String]) -> Result<IndexMap<String, f64>, CollaboratorError> {
        Ok(self.values.clone())
    }
}

fn fixed_model(value: f64, confidence: f64) -> impl Fn(&Instance) -> Result<Prediction, CollaboratorError> {
    move |_: &Instance| Ok(Prediction { value, confidence })
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn instance(values: &[(&str, f64)]) -> Instance {
    values.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn method_scores(entries: &[(AttributionMethod, &[(&str, f64)])]) -> MethodScores {
    entries
        .iter()
        .map(|(m, values)| (*m, values.iter().map(|(k, v)| (k.to_string(), *v)).collect()))
        .collect()
}

#[test]
fn momentum_outranks_pe_ratio_with_default_weights() {
    let weights = MethodWeights::global_defaults();
    let calibrator = Calibrator::default();
    let scores = method_scores(&[
        (AttributionMethod::Shap, &[("momentum", 0.2), ("pe_ratio", -0.15)]),
        (AttributionMethod::Permutation, &[("momentum", 0.1)]),
    ]);

    let ranked = Aggregator::new(&weights, &calibrator).rank(&names(&["momentum", "pe_ratio"]), &scores);

    assert_eq!(ranked[0].feature_name, "momentum");
    assert_eq!(ranked[1].feature_name, "pe_ratio");
    assert!(ranked[0].importance_score > ranked[1].importance_score);
    assert_eq!(ranked[0].normalized_score, 1.0);
}

#[test]
fn empty_history_yields_no_similar_cases() {
    let explainer = DecisionExplainer::new(ExplainerConfigSpec::default());
    let shap = Replay::new(AttributionMethod::Shap, &[("rsi", 0.2)]);
    let inst = instance(&[("rsi", 55.0)]);
    let features = names(&["rsi"]);
    let history: Vec<HistoricalRecord> = Vec::new();

    let request = ExplainRequest::new(&inst, &features).with_history(&history);
    let explanation = explainer
        .explain_decision(&fixed_model(0.7, 0.9), &[&shap], &request)
        .unwrap();
    assert!(explanation.similar_cases.is_empty());
}

#[test]
fn strong_negative_top_factor_suggests_a_twenty_percent_increase() {
    let explainer = DecisionExplainer::new(ExplainerConfigSpec::default());
    let shap = Replay::new(AttributionMethod::Shap, &[("volatility", -0.5), ("rsi", 0.05)]);
    let inst = instance(&[("volatility", 25.0), ("rsi", 60.0)]);
    let features = names(&["volatility", "rsi"]);

    let explanation = explainer
        .explain_decision(&fixed_model(1.0, 0.75), &[&shap], &ExplainRequest::new(&inst, &features))
        .unwrap();

    assert_eq!(explanation.key_factors[0].impact, ImpactLabel::StrongNegative);
    let cf = &explanation.counterfactuals[0];
    assert_eq!(cf.action, CounterfactualAction::Increase);
    let change = cf.feature_changes["volatility"];
    assert_eq!(change.current_value, 25.0);
    assert!((change.suggested_value - 25.0 * 1.20).abs() < 1e-9);
}

#[test]
fn no_factors_leaves_only_the_prediction_sentence() {
    let explainer = DecisionExplainer::new(ExplainerConfigSpec::default());
    let inst = instance(&[("rsi", 60.0)]);
    let features = names(&["rsi"]);

    let explanation = explainer
        .explain_decision(&fixed_model(0.3125, 0.5), &[], &ExplainRequest::new(&inst, &features))
        .unwrap();

    assert!(explanation.key_factors.is_empty());
    assert!(explanation.counterfactuals.is_empty());
    assert!(explanation.risk_factors.is_empty());
    assert!(explanation.opportunity_factors.is_empty());
    assert_eq!(explanation.rationale, "The model predicts 0.3125.");
}

#[test]
fn prediction_failure_is_not_swallowed() {
    let explainer = DecisionExplainer::new(ExplainerConfigSpec::default());
    let inst = instance(&[("rsi", 60.0)]);
    let features = names(&["rsi"]);
    let broken = |_: &Instance| -> Result<Prediction, CollaboratorError> {
        Err(CollaboratorError::Prediction("model unavailable".into()))
    };

    let err = explainer
        .explain_decision(&broken, &[], &ExplainRequest::new(&inst, &features))
        .unwrap_err();
    match err {
        ExplainError::Collaborator(CollaboratorError::Prediction(msg)) => {
            assert_eq!(msg, "model unavailable")
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn normalized_scores_stay_in_unit_range_and_ranking_is_sorted() {
    let weights = MethodWeights::global_defaults();
    let calibrator = Calibrator::default();
    let features: Vec<String> = (0..12).map(|i| format!("f{i}")).collect();

    for seed in 0..6 {
        let shap: Vec<(String, f64)> = features
            .iter()
            .enumerate()
            .map(|(i, f)| (f.clone(), (((i * 7 + seed * 3) % 11) as f64 - 5.0) / 10.0))
            .collect();
        let perm: Vec<(String, f64)> = features
            .iter()
            .enumerate()
            .filter(|(i, _)| i % 3 != seed % 3)
            .map(|(i, f)| (f.clone(), ((i + seed) % 5) as f64 / 5.0))
            .collect();
        let mut scores = MethodScores::new();
        scores.insert(AttributionMethod::Shap, shap.into_iter().collect());
        scores.insert(AttributionMethod::Permutation, perm.into_iter().collect());

        let ranked = Aggregator::new(&weights, &calibrator).rank(&features, &scores);

        assert!(ranked.iter().all(|f| (0.0..=1.0).contains(&f.normalized_score)));
        assert!(ranked
            .windows(2)
            .all(|w| w[0].importance_score >= w[1].importance_score));
        if ranked[0].importance_score > 0.0 {
            assert_eq!(ranked[0].normalized_score, 1.0);
        }
        for factor in &ranked {
            let ci = factor.confidence_interval;
            assert!(ci.low <= ci.high);
            assert!((0.0..=1.0).contains(&factor.p_value));
        }
    }
}

#[test]
fn single_method_features_get_a_zero_interval() {
    let weights = MethodWeights::global_defaults();
    let calibrator = Calibrator::default();
    let scores = method_scores(&[
        (AttributionMethod::Shap, &[("a", 0.3), ("b", 0.1)]),
        (AttributionMethod::Correlation, &[("a", 0.2)]),
    ]);
    let ranked = Aggregator::new(&weights, &calibrator).rank(&names(&["a", "b"]), &scores);
    let b = ranked.iter().find(|f| f.feature_name == "b").unwrap();
    assert_eq!(b.confidence_interval, ConfidenceInterval::ZERO);
    let a = ranked.iter().find(|f| f.feature_name == "a").unwrap();
    assert!(a.confidence_interval.low < a.confidence_interval.high);
}

#[test]
fn counterfactual_scores_stay_bounded() {
    let policy = CounterfactualPolicy::default();
    let synth = CounterfactualSynthesizer::new(&policy, 3, 5);
    let impacts = [
        ImpactLabel::StrongPositive,
        ImpactLabel::Positive,
        ImpactLabel::Neutral,
        ImpactLabel::Negative,
        ImpactLabel::StrongNegative,
    ];
    let features = ["momentum", "pe_ratio", "volatility", "sentiment", "other"];

    for (k, contribution) in [0.0, 0.05, 0.4, 0.9, 3.5, -12.0].into_iter().enumerate() {
        for baseline in [0.0, 0.001, 1.0, -40.0, 1e6] {
            let factors: Vec<KeyFactor> = impacts
                .iter()
                .zip(features.iter().cycle().skip(k))
                .map(|(impact, name)| KeyFactor {
                    feature_name: name.to_string(),
                    contribution,
                    impact: *impact,
                })
                .collect();
            for cf in synth.synthesize(&factors, |_| Some(baseline)) {
                assert!(cf.confidence <= 0.8);
                assert!(cf.feasibility > 0.0 && cf.feasibility <= 1.0);
                assert!(cf.implementation_cost > 0.0 && cf.implementation_cost <= 1.0);
                assert!(cf.expected_impact >= 0.0);
                assert_eq!(cf.feature_changes.len(), 1);
            }
        }
    }
}

#[test]
fn zero_prediction_labels_raw_contributions() {
    let explainer = DecisionExplainer::new(ExplainerConfigSpec::default());
    let shap = Replay::new(AttributionMethod::Shap, &[("a", 0.35), ("b", -0.15), ("c", 0.05)]);
    let inst = instance(&[("a", 1.0), ("b", 1.0), ("c", 1.0)]);
    let features = names(&["a", "b", "c"]);

    let explanation = explainer
        .explain_decision(&fixed_model(0.0, 0.5), &[&shap], &ExplainRequest::new(&inst, &features))
        .unwrap();

    let labels: Vec<ImpactLabel> = explanation.key_factors.iter().map(|f| f.impact).collect();
    assert_eq!(
        labels,
        vec![ImpactLabel::StrongPositive, ImpactLabel::Negative, ImpactLabel::Neutral]
    );
    assert_eq!(explanation.decision_boundary, 0.0);
}

#[test]
fn repeated_explanations_are_identical() {
    let explainer = DecisionExplainer::new(ExplainerConfigSpec::default());
    let shap = Replay::new(AttributionMethod::Shap, &[("rsi", -0.2), ("momentum", 0.3)]);
    let lime = Replay::new(AttributionMethod::Lime, &[("rsi", -0.1), ("beta", 0.2)]);
    let inst = instance(&[("rsi", 30.0), ("momentum", 1.5), ("beta", 0.9)]);
    let features = names(&["rsi", "momentum", "beta"]);
    let history = vec![
        HistoricalRecord {
            case_id: None,
            features: instance(&[("rsi", 35.0), ("momentum", 1.0), ("beta", 1.1)]),
            outcome: Some(0.2),
        },
        HistoricalRecord {
            case_id: None,
            features: instance(&[("rsi", 70.0), ("momentum", -1.0), ("beta", 0.5)]),
            outcome: None,
        },
    ];
    let request = ExplainRequest::new(&inst, &features).with_history(&history);
    let model = fixed_model(0.4, 0.66);

    let first = explainer.explain_decision(&model, &[&shap, &lime], &request).unwrap();
    let second = explainer.explain_decision(&model, &[&shap, &lime], &request).unwrap();
    assert_eq!(first, second);

    // serde_json writes non-finite floats as null
    let json = serde_json::to_string(&first).unwrap();
    assert!(!json.contains("null"));
}
