pub mod aggregate;
pub mod calibration;
pub mod counterfactual;
pub mod estimators;
pub mod explainer;
pub mod importance;
pub mod providers;
pub mod rationale;
pub mod risk;
pub mod similar;
pub mod stats;

pub use aggregate::{combine, Aggregator, InteractionEstimator, PValueEstimator, ScoreMode};
pub use calibration::Calibrator;
pub use counterfactual::CounterfactualSynthesizer;
pub use estimators::{
    CorrelationImportance, CorrelationInteractions, CorrelationSignificance, MutualInfoImportance,
};
pub use explainer::{DecisionExplainer, ExplainRequest};
pub use importance::FeatureImportanceAnalyzer;
pub use providers::{AttributionProvider, GlobalAttributionProvider, MethodScores, PredictionService};
pub use rationale::RationaleComposer;
pub use risk::{split_risk_opportunity, RiskOpportunity};
pub use similar::{
    CosineSimilarity, FeatureScale, SimilarCaseRetriever, SimilarityMeasure, StandardizedDistance,
};
