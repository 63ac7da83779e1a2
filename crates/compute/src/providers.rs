//! Collaborator seams: the model and the attribution methods this engine
//! consumes but does not implement.
//!
//! Every number that crosses one of these traits is checked for finiteness
//! before it reaches the aggregation code.

use indexmap::IndexMap;
use tracing::error;

use factorlens_core::{AttributionMethod, CollaboratorError, Dataset, Instance, Prediction};

/// Raw contributions per method, per feature. Methods may be partial.
pub type MethodScores = IndexMap<AttributionMethod, IndexMap<String, f64>>;

pub trait PredictionService: Send + Sync {
    fn predict(&self, instance: &Instance) -> Result<Prediction, CollaboratorError>;
}

impl<F> PredictionService for F
where
    F: Fn(&Instance) -> Result<Prediction, CollaboratorError> + Send + Sync,
{
    fn predict(&self, instance: &Instance) -> Result<Prediction, CollaboratorError> {
        self(instance)
    }
}

/// Local attribution for a single instance.
pub trait AttributionProvider: Send + Sync {
    fn method(&self) -> AttributionMethod;

    fn attribute(
        &self,
        instance: &Instance,
        feature_names: &[String],
    ) -> Result<IndexMap<String, f64>, CollaboratorError>;
}

/// Dataset-level attribution.
pub trait GlobalAttributionProvider: Send + Sync {
    fn method(&self) -> AttributionMethod;

    fn global_importance(&self, dataset: &Dataset) -> Result<IndexMap<String, f64>, CollaboratorError>;
}

/// Call the prediction service and validate what it returns.
pub fn checked_prediction(
    model: &dyn PredictionService,
    instance: &Instance,
) -> Result<Prediction, CollaboratorError> {
    let prediction = model.predict(instance).map_err(|e| {
        error!(error = %e, "Prediction service failed");
        e
    })?;
    let value = CollaboratorError::check_finite(prediction.value, "prediction service", "value")
        .map_err(log_failure)?;
    let confidence =
        CollaboratorError::check_finite(prediction.confidence, "prediction service", "confidence")
            .map_err(log_failure)?;
    Ok(Prediction {
        value,
        confidence: confidence.clamp(0.0, 1.0),
    })
}

/// Run every local provider once. A later provider with the same method
/// replaces an earlier one.
pub fn collect_local(
    providers: &[&dyn AttributionProvider],
    instance: &Instance,
    feature_names: &[String],
) -> Result<MethodScores, CollaboratorError> {
    let mut scores = MethodScores::new();
    for provider in providers {
        let method = provider.method();
        let map = provider.attribute(instance, feature_names).map_err(|e| {
            error!(method = %method, error = %e, "Attribution provider failed");
            e
        })?;
        scores.insert(method, checked_map(method, map)?);
    }
    Ok(scores)
}

pub fn collect_global(
    providers: &[&dyn GlobalAttributionProvider],
    dataset: &Dataset,
) -> Result<MethodScores, CollaboratorError> {
    let mut scores = MethodScores::new();
    for provider in providers {
        let method = provider.method();
        let map = provider.global_importance(dataset).map_err(|e| {
            error!(method = %method, error = %e, "Global attribution provider failed");
            e
        })?;
        scores.insert(method, checked_map(method, map)?);
    }
    Ok(scores)
}

fn checked_map(
    method: AttributionMethod,
    map: IndexMap<String, f64>,
) -> Result<IndexMap<String, f64>, CollaboratorError> {
    let origin = format!("attribution provider '{}'", method);
    for (feature, value) in &map {
        CollaboratorError::check_finite(*value, &origin, feature).map_err(log_failure)?;
    }
    Ok(map)
}

pub(crate) fn log_failure(e: CollaboratorError) -> CollaboratorError {
    error!(error = %e, "Collaborator returned an unusable value");
    e
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(AttributionMethod, Vec<(&'static str, f64)>);

    impl AttributionProvider for Fixed {
        fn method(&self) -> AttributionMethod {
            self.0
        }

        fn attribute(&self, _: &Instance, _: &[String]) -> Result<IndexMap<String, f64>, CollaboratorError> {
            Ok(self.1.iter().map(|(k, v)| (k.to_string(), *v)).collect())
        }
    }

    #[test]
    fn closures_are_prediction_services() {
        let model = |_: &Instance| -> Result<Prediction, CollaboratorError> {
            Ok(Prediction { value: 0.4, confidence: 1.3 })
        };
        let p = checked_prediction(&model, &Instance::new()).unwrap();
        assert_eq!(p.value, 0.4);
        assert_eq!(p.confidence, 1.0);
    }

    #[test]
    fn nan_prediction_is_rejected() {
        let model = |_: &Instance| -> Result<Prediction, CollaboratorError> {
            Ok(Prediction { value: f64::NAN, confidence: 0.5 })
        };
        let err = checked_prediction(&model, &Instance::new()).unwrap_err();
        assert!(matches!(err, CollaboratorError::NonFinite { .. }));
    }

    #[test]
    fn prediction_failure_is_propagated_unchanged() {
        let model = |_: &Instance| -> Result<Prediction, CollaboratorError> {
            Err(CollaboratorError::Prediction("offline".into()))
        };
        let err = checked_prediction(&model, &Instance::new()).unwrap_err();
        assert_eq!(err, CollaboratorError::Prediction("offline".into()));
    }

    #[test]
    fn local_scores_keyed_by_method() {
        let shap = Fixed(AttributionMethod::Shap, vec![("a", 0.1)]);
        let lime = Fixed(AttributionMethod::Lime, vec![("a", 0.3), ("b", -0.2)]);
        let scores = collect_local(&[&shap, &lime], &Instance::new(), &[]).unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[&AttributionMethod::Lime]["b"], -0.2);
    }

    #[test]
    fn infinite_attribution_fails_the_call() {
        let bad = Fixed(AttributionMethod::Shap, vec![("a", f64::INFINITY)]);
        let err = collect_local(&[&bad], &Instance::new(), &[]).unwrap_err();
        match err {
            CollaboratorError::NonFinite { field, .. } => assert_eq!(field, "a"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
