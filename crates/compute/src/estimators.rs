//! Built-in deterministic estimators computed from a dataset.

use indexmap::IndexMap;

use factorlens_core::{AttributionMethod, CollaboratorError, Dataset};

use crate::aggregate::{InteractionEstimator, PValueEstimator};
use crate::providers::GlobalAttributionProvider;
use crate::stats;

/// |r(x_j, y)| per feature.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationImportance;

impl GlobalAttributionProvider for CorrelationImportance {
    fn method(&self) -> AttributionMethod {
        AttributionMethod::Correlation
    }

    fn global_importance(&self, dataset: &Dataset) -> Result<IndexMap<String, f64>, CollaboratorError> {
        Ok(dataset
            .feature_names
            .iter()
            .enumerate()
            .map(|(j, name)| (name.clone(), stats::pearson(&dataset.column(j), &dataset.targets).abs()))
            .collect())
    }
}

/// Plug-in mutual information (nats) between each binned feature and the target.
#[derive(Debug, Clone, Copy)]
pub struct MutualInfoImportance {
    pub bins: usize,
}

impl Default for MutualInfoImportance {
    fn default() -> Self {
        Self { bins: 10 }
    }
}

impl GlobalAttributionProvider for MutualInfoImportance {
    fn method(&self) -> AttributionMethod {
        AttributionMethod::MutualInfo
    }

    fn global_importance(&self, dataset: &Dataset) -> Result<IndexMap<String, f64>, CollaboratorError> {
        Ok(dataset
            .feature_names
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let mi = stats::mutual_information(&dataset.column(j), &dataset.targets, self.bins);
                (name.clone(), mi)
            })
            .collect())
    }
}

/// strength(a, b) = |r((x_a − x̄_a)(x_b − x̄_b), y)|: how well the centred
/// product term tracks the target.
#[derive(Debug, Clone, Default)]
pub struct CorrelationInteractions {
    centred: IndexMap<String, Vec<f64>>,
    targets: Vec<f64>,
}

impl CorrelationInteractions {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let centred = dataset
            .feature_names
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let column = dataset.column(j);
                let m = stats::mean(&column);
                (name.clone(), column.into_iter().map(|v| v - m).collect())
            })
            .collect();
        Self {
            centred,
            targets: dataset.targets.clone(),
        }
    }
}

impl InteractionEstimator for CorrelationInteractions {
    fn strength(&self, feature_a: &str, feature_b: &str) -> Option<f64> {
        let a = self.centred.get(feature_a)?;
        let b = self.centred.get(feature_b)?;
        let product: Vec<f64> = a.iter().zip(b).map(|(x, y)| x * y).collect();
        Some(stats::pearson(&product, &self.targets).abs())
    }
}

/// p-value of r(x_j, y) under H0: ρ = 0.
#[derive(Debug, Clone, Default)]
pub struct CorrelationSignificance {
    p_values: IndexMap<String, f64>,
}

impl CorrelationSignificance {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let n = dataset.len();
        let p_values = dataset
            .feature_names
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let r = stats::pearson(&dataset.column(j), &dataset.targets);
                (name.clone(), stats::correlation_p_value(r, n))
            })
            .collect();
        Self { p_values }
    }
}

impl PValueEstimator for CorrelationSignificance {
    fn p_value(&self, feature: &str) -> Option<f64> {
        self.p_values.get(feature).copied()
    }
}
