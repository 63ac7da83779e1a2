//! Similar-case retrieval over a historical dataset.

use indexmap::IndexMap;
use tracing::debug;

use factorlens_core::{CollaboratorError, HistoricalRecord, Instance, KeyDifference, SimilarCase};

use crate::providers::log_failure;
use crate::stats::{self, EPSILON};

/// Per-feature spread of the historical dataset, used to put features on a
/// comparable footing before measuring distance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureScale {
    spreads: IndexMap<String, f64>,
}

impl FeatureScale {
    /// Population std of every feature over the records that carry it.
    pub fn from_records(records: &[HistoricalRecord]) -> Self {
        let mut columns: IndexMap<String, Vec<f64>> = IndexMap::new();
        for record in records {
            for (name, value) in &record.features {
                if value.is_finite() {
                    columns.entry(name.clone()).or_default().push(*value);
                }
            }
        }
        let spreads = columns
            .into_iter()
            .map(|(name, values)| (name, stats::population_std(&values).max(EPSILON)))
            .collect();
        Self { spreads }
    }

    /// Spread of `feature`, 1.0 when the dataset never saw it.
    pub fn spread(&self, feature: &str) -> f64 {
        self.spreads.get(feature).copied().unwrap_or(1.0)
    }
}

/// Similarity of two instances, in [0, 1].
pub trait SimilarityMeasure: Send + Sync {
    fn similarity(&self, a: &Instance, b: &Instance, scale: &FeatureScale) -> f64;
}

/// 1 / (1 + d) for the Euclidean distance d over shared features, each
/// divided by its spread.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardizedDistance;

impl SimilarityMeasure for StandardizedDistance {
    fn similarity(&self, a: &Instance, b: &Instance, scale: &FeatureScale) -> f64 {
        let mut shared = 0usize;
        let mut squared = 0.0;
        for (name, x) in a {
            let Some(y) = b.get(name) else {
                continue;
            };
            if !x.is_finite() || !y.is_finite() {
                continue;
            }
            shared += 1;
            squared += ((x - y) / scale.spread(name)).powi(2);
        }
        if shared == 0 {
            return 0.0;
        }
        1.0 / (1.0 + squared.sqrt())
    }
}

/// (1 + cos θ) / 2 over shared features; 0 when either side is all zeros.
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineSimilarity;

impl SimilarityMeasure for CosineSimilarity {
    fn similarity(&self, a: &Instance, b: &Instance, _scale: &FeatureScale) -> f64 {
        let mut dot = 0.0;
        let mut norm_a = 0.0;
        let mut norm_b = 0.0;
        for (name, x) in a {
            let Some(y) = b.get(name) else {
                continue;
            };
            if !x.is_finite() || !y.is_finite() {
                continue;
            }
            dot += x * y;
            norm_a += x * x;
            norm_b += y * y;
        }
        let denom = norm_a.sqrt() * norm_b.sqrt();
        if denom <= f64::EPSILON {
            return 0.0;
        }
        (1.0 + (dot / denom).clamp(-1.0, 1.0)) / 2.0
    }
}

pub struct SimilarCaseRetriever<'a> {
    measure: &'a dyn SimilarityMeasure,
    max_cases: usize,
    threshold: f64,
    key_difference_threshold: f64,
    max_key_differences: usize,
}

impl<'a> SimilarCaseRetriever<'a> {
    pub fn new(measure: &'a dyn SimilarityMeasure) -> Self {
        Self {
            measure,
            max_cases: 3,
            threshold: 0.0,
            key_difference_threshold: 0.1,
            max_key_differences: 3,
        }
    }

    pub fn with_limits(mut self, max_cases: usize, threshold: f64) -> Self {
        self.max_cases = max_cases;
        self.threshold = threshold;
        self
    }

    pub fn with_key_differences(mut self, threshold: f64, max: usize) -> Self {
        self.key_difference_threshold = threshold;
        self.max_key_differences = max;
        self
    }

    /// Most similar records first (ties keep dataset order).
    ///
    /// `outcome_of` is only called for records that make the cut; it
    /// supplies an outcome for records that carry none.
    pub fn retrieve<F>(
        &self,
        instance: &Instance,
        prediction: f64,
        records: &[HistoricalRecord],
        outcome_of: F,
    ) -> Result<Vec<SimilarCase>, CollaboratorError>
    where
        F: Fn(&HistoricalRecord) -> Result<f64, CollaboratorError>,
    {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let scale = FeatureScale::from_records(records);
        let mut scored: Vec<(usize, f64)> = records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let similarity = self.measure.similarity(instance, &record.features, &scale);
                let similarity = if similarity.is_finite() {
                    similarity.clamp(0.0, 1.0)
                } else {
                    0.0
                };
                (i, similarity)
            })
            .filter(|(_, similarity)| *similarity >= self.threshold)
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.max_cases);

        let mut cases = Vec::with_capacity(scored.len());
        for (index, similarity) in scored {
            let record = &records[index];
            let outcome = match record.outcome {
                Some(outcome) => outcome,
                None => outcome_of(record)?,
            };
            let outcome = CollaboratorError::check_finite(outcome, "historical outcome", "outcome")
                .map_err(log_failure)?;
            cases.push(SimilarCase {
                case_id: record
                    .case_id
                    .clone()
                    .unwrap_or_else(|| format!("case_{}", index)),
                features: record.features.clone(),
                prediction: outcome,
                similarity,
                key_differences: self.key_differences(instance, &record.features),
                outcome_difference: (outcome - prediction).abs().min(f64::MAX),
            });
        }

        debug!(candidates = records.len(), selected = cases.len(), "Retrieved similar cases");
        Ok(cases)
    }

    /// Features whose relative difference exceeds the threshold, largest first.
    fn key_differences(&self, instance: &Instance, case: &Instance) -> Vec<KeyDifference> {
        let mut diffs: Vec<(f64, KeyDifference)> = instance
            .iter()
            .filter_map(|(name, a)| {
                let b = case.get(name)?;
                let relative = (a - b).abs() / (a.abs() + EPSILON);
                (relative.is_finite() && relative > self.key_difference_threshold).then(|| {
                    (
                        relative,
                        KeyDifference {
                            feature_name: name.clone(),
                            instance_value: *a,
                            case_value: *b,
                        },
                    )
                })
            })
            .collect();
        diffs.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        diffs.truncate(self.max_key_differences);
        diffs.into_iter().map(|(_, d)| d).collect()
    }
}
