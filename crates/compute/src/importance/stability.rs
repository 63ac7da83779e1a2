//! Importance stability across contiguous folds of the dataset.

use indexmap::IndexMap;

use factorlens_core::{Dataset, FeatureStability};

use crate::aggregate::NEUTRAL_STABILITY;
use crate::stats;

const MIN_FOLD_ROWS: usize = 2;

/// Row ranges of up to `folds` contiguous folds, each holding at least two rows.
pub fn fold_ranges(rows: usize, folds: usize) -> Vec<std::ops::Range<usize>> {
    let k = folds.min(rows / MIN_FOLD_ROWS);
    (0..k).map(|f| (f * rows / k)..((f + 1) * rows / k)).collect()
}

/// Per feature: agreement of |r(x_j, y)| across folds.
pub fn fold_stability(dataset: &Dataset, folds: usize, threshold: f64) -> IndexMap<String, FeatureStability> {
    let ranges = fold_ranges(dataset.len(), folds);

    dataset
        .feature_names
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let score = if ranges.len() < 2 {
                NEUTRAL_STABILITY
            } else {
                let column = dataset.column(j);
                let per_fold: Vec<f64> = ranges
                    .iter()
                    .map(|r| stats::pearson(&column[r.clone()], &dataset.targets[r.clone()]).abs())
                    .collect();
                stats::agreement_stability(&per_fold)
            };
            (
                name.clone(),
                FeatureStability {
                    score,
                    is_stable: score >= threshold,
                },
            )
        })
        .collect()
}
