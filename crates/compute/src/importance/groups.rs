//! Greedy grouping of mutually correlated features.

use indexmap::IndexMap;

use factorlens_core::Dataset;

use crate::stats;

/// Scan features in order; each ungrouped seed collects later ungrouped
/// features with |r| ≥ `threshold` against it, up to `max_size` members.
/// Singletons are dropped, so groups never overlap and always hold ≥ 2.
pub fn group_correlated(dataset: &Dataset, threshold: f64, max_size: usize) -> IndexMap<String, Vec<String>> {
    let names = &dataset.feature_names;
    let columns: Vec<Vec<f64>> = (0..names.len()).map(|j| dataset.column(j)).collect();
    let mut grouped = vec![false; names.len()];
    let mut groups = IndexMap::new();

    for seed in 0..names.len() {
        if grouped[seed] {
            continue;
        }
        let mut members = vec![seed];
        for other in (seed + 1)..names.len() {
            if members.len() >= max_size {
                break;
            }
            if grouped[other] {
                continue;
            }
            if stats::pearson(&columns[seed], &columns[other]).abs() >= threshold {
                members.push(other);
            }
        }
        if members.len() < 2 {
            continue;
        }
        for &m in &members {
            grouped[m] = true;
        }
        let id = format!("group_{}", groups.len());
        groups.insert(id, members.into_iter().map(|m| names[m].clone()).collect());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(columns: &[(&str, Vec<f64>)]) -> Dataset {
        let n = columns[0].1.len();
        let rows = (0..n)
            .map(|i| columns.iter().map(|(_, c)| c[i]).collect())
            .collect();
        Dataset::new(
            columns.iter().map(|(name, _)| name.to_string()).collect(),
            rows,
            vec![0.0; n],
        )
    }

    #[test]
    fn correlated_features_group_together() {
        let base = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let ds = dataset(&[
            ("a", base.clone()),
            ("noise", vec![1.0, -1.0, 1.0, -1.0, 1.0]),
            ("b", base.iter().map(|v| v * 2.0).collect()),
            ("c", base.iter().map(|v| -v).collect()),
            ("d", base.iter().map(|v| v + 1.0).collect()),
        ]);
        let groups = group_correlated(&ds, 0.7, 3);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups["group_0"], vec!["a", "b", "c"]);
    }

    #[test]
    fn leftover_members_form_the_next_group() {
        let base = vec![1.0, 2.0, 3.0, 4.0];
        let ds = dataset(&[
            ("a", base.clone()),
            ("b", base.clone()),
            ("c", base.clone()),
            ("d", base.clone()),
        ]);
        let groups = group_correlated(&ds, 0.7, 2);
        assert_eq!(groups["group_0"], vec!["a", "b"]);
        assert_eq!(groups["group_1"], vec!["c", "d"]);
    }

    #[test]
    fn uncorrelated_features_stay_ungrouped() {
        let ds = dataset(&[
            ("a", vec![1.0, 2.0, 3.0, 4.0]),
            ("b", vec![1.0, -1.0, -1.0, 1.0]),
        ]);
        assert!(group_correlated(&ds, 0.7, 3).is_empty());
    }
}
