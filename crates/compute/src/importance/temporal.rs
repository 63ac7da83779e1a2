//! Importance-over-time summaries.

use factorlens_core::{TemporalPoint, TemporalSeries, TrendDirection};
use factorlens_rules::CompiledImportanceConfig;

use crate::stats;

/// Regime detection needs at least this many earlier points.
const MIN_REGIME_HISTORY: usize = 3;

/// Summarise the most recent `temporal_window` points of one feature.
pub fn analyze_series(
    feature: &str,
    points: &[TemporalPoint],
    config: &CompiledImportanceConfig,
) -> TemporalSeries {
    let mut ordered = points.to_vec();
    ordered.sort_by_key(|p| p.timestamp);
    let start = ordered.len().saturating_sub(config.temporal_window);
    let window = ordered.split_off(start);

    let values: Vec<f64> = window.iter().map(|p| p.value).collect();
    let slope = stats::linear_slope(&values);

    TemporalSeries {
        feature_name: feature.to_string(),
        trend: trend_of(slope, stats::mean(&values)),
        slope,
        volatility: stats::population_std(&values),
        regime_changes: regime_changes(&window, config.regime_z_threshold),
        seasonal_pattern: is_seasonal(&values, config.seasonal_lag, config.seasonal_threshold),
        importance_series: window,
    }
}

fn trend_of(slope: f64, mean: f64) -> TrendDirection {
    if slope.abs() <= 1e-6 * (1.0 + mean.abs()) {
        TrendDirection::Stable
    } else if slope > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    }
}

/// Timestamps of points more than `z` std away from the mean of every
/// point before them.
fn regime_changes(window: &[TemporalPoint], z: f64) -> Vec<chrono::DateTime<chrono::Utc>> {
    let values: Vec<f64> = window.iter().map(|p| p.value).collect();
    (MIN_REGIME_HISTORY..values.len())
        .filter(|&k| {
            let history = &values[..k];
            let deviation = (values[k] - stats::mean(history)).abs();
            deviation > z * stats::population_std(history)
        })
        .map(|k| window[k].timestamp)
        .collect()
}

fn is_seasonal(values: &[f64], lag: usize, threshold: f64) -> bool {
    lag > 0 && values.len() >= 2 * lag && stats::autocorrelation(values, lag) >= threshold
}
