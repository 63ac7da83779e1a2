//! Small descriptive and inferential statistics shared by the aggregator
//! and the built-in estimators. Everything here is deterministic and
//! returns a defined value (never NaN) for degenerate input.

/// Guard added to denominators that may be zero.
pub const EPSILON: f64 = 1e-8;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let sum = values.iter().sum::<f64>();
    if sum.is_finite() {
        return sum / n;
    }
    let scale = max_abs(values);
    values.iter().map(|v| v / scale).sum::<f64>() / n * scale
}

/// Population standard deviation (divides by n). Exactly 0 for constant
/// input; finite for any finite input.
pub fn population_std(values: &[f64]) -> f64 {
    if values.len() < 2 || values.iter().all(|v| *v == values[0]) {
        return 0.0;
    }
    let std = raw_std(values);
    if std.is_finite() {
        return std;
    }
    let scale = max_abs(values);
    let scaled: Vec<f64> = values.iter().map(|v| v / scale).collect();
    raw_std(&scaled) * scale
}

fn raw_std(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
}

/// 1 − std / (|mean| + ε). Not clamped: strongly disagreeing scores go
/// negative. Saturates at `f64::MIN` rather than reaching -inf.
pub fn agreement_stability(values: &[f64]) -> f64 {
    (1.0 - population_std(values) / (mean(values).abs() + EPSILON)).max(f64::MIN)
}

/// Normal-approximation interval mean ± z·std/√n, saturating at the f64
/// range. `None` below two values.
pub fn normal_interval(values: &[f64], z: f64) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let margin = z * population_std(values) / (values.len() as f64).sqrt();
    Some(((m - margin).max(f64::MIN), (m + margin).min(f64::MAX)))
}

/// Pearson correlation over the common prefix of `x` and `y`. Zero when
/// either side is constant or fewer than two pairs exist.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let mx = mean(x);
    let my = mean(y);

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for i in 0..n {
        let dx = x[i] - mx;
        let dy = y[i] - my;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = (var_x * var_y).sqrt();
    if denom <= f64::EPSILON {
        return 0.0;
    }
    (cov / denom).clamp(-1.0, 1.0)
}

/// Two-sided p-value for H0: ρ = 0, via the Fisher transform
/// z = atanh(r)·√(n − 3). Returns 1.0 when n < 4 (no evidence).
pub fn correlation_p_value(r: f64, n: usize) -> f64 {
    if n < 4 {
        return 1.0;
    }
    if r.abs() >= 1.0 {
        return 0.0;
    }
    let z = r.atanh() * ((n - 3) as f64).sqrt();
    (2.0 * (1.0 - normal_cdf(z.abs()))).clamp(0.0, 1.0)
}

pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Abramowitz & Stegun 7.1.26, |error| < 1.5e-7.
pub fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}

/// Least-squares slope of `values` against their index.
pub fn linear_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mx = (n - 1) as f64 / 2.0;
    let my = mean(values);
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, v) in values.iter().enumerate() {
        let dx = i as f64 - mx;
        num += dx * (v - my);
        den += dx * dx;
    }
    if den <= f64::EPSILON {
        0.0
    } else {
        num / den
    }
}

/// Sample autocorrelation at `lag`. Zero when the series is too short or constant.
pub fn autocorrelation(values: &[f64], lag: usize) -> f64 {
    let n = values.len();
    if lag == 0 || n <= lag {
        return 0.0;
    }
    let m = mean(values);
    let denom: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    if denom <= f64::EPSILON {
        return 0.0;
    }
    let num: f64 = (lag..n).map(|i| (values[i] - m) * (values[i - lag] - m)).sum();
    num / denom
}

/// Equal-width bin index for every value (0..bins).
pub fn equal_width_bins(values: &[f64], bins: usize) -> Vec<usize> {
    let bins = bins.max(1);
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = hi - lo;
    values
        .iter()
        .map(|v| {
            if width <= f64::EPSILON {
                0
            } else {
                (((v - lo) / width) * bins as f64).floor().min((bins - 1) as f64) as usize
            }
        })
        .collect()
}

/// Plug-in mutual information (nats) between two discretised variables.
pub fn mutual_information(x: &[f64], y: &[f64], bins: usize) -> f64 {
    let n = x.len().min(y.len());
    if n == 0 {
        return 0.0;
    }
    let bins = bins.max(1);
    let bx = equal_width_bins(&x[..n], bins);
    let by = equal_width_bins(&y[..n], bins);

    let mut joint = vec![0usize; bins * bins];
    let mut px = vec![0usize; bins];
    let mut py = vec![0usize; bins];
    for (a, b) in bx.iter().zip(by.iter()) {
        joint[a * bins + b] += 1;
        px[*a] += 1;
        py[*b] += 1;
    }

    let total = n as f64;
    let mut mi = 0.0;
    for a in 0..bins {
        for b in 0..bins {
            let count = joint[a * bins + b];
            if count == 0 {
                continue;
            }
            let p_ab = count as f64 / total;
            let p_a = px[a] as f64 / total;
            let p_b = py[b] as f64 / total;
            mi += p_ab * (p_ab / (p_a * p_b)).ln();
        }
    }
    mi.max(0.0)
}
