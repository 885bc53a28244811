//! Bootstrap resampling: correlation CIs and the MAE-difference test.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::metrics::{mean_absolute_error, pearson};

/// Fixed seed so repeated runs over the same upload agree.
pub const DEFAULT_SEED: u64 = 42;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BootstrapConfig {
    pub iterations: usize,
    /// Confidence level in (0, 1), e.g. 0.95.
    pub confidence: f64,
    pub seed: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self { iterations: 10_000, confidence: 0.95, seed: DEFAULT_SEED }
    }
}

impl BootstrapConfig {
    /// Cheaper settings for the per-chart error bars.
    pub fn for_error_bars() -> Self {
        Self { iterations: 2_000, ..Default::default() }
    }
}

/// Result of the paired bootstrap test on the MAE difference between
/// two models (positive difference means model1 has the lower MAE).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaeDifferenceTest {
    pub mae1: f64,
    pub mae2: f64,
    /// `mae2 − mae1` on the original sample.
    pub mae_difference: f64,
    /// Empirical (lower, upper) percentile interval.
    pub confidence_interval: (f64, f64),
    pub bootstrap_iterations: usize,
    /// True iff the interval excludes zero.
    pub is_significant: bool,
}

/// Empirical percentile with linear interpolation between order
/// statistics (numpy's default). `q` in 0..=100; input must be sorted.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let pos = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

fn interval(mut samples: Vec<f64>, confidence: f64) -> (f64, f64) {
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let alpha = 1.0 - confidence;
    (
        percentile(&samples, alpha / 2.0 * 100.0),
        percentile(&samples, (1.0 - alpha / 2.0) * 100.0),
    )
}

fn resample_indices(rng: &mut StdRng, n: usize) -> Vec<usize> {
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

/// Bootstrap CI for the Pearson correlation of two paired series.
/// Degenerate resamples (zero variance on either side) are skipped.
/// None when every resample was degenerate or inputs are too short.
pub fn correlation_ci(x: &[f64], y: &[f64], config: &BootstrapConfig) -> Option<(f64, f64)> {
    let n = x.len();
    if n < 2 || n != y.len() {
        return None;
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut samples = Vec::with_capacity(config.iterations);
    for _ in 0..config.iterations {
        let idx = resample_indices(&mut rng, n);
        let xb: Vec<f64> = idx.iter().map(|&i| x[i]).collect();
        let yb: Vec<f64> = idx.iter().map(|&i| y[i]).collect();
        if let Some(r) = pearson(&xb, &yb) {
            samples.push(r);
        }
    }
    if samples.is_empty() {
        return None;
    }
    Some(interval(samples, config.confidence))
}

/// Paired bootstrap over hospitals: resample N (star, model1, model2)
/// triples with replacement, record `mae2 − mae1` per resample, take the
/// empirical percentile interval.
pub fn mae_difference_test(
    truth: &[f64],
    pred1: &[f64],
    pred2: &[f64],
    config: &BootstrapConfig,
) -> MaeDifferenceTest {
    let n = truth.len();
    let mae1 = mean_absolute_error(truth, pred1);
    let mae2 = mean_absolute_error(truth, pred2);
    debug!(n, mae1, mae2, iterations = config.iterations, "Bootstrap MAE test");

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut differences = Vec::with_capacity(config.iterations);
    for _ in 0..config.iterations {
        let idx = resample_indices(&mut rng, n);
        let t: Vec<f64> = idx.iter().map(|&i| truth[i]).collect();
        let p1: Vec<f64> = idx.iter().map(|&i| pred1[i]).collect();
        let p2: Vec<f64> = idx.iter().map(|&i| pred2[i]).collect();
        differences.push(mean_absolute_error(&t, &p2) - mean_absolute_error(&t, &p1));
    }

    let confidence_interval = interval(differences, config.confidence);
    let is_significant = confidence_interval.0 > 0.0 || confidence_interval.1 < 0.0;

    MaeDifferenceTest {
        mae1,
        mae2,
        mae_difference: mae2 - mae1,
        confidence_interval,
        bootstrap_iterations: config.iterations,
        is_significant,
    }
}
