//! Model performance metrics over hospital-level means.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use vetlens_common::ModelKind;

use crate::scoring::HospitalStats;

/// How well one model's hospital means track the star ratings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModelPerformance {
    /// Pearson r against the star scores.
    pub correlation: f64,
    /// Two-sided p-value for r under the t distribution.
    pub p_value: f64,
    /// Mean absolute error against the star scores.
    pub mae: f64,
}

pub fn mean_absolute_error(truth: &[f64], predicted: &[f64]) -> f64 {
    debug_assert_eq!(truth.len(), predicted.len());
    if truth.is_empty() {
        return 0.0;
    }
    truth
        .iter()
        .zip(predicted)
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / truth.len() as f64
}

/// Pearson correlation coefficient. None when either side has zero
/// variance or fewer than two points.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n < 2 || n != y.len() {
        return None;
    }
    let nf = n as f64;
    let mx = x.iter().sum::<f64>() / nf;
    let my = y.iter().sum::<f64>() / nf;

    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mx;
        let dy = b - my;
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }
    if vx <= 0.0 || vy <= 0.0 {
        return None;
    }
    Some((cov / (vx * vy).sqrt()).clamp(-1.0, 1.0))
}

/// Pearson r plus its two-sided p-value (t test with n−2 dof).
pub fn pearson_with_p(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let r = pearson(x, y)?;
    let n = x.len() as f64;
    if n <= 2.0 {
        return Some((r, 1.0));
    }
    if (1.0 - r * r) < f64::EPSILON {
        return Some((r, 0.0));
    }
    let t = r * ((n - 2.0) / (1.0 - r * r)).sqrt();
    Some((r, t_two_sided_p(t, n - 2.0)))
}

/// Ordinary least squares fit. None when x is degenerate.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let n = x.len();
    if n < 2 || n != y.len() {
        return None;
    }
    let nf = n as f64;
    let mx = x.iter().sum::<f64>() / nf;
    let my = y.iter().sum::<f64>() / nf;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (a, b) in x.iter().zip(y) {
        sxx += (a - mx) * (a - mx);
        sxy += (a - mx) * (b - my);
    }
    if sxx <= 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some((slope, my - slope * mx))
}

/// Two-sided p-value of a t statistic via the regularized incomplete
/// beta function: p = I_{df/(df+t²)}(df/2, 1/2).
pub fn t_two_sided_p(t: f64, df: f64) -> f64 {
    if df <= 0.0 || !t.is_finite() {
        return 1.0;
    }
    incomplete_beta_reg(df / 2.0, 0.5, df / (df + t * t)).clamp(0.0, 1.0)
}

/// Regularized incomplete beta I_x(a, b), continued-fraction evaluation
/// (Numerical Recipes betai/betacf).
fn incomplete_beta_reg(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let ln_front = ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    let front = ln_front.exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        front * betacf(a, b, x) / a
    } else {
        1.0 - front * betacf(b, a, 1.0 - x) / b
    }
}

fn betacf(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: usize = 200;
    const EPS: f64 = 3e-14;
    const FPMIN: f64 = 1e-300;

    let qab = a + b;
    let qap = a + 1.0;
    let qam = a - 1.0;
    let mut c = 1.0;
    let mut d = 1.0 - qab * x / qap;
    if d.abs() < FPMIN {
        d = FPMIN;
    }
    d = 1.0 / d;
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 + aa * d;
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = 1.0 + aa / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

/// Lanczos approximation of ln Γ(x).
fn ln_gamma(x: f64) -> f64 {
    const COEF: [f64; 6] = [
        76.18009172947146,
        -86.50532032941677,
        24.01409824083091,
        -1.231739572450155,
        0.1208650973866179e-2,
        -0.5395239384953e-5,
    ];
    let mut y = x;
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut ser = 1.000000000190015;
    for c in COEF {
        y += 1.0;
        ser += c / y;
    }
    -tmp + (2.5066282746310005 * ser / x).ln()
}

/// Per-model correlation, p-value and MAE over hospital means.
pub fn compute_performance(hospitals: &[HospitalStats]) -> BTreeMap<ModelKind, ModelPerformance> {
    let star: Vec<f64> = hospitals.iter().map(|h| h.star_score).collect();
    ModelKind::ALL
        .into_iter()
        .map(|kind| {
            let scores: Vec<f64> = hospitals.iter().map(|h| h.model_scores[&kind]).collect();
            let (correlation, p_value) = pearson_with_p(&scores, &star).unwrap_or((0.0, 1.0));
            let mae = mean_absolute_error(&star, &scores);
            (kind, ModelPerformance { correlation, p_value, mae })
        })
        .collect()
}

/// Model-vs-model correlation matrix over hospital means, keyed by
/// display name (the shape the frontend heatmap expects).
pub fn correlation_matrix(hospitals: &[HospitalStats]) -> BTreeMap<String, BTreeMap<String, f64>> {
    let mut matrix = BTreeMap::new();
    for a in ModelKind::ALL {
        let xa: Vec<f64> = hospitals.iter().map(|h| h.model_scores[&a]).collect();
        let mut row = BTreeMap::new();
        for b in ModelKind::ALL {
            let value = if a == b {
                1.0
            } else {
                let xb: Vec<f64> = hospitals.iter().map(|h| h.model_scores[&b]).collect();
                pearson(&xa, &xb).unwrap_or(0.0)
            };
            row.insert(b.display_name().to_string(), value);
        }
        matrix.insert(a.display_name().to_string(), row);
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mae_of_identical_series_is_zero() {
        let a = [1.0, -0.5, 2.0];
        assert_eq!(mean_absolute_error(&a, &a), 0.0);
        assert!((mean_absolute_error(&[0.0, 0.0], &[1.0, -3.0]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_detects_perfect_correlation() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);

        let y_neg = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&x, &y_neg).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_rejects_zero_variance() {
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_none());
        assert!(pearson(&[1.0], &[2.0]).is_none());
    }

    #[test]
    fn p_value_matches_scipy_reference() {
        // scipy.stats.pearsonr([1,2,3,4,5], [1,2,3,5,4]) → r=0.9, p≈0.03739
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 2.0, 3.0, 5.0, 4.0];
        let (r, p) = pearson_with_p(&x, &y).unwrap();
        assert!((r - 0.9).abs() < 1e-9);
        assert!((p - 0.03739).abs() < 1e-4, "p = {p}");
    }

    #[test]
    fn t_two_sided_p_limits() {
        assert!((t_two_sided_p(0.0, 10.0) - 1.0).abs() < 1e-9);
        assert!(t_two_sided_p(50.0, 10.0) < 1e-9);
        // Symmetric in t.
        assert!((t_two_sided_p(-2.5, 8.0) - t_two_sided_p(2.5, 8.0)).abs() < 1e-12);
        // t=2.5, df=8 → p ≈ 0.0369 (standard table value)
        assert!((t_two_sided_p(2.5, 8.0) - 0.0369).abs() < 1e-3);
    }

    #[test]
    fn regression_fits_a_line() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 3.0, 5.0, 7.0];
        let (slope, intercept) = linear_regression(&x, &y).unwrap();
        assert!((slope - 2.0).abs() < 1e-12);
        assert!((intercept - 1.0).abs() < 1e-12);
    }

    #[test]
    fn matrix_has_unit_diagonal_and_is_symmetric() {
        let hospitals: Vec<HospitalStats> = (0..6)
            .map(|i| {
                let v = i as f64;
                HospitalStats {
                    hospital_id: format!("h{i}"),
                    review_count: 1,
                    star_score: v - 2.0,
                    model_scores: ModelKind::ALL
                        .into_iter()
                        .enumerate()
                        .map(|(j, k)| (k, v * (j as f64 + 1.0) - (i % 2) as f64))
                        .collect(),
                }
            })
            .collect();

        let matrix = correlation_matrix(&hospitals);
        for a in ModelKind::ALL {
            let an = a.display_name();
            assert_eq!(matrix[an][an], 1.0);
            for b in ModelKind::ALL {
                let bn = b.display_name();
                assert!((matrix[an][bn] - matrix[bn][an]).abs() < 1e-12);
            }
        }
    }
}
