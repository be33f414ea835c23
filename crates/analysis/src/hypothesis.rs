//! Classical hypothesis tests
//!
//! One-way ANOVA for equal means, Levene (median-centred) for equal
//! variances and Shapiro-Wilk for normality.

use serde::Serialize;

use crate::distributions::{f_sf, normal_quantile, normal_sf};
use crate::error::{FitError, Result};
use crate::features::median;

/// Statistic and p-value of a test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestResult {
    pub statistic: f64,
    pub p_value: f64,
}

impl TestResult {
    /// True when the null hypothesis is rejected at `alpha`.
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

fn check_groups(groups: &[&[f64]]) -> Result<()> {
    if groups.len() < 2 {
        return Err(FitError::InvalidParameter {
            name: "groups".to_string(),
            reason: format!("need at least 2 groups, got {}", groups.len()),
        });
    }
    for group in groups {
        if group.is_empty() {
            return Err(FitError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }
        if group.iter().any(|v| !v.is_finite()) {
            return Err(FitError::NumericalError(
                "group contains non-finite values".to_string(),
            ));
        }
    }
    let total: usize = groups.iter().map(|g| g.len()).sum();
    if total <= groups.len() {
        return Err(FitError::InsufficientData {
            required: groups.len() + 1,
            actual: total,
        });
    }
    Ok(())
}

/// One-way ANOVA F test that all group means are equal.
pub fn one_way_anova(groups: &[&[f64]]) -> Result<TestResult> {
    check_groups(groups)?;

    let k = groups.len();
    let total: usize = groups.iter().map(|g| g.len()).sum();
    let grand_mean = groups.iter().flat_map(|g| g.iter()).sum::<f64>() / total as f64;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for group in groups {
        let n = group.len() as f64;
        let m = group.iter().sum::<f64>() / n;
        ss_between += n * (m - grand_mean).powi(2);
        ss_within += group.iter().map(|x| (x - m).powi(2)).sum::<f64>();
    }

    if ss_within == 0.0 {
        return Err(FitError::NumericalError(
            "every group is constant; F is undefined".to_string(),
        ));
    }

    let df_between = (k - 1) as f64;
    let df_within = (total - k) as f64;
    let f = (ss_between / df_between) / (ss_within / df_within);

    Ok(TestResult {
        statistic: f,
        p_value: f_sf(f, df_between, df_within)?,
    })
}

/// Levene test for equal variances, centred on each group's median
/// (the Brown-Forsythe variant).
pub fn levene(groups: &[&[f64]]) -> Result<TestResult> {
    check_groups(groups)?;

    let deviations = groups
        .iter()
        .map(|g| {
            let center = median(g)?;
            Ok(g.iter().map(|x| (x - center).abs()).collect::<Vec<f64>>())
        })
        .collect::<Result<Vec<_>>>()?;
    let views: Vec<&[f64]> = deviations.iter().map(Vec::as_slice).collect();

    one_way_anova(&views)
}

fn poly(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

const SW_C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.071190, 4.434685, -2.706056];
const SW_C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const SW_C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const SW_C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const SW_C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const SW_C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const SW_G: [f64; 2] = [-2.273, 0.459];

/// Maximum sample size accepted by the Shapiro-Wilk approximation.
pub const SHAPIRO_MAX_N: usize = 5000;

/// Shapiro-Wilk coefficients for a sample of size `n` (Royston 1995).
fn shapiro_coefficients(n: usize) -> Vec<f64> {
    let mut a = vec![0.0; n];
    if n == 3 {
        a[0] = -0.5f64.sqrt();
        a[2] = 0.5f64.sqrt();
        return a;
    }

    let nf = n as f64;
    let m: Vec<f64> = (1..=n)
        .map(|i| normal_quantile((i as f64 - 0.375) / (nf + 0.25)))
        .collect();
    let summ2: f64 = m.iter().map(|v| v * v).sum();
    let ssumm2 = summ2.sqrt();
    let u = 1.0 / nf.sqrt();

    let a_n = m[n - 1] / ssumm2 + poly(&SW_C1, u);
    let (tail, eps) = if n > 5 {
        let a_n1 = m[n - 2] / ssumm2 + poly(&SW_C2, u);
        a[n - 2] = a_n1;
        a[1] = -a_n1;
        let eps = (summ2 - 2.0 * m[n - 1].powi(2) - 2.0 * m[n - 2].powi(2))
            / (1.0 - 2.0 * a_n.powi(2) - 2.0 * a_n1.powi(2));
        (2, eps)
    } else {
        let eps = (summ2 - 2.0 * m[n - 1].powi(2)) / (1.0 - 2.0 * a_n.powi(2));
        (1, eps)
    };
    a[n - 1] = a_n;
    a[0] = -a_n;

    let fac = eps.sqrt();
    for i in tail..n - tail {
        a[i] = m[i] / fac;
    }
    a
}

/// Shapiro-Wilk test for normality, valid for 3 <= n <= 5000.
pub fn shapiro_wilk(data: &[f64]) -> Result<TestResult> {
    let n = data.len();
    if n < 3 {
        return Err(FitError::InsufficientData {
            required: 3,
            actual: n,
        });
    }
    if n > SHAPIRO_MAX_N {
        return Err(FitError::InvalidParameter {
            name: "data".to_string(),
            reason: format!("sample size {} exceeds {}", n, SHAPIRO_MAX_N),
        });
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(FitError::NumericalError(
            "sample contains non-finite values".to_string(),
        ));
    }

    let mut x = data.to_vec();
    x.sort_by(f64::total_cmp);
    let range = x[n - 1] - x[0];
    if range < 1e-10 * x[n - 1].abs().max(1.0) {
        return Err(FitError::NumericalError(
            "sample range is zero".to_string(),
        ));
    }

    let a = shapiro_coefficients(n);
    let mean = x.iter().sum::<f64>() / n as f64;
    let ss: f64 = x.iter().map(|v| (v - mean).powi(2)).sum();
    let num: f64 = a.iter().zip(&x).map(|(ai, xi)| ai * xi).sum();
    let w = (num * num / ss).min(1.0);

    Ok(TestResult {
        statistic: w,
        p_value: shapiro_p_value(w, n),
    })
}

fn shapiro_p_value(w: f64, n: usize) -> f64 {
    let nf = n as f64;
    if n == 3 {
        let p = 6.0 / std::f64::consts::PI * (w.sqrt().asin() - 0.75f64.sqrt().asin());
        return p.clamp(0.0, 1.0);
    }

    let w1 = (1.0 - w).ln();
    let (y, mu, sigma) = if n <= 11 {
        let gamma = poly(&SW_G, nf);
        if w1 >= gamma {
            return 0.0;
        }
        (
            -(gamma - w1).ln(),
            poly(&SW_C3, nf),
            poly(&SW_C4, nf).exp(),
        )
    } else {
        let ln_n = nf.ln();
        (w1, poly(&SW_C5, ln_n), poly(&SW_C6, ln_n).exp())
    };

    normal_sf((y - mu) / sigma)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // ANOVA
    // ========================================================================

    #[test]
    fn test_anova_known_value() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];
        let result = one_way_anova(&[&a, &b]).unwrap();
        assert!((result.statistic - 13.5).abs() < 1e-10);
        assert!(result.p_value > 0.01 && result.p_value < 0.05);
        assert!(result.is_significant(0.05));
    }

    #[test]
    fn test_anova_equal_means() {
        let a = [1.0, 2.0, 3.0];
        let b = [3.0, 2.0, 1.0];
        let result = one_way_anova(&[&a, &b]).unwrap();
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn test_anova_rejects_single_group() {
        let a = [1.0, 2.0];
        assert!(matches!(
            one_way_anova(&[&a]),
            Err(FitError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_anova_constant_groups() {
        let a = [1.0, 1.0];
        let b = [2.0, 2.0];
        assert!(one_way_anova(&[&a, &b]).is_err());
    }

    // ========================================================================
    // Levene
    // ========================================================================

    #[test]
    fn test_levene_known_value() {
        let a = [1.0, 2.0, 3.0];
        let b = [2.0, 4.0, 6.0];
        let result = levene(&[&a, &b]).unwrap();
        assert!((result.statistic - 0.8).abs() < 1e-10);
        assert!(!result.is_significant(0.05));
    }

    #[test]
    fn test_levene_shifted_groups_have_equal_spread() {
        let a = [1.0, 2.0, 3.0];
        let b = [11.0, 12.0, 13.0];
        let result = levene(&[&a, &b]).unwrap();
        assert!(result.statistic.abs() < 1e-12);
        assert!((result.p_value - 1.0).abs() < 1e-12);
    }

    // ========================================================================
    // Shapiro-Wilk
    // ========================================================================

    #[test]
    fn test_shapiro_three_equally_spaced() {
        let result = shapiro_wilk(&[1.0, 2.0, 3.0]).unwrap();
        assert!((result.statistic - 1.0).abs() < 1e-12);
        assert!((result.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_shapiro_normal_scores_accepted() {
        let n = 50;
        let data: Vec<f64> = (1..=n)
            .map(|i| normal_quantile((i as f64 - 0.375) / (n as f64 + 0.25)))
            .collect();
        let result = shapiro_wilk(&data).unwrap();
        assert!(result.statistic > 0.98);
        assert!(result.p_value > 0.5);
    }

    #[test]
    fn test_shapiro_skewed_rejected() {
        let n = 50;
        let data: Vec<f64> = (1..=n)
            .map(|i| -(1.0 - (i as f64 - 0.5) / n as f64).ln())
            .collect();
        let result = shapiro_wilk(&data).unwrap();
        assert!(result.statistic < 0.95);
        assert!(result.p_value < 0.01);
    }

    #[test]
    fn test_shapiro_small_sample_in_range() {
        let result = shapiro_wilk(&[2.1, 3.4, 1.9, 5.6, 4.0, 3.3, 2.8]).unwrap();
        assert!(result.statistic > 0.0 && result.statistic <= 1.0);
        assert!(result.p_value >= 0.0 && result.p_value <= 1.0);
    }

    #[test]
    fn test_shapiro_coefficients_antisymmetric() {
        let a = shapiro_coefficients(20);
        for i in 0..10 {
            assert!((a[i] + a[19 - i]).abs() < 1e-9);
        }
        let norm: f64 = a.iter().map(|v| v * v).sum();
        assert!((norm - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_shapiro_rejects_bad_input() {
        assert!(matches!(
            shapiro_wilk(&[1.0, 2.0]),
            Err(FitError::InsufficientData { required: 3, actual: 2 })
        ));
        assert!(shapiro_wilk(&[4.0; 10]).is_err());
        assert!(shapiro_wilk(&vec![1.0; 5001]).is_err());
    }
}
