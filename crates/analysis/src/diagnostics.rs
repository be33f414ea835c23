//! Residual diagnostics
//!
//! Durbin-Watson for first-order autocorrelation and Ljung-Box for joint
//! autocorrelation up to a lag.

use serde::Serialize;

use crate::distributions::chi_squared_sf;
use crate::error::{FitError, Result};

/// Ljung-Box portmanteau result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LjungBoxResult {
    /// Q statistic
    pub statistic: f64,
    /// Chi-squared upper tail probability
    pub p_value: f64,
    /// Number of lags summed
    pub lags: usize,
    /// Degrees of freedom of the reference distribution
    pub df: usize,
}

impl LjungBoxResult {
    /// True when residuals look like white noise at `alpha`.
    pub fn is_white_noise(&self, alpha: f64) -> bool {
        self.p_value > alpha
    }
}

/// Durbin-Watson statistic: sum of squared successive differences over
/// the residual sum of squares. Near 2 means no first-order autocorrelation.
pub fn durbin_watson(residuals: &[f64]) -> Result<f64> {
    if residuals.len() < 2 {
        return Err(FitError::InsufficientData {
            required: 2,
            actual: residuals.len(),
        });
    }

    let ssr: f64 = residuals.iter().map(|e| e * e).sum();
    if ssr == 0.0 {
        return Err(FitError::NumericalError(
            "Durbin-Watson undefined for zero residuals".to_string(),
        ));
    }
    let diff: f64 = residuals.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();

    Ok(diff / ssr)
}

/// Sample autocorrelation at `lag` around the series mean.
pub fn autocorrelation(data: &[f64], lag: usize) -> f64 {
    let n = data.len();
    if lag >= n {
        return 0.0;
    }
    let mean = data.iter().sum::<f64>() / n as f64;
    let denom: f64 = data.iter().map(|x| (x - mean).powi(2)).sum();
    if denom == 0.0 {
        return 0.0;
    }
    let num: f64 = (lag..n)
        .map(|t| (data[t] - mean) * (data[t - lag] - mean))
        .sum();
    num / denom
}

/// Ljung-Box test on residuals with `lags` lags.
///
/// `Q = n (n + 2) * sum_{k=1..lags} r_k^2 / (n - k)`, compared against a
/// chi-squared distribution with `lags` degrees of freedom.
pub fn ljung_box(residuals: &[f64], lags: usize) -> Result<LjungBoxResult> {
    if lags == 0 {
        return Err(FitError::InvalidParameter {
            name: "lags".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let n = residuals.len();
    if n <= lags {
        return Err(FitError::InsufficientData {
            required: lags + 1,
            actual: n,
        });
    }

    let nf = n as f64;
    let q: f64 = (1..=lags)
        .map(|k| autocorrelation(residuals, k).powi(2) / (nf - k as f64))
        .sum::<f64>()
        * nf
        * (nf + 2.0);

    Ok(LjungBoxResult {
        statistic: q,
        p_value: chi_squared_sf(q, lags as f64)?,
        lags,
        df: lags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alternating(n: usize) -> Vec<f64> {
        (0..n).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect()
    }

    // Deterministic pseudo-noise, uncorrelated enough for the tests below
    fn noise(n: usize) -> Vec<f64> {
        let mut state: u64 = 12345;
        (0..n)
            .map(|_| {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((state >> 33) as f64 / (1u64 << 31) as f64) - 0.5
            })
            .collect()
    }

    #[test]
    fn test_durbin_watson_alternating_near_four() {
        let dw = durbin_watson(&alternating(100)).unwrap();
        assert!((dw - 3.96).abs() < 1e-10);
    }

    #[test]
    fn test_durbin_watson_trending_near_zero() {
        let resid: Vec<f64> = (0..100).map(|i| i as f64 - 49.5).collect();
        let dw = durbin_watson(&resid).unwrap();
        assert!(dw < 0.01);
    }

    #[test]
    fn test_durbin_watson_noise_near_two() {
        let dw = durbin_watson(&noise(2000)).unwrap();
        assert!((dw - 2.0).abs() < 0.2, "dw = {}", dw);
    }

    #[test]
    fn test_durbin_watson_errors() {
        assert!(durbin_watson(&[1.0]).is_err());
        assert!(matches!(
            durbin_watson(&[0.0, 0.0, 0.0]),
            Err(FitError::NumericalError(_))
        ));
    }

    #[test]
    fn test_autocorrelation_lag_one_of_alternating() {
        let r = autocorrelation(&alternating(50), 1);
        assert!((r + 0.98).abs() < 1e-10);
    }

    #[test]
    fn test_ljung_box_white_noise() {
        let result = ljung_box(&noise(500), 12).unwrap();
        assert_eq!(result.df, 12);
        assert!(result.is_white_noise(0.01), "p = {}", result.p_value);
    }

    #[test]
    fn test_ljung_box_detects_seasonality() {
        let resid: Vec<f64> = (0..120)
            .map(|t| (2.0 * std::f64::consts::PI * t as f64 / 12.0).sin())
            .collect();
        let result = ljung_box(&resid, 12).unwrap();
        assert!(result.statistic > 100.0);
        assert!(result.p_value < 1e-6);
    }

    #[test]
    fn test_ljung_box_needs_more_points_than_lags() {
        assert_eq!(
            ljung_box(&[1.0, 2.0, 3.0], 12).unwrap_err(),
            FitError::InsufficientData {
                required: 13,
                actual: 3
            }
        );
        assert!(ljung_box(&noise(30), 0).is_err());
    }
}
