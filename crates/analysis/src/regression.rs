//! Ordinary least squares with one regressor
//!
//! Fits `y = b0 + b1 * x + e` in closed form and reports the usual
//! inference table: standard errors, t statistics and two-sided p-values
//! from a Student t distribution with `n - 2` degrees of freedom.
//!
//! ## Example
//!
//! ```rust
//! use cpi_analysis::regression::ols_fit;
//!
//! let x = vec![1.0, 2.0, 3.0, 4.0];
//! let y = vec![3.0, 5.0, 7.0, 9.0];
//! let fit = ols_fit(&x, &y).unwrap();
//! assert!((fit.slope.estimate - 2.0).abs() < 1e-10);
//! ```

use serde::Serialize;

use crate::distributions::{f_sf, student_t_two_sided};
use crate::error::{FitError, Result};

/// One row of the coefficient table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coefficient {
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
}

impl Coefficient {
    fn new(estimate: f64, std_error: f64, df: f64) -> Result<Self> {
        let t_value = estimate / std_error;
        Ok(Self {
            estimate,
            std_error,
            t_value,
            p_value: student_t_two_sided(t_value, df)?,
        })
    }
}

/// Fitted single-regressor OLS model.
#[derive(Debug, Clone, Serialize)]
pub struct RegressionResult {
    /// Constant term
    pub intercept: Coefficient,
    /// Coefficient of the regressor
    pub slope: Coefficient,
    /// Coefficient of determination
    pub r_squared: f64,
    /// R-squared adjusted for degrees of freedom
    pub adj_r_squared: f64,
    /// Overall F statistic
    pub f_statistic: f64,
    /// P-value of the F statistic
    pub f_p_value: f64,
    /// Square root of SSE / df
    pub residual_std_error: f64,
    /// Observations used
    pub n_observations: usize,
    /// Residual degrees of freedom
    pub df_resid: usize,
    /// In-sample predictions
    pub fitted: Vec<f64>,
    /// Observed minus fitted
    pub residuals: Vec<f64>,
}

impl RegressionResult {
    /// Predict the response for new regressor values.
    pub fn predict(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .map(|&xi| self.intercept.estimate + self.slope.estimate * xi)
            .collect()
    }

    /// Sum of squared residuals.
    pub fn sse(&self) -> f64 {
        self.residuals.iter().map(|e| e * e).sum()
    }
}

/// Fit `y` on `x` plus an intercept.
pub fn ols_fit(x: &[f64], y: &[f64]) -> Result<RegressionResult> {
    if x.len() != y.len() {
        return Err(FitError::InvalidParameter {
            name: "x".to_string(),
            reason: format!("length {} does not match y length {}", x.len(), y.len()),
        });
    }
    let n = x.len();
    if n < 3 {
        return Err(FitError::InsufficientData {
            required: 3,
            actual: n,
        });
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return Err(FitError::NumericalError(
            "regression input contains non-finite values".to_string(),
        ));
    }

    let nf = n as f64;
    let mean_x = x.iter().sum::<f64>() / nf;
    let mean_y = y.iter().sum::<f64>() / nf;

    let sxx: f64 = x.iter().map(|&xi| (xi - mean_x).powi(2)).sum();
    let sxy: f64 = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| (xi - mean_x) * (yi - mean_y))
        .sum();
    let sst: f64 = y.iter().map(|&yi| (yi - mean_y).powi(2)).sum();

    if sxx <= f64::EPSILON * nf * mean_x.abs().max(1.0) {
        return Err(FitError::NumericalError(
            "Singular design matrix: regressor is constant".to_string(),
        ));
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;

    let fitted: Vec<f64> = x.iter().map(|&xi| intercept + slope * xi).collect();
    let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(&yi, &fi)| yi - fi).collect();
    let sse: f64 = residuals.iter().map(|e| e * e).sum();

    let df_resid = n - 2;
    let df = df_resid as f64;
    let sigma2 = sse / df;

    let se_slope = (sigma2 / sxx).sqrt();
    let se_intercept = (sigma2 * (1.0 / nf + mean_x * mean_x / sxx)).sqrt();

    let r_squared = if sst > 0.0 { 1.0 - sse / sst } else { 1.0 };
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (nf - 1.0) / df;
    let f_statistic = (sst - sse) / sigma2;

    Ok(RegressionResult {
        intercept: Coefficient::new(intercept, se_intercept, df)?,
        slope: Coefficient::new(slope, se_slope, df)?,
        r_squared,
        adj_r_squared,
        f_statistic,
        f_p_value: f_sf(f_statistic, 1.0, df)?,
        residual_std_error: sigma2.sqrt(),
        n_observations: n,
        df_resid,
        fitted,
        residuals,
    })
}
