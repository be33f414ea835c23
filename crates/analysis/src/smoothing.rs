//! Additive Holt-Winters exponential smoothing
//!
//! Level, trend and seasonal components are updated one observation at a
//! time. When no smoothing parameters are given, alpha, beta and gamma are
//! chosen by minimising the in-sample one-step squared error.
//!
//! ## Example
//!
//! ```rust
//! use cpi_analysis::smoothing::{HoltWinters, Predictor};
//!
//! let data: Vec<f64> = (0..48)
//!     .map(|t| 100.0 + 0.3 * t as f64 + if t % 12 < 6 { 1.0 } else { -1.0 })
//!     .collect();
//! let mut model = HoltWinters::new(12).unwrap();
//! model.fit(&data).unwrap();
//! assert_eq!(model.predict(12).unwrap().len(), 12);
//! ```

use serde::Serialize;

use crate::error::{FitError, Result};
use crate::optimization::{nelder_mead, NelderMeadConfig};

/// Trait for forecasting models
pub trait Predictor {
    /// Fit the model to historical data
    fn fit(&mut self, data: &[f64]) -> Result<()>;

    /// Predict future values
    fn predict(&self, steps: usize) -> Result<Vec<f64>>;

    /// Check if the model has been fitted
    fn is_fitted(&self) -> bool;
}

/// Smoothing weights for level, trend and season.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SmoothingParams {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl SmoothingParams {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Result<Self> {
        for (name, value) in [("alpha", alpha), ("beta", beta), ("gamma", gamma)] {
            if !(0.0 < value && value < 1.0) {
                return Err(FitError::InvalidParameter {
                    name: name.to_string(),
                    reason: "must be between 0 and 1 (exclusive)".to_string(),
                });
            }
        }
        Ok(Self { alpha, beta, gamma })
    }
}

const PARAM_BOUNDS: [(f64, f64); 3] = [(1e-4, 0.9999), (1e-4, 0.9999), (1e-4, 0.9999)];
const PARAM_START: [f64; 3] = [0.3, 0.1, 0.1];

/// Components and one-step predictions after a pass over the data.
#[derive(Debug, Clone)]
struct Pass {
    level: f64,
    trend: f64,
    seasonal: Vec<f64>,
    fitted: Vec<f64>,
    sse: f64,
}

fn smooth(data: &[f64], period: usize, params: SmoothingParams) -> Pass {
    let SmoothingParams { alpha, beta, gamma } = params;
    let m = period as f64;

    let first = data[..period].iter().sum::<f64>() / m;
    let second = data[period..2 * period].iter().sum::<f64>() / m;
    let mut level = first;
    let mut trend = (second - first) / m;
    let mut seasonal: Vec<f64> = data[..period].iter().map(|y| y - first).collect();

    let mut fitted = Vec::with_capacity(data.len());
    let mut sse = 0.0;
    for (t, &y) in data.iter().enumerate() {
        let slot = t % period;
        let prev_level = level;
        let prev_seasonal = seasonal[slot];

        let forecast = level + trend + prev_seasonal;
        sse += (y - forecast).powi(2);
        fitted.push(forecast);

        level = alpha * (y - prev_seasonal) + (1.0 - alpha) * (level + trend);
        trend = beta * (level - prev_level) + (1.0 - beta) * trend;
        seasonal[slot] = gamma * (y - level) + (1.0 - gamma) * prev_seasonal;
    }

    Pass {
        level,
        trend,
        seasonal,
        fitted,
        sse,
    }
}

/// Additive-trend, additive-season Holt-Winters model.
#[derive(Debug, Clone)]
pub struct HoltWinters {
    period: usize,
    fixed: Option<SmoothingParams>,
    params: Option<SmoothingParams>,
    observed: Vec<f64>,
    pass: Option<Pass>,
}

impl HoltWinters {
    /// Model whose smoothing weights are estimated during `fit`.
    pub fn new(period: usize) -> Result<Self> {
        if period < 2 {
            return Err(FitError::InvalidParameter {
                name: "period".to_string(),
                reason: "must be at least 2".to_string(),
            });
        }
        Ok(Self {
            period,
            fixed: None,
            params: None,
            observed: Vec::new(),
            pass: None,
        })
    }

    /// Model with fixed smoothing weights.
    pub fn with_params(alpha: f64, beta: f64, gamma: f64, period: usize) -> Result<Self> {
        let params = SmoothingParams::new(alpha, beta, gamma)?;
        let mut model = Self::new(period)?;
        model.fixed = Some(params);
        Ok(model)
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Weights used by the last fit.
    pub fn params(&self) -> Option<SmoothingParams> {
        self.params
    }

    /// In-sample one-step-ahead predictions, aligned with the fitted data.
    pub fn fitted_values(&self) -> Result<&[f64]> {
        self.pass
            .as_ref()
            .map(|p| p.fitted.as_slice())
            .ok_or(FitError::NotFitted)
    }

    /// Fitted minus observed, one per input point.
    pub fn residuals(&self) -> Result<Vec<f64>> {
        let fitted = self.fitted_values()?;
        Ok(fitted.iter().zip(&self.observed).map(|(f, y)| f - y).collect())
    }

    /// Sum of squared one-step errors.
    pub fn sse(&self) -> Result<f64> {
        self.pass.as_ref().map(|p| p.sse).ok_or(FitError::NotFitted)
    }

    /// Final (level, trend, seasonal) state.
    pub fn components(&self) -> Option<(f64, f64, &[f64])> {
        self.pass
            .as_ref()
            .map(|p| (p.level, p.trend, p.seasonal.as_slice()))
    }

    fn optimise(&self, data: &[f64]) -> Result<SmoothingParams> {
        let minimum = nelder_mead(
            |x| {
                let params = SmoothingParams {
                    alpha: x[0],
                    beta: x[1],
                    gamma: x[2],
                };
                smooth(data, self.period, params).sse
            },
            &PARAM_START,
            &PARAM_BOUNDS,
            &NelderMeadConfig::default(),
        );
        if !minimum.value.is_finite() {
            return Err(FitError::ConvergenceFailure {
                iterations: minimum.iterations,
            });
        }
        tracing::debug!(
            iterations = minimum.iterations,
            converged = minimum.converged,
            sse = minimum.value,
            "smoothing parameters optimised"
        );
        SmoothingParams::new(minimum.point[0], minimum.point[1], minimum.point[2])
    }
}

impl Predictor for HoltWinters {
    fn fit(&mut self, data: &[f64]) -> Result<()> {
        let min_required = self.period * 2;
        if data.len() < min_required {
            return Err(FitError::InsufficientData {
                required: min_required,
                actual: data.len(),
            });
        }
        if data.iter().any(|v| !v.is_finite()) {
            return Err(FitError::NumericalError(
                "series contains non-finite values".to_string(),
            ));
        }

        let params = match self.fixed {
            Some(params) => params,
            None => self.optimise(data)?,
        };
        self.pass = Some(smooth(data, self.period, params));
        self.params = Some(params);
        self.observed = data.to_vec();
        Ok(())
    }

    fn predict(&self, steps: usize) -> Result<Vec<f64>> {
        let pass = self.pass.as_ref().ok_or(FitError::NotFitted)?;
        let n = self.observed.len();

        Ok((1..=steps)
            .map(|h| {
                let slot = (n + h - 1) % self.period;
                pass.level + h as f64 * pass.trend + pass.seasonal[slot]
            })
            .collect())
    }

    fn is_fitted(&self) -> bool {
        self.pass.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seasonal_series(n: usize) -> Vec<f64> {
        (0..n)
            .map(|t| {
                100.0 + 0.5 * t as f64
                    + 5.0 * (2.0 * std::f64::consts::PI * t as f64 / 12.0).sin()
            })
            .collect()
    }

    #[test]
    fn test_constant_series_is_reproduced() {
        let mut model = HoltWinters::with_params(0.3, 0.1, 0.2, 12).unwrap();
        model.fit(&[10.0; 36]).unwrap();

        assert!(model.is_fitted());
        assert!(model.fitted_values().unwrap().iter().all(|f| (f - 10.0).abs() < 1e-12));
        assert!(model.predict(12).unwrap().iter().all(|f| (f - 10.0).abs() < 1e-12));
        assert!(model.residuals().unwrap().iter().all(|e| e.abs() < 1e-12));
    }

    #[test]
    fn test_optimised_fit_tracks_trend_and_season() {
        let data = seasonal_series(120);
        let truth = seasonal_series(132);

        let mut model = HoltWinters::new(12).unwrap();
        model.fit(&data).unwrap();
        let forecast = model.predict(12).unwrap();

        assert_eq!(forecast.len(), 12);
        for (h, f) in forecast.iter().enumerate() {
            assert!((f - truth[120 + h]).abs() < 2.0, "h={} f={}", h + 1, f);
        }
    }

    #[test]
    fn test_optimised_params_inside_unit_interval() {
        let mut model = HoltWinters::new(12).unwrap();
        model.fit(&seasonal_series(60)).unwrap();
        let p = model.params().unwrap();
        for v in [p.alpha, p.beta, p.gamma] {
            assert!(v > 0.0 && v < 1.0);
        }
    }

    #[test]
    fn test_optimised_sse_not_worse_than_start() {
        let data = seasonal_series(72);
        let mut tuned = HoltWinters::new(12).unwrap();
        tuned.fit(&data).unwrap();
        let mut fixed = HoltWinters::with_params(0.3, 0.1, 0.1, 12).unwrap();
        fixed.fit(&data).unwrap();

        assert!(tuned.sse().unwrap() <= fixed.sse().unwrap() + 1e-9);
    }

    #[test]
    fn test_optimised_sse_beats_parameter_grid() {
        let data: Vec<f64> = seasonal_series(96)
            .iter()
            .enumerate()
            .map(|(t, v)| v + 0.8 * (t as f64 * 1.7).sin() + 0.5 * (t as f64 * 0.37).cos())
            .collect();

        let mut tuned = HoltWinters::new(12).unwrap();
        tuned.fit(&data).unwrap();

        let grid: Vec<f64> = (0..10).map(|i| 0.05 + 0.1 * i as f64).collect();
        let mut grid_best = f64::INFINITY;
        for &a in &grid {
            for &b in &grid {
                for &g in &grid {
                    let mut model = HoltWinters::with_params(a, b, g, 12).unwrap();
                    model.fit(&data).unwrap();
                    grid_best = grid_best.min(model.sse().unwrap());
                }
            }
        }

        let sse = tuned.sse().unwrap();
        assert!(sse <= grid_best * 1.01, "sse={} grid={}", sse, grid_best);
    }

    #[test]
    fn test_fitted_and_residuals_align_with_data() {
        let data = seasonal_series(48);
        let mut model = HoltWinters::new(12).unwrap();
        model.fit(&data).unwrap();

        let fitted = model.fitted_values().unwrap();
        let resid = model.residuals().unwrap();
        assert_eq!(fitted.len(), 48);
        assert_eq!(resid.len(), 48);
        assert!((resid[5] - (fitted[5] - data[5])).abs() < 1e-12);
    }

    #[test]
    fn test_requires_two_full_seasons() {
        let mut model = HoltWinters::new(12).unwrap();
        assert_eq!(
            model.fit(&seasonal_series(23)).unwrap_err(),
            FitError::InsufficientData {
                required: 24,
                actual: 23
            }
        );
    }

    #[test]
    fn test_predict_before_fit() {
        let model = HoltWinters::new(12).unwrap();
        assert!(!model.is_fitted());
        assert_eq!(model.predict(3).unwrap_err(), FitError::NotFitted);
        assert!(model.fitted_values().is_err());
    }

    #[test]
    fn test_invalid_params() {
        assert!(HoltWinters::with_params(1.0, 0.1, 0.1, 12).is_err());
        assert!(HoltWinters::with_params(0.5, 0.0, 0.1, 12).is_err());
        assert!(HoltWinters::new(1).is_err());
    }
}
