//! Forecast band and forecast calendar
//!
//! The band has constant width: `z * sqrt(var(fitted - observed))` with the
//! population variance of the in-sample errors. It does not widen with the
//! horizon.

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use crate::error::{FitError, Result};
use crate::features::population_variance;

/// Two-sided 95% normal critical value.
pub const Z_95: f64 = 1.96;

/// One forecast step with its band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub forecast: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Point forecasts with a constant-width band.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastResult {
    pub points: Vec<ForecastPoint>,
    /// In-sample one-step predictions
    pub fitted: Vec<f64>,
    /// Critical value used for the band
    pub z: f64,
    /// Square root of the population variance of in-sample errors
    pub error_std: f64,
    /// Mean in-sample error
    pub error_mean: f64,
}

impl ForecastResult {
    /// Combine forecasts, their dates and the in-sample errors.
    ///
    /// `errors` are fitted minus observed values.
    pub fn new(
        dates: Vec<NaiveDate>,
        forecast: Vec<f64>,
        fitted: Vec<f64>,
        errors: &[f64],
        z: f64,
    ) -> Result<Self> {
        if dates.len() != forecast.len() {
            return Err(FitError::InvalidParameter {
                name: "dates".to_string(),
                reason: format!(
                    "{} dates for {} forecast steps",
                    dates.len(),
                    forecast.len()
                ),
            });
        }
        if !(z.is_finite() && z > 0.0) {
            return Err(FitError::InvalidParameter {
                name: "z".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if errors.is_empty() {
            return Err(FitError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }

        let error_std = population_variance(errors).sqrt();
        let error_mean = errors.iter().sum::<f64>() / errors.len() as f64;
        let half_width = z * error_std;

        let points = dates
            .into_iter()
            .zip(forecast)
            .map(|(date, f)| ForecastPoint {
                date,
                forecast: f,
                lower: f - half_width,
                upper: f + half_width,
            })
            .collect();

        Ok(Self {
            points,
            fitted,
            z,
            error_std,
            error_mean,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn half_width(&self) -> f64 {
        self.z * self.error_std
    }
}

/// Last day of each of the `steps` months following the month of `last`.
pub fn forecast_dates(last: NaiveDate, steps: usize) -> Result<Vec<NaiveDate>> {
    let month_start = last.with_day(1).ok_or_else(|| {
        FitError::NumericalError(format!("no first day for month of {}", last))
    })?;

    (1..=steps as u32)
        .map(|h| {
            month_start
                .checked_add_months(Months::new(h + 1))
                .and_then(|d| d.pred_opt())
                .ok_or_else(|| {
                    FitError::NumericalError(format!("date overflow {} months after {}", h, last))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_forecast_dates_are_month_ends() {
        let dates = forecast_dates(date(2024, 12, 1), 3).unwrap();
        assert_eq!(
            dates,
            vec![date(2025, 1, 31), date(2025, 2, 28), date(2025, 3, 31)]
        );
    }

    #[test]
    fn test_forecast_dates_leap_year() {
        let dates = forecast_dates(date(2023, 12, 15), 2).unwrap();
        assert_eq!(dates, vec![date(2024, 1, 31), date(2024, 2, 29)]);
    }

    #[test]
    fn test_forecast_dates_count() {
        assert_eq!(forecast_dates(date(2020, 6, 1), 12).unwrap().len(), 12);
        assert!(forecast_dates(date(2020, 6, 1), 0).unwrap().is_empty());
    }

    #[test]
    fn test_band_is_constant_width() {
        let dates = forecast_dates(date(2024, 1, 1), 3).unwrap();
        // population variance of [1, -1, 1, -1] is 1
        let errors = [1.0, -1.0, 1.0, -1.0];
        let result =
            ForecastResult::new(dates, vec![5.0, 6.0, 7.0], vec![], &errors, Z_95).unwrap();

        assert!((result.error_std - 1.0).abs() < 1e-12);
        assert!(result.error_mean.abs() < 1e-12);
        for p in &result.points {
            assert!((p.upper - p.forecast - 1.96).abs() < 1e-12);
            assert!((p.forecast - p.lower - 1.96).abs() < 1e-12);
        }
    }

    #[test]
    fn test_band_rejects_mismatched_dates() {
        let dates = forecast_dates(date(2024, 1, 1), 2).unwrap();
        assert!(ForecastResult::new(dates, vec![1.0], vec![], &[0.1], Z_95).is_err());
    }

    #[test]
    fn test_band_needs_errors() {
        let err = ForecastResult::new(vec![], vec![], vec![], &[], Z_95).unwrap_err();
        assert!(matches!(err, FitError::InsufficientData { .. }));
    }
}
