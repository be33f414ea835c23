//! Study and trend report configuration.

use chrono::NaiveDate;
use cpi_data::{CPI_ALL_ITEMS, CPI_CORE, CPI_GASOLINE};
use serde::{Deserialize, Serialize};

use crate::confidence::Z_95;
use crate::error::{FitError, Result};

/// Inputs of the regression, diagnostics and forecast study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    /// Response series of the regression; also the forecast target
    pub dependent: String,
    /// Explanatory series
    pub regressor: String,
    /// Forecast horizon in months
    pub forecast_steps: usize,
    /// Seasonal period of the smoothing model
    pub seasonal_period: usize,
    /// Lag of the Ljung-Box test
    pub ljung_box_lags: usize,
    /// Critical value of the forecast band
    pub z: f64,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            dependent: CPI_ALL_ITEMS.to_string(),
            regressor: CPI_GASOLINE.to_string(),
            forecast_steps: 12,
            seasonal_period: 12,
            ljung_box_lags: 12,
            z: Z_95,
        }
    }
}

impl StudyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dependent == self.regressor {
            return Err(FitError::InvalidParameter {
                name: "regressor".to_string(),
                reason: "must differ from the dependent series".to_string(),
            });
        }
        if self.seasonal_period < 2 {
            return Err(FitError::InvalidParameter {
                name: "seasonal_period".to_string(),
                reason: "must be at least 2".to_string(),
            });
        }
        if self.ljung_box_lags == 0 {
            return Err(FitError::InvalidParameter {
                name: "ljung_box_lags".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if !(self.z.is_finite() && self.z > 0.0) {
            return Err(FitError::InvalidParameter {
                name: "z".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Inputs of the year-over-year trend report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub series_id: String,
    /// First date shown; earlier rows still feed the lag
    pub since: NaiveDate,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            series_id: CPI_CORE.to_string(),
            since: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_study_defaults() {
        let config = StudyConfig::default();
        assert_eq!(config.dependent, "CUSR0000SA0");
        assert_eq!(config.regressor, "CUSR0000SEGA");
        assert_eq!(config.forecast_steps, 12);
        assert_eq!(config.z, 1.96);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_study_rejects_same_series() {
        let config = StudyConfig {
            regressor: CPI_ALL_ITEMS.to_string(),
            ..StudyConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_study_partial_json_uses_defaults() {
        let config: StudyConfig = serde_json::from_str(r#"{"forecast_steps": 6}"#).unwrap();
        assert_eq!(config.forecast_steps, 6);
        assert_eq!(config.ljung_box_lags, 12);
    }

    #[test]
    fn test_trend_defaults() {
        let config = TrendConfig::default();
        assert_eq!(config.series_id, "CUSR0000SA0L1E");
        assert_eq!(config.since.to_string(), "2019-01-01");
    }
}
