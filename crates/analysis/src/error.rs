//! Analysis error types
//!
//! `FitError` describes why a single statistical computation failed;
//! `AnalysisError::Fit` wraps it with the pipeline step that raised it.

use std::fmt;

use chrono::NaiveDate;
use cpi_data::TableError;
use serde::Serialize;
use thiserror::Error;

/// Result type alias for single statistical computations
pub type Result<T> = std::result::Result<T, FitError>;

/// Errors that can occur while fitting or testing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    /// Insufficient data points for the operation
    #[error("Insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Model has not been fitted yet
    #[error("Model must be fitted before prediction")]
    NotFitted,

    /// Convergence failure during optimization
    #[error("Optimization failed to converge after {iterations} iterations")]
    ConvergenceFailure { iterations: usize },

    /// Numerical computation error
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// Input outside the domain of a transform
    #[error("Domain error: {0}")]
    DomainError(String),
}

/// Named stage of the statistical study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Step {
    LogTransform,
    Median,
    YearOverYear,
    Regression,
    DurbinWatson,
    LjungBox,
    Anova,
    Levene,
    ShapiroWilk,
    HoltWinters,
    ForecastInterval,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::LogTransform => "log transform",
            Step::Median => "median",
            Step::YearOverYear => "year-over-year change",
            Step::Regression => "OLS regression",
            Step::DurbinWatson => "Durbin-Watson",
            Step::LjungBox => "Ljung-Box test",
            Step::Anova => "one-way ANOVA",
            Step::Levene => "Levene test",
            Step::ShapiroWilk => "Shapiro-Wilk test",
            Step::HoltWinters => "Holt-Winters fit",
            Step::ForecastInterval => "forecast interval",
        };
        f.write_str(name)
    }
}

/// Errors that abort a pipeline run
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// A statistical step failed
    #[error("{step} failed: {source}")]
    Fit { step: Step, source: FitError },

    /// The table could not be loaded
    #[error(transparent)]
    Table(#[from] TableError),

    /// Study configuration is unusable
    #[error("Invalid study configuration: {0}")]
    Config(FitError),

    /// The table has no rows
    #[error("Table has no rows")]
    EmptyTable,

    /// Selected series is not a table column
    #[error("Series '{0}' is not a column of the table")]
    MissingSeries(String),

    /// Selected series has a hole
    #[error("Series '{series_id}' has no value at {date}")]
    MissingValue { series_id: String, date: NaiveDate },

    /// Chart rendering failed
    #[error("Plot rendering failed: {0}")]
    Plot(String),

    /// Report output failed
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    /// Report serialization failed
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Attach a [`Step`] to a fit result.
pub trait StepContext<T> {
    fn at(self, step: Step) -> std::result::Result<T, AnalysisError>;
}

impl<T> StepContext<T> for Result<T> {
    fn at(self, step: Step) -> std::result::Result<T, AnalysisError> {
        self.map_err(|source| AnalysisError::Fit { step, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_data_error_message() {
        let error = FitError::InsufficientData {
            required: 24,
            actual: 10,
        };
        assert_eq!(
            error.to_string(),
            "Insufficient data: need at least 24 points, got 10"
        );
    }

    #[test]
    fn test_step_context_names_step() {
        let result: Result<f64> = Err(FitError::DomainError("ln(-1)".to_string()));
        let err = result.at(Step::LogTransform).unwrap_err();
        assert_eq!(
            err.to_string(),
            "log transform failed: Domain error: ln(-1)"
        );
        assert!(matches!(
            err,
            AnalysisError::Fit {
                step: Step::LogTransform,
                ..
            }
        ));
    }

    #[test]
    fn test_step_context_passes_ok() {
        let result: Result<f64> = Ok(2.0);
        assert_eq!(result.at(Step::Median).unwrap(), 2.0);
    }

    #[test]
    fn test_missing_value_message() {
        let err = AnalysisError::MissingValue {
            series_id: "CUSR0000SEGA".to_string(),
            date: NaiveDate::from_ymd_opt(2020, 4, 1).unwrap(),
        };
        assert_eq!(
            err.to_string(),
            "Series 'CUSR0000SEGA' has no value at 2020-04-01"
        );
    }

    #[test]
    fn test_error_is_std_error() {
        let error: Box<dyn std::error::Error> = Box::new(FitError::NotFitted);
        assert_eq!(error.to_string(), "Model must be fitted before prediction");
    }
}
