//! # cpi-analysis
//!
//! Statistical study over the CPI wide table: log transform and medians,
//! OLS of one log series on another with residual diagnostics, group and
//! normality tests, and an additive Holt-Winters forecast with a
//! constant-width band. Also builds the year-over-year trend report.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cpi_analysis::prelude::*;
//!
//! let study = run_study_from_csv("cpi_data.csv", &StudyConfig::default()).unwrap();
//! println!("{}", study.report);
//! ```

pub mod confidence;
pub mod config;
pub mod diagnostics;
pub mod distributions;
mod error;
pub mod features;
pub mod hypothesis;
pub mod optimization;
pub mod pipeline;
#[cfg(feature = "plot")]
pub mod plot;
pub mod regression;
pub mod report;
pub mod smoothing;

pub use error::{AnalysisError, FitError, Result, Step, StepContext};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{StudyConfig, TrendConfig};
    pub use crate::pipeline::{run_study, run_study_from_csv, trend_report, Study};
    pub use crate::report::{StudyReport, TrendReport};
    pub use crate::smoothing::{HoltWinters, Predictor};
    pub use crate::{AnalysisError, FitError};

    #[cfg(feature = "plot")]
    pub use crate::plot::{render_study, render_trend};
}
