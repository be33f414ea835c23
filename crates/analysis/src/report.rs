//! Study and trend reports
//!
//! Plain data carried out of the pipeline: printable through `Display`
//! and serialisable to JSON.

use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::StudyConfig;
use crate::confidence::ForecastResult;
use crate::diagnostics::LjungBoxResult;
use crate::error::AnalysisError;
use crate::hypothesis::TestResult;
use crate::regression::RegressionResult;
use crate::smoothing::SmoothingParams;

/// Descriptive results for one log series.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesSummary {
    pub series_id: String,
    pub median_log: f64,
    pub shapiro_wilk: TestResult,
}

/// Everything the study computes.
#[derive(Debug, Clone, Serialize)]
pub struct StudyReport {
    pub config: StudyConfig,
    pub n_observations: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub dependent: SeriesSummary,
    pub regressor: SeriesSummary,
    pub regression: RegressionResult,
    pub durbin_watson: f64,
    pub ljung_box: LjungBoxResult,
    pub anova: TestResult,
    pub levene: TestResult,
    pub smoothing: SmoothingParams,
    pub forecast: ForecastResult,
}

impl StudyReport {
    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), AnalysisError> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

impl fmt::Display for StudyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Sample: {} observations, {} to {}",
            self.n_observations, self.first_date, self.last_date
        )?;
        writeln!(f)?;
        for summary in [&self.dependent, &self.regressor] {
            writeln!(f, "Median log {}: {:.6}", summary.series_id, summary.median_log)?;
        }

        let reg = &self.regression;
        writeln!(f)?;
        writeln!(
            f,
            "OLS: ln({}) ~ ln({})",
            self.dependent.series_id, self.regressor.series_id
        )?;
        writeln!(
            f,
            "{:<10} {:>12} {:>12} {:>10} {:>10}",
            "", "coef", "std err", "t", "P>|t|"
        )?;
        for (name, c) in [("const", &reg.intercept), ("slope", &reg.slope)] {
            writeln!(
                f,
                "{:<10} {:>12.6} {:>12.6} {:>10.3} {:>10.4}",
                name, c.estimate, c.std_error, c.t_value, c.p_value
            )?;
        }
        writeln!(
            f,
            "R-squared: {:.4}  Adj. R-squared: {:.4}  F: {:.3} (p = {:.4e})",
            reg.r_squared, reg.adj_r_squared, reg.f_statistic, reg.f_p_value
        )?;

        writeln!(f)?;
        writeln!(f, "Durbin-Watson: {:.2}", self.durbin_watson)?;
        writeln!(
            f,
            "Ljung-Box (lag {}): Q = {:.4}, p = {:.4e}",
            self.ljung_box.lags, self.ljung_box.statistic, self.ljung_box.p_value
        )?;
        writeln!(
            f,
            "ANOVA: F = {:.4}, p = {:.4e}",
            self.anova.statistic, self.anova.p_value
        )?;
        writeln!(
            f,
            "Levene: W = {:.4}, p = {:.4e}",
            self.levene.statistic, self.levene.p_value
        )?;
        for summary in [&self.dependent, &self.regressor] {
            writeln!(
                f,
                "Shapiro-Wilk {}: W = {:.4}, p = {:.4e}",
                summary.series_id, summary.shapiro_wilk.statistic, summary.shapiro_wilk.p_value
            )?;
        }

        let s = &self.smoothing;
        writeln!(f)?;
        writeln!(
            f,
            "Holt-Winters (additive, period {}): alpha = {:.4}, beta = {:.4}, gamma = {:.4}",
            self.config.seasonal_period, s.alpha, s.beta, s.gamma
        )?;
        writeln!(
            f,
            "Forecast of ln({}) with +/- {:.2} sd band:",
            self.dependent.series_id, self.forecast.z
        )?;
        for p in &self.forecast.points {
            writeln!(
                f,
                "  {}  {:.6}  [{:.6}, {:.6}]",
                p.date, p.forecast, p.lower, p.upper
            )?;
        }
        Ok(())
    }
}

/// One month of the trend report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
    /// Percent change against twelve months earlier
    pub yoy_pct_change: Option<f64>,
}

/// Level and year-over-year change of one series.
#[derive(Debug, Clone, Serialize)]
pub struct TrendReport {
    pub series_id: String,
    pub since: NaiveDate,
    pub points: Vec<TrendPoint>,
}

impl TrendReport {
    /// Most recent point with a year-over-year value.
    pub fn latest_change(&self) -> Option<&TrendPoint> {
        self.points.iter().rev().find(|p| p.yoy_pct_change.is_some())
    }
}

impl fmt::Display for TrendReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} since {}", self.series_id, self.since)?;
        writeln!(f, "{:<12} {:>12} {:>10}", "date", "value", "YoY %")?;
        for p in &self.points {
            let value = p.value.map_or_else(|| "-".to_string(), |v| format!("{:.3}", v));
            let yoy = p
                .yoy_pct_change
                .map_or_else(|| "-".to_string(), |v| format!("{:.2}", v));
            writeln!(f, "{:<12} {:>12} {:>10}", p.date.to_string(), value, yoy)?;
        }
        Ok(())
    }
}
