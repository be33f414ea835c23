//! The statistical study and the trend report
//!
//! Each stage runs in order; the first failure aborts the run and is
//! reported with the stage that raised it.

use std::path::Path;

use chrono::NaiveDate;
use cpi_data::WideTable;
use tracing::{debug, info};

use crate::confidence::{forecast_dates, ForecastResult};
use crate::config::{StudyConfig, TrendConfig};
use crate::diagnostics::{durbin_watson, ljung_box};
use crate::error::{AnalysisError, FitError, Step, StepContext};
use crate::features::{log_transform, median, year_over_year};
use crate::hypothesis::{levene, one_way_anova, shapiro_wilk};
use crate::regression::ols_fit;
use crate::report::{SeriesSummary, StudyReport, TrendPoint, TrendReport};
use crate::smoothing::{HoltWinters, Predictor};

/// Log-transformed inputs of a study, aligned by date.
#[derive(Debug, Clone)]
pub struct LogSeries {
    pub dates: Vec<NaiveDate>,
    pub dependent: Vec<f64>,
    pub regressor: Vec<f64>,
}

/// Report plus the log series it was computed from.
#[derive(Debug, Clone)]
pub struct Study {
    pub series: LogSeries,
    pub report: StudyReport,
}

/// Values of one column, failing on the first hole.
pub fn complete_series(table: &WideTable, series_id: &str) -> Result<Vec<f64>, AnalysisError> {
    let column = table
        .column(series_id)
        .ok_or_else(|| AnalysisError::MissingSeries(series_id.to_string()))?;

    column
        .into_iter()
        .zip(table.rows())
        .map(|(value, row)| {
            value.ok_or_else(|| AnalysisError::MissingValue {
                series_id: series_id.to_string(),
                date: row.date,
            })
        })
        .collect()
}

/// Run every stage of the study on `table`.
pub fn run_study(table: &WideTable, config: &StudyConfig) -> Result<Study, AnalysisError> {
    config.validate().map_err(AnalysisError::Config)?;

    let raw_dependent = complete_series(table, &config.dependent)?;
    let raw_regressor = complete_series(table, &config.regressor)?;
    let dates = table.dates();
    let (first_date, last_date) = match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(AnalysisError::EmptyTable),
    };
    info!(
        rows = dates.len(),
        dependent = %config.dependent,
        regressor = %config.regressor,
        "starting study"
    );

    let dependent = log_transform(&raw_dependent).at(Step::LogTransform)?;
    let regressor = log_transform(&raw_regressor).at(Step::LogTransform)?;

    let median_dependent = median(&dependent).at(Step::Median)?;
    let median_regressor = median(&regressor).at(Step::Median)?;
    info!(median_dependent, median_regressor, "medians computed");

    let regression = ols_fit(&regressor, &dependent).at(Step::Regression)?;
    info!(
        intercept = regression.intercept.estimate,
        slope = regression.slope.estimate,
        r_squared = regression.r_squared,
        "regression fitted"
    );

    let dw = durbin_watson(&regression.residuals).at(Step::DurbinWatson)?;
    let lb = ljung_box(&regression.residuals, config.ljung_box_lags).at(Step::LjungBox)?;
    info!(durbin_watson = dw, ljung_box_q = lb.statistic, "residual diagnostics done");

    let anova = one_way_anova(&[&dependent, &regressor]).at(Step::Anova)?;
    let equal_variance = levene(&[&dependent, &regressor]).at(Step::Levene)?;
    let shapiro_dependent = shapiro_wilk(&dependent).at(Step::ShapiroWilk)?;
    let shapiro_regressor = shapiro_wilk(&regressor).at(Step::ShapiroWilk)?;
    debug!(
        anova_f = anova.statistic,
        levene_w = equal_variance.statistic,
        "group tests done"
    );

    let mut model = HoltWinters::new(config.seasonal_period).at(Step::HoltWinters)?;
    model.fit(&dependent).at(Step::HoltWinters)?;
    let smoothing = model
        .params()
        .ok_or(FitError::NotFitted)
        .at(Step::HoltWinters)?;
    let points = model.predict(config.forecast_steps).at(Step::HoltWinters)?;
    let fitted = model.fitted_values().at(Step::HoltWinters)?.to_vec();
    let errors = model.residuals().at(Step::HoltWinters)?;
    info!(
        alpha = smoothing.alpha,
        beta = smoothing.beta,
        gamma = smoothing.gamma,
        "smoothing model fitted"
    );

    let horizon = forecast_dates(last_date, config.forecast_steps).at(Step::ForecastInterval)?;
    let forecast = ForecastResult::new(horizon, points, fitted, &errors, config.z)
        .at(Step::ForecastInterval)?;
    info!(
        steps = forecast.len(),
        half_width = forecast.half_width(),
        "forecast ready"
    );

    let report = StudyReport {
        config: config.clone(),
        n_observations: dates.len(),
        first_date,
        last_date,
        dependent: SeriesSummary {
            series_id: config.dependent.clone(),
            median_log: median_dependent,
            shapiro_wilk: shapiro_dependent,
        },
        regressor: SeriesSummary {
            series_id: config.regressor.clone(),
            median_log: median_regressor,
            shapiro_wilk: shapiro_regressor,
        },
        regression,
        durbin_watson: dw,
        ljung_box: lb,
        anova,
        levene: equal_variance,
        smoothing,
        forecast,
    };

    Ok(Study {
        series: LogSeries {
            dates,
            dependent,
            regressor,
        },
        report,
    })
}

/// Load the table from `path` and run the study on it.
pub fn run_study_from_csv(
    path: impl AsRef<Path>,
    config: &StudyConfig,
) -> Result<Study, AnalysisError> {
    let path = path.as_ref();
    let table = WideTable::read_csv(path)?;
    info!(path = %path.display(), rows = table.len(), "table loaded");
    run_study(&table, config)
}

/// Level and year-over-year change of one series from `config.since` on.
///
/// The change is computed over the whole column first, so the first shown
/// months still compare against the year before `since`.
pub fn trend_report(table: &WideTable, config: &TrendConfig) -> Result<TrendReport, AnalysisError> {
    let column = table
        .column(&config.series_id)
        .ok_or_else(|| AnalysisError::MissingSeries(config.series_id.clone()))?;
    let yoy = year_over_year(&column);

    let points: Vec<TrendPoint> = table
        .rows()
        .iter()
        .zip(column)
        .zip(yoy)
        .filter(|((row, _), _)| row.date >= config.since)
        .map(|((row, value), yoy_pct_change)| TrendPoint {
            date: row.date,
            value,
            yoy_pct_change,
        })
        .collect();
    info!(series = %config.series_id, points = points.len(), "trend report built");

    Ok(TrendReport {
        series_id: config.series_id.clone(),
        since: config.since,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpi_data::Observation;

    fn table_with_hole() -> WideTable {
        let d = |m| NaiveDate::from_ymd_opt(2020, m, 1).unwrap();
        WideTable::pivot(&[
            Observation::new("A", d(1), 1.0),
            Observation::new("A", d(2), 2.0),
            Observation::new("B", d(1), 3.0),
        ])
    }

    #[test]
    fn test_complete_series_reports_hole() {
        let table = table_with_hole();
        assert_eq!(complete_series(&table, "A").unwrap(), vec![1.0, 2.0]);
        match complete_series(&table, "B").unwrap_err() {
            AnalysisError::MissingValue { series_id, date } => {
                assert_eq!(series_id, "B");
                assert_eq!(date.to_string(), "2020-02-01");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_complete_series_unknown_column() {
        assert!(matches!(
            complete_series(&table_with_hole(), "C"),
            Err(AnalysisError::MissingSeries(id)) if id == "C"
        ));
    }

    #[test]
    fn test_trend_report_keeps_lag_context() {
        let obs: Vec<Observation> = (0..36)
            .map(|i| {
                let date = NaiveDate::from_ymd_opt(2017 + i / 12, (i % 12) as u32 + 1, 1).unwrap();
                Observation::new("CORE", date, 100.0 + i as f64)
            })
            .collect();
        let table = WideTable::pivot(&obs);
        let config = TrendConfig {
            series_id: "CORE".to_string(),
            since: NaiveDate::from_ymd_opt(2018, 1, 1).unwrap(),
        };

        let report = trend_report(&table, &config).unwrap();

        assert_eq!(report.points.len(), 24);
        assert_eq!(report.points[0].date.to_string(), "2018-01-01");
        let first = report.points[0].yoy_pct_change.unwrap();
        assert!((first - 12.0).abs() < 1e-10);
    }
}
