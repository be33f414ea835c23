//! SVG charts for the study and the trend report.

use std::fmt::Display;
use std::ops::Range;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::info;

use crate::error::AnalysisError;
use crate::pipeline::Study;
use crate::report::TrendReport;

const SIZE: (u32, u32) = (1200, 700);
const HISTOGRAM_BINS: usize = 20;

type Render = fn(&Study, &Path) -> Result<(), AnalysisError>;

const STUDY_CHARTS: [(&str, Render); 4] = [
    ("histograms.svg", histograms),
    ("log_series.svg", log_series),
    ("regression.svg", regression),
    ("forecast.svg", forecast),
];

fn plot_err<E: Display>(e: E) -> AnalysisError {
    AnalysisError::Plot(e.to_string())
}

/// Month as a fractional year, for the x axis.
pub fn year_fraction(date: NaiveDate) -> f64 {
    date.year() as f64 + date.month0() as f64 / 12.0
}

/// Padded range covering every finite value.
fn span(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return 0.0..1.0;
    }
    let pad = if hi > lo {
        (hi - lo) * 0.05
    } else {
        lo.abs().max(1.0) * 0.05
    };
    (lo - pad)..(hi + pad)
}

/// Render every study chart into `dir`, returning the written paths.
pub fn render_study(study: &Study, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, AnalysisError> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(STUDY_CHARTS.len());
    for (name, render) in STUDY_CHARTS {
        let path = dir.join(name);
        render(study, &path)?;
        info!(path = %path.display(), "chart written");
        written.push(path);
    }
    Ok(written)
}

fn histograms(study: &Study, path: &Path) -> Result<(), AnalysisError> {
    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let panels = root.split_evenly((2, 1));

    let report = &study.report;
    histogram_panel(
        &panels[0],
        &report.dependent.series_id,
        &study.series.dependent,
        report.dependent.median_log,
    )?;
    histogram_panel(
        &panels[1],
        &report.regressor.series_id,
        &study.series.regressor,
        report.regressor.median_log,
    )?;

    root.present().map_err(plot_err)
}

fn histogram_panel(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    series_id: &str,
    data: &[f64],
    median: f64,
) -> Result<(), AnalysisError> {
    let x = span(data.iter().copied());
    let width = (x.end - x.start) / HISTOGRAM_BINS as f64;
    let mut counts = [0usize; HISTOGRAM_BINS];
    for v in data {
        let bin = ((v - x.start) / width) as usize;
        counts[bin.min(HISTOGRAM_BINS - 1)] += 1;
    }
    let top = counts.iter().copied().max().unwrap_or(0) as f64 * 1.1 + 1.0;

    let mut chart = ChartBuilder::on(area)
        .caption(format!("Distribution of log {}", series_id), ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d(x.clone(), 0.0..top)
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc("Log CPI value")
        .y_desc("Frequency")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(counts.iter().enumerate().map(|(i, &count)| {
            let left = x.start + i as f64 * width;
            Rectangle::new([(left, 0.0), (left + width, count as f64)], BLUE.mix(0.6).filled())
        }))
        .map_err(plot_err)?;
    chart
        .draw_series(LineSeries::new(
            vec![(median, 0.0), (median, top)],
            RED.stroke_width(2),
        ))
        .map_err(plot_err)?;
    Ok(())
}

fn log_series(study: &Study, path: &Path) -> Result<(), AnalysisError> {
    let series = &study.series;
    let report = &study.report;
    let xs: Vec<f64> = series.dates.iter().map(|d| year_fraction(*d)).collect();

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!(
                "Log {} vs log {}",
                report.dependent.series_id, report.regressor.series_id
            ),
            ("sans-serif", 26),
        )
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(55)
        .build_cartesian_2d(
            span(xs.iter().copied()),
            span(series.dependent.iter().chain(&series.regressor).copied()),
        )
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Log CPI value")
        .draw()
        .map_err(plot_err)?;

    for (values, color, label) in [
        (&series.dependent, BLUE, &report.dependent.series_id),
        (&series.regressor, GREEN, &report.regressor.series_id),
    ] {
        chart
            .draw_series(LineSeries::new(
                xs.iter().copied().zip(values.iter().copied()),
                color.stroke_width(2),
            ))
            .map_err(plot_err)?
            .label(format!("log {}", label))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
    }
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)
}

fn regression(study: &Study, path: &Path) -> Result<(), AnalysisError> {
    let series = &study.series;
    let report = &study.report;
    let x_range = span(series.regressor.iter().copied());

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!(
                "ln({}) = {:.4} + {:.4} ln({})",
                report.dependent.series_id,
                report.regression.intercept.estimate,
                report.regression.slope.estimate,
                report.regressor.series_id
            ),
            ("sans-serif", 26),
        )
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(55)
        .build_cartesian_2d(
            x_range.clone(),
            span(series.dependent.iter().chain(&report.regression.fitted).copied()),
        )
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc(format!("Log {}", report.regressor.series_id))
        .y_desc(format!("Log {}", report.dependent.series_id))
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(
            series
                .regressor
                .iter()
                .zip(&series.dependent)
                .map(|(&x, &y)| Circle::new((x, y), 3, BLUE.mix(0.5).filled())),
        )
        .map_err(plot_err)?;

    let ends = [x_range.start, x_range.end];
    let line = report.regression.predict(&ends);
    chart
        .draw_series(LineSeries::new(
            ends.into_iter().zip(line),
            RED.stroke_width(2),
        ))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)
}

fn forecast(study: &Study, path: &Path) -> Result<(), AnalysisError> {
    let series = &study.series;
    let report = &study.report;
    let points = &report.forecast.points;

    let observed: Vec<(f64, f64)> = series
        .dates
        .iter()
        .map(|d| year_fraction(*d))
        .zip(series.dependent.iter().copied())
        .collect();
    let ahead: Vec<(f64, f64)> = points
        .iter()
        .map(|p| (year_fraction(p.date), p.forecast))
        .collect();
    let mut band: Vec<(f64, f64)> = points
        .iter()
        .map(|p| (year_fraction(p.date), p.upper))
        .collect();
    band.extend(points.iter().rev().map(|p| (year_fraction(p.date), p.lower)));

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!(
                "Holt-Winters forecast of log {} with {:.2} sd band",
                report.dependent.series_id, report.forecast.z
            ),
            ("sans-serif", 26),
        )
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(55)
        .build_cartesian_2d(
            span(observed.iter().chain(&band).map(|p| p.0)),
            span(observed.iter().chain(&band).map(|p| p.1)),
        )
        .map_err(plot_err)?;
    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Log CPI value")
        .draw()
        .map_err(plot_err)?;

    if !band.is_empty() {
        chart
            .draw_series(std::iter::once(Polygon::new(band, RED.mix(0.2).filled())))
            .map_err(plot_err)?;
    }
    chart
        .draw_series(LineSeries::new(observed, BLUE.stroke_width(2)))
        .map_err(plot_err)?
        .label("observed")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));
    chart
        .draw_series(LineSeries::new(ahead, RED.stroke_width(2)))
        .map_err(plot_err)?
        .label("forecast")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)
}

/// Render the level and year-over-year change on two y axes.
pub fn render_trend(report: &TrendReport, dir: impl AsRef<Path>) -> Result<PathBuf, AnalysisError> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let path = dir.join("trend.svg");

    let levels: Vec<(f64, f64)> = report
        .points
        .iter()
        .filter_map(|p| Some((year_fraction(p.date), p.value?)))
        .collect();
    let changes: Vec<(f64, f64)> = report
        .points
        .iter()
        .filter_map(|p| Some((year_fraction(p.date), p.yoy_pct_change?)))
        .collect();
    let x_range = span(report.points.iter().map(|p| year_fraction(p.date)));

    {
        let root = SVGBackend::new(&path, SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(plot_err)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("{} since {}", report.series_id, report.since),
                ("sans-serif", 26),
            )
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .right_y_label_area_size(60)
            .build_cartesian_2d(x_range.clone(), span(levels.iter().map(|p| p.1)))
            .map_err(plot_err)?
            .set_secondary_coord(x_range, span(changes.iter().map(|p| p.1)));

        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("CPI value")
            .draw()
            .map_err(plot_err)?;
        chart
            .configure_secondary_axes()
            .y_desc("Year-over-year % change")
            .draw()
            .map_err(plot_err)?;

        chart
            .draw_series(LineSeries::new(levels, BLUE.stroke_width(2)))
            .map_err(plot_err)?
            .label(report.series_id.clone())
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));
        chart
            .draw_secondary_series(LineSeries::new(changes, RED.stroke_width(2)))
            .map_err(plot_err)?
            .label("YoY % change")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(plot_err)?;

        root.present().map_err(plot_err)?;
    }

    info!(path = %path.display(), "chart written");
    Ok(path)
}
