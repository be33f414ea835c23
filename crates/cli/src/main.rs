//! # cpi-cli
//!
//! Command-line interface: fetch CPI series into the wide table, run the
//! study or the trend report on it, and serve it over HTTP.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use cpi_analysis::prelude::*;
use cpi_data::{
    fetch_all, FetchConfigBuilder, WideTable, BLS_API_URL, CPI_ALL_ITEMS, CPI_CORE, CPI_GASOLINE,
    DEFAULT_SERIES,
};
use cpi_server::{ServerConfig, DEFAULT_DATA_PATH};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cpi")]
#[command(about = "BLS CPI fetch, analysis and query CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch series from the BLS API and write the wide CSV table
    Fetch {
        /// Series identifier (repeatable)
        #[arg(short, long = "series", default_values_t = DEFAULT_SERIES.map(String::from))]
        series: Vec<String>,

        /// First year, inclusive
        #[arg(long, default_value_t = 2014)]
        start_year: i32,

        /// Last year, inclusive
        #[arg(long, default_value_t = 2024)]
        end_year: i32,

        /// Output CSV file
        #[arg(short, long, env = "CPI_DATA_PATH", default_value = DEFAULT_DATA_PATH)]
        output: PathBuf,

        /// API endpoint
        #[arg(long, default_value = BLS_API_URL)]
        api_url: String,

        /// BLS registration key
        #[arg(long, env = "BLS_API_KEY", hide_env_values = true)]
        registration_key: Option<String>,
    },

    /// Level and year-over-year change of one series
    Trend {
        /// Input CSV table
        #[arg(short, long, env = "CPI_DATA_PATH", default_value = DEFAULT_DATA_PATH)]
        input: PathBuf,

        /// Series identifier
        #[arg(short, long, default_value = CPI_CORE)]
        series: String,

        /// First date shown (YYYY-MM-DD)
        #[arg(long, default_value = "2019-01-01")]
        since: NaiveDate,

        /// Directory for the SVG chart
        #[arg(long)]
        plots: Option<PathBuf>,
    },

    /// Regression, diagnostics, tests and Holt-Winters forecast
    Analyze {
        /// Input CSV table
        #[arg(short, long, env = "CPI_DATA_PATH", default_value = DEFAULT_DATA_PATH)]
        input: PathBuf,

        /// Response series (also forecast)
        #[arg(long, default_value = CPI_ALL_ITEMS)]
        dependent: String,

        /// Explanatory series
        #[arg(long, default_value = CPI_GASOLINE)]
        regressor: String,

        /// Forecast horizon in months
        #[arg(long, default_value_t = 12)]
        steps: usize,

        /// Directory for SVG charts
        #[arg(long)]
        plots: Option<PathBuf>,

        /// Write the full report as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start the HTTP query server
    Serve {
        /// Input CSV table
        #[arg(short, long, env = "CPI_DATA_PATH", default_value = DEFAULT_DATA_PATH)]
        input: PathBuf,

        /// Host to bind to
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = 8080)]
        port: u16,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// Run fetch command
fn run_fetch(
    series: Vec<String>,
    start_year: i32,
    end_year: i32,
    output: &Path,
    api_url: &str,
    registration_key: Option<String>,
) -> Result<()> {
    let config = series
        .iter()
        .fold(FetchConfigBuilder::new(), |b, id| b.series(id))
        .start_year(start_year)
        .end_year(end_year)
        .api_url(api_url)
        .registration_key(registration_key)
        .build()?;
    let range = config.range()?;

    let outcome = fetch_all(&config.client(), &config.series_ids, &range);
    if outcome.observations.is_empty() {
        bail!("no series could be fetched from {}", config.api_url);
    }

    let table = WideTable::pivot(&outcome.observations);
    table
        .write_csv(output)
        .with_context(|| format!("writing {}", output.display()))?;

    println!(
        "Wrote {} rows x {} series to {}",
        table.len(),
        table.columns().len(),
        output.display()
    );
    if !outcome.skipped.is_empty() {
        tracing::warn!(
            skipped = outcome.skipped.len(),
            fetched = table.columns().len(),
            "table written without every requested series"
        );
    }
    Ok(())
}

/// Run trend command
fn run_trend(input: &Path, series: String, since: NaiveDate, plots: Option<PathBuf>) -> Result<()> {
    let table =
        WideTable::read_csv(input).with_context(|| format!("reading {}", input.display()))?;
    let config = TrendConfig {
        series_id: series,
        since,
    };

    let report = trend_report(&table, &config)?;
    print!("{}", report);

    if let Some(dir) = plots {
        let path = render_trend(&report, &dir)?;
        println!("Chart written to {}", path.display());
    }
    Ok(())
}

/// Run analyze command
fn run_analyze(
    input: &Path,
    dependent: String,
    regressor: String,
    steps: usize,
    plots: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let config = StudyConfig {
        dependent,
        regressor,
        forecast_steps: steps,
        ..StudyConfig::default()
    };

    let study = run_study_from_csv(input, &config)
        .with_context(|| format!("analysing {}", input.display()))?;
    print!("{}", study.report);

    if let Some(dir) = plots {
        for path in render_study(&study, &dir)? {
            println!("Chart written to {}", path.display());
        }
    }
    if let Some(path) = output {
        study
            .report
            .write_json(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

/// Run serve command
fn run_serve(input: PathBuf, host: String, port: u16) -> Result<()> {
    let config = ServerConfig {
        host,
        port,
        data_path: input,
    };
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(cpi_server::serve(config))?;
    Ok(())
}

fn main() -> Result<()> {
    // Load .env file (optional - won't fail if missing)
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            series,
            start_year,
            end_year,
            output,
            api_url,
            registration_key,
        } => run_fetch(
            series,
            start_year,
            end_year,
            &output,
            &api_url,
            registration_key,
        ),

        Commands::Trend {
            input,
            series,
            since,
            plots,
        } => run_trend(&input, series, since, plots),

        Commands::Analyze {
            input,
            dependent,
            regressor,
            steps,
            plots,
            output,
        } => run_analyze(&input, dependent, regressor, steps, plots, output),

        Commands::Serve { input, host, port } => run_serve(input, host, port),
    }
}
