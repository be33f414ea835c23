//! # cpi-data
//!
//! Fetches monthly CPI series from the BLS public API and reshapes them into
//! a wide, date-indexed table persisted as CSV.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cpi_data::{fetch_all, FetchConfig, WideTable};
//!
//! let config = FetchConfig::default();
//! let outcome = fetch_all(&config.client(), &config.series_ids, &config.range().unwrap());
//! let table = WideTable::pivot(&outcome.observations);
//! table.write_csv("cpi_data.csv").unwrap();
//! ```

pub mod bls;
pub mod config;
pub mod error;
pub mod model;
mod query;
pub mod source;
pub mod table;

pub use bls::{parse_response, BlsClient, BLS_API_URL};
pub use config::{FetchConfig, FetchConfigBuilder};
pub use error::{FetchError, QueryError, TableError};
pub use model::{
    Observation, SeriesPoint, YearRange, CPI_ALL_ITEMS, CPI_CORE, CPI_GASOLINE, DEFAULT_SERIES,
};
pub use source::{fetch_all, FetchOutcome, SeriesSource};
pub use table::{Row, WideTable, DATE_COLUMN};
