//! Observation and range types shared by the fetcher and the table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// CPI all items, seasonally adjusted.
pub const CPI_ALL_ITEMS: &str = "CUSR0000SA0";
/// CPI all items less food and energy, seasonally adjusted.
pub const CPI_CORE: &str = "CUSR0000SA0L1E";
/// CPI gasoline (all types), seasonally adjusted.
pub const CPI_GASOLINE: &str = "CUSR0000SEGA";

/// Series fetched when no identifiers are given.
pub const DEFAULT_SERIES: [&str; 3] = [CPI_ALL_ITEMS, CPI_CORE, CPI_GASOLINE];

/// A single monthly value of one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Series identifier, e.g. `CUSR0000SA0`
    pub series_id: String,
    /// First day of the observed month
    pub date: NaiveDate,
    /// Index value
    pub value: f64,
}

impl Observation {
    /// Create a new observation.
    pub fn new(series_id: impl Into<String>, date: NaiveDate, value: f64) -> Self {
        Self {
            series_id: series_id.into(),
            date,
            value,
        }
    }
}

/// Inclusive range of calendar years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    start: i32,
    end: i32,
}

impl YearRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: i32, end: i32) -> Result<Self, FetchError> {
        if start > end {
            return Err(FetchError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// First year, inclusive.
    pub fn start(&self) -> i32 {
        self.start
    }

    /// Last year, inclusive.
    pub fn end(&self) -> i32 {
        self.end
    }

    /// Whether `year` falls inside the range.
    pub fn contains(&self, year: i32) -> bool {
        (self.start..=self.end).contains(&year)
    }

    /// Number of calendar years covered.
    pub fn years(&self) -> usize {
        (self.end - self.start + 1) as usize
    }
}

/// One non-missing value of a single table column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}
