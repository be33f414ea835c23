//! Data error types.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while retrieving one series from an upstream source.
///
/// A `FetchError` only ever concerns a single series identifier; callers
/// such as [`crate::fetch_all`] log it and move on to the next series.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("Request failed for {series_id}: {reason}")]
    RequestFailed { series_id: String, reason: String },

    /// Response body was not the expected JSON document
    #[error("Parse error for {series_id}: {reason}")]
    ParseError { series_id: String, reason: String },

    /// Response lacked the `Results` field
    #[error("No results for {series_id}: {}", .message.join("; "))]
    MissingResults {
        series_id: String,
        message: Vec<String>,
    },

    /// Response contained no observations
    #[error("No data returned for {0}")]
    NoData(String),

    /// A data record had an unexpected shape
    #[error("Malformed record for {series_id}: {reason}")]
    MalformedRecord { series_id: String, reason: String },

    /// Start year after end year
    #[error("Invalid year range: {start} > {end}")]
    InvalidRange { start: i32, end: i32 },
}

/// Errors raised while building, reading or writing a [`crate::WideTable`].
#[derive(Debug, Error)]
pub enum TableError {
    /// Underlying file access failed
    #[error("Failed to access table file: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader or writer failed (includes ragged rows)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// First header cell is not `date`
    #[error("Table header must start with 'date', got {0:?}")]
    MissingDateColumn(Option<String>),

    /// A header names the same series twice
    #[error("Duplicate column '{0}' in table header")]
    DuplicateColumn(String),

    /// Date cell is not an ISO `YYYY-MM-DD` date
    #[error("Invalid date '{value}' on line {line}")]
    InvalidDate { line: u64, value: String },

    /// Value cell is neither empty nor a number
    #[error("Invalid value '{value}' for {column} on line {line}")]
    InvalidValue {
        line: u64,
        column: String,
        value: String,
    },

    /// Two rows share a date
    #[error("Duplicate date {0} in table")]
    DuplicateDate(NaiveDate),

    /// Row width differs from the header
    #[error("Row {date} has {actual} values, expected {expected}")]
    RowWidth {
        date: NaiveDate,
        expected: usize,
        actual: usize,
    },
}

/// Errors raised by read-only table queries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Requested series is not a column of the table
    #[error("Series ID not found: {0}")]
    NotFound(String),

    /// Range bounds are not ISO dates
    #[error("Invalid date range: {start} to {end}")]
    InvalidDateRange { start: String, end: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_failed_error() {
        let error = FetchError::RequestFailed {
            series_id: "CUSR0000SA0".to_string(),
            reason: "Connection timeout".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Request failed for CUSR0000SA0: Connection timeout"
        );
    }

    #[test]
    fn test_missing_results_joins_messages() {
        let error = FetchError::MissingResults {
            series_id: "BOGUS".to_string(),
            message: vec![
                "Series does not exist".to_string(),
                "Daily threshold reached".to_string(),
            ],
        };
        assert_eq!(
            error.to_string(),
            "No results for BOGUS: Series does not exist; Daily threshold reached"
        );
    }

    #[test]
    fn test_invalid_range_error() {
        let error = FetchError::InvalidRange {
            start: 2024,
            end: 2014,
        };
        assert_eq!(error.to_string(), "Invalid year range: 2024 > 2014");
    }

    #[test]
    fn test_duplicate_date_error() {
        let date = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let error = TableError::DuplicateDate(date);
        assert_eq!(error.to_string(), "Duplicate date 2020-03-01 in table");
    }

    #[test]
    fn test_query_not_found_error() {
        let error = QueryError::NotFound("BOGUS".to_string());
        assert_eq!(error.to_string(), "Series ID not found: BOGUS");
    }

    #[test]
    fn test_error_is_std_error() {
        let error: Box<dyn std::error::Error> = Box::new(FetchError::NoData("X".to_string()));
        assert_eq!(error.to_string(), "No data returned for X");
    }
}
