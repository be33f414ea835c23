//! Read-only views over a [`WideTable`].

use chrono::NaiveDate;

use crate::error::QueryError;
use crate::model::SeriesPoint;
use crate::table::WideTable;

// Strict `YYYY-MM-DD`; chrono alone also takes unpadded fields.
fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let bytes = s.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

impl WideTable {
    /// Non-missing values of one series.
    pub fn series(&self, series_id: &str) -> Result<Vec<SeriesPoint>, QueryError> {
        let idx = self
            .column_index(series_id)
            .ok_or_else(|| QueryError::NotFound(series_id.to_string()))?;

        Ok(self
            .rows()
            .iter()
            .filter_map(|row| {
                row.values[idx].map(|value| SeriesPoint {
                    date: row.date,
                    value,
                })
            })
            .collect())
    }

    /// Non-missing values of one series with `start <= date <= end`.
    ///
    /// Bounds must be ISO `YYYY-MM-DD` dates. A reversed range is not an
    /// error; it simply matches nothing.
    pub fn series_between(
        &self,
        series_id: &str,
        start: &str,
        end: &str,
    ) -> Result<Vec<SeriesPoint>, QueryError> {
        let points = self.series(series_id)?;

        let (Some(start_date), Some(end_date)) = (parse_iso_date(start), parse_iso_date(end))
        else {
            return Err(QueryError::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        };

        Ok(points
            .into_iter()
            .filter(|p| start_date <= p.date && p.date <= end_date)
            .collect())
    }
}
