//! Wide monthly table: one row per date, one column per series.
//!
//! The table is built once from fetched observations, written to CSV, and
//! read back by every downstream consumer. Missing values are kept as
//! `None` in memory and as empty fields on disk.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::TableError;
use crate::model::Observation;

/// Header of the date column.
pub const DATE_COLUMN: &str = "date";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One dated row of the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub date: NaiveDate,
    /// One slot per table column, in column order
    pub values: Vec<Option<f64>>,
}

/// Date-indexed table of several monthly series.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WideTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl WideTable {
    /// Pivot observations into one row per date.
    ///
    /// Columns are the distinct series ids in ascending order. When the same
    /// (date, series) pair appears twice, the later observation wins.
    pub fn pivot(observations: &[Observation]) -> Self {
        let columns: Vec<String> = observations
            .iter()
            .map(|o| o.series_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let width = columns.len();

        let mut by_date: BTreeMap<NaiveDate, Vec<Option<f64>>> = BTreeMap::new();
        for obs in observations {
            // Columns hold every series id seen above, so the search hits.
            if let Ok(col) = columns.binary_search(&obs.series_id) {
                let slot = by_date.entry(obs.date).or_insert_with(|| vec![None; width]);
                slot[col] = Some(obs.value);
            }
        }

        let rows = by_date
            .into_iter()
            .map(|(date, values)| Row { date, values })
            .collect();

        Self { columns, rows }
    }

    /// Assemble a table from parts, sorting rows by date.
    ///
    /// Fails on duplicate columns, duplicate dates or rows whose width
    /// differs from the column count.
    pub fn from_parts(columns: Vec<String>, mut rows: Vec<Row>) -> Result<Self, TableError> {
        let mut seen = BTreeSet::new();
        for column in &columns {
            if !seen.insert(column.as_str()) {
                return Err(TableError::DuplicateColumn(column.clone()));
            }
        }

        for row in &rows {
            if row.values.len() != columns.len() {
                return Err(TableError::RowWidth {
                    date: row.date,
                    expected: columns.len(),
                    actual: row.values.len(),
                });
            }
        }

        rows.sort_by_key(|r| r.date);
        if let Some(pair) = rows.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(TableError::DuplicateDate(pair[0].date));
        }

        Ok(Self { columns, rows })
    }

    /// Series identifiers, in column order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows, ascending by date.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether `series_id` is a column.
    pub fn contains(&self, series_id: &str) -> bool {
        self.column_index(series_id).is_some()
    }

    /// Position of a column.
    pub fn column_index(&self, series_id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == series_id)
    }

    /// All slots of one column, aligned with [`WideTable::dates`].
    pub fn column(&self, series_id: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(series_id)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// Row dates.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }

    /// Last row date, if any.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// Write the table to a CSV file.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), TableError> {
        let file = File::create(path)?;
        self.to_writer(BufWriter::new(file))
    }

    /// Write the table as CSV to any writer.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut csv = csv::Writer::from_writer(writer);

        let mut header = Vec::with_capacity(self.columns.len() + 1);
        header.push(DATE_COLUMN);
        header.extend(self.columns.iter().map(String::as_str));
        csv.write_record(&header)?;

        for row in &self.rows {
            let mut record = Vec::with_capacity(row.values.len() + 1);
            record.push(row.date.format(DATE_FORMAT).to_string());
            record.extend(
                row.values
                    .iter()
                    .map(|v| v.map(|x| x.to_string()).unwrap_or_default()),
            );
            csv.write_record(&record)?;
        }

        csv.flush()?;
        Ok(())
    }

    /// Read a table from a CSV file.
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Read a CSV table from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut csv = csv::Reader::from_reader(reader);

        let headers = csv.headers()?.clone();
        let mut fields = headers.iter();
        match fields.next() {
            Some(DATE_COLUMN) => {}
            other => return Err(TableError::MissingDateColumn(other.map(String::from))),
        }
        let columns: Vec<String> = fields.map(|h| h.trim().to_string()).collect();

        let mut rows = Vec::new();
        for result in csv.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            let raw_date = record.get(0).unwrap_or_default().trim();
            let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|_| {
                TableError::InvalidDate {
                    line,
                    value: raw_date.to_string(),
                }
            })?;

            let mut values = Vec::with_capacity(columns.len());
            for (column, raw) in columns.iter().zip(record.iter().skip(1)) {
                values.push(parse_cell(raw).ok_or_else(|| TableError::InvalidValue {
                    line,
                    column: column.clone(),
                    value: raw.to_string(),
                })?);
            }

            rows.push(Row { date, values });
        }

        Self::from_parts(columns, rows)
    }
}

/// Empty and NaN cells are missing; anything else must be a number.
fn parse_cell(raw: &str) -> Option<Option<f64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(None);
    }
    let value: f64 = raw.parse().ok()?;
    Some(if value.is_nan() { None } else { Some(value) })
}
