//! BLS public time-series API client
//!
//! Fetches monthly series from the Bureau of Labor Statistics v2 API, one
//! request per series identifier.
//!
//! # Example
//!
//! ```rust,no_run
//! use cpi_data::{BlsClient, SeriesSource, YearRange, CPI_ALL_ITEMS};
//!
//! let client = BlsClient::new();
//! let range = YearRange::new(2014, 2024).unwrap();
//! let observations = client.fetch_series(CPI_ALL_ITEMS, &range).unwrap();
//! println!("Got {} monthly values", observations.len());
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::model::{Observation, YearRange};
#[cfg(feature = "fetch")]
use crate::source::SeriesSource;

/// Default BLS v2 endpoint.
pub const BLS_API_URL: &str = "https://api.bls.gov/publicAPI/v2/timeseries/data/";

#[cfg(feature = "fetch")]
const USER_AGENT: &str = concat!("cpi-ts/", env!("CARGO_PKG_VERSION"));

/// Request body posted for a single series.
#[derive(Debug, Serialize)]
struct BlsRequest<'a> {
    seriesid: [&'a str; 1],
    startyear: String,
    endyear: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    registrationkey: Option<&'a str>,
}

impl<'a> BlsRequest<'a> {
    fn new(series_id: &'a str, range: &YearRange, registration_key: Option<&'a str>) -> Self {
        Self {
            seriesid: [series_id],
            startyear: range.start().to_string(),
            endyear: range.end().to_string(),
            registrationkey: registration_key,
        }
    }
}

/// BLS API response structures
#[derive(Debug, Deserialize)]
struct BlsResponse {
    #[serde(default)]
    message: Vec<String>,
    #[serde(rename = "Results")]
    results: Option<BlsResults>,
}

#[derive(Debug, Deserialize)]
struct BlsResults {
    series: Vec<BlsSeries>,
}

#[derive(Debug, Deserialize)]
struct BlsSeries {
    data: Vec<BlsRecord>,
}

#[derive(Debug, Deserialize)]
struct BlsRecord {
    year: String,
    period: String,
    value: String,
}

impl BlsRecord {
    /// Convert to an observation; `None` for annual-average records.
    fn normalize(&self, series_id: &str) -> Result<Option<Observation>, FetchError> {
        let malformed = |reason: String| FetchError::MalformedRecord {
            series_id: series_id.to_string(),
            reason,
        };

        let Some(month) = parse_period(&self.period).map_err(malformed)? else {
            return Ok(None);
        };
        let year: i32 = self
            .year
            .trim()
            .parse()
            .map_err(|_| malformed(format!("invalid year '{}'", self.year)))?;
        let value: f64 = self
            .value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| malformed(format!("invalid value '{}'", self.value)))?;
        let date = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| malformed(format!("invalid date {}-{:02}", year, month)))?;

        Ok(Some(Observation::new(series_id, date, value)))
    }
}

/// Parse a BLS period code into a calendar month.
///
/// `"M01"`..`"M12"` map to 1..12. `"M13"` is the annual average and maps
/// to `None`. Anything else is an error.
pub fn parse_period(period: &str) -> Result<Option<u32>, String> {
    let digits = period
        .strip_prefix('M')
        .filter(|d| d.len() == 2)
        .ok_or_else(|| format!("unsupported period '{}'", period))?;
    let month: u32 = digits
        .parse()
        .map_err(|_| format!("unsupported period '{}'", period))?;

    match month {
        1..=12 => Ok(Some(month)),
        13 => Ok(None),
        _ => Err(format!("unsupported period '{}'", period)),
    }
}

/// Parse a BLS response body into observations sorted by date.
pub fn parse_response(series_id: &str, json: &str) -> Result<Vec<Observation>, FetchError> {
    let response: BlsResponse =
        serde_json::from_str(json).map_err(|e| FetchError::ParseError {
            series_id: series_id.to_string(),
            reason: e.to_string(),
        })?;

    let results = response
        .results
        .ok_or_else(|| FetchError::MissingResults {
            series_id: series_id.to_string(),
            message: response.message,
        })?;
    let series = results
        .series
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::NoData(series_id.to_string()))?;

    let mut observations = Vec::with_capacity(series.data.len());
    for record in &series.data {
        if let Some(obs) = record.normalize(series_id)? {
            observations.push(obs);
        }
    }

    if observations.is_empty() {
        return Err(FetchError::NoData(series_id.to_string()));
    }

    observations.sort_by_key(|o| o.date);
    Ok(observations)
}

/// BLS API client
#[derive(Debug, Clone)]
pub struct BlsClient {
    base_url: String,
    registration_key: Option<String>,
}

impl Default for BlsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BlsClient {
    /// Create a client for the public endpoint.
    pub fn new() -> Self {
        Self::with_base_url(BLS_API_URL)
    }

    /// Create a client for another endpoint (mirrors, test servers).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            registration_key: None,
        }
    }

    /// Attach a registration key, raising the API's daily limits.
    pub fn with_registration_key(mut self, key: impl Into<String>) -> Self {
        self.registration_key = Some(key.into());
        self
    }

    /// Endpoint URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one series (blocking)
    #[cfg(feature = "fetch")]
    pub fn fetch_blocking(
        &self,
        series_id: &str,
        range: &YearRange,
    ) -> Result<Vec<Observation>, FetchError> {
        let request_failed = |e: reqwest::Error| FetchError::RequestFailed {
            series_id: series_id.to_string(),
            reason: e.to_string(),
        };

        let body = BlsRequest::new(series_id, range, self.registration_key.as_deref());
        tracing::debug!(series_id, url = %self.base_url, "posting series request");

        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(request_failed)?;

        let text = client
            .post(&self.base_url)
            .json(&body)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.text())
            .map_err(request_failed)?;

        parse_response(series_id, &text)
    }
}

#[cfg(feature = "fetch")]
impl SeriesSource for BlsClient {
    fn name(&self) -> &str {
        "bls"
    }

    fn fetch_series(
        &self,
        series_id: &str,
        range: &YearRange,
    ) -> Result<Vec<Observation>, FetchError> {
        self.fetch_blocking(series_id, range)
    }
}
