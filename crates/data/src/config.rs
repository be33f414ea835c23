//! Fetch configuration types.

use serde::{Deserialize, Serialize};

use crate::bls::{BlsClient, BLS_API_URL};
use crate::error::FetchError;
use crate::model::{YearRange, DEFAULT_SERIES};

/// Configuration for fetching a set of series from the BLS API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Series identifiers, fetched in this order
    pub series_ids: Vec<String>,
    /// First year requested, inclusive
    pub start_year: i32,
    /// Last year requested, inclusive
    pub end_year: i32,
    /// API endpoint
    pub api_url: String,
    /// Optional BLS registration key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_key: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            series_ids: DEFAULT_SERIES.iter().map(|s| s.to_string()).collect(),
            start_year: 2014,
            end_year: 2024,
            api_url: BLS_API_URL.to_string(),
            registration_key: None,
        }
    }
}

impl FetchConfig {
    /// Validated year range.
    pub fn range(&self) -> Result<YearRange, FetchError> {
        YearRange::new(self.start_year, self.end_year)
    }

    /// Client configured for this endpoint and key.
    pub fn client(&self) -> BlsClient {
        let client = BlsClient::with_base_url(&self.api_url);
        match &self.registration_key {
            Some(key) => client.with_registration_key(key),
            None => client,
        }
    }
}

/// Builder for FetchConfig.
#[derive(Debug, Default)]
pub struct FetchConfigBuilder {
    series_ids: Vec<String>,
    start_year: Option<i32>,
    end_year: Option<i32>,
    api_url: Option<String>,
    registration_key: Option<String>,
}

impl FetchConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a series identifier.
    pub fn series(mut self, series_id: &str) -> Self {
        self.series_ids.push(series_id.to_string());
        self
    }

    /// Set the first year.
    pub fn start_year(mut self, year: i32) -> Self {
        self.start_year = Some(year);
        self
    }

    /// Set the last year.
    pub fn end_year(mut self, year: i32) -> Self {
        self.end_year = Some(year);
        self
    }

    /// Override the API endpoint.
    pub fn api_url(mut self, url: &str) -> Self {
        self.api_url = Some(url.to_string());
        self
    }

    /// Set the registration key.
    pub fn registration_key(mut self, key: Option<String>) -> Self {
        self.registration_key = key;
        self
    }

    /// Build the configuration; unset fields take the defaults.
    pub fn build(self) -> Result<FetchConfig, FetchError> {
        let defaults = FetchConfig::default();
        let config = FetchConfig {
            series_ids: if self.series_ids.is_empty() {
                defaults.series_ids
            } else {
                self.series_ids
            },
            start_year: self.start_year.unwrap_or(defaults.start_year),
            end_year: self.end_year.unwrap_or(defaults.end_year),
            api_url: self.api_url.unwrap_or(defaults.api_url),
            registration_key: self.registration_key,
        };
        config.range()?;
        Ok(config)
    }
}
