//! Series source trait and the sequential fetch loop.

use tracing::{info, warn};

use crate::error::FetchError;
use crate::model::{Observation, YearRange};

/// Trait for upstream providers of monthly series.
///
/// Implementations issue exactly one request per call and return the
/// normalized observations of that series, ascending by date.
pub trait SeriesSource: Send + Sync {
    /// Source name, used in log fields.
    fn name(&self) -> &str;

    /// Fetch one series over an inclusive year range.
    fn fetch_series(
        &self,
        series_id: &str,
        range: &YearRange,
    ) -> Result<Vec<Observation>, FetchError>;
}

/// Result of fetching several series in sequence.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// Observations of every series that succeeded, in request order
    pub observations: Vec<Observation>,
    /// Series that were skipped, with the reason
    pub skipped: Vec<(String, FetchError)>,
}

impl FetchOutcome {
    /// Identifiers that produced at least one observation.
    pub fn fetched_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for obs in &self.observations {
            if !ids.contains(&obs.series_id.as_str()) {
                ids.push(&obs.series_id);
            }
        }
        ids
    }
}

/// Fetch every identifier one after another.
///
/// A failing series is logged and skipped; it never aborts the run.
pub fn fetch_all<S>(source: &S, series_ids: &[String], range: &YearRange) -> FetchOutcome
where
    S: SeriesSource + ?Sized,
{
    let mut outcome = FetchOutcome::default();

    for series_id in series_ids {
        match source.fetch_series(series_id, range) {
            Ok(observations) => {
                info!(
                    source = source.name(),
                    series_id = %series_id,
                    count = observations.len(),
                    "fetched series"
                );
                outcome.observations.extend(observations);
            }
            Err(err) => {
                warn!(
                    source = source.name(),
                    series_id = %series_id,
                    error = %err,
                    "skipping series"
                );
                outcome.skipped.push((series_id.clone(), err));
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    struct StaticSource;

    impl SeriesSource for StaticSource {
        fn name(&self) -> &str {
            "static"
        }

        fn fetch_series(
            &self,
            series_id: &str,
            range: &YearRange,
        ) -> Result<Vec<Observation>, FetchError> {
            if series_id == "BOGUS" {
                return Err(FetchError::MissingResults {
                    series_id: series_id.to_string(),
                    message: vec!["Series does not exist".to_string()],
                });
            }
            Ok((1..=12)
                .map(|month| {
                    let date = NaiveDate::from_ymd_opt(range.start(), month, 1).unwrap();
                    Observation::new(series_id, date, 100.0 + month as f64)
                })
                .collect())
        }
    }

    #[test]
    fn test_fetch_all_skips_failures() {
        let range = YearRange::new(2020, 2020).unwrap();
        let ids = vec!["A".to_string(), "BOGUS".to_string(), "B".to_string()];

        let outcome = fetch_all(&StaticSource, &ids, &range);

        assert_eq!(outcome.observations.len(), 24);
        assert_eq!(outcome.fetched_ids(), vec!["A", "B"]);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].0, "BOGUS");
    }

    #[test]
    fn test_fetch_all_empty_ids() {
        let range = YearRange::new(2020, 2021).unwrap();
        let outcome = fetch_all(&StaticSource, &[], &range);
        assert!(outcome.observations.is_empty());
        assert!(outcome.skipped.is_empty());
    }
}
