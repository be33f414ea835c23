//! Derived features and descriptive statistics
//!
//! Log transform, order-statistic median and lag-12 percent change, plus the
//! small moments helpers the tests and models share.

use crate::error::{FitError, Result};

/// Lag used for year-over-year change on monthly data.
pub const YEAR_LAG: usize = 12;

/// Natural log of every value.
///
/// Fails on the first value that is not strictly positive instead of
/// producing NaN or -inf.
pub fn log_transform(data: &[f64]) -> Result<Vec<f64>> {
    data.iter()
        .enumerate()
        .map(|(i, &x)| {
            if x > 0.0 && x.is_finite() {
                Ok(x.ln())
            } else {
                Err(FitError::DomainError(format!(
                    "ln undefined for value {} at position {}",
                    x, i
                )))
            }
        })
        .collect()
}

/// Order-statistic median; mean of the two middle values for even lengths.
pub fn median(data: &[f64]) -> Result<f64> {
    if data.is_empty() {
        return Err(FitError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }
    if data.iter().any(|x| x.is_nan()) {
        return Err(FitError::NumericalError("median of data containing NaN".to_string()));
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    Ok(if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    })
}

/// Percent change against the value `lag` rows earlier.
///
/// The first `lag` slots are `None`, as is any slot where either operand is
/// missing or the base value is zero.
pub fn pct_change(data: &[Option<f64>], lag: usize) -> Vec<Option<f64>> {
    (0..data.len())
        .map(|t| {
            let current = data[t]?;
            let base = data[t.checked_sub(lag)?]?;
            if base == 0.0 {
                None
            } else {
                Some((current - base) / base * 100.0)
            }
        })
        .collect()
}

/// Year-over-year percent change of a monthly series.
pub fn year_over_year(data: &[Option<f64>]) -> Vec<Option<f64>> {
    pct_change(data, YEAR_LAG)
}

/// Arithmetic mean; NaN for empty input.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Population variance (divisor n).
pub fn population_variance(data: &[f64]) -> f64 {
    let m = mean(data);
    data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_transform() {
        let logs = log_transform(&[1.0, std::f64::consts::E, 100.0]).unwrap();
        assert!((logs[0] - 0.0).abs() < 1e-12);
        assert!((logs[1] - 1.0).abs() < 1e-12);
        assert!((logs[2] - 100f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_log_transform_rejects_non_positive() {
        let err = log_transform(&[3.0, 0.0, 2.0]).unwrap_err();
        assert!(matches!(err, FitError::DomainError(ref msg) if msg.contains("position 1")));
        assert!(log_transform(&[-1.0]).is_err());
        assert!(log_transform(&[f64::NAN]).is_err());
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[3.0, 1.0, 2.0]).unwrap(), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]).unwrap(), 2.5);
        assert_eq!(median(&[7.0]).unwrap(), 7.0);
    }

    #[test]
    fn test_median_empty() {
        assert!(matches!(
            median(&[]),
            Err(FitError::InsufficientData { required: 1, actual: 0 })
        ));
    }

    #[test]
    fn test_year_over_year_constant_series() {
        let data = vec![Some(100.0); 30];
        let yoy = year_over_year(&data);

        assert_eq!(yoy.len(), 30);
        assert!(yoy[..12].iter().all(Option::is_none));
        assert!(yoy[12..].iter().all(|v| *v == Some(0.0)));
    }

    #[test]
    fn test_year_over_year_growth() {
        let data: Vec<Option<f64>> = (0..24).map(|i| Some(if i < 12 { 100.0 } else { 103.0 })).collect();
        let yoy = year_over_year(&data);
        for v in &yoy[12..] {
            assert!((v.unwrap() - 3.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_pct_change_propagates_missing() {
        let data = vec![Some(100.0), None, Some(110.0), Some(121.0)];
        let change = pct_change(&data, 1);
        assert_eq!(change[0], None);
        assert_eq!(change[1], None);
        assert_eq!(change[2], None);
        assert!((change[3].unwrap() - 10.0).abs() < 1e-10);
    }

    #[test]
    fn test_mean_and_population_variance() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&data), 5.0);
        assert!((population_variance(&data) - 4.0).abs() < 1e-12);
    }
}
