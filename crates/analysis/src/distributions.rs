//! Tail probabilities for the reference distributions used by the tests.

use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal, StudentsT};

use crate::error::{FitError, Result};

fn numerical(e: impl std::fmt::Display) -> FitError {
    FitError::NumericalError(e.to_string())
}

/// Two-sided p-value of a t statistic with `df` degrees of freedom.
pub fn student_t_two_sided(t: f64, df: f64) -> Result<f64> {
    if t.is_nan() {
        return Ok(f64::NAN);
    }
    if t.is_infinite() {
        return Ok(0.0);
    }
    let dist = StudentsT::new(0.0, 1.0, df).map_err(numerical)?;
    Ok((2.0 * dist.sf(t.abs())).min(1.0))
}

/// Upper-tail probability of a chi-squared statistic.
pub fn chi_squared_sf(x: f64, df: f64) -> Result<f64> {
    if x <= 0.0 {
        return Ok(1.0);
    }
    let dist = ChiSquared::new(df).map_err(numerical)?;
    Ok(dist.sf(x))
}

/// Upper-tail probability of an F statistic.
pub fn f_sf(f: f64, d1: f64, d2: f64) -> Result<f64> {
    if f.is_nan() {
        return Ok(f64::NAN);
    }
    if f <= 0.0 {
        return Ok(1.0);
    }
    if f.is_infinite() {
        return Ok(0.0);
    }
    let dist = FisherSnedecor::new(d1, d2).map_err(numerical)?;
    Ok(dist.sf(f))
}

/// Upper-tail probability of a standard normal deviate.
pub fn normal_sf(z: f64) -> f64 {
    Normal::standard().sf(z)
}

/// Standard normal quantile.
pub fn normal_quantile(p: f64) -> f64 {
    Normal::standard().inverse_cdf(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_t_two_sided() {
        assert!((student_t_two_sided(0.0, 10.0).unwrap() - 1.0).abs() < 1e-12);
        // t(0.975, 10) = 2.228139
        assert!((student_t_two_sided(2.228139, 10.0).unwrap() - 0.05).abs() < 1e-5);
        assert_eq!(student_t_two_sided(f64::INFINITY, 10.0).unwrap(), 0.0);
    }

    #[test]
    fn test_chi_squared_sf() {
        // chi2(0.95, 12) = 21.02607
        assert!((chi_squared_sf(21.02607, 12.0).unwrap() - 0.05).abs() < 1e-5);
        assert_eq!(chi_squared_sf(0.0, 12.0).unwrap(), 1.0);
    }

    #[test]
    fn test_f_sf() {
        // F(0.95; 1, 20) = 4.351244
        assert!((f_sf(4.351244, 1.0, 20.0).unwrap() - 0.05).abs() < 1e-5);
        assert_eq!(f_sf(0.0, 1.0, 20.0).unwrap(), 1.0);
    }

    #[test]
    fn test_normal() {
        assert!((normal_sf(1.959964) - 0.025).abs() < 1e-6);
        assert!((normal_quantile(0.975) - 1.959964).abs() < 1e-5);
    }

    #[test]
    fn test_invalid_df_is_error() {
        assert!(student_t_two_sided(1.0, 0.0).is_err());
        assert!(chi_squared_sf(1.0, -1.0).is_err());
    }
}
