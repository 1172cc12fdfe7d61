//! Missing-value sentinel and indicator mask

use crate::error::{ImputeError, Result};
use ndarray::{Array2, ArrayBase, Data, Ix2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marker identifying a missing cell
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum MissingValues {
    /// Cells holding NaN are missing
    #[default]
    NaN,
    /// Cells equal to this placeholder are missing
    Value(f64),
}

impl MissingValues {
    /// Check whether a single value is missing
    #[inline]
    pub fn is_missing(&self, v: f64) -> bool {
        match *self {
            MissingValues::NaN => v.is_nan(),
            MissingValues::Value(sentinel) if sentinel.is_nan() => v.is_nan(),
            MissingValues::Value(sentinel) => v == sentinel,
        }
    }
}

impl fmt::Display for MissingValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingValues::NaN => write!(f, "NaN"),
            MissingValues::Value(v) => write!(f, "{}", v),
        }
    }
}

impl FromStr for MissingValues {
    type Err = ImputeError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("nan") {
            return Ok(MissingValues::NaN);
        }
        trimmed
            .parse::<f64>()
            .map(|v| if v.is_nan() { MissingValues::NaN } else { MissingValues::Value(v) })
            .map_err(|_| ImputeError::ConfigError(format!("Unsupported missing value marker: {}", s)))
    }
}

impl From<f64> for MissingValues {
    fn from(v: f64) -> Self {
        if v.is_nan() {
            MissingValues::NaN
        } else {
            MissingValues::Value(v)
        }
    }
}

/// Boolean matrix that is `true` wherever `x` holds the missing marker
pub fn get_mask<S>(x: &ArrayBase<S, Ix2>, missing_values: MissingValues) -> Array2<bool>
where
    S: Data<Elem = f64>,
{
    x.mapv(|v| missing_values.is_missing(v))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_nan_mask() {
        let x = array![[1.0, f64::NAN], [f64::NAN, 0.0]];
        let mask = get_mask(&x, MissingValues::NaN);
        assert_eq!(mask, array![[false, true], [true, false]]);
    }

    #[test]
    fn test_value_mask() {
        let x = array![[0.0, f64::NAN], [-1.0, 0.0]];
        let mask = get_mask(&x, MissingValues::Value(0.0));
        assert_eq!(mask, array![[true, false], [false, true]]);
    }

    #[test]
    fn test_nan_value_sentinel_behaves_like_nan() {
        let x = array![[f64::NAN, 2.0]];
        let mask = get_mask(&x, MissingValues::Value(f64::NAN));
        assert_eq!(mask, array![[true, false]]);
    }

    #[test]
    fn test_parse_sentinel() {
        assert_eq!("NaN".parse::<MissingValues>().unwrap(), MissingValues::NaN);
        assert_eq!("-1".parse::<MissingValues>().unwrap(), MissingValues::Value(-1.0));
        assert!(matches!(
            "missing".parse::<MissingValues>(),
            Err(ImputeError::ConfigError(_))
        ));
    }
}
