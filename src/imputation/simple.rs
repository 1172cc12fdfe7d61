//! Single-pass statistic imputer
//!
//! Fills every missing cell with a per-column (or per-row) statistic of the
//! observed values. Columns without any observed value at fit time carry a
//! NaN statistic and are dropped on transform.

use crate::error::{ImputeError, Result};
use crate::imputation::{get_mask, Imputer, InitialStrategy, MissingValues};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Axis along which statistics are computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImputeAxis {
    /// One statistic per column, learned at fit time
    #[default]
    Columns,
    /// One statistic per row, recomputed on every transform
    Rows,
}

/// Mean / median / most-frequent imputer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleImputer {
    strategy: InitialStrategy,
    missing_values: MissingValues,
    axis: ImputeAxis,
    verbose: bool,
    /// Per-column fill values (NaN for columns with no observed value)
    #[serde(with = "nan_as_none")]
    statistics: Option<Array1<f64>>,
    n_features_in: Option<usize>,
}

impl Default for SimpleImputer {
    fn default() -> Self {
        Self::new(InitialStrategy::Mean)
    }
}

impl SimpleImputer {
    /// Create new imputer with the given strategy
    pub fn new(strategy: InitialStrategy) -> Self {
        Self {
            strategy,
            missing_values: MissingValues::NaN,
            axis: ImputeAxis::Columns,
            verbose: false,
            statistics: None,
            n_features_in: None,
        }
    }

    /// Set missing value marker
    pub fn with_missing_values(mut self, missing_values: MissingValues) -> Self {
        self.missing_values = missing_values;
        self
    }

    /// Set statistic axis
    pub fn with_axis(mut self, axis: ImputeAxis) -> Self {
        self.axis = axis;
        self
    }

    /// Report dropped columns as warnings
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn strategy(&self) -> InitialStrategy {
        self.strategy
    }

    pub fn missing_values(&self) -> MissingValues {
        self.missing_values
    }

    /// Fitted per-column statistics (column axis only)
    pub fn statistics(&self) -> Option<&Array1<f64>> {
        self.statistics.as_ref()
    }

    /// Indices of the columns kept on transform
    pub fn valid_features(&self) -> Result<Vec<usize>> {
        match self.axis {
            ImputeAxis::Columns => {
                let stats = self.statistics.as_ref().ok_or(ImputeError::ModelNotFitted)?;
                Ok(stats
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| !s.is_nan())
                    .map(|(i, _)| i)
                    .collect())
            }
            ImputeAxis::Rows => {
                let n = self.n_features_in.ok_or(ImputeError::ModelNotFitted)?;
                Ok((0..n).collect())
            }
        }
    }

    /// Statistic of the observed entries of one lane, NaN if none observed
    fn lane_statistic(&self, lane: ArrayView1<f64>) -> f64 {
        let mut observed: Vec<f64> = lane
            .iter()
            .copied()
            // NaN never counts as observed, even under a numeric sentinel
            .filter(|&v| !self.missing_values.is_missing(v) && !v.is_nan())
            .collect();

        match self.strategy {
            InitialStrategy::Mean => mean(&observed),
            InitialStrategy::Median => median(&mut observed),
            InitialStrategy::MostFrequent => most_frequent(&mut observed),
        }
    }

    fn statistics_along(&self, x: &Array2<f64>, axis: Axis) -> Array1<f64> {
        x.lanes(axis)
            .into_iter()
            .map(|lane| self.lane_statistic(lane))
            .collect()
    }

    /// Impute in place; the matrix is replaced when columns are dropped
    pub fn transform_inplace(&self, x: &mut Array2<f64>) -> Result<()> {
        match self.axis {
            ImputeAxis::Columns => {
                let stats = self.statistics.as_ref().ok_or(ImputeError::ModelNotFitted)?;
                self.check_n_features(x, stats.len())?;

                if stats.iter().any(|s| s.is_nan()) {
                    *x = self.transform(x)?;
                    return Ok(());
                }

                let missing_values = self.missing_values;
                for (mut column, &fill) in x.columns_mut().into_iter().zip(stats.iter()) {
                    column.mapv_inplace(|v| if missing_values.is_missing(v) { fill } else { v });
                }
                Ok(())
            }
            ImputeAxis::Rows => {
                let stats = self.row_statistics(x)?;
                let missing_values = self.missing_values;
                for (mut row, &fill) in x.rows_mut().into_iter().zip(stats.iter()) {
                    row.mapv_inplace(|v| if missing_values.is_missing(v) { fill } else { v });
                }
                Ok(())
            }
        }
    }

    fn check_n_features(&self, x: &Array2<f64>, expected: usize) -> Result<()> {
        if x.ncols() != expected {
            return Err(ImputeError::ShapeError {
                expected: format!("{} features", expected),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(())
    }

    fn row_statistics(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let stats = self.statistics_along(x, Axis(1));
        let empty_rows: Vec<usize> = stats
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_nan())
            .map(|(i, _)| i)
            .collect();
        if !empty_rows.is_empty() {
            return Err(ImputeError::DataError(format!(
                "Some rows only contain missing values: {:?}",
                empty_rows
            )));
        }
        Ok(stats)
    }
}

impl Imputer for SimpleImputer {
    fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        self.n_features_in = Some(x.ncols());
        self.statistics = match self.axis {
            ImputeAxis::Columns => Some(self.statistics_along(x, Axis(0))),
            // row statistics depend on the rows being transformed
            ImputeAxis::Rows => None,
        };
        Ok(())
    }

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        match self.axis {
            ImputeAxis::Columns => {
                let stats = self.statistics.as_ref().ok_or(ImputeError::ModelNotFitted)?;
                self.check_n_features(x, stats.len())?;

                let valid = self.valid_features()?;
                if valid.len() < stats.len() {
                    let dropped: Vec<usize> = (0..stats.len()).filter(|i| !valid.contains(i)).collect();
                    if self.verbose {
                        warn!("Deleting features without observed values: {:?}", dropped);
                    } else {
                        debug!("Deleting features without observed values: {:?}", dropped);
                    }
                }

                let mut result = x.select(Axis(1), &valid);
                let mask = get_mask(&result, self.missing_values);
                for (j, &col_idx) in valid.iter().enumerate() {
                    let fill = stats[col_idx];
                    for i in 0..result.nrows() {
                        if mask[[i, j]] {
                            result[[i, j]] = fill;
                        }
                    }
                }
                Ok(result)
            }
            ImputeAxis::Rows => {
                if self.n_features_in.is_none() {
                    return Err(ImputeError::ModelNotFitted);
                }
                let mut result = x.clone();
                self.transform_inplace(&mut result)?;
                Ok(result)
            }
        }
    }
}

/// JSON has no NaN, so invalid statistics travel as `null`
mod nan_as_none {
    use ndarray::Array1;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(stats: &Option<Array1<f64>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded: Option<Vec<Option<f64>>> = stats
            .as_ref()
            .map(|s| s.iter().map(|&v| if v.is_nan() { None } else { Some(v) }).collect());
        encoded.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Array1<f64>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let decoded: Option<Vec<Option<f64>>> = Option::deserialize(deserializer)?;
        Ok(decoded.map(|s| s.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect()))
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

fn most_frequent(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(|a, b| a.total_cmp(b));

    // ascending scan keeps the smallest value on count ties
    let mut best = values[0];
    let mut best_count = 0;
    let mut start = 0;
    while start < values.len() {
        let mut end = start + 1;
        while end < values.len() && values[end] == values[start] {
            end += 1;
        }
        if end - start > best_count {
            best_count = end - start;
            best = values[start];
        }
        start = end;
    }
    best
}
