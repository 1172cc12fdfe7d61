//! Missing-value imputation
//!
//! Provides:
//! - MICE (Multiple Imputation by Chained Equations) with posterior sampling
//! - Single-pass column statistic imputation (mean, median, most frequent)
//! - Rubin's rules for pooling estimates across imputed datasets

mod config;
mod mask;
mod mice;
mod neighbors;
mod order;
mod simple;
pub mod pooling;

pub use config::MiceConfig;
pub use mask::{get_mask, MissingValues};
pub use mice::{ImputationStep, MICEImputer};
pub use neighbors::{abs_correlation_matrix, neighbor_features};
pub use order::ImputationOrder;
pub use simple::{ImputeAxis, SimpleImputer};

use crate::error::{ImputeError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Strategy for the initial single-pass imputation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InitialStrategy {
    /// Mean of the observed values
    #[default]
    Mean,
    /// Median of the observed values
    Median,
    /// Most frequent observed value, smallest value on ties
    MostFrequent,
}

impl fmt::Display for InitialStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InitialStrategy::Mean => "mean",
            InitialStrategy::Median => "median",
            InitialStrategy::MostFrequent => "most_frequent",
        };
        f.write_str(name)
    }
}

impl FromStr for InitialStrategy {
    type Err = ImputeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mean" => Ok(InitialStrategy::Mean),
            "median" => Ok(InitialStrategy::Median),
            "most_frequent" => Ok(InitialStrategy::MostFrequent),
            other => Err(ImputeError::ConfigError(format!(
                "Unsupported initial strategy '{}', expected one of mean, median, most_frequent",
                other
            ))),
        }
    }
}

/// Trait for imputers
pub trait Imputer {
    /// Fit the imputer on data with missing values
    fn fit(&mut self, x: &Array2<f64>) -> Result<()>;

    /// Transform data by imputing missing values
    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>>;

    /// Fit and transform in one step
    fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}
