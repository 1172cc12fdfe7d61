//! MICE configuration

use crate::error::{ImputeError, Result};
use crate::imputation::{ImputationOrder, InitialStrategy, MissingValues};
use crate::training::{Estimator, Regressor};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Configuration for chained-equations imputation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MiceConfig {
    /// Marker for missing cells
    pub missing_values: MissingValues,

    /// Order in which incomplete features are visited each round
    pub imputation_order: ImputationOrder,

    /// Number of post-burn-in rounds averaged into the result
    pub n_imputations: usize,

    /// Number of leading rounds whose draws are discarded
    pub n_burn_in: usize,

    /// Prototype estimator, cloned and fitted once per imputation step.
    /// Must report a predictive standard deviation.
    pub estimator: Estimator,

    /// Cap on the number of predictors per feature, sampled by correlation
    pub n_nearest_features: Option<usize>,

    /// Statistic used to fill the matrix before the first round
    pub initial_strategy: InitialStrategy,

    /// Lower clip bound for imputed values
    pub min_value: Option<f64>,

    /// Upper clip bound for imputed values
    pub max_value: Option<f64>,

    /// Floor applied to the predictive standard deviation before sampling
    pub min_std: f64,

    /// Report round progress at info level
    pub verbose: bool,

    /// Random seed for reproducibility
    pub random_state: Option<u64>,
}

impl Default for MiceConfig {
    fn default() -> Self {
        Self {
            missing_values: MissingValues::NaN,
            imputation_order: ImputationOrder::Monotone,
            n_imputations: 100,
            n_burn_in: 10,
            estimator: Estimator::default(),
            n_nearest_features: None,
            initial_strategy: InitialStrategy::Mean,
            min_value: None,
            max_value: None,
            min_std: 1e-6,
            verbose: false,
            random_state: None,
        }
    }
}

impl MiceConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing_values(mut self, missing_values: impl Into<MissingValues>) -> Self {
        self.missing_values = missing_values.into();
        self
    }

    pub fn with_imputation_order(mut self, order: ImputationOrder) -> Self {
        self.imputation_order = order;
        self
    }

    pub fn with_n_imputations(mut self, n_imputations: usize) -> Self {
        self.n_imputations = n_imputations;
        self
    }

    pub fn with_n_burn_in(mut self, n_burn_in: usize) -> Self {
        self.n_burn_in = n_burn_in;
        self
    }

    pub fn with_estimator(mut self, estimator: impl Into<Estimator>) -> Self {
        self.estimator = estimator.into();
        self
    }

    pub fn with_n_nearest_features(mut self, n: usize) -> Self {
        self.n_nearest_features = Some(n);
        self
    }

    pub fn with_initial_strategy(mut self, strategy: InitialStrategy) -> Self {
        self.initial_strategy = strategy;
        self
    }

    /// Clip imputed values to `[min_value, max_value]`
    pub fn with_bounds(mut self, min_value: Option<f64>, max_value: Option<f64>) -> Self {
        self.min_value = min_value;
        self.max_value = max_value;
        self
    }

    pub fn with_min_std(mut self, min_std: f64) -> Self {
        self.min_std = min_std;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Total number of rounds (burn-in plus sampling)
    pub fn n_rounds(&self) -> usize {
        self.n_burn_in + self.n_imputations
    }

    /// Random source for one fit or transform call
    pub(crate) fn rng(&self) -> ChaCha8Rng {
        match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    /// Check the configuration before any imputation round runs
    pub fn validate(&self) -> Result<()> {
        if !self.estimator.supports_std() {
            return Err(ImputeError::ConfigError(format!(
                "Estimator {} cannot predict a standard deviation, which posterior sampling requires",
                self.estimator.name()
            )));
        }

        if let (Some(lo), Some(hi)) = (self.min_value, self.max_value) {
            if lo > hi {
                return Err(ImputeError::ConfigError(format!(
                    "min_value ({}) must not exceed max_value ({})",
                    lo, hi
                )));
            }
        }

        if self.n_nearest_features == Some(0) {
            return Err(ImputeError::InvalidParameter {
                name: "n_nearest_features".to_string(),
                value: "0".to_string(),
                reason: "at least one predictor is required".to_string(),
            });
        }

        if !(self.min_std.is_finite() && self.min_std > 0.0) {
            return Err(ImputeError::InvalidParameter {
                name: "min_std".to_string(),
                value: self.min_std.to_string(),
                reason: "must be positive and finite".to_string(),
            });
        }

        Ok(())
    }
}
