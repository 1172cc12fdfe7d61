//! Kolosal Impute - Multivariate missing-value imputation
//!
//! This crate fills missing cells of numeric matrices by chained equations
//! (MICE): every incomplete feature is regressed on the others, round after
//! round, and missing cells are replaced by draws from the regressor's
//! predictive distribution. Draws collected after a burn-in are averaged,
//! and the fitted sequence of regressions can be replayed on new data.
//!
//! # Modules
//!
//! - [`imputation`] - MICE engine, initial column imputer, ordering and
//!   neighbor policies, Rubin's pooling rules
//! - [`training`] - Regressors with predictive uncertainty (Bayesian ridge,
//!   Gaussian process) used by the engine
//! - [`error`] - Error type shared by the crate
//!
//! # Example
//!
//! ```
//! use kolosal_impute::prelude::*;
//! use ndarray::array;
//!
//! let x = array![
//!     [1.0, 2.0],
//!     [2.0, f64::NAN],
//!     [3.0, 6.0],
//!     [4.0, 8.0],
//! ];
//!
//! let config = MiceConfig::new()
//!     .with_n_burn_in(5)
//!     .with_n_imputations(5)
//!     .with_random_state(42);
//! let mut imputer = MICEImputer::with_config(config);
//! let completed = imputer.fit_transform(&x).unwrap();
//! assert!(!completed.iter().any(|v| v.is_nan()));
//! ```

// Core error handling
pub mod error;

pub mod imputation;
pub mod training;

pub use error::{ImputeError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{ImputeError, Result};

    // Imputation
    pub use crate::imputation::pooling::{pool, pool_columns, PooledEstimate};
    pub use crate::imputation::{
        ImputationOrder, ImputationStep, Imputer, InitialStrategy, MICEImputer, MiceConfig,
        MissingValues, SimpleImputer,
    };

    // Estimators
    pub use crate::training::{
        BayesianRidge, ConstantRegressor, Estimator, GaussianProcessRegressor, LinearRegression,
        Regressor,
    };
}
