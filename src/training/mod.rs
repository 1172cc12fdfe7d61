//! Regression estimators used by the imputation engine
//!
//! Provides:
//! - Bayesian ridge regression (default MICE estimator)
//! - Gaussian process regression
//! - Ordinary / ridge least squares (point predictions only)
//! - Constant predictor for zero-variance targets

mod linalg;
pub mod bayesian_ridge;
pub mod dummy;
pub mod gaussian_process_regression;
pub mod linear_models;

pub use bayesian_ridge::BayesianRidge;
pub use dummy::ConstantRegressor;
pub use gaussian_process_regression::{GPConfig, GaussianProcessRegressor};
pub use linear_models::LinearRegression;

use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Regression capability consumed by the imputation engine
pub trait Regressor {
    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Point predictions
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Predictive mean and standard deviation per sample
    fn predict_with_std(&self, x: &Array2<f64>) -> Result<(Array1<f64>, Array1<f64>)>;

    /// Whether `predict_with_std` is available
    fn supports_std(&self) -> bool {
        true
    }
}

/// Estimator choice, serializable together with its fitted state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Estimator {
    BayesianRidge(BayesianRidge),
    GaussianProcess(GaussianProcessRegressor),
    Linear(LinearRegression),
    Constant(ConstantRegressor),
}

impl Default for Estimator {
    fn default() -> Self {
        Estimator::BayesianRidge(BayesianRidge::default())
    }
}

impl Estimator {
    /// Short name for logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            Estimator::BayesianRidge(_) => "BayesianRidge",
            Estimator::GaussianProcess(_) => "GaussianProcessRegressor",
            Estimator::Linear(_) => "LinearRegression",
            Estimator::Constant(_) => "ConstantRegressor",
        }
    }

    fn as_regressor(&self) -> &dyn Regressor {
        match self {
            Estimator::BayesianRidge(m) => m,
            Estimator::GaussianProcess(m) => m,
            Estimator::Linear(m) => m,
            Estimator::Constant(m) => m,
        }
    }

    fn as_regressor_mut(&mut self) -> &mut dyn Regressor {
        match self {
            Estimator::BayesianRidge(m) => m,
            Estimator::GaussianProcess(m) => m,
            Estimator::Linear(m) => m,
            Estimator::Constant(m) => m,
        }
    }
}

impl From<BayesianRidge> for Estimator {
    fn from(model: BayesianRidge) -> Self {
        Estimator::BayesianRidge(model)
    }
}

impl From<GaussianProcessRegressor> for Estimator {
    fn from(model: GaussianProcessRegressor) -> Self {
        Estimator::GaussianProcess(model)
    }
}

impl From<LinearRegression> for Estimator {
    fn from(model: LinearRegression) -> Self {
        Estimator::Linear(model)
    }
}

impl From<ConstantRegressor> for Estimator {
    fn from(model: ConstantRegressor) -> Self {
        Estimator::Constant(model)
    }
}

impl Regressor for Estimator {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.as_regressor_mut().fit(x, y)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.as_regressor().predict(x)
    }

    fn predict_with_std(&self, x: &Array2<f64>) -> Result<(Array1<f64>, Array1<f64>)> {
        self.as_regressor().predict_with_std(x)
    }

    fn supports_std(&self) -> bool {
        self.as_regressor().supports_std()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_estimator_dispatch() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![2.0, 4.0, 6.0, 8.0];

        let mut estimator = Estimator::default();
        assert_eq!(estimator.name(), "BayesianRidge");
        estimator.fit(&x, &y).unwrap();
        let (means, stds) = estimator.predict_with_std(&array![[5.0]]).unwrap();
        assert!((means[0] - 10.0).abs() < 0.1);
        assert!(stds[0] > 0.0);
    }

    #[test]
    fn test_std_capability() {
        assert!(Estimator::default().supports_std());
        assert!(Estimator::from(GaussianProcessRegressor::default()).supports_std());
        assert!(Estimator::from(ConstantRegressor::new()).supports_std());
        assert!(!Estimator::from(LinearRegression::new()).supports_std());
    }

    #[test]
    fn test_estimator_serde() {
        let mut estimator = Estimator::default();
        estimator.fit(&array![[0.0], [1.0], [2.0]], &array![1.0, 3.0, 5.0]).unwrap();

        let json = serde_json::to_string(&estimator).unwrap();
        let restored: Estimator = serde_json::from_str(&json).unwrap();
        let query = array![[1.5]];
        assert_eq!(
            estimator.predict(&query).unwrap(),
            restored.predict(&query).unwrap()
        );
    }
}
