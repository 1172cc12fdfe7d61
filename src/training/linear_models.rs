//! Ordinary and ridge least squares
//!
//! Point predictions only: the model has no predictive distribution, so it
//! cannot drive posterior sampling and is rejected as a MICE estimator.

use crate::error::{ImputeError, Result};
use crate::training::linalg::cholesky_solve;
use crate::training::Regressor;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Linear regression model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Fitted coefficients (weights)
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept (bias)
    pub intercept: f64,
    /// Whether to fit intercept
    pub fit_intercept: bool,
    /// Regularization strength (L2)
    pub alpha: f64,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    /// Create a new linear regression model
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
            fit_intercept: true,
            alpha: 0.0,
        }
    }

    /// Enable/disable fitting intercept
    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Set regularization strength (Ridge regression)
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha.max(0.0);
        self
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(ImputeError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }

        let (x_mean, y_mean) = if self.fit_intercept && n_samples > 0 {
            let x_mean = x
                .mean_axis(Axis(0))
                .unwrap_or_else(|| Array1::zeros(n_features));
            (x_mean, y.mean().unwrap_or(0.0))
        } else {
            (Array1::zeros(n_features), 0.0)
        };
        let x_centered = x - &x_mean.view().insert_axis(Axis(0));
        let y_centered = y - y_mean;

        // (X^T X + alpha*I) * w = X^T y
        let mut xtx = x_centered.t().dot(&x_centered);
        for i in 0..n_features {
            xtx[[i, i]] += self.alpha;
        }
        let xty = x_centered.t().dot(&y_centered);

        let coefficients = cholesky_solve(&xtx, &xty).ok_or_else(|| {
            ImputeError::ComputationError("Matrix is singular, cannot solve least squares".to_string())
        })?;

        self.intercept = y_mean - coefficients.dot(&x_mean);
        self.coefficients = Some(coefficients);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(ImputeError::ModelNotFitted)?;
        Ok(x.dot(coefficients) + self.intercept)
    }

    fn predict_with_std(&self, _x: &Array2<f64>) -> Result<(Array1<f64>, Array1<f64>)> {
        Err(ImputeError::ConfigError(
            "LinearRegression cannot report a predictive standard deviation".to_string(),
        ))
    }

    fn supports_std(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_linear_regression_simple() {
        let x = array![
            [1.0, 1.0],
            [2.0, 1.0],
            [1.0, 2.0],
            [2.0, 2.0],
            [3.0, 1.0],
        ];
        // y = 2*x1 + 3*x2 + 1
        let y = array![6.0, 8.0, 9.0, 11.0, 10.0];

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let predictions = model.predict(&x).unwrap();
        for (p, t) in predictions.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-6);
        }
    }

    #[test]
    fn test_ridge_regression() {
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0]];
        let y = array![2.0, 4.0, 6.0];

        let mut model = LinearRegression::new().with_alpha(0.1);
        model.fit(&x, &y).unwrap();
        assert_eq!(model.predict(&x).unwrap().len(), 3);
    }

    #[test]
    fn test_no_std_capability() {
        let mut model = LinearRegression::new();
        model.fit(&array![[1.0], [2.0]], &array![1.0, 2.0]).unwrap();
        assert!(!model.supports_std());
        assert!(model.predict_with_std(&array![[1.5]]).is_err());
    }
}
