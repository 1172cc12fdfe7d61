//! Bayesian ridge regression
//!
//! Linear model with Gaussian noise (precision `alpha`) and an isotropic
//! Gaussian prior on the weights (precision `lambda`). Both precisions are
//! estimated by maximising the marginal likelihood under Gamma hyperpriors.
//! The posterior over the weights gives a predictive standard deviation for
//! every sample, which makes this the default estimator for posterior
//! sampling in MICE.

use crate::error::{ImputeError, Result};
use crate::training::linalg::symmetric_eigen;
use crate::training::Regressor;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Bayesian ridge regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BayesianRidge {
    /// Maximum number of evidence-maximisation iterations
    pub n_iter: usize,
    /// Stop once the L1 change of the weights drops below this
    pub tol: f64,
    /// Gamma shape hyperparameter for `alpha`
    pub alpha_1: f64,
    /// Gamma rate hyperparameter for `alpha`
    pub alpha_2: f64,
    /// Gamma shape hyperparameter for `lambda`
    pub lambda_1: f64,
    /// Gamma rate hyperparameter for `lambda`
    pub lambda_2: f64,
    /// Whether to fit an intercept
    pub fit_intercept: bool,
    coefficients: Option<Array1<f64>>,
    intercept: f64,
    x_offset: Option<Array1<f64>>,
    /// Posterior covariance of the weights
    sigma: Option<Array2<f64>>,
    alpha: f64,
    lambda: f64,
    n_iter_run: usize,
}

impl Default for BayesianRidge {
    fn default() -> Self {
        Self::new()
    }
}

impl BayesianRidge {
    /// Create a new model with uninformative hyperpriors
    pub fn new() -> Self {
        Self {
            n_iter: 300,
            tol: 1e-3,
            alpha_1: 1e-6,
            alpha_2: 1e-6,
            lambda_1: 1e-6,
            lambda_2: 1e-6,
            fit_intercept: true,
            coefficients: None,
            intercept: 0.0,
            x_offset: None,
            sigma: None,
            alpha: 1.0,
            lambda: 1.0,
            n_iter_run: 0,
        }
    }

    /// Set maximum iterations
    pub fn with_n_iter(mut self, n_iter: usize) -> Self {
        self.n_iter = n_iter.max(1);
        self
    }

    /// Set convergence tolerance
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tol = tol.max(0.0);
        self
    }

    /// Enable/disable fitting intercept
    pub fn with_fit_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Estimated noise precision
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Estimated weight precision
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Iterations used by the last fit
    pub fn n_iter_run(&self) -> usize {
        self.n_iter_run
    }

    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }

    fn fitted_parts(&self) -> Result<(&Array1<f64>, &Array1<f64>, &Array2<f64>)> {
        match (&self.coefficients, &self.x_offset, &self.sigma) {
            (Some(coef), Some(offset), Some(sigma)) => Ok((coef, offset, sigma)),
            _ => Err(ImputeError::ModelNotFitted),
        }
    }
}

impl Regressor for BayesianRidge {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples == 0 {
            return Err(ImputeError::ComputationError("Empty dataset".to_string()));
        }
        if n_samples != y.len() {
            return Err(ImputeError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }

        let (x_offset, y_offset) = if self.fit_intercept {
            let x_mean = x
                .mean_axis(Axis(0))
                .unwrap_or_else(|| Array1::zeros(n_features));
            (x_mean, y.mean().unwrap_or(0.0))
        } else {
            (Array1::zeros(n_features), 0.0)
        };
        let xc = x - &x_offset.view().insert_axis(Axis(0));
        let yc = y - y_offset;

        // Spectral basis of the smaller Gram matrix. With more samples than
        // features the weights live in span(V); otherwise in span(X^T U).
        let primal = n_samples > n_features;
        let (eigen_vals, basis, projected) = if primal {
            let (vals, v) = symmetric_eigen(&xc.t().dot(&xc));
            let projected = v.t().dot(&xc.t().dot(&yc));
            (vals, v, projected)
        } else {
            let (vals, u) = symmetric_eigen(&xc.dot(&xc.t()));
            let projected = u.t().dot(&yc);
            (vals, xc.t().dot(&u), projected)
        };
        let eigen_vals = eigen_vals.mapv(|e| e.max(0.0));

        let solve = |alpha: f64, lambda: f64| -> Array1<f64> {
            let shrink = lambda / alpha;
            let scaled = Array1::from_shape_fn(projected.len(), |i| projected[i] / (eigen_vals[i] + shrink));
            basis.dot(&scaled)
        };

        let var_y = yc.mapv(|v| v * v).sum() / n_samples as f64;
        let mut alpha = 1.0 / (var_y + f64::EPSILON);
        let mut lambda = 1.0;
        let mut coef_old: Option<Array1<f64>> = None;
        let mut n_iter_run = 0;

        for iter in 0..self.n_iter {
            n_iter_run = iter + 1;
            let coef = solve(alpha, lambda);

            let residual = &yc - &xc.dot(&coef);
            let rmse = residual.mapv(|r| r * r).sum();
            let gamma: f64 = eigen_vals
                .iter()
                .map(|&e| alpha * e / (lambda + alpha * e))
                .sum();

            lambda = (gamma + 2.0 * self.lambda_1) / (coef.mapv(|c| c * c).sum() + 2.0 * self.lambda_2);
            alpha = (n_samples as f64 - gamma + 2.0 * self.alpha_1) / (rmse + 2.0 * self.alpha_2);

            if let Some(old) = &coef_old {
                let change: f64 = old.iter().zip(coef.iter()).map(|(a, b)| (a - b).abs()).sum();
                if change < self.tol {
                    break;
                }
            }
            coef_old = Some(coef);
        }

        let coefficients = solve(alpha, lambda);

        // Posterior covariance (lambda * I + alpha * Xc^T Xc)^-1
        let sigma = if primal {
            let weights = eigen_vals.mapv(|e| 1.0 / (alpha * e + lambda));
            (&basis * &weights.view().insert_axis(Axis(0))).dot(&basis.t())
        } else {
            // Prior variance 1/lambda everywhere, shrunk along the data
            // directions d_i = Xc^T u_i / sqrt(e_i); the null space of Xc
            // keeps the full prior variance.
            let max_eigen = eigen_vals.iter().copied().fold(0.0, f64::max);
            let kept: Vec<usize> = (0..eigen_vals.len())
                .filter(|&i| eigen_vals[i] > 0.0 && eigen_vals[i] > 1e-12 * max_eigen)
                .collect();
            let scale: Array1<f64> = kept.iter().map(|&i| 1.0 / eigen_vals[i].sqrt()).collect();
            let shrink: Array1<f64> = kept
                .iter()
                .map(|&i| 1.0 / lambda - 1.0 / (alpha * eigen_vals[i] + lambda))
                .collect();
            let directions = &basis.select(Axis(1), &kept) * &scale.view().insert_axis(Axis(0));
            let shrunk = &directions * &shrink.view().insert_axis(Axis(0));
            Array2::eye(n_features) / lambda - shrunk.dot(&directions.t())
        };

        self.intercept = y_offset - x_offset.dot(&coefficients);
        self.coefficients = Some(coefficients);
        self.x_offset = Some(x_offset);
        self.sigma = Some(sigma);
        self.alpha = alpha;
        self.lambda = lambda;
        self.n_iter_run = n_iter_run;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (coef, _, _) = self.fitted_parts()?;
        Ok(x.dot(coef) + self.intercept)
    }

    fn predict_with_std(&self, x: &Array2<f64>) -> Result<(Array1<f64>, Array1<f64>)> {
        let (coef, x_offset, sigma) = self.fitted_parts()?;
        let means = x.dot(coef) + self.intercept;

        let xc = x - &x_offset.view().insert_axis(Axis(0));
        let spread = (&xc.dot(sigma) * &xc).sum_axis(Axis(1));
        // rounding in the dual covariance can leave a tiny negative spread
        let stds = spread.mapv(|s| (s.max(0.0) + 1.0 / self.alpha).sqrt());
        Ok((means, stds))
    }
}
