//! Gaussian Process Regression
//!
//! Non-parametric Bayesian regression that provides uncertainty estimates.
//! Uses RBF (squared exponential) kernel with Cholesky decomposition for prediction.

use crate::error::{ImputeError, Result};
use crate::training::linalg::{backward_substitute, cholesky, forward_substitute};
use crate::training::Regressor;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GPConfig {
    pub length_scale: f64,
    pub signal_variance: f64,
    pub noise_variance: f64,
    pub max_training_size: usize,
}

impl Default for GPConfig {
    fn default() -> Self {
        Self {
            length_scale: 1.0,
            signal_variance: 1.0,
            noise_variance: 0.01,
            max_training_size: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianProcessRegressor {
    pub config: GPConfig,
    x_train: Option<Array2<f64>>,
    alpha: Option<Array1<f64>>,      // K_inv * y
    cholesky_l: Option<Array2<f64>>, // K = L * L^T
    y_mean: f64,
}

impl Default for GaussianProcessRegressor {
    fn default() -> Self {
        Self::new(GPConfig::default())
    }
}

impl GaussianProcessRegressor {
    pub fn new(config: GPConfig) -> Self {
        Self { config, x_train: None, alpha: None, cholesky_l: None, y_mean: 0.0 }
    }

    fn rbf_kernel(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        let sq_dist: f64 = a.iter().zip(b.iter()).map(|(&ai, &bi)| (ai - bi).powi(2)).sum();
        self.config.signal_variance * (-sq_dist / (2.0 * self.config.length_scale.powi(2))).exp()
    }

    fn fitted_parts(&self) -> Result<(&Array2<f64>, &Array1<f64>, &Array2<f64>)> {
        match (&self.x_train, &self.alpha, &self.cholesky_l) {
            (Some(x), Some(alpha), Some(l)) => Ok((x, alpha, l)),
            _ => Err(ImputeError::ModelNotFitted),
        }
    }

    fn kernel_row(&self, x_train: &Array2<f64>, row: ArrayView1<f64>) -> Array1<f64> {
        x_train.rows().into_iter().map(|tr| self.rbf_kernel(row, tr)).collect()
    }
}

impl Regressor for GaussianProcessRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n = x.nrows();
        if n == 0 {
            return Err(ImputeError::ComputationError("Empty dataset".into()));
        }
        if y.len() != n {
            return Err(ImputeError::ShapeError {
                expected: format!("y length = {}", n),
                actual: format!("y length = {}", y.len()),
            });
        }

        // Subsample if too large
        let (x_sub, y_sub) = if n > self.config.max_training_size {
            let step = n / self.config.max_training_size;
            let indices: Vec<usize> = (0..n).step_by(step).take(self.config.max_training_size).collect();
            let x_sub = Array2::from_shape_fn((indices.len(), x.ncols()), |(i, j)| x[[indices[i], j]]);
            let y_sub = Array1::from_vec(indices.iter().map(|&i| y[i]).collect());
            (x_sub, y_sub)
        } else {
            (x.clone(), y.clone())
        };

        let n_sub = x_sub.nrows();
        self.y_mean = y_sub.mean().unwrap_or(0.0);
        let y_centered = &y_sub - self.y_mean;

        // K + noise * I
        let mut k = Array2::zeros((n_sub, n_sub));
        for i in 0..n_sub {
            for j in i..n_sub {
                let val = self.rbf_kernel(x_sub.row(i), x_sub.row(j));
                k[[i, j]] = val;
                k[[j, i]] = val;
            }
            k[[i, i]] += self.config.noise_variance;
        }

        let l = cholesky(&k).ok_or_else(|| {
            ImputeError::ComputationError("Kernel matrix not positive definite".into())
        })?;
        let alpha = backward_substitute(&l, &forward_substitute(&l, &y_centered));

        self.x_train = Some(x_sub);
        self.alpha = Some(alpha);
        self.cholesky_l = Some(l);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (x_train, alpha, _) = self.fitted_parts()?;
        Ok(x
            .rows()
            .into_iter()
            .map(|row| self.kernel_row(x_train, row).dot(alpha) + self.y_mean)
            .collect())
    }

    /// Predict with uncertainty (mean, std); the std includes the noise term
    fn predict_with_std(&self, x: &Array2<f64>) -> Result<(Array1<f64>, Array1<f64>)> {
        let (x_train, alpha, l) = self.fitted_parts()?;

        let mut means = Vec::with_capacity(x.nrows());
        let mut stds = Vec::with_capacity(x.nrows());
        for row in x.rows() {
            let k_star = self.kernel_row(x_train, row);
            means.push(k_star.dot(alpha) + self.y_mean);

            // k(x*, x*) - k*^T K^{-1} k*
            let v = forward_substitute(l, &k_star);
            let var = (self.config.signal_variance - v.dot(&v)).max(1e-10);
            stds.push((var + self.config.noise_variance).sqrt());
        }

        Ok((Array1::from_vec(means), Array1::from_vec(stds)))
    }
}
