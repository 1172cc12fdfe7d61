//! Constant predictor

use crate::error::{ImputeError, Result};
use crate::training::Regressor;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Predicts the training mean with zero uncertainty.
///
/// Stands in for the regular estimator when the target has no variance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstantRegressor {
    constant: Option<f64>,
}

impl ConstantRegressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(&self) -> Option<f64> {
        self.constant
    }
}

impl Regressor for ConstantRegressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(ImputeError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }
        let mean = y
            .mean()
            .ok_or_else(|| ImputeError::ComputationError("Empty dataset".to_string()))?;
        self.constant = Some(mean);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let constant = self.constant.ok_or(ImputeError::ModelNotFitted)?;
        Ok(Array1::from_elem(x.nrows(), constant))
    }

    fn predict_with_std(&self, x: &Array2<f64>) -> Result<(Array1<f64>, Array1<f64>)> {
        Ok((self.predict(x)?, Array1::zeros(x.nrows())))
    }
}
