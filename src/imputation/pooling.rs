//! Rubin's rules for combining estimates across imputed datasets
//!
//! Given `m` point estimates `Q_i` of a parameter, one per imputed dataset,
//! and their sampling variances `U_i`:
//!
//! - pooled estimate `Q̄ = mean(Q_i)`
//! - within-imputation variance `Ū = mean(U_i)`
//! - between-imputation variance `B = Σ (Q_i - Q̄)² / (m - 1)`
//! - total variance `T = Ū + B + B / m`

use crate::error::{ImputeError, Result};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

/// Pooled estimate of a single parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PooledEstimate {
    /// Mean of the per-dataset estimates
    pub estimate: f64,
    /// Mean of the per-dataset variances
    pub within_variance: f64,
    /// Spread of the estimates across datasets (0 for a single dataset)
    pub between_variance: f64,
    pub total_variance: f64,
    pub n_imputations: usize,
}

impl PooledEstimate {
    pub fn std_error(&self) -> f64 {
        self.total_variance.sqrt()
    }
}

/// Pool one parameter estimated on `estimates.len()` imputed datasets
pub fn pool(estimates: &[f64], variances: &[f64]) -> Result<PooledEstimate> {
    if estimates.is_empty() {
        return Err(ImputeError::InvalidParameter {
            name: "estimates".to_string(),
            value: "[]".to_string(),
            reason: "at least one imputed dataset is required".to_string(),
        });
    }
    if estimates.len() != variances.len() {
        return Err(ImputeError::InvalidParameter {
            name: "variances".to_string(),
            value: format!("{} values", variances.len()),
            reason: format!("expected one variance per estimate ({})", estimates.len()),
        });
    }

    let m = estimates.len() as f64;
    let estimate = estimates.iter().sum::<f64>() / m;
    let within_variance = variances.iter().sum::<f64>() / m;
    let between_variance = if estimates.len() > 1 {
        estimates.iter().map(|q| (q - estimate).powi(2)).sum::<f64>() / (m - 1.0)
    } else {
        0.0
    };

    Ok(PooledEstimate {
        estimate,
        within_variance,
        between_variance,
        total_variance: within_variance + between_variance + between_variance / m,
        n_imputations: estimates.len(),
    })
}

/// Pool `k` parameters at once from `m × k` matrices (one row per dataset)
pub fn pool_columns(estimates: &Array2<f64>, variances: &Array2<f64>) -> Result<Vec<PooledEstimate>> {
    if estimates.dim() != variances.dim() {
        return Err(ImputeError::InvalidParameter {
            name: "variances".to_string(),
            value: format!("{:?}", variances.dim()),
            reason: format!("expected the shape of estimates {:?}", estimates.dim()),
        });
    }

    estimates
        .axis_iter(Axis(1))
        .zip(variances.axis_iter(Axis(1)))
        .map(|(q, u)| pool(&q.to_vec(), &u.to_vec()))
        .collect()
}
