//! Neighbor feature selection
//!
//! When the number of predictors is capped, the predictors of a feature are
//! drawn without replacement with probability proportional to their absolute
//! correlation with that feature.

use crate::error::{ImputeError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::Rng;

/// Absolute correlation matrix of the columns of `x_filled`.
///
/// Undefined correlations (zero-variance columns) are set to `tolerance`,
/// the diagonal is zeroed and each column is L1-normalized so it can be
/// used as a sampling distribution.
pub fn abs_correlation_matrix(x_filled: &Array2<f64>, tolerance: f64) -> Array2<f64> {
    let n_samples = x_filled.nrows();
    let n_features = x_filled.ncols();

    let means = x_filled
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(n_features));
    let centered = x_filled - &means.insert_axis(Axis(0));
    let cov = centered.t().dot(&centered) / (n_samples.max(1) as f64);
    let stds: Array1<f64> = cov.diag().mapv(f64::sqrt);

    let mut corr = Array2::from_shape_fn((n_features, n_features), |(i, j)| {
        let r = cov[[i, j]] / (stds[i] * stds[j]);
        if r.is_finite() {
            r.abs().min(1.0)
        } else {
            tolerance
        }
    });
    corr.diag_mut().fill(0.0);

    for mut column in corr.columns_mut() {
        let norm: f64 = column.sum();
        if norm > 0.0 {
            column /= norm;
        }
    }
    corr
}

/// Features used as regression inputs for `feat_idx`.
///
/// Without a cap, or when the cap covers every other feature, the full
/// ascending conditioning set is returned. Otherwise `n_nearest_features`
/// indices are sampled using column `feat_idx` of `abs_corr` as weights.
pub fn neighbor_features<R>(
    n_features: usize,
    feat_idx: usize,
    n_nearest_features: Option<usize>,
    abs_corr: Option<&Array2<f64>>,
    rng: &mut R,
) -> Result<Vec<usize>>
where
    R: Rng + ?Sized,
{
    let others: Vec<usize> = (0..n_features).filter(|&j| j != feat_idx).collect();

    let (cap, weights) = match (n_nearest_features, abs_corr) {
        (Some(cap), Some(weights)) if cap < others.len() => (cap, weights),
        _ => return Ok(others),
    };

    let mut chosen: Vec<usize> = others
        .choose_multiple_weighted(rng, cap, |&j| weights[[j, feat_idx]])
        .map_err(|e| {
            ImputeError::ComputationError(format!(
                "Cannot sample neighbors of feature {}: {}",
                feat_idx, e
            ))
        })?
        .copied()
        .collect();
    chosen.sort_unstable();
    Ok(chosen)
}
