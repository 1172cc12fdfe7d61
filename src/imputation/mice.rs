//! MICE (Multiple Imputation by Chained Equations) imputer
//!
//! Each incomplete feature is regressed on a set of other features, round
//! after round, and its missing cells are replaced by draws from the
//! estimator's predictive distribution. Draws from the rounds after the
//! burn-in are averaged into the final matrix. Every fitted step is
//! recorded together with its round so `transform` can replay the exact
//! same sequence on new data without refitting.

use crate::error::{ImputeError, Result};
use crate::imputation::{
    abs_correlation_matrix, get_mask, neighbor_features, Imputer, MiceConfig, SimpleImputer,
};
use crate::training::{ConstantRegressor, Estimator, Regressor};
use ndarray::{Array1, Array2, Axis, Zip};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Tolerance substituted for undefined correlations
const CORRELATION_TOLERANCE: f64 = 1e-6;

/// One fitted per-feature regression, in the order it was run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImputationStep {
    /// Round the step belongs to
    pub round: usize,
    /// Imputed feature, indexed among the valid features
    pub feat_idx: usize,
    /// Predictor features, indexed among the valid features
    pub neighbor_feat_idx: Vec<usize>,
    /// Estimator fitted on the rows where `feat_idx` was observed
    pub estimator: Estimator,
}

/// MICE imputer using chained equations and posterior sampling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MICEImputer {
    config: MiceConfig,
    /// Fitted initial imputer
    initial_imputer: Option<SimpleImputer>,
    /// Input columns kept after dropping all-missing ones
    valid_features: Option<Vec<usize>>,
    imputation_sequence: Vec<ImputationStep>,
    n_features_in: Option<usize>,
    /// Draws averaged by the most recent fit
    n_draws: usize,
}

impl Default for MICEImputer {
    fn default() -> Self {
        Self::new()
    }
}

impl MICEImputer {
    /// Create new MICE imputer with default settings
    pub fn new() -> Self {
        Self::with_config(MiceConfig::default())
    }

    /// Create new MICE imputer from a configuration
    pub fn with_config(config: MiceConfig) -> Self {
        Self {
            config,
            initial_imputer: None,
            valid_features: None,
            imputation_sequence: Vec::new(),
            n_features_in: None,
            n_draws: 0,
        }
    }

    pub fn config(&self) -> &MiceConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.initial_imputer.is_some()
    }

    /// Recorded steps of the last fit, in execution order
    pub fn imputation_sequence(&self) -> &[ImputationStep] {
        &self.imputation_sequence
    }

    /// Number of post-burn-in draws averaged by the last fit
    pub fn n_draws(&self) -> usize {
        self.n_draws
    }

    /// Input columns that survive imputation
    pub fn valid_features(&self) -> Option<&[usize]> {
        self.valid_features.as_deref()
    }

    pub fn n_features_in(&self) -> Option<usize> {
        self.n_features_in
    }

    /// Fitted initial imputer
    pub fn initial_imputer(&self) -> Option<&SimpleImputer> {
        self.initial_imputer.as_ref()
    }

    fn report(&self, message: std::fmt::Arguments<'_>) {
        if self.config.verbose {
            info!("{}", message);
        } else {
            debug!("{}", message);
        }
    }

    /// Fit on `x` and return its imputed version, drawing from `rng`
    pub fn fit_transform_with_rng<R>(&mut self, x: &Array2<f64>, rng: &mut R) -> Result<Array2<f64>>
    where
        R: Rng + ?Sized,
    {
        self.config.validate()?;
        let start = Instant::now();
        self.report(format_args!(
            "[MICE] Completing matrix with shape ({}, {})",
            x.nrows(),
            x.ncols()
        ));

        let mut initial_imputer = SimpleImputer::new(self.config.initial_strategy)
            .with_missing_values(self.config.missing_values)
            .with_verbose(self.config.verbose);
        initial_imputer.fit(x)?;
        let valid_features = initial_imputer.valid_features()?;
        let mut x_filled = initial_imputer.transform(x)?;
        let mask = get_mask(x, self.config.missing_values).select(Axis(1), &valid_features);

        let n_features = x_filled.ncols();
        let n_rounds = self.config.n_rounds();
        let mut steps = Vec::new();
        let mut draws = DrawAccumulator::new(x_filled.dim());

        for round in 0..n_rounds {
            let ordered = self.config.imputation_order.ordered_features(&mask, rng);
            let abs_corr = self.correlation_for_round(&x_filled);

            for feat_idx in ordered {
                let neighbors = neighbor_features(
                    n_features,
                    feat_idx,
                    self.config.n_nearest_features,
                    abs_corr.as_ref(),
                    rng,
                )?;
                let fitted =
                    self.impute_one_feature(&mut x_filled, &mask, feat_idx, &neighbors, None, rng)?;
                if let Some(estimator) = fitted {
                    steps.push(ImputationStep {
                        round,
                        feat_idx,
                        neighbor_feat_idx: neighbors,
                        estimator,
                    });
                }
            }

            if round >= self.config.n_burn_in {
                draws.record(&x_filled, &mask);
            }
            self.report(format_args!(
                "[MICE] Ending imputation round {}/{}, elapsed time {:.2}",
                round + 1,
                n_rounds,
                start.elapsed().as_secs_f64()
            ));
        }

        self.n_draws = draws.finish(&mut x_filled, &mask);
        self.n_features_in = Some(x.ncols());
        self.valid_features = Some(valid_features);
        self.initial_imputer = Some(initial_imputer);
        self.imputation_sequence = steps;
        Ok(x_filled)
    }

    /// Fit on `x`, drawing from `rng`
    pub fn fit_with_rng<R>(&mut self, x: &Array2<f64>, rng: &mut R) -> Result<()>
    where
        R: Rng + ?Sized,
    {
        self.fit_transform_with_rng(x, rng).map(|_| ())
    }

    /// Impute `x` by replaying the recorded steps, drawing from `rng`.
    ///
    /// Estimators are never refitted; features complete at fit time keep
    /// their initial statistic.
    pub fn transform_with_rng<R>(&self, x: &Array2<f64>, rng: &mut R) -> Result<Array2<f64>>
    where
        R: Rng + ?Sized,
    {
        let initial_imputer = self.initial_imputer.as_ref().ok_or(ImputeError::ModelNotFitted)?;
        let valid_features = self.valid_features.as_ref().ok_or(ImputeError::ModelNotFitted)?;

        let start = Instant::now();
        self.report(format_args!(
            "[MICE] Completing matrix with shape ({}, {})",
            x.nrows(),
            x.ncols()
        ));

        let mut x_filled = initial_imputer.transform(x)?;
        let mask = get_mask(x, self.config.missing_values).select(Axis(1), valid_features);

        let n_rounds = self.config.n_rounds();
        let mut draws = DrawAccumulator::new(x_filled.dim());
        let mut steps = self.imputation_sequence.iter().peekable();

        for round in 0..n_rounds {
            while let Some(step) = steps.next_if(|s| s.round == round) {
                self.impute_one_feature(
                    &mut x_filled,
                    &mask,
                    step.feat_idx,
                    &step.neighbor_feat_idx,
                    Some(&step.estimator),
                    rng,
                )?;
            }

            if round >= self.config.n_burn_in {
                draws.record(&x_filled, &mask);
            }
            self.report(format_args!(
                "[MICE] Ending imputation round {}/{}, elapsed time {:.2}",
                round + 1,
                n_rounds,
                start.elapsed().as_secs_f64()
            ));
        }

        draws.finish(&mut x_filled, &mask);
        Ok(x_filled)
    }

    /// Correlation weights for neighbor sampling, only when the cap is
    /// smaller than the number of candidate predictors
    fn correlation_for_round(&self, x_filled: &Array2<f64>) -> Option<Array2<f64>> {
        let n_features = x_filled.ncols();
        match self.config.n_nearest_features {
            Some(cap) if n_features > 0 && cap < n_features - 1 => {
                Some(abs_correlation_matrix(x_filled, CORRELATION_TOLERANCE))
            }
            _ => None,
        }
    }

    /// Impute the missing cells of one feature in place.
    ///
    /// With `estimator` set, that estimator is used as is. Otherwise a new
    /// one is fitted on the rows where the feature is observed and returned.
    /// Returns `None` when an estimator was supplied or nothing is missing.
    fn impute_one_feature<R>(
        &self,
        x_filled: &mut Array2<f64>,
        mask: &Array2<bool>,
        feat_idx: usize,
        neighbor_feat_idx: &[usize],
        estimator: Option<&Estimator>,
        rng: &mut R,
    ) -> Result<Option<Estimator>>
    where
        R: Rng + ?Sized,
    {
        let missing_rows = rows_where(mask, feat_idx, true);
        if missing_rows.is_empty() {
            return Ok(None);
        }

        let fitted = match estimator {
            Some(_) => None,
            None => Some(self.fit_feature_estimator(x_filled, mask, feat_idx, neighbor_feat_idx)?),
        };
        let estimator = estimator
            .or(fitted.as_ref())
            .ok_or(ImputeError::ModelNotFitted)?;

        let x_test = x_filled
            .select(Axis(0), &missing_rows)
            .select(Axis(1), neighbor_feat_idx);
        let (mut mus, mut sigmas) = estimator.predict_with_std(&x_test)?;

        let n_nan = zero_nan(&mut mus) + zero_nan(&mut sigmas);
        if n_nan > 0 {
            warn!(
                "{} NaN predictions for feature {} replaced with 0",
                n_nan, feat_idx
            );
        }

        for ((&row, &mu), &sigma) in missing_rows.iter().zip(mus.iter()).zip(sigmas.iter()) {
            let z: f64 = rng.sample(StandardNormal);
            let draw = mu + sigma.max(self.config.min_std) * z;
            x_filled[[row, feat_idx]] = self.clip(draw);
        }

        Ok(fitted)
    }

    /// Regress the observed values of `feat_idx` on its neighbors.
    ///
    /// A constant target bypasses the configured estimator.
    fn fit_feature_estimator(
        &self,
        x_filled: &Array2<f64>,
        mask: &Array2<bool>,
        feat_idx: usize,
        neighbor_feat_idx: &[usize],
    ) -> Result<Estimator> {
        let observed_rows = rows_where(mask, feat_idx, false);
        let x_train = x_filled
            .select(Axis(0), &observed_rows)
            .select(Axis(1), neighbor_feat_idx);
        let y_train: Array1<f64> = observed_rows.iter().map(|&i| x_filled[[i, feat_idx]]).collect();

        let mut estimator = if y_train.std(0.0) > 0.0 {
            self.config.estimator.clone()
        } else {
            Estimator::from(ConstantRegressor::new())
        };
        estimator.fit(&x_train, &y_train)?;
        Ok(estimator)
    }

    fn clip(&self, value: f64) -> f64 {
        let value = match self.config.min_value {
            Some(lo) => value.max(lo),
            None => value,
        };
        match self.config.max_value {
            Some(hi) => value.min(hi),
            None => value,
        }
    }

    /// Save the fitted imputer to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        if !self.is_fitted() {
            return Err(ImputeError::ModelNotFitted);
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load an imputer from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let imputer: Self = serde_json::from_str(&json)?;
        Ok(imputer)
    }
}

impl Imputer for MICEImputer {
    fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        let mut rng = self.config.rng();
        self.fit_with_rng(x, &mut rng)
    }

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let mut rng = self.config.rng();
        self.transform_with_rng(x, &mut rng)
    }

    fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let mut rng = self.config.rng();
        self.fit_transform_with_rng(x, &mut rng)
    }
}

/// Running sum of the missing cells over the sampling rounds
struct DrawAccumulator {
    sum: Array2<f64>,
    n_draws: usize,
}

impl DrawAccumulator {
    fn new(shape: (usize, usize)) -> Self {
        Self {
            sum: Array2::zeros(shape),
            n_draws: 0,
        }
    }

    fn record(&mut self, x_filled: &Array2<f64>, mask: &Array2<bool>) {
        Zip::from(&mut self.sum)
            .and(x_filled)
            .and(mask)
            .for_each(|s, &v, &m| {
                if m {
                    *s += v;
                }
            });
        self.n_draws += 1;
    }

    /// Write the averaged draws into the missing cells; without any draw
    /// the last working values stay in place
    fn finish(self, x_filled: &mut Array2<f64>, mask: &Array2<bool>) -> usize {
        if self.n_draws > 0 {
            let n = self.n_draws as f64;
            Zip::from(x_filled)
                .and(&self.sum)
                .and(mask)
                .for_each(|v, &s, &m| {
                    if m {
                        *v = s / n;
                    }
                });
        }
        self.n_draws
    }
}

/// Rows of `feat_idx` whose mask entry equals `missing`
fn rows_where(mask: &Array2<bool>, feat_idx: usize, missing: bool) -> Vec<usize> {
    mask.column(feat_idx)
        .iter()
        .enumerate()
        .filter(|(_, &m)| m == missing)
        .map(|(i, _)| i)
        .collect()
}

/// Replace NaN entries with 0 and return how many there were
fn zero_nan(values: &mut Array1<f64>) -> usize {
    let mut count = 0;
    values.mapv_inplace(|v| {
        if v.is_nan() {
            count += 1;
            0.0
        } else {
            v
        }
    });
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imputation::{ImputationOrder, InitialStrategy};
    use crate::training::LinearRegression;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const NAN: f64 = f64::NAN;

    fn small_data() -> Array2<f64> {
        array![
            [1.0, 2.0, 3.0],
            [NAN, 5.0, 6.0],
            [7.0, NAN, 9.0],
            [10.0, 11.0, NAN],
            [13.0, 14.0, 15.0],
            [16.0, NAN, 18.0],
        ]
    }

    fn quick_config() -> MiceConfig {
        MiceConfig::new()
            .with_n_burn_in(2)
            .with_n_imputations(3)
            .with_random_state(0)
    }

    #[test]
    fn test_mice_imputer() {
        let data = small_data();
        let mut imputer = MICEImputer::with_config(quick_config());
        let result = imputer.fit_transform(&data).unwrap();

        assert_eq!(result.dim(), data.dim());
        assert!(!result.iter().any(|v| v.is_nan()));
        assert_eq!(result[[0, 0]], 1.0);
        assert_eq!(result[[4, 2]], 15.0);
    }

    #[test]
    fn test_steps_tagged_by_round() {
        let mut imputer = MICEImputer::with_config(quick_config());
        imputer.fit(&small_data()).unwrap();

        // three incomplete features per round, five rounds
        let steps = imputer.imputation_sequence();
        assert_eq!(steps.len(), 15);
        for (i, step) in steps.iter().enumerate() {
            assert_eq!(step.round, i / 3);
            assert!(!step.neighbor_feat_idx.contains(&step.feat_idx));
        }
        assert_eq!(imputer.n_draws(), 3);
    }

    #[test]
    fn test_zero_imputations_keeps_last_values() {
        let config = quick_config().with_n_imputations(0);
        let mut imputer = MICEImputer::with_config(config);
        let result = imputer.fit_transform(&small_data()).unwrap();

        assert_eq!(imputer.n_draws(), 0);
        assert_eq!(imputer.imputation_sequence().len(), 6);
        assert!(!result.iter().any(|v| v.is_nan()));
    }

    #[test]
    fn test_no_rounds_returns_initial_fill() {
        let config = quick_config()
            .with_n_burn_in(0)
            .with_n_imputations(0)
            .with_initial_strategy(InitialStrategy::Median);
        let mut imputer = MICEImputer::with_config(config);
        let result = imputer.fit_transform(&small_data()).unwrap();

        assert!(imputer.imputation_sequence().is_empty());
        // median of [1, 7, 10, 13, 16]
        assert_eq!(result[[1, 0]], 10.0);
    }

    #[test]
    fn test_constant_target_uses_constant_estimator() {
        let data = array![
            [1.0, 4.0],
            [2.0, 4.0],
            [3.0, NAN],
            [4.0, 4.0],
        ];
        let mut imputer = MICEImputer::with_config(quick_config());
        let result = imputer.fit_transform(&data).unwrap();

        assert!(imputer
            .imputation_sequence()
            .iter()
            .all(|s| s.estimator.name() == "ConstantRegressor"));
        assert!((result[[2, 1]] - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_nan_predictions_are_zeroed() {
        let imputer = MICEImputer::with_config(quick_config());
        let mut estimator = Estimator::from(ConstantRegressor::new());
        estimator.fit(&array![[0.0]], &array![NAN]).unwrap();

        let mut x_filled = array![[1.0, 5.0], [2.0, 5.0]];
        let mask = array![[false, false], [false, true]];
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let fitted = imputer
            .impute_one_feature(&mut x_filled, &mask, 1, &[0], Some(&estimator), &mut rng)
            .unwrap();

        assert!(fitted.is_none());
        assert!(x_filled[[1, 1]].abs() < 1e-3);
        assert_eq!(x_filled[[0, 1]], 5.0);
    }

    #[test]
    fn test_draws_are_clipped() {
        let config = quick_config().with_bounds(Some(-1.0), Some(1.0));
        let imputer = MICEImputer::with_config(config);
        let mut estimator = Estimator::from(ConstantRegressor::new());
        estimator.fit(&array![[0.0]], &array![8.0]).unwrap();

        let mut x_filled = array![[0.0, 0.0], [0.0, 0.0]];
        let mask = array![[false, true], [false, true]];
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        imputer
            .impute_one_feature(&mut x_filled, &mask, 1, &[0], Some(&estimator), &mut rng)
            .unwrap();
        assert_eq!(x_filled.column(1).to_vec(), vec![1.0, 1.0]);
    }

    #[test]
    fn test_unsupported_estimator_rejected() {
        let config = quick_config().with_estimator(LinearRegression::new());
        let mut imputer = MICEImputer::with_config(config);
        let err = imputer.fit(&small_data()).unwrap_err();

        assert!(err.is_config_error());
        assert!(!imputer.is_fitted());
        assert!(imputer.imputation_sequence().is_empty());
    }

    #[test]
    fn test_transform_before_fit() {
        let imputer = MICEImputer::new();
        let err = imputer.transform(&small_data()).unwrap_err();
        assert!(matches!(err, ImputeError::ModelNotFitted));
        assert!(imputer.save("unused.json").is_err());
    }

    #[test]
    fn test_transform_shape_mismatch() {
        let mut imputer = MICEImputer::with_config(quick_config());
        imputer.fit(&small_data()).unwrap();
        let err = imputer.transform(&array![[1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, ImputeError::ShapeError { .. }));
    }

    #[test]
    fn test_replay_matches_fit_on_complete_rows() {
        let mut imputer = MICEImputer::with_config(quick_config());
        imputer.fit(&small_data()).unwrap();

        let complete = array![[2.0, 3.0, 4.0], [5.0, 6.0, 7.0]];
        assert_eq!(imputer.transform(&complete).unwrap(), complete);
    }

    #[test]
    fn test_neighbor_cap_limits_predictors() {
        let data = array![
            [1.0, 2.0, NAN, 4.0],
            [2.0, NAN, 6.0, 8.0],
            [3.0, 6.0, 9.0, NAN],
            [NAN, 8.0, 12.0, 16.0],
            [5.0, 10.0, 15.0, 20.0],
            [6.0, 12.0, 18.0, 24.0],
        ];
        let config = quick_config()
            .with_n_nearest_features(2)
            .with_imputation_order(ImputationOrder::Random);
        let mut imputer = MICEImputer::with_config(config);
        imputer.fit(&data).unwrap();

        for step in imputer.imputation_sequence() {
            assert_eq!(step.neighbor_feat_idx.len(), 2);
            assert!(!step.neighbor_feat_idx.contains(&step.feat_idx));
        }
    }

    #[test]
    fn test_serde_roundtrip_replays_identically() {
        let mut imputer = MICEImputer::with_config(quick_config());
        imputer.fit(&small_data()).unwrap();

        let json = serde_json::to_string(&imputer).unwrap();
        let restored: MICEImputer = serde_json::from_str(&json).unwrap();
        let x_new = array![[NAN, 3.0, 4.0], [8.0, NAN, 10.0]];
        assert_eq!(
            imputer.transform(&x_new).unwrap(),
            restored.transform(&x_new).unwrap()
        );
    }

    #[test]
    fn test_accumulator_averages_missing_cells_only() {
        let mask = array![[true, false]];
        let mut draws = DrawAccumulator::new((1, 2));
        draws.record(&array![[1.0, 9.0]], &mask);
        draws.record(&array![[3.0, 9.0]], &mask);

        let mut x_filled = array![[5.0, 9.0]];
        assert_eq!(draws.finish(&mut x_filled, &mask), 2);
        assert_eq!(x_filled, array![[2.0, 9.0]]);
    }
}
