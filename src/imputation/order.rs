//! Order in which incomplete features are visited within a round

use crate::error::{ImputeError, Result};
use ndarray::{Array2, Axis};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Feature visiting order, named after the orderings of the R `mice` package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImputationOrder {
    /// Left to right
    Roman,
    /// Right to left
    Arabic,
    /// Most missing values first
    #[default]
    Monotone,
    /// Fewest missing values first
    RevMonotone,
    /// Fresh random permutation every round
    Random,
}

impl fmt::Display for ImputationOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImputationOrder::Roman => "roman",
            ImputationOrder::Arabic => "arabic",
            ImputationOrder::Monotone => "monotone",
            ImputationOrder::RevMonotone => "revmonotone",
            ImputationOrder::Random => "random",
        };
        f.write_str(name)
    }
}

impl FromStr for ImputationOrder {
    type Err = ImputeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "roman" => Ok(ImputationOrder::Roman),
            "arabic" => Ok(ImputationOrder::Arabic),
            "monotone" => Ok(ImputationOrder::Monotone),
            "revmonotone" => Ok(ImputationOrder::RevMonotone),
            "random" => Ok(ImputationOrder::Random),
            other => Err(ImputeError::ConfigError(format!(
                "Unsupported imputation order '{}', expected one of roman, arabic, monotone, revmonotone, random",
                other
            ))),
        }
    }
}

impl ImputationOrder {
    /// Features to impute this round, in visiting order.
    ///
    /// Features without any missing value are never visited.
    pub fn ordered_features<R>(&self, mask: &Array2<bool>, rng: &mut R) -> Vec<usize>
    where
        R: Rng + ?Sized,
    {
        let n_features = mask.ncols();
        let missing_counts: Vec<usize> = mask
            .axis_iter(Axis(1))
            .map(|column| column.iter().filter(|&&m| m).count())
            .collect();

        let ordered: Vec<usize> = match self {
            ImputationOrder::Roman => (0..n_features).collect(),
            ImputationOrder::Arabic => (0..n_features).rev().collect(),
            ImputationOrder::Monotone => {
                let mut inds = ascending_by_missing(&missing_counts);
                inds.reverse();
                inds
            }
            ImputationOrder::RevMonotone => ascending_by_missing(&missing_counts),
            ImputationOrder::Random => {
                let mut inds: Vec<usize> = (0..n_features).collect();
                inds.shuffle(rng);
                inds
            }
        };

        ordered
            .into_iter()
            .filter(|&j| missing_counts[j] > 0)
            .collect()
    }
}

/// Stable argsort by missing count; every column has the same row count,
/// so counts order exactly as fractions do
fn ascending_by_missing(missing_counts: &[usize]) -> Vec<usize> {
    let mut inds: Vec<usize> = (0..missing_counts.len()).collect();
    inds.sort_by_key(|&j| missing_counts[j]);
    inds
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn sample_mask() -> Array2<bool> {
        // missing counts per feature: [0, 2, 1, 3]
        array![
            [false, true, false, true],
            [false, true, true, true],
            [false, false, false, true],
        ]
    }

    #[test]
    fn test_roman_and_arabic() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mask = sample_mask();
        assert_eq!(ImputationOrder::Roman.ordered_features(&mask, &mut rng), vec![1, 2, 3]);
        assert_eq!(ImputationOrder::Arabic.ordered_features(&mask, &mut rng), vec![3, 2, 1]);
    }

    #[test]
    fn test_monotone_orders() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mask = sample_mask();
        assert_eq!(ImputationOrder::Monotone.ordered_features(&mask, &mut rng), vec![3, 1, 2]);
        assert_eq!(ImputationOrder::RevMonotone.ordered_features(&mask, &mut rng), vec![2, 1, 3]);
    }

    #[test]
    fn test_random_skips_complete_features() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mask = sample_mask();
        let mut order = ImputationOrder::Random.ordered_features(&mask, &mut rng);
        assert!(!order.contains(&0));
        order.sort_unstable();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn test_random_redrawn_each_call() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mask = Array2::from_elem((4, 10), true);
        let orders: Vec<Vec<usize>> = (0..5)
            .map(|_| ImputationOrder::Random.ordered_features(&mask, &mut rng))
            .collect();
        assert!(orders.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn test_parse_order() {
        assert_eq!("revmonotone".parse::<ImputationOrder>().unwrap(), ImputationOrder::RevMonotone);
        assert!("sideways".parse::<ImputationOrder>().unwrap_err().is_config_error());
    }
}
