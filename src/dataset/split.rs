use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Dataset;
use crate::error::SplitError;

pub const DEFAULT_TRAIN_FRACTION: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub train_fraction: f64,
    pub seed: Option<u64>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_fraction: DEFAULT_TRAIN_FRACTION,
            seed: None,
        }
    }
}

/// Shuffled training and held-out partitions of one dataset.
#[derive(Debug, Clone)]
pub struct SplitDataset {
    pub train: Dataset,
    pub test: Dataset,
}

impl SplitDataset {
    /// Fails if either side ended up with no rows.
    pub fn ensure_non_empty(&self) -> Result<(), SplitError> {
        if self.train.is_empty() || self.test.is_empty() {
            return Err(SplitError::EmptyPartition {
                train: self.train.len(),
                test: self.test.len(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Splitter {
    fraction: f64,
    seed: Option<u64>,
}

impl Splitter {
    pub fn new(fraction: f64) -> Result<Self, SplitError> {
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(SplitError::InvalidFraction(fraction));
        }
        Ok(Self {
            fraction,
            seed: None,
        })
    }

    pub fn from_config(config: &SplitConfig) -> Result<Self, SplitError> {
        Ok(Self::new(config.train_fraction)?.with_seed(config.seed))
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Rows that land in the training partition for a dataset of `rows`.
    pub fn train_len(&self, rows: usize) -> usize {
        (rows as f64 * self.fraction).floor() as usize
    }

    /// Shuffle rows (features and labels in lockstep) and cut at `floor(N * fraction)`.
    ///
    /// Either partition may be empty for tiny datasets; callers that need both
    /// use [`SplitDataset::ensure_non_empty`].
    pub fn split(&self, dataset: &Dataset) -> Result<SplitDataset, SplitError> {
        let rows = dataset.len();
        if rows == 0 {
            return Err(SplitError::Empty);
        }

        let mut order: Vec<usize> = (0..rows).collect();
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        order.shuffle(&mut rng);

        let cut = self.train_len(rows);
        let (train_rows, test_rows) = order.split_at(cut);
        debug!(rows, train = train_rows.len(), test = test_rows.len(), "split dataset");
        Ok(SplitDataset {
            train: dataset.select(train_rows),
            test: dataset.select(test_rows),
        })
    }
}
