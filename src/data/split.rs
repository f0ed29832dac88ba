//! Stratified train/test splitting

use crate::core::{PipelineError, Result};
use crate::data::Dataset;
use log::debug;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seeded stratified train/test split.
///
/// Each class is shuffled and divided independently so the train and test
/// partitions keep the class proportions of the full dataset.
#[derive(Debug, Clone, Copy)]
pub struct StratifiedSplit {
    proportion: f64,
    seed: u64,
}

impl StratifiedSplit {
    /// Create a split holding out `1 - proportion` of each class for testing
    pub fn new(proportion: f64) -> Result<Self> {
        if proportion <= 0.0 || proportion >= 1.0 {
            return Err(PipelineError::InvalidParameter(format!(
                "train proportion must be in (0, 1), got {proportion}"
            )));
        }
        Ok(Self {
            proportion,
            seed: 0,
        })
    }

    /// Set the shuffle seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Training fraction
    pub fn proportion(&self) -> f64 {
        self.proportion
    }

    /// Split into (train, test)
    pub fn split(&self, data: &Dataset) -> Result<(Dataset, Dataset)> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); data.n_classes()];
        for i in 0..data.len() {
            by_class[data.label(i)].push(i);
        }

        let mut train_idx = Vec::new();
        let mut test_idx = Vec::new();
        for indices in by_class.iter_mut() {
            if indices.is_empty() {
                continue;
            }
            indices.shuffle(&mut rng);
            // Singleton classes stay in the training set.
            let n_train = ((indices.len() as f64 * self.proportion).round() as usize)
                .clamp(1, indices.len());
            train_idx.extend_from_slice(&indices[..n_train]);
            test_idx.extend_from_slice(&indices[n_train..]);
        }

        if test_idx.is_empty() {
            return Err(PipelineError::InvalidDataset(
                "test partition is empty; lower the train proportion or add data".to_string(),
            ));
        }

        train_idx.sort_unstable();
        test_idx.sort_unstable();
        debug!(
            "stratified split: {} train / {} test rows",
            train_idx.len(),
            test_idx.len()
        );

        Ok((data.subset(&train_idx)?, data.subset(&test_idx)?))
    }
}
