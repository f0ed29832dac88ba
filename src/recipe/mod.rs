//! Trainable preprocessing recipe
//!
//! A recipe is an ordered list of preprocessing steps. Fitting a recipe learns
//! every step's statistics from the training rows only; applying the fitted
//! recipe replays those statistics on any rows without re-estimating them, so
//! resampled tuning stays free of information leakage.

pub mod filter;
pub mod impute;
pub mod normalize;

pub use impute::KnnImputer;
pub use normalize::NormalizeStats;

use crate::core::{PipelineError, Result};
use crate::data::Dataset;
use filter::nzv_keep;
use log::info;
use serde::{Deserialize, Serialize};

/// A preprocessing step declaration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Step {
    /// Impute missing values from the k nearest complete training rows
    ImputeKnn { k: usize },
    /// Center and scale each feature to training mean/std
    Normalize,
    /// Drop near-zero-variance columns
    Nzv,
}

/// Ordered preprocessing plan (builder)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recipe {
    steps: Vec<Step>,
}

impl Recipe {
    /// Empty recipe (identity transform)
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a KNN imputation step
    pub fn step_impute_knn(mut self, k: usize) -> Self {
        self.steps.push(Step::ImputeKnn { k });
        self
    }

    /// Append a center-and-scale step
    pub fn step_normalize(mut self) -> Self {
        self.steps.push(Step::Normalize);
        self
    }

    /// Append a near-zero-variance filter step
    pub fn step_nzv(mut self) -> Self {
        self.steps.push(Step::Nzv);
        self
    }

    /// Declared steps in order
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Learn every step's statistics from the training dataset
    pub fn fit(&self, data: &Dataset) -> Result<FittedRecipe> {
        let mut matrix: Vec<Vec<f64>> = data.rows().to_vec();
        let mut names: Vec<String> = data.feature_names().to_vec();
        let mut fitted = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            match *step {
                Step::ImputeKnn { k } => {
                    let imputer = KnnImputer::fit(k, &matrix)?;
                    for row in &mut matrix {
                        imputer.transform_row(row);
                    }
                    fitted.push(FittedStep::ImputeKnn(imputer));
                }
                Step::Normalize => {
                    let stats = NormalizeStats::fit(&matrix, names.len())?;
                    for row in &mut matrix {
                        stats.transform_row(row);
                    }
                    fitted.push(FittedStep::Normalize(stats));
                }
                Step::Nzv => {
                    let keep = nzv_keep(&matrix, names.len());
                    if keep.is_empty() {
                        return Err(PipelineError::InvalidDataset(
                            "near-zero-variance filter removed every feature column".to_string(),
                        ));
                    }
                    if keep.len() < names.len() {
                        let dropped: Vec<&str> = names
                            .iter()
                            .enumerate()
                            .filter(|(j, _)| !keep.contains(j))
                            .map(|(_, n)| n.as_str())
                            .collect();
                        info!("near-zero-variance filter dropped: {}", dropped.join(", "));
                    }
                    select_columns(&mut matrix, &keep);
                    names = keep.iter().map(|&j| names[j].clone()).collect();
                    fitted.push(FittedStep::Nzv { keep });
                }
            }
        }

        Ok(FittedRecipe {
            input_features: data.feature_names().to_vec(),
            output_features: names,
            steps: fitted,
        })
    }
}

/// A step with learned statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FittedStep {
    ImputeKnn(KnnImputer),
    Normalize(NormalizeStats),
    Nzv { keep: Vec<usize> },
}

/// Recipe with statistics learned from a training dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedRecipe {
    input_features: Vec<String>,
    output_features: Vec<String>,
    steps: Vec<FittedStep>,
}

impl FittedRecipe {
    /// Feature columns expected by `apply`
    pub fn input_features(&self) -> &[String] {
        &self.input_features
    }

    /// Feature columns produced by `apply`
    pub fn output_features(&self) -> &[String] {
        &self.output_features
    }

    /// Replay the fitted transformations on a dataset
    pub fn apply(&self, data: &Dataset) -> Result<Dataset> {
        if data.n_features() != self.input_features.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.input_features.len(),
                actual: data.n_features(),
            });
        }

        let mut matrix: Vec<Vec<f64>> = data.rows().to_vec();
        for step in &self.steps {
            match step {
                FittedStep::ImputeKnn(imputer) => {
                    for row in &mut matrix {
                        imputer.transform_row(row);
                    }
                }
                FittedStep::Normalize(stats) => {
                    for row in &mut matrix {
                        stats.transform_row(row);
                    }
                }
                FittedStep::Nzv { keep } => {
                    select_columns(&mut matrix, keep);
                }
            }
        }

        data.with_features(self.output_features.clone(), matrix)
    }
}

fn select_columns(matrix: &mut Vec<Vec<f64>>, keep: &[usize]) {
    for row in matrix.iter_mut() {
        *row = keep.iter().map(|&j| row[j]).collect();
    }
}
