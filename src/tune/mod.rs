//! Grid search over resampled performance estimates
//!
//! For every cross-validation split, the recipe is fitted on the analysis
//! rows alone and replayed on the assessment rows, then every grid candidate
//! is trained and scored on that same pair. Candidates are summarized by mean
//! accuracy and mean ROC AUC across all splits.

pub mod grid;

pub use grid::{ParamGrid, ParamSet};

use crate::core::{PipelineError, Result};
use crate::data::Dataset;
use crate::metrics::{accuracy, roc_auc};
use crate::model::SvmSpec;
use crate::recipe::Recipe;
use crate::resample::VfoldCv;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Metric used to pick the winning candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TuneMetric {
    Accuracy,
    RocAuc,
}

impl TuneMetric {
    /// Short identifier for summaries
    pub fn name(&self) -> &'static str {
        match self {
            TuneMetric::Accuracy => "accuracy",
            TuneMetric::RocAuc => "roc_auc",
        }
    }
}

/// Mean, standard error and count of a resampled metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub std_err: f64,
    pub n: usize,
}

impl MetricSummary {
    fn from_values(values: &[f64]) -> Self {
        let n = values.len();
        if n == 0 {
            return Self {
                mean: 0.0,
                std_err: 0.0,
                n: 0,
            };
        }
        let mean = values.iter().sum::<f64>() / n as f64;
        if n == 1 {
            return Self {
                mean,
                std_err: 0.0,
                n,
            };
        }
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        Self {
            mean,
            std_err: (var / n as f64).sqrt(),
            n,
        }
    }
}

/// Resampled performance of one grid candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub params: ParamSet,
    pub accuracy: MetricSummary,
    pub roc_auc: MetricSummary,
}

impl CandidateSummary {
    fn metric(&self, metric: TuneMetric) -> &MetricSummary {
        match metric {
            TuneMetric::Accuracy => &self.accuracy,
            TuneMetric::RocAuc => &self.roc_auc,
        }
    }
}

/// All candidate summaries from one grid search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuneResults {
    candidates: Vec<CandidateSummary>,
}

impl TuneResults {
    /// Candidate summaries in grid order
    pub fn candidates(&self) -> &[CandidateSummary] {
        &self.candidates
    }

    /// Candidates sorted best-first by the given metric
    pub fn rank(&self, metric: TuneMetric) -> Vec<&CandidateSummary> {
        let mut ranked: Vec<&CandidateSummary> = self.candidates.iter().collect();
        ranked.sort_by(|a, b| {
            b.metric(metric)
                .mean
                .partial_cmp(&a.metric(metric).mean)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked
    }

    /// Pick the winning candidate by mean metric, breaking ties with the
    /// other metric's mean
    pub fn select_best(&self, metric: TuneMetric) -> Result<&CandidateSummary> {
        let other = match metric {
            TuneMetric::Accuracy => TuneMetric::RocAuc,
            TuneMetric::RocAuc => TuneMetric::Accuracy,
        };
        self.candidates
            .iter()
            .max_by(|a, b| {
                a.metric(metric)
                    .mean
                    .partial_cmp(&b.metric(metric).mean)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(
                        a.metric(other)
                            .mean
                            .partial_cmp(&b.metric(other).mean)
                            .unwrap_or(std::cmp::Ordering::Equal),
                    )
            })
            .ok_or_else(|| {
                PipelineError::InvalidParameter("grid produced no candidates".to_string())
            })
    }
}

/// Grid search: estimate every candidate's performance by cross-validation.
///
/// The recipe is re-fitted inside each split so no assessment row leaks into
/// the preprocessing statistics.
pub fn tune_grid(
    data: &Dataset,
    recipe: &Recipe,
    spec: &SvmSpec,
    param_grid: &ParamGrid,
    cv: &VfoldCv,
) -> Result<TuneResults> {
    let candidates = param_grid.candidates()?;
    let splits = cv.splits(data.labels())?;
    info!(
        "tuning {} candidates over {} resamples",
        candidates.len(),
        splits.len()
    );

    let mut acc_values = vec![Vec::with_capacity(splits.len()); candidates.len()];
    let mut auc_values = vec![Vec::with_capacity(splits.len()); candidates.len()];

    for split in &splits {
        let analysis = data.subset(&split.analysis)?;
        let assessment = data.subset(&split.assessment)?;

        let fitted_recipe = recipe.fit(&analysis)?;
        let train = fitted_recipe.apply(&analysis)?;
        let test = fitted_recipe.apply(&assessment)?;

        for (c, params) in candidates.iter().enumerate() {
            let model = spec.clone().with_params(*params).fit(&train)?;
            let predictions = model.predict_dataset(&test)?;

            let predicted: Vec<usize> = predictions.iter().map(|p| p.class).collect();
            let scores: Vec<Vec<f64>> = predictions.iter().map(|p| p.scores.clone()).collect();

            acc_values[c].push(accuracy(test.labels(), &predicted)?);
            match roc_auc(test.labels(), &scores) {
                Ok(auc) => auc_values[c].push(auc),
                // A fold can miss a class entirely in tiny datasets.
                Err(_) => debug!(
                    "repeat {} fold {}: ROC AUC undefined, skipping",
                    split.repeat, split.fold
                ),
            }
        }
    }

    let candidates = candidates
        .into_iter()
        .enumerate()
        .map(|(c, params)| CandidateSummary {
            params,
            accuracy: MetricSummary::from_values(&acc_values[c]),
            roc_auc: MetricSummary::from_values(&auc_values[c]),
        })
        .collect();

    Ok(TuneResults { candidates })
}
