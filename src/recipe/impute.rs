//! Nearest-neighbor imputation of missing feature values

use crate::core::{PipelineError, Result};
use log::warn;
use serde::{Deserialize, Serialize};

/// KNN imputer fitted on training rows.
///
/// Donors are the complete training rows. Distance to a donor is the
/// NaN-skipping mean Euclidean distance over coordinates observed on both
/// sides, so rows with different missingness patterns stay comparable.
/// Missing cells take the uniform average of the k nearest donors, falling
/// back to the per-feature training mean when no donor is usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnImputer {
    k: usize,
    donors: Vec<Vec<f64>>,
    means: Vec<f64>,
}

impl KnnImputer {
    /// Fit on training rows (NaN marks a missing cell)
    pub fn fit(k: usize, rows: &[Vec<f64>]) -> Result<Self> {
        if k == 0 {
            return Err(PipelineError::InvalidParameter(
                "imputation neighbor count must be at least 1".to_string(),
            ));
        }
        if rows.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }

        let n_cols = rows[0].len();
        let mut sums = vec![0.0; n_cols];
        let mut counts = vec![0usize; n_cols];
        for row in rows {
            for (j, &v) in row.iter().enumerate() {
                if !v.is_nan() {
                    sums[j] += v;
                    counts[j] += 1;
                }
            }
        }
        for (j, &count) in counts.iter().enumerate() {
            if count == 0 {
                return Err(PipelineError::InvalidDataset(format!(
                    "feature column {j} has no observed values to impute from"
                )));
            }
        }
        let means: Vec<f64> = sums
            .iter()
            .zip(counts.iter())
            .map(|(&s, &c)| s / c as f64)
            .collect();

        let donors: Vec<Vec<f64>> = rows
            .iter()
            .filter(|row| !row.iter().any(|v| v.is_nan()))
            .cloned()
            .collect();
        if donors.is_empty() {
            warn!("no complete rows available for KNN imputation; falling back to feature means");
        }

        Ok(Self { k, donors, means })
    }

    /// Number of neighbors
    pub fn k(&self) -> usize {
        self.k
    }

    /// Fill missing cells in a row using the fitted donors
    pub fn transform_row(&self, row: &mut [f64]) {
        if !row.iter().any(|v| v.is_nan()) {
            return;
        }

        let neighbors = self.find_neighbors(row);
        for j in 0..row.len() {
            if row[j].is_nan() {
                row[j] = self.impute_value(&neighbors, j);
            }
        }
    }

    /// Indices of the k nearest complete donors, closest first
    fn find_neighbors(&self, row: &[f64]) -> Vec<usize> {
        let mut scored: Vec<(f64, usize)> = self
            .donors
            .iter()
            .enumerate()
            .map(|(i, donor)| (Self::distance(row, donor), i))
            .filter(|(d, _)| d.is_finite())
            .collect();
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.k);
        scored.into_iter().map(|(_, i)| i).collect()
    }

    /// Mean Euclidean distance over coordinates observed in both rows
    fn distance(a: &[f64], b: &[f64]) -> f64 {
        let mut accum = 0.0;
        let mut count = 0usize;
        for (&ai, &bi) in a.iter().zip(b.iter()) {
            if ai.is_nan() || bi.is_nan() {
                continue;
            }
            let d = ai - bi;
            accum += d * d;
            count += 1;
        }
        if count == 0 {
            f64::INFINITY
        } else {
            (accum / count as f64).sqrt()
        }
    }

    fn impute_value(&self, neighbors: &[usize], j: usize) -> f64 {
        if neighbors.is_empty() {
            return self.means[j];
        }
        let sum: f64 = neighbors.iter().map(|&i| self.donors[i][j]).sum();
        sum / neighbors.len() as f64
    }
}
