//! Centering and scaling to training statistics

use crate::core::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Guard against dividing by a numerically zero standard deviation
const MIN_STD: f64 = 1e-12;

/// Per-feature mean and standard deviation learned from training rows.
///
/// Transforms each observed value to (x - mean) / std. A constant column is
/// only centered. NaN cells pass through untouched so the step composes with
/// imputation in either order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizeStats {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl NormalizeStats {
    /// Fit means and standard deviations (sample variance, n - 1)
    pub fn fit(rows: &[Vec<f64>], n_cols: usize) -> Result<Self> {
        if rows.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }

        let mut means = vec![0.0; n_cols];
        let mut stds = vec![0.0; n_cols];
        for j in 0..n_cols {
            let observed: Vec<f64> = rows
                .iter()
                .map(|row| row[j])
                .filter(|v| !v.is_nan())
                .collect();
            if observed.is_empty() {
                return Err(PipelineError::InvalidDataset(format!(
                    "feature column {j} has no observed values to normalize"
                )));
            }
            let mean = observed.iter().sum::<f64>() / observed.len() as f64;
            let variance = if observed.len() > 1 {
                observed.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                    / (observed.len() - 1) as f64
            } else {
                0.0
            };
            means[j] = mean;
            stds[j] = variance.sqrt();
        }

        Ok(Self { means, stds })
    }

    /// Center and scale a row in place
    pub fn transform_row(&self, row: &mut [f64]) {
        for (j, v) in row.iter_mut().enumerate() {
            if v.is_nan() {
                continue;
            }
            *v -= self.means[j];
            if self.stds[j] > MIN_STD {
                *v /= self.stds[j];
            }
        }
    }

    /// Fitted means
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Fitted standard deviations
    pub fn stds(&self) -> &[f64] {
        &self.stds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fit_and_transform() {
        let rows = vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0]];
        let stats = NormalizeStats::fit(&rows, 2).unwrap();

        assert_relative_eq!(stats.means()[0], 2.0);
        assert_relative_eq!(stats.means()[1], 20.0);
        assert_relative_eq!(stats.stds()[0], 1.0);
        assert_relative_eq!(stats.stds()[1], 10.0);

        let mut row = vec![3.0, 10.0];
        stats.transform_row(&mut row);
        assert_relative_eq!(row[0], 1.0);
        assert_relative_eq!(row[1], -1.0);
    }

    #[test]
    fn test_constant_column_only_centered() {
        let rows = vec![vec![5.0], vec![5.0], vec![5.0]];
        let stats = NormalizeStats::fit(&rows, 1).unwrap();
        let mut row = vec![7.0];
        stats.transform_row(&mut row);
        assert_relative_eq!(row[0], 2.0);
    }

    #[test]
    fn test_nan_passes_through() {
        let rows = vec![vec![1.0], vec![3.0]];
        let stats = NormalizeStats::fit(&rows, 1).unwrap();
        let mut row = vec![f64::NAN];
        stats.transform_row(&mut row);
        assert!(row[0].is_nan());
    }

    #[test]
    fn test_fit_skips_nan() {
        let rows = vec![vec![1.0], vec![f64::NAN], vec![3.0]];
        let stats = NormalizeStats::fit(&rows, 1).unwrap();
        assert_relative_eq!(stats.means()[0], 2.0);
    }

    #[test]
    fn test_fit_rejects_all_missing_column() {
        let rows = vec![vec![f64::NAN], vec![f64::NAN]];
        assert!(NormalizeStats::fit(&rows, 1).is_err());
    }
}
