//! Sequential Minimal Optimization (SMO) solver
//!
//! Platt-style two-variable solver for the binary soft-margin dual. The
//! multiclass layer feeds it one class pair at a time with ±1 labels.

use crate::cache::KernelCache;
use crate::core::{PipelineError, Result, SolverConfig};
use crate::kernel::Kernel;
use std::sync::Arc;

/// Result of a binary SMO run
#[derive(Debug, Clone)]
pub struct SolverOutput {
    /// Lagrange multipliers (one per training row)
    pub alpha: Vec<f64>,
    /// Bias term
    pub bias: f64,
    /// Indices of support vectors (alpha above tolerance)
    pub support: Vec<usize>,
    /// Number of outer iterations performed
    pub iterations: usize,
}

/// SMO solver for the binary SVM dual problem
pub struct SmoSolver {
    kernel: Arc<dyn Kernel>,
    config: SolverConfig,
}

impl SmoSolver {
    /// Create a new solver with the given kernel and configuration
    pub fn new(kernel: Arc<dyn Kernel>, config: SolverConfig) -> Self {
        Self { kernel, config }
    }

    /// Solve for rows with ±1 labels
    pub fn solve(&self, rows: &[Vec<f64>], labels: &[f64]) -> Result<SolverOutput> {
        if rows.is_empty() {
            return Err(PipelineError::EmptyDataset);
        }
        if rows.len() != labels.len() {
            return Err(PipelineError::InvalidDataset(format!(
                "{} rows but {} labels",
                rows.len(),
                labels.len()
            )));
        }
        for &y in labels {
            if y != 1.0 && y != -1.0 {
                return Err(PipelineError::InvalidDataset(format!(
                    "solver labels must be +1 or -1, got {y}"
                )));
            }
        }

        let n = rows.len();
        let mut cache = KernelCache::with_entries(self.config.cache_entries);
        let mut alpha = vec![0.0; n];
        // E_i = output_i - y_i; all outputs start at 0
        let mut errors: Vec<f64> = labels.iter().map(|&y| -y).collect();

        let mut iterations = 0;
        let mut num_changed = 0;
        let mut examine_all = true;

        while (num_changed > 0 || examine_all) && iterations < self.config.max_iterations {
            num_changed = 0;

            if examine_all {
                for i in 0..n {
                    if self.examine(i, rows, labels, &mut alpha, &mut errors, &mut cache) {
                        num_changed += 1;
                    }
                }
            } else {
                for i in 0..n {
                    if alpha[i] > 0.0
                        && alpha[i] < self.config.cost
                        && self.examine(i, rows, labels, &mut alpha, &mut errors, &mut cache)
                    {
                        num_changed += 1;
                    }
                }
            }

            if examine_all {
                examine_all = false;
            } else if num_changed == 0 {
                examine_all = true;
            }
            iterations += 1;
        }

        let bias = self.compute_bias(&alpha, &errors);
        let support: Vec<usize> = alpha
            .iter()
            .enumerate()
            .filter_map(|(i, &a)| (a > self.config.tolerance).then_some(i))
            .collect();

        Ok(SolverOutput {
            alpha,
            bias,
            support,
            iterations,
        })
    }

    /// Check KKT conditions at i and try one optimization step
    fn examine(
        &self,
        i: usize,
        rows: &[Vec<f64>],
        labels: &[f64],
        alpha: &mut [f64],
        errors: &mut [f64],
        cache: &mut KernelCache,
    ) -> bool {
        let r_i = errors[i] * labels[i];
        let violates = (r_i < -self.config.tolerance && alpha[i] < self.config.cost)
            || (r_i > self.config.tolerance && alpha[i] > 0.0);
        if !violates {
            return false;
        }

        // Second-choice heuristic: maximize |E_i - E_j|
        let e_i = errors[i];
        let mut best = None;
        let mut max_diff = 0.0;
        for (j, &e_j) in errors.iter().enumerate() {
            if j == i {
                continue;
            }
            let diff = (e_i - e_j).abs();
            if diff > max_diff {
                max_diff = diff;
                best = Some(j);
            }
        }

        match best {
            Some(j) => self.take_step(i, j, rows, labels, alpha, errors, cache),
            None => false,
        }
    }

    /// Jointly optimize alpha_i and alpha_j
    #[allow(clippy::too_many_arguments)]
    fn take_step(
        &self,
        i: usize,
        j: usize,
        rows: &[Vec<f64>],
        labels: &[f64],
        alpha: &mut [f64],
        errors: &mut [f64],
        cache: &mut KernelCache,
    ) -> bool {
        if i == j {
            return false;
        }

        let y_i = labels[i];
        let y_j = labels[j];
        let alpha_i_old = alpha[i];
        let alpha_j_old = alpha[j];
        let e_i = errors[i];
        let e_j = errors[j];
        let cost = self.config.cost;

        let (low, high) = if y_i != y_j {
            let diff = alpha_j_old - alpha_i_old;
            (0.0_f64.max(diff), cost.min(cost + diff))
        } else {
            let sum = alpha_i_old + alpha_j_old;
            (0.0_f64.max(sum - cost), cost.min(sum))
        };
        if low >= high {
            return false;
        }

        let kernel = Arc::clone(&self.kernel);
        let k_ii = cache.get_or_compute(i, i, || kernel.compute(&rows[i], &rows[i]));
        let k_ij = cache.get_or_compute(i, j, || kernel.compute(&rows[i], &rows[j]));
        let k_jj = cache.get_or_compute(j, j, || kernel.compute(&rows[j], &rows[j]));

        let eta = k_ii + k_jj - 2.0 * k_ij;
        if eta <= 0.0 {
            // Non-positive-definite direction; skip rather than evaluate the
            // objective at the bounds.
            return false;
        }

        let alpha_j_new = (alpha_j_old + y_j * (e_i - e_j) / eta).clamp(low, high);
        if (alpha_j_new - alpha_j_old).abs()
            < self.config.tolerance * (alpha_j_new + alpha_j_old + self.config.tolerance)
        {
            return false;
        }

        let alpha_i_new = alpha_i_old + y_i * y_j * (alpha_j_old - alpha_j_new);
        alpha[i] = alpha_i_new;
        alpha[j] = alpha_j_new;

        let delta_i = y_i * (alpha_i_new - alpha_i_old);
        let delta_j = y_j * (alpha_j_new - alpha_j_old);
        for k in 0..rows.len() {
            let k_ik = cache.get_or_compute(i, k, || kernel.compute(&rows[i], &rows[k]));
            let k_jk = cache.get_or_compute(j, k, || kernel.compute(&rows[j], &rows[k]));
            errors[k] += delta_i * k_ik + delta_j * k_jk;
        }

        true
    }

    /// Bias from margin support vectors, falling back to all support vectors
    fn compute_bias(&self, alpha: &[f64], errors: &[f64]) -> f64 {
        let tol = self.config.tolerance;
        let on_margin: Vec<f64> = alpha
            .iter()
            .zip(errors.iter())
            .filter(|(&a, _)| a > tol && a < self.config.cost - tol)
            .map(|(_, &e)| e)
            .collect();
        if !on_margin.is_empty() {
            return -on_margin.iter().sum::<f64>() / on_margin.len() as f64;
        }

        let support: Vec<f64> = alpha
            .iter()
            .zip(errors.iter())
            .filter(|(&a, _)| a > tol)
            .map(|(_, &e)| e)
            .collect();
        if support.is_empty() {
            0.0
        } else {
            -support.iter().sum::<f64>() / support.len() as f64
        }
    }
}
