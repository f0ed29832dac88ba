//! Hyperparameter grids

use crate::core::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One candidate point in hyperparameter space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamSet {
    /// Soft-margin cost
    pub cost: f64,
    /// RBF kernel gamma
    pub gamma: f64,
    /// Solver KKT tolerance
    pub tolerance: f64,
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cost={:.4} gamma={:.6} tolerance={:.0e}",
            self.cost, self.gamma, self.tolerance
        )
    }
}

/// Cartesian grid over the three tunable hyperparameters
#[derive(Debug, Clone, PartialEq)]
pub struct ParamGrid {
    cost: Vec<f64>,
    gamma: Vec<f64>,
    tolerance: Vec<f64>,
}

impl ParamGrid {
    /// Empty grid; fill it with the `with_*` builders
    pub fn new() -> Self {
        Self {
            cost: Vec::new(),
            gamma: Vec::new(),
            tolerance: Vec::new(),
        }
    }

    /// Regular grid with `levels` values per parameter: cost log2-spaced over
    /// [2^-2, 2^6], gamma log10-spaced over [1e-3, 1], tolerance fixed at
    /// {1e-3, 1e-2} capped to `levels`.
    pub fn regular(levels: usize) -> Result<Self> {
        if levels == 0 {
            return Err(PipelineError::InvalidParameter(
                "grid needs at least one level per parameter".to_string(),
            ));
        }
        let cost = log_spaced(2.0, -2.0, 6.0, levels);
        let gamma = log_spaced(10.0, -3.0, 0.0, levels);
        let tolerance: Vec<f64> = [1e-3, 1e-2].into_iter().take(levels).collect();
        Ok(Self {
            cost,
            gamma,
            tolerance,
        })
    }

    /// Set the cost values to sweep
    pub fn with_cost(mut self, values: Vec<f64>) -> Self {
        self.cost = values;
        self
    }

    /// Set the gamma values to sweep
    pub fn with_gamma(mut self, values: Vec<f64>) -> Self {
        self.gamma = values;
        self
    }

    /// Set the tolerance values to sweep
    pub fn with_tolerance(mut self, values: Vec<f64>) -> Self {
        self.tolerance = values;
        self
    }

    /// Expand the grid into candidate parameter sets
    pub fn candidates(&self) -> Result<Vec<ParamSet>> {
        if self.cost.is_empty() || self.gamma.is_empty() || self.tolerance.is_empty() {
            return Err(PipelineError::InvalidParameter(
                "grid must have at least one value per parameter".to_string(),
            ));
        }
        for &c in &self.cost {
            if c <= 0.0 {
                return Err(PipelineError::InvalidParameter(format!(
                    "grid cost must be positive, got {c}"
                )));
            }
        }
        for &g in &self.gamma {
            if g <= 0.0 {
                return Err(PipelineError::InvalidParameter(format!(
                    "grid gamma must be positive, got {g}"
                )));
            }
        }
        for &t in &self.tolerance {
            if t <= 0.0 {
                return Err(PipelineError::InvalidParameter(format!(
                    "grid tolerance must be positive, got {t}"
                )));
            }
        }

        let mut candidates =
            Vec::with_capacity(self.cost.len() * self.gamma.len() * self.tolerance.len());
        for &cost in &self.cost {
            for &gamma in &self.gamma {
                for &tolerance in &self.tolerance {
                    candidates.push(ParamSet {
                        cost,
                        gamma,
                        tolerance,
                    });
                }
            }
        }
        Ok(candidates)
    }
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self::new()
    }
}

fn log_spaced(base: f64, lo_exp: f64, hi_exp: f64, levels: usize) -> Vec<f64> {
    if levels == 1 {
        return vec![base.powf((lo_exp + hi_exp) / 2.0)];
    }
    (0..levels)
        .map(|i| {
            let t = i as f64 / (levels - 1) as f64;
            base.powf(lo_exp + t * (hi_exp - lo_exp))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_regular_grid_bounds() {
        let grid = ParamGrid::regular(3).unwrap();
        let candidates = grid.candidates().unwrap();
        // 3 costs * 3 gammas * 2 tolerances
        assert_eq!(candidates.len(), 18);

        let costs: Vec<f64> = candidates.iter().map(|c| c.cost).collect();
        assert_relative_eq!(costs.iter().copied().fold(f64::INFINITY, f64::min), 0.25);
        assert_relative_eq!(costs.iter().copied().fold(0.0, f64::max), 64.0);

        let gammas: Vec<f64> = candidates.iter().map(|c| c.gamma).collect();
        assert_relative_eq!(gammas.iter().copied().fold(f64::INFINITY, f64::min), 1e-3);
        assert_relative_eq!(gammas.iter().copied().fold(0.0, f64::max), 1.0);
    }

    #[test]
    fn test_single_level_grid() {
        let grid = ParamGrid::regular(1).unwrap();
        let candidates = grid.candidates().unwrap();
        assert_eq!(candidates.len(), 1);
        assert_relative_eq!(candidates[0].cost, 2.0_f64.powf(2.0));
        assert_relative_eq!(candidates[0].tolerance, 1e-3);
    }

    #[test]
    fn test_custom_grid() {
        let grid = ParamGrid::new()
            .with_cost(vec![1.0, 10.0])
            .with_gamma(vec![0.1])
            .with_tolerance(vec![1e-3]);
        let candidates = grid.candidates().unwrap();
        assert_eq!(candidates.len(), 2);
        assert_relative_eq!(candidates[0].gamma, 0.1);
    }

    #[test]
    fn test_invalid_grids() {
        assert!(ParamGrid::regular(0).is_err());
        assert!(ParamGrid::new().candidates().is_err());
        assert!(ParamGrid::new()
            .with_cost(vec![-1.0])
            .with_gamma(vec![0.1])
            .with_tolerance(vec![1e-3])
            .candidates()
            .is_err());
    }
}
