//! Core type definitions for the classification pipeline

/// Training sample: dense feature row plus class id
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    /// Feature values (missing values are NaN before imputation)
    pub features: Vec<f64>,
    /// Class id into the dataset's class table
    pub label: usize,
}

impl Sample {
    /// Create a new sample
    pub fn new(features: Vec<f64>, label: usize) -> Self {
        Self { features, label }
    }
}

/// Prediction result: winning class plus per-class scores
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Predicted class id
    pub class: usize,
    /// Per-class scores, normalized to sum to 1
    pub scores: Vec<f64>,
}

impl Prediction {
    /// Create a new prediction
    pub fn new(class: usize, scores: Vec<f64>) -> Self {
        Self { class, scores }
    }

    /// Score of the predicted class
    pub fn confidence(&self) -> f64 {
        self.scores.get(self.class).copied().unwrap_or(0.0)
    }
}

/// Configuration for the binary SMO solver
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Soft-margin cost parameter (upper bound for alpha)
    pub cost: f64,
    /// Tolerance for KKT conditions
    pub tolerance: f64,
    /// Maximum number of outer iterations
    pub max_iterations: usize,
    /// Kernel cache capacity in entries
    pub cache_entries: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            cost: 1.0,
            tolerance: 0.001,
            max_iterations: 10_000,
            cache_entries: 1 << 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample() {
        let sample = Sample::new(vec![1.0, 2.0, 3.0], 2);
        assert_eq!(sample.label, 2);
        assert_eq!(sample.features.len(), 3);
    }

    #[test]
    fn test_prediction_confidence() {
        let pred = Prediction::new(1, vec![0.2, 0.5, 0.3]);
        assert_eq!(pred.class, 1);
        assert_eq!(pred.confidence(), 0.5);
    }

    #[test]
    fn test_prediction_confidence_out_of_range() {
        let pred = Prediction::new(5, vec![0.5, 0.5]);
        assert_eq!(pred.confidence(), 0.0);
    }

    #[test]
    fn test_solver_config_default() {
        let config = SolverConfig::default();
        assert_eq!(config.cost, 1.0);
        assert_eq!(config.tolerance, 0.001);
        assert_eq!(config.max_iterations, 10_000);
        assert!(config.cache_entries > 0);
    }
}
