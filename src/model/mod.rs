//! SVM model specification and the one-vs-one multiclass classifier

use crate::core::{PipelineError, Prediction, Result, SolverConfig};
use crate::data::Dataset;
use crate::kernel::{Kernel, KernelSpec};
use crate::solver::SmoSolver;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Kernel family selected before gamma is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KernelChoice {
    Linear,
    Rbf,
}

/// Classifier specification with builder-style configuration.
///
/// The three tunable hyperparameters are `cost`, `gamma` and `tolerance`;
/// `gamma` left unset resolves to 1 / n_features at fit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmSpec {
    kernel: KernelChoice,
    cost: f64,
    gamma: Option<f64>,
    tolerance: f64,
    max_iterations: usize,
    cache_entries: usize,
}

impl SvmSpec {
    /// RBF-kernel classifier with default parameters
    pub fn rbf() -> Self {
        Self {
            kernel: KernelChoice::Rbf,
            cost: 1.0,
            gamma: None,
            tolerance: 0.001,
            max_iterations: 10_000,
            cache_entries: 1 << 20,
        }
    }

    /// Linear-kernel classifier with default parameters
    pub fn linear() -> Self {
        Self {
            kernel: KernelChoice::Linear,
            ..Self::rbf()
        }
    }

    /// Set the soft-margin cost parameter
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    /// Set the RBF gamma (ignored by the linear kernel)
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = Some(gamma);
        self
    }

    /// Set the solver KKT tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the solver iteration cap
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the kernel cache capacity in entries
    pub fn with_cache_entries(mut self, cache_entries: usize) -> Self {
        self.cache_entries = cache_entries;
        self
    }

    /// Apply a tuned parameter set (gamma only affects the RBF kernel)
    pub fn with_params(self, params: crate::tune::ParamSet) -> Self {
        self.with_cost(params.cost)
            .with_gamma(params.gamma)
            .with_tolerance(params.tolerance)
    }

    /// Kernel family
    pub fn kernel(&self) -> KernelChoice {
        self.kernel
    }

    /// Cost parameter
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Explicit gamma, if set
    pub fn gamma(&self) -> Option<f64> {
        self.gamma
    }

    /// Solver tolerance
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Solver iteration cap
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    fn validate(&self) -> Result<()> {
        if self.cost <= 0.0 {
            return Err(PipelineError::InvalidParameter(format!(
                "cost must be positive, got {}",
                self.cost
            )));
        }
        if self.tolerance <= 0.0 {
            return Err(PipelineError::InvalidParameter(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(PipelineError::InvalidParameter(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the kernel for a dataset of the given width
    pub fn resolve_kernel(&self, n_features: usize) -> Result<KernelSpec> {
        if n_features == 0 {
            return Err(PipelineError::InvalidDataset(
                "dataset has no feature columns".to_string(),
            ));
        }
        let spec = match self.kernel {
            KernelChoice::Linear => KernelSpec::Linear,
            KernelChoice::Rbf => KernelSpec::Rbf {
                gamma: self.gamma.unwrap_or(1.0 / n_features as f64),
            },
        };
        spec.validate()?;
        Ok(spec)
    }

    fn solver_config(&self) -> SolverConfig {
        SolverConfig {
            cost: self.cost,
            tolerance: self.tolerance,
            max_iterations: self.max_iterations,
            cache_entries: self.cache_entries,
        }
    }

    /// Train a one-vs-one multiclass model on a preprocessed dataset
    pub fn fit(&self, data: &Dataset) -> Result<MulticlassSvm> {
        self.validate()?;
        if data.n_classes() < 2 {
            return Err(PipelineError::InvalidDataset(
                "training requires at least two classes".to_string(),
            ));
        }

        let kernel_spec = self.resolve_kernel(data.n_features())?;
        let kernel = kernel_spec.build()?;
        let config = self.solver_config();
        let counts = data.class_counts();

        let mut machines = Vec::new();
        for pos in 0..data.n_classes() {
            for neg in (pos + 1)..data.n_classes() {
                if counts[pos] == 0 || counts[neg] == 0 {
                    debug!("skipping pair ({pos}, {neg}): a class has no samples");
                    continue;
                }
                machines.push(train_pair(data, pos, neg, &kernel, &config)?);
            }
        }

        if machines.is_empty() {
            return Err(PipelineError::InvalidDataset(
                "no class pair had samples on both sides".to_string(),
            ));
        }

        Ok(MulticlassSvm {
            kernel_spec,
            kernel,
            n_classes: data.n_classes(),
            n_features: data.n_features(),
            machines,
        })
    }
}

/// Train the binary machine for one class pair; `pos` maps to +1
fn train_pair(
    data: &Dataset,
    pos: usize,
    neg: usize,
    kernel: &Arc<dyn Kernel>,
    config: &SolverConfig,
) -> Result<PairMachine> {
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for i in 0..data.len() {
        let label = data.label(i);
        if label == pos {
            rows.push(data.row(i).to_vec());
            labels.push(1.0);
        } else if label == neg {
            rows.push(data.row(i).to_vec());
            labels.push(-1.0);
        }
    }

    let solver = SmoSolver::new(Arc::clone(kernel), config.clone());
    let output = solver.solve(&rows, &labels)?;
    debug!(
        "pair ({pos}, {neg}): {} support vectors in {} iterations",
        output.support.len(),
        output.iterations
    );

    let mut support = Vec::with_capacity(output.support.len());
    let mut coeffs = Vec::with_capacity(output.support.len());
    for &s in &output.support {
        support.push(rows[s].clone());
        coeffs.push(output.alpha[s] * labels[s]);
    }

    Ok(PairMachine {
        pos,
        neg,
        support,
        coeffs,
        bias: output.bias,
    })
}

/// Binary machine for one class pair
#[derive(Debug, Clone, PartialEq)]
pub struct PairMachine {
    /// Class id mapped to +1
    pub pos: usize,
    /// Class id mapped to -1
    pub neg: usize,
    /// Support vectors
    pub support: Vec<Vec<f64>>,
    /// alpha_i * y_i per support vector
    pub coeffs: Vec<f64>,
    /// Bias term
    pub bias: f64,
}

impl PairMachine {
    /// Signed decision value: positive favors `pos`
    pub fn decision(&self, kernel: &dyn Kernel, x: &[f64]) -> f64 {
        let mut sum = self.bias;
        for (sv, &coeff) in self.support.iter().zip(self.coeffs.iter()) {
            sum += coeff * kernel.compute(sv, x);
        }
        sum
    }

    /// Number of support vectors
    pub fn n_support_vectors(&self) -> usize {
        self.support.len()
    }
}

/// One-vs-one multiclass SVM
pub struct MulticlassSvm {
    kernel_spec: KernelSpec,
    kernel: Arc<dyn Kernel>,
    n_classes: usize,
    n_features: usize,
    machines: Vec<PairMachine>,
}

impl MulticlassSvm {
    /// Reassemble a model from persisted parts
    pub fn from_parts(
        kernel_spec: KernelSpec,
        n_classes: usize,
        n_features: usize,
        machines: Vec<PairMachine>,
    ) -> Result<Self> {
        if machines.is_empty() {
            return Err(PipelineError::ModelNotTrained);
        }
        let kernel = kernel_spec.build()?;
        Ok(Self {
            kernel_spec,
            kernel,
            n_classes,
            n_features,
            machines,
        })
    }

    /// Kernel parameters the model was trained with
    pub fn kernel_spec(&self) -> KernelSpec {
        self.kernel_spec
    }

    /// Number of classes
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Expected feature-row width
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Pairwise machines
    pub fn machines(&self) -> &[PairMachine] {
        &self.machines
    }

    /// Total support vectors across all pairwise machines
    pub fn n_support_vectors(&self) -> usize {
        self.machines.iter().map(|m| m.n_support_vectors()).sum()
    }

    /// Predict one feature row.
    ///
    /// The winning class takes the most pairwise votes (ties break toward the
    /// lower class id). Scores are vote shares smoothed by the logistic of
    /// each pairwise decision value, normalized to sum to 1.
    pub fn predict(&self, x: &[f64]) -> Prediction {
        debug_assert_eq!(x.len(), self.n_features);

        let mut votes = vec![0usize; self.n_classes];
        let mut scores = vec![0.0f64; self.n_classes];
        for machine in &self.machines {
            let d = machine.decision(self.kernel.as_ref(), x);
            let winner = if d >= 0.0 { machine.pos } else { machine.neg };
            votes[winner] += 1;

            let p = 1.0 / (1.0 + (-d).exp());
            scores[machine.pos] += p;
            scores[machine.neg] += 1.0 - p;
        }

        let class = votes
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
            .map(|(c, _)| c)
            .unwrap_or(0);

        let total: f64 = scores.iter().sum();
        if total > 0.0 {
            for s in &mut scores {
                *s /= total;
            }
        }

        Prediction::new(class, scores)
    }

    /// Predict every row of a preprocessed dataset
    pub fn predict_dataset(&self, data: &Dataset) -> Result<Vec<Prediction>> {
        if data.n_features() != self.n_features {
            return Err(PipelineError::DimensionMismatch {
                expected: self.n_features,
                actual: data.n_features(),
            });
        }
        Ok((0..data.len()).map(|i| self.predict(data.row(i))).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn three_class_data() -> Dataset {
        // Three well-separated clusters on a line.
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..6 {
            features.push(vec![-10.0 + i as f64 * 0.2, 0.0]);
            labels.push(0);
            features.push(vec![0.0 + i as f64 * 0.2, 0.0]);
            labels.push(1);
            features.push(vec![10.0 + i as f64 * 0.2, 0.0]);
            labels.push(2);
        }
        Dataset::new(
            vec!["x".into(), "y".into()],
            vec!["a".into(), "b".into(), "c".into()],
            features,
            labels,
        )
        .unwrap()
    }

    #[test]
    fn test_spec_builder() {
        let spec = SvmSpec::rbf()
            .with_cost(4.0)
            .with_gamma(0.5)
            .with_tolerance(0.01)
            .with_max_iterations(500);
        assert_eq!(spec.cost(), 4.0);
        assert_eq!(spec.gamma(), Some(0.5));
        assert_eq!(spec.tolerance(), 0.01);
        assert_eq!(spec.max_iterations(), 500);
    }

    #[test]
    fn test_spec_validation() {
        let data = three_class_data();
        assert!(SvmSpec::rbf().with_cost(-1.0).fit(&data).is_err());
        assert!(SvmSpec::rbf().with_tolerance(0.0).fit(&data).is_err());
        assert!(SvmSpec::rbf().with_gamma(-0.5).fit(&data).is_err());
    }

    #[test]
    fn test_auto_gamma_resolution() {
        let spec = SvmSpec::rbf();
        match spec.resolve_kernel(4).unwrap() {
            KernelSpec::Rbf { gamma } => assert_relative_eq!(gamma, 0.25),
            other => panic!("unexpected kernel: {other:?}"),
        }
    }

    #[test]
    fn test_one_vs_one_pair_count() {
        let data = three_class_data();
        let model = SvmSpec::rbf().with_gamma(0.5).fit(&data).unwrap();
        // 3 classes -> 3 unordered pairs
        assert_eq!(model.machines().len(), 3);
        assert!(model.n_support_vectors() > 0);
    }

    #[test]
    fn test_training_data_classified_correctly() {
        let data = three_class_data();
        let model = SvmSpec::rbf().with_gamma(0.5).with_cost(10.0).fit(&data).unwrap();

        let preds = model.predict_dataset(&data).unwrap();
        let correct = preds
            .iter()
            .zip(data.labels().iter())
            .filter(|(p, &t)| p.class == t)
            .count();
        assert_eq!(correct, data.len());
    }

    #[test]
    fn test_scores_sum_to_one() {
        let data = three_class_data();
        let model = SvmSpec::rbf().with_gamma(0.5).fit(&data).unwrap();
        let pred = model.predict(&[0.1, 0.0]);
        assert_relative_eq!(pred.scores.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        assert_eq!(pred.scores.len(), 3);
    }

    #[test]
    fn test_predicted_class_has_top_score_on_clear_points() {
        let data = three_class_data();
        let model = SvmSpec::rbf().with_gamma(0.5).with_cost(10.0).fit(&data).unwrap();
        let pred = model.predict(&[-10.2, 0.0]);
        assert_eq!(pred.class, 0);
        assert!(pred.scores[0] > pred.scores[1]);
        assert!(pred.scores[0] > pred.scores[2]);
    }

    #[test]
    fn test_single_class_rejected() {
        let data = Dataset::new(
            vec!["x".into()],
            vec!["only".into()],
            vec![vec![1.0], vec![2.0]],
            vec![0, 0],
        )
        .unwrap();
        assert!(SvmSpec::rbf().fit(&data).is_err());
    }

    #[test]
    fn test_predict_dataset_width_check() {
        let data = three_class_data();
        let model = SvmSpec::linear().fit(&data).unwrap();
        let narrow = Dataset::new(
            vec!["x".into()],
            vec!["a".into()],
            vec![vec![1.0]],
            vec![0],
        )
        .unwrap();
        assert!(matches!(
            model.predict_dataset(&narrow),
            Err(PipelineError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_from_parts_round_trip() {
        let data = three_class_data();
        let model = SvmSpec::rbf().with_gamma(0.5).fit(&data).unwrap();

        let rebuilt = MulticlassSvm::from_parts(
            model.kernel_spec(),
            model.n_classes(),
            model.n_features(),
            model.machines().to_vec(),
        )
        .unwrap();

        let a = model.predict(&[0.3, 0.0]);
        let b = rebuilt.predict(&[0.3, 0.0]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_from_parts_requires_machines() {
        let result = MulticlassSvm::from_parts(KernelSpec::Linear, 2, 1, vec![]);
        assert!(matches!(result, Err(PipelineError::ModelNotTrained)));
    }
}
