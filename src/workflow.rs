//! Workflow: a recipe and a model spec bundled into one trainable unit
//!
//! Fitting a workflow fits the recipe on the training rows, transforms them
//! and trains the classifier on the result. The fitted workflow replays the
//! same recipe on incoming rows before predicting, so callers never hand it
//! preprocessed data by accident.

use crate::core::{PipelineError, Prediction, Result};
use crate::data::Dataset;
use crate::metrics::{ConfusionMatrix, RocCurve};
use crate::model::{MulticlassSvm, SvmSpec};
use crate::recipe::{FittedRecipe, Recipe};
use crate::tune::ParamSet;
use log::info;

/// Untrained workflow
#[derive(Debug, Clone)]
pub struct Workflow {
    recipe: Recipe,
    spec: SvmSpec,
}

impl Workflow {
    /// Bundle a preprocessing recipe with a model specification
    pub fn new(recipe: Recipe, spec: SvmSpec) -> Self {
        Self { recipe, spec }
    }

    /// Replace the spec's tunable parameters with a tuned candidate
    pub fn with_params(mut self, params: ParamSet) -> Self {
        self.spec = self.spec.with_params(params);
        self
    }

    /// Model specification
    pub fn spec(&self) -> &SvmSpec {
        &self.spec
    }

    /// Fit the recipe and the model on a training dataset
    pub fn fit(&self, data: &Dataset) -> Result<FittedWorkflow> {
        let recipe = self.recipe.fit(data)?;
        let transformed = recipe.apply(data)?;
        info!(
            "training on {} rows, {} features, {} classes",
            transformed.len(),
            transformed.n_features(),
            transformed.n_classes()
        );
        let model = self.spec.fit(&transformed)?;
        Ok(FittedWorkflow {
            recipe,
            model,
            classes: data.classes().to_vec(),
            spec: self.spec.clone(),
        })
    }
}

/// Trained workflow ready for prediction and evaluation
pub struct FittedWorkflow {
    recipe: FittedRecipe,
    model: MulticlassSvm,
    classes: Vec<String>,
    spec: SvmSpec,
}

/// Test-set evaluation results
#[derive(Debug)]
pub struct Evaluation {
    pub accuracy: f64,
    pub roc_auc: f64,
    pub confusion: ConfusionMatrix,
    /// One-vs-rest ROC curve per class name
    pub roc_curves: Vec<(String, RocCurve)>,
}

impl FittedWorkflow {
    /// Reassemble a fitted workflow from persisted parts
    pub fn from_parts(
        recipe: FittedRecipe,
        model: MulticlassSvm,
        classes: Vec<String>,
        spec: SvmSpec,
    ) -> Self {
        Self {
            recipe,
            model,
            classes,
            spec,
        }
    }

    /// Fitted preprocessing recipe
    pub fn recipe(&self) -> &FittedRecipe {
        &self.recipe
    }

    /// Trained classifier
    pub fn model(&self) -> &MulticlassSvm {
        &self.model
    }

    /// Class names, indexed by class id
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Model specification the workflow was trained with
    pub fn spec(&self) -> &SvmSpec {
        &self.spec
    }

    /// Preprocess and predict every row of a raw dataset
    pub fn predict(&self, data: &Dataset) -> Result<Vec<Prediction>> {
        let transformed = self.recipe.apply(data)?;
        self.model.predict_dataset(&transformed)
    }

    /// Map a dataset's class ids onto this workflow's class table.
    ///
    /// A test set read from a separate file can enumerate the same classes in
    /// a different order, so ids are remapped by name.
    fn remap_labels(&self, data: &Dataset) -> Result<Vec<usize>> {
        data.labels()
            .iter()
            .map(|&label| {
                let name = &data.classes()[label];
                self.classes
                    .iter()
                    .position(|c| c == name)
                    .ok_or_else(|| PipelineError::UnknownClass(name.clone()))
            })
            .collect()
    }

    /// Score the workflow on a labeled test set
    pub fn evaluate(&self, data: &Dataset) -> Result<Evaluation> {
        let truth = self.remap_labels(data)?;
        let predictions = self.predict(data)?;
        let predicted: Vec<usize> = predictions.iter().map(|p| p.class).collect();
        let scores: Vec<Vec<f64>> = predictions.iter().map(|p| p.scores.clone()).collect();

        let confusion = ConfusionMatrix::from_predictions(&self.classes, &truth, &predicted)?;
        let accuracy = confusion.accuracy();
        let roc_auc = crate::metrics::roc_auc(&truth, &scores)?;

        let mut roc_curves = Vec::new();
        for (class, name) in self.classes.iter().enumerate() {
            let binary: Vec<bool> = truth.iter().map(|&t| t == class).collect();
            let class_scores: Vec<f64> = scores.iter().map(|s| s[class]).collect();
            if let Ok(curve) = RocCurve::binary(&binary, &class_scores) {
                roc_curves.push((name.clone(), curve));
            }
        }

        Ok(Evaluation {
            accuracy,
            roc_auc,
            confusion,
            roc_curves,
        })
    }
}
