//! Model persistence: save and load fitted workflows as JSON
//!
//! The file stores the fitted recipe, the pairwise machines and enough
//! metadata to audit a model after the fact. Kernels are stored as their
//! parameter spec and rebuilt on load.

use crate::core::{PipelineError, Result};
use crate::kernel::KernelSpec;
use crate::model::{MulticlassSvm, PairMachine, SvmSpec};
use crate::recipe::FittedRecipe;
use crate::workflow::FittedWorkflow;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// One persisted pairwise machine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedMachine {
    pub pos: usize,
    pub neg: usize,
    pub support: Vec<Vec<f64>>,
    pub coeffs: Vec<f64>,
    pub bias: f64,
}

/// Hyperparameters the model was trained with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingParams {
    pub cost: f64,
    pub gamma: Option<f64>,
    pub tolerance: f64,
    pub max_iterations: usize,
}

/// Provenance recorded alongside the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub library_version: String,
    pub created_at: String,
    pub n_support_vectors: usize,
    pub params: TrainingParams,
}

/// Serializable snapshot of a fitted workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedModel {
    pub classes: Vec<String>,
    pub kernel: KernelSpec,
    pub n_features: usize,
    pub machines: Vec<SavedMachine>,
    pub recipe: FittedRecipe,
    pub metadata: ModelMetadata,
}

impl SavedModel {
    /// Snapshot a fitted workflow
    pub fn from_workflow(workflow: &FittedWorkflow) -> Self {
        let model = workflow.model();
        let spec = workflow.spec();
        let machines = model
            .machines()
            .iter()
            .map(|m| SavedMachine {
                pos: m.pos,
                neg: m.neg,
                support: m.support.clone(),
                coeffs: m.coeffs.clone(),
                bias: m.bias,
            })
            .collect();

        Self {
            classes: workflow.classes().to_vec(),
            kernel: model.kernel_spec(),
            n_features: model.n_features(),
            machines,
            recipe: workflow.recipe().clone(),
            metadata: ModelMetadata {
                library_version: crate::VERSION.to_string(),
                created_at: chrono::Utc::now().to_rfc3339(),
                n_support_vectors: model.n_support_vectors(),
                params: TrainingParams {
                    cost: spec.cost(),
                    gamma: spec.gamma(),
                    tolerance: spec.tolerance(),
                    max_iterations: spec.max_iterations(),
                },
            },
        }
    }

    /// Rebuild the fitted workflow
    pub fn into_workflow(self) -> Result<FittedWorkflow> {
        let machines = self
            .machines
            .into_iter()
            .map(|m| PairMachine {
                pos: m.pos,
                neg: m.neg,
                support: m.support,
                coeffs: m.coeffs,
                bias: m.bias,
            })
            .collect();
        let model = MulticlassSvm::from_parts(
            self.kernel,
            self.classes.len(),
            self.n_features,
            machines,
        )?;

        let mut spec = match self.kernel {
            KernelSpec::Linear => SvmSpec::linear(),
            KernelSpec::Rbf { gamma } => SvmSpec::rbf().with_gamma(gamma),
        };
        spec = spec
            .with_cost(self.metadata.params.cost)
            .with_tolerance(self.metadata.params.tolerance)
            .with_max_iterations(self.metadata.params.max_iterations);

        Ok(FittedWorkflow::from_parts(
            self.recipe,
            model,
            self.classes,
            spec,
        ))
    }

    /// Write the model to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .map_err(|e| PipelineError::SerializationError(e.to_string()))?;
        info!("saved model to {}", path.as_ref().display());
        Ok(())
    }

    /// Read a model from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        let model: SavedModel = serde_json::from_reader(reader)
            .map_err(|e| PipelineError::SerializationError(e.to_string()))?;
        info!("loaded model from {}", path.as_ref().display());
        Ok(model)
    }

    /// Human-readable summary lines
    pub fn summary(&self) -> String {
        format!(
            "classes: {}\nkernel: {}\nsupport vectors: {}\ncost: {}\ntolerance: {}\ncreated: {}\nversion: {}",
            self.classes.join(", "),
            self.kernel.name(),
            self.metadata.n_support_vectors,
            self.metadata.params.cost,
            self.metadata.params.tolerance,
            self.metadata.created_at,
            self.metadata.library_version,
        )
    }
}
