//! Supervised classification pipeline for labeled tabular data.
//!
//! The crate covers the full workflow for training a kernel SVM classifier on
//! a numeric CSV with a categorical label column:
//!
//! - stratified train/test splitting ([`data::StratifiedSplit`])
//! - trainable preprocessing: KNN imputation, near-zero-variance filtering,
//!   centering and scaling ([`recipe::Recipe`])
//! - one-vs-one multiclass SVM trained by SMO ([`model::SvmSpec`])
//! - repeated stratified cross-validation ([`resample::VfoldCv`])
//! - grid search over cost, gamma and tolerance ([`tune::tune_grid`])
//! - accuracy, confusion matrix and ROC AUC ([`metrics`])
//! - JSON model persistence ([`persistence::SavedModel`])
//!
//! # Example
//!
//! ```no_run
//! use varietal::data::{Dataset, StratifiedSplit};
//! use varietal::model::SvmSpec;
//! use varietal::recipe::Recipe;
//! use varietal::workflow::Workflow;
//!
//! # fn main() -> varietal::core::Result<()> {
//! let data = Dataset::from_csv_path("wine.csv", Some("class"))?;
//! let (train, test) = StratifiedSplit::new(0.75)?.with_seed(42).split(&data)?;
//!
//! let recipe = Recipe::new().step_impute_knn(5).step_nzv().step_normalize();
//! let workflow = Workflow::new(recipe, SvmSpec::rbf().with_cost(4.0));
//! let fitted = workflow.fit(&train)?;
//!
//! let eval = fitted.evaluate(&test)?;
//! println!("accuracy {:.4}, ROC AUC {:.4}", eval.accuracy, eval.roc_auc);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod core;
pub mod data;
pub mod kernel;
pub mod metrics;
pub mod model;
pub mod persistence;
pub mod recipe;
pub mod resample;
pub mod solver;
pub mod tune;
pub mod workflow;

pub use crate::core::{PipelineError, Prediction, Result, Sample};
pub use crate::data::{Dataset, StratifiedSplit};
pub use crate::model::{MulticlassSvm, SvmSpec};
pub use crate::recipe::Recipe;
pub use crate::resample::VfoldCv;
pub use crate::tune::{tune_grid, ParamGrid, TuneMetric};
pub use crate::workflow::{FittedWorkflow, Workflow};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
