//! Core types and errors

pub mod error;
pub mod types;

pub use error::{PipelineError, Result};
pub use types::{Prediction, Sample, SolverConfig};
