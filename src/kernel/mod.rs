//! Kernel functions for SVM training

pub mod linear;
pub mod rbf;
pub mod traits;

pub use linear::LinearKernel;
pub use rbf::RbfKernel;
pub use traits::Kernel;

use crate::core::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fully resolved kernel choice, serializable for model persistence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum KernelSpec {
    Linear,
    Rbf { gamma: f64 },
}

impl KernelSpec {
    /// Validate parameters without constructing the kernel
    pub fn validate(&self) -> Result<()> {
        match *self {
            KernelSpec::Linear => Ok(()),
            KernelSpec::Rbf { gamma } if gamma > 0.0 => Ok(()),
            KernelSpec::Rbf { gamma } => Err(PipelineError::InvalidParameter(format!(
                "RBF gamma must be positive, got {gamma}"
            ))),
        }
    }

    /// Instantiate the kernel behind a shared handle
    pub fn build(&self) -> Result<Arc<dyn Kernel>> {
        self.validate()?;
        Ok(match *self {
            KernelSpec::Linear => Arc::new(LinearKernel::new()),
            KernelSpec::Rbf { gamma } => Arc::new(RbfKernel::new(gamma)),
        })
    }

    /// Short identifier for summaries
    pub fn name(&self) -> &'static str {
        match self {
            KernelSpec::Linear => "linear",
            KernelSpec::Rbf { .. } => "rbf",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_build() {
        let kernel = KernelSpec::Rbf { gamma: 0.5 }.build().unwrap();
        assert_eq!(kernel.name(), "rbf");

        let kernel = KernelSpec::Linear.build().unwrap();
        assert_eq!(kernel.name(), "linear");
    }

    #[test]
    fn test_spec_validation() {
        assert!(KernelSpec::Rbf { gamma: -1.0 }.validate().is_err());
        assert!(KernelSpec::Rbf { gamma: 0.0 }.build().is_err());
        assert!(KernelSpec::Linear.validate().is_ok());
    }

    #[test]
    fn test_spec_serde_round_trip() {
        let spec = KernelSpec::Rbf { gamma: 0.25 };
        let json = serde_json::to_string(&spec).unwrap();
        let back: KernelSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(spec, back);
    }
}
