//! Linear kernel implementation

use crate::kernel::Kernel;

/// Linear kernel: K(x, y) = x · y
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearKernel;

impl LinearKernel {
    /// Create a new linear kernel
    pub fn new() -> Self {
        Self
    }
}

impl Kernel for LinearKernel {
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        x.iter().zip(y.iter()).map(|(&a, &b)| a * b).sum()
    }

    fn name(&self) -> &'static str {
        "linear"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_product() {
        let kernel = LinearKernel::new();
        assert_eq!(kernel.compute(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
    }

    #[test]
    fn test_orthogonal_vectors() {
        let kernel = LinearKernel::new();
        assert_eq!(kernel.compute(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let kernel = LinearKernel::new();
        let x = [1.5, -2.0, 0.5];
        let y = [0.3, 4.0, -1.0];
        assert_eq!(kernel.compute(&x, &y), kernel.compute(&y, &x));
    }
}
