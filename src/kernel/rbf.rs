//! RBF (Radial Basis Function) kernel implementation
//!
//! K(x, y) = exp(-γ * ||x - y||²), where γ controls the kernel width:
//! high gamma means only close points influence each other, low gamma lets
//! distant points contribute.

use crate::kernel::Kernel;

/// RBF kernel: K(x, y) = exp(-γ * ||x - y||²)
#[derive(Debug, Clone, Copy)]
pub struct RbfKernel {
    gamma: f64,
}

impl RbfKernel {
    /// Create a new RBF kernel with the given gamma
    ///
    /// # Panics
    /// Panics if gamma is not positive.
    pub fn new(gamma: f64) -> Self {
        assert!(gamma > 0.0, "Gamma must be positive, got: {gamma}");
        Self { gamma }
    }

    /// Create an RBF kernel with gamma = 1 / n_features
    ///
    /// A common default that scales inversely with dimensionality.
    pub fn with_auto_gamma(n_features: usize) -> Self {
        assert!(n_features > 0, "Number of features must be positive");
        Self::new(1.0 / n_features as f64)
    }

    /// Get the gamma parameter
    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl Kernel for RbfKernel {
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        let squared_distance: f64 = x
            .iter()
            .zip(y.iter())
            .map(|(&a, &b)| {
                let d = a - b;
                d * d
            })
            .sum();
        (-self.gamma * squared_distance).exp()
    }

    fn name(&self) -> &'static str {
        "rbf"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identical_vectors() {
        let kernel = RbfKernel::new(1.0);
        let x = [1.0, 2.0, 3.0];
        assert_relative_eq!(kernel.compute(&x, &x), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_known_distance() {
        let kernel = RbfKernel::new(0.5);
        // ||x - y||² = 4
        let result = kernel.compute(&[1.0], &[3.0]);
        assert_relative_eq!(result, (-2.0_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_gamma_controls_reach() {
        let x = [0.0];
        let y = [2.0];
        let near = RbfKernel::new(0.1).compute(&x, &y);
        let far = RbfKernel::new(10.0).compute(&x, &y);
        assert!(near > far);
    }

    #[test]
    fn test_decreases_with_distance() {
        let kernel = RbfKernel::new(1.0);
        let x = [0.0];
        let k1 = kernel.compute(&x, &[1.0]);
        let k2 = kernel.compute(&x, &[2.0]);
        let k3 = kernel.compute(&x, &[3.0]);
        assert!(k1 > k2 && k2 > k3);
        for k in [k1, k2, k3] {
            assert!((0.0..=1.0).contains(&k));
        }
    }

    #[test]
    fn test_auto_gamma() {
        let kernel = RbfKernel::with_auto_gamma(10);
        assert_relative_eq!(kernel.gamma(), 0.1);
    }

    #[test]
    #[should_panic(expected = "Gamma must be positive")]
    fn test_invalid_gamma() {
        RbfKernel::new(0.0);
    }

    #[test]
    fn test_numerical_stability() {
        let kernel = RbfKernel::new(1e-6);
        let result = kernel.compute(&[1e6], &[-1e6]);
        assert!(result.is_finite());
        assert!((0.0..=1.0).contains(&result));
    }
}
