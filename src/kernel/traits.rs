//! Kernel trait definition

/// Kernel function trait
///
/// A kernel K(x, y) must satisfy Mercer's condition to be valid for SVM
/// training. Implementations operate on dense feature rows of equal length.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y)
    fn compute(&self, x: &[f64], y: &[f64]) -> f64;

    /// Short identifier used in model summaries
    fn name(&self) -> &'static str;
}
