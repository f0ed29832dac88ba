//! Dual-problem solvers

pub mod smo;

pub use smo::{SmoSolver, SolverOutput};
