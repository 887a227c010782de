//! Classical parameter-search optimizers for the variational loop.

pub mod cobyla;

pub use cobyla::{Cobyla, OptimizationResult, Spsa};

use serde::{Deserialize, Serialize};

/// Derivative-free minimizer over a real parameter vector.
pub trait Optimizer {
    /// Minimize `objective` starting from `initial_params`.
    fn minimize<F>(&self, objective: F, initial_params: Vec<f64>) -> OptimizationResult
    where
        F: FnMut(&[f64]) -> f64;
}

/// Which optimizer the classical side of the service should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OptimizerKind {
    /// COBYLA-style simplex search.
    #[default]
    Cobyla,
    /// Simultaneous perturbation stochastic approximation.
    Spsa,
}
