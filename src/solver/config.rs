//! Typed configuration bundles for the service boundary.
//!
//! Quantum-ansatz preferences and classical-optimizer preferences travel as
//! validated structs with enumerated fields, not loose key-value maps.

use serde::{Deserialize, Serialize};

use crate::circuits::qaoa::InitStrategy;
use crate::optimizers::OptimizerKind;
use crate::solver::{SolverError, SolverResult};

/// Quantum-ansatz preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantumConfig {
    /// Number of QAOA repetitions (layers). Must be positive.
    pub reps: usize,
    /// Parameter initialization strategy (the ansatz-variant knob).
    pub init: InitStrategy,
    /// Number of restarts with perturbed initial parameters.
    pub restarts: usize,
}

impl Default for QuantumConfig {
    fn default() -> Self {
        Self {
            reps: 1,
            init: InitStrategy::TrotterizedAdiabatic,
            restarts: 1,
        }
    }
}

impl QuantumConfig {
    /// Create a configuration with `reps` layers and defaults elsewhere.
    pub fn new(reps: usize) -> Self {
        Self {
            reps,
            ..Self::default()
        }
    }

    /// Set the initialization strategy.
    pub fn with_init(mut self, init: InitStrategy) -> Self {
        self.init = init;
        self
    }

    /// Set the restart count.
    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    /// Validate field ranges.
    pub fn validate(&self) -> SolverResult<()> {
        if self.reps == 0 {
            return Err(SolverError::InvalidConfiguration(
                "reps must be positive".into(),
            ));
        }
        if self.restarts == 0 {
            return Err(SolverError::InvalidConfiguration(
                "restarts must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Classical-optimizer preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassicalConfig {
    /// Measurement shots for the reported sample distribution. Must be
    /// positive.
    pub shots: u32,
    /// Maximum parameter-search iterations. Must be positive.
    pub maxiter: usize,
    /// CVaR tail fraction in (0, 1]; 1.0 is the plain expectation.
    pub cvar_alpha: f64,
    /// Which classical optimizer drives the parameter search.
    pub optimizer: OptimizerKind,
    /// RNG seed for measurement sampling.
    pub seed: u64,
    /// Convergence tolerance for the parameter search.
    pub tol: f64,
}

impl Default for ClassicalConfig {
    fn default() -> Self {
        Self {
            shots: 1024,
            maxiter: 100,
            cvar_alpha: 1.0,
            optimizer: OptimizerKind::Cobyla,
            seed: 42,
            tol: 1e-4,
        }
    }
}

impl ClassicalConfig {
    /// Set the shot count.
    pub fn with_shots(mut self, shots: u32) -> Self {
        self.shots = shots;
        self
    }

    /// Set the iteration cap.
    pub fn with_maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = maxiter;
        self
    }

    /// Set the CVaR tail fraction.
    pub fn with_cvar_alpha(mut self, alpha: f64) -> Self {
        self.cvar_alpha = alpha;
        self
    }

    /// Set the classical optimizer.
    pub fn with_optimizer(mut self, optimizer: OptimizerKind) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Set the sampling seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validate field ranges.
    pub fn validate(&self) -> SolverResult<()> {
        if self.shots == 0 {
            return Err(SolverError::InvalidConfiguration(
                "shots must be positive".into(),
            ));
        }
        if self.maxiter == 0 {
            return Err(SolverError::InvalidConfiguration(
                "maxiter must be positive".into(),
            ));
        }
        if !(self.cvar_alpha > 0.0 && self.cvar_alpha <= 1.0) {
            return Err(SolverError::InvalidConfiguration(format!(
                "cvar_alpha {} outside (0, 1]",
                self.cvar_alpha
            )));
        }
        Ok(())
    }
}
