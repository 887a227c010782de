//! The external-optimizer boundary.
//!
//! The value-producing solve is performed by a collaborator behind the
//! [`OptimizationService`] trait: the local core formulates a program,
//! issues one blocking request, and surfaces the result or error without
//! retrying or interpreting backend failures. [`LocalSimulatorService`]
//! is the in-process implementation backed by the statevector simulator.

pub mod config;
pub mod local;
pub mod session;

pub use config::{ClassicalConfig, QuantumConfig};
pub use local::LocalSimulatorService;
pub use session::{Session, SessionConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::circuits::Circuit;
use crate::problems::{BinaryEncoding, EncodingError, QuadraticProgram};

/// Errors surfaced across the service boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SolverError {
    /// Decision variables do not share a single kind; the quantum lowering
    /// requires a uniform discrete domain.
    #[error("mixed variable kinds: {0}")]
    MixedVariableKinds(String),

    /// A variable kind the quantum solver cannot encode.
    #[error("unsupported variable kind: {0}")]
    UnsupportedVariableKind(String),

    /// A constraint that no point of the variable box satisfies.
    #[error("infeasible constraint: {0}")]
    InfeasibleConstraint(String),

    /// A configuration bundle failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The program is too large for this service.
    #[error("problem too large: {0}")]
    ProblemTooLarge(String),

    /// Opaque failure from the backend; surfaced as-is, never retried.
    #[error("backend error: {0}")]
    Backend(String),
}

impl From<EncodingError> for SolverError {
    fn from(err: EncodingError) -> Self {
        match err {
            EncodingError::MixedVariableKinds => Self::MixedVariableKinds(err.to_string()),
            EncodingError::ContinuousVariable(_) | EncodingError::InvalidBounds { .. } => {
                Self::UnsupportedVariableKind(err.to_string())
            }
            EncodingError::InfeasibleConstraint(name) => Self::InfeasibleConstraint(name),
        }
    }
}

/// Result type for service operations.
pub type SolverResult<T> = Result<T, SolverError>;

/// Circuit artifact produced by [`OptimizationService::generate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitArtifact {
    /// The generated ansatz circuit at its initial parameters.
    pub circuit: Circuit,
    /// Bit layout mapping qubits back to program variables.
    pub encoding: BinaryEncoding,
    /// Number of qubits in the lowered problem.
    pub num_qubits: usize,
    /// Initial gamma parameters, one per repetition.
    pub initial_gamma: Vec<f64>,
    /// Initial beta parameters, one per repetition.
    pub initial_beta: Vec<f64>,
}

/// One candidate from the sampled solution distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Decoded weight vector.
    pub weights: Vec<i64>,
    /// Objective value at those weights.
    pub objective: f64,
    /// Fraction of shots that produced this candidate.
    pub probability: f64,
    /// Whether the candidate satisfies all constraints.
    pub feasible: bool,
}

/// Distribution of candidate solutions from a quantum solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionDistribution {
    /// Candidates, most probable first.
    pub candidates: Vec<Candidate>,
    /// Best feasible candidate, if any was sampled.
    pub best: Option<Candidate>,
    /// Optimal gamma parameters found by the classical loop.
    pub optimal_gamma: Vec<f64>,
    /// Optimal beta parameters found by the classical loop.
    pub optimal_beta: Vec<f64>,
    /// Accepted-improvement count of the classical loop.
    pub iterations: usize,
    /// Number of circuit evaluations spent.
    pub circuit_evaluations: usize,
    /// CVaR objective trace during optimization.
    pub objective_history: Vec<f64>,
}

/// Exact (or reference) solution from a classical solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Optimal weight vector.
    pub weights: Vec<i64>,
    /// Objective value at the optimum.
    pub objective: f64,
}

/// Contract of the external optimization collaborator.
///
/// All methods take the validated program description plus typed
/// configuration bundles; implementations must fail fast on configuration
/// or variable-kind problems before doing any heavy work.
#[async_trait]
pub trait OptimizationService: Send + Sync {
    /// Service name for logs and reports.
    fn name(&self) -> &str;

    /// Synthesize the ansatz circuit for a program.
    ///
    /// Fails with [`SolverError::MixedVariableKinds`] or
    /// [`SolverError::UnsupportedVariableKind`] when the program's variables
    /// cannot be uniformly binary-encoded.
    async fn generate(
        &self,
        program: &QuadraticProgram,
        quantum: &QuantumConfig,
    ) -> SolverResult<CircuitArtifact>;

    /// Run the hybrid solve and return the sampled solution distribution.
    async fn solve(
        &self,
        program: &QuadraticProgram,
        quantum: &QuantumConfig,
        classical: &ClassicalConfig,
    ) -> SolverResult<SolutionDistribution>;

    /// Compute a reference solution by conventional means.
    async fn solve_classically(&self, program: &QuadraticProgram) -> SolverResult<Solution>;
}
