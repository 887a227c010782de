//! Portfolio optimization runner.
//!
//! Formulates the portfolio program once and issues the quantum and
//! classical solves through an [`OptimizationService`], then condenses both
//! into a single report. The service call is a single awaited request;
//! failures are surfaced, not retried.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::problems::{PortfolioProblem, QuadraticProgram};
use crate::solver::{
    ClassicalConfig, OptimizationService, QuantumConfig, Solution, SolutionDistribution,
    SolverResult,
};

/// Outcome of a full portfolio run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioReport {
    /// The formulated program that was solved.
    pub program: QuadraticProgram,
    /// Sampled distribution from the quantum solve.
    pub distribution: SolutionDistribution,
    /// Exact reference solution.
    pub reference: Solution,
    /// Best sampled objective minus the reference objective
    /// (0.0 when the sampler found the optimum).
    pub optimality_gap: Option<f64>,
    /// Probability mass on feasible candidates.
    pub feasible_mass: f64,
}

impl PortfolioReport {
    /// Whether the quantum solve sampled the exact optimum.
    pub fn found_optimum(&self) -> bool {
        self.optimality_gap.is_some_and(|gap| gap.abs() < 1e-9)
    }
}

/// Runner configuration in the builder style.
pub struct PortfolioRunner {
    /// The problem to solve.
    pub problem: PortfolioProblem,
    /// Quantum-ansatz preferences.
    pub quantum: QuantumConfig,
    /// Classical-optimizer preferences.
    pub classical: ClassicalConfig,
}

impl PortfolioRunner {
    /// Create a runner with default configuration bundles.
    pub fn new(problem: PortfolioProblem) -> Self {
        Self {
            problem,
            quantum: QuantumConfig::default(),
            classical: ClassicalConfig::default(),
        }
    }

    /// Set the quantum-ansatz preferences.
    pub fn with_quantum(mut self, quantum: QuantumConfig) -> Self {
        self.quantum = quantum;
        self
    }

    /// Set the classical-optimizer preferences.
    pub fn with_classical(mut self, classical: ClassicalConfig) -> Self {
        self.classical = classical;
        self
    }

    /// Run both solves through a service and build the report.
    pub async fn run(&self, service: &dyn OptimizationService) -> SolverResult<PortfolioReport> {
        let program = self.problem.formulate();
        info!(
            service = service.name(),
            variables = program.num_variables(),
            domain = %program.domain_size(),
            "starting portfolio run"
        );

        let distribution = service
            .solve(&program, &self.quantum, &self.classical)
            .await?;
        let reference = service.solve_classically(&program).await?;

        let optimality_gap = distribution
            .best
            .as_ref()
            .map(|b| b.objective - reference.objective);
        let feasible_mass = distribution
            .candidates
            .iter()
            .filter(|c| c.feasible)
            .map(|c| c.probability)
            .sum();

        info!(
            reference = reference.objective,
            gap = optimality_gap,
            feasible_mass,
            "portfolio run finished"
        );

        Ok(PortfolioReport {
            program,
            distribution,
            reference,
            optimality_gap,
            feasible_mass,
        })
    }
}
