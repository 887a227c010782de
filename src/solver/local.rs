//! In-process optimization service backed by the statevector simulator.

use std::collections::HashMap;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::circuits::qaoa::{
    ParameterBounds, initial_parameters, problem_aware_initial_parameters, qaoa_circuit,
};
use crate::circuits::simulator::{basis_probabilities, index_to_bits, simulate_statevector};
use crate::optimizers::{Cobyla, OptimizationResult, Optimizer, OptimizerKind, Spsa};
use crate::problems::{BinaryEncoding, QuadraticProgram, Qubo, encode_program};
use crate::solver::{
    Candidate, CircuitArtifact, ClassicalConfig, OptimizationService, QuantumConfig, Session,
    Solution, SolutionDistribution, SolverError, SolverResult,
};

/// Largest register the dense simulator will take.
const MAX_QUBITS: usize = 16;

/// Largest box domain the classical reference solver will enumerate.
const MAX_ENUMERATION: u128 = 1 << 22;

/// Local statevector-simulator implementation of [`OptimizationService`].
pub struct LocalSimulatorService {
    session: Session,
}

impl LocalSimulatorService {
    /// Create a service bound to a session.
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Lower a program and check it fits the simulator.
    fn lower(&self, program: &QuadraticProgram) -> SolverResult<(BinaryEncoding, Qubo)> {
        let (encoding, qubo) = encode_program(program, None)?;
        let n = encoding.num_qubits();
        if n > MAX_QUBITS {
            return Err(SolverError::ProblemTooLarge(format!(
                "{n} qubits after lowering, limit {MAX_QUBITS}"
            )));
        }
        debug!(
            qubits = n,
            penalty = qubo.penalty,
            "lowered program to QUBO"
        );
        Ok((encoding, qubo))
    }
}

#[async_trait]
impl OptimizationService for LocalSimulatorService {
    fn name(&self) -> &str {
        self.session.name()
    }

    async fn generate(
        &self,
        program: &QuadraticProgram,
        quantum: &QuantumConfig,
    ) -> SolverResult<CircuitArtifact> {
        quantum.validate()?;
        let (encoding, qubo) = self.lower(program)?;
        let ising = qubo.to_ising();
        let (gamma, beta) = problem_aware_initial_parameters(&ising, quantum.reps);
        let circuit = qaoa_circuit(&ising, &gamma, &beta);
        info!(
            qubits = encoding.num_qubits(),
            gates = circuit.num_gates(),
            reps = quantum.reps,
            "generated QAOA ansatz"
        );
        Ok(CircuitArtifact {
            num_qubits: encoding.num_qubits(),
            circuit,
            encoding,
            initial_gamma: gamma,
            initial_beta: beta,
        })
    }

    async fn solve(
        &self,
        program: &QuadraticProgram,
        quantum: &QuantumConfig,
        classical: &ClassicalConfig,
    ) -> SolverResult<SolutionDistribution> {
        quantum.validate()?;
        classical.validate()?;
        let (encoding, qubo) = self.lower(program)?;
        let ising = qubo.to_ising();
        let n = encoding.num_qubits();
        let p = quantum.reps;

        // Penalized cost of every basis state, fixed for the whole search.
        let basis_costs: Vec<f64> = (0..(1usize << n))
            .map(|idx| qubo.evaluate(&index_to_bits(idx, n)))
            .collect();

        let bounds = ParameterBounds::tight();
        let mut best_run: Option<(f64, OptimizationResult)> = None;
        let mut circuit_evaluations = 0usize;

        for restart in 0..quantum.restarts {
            let (mut gamma, mut beta) = if restart == 0 {
                problem_aware_initial_parameters(&ising, p)
            } else {
                perturbed_parameters(p, classical.seed.wrapping_add(restart as u64))
            };
            // First-restart strategy override when the caller asked for one.
            if restart == 0 && quantum.init != Default::default() {
                (gamma, beta) = initial_parameters(p, quantum.init);
            }
            bounds.clip(&mut gamma, &mut beta);
            let initial: Vec<f64> = gamma.into_iter().chain(beta).collect();

            let mut objective = |params: &[f64]| -> f64 {
                let circuit = qaoa_circuit(&ising, &params[..p], &params[p..]);
                let probs = basis_probabilities(&simulate_statevector(&circuit));
                cvar_expectation(&basis_costs, &probs, classical.cvar_alpha)
            };
            let result = match classical.optimizer {
                OptimizerKind::Cobyla => Cobyla::new()
                    .with_maxiter(classical.maxiter)
                    .with_tol(classical.tol)
                    .minimize(&mut objective, initial),
                OptimizerKind::Spsa => Spsa::new()
                    .with_maxiter(classical.maxiter)
                    .with_seed(classical.seed)
                    .minimize(&mut objective, initial),
            };
            circuit_evaluations += result.num_evaluations;
            debug!(
                restart,
                value = result.optimal_value,
                evaluations = result.num_evaluations,
                "restart finished"
            );
            if best_run
                .as_ref()
                .is_none_or(|(v, _)| result.optimal_value < *v)
            {
                best_run = Some((result.optimal_value, result));
            }
        }
        let (_, result) = best_run.expect("restarts > 0 is validated");

        let optimal_gamma = result.optimal_params[..p].to_vec();
        let optimal_beta = result.optimal_params[p..].to_vec();

        // Sample the final state for the reported distribution.
        let circuit = qaoa_circuit(&ising, &optimal_gamma, &optimal_beta);
        let probs = basis_probabilities(&simulate_statevector(&circuit));
        let counts = sample_counts(&probs, classical.shots, classical.seed);

        // Aggregate basis states by decoded weights: distinct slack-bit
        // patterns describe the same portfolio.
        let mut weight_counts: HashMap<Vec<i64>, u32> = HashMap::new();
        for (idx, count) in counts {
            let weights = encoding.decode(&index_to_bits(idx, n));
            *weight_counts.entry(weights).or_insert(0) += count;
        }
        let mut candidates: Vec<Candidate> = weight_counts
            .into_iter()
            .map(|(weights, count)| Candidate {
                objective: program.evaluate(&weights),
                feasible: program.is_feasible(&weights),
                probability: f64::from(count) / f64::from(classical.shots),
                weights,
            })
            .collect();
        // Most probable first; ties broken by weights so the order is
        // deterministic across runs.
        candidates.sort_by(|a, b| {
            b.probability
                .partial_cmp(&a.probability)
                .unwrap()
                .then_with(|| a.weights.cmp(&b.weights))
        });

        let best = candidates
            .iter()
            .filter(|c| c.feasible)
            .min_by(|a, b| a.objective.partial_cmp(&b.objective).unwrap())
            .cloned();

        info!(
            candidates = candidates.len(),
            evaluations = circuit_evaluations,
            best = best.as_ref().map(|c| c.objective),
            "quantum solve finished"
        );

        Ok(SolutionDistribution {
            candidates,
            best,
            optimal_gamma,
            optimal_beta,
            iterations: result.num_iterations,
            circuit_evaluations,
            objective_history: result.history,
        })
    }

    async fn solve_classically(&self, program: &QuadraticProgram) -> SolverResult<Solution> {
        let size = program.domain_size();
        if size > MAX_ENUMERATION {
            return Err(SolverError::ProblemTooLarge(format!(
                "box domain has {size} points, enumeration limit {MAX_ENUMERATION}"
            )));
        }
        let mut best: Option<Solution> = None;
        for point in program.box_points() {
            if !program.is_feasible(&point) {
                continue;
            }
            let objective = program.evaluate(&point);
            if best.as_ref().is_none_or(|b| objective < b.objective) {
                best = Some(Solution {
                    weights: point,
                    objective,
                });
            }
        }
        best.ok_or_else(|| {
            SolverError::InfeasibleConstraint("no feasible point in the variable box".into())
        })
    }
}

/// CVaR tail expectation of a cost distribution.
///
/// Averages the lowest-cost `alpha` probability mass; `alpha = 1.0` is the
/// plain expectation. `alpha` must be in (0, 1].
pub fn cvar_expectation(costs: &[f64], probs: &[f64], alpha: f64) -> f64 {
    debug_assert_eq!(costs.len(), probs.len());
    let mut order: Vec<usize> = (0..costs.len()).collect();
    order.sort_by(|&a, &b| costs[a].partial_cmp(&costs[b]).unwrap());

    let mut taken = 0.0;
    let mut value = 0.0;
    for idx in order {
        if taken >= alpha {
            break;
        }
        let take = probs[idx].min(alpha - taken);
        value += costs[idx] * take;
        taken += take;
    }
    if taken > 0.0 { value / taken } else { 0.0 }
}

/// Draw `shots` basis-state samples from a probability distribution.
fn sample_counts(probs: &[f64], shots: u32, seed: u64) -> HashMap<usize, u32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut counts = HashMap::new();
    for _ in 0..shots {
        let mut r: f64 = rng.r#gen();
        let mut drawn = probs.len() - 1;
        for (idx, p) in probs.iter().enumerate() {
            if r < *p {
                drawn = idx;
                break;
            }
            r -= p;
        }
        *counts.entry(drawn).or_insert(0) += 1;
    }
    counts
}

/// Perturbed restart parameters from a cheap seeded generator.
fn perturbed_parameters(p: usize, seed: u64) -> (Vec<f64>, Vec<f64>) {
    let mut state = seed.wrapping_mul(12345).wrapping_add(42);
    let mut rand = || {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        (state as f64 / u64::MAX as f64) * std::f64::consts::FRAC_PI_2
    };
    ((0..p).map(|_| rand()).collect(), (0..p).map(|_| rand()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cvar_alpha_one_is_expectation() {
        let costs = vec![1.0, 2.0, 3.0, 4.0];
        let probs = vec![0.1, 0.2, 0.3, 0.4];
        let expectation: f64 = costs.iter().zip(&probs).map(|(c, p)| c * p).sum();
        assert!((cvar_expectation(&costs, &probs, 1.0) - expectation).abs() < 1e-12);
    }

    #[test]
    fn test_cvar_small_alpha_takes_best_tail() {
        let costs = vec![5.0, -1.0, 3.0];
        let probs = vec![0.5, 0.25, 0.25];
        // alpha = 0.25 is exactly the mass of the cheapest state.
        assert!((cvar_expectation(&costs, &probs, 0.25) - (-1.0)).abs() < 1e-12);
        // alpha = 0.5 averages the two cheapest equally.
        assert!((cvar_expectation(&costs, &probs, 0.5) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cvar_fractional_tail() {
        let costs = vec![0.0, 10.0];
        let probs = vec![0.1, 0.9];
        // 0.1 mass at 0, then 0.1 of the 10.0 state: (0 + 1.0) / 0.2 = 5.0.
        assert!((cvar_expectation(&costs, &probs, 0.2) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_sample_counts_deterministic_and_complete() {
        let probs = vec![0.25, 0.25, 0.5];
        let a = sample_counts(&probs, 1000, 7);
        let b = sample_counts(&probs, 1000, 7);
        assert_eq!(a, b);
        assert_eq!(a.values().sum::<u32>(), 1000);
        // The 0.5 state should dominate.
        assert!(a[&2] > a.get(&0).copied().unwrap_or(0));
    }
}
