//! QAOA ansatz construction for Ising cost Hamiltonians.
//!
//! The ansatz alternates a cost unitary exp(−iγH_C) built from the Ising
//! fields and couplings with a transverse-field mixer exp(−iβΣXⱼ).

use std::f64::consts::PI;

use crate::circuits::Circuit;
use crate::problems::IsingModel;

/// Build the QAOA ansatz for an Ising model.
///
/// Layer structure per repetition:
/// - cost unitary: RZZ(2γJᵢⱼ) per coupling (decomposed CX·RZ·CX) and
///   RZ(2γhᵢ) per field,
/// - mixer unitary: RX(2β) on every qubit.
///
/// `gamma` and `beta` must have equal length (the repetition count).
pub fn qaoa_circuit(ising: &IsingModel, gamma: &[f64], beta: &[f64]) -> Circuit {
    assert_eq!(
        gamma.len(),
        beta.len(),
        "gamma and beta must have same length"
    );
    let n = ising.num_spins() as u32;
    let mut circuit = Circuit::new("qaoa", n);

    // Uniform superposition.
    for q in 0..n {
        circuit.h(q);
    }

    for layer in 0..gamma.len() {
        apply_cost_unitary(&mut circuit, ising, gamma[layer]);
        apply_mixer_unitary(&mut circuit, n, beta[layer]);
    }

    circuit
}

/// Apply exp(−iγH_C) for the Ising cost Hamiltonian.
fn apply_cost_unitary(circuit: &mut Circuit, ising: &IsingModel, gamma: f64) {
    for (i, h) in ising.h.iter().enumerate() {
        if *h != 0.0 {
            circuit.rz(2.0 * gamma * h, i as u32);
        }
    }
    for &(i, j, jij) in &ising.j {
        if jij != 0.0 {
            // RZZ(2γJ) decomposition.
            circuit.cx(i as u32, j as u32);
            circuit.rz(2.0 * gamma * jij, j as u32);
            circuit.cx(i as u32, j as u32);
        }
    }
}

/// Apply the transverse-field mixer exp(−iβΣXⱼ) = Πⱼ RX(2β).
fn apply_mixer_unitary(circuit: &mut Circuit, n_qubits: u32, beta: f64) {
    for q in 0..n_qubits {
        circuit.rx(2.0 * beta, q);
    }
}

/// Strategy for initializing QAOA parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum InitStrategy {
    /// Linear interpolation: gamma increases, beta decreases.
    Linear,
    /// Fixed values: all gamma and beta are the same.
    Fixed,
    /// Trotterized adiabatic: mimics adiabatic evolution.
    TrotterizedAdiabatic,
    /// Random initialization within bounds.
    Random,
    /// Fourier-based initialization for smoother landscapes.
    Fourier,
}

impl Default for InitStrategy {
    fn default() -> Self {
        Self::TrotterizedAdiabatic
    }
}

/// Calculate initial parameters with a specific strategy.
///
/// Returns (gamma, beta) of length `p` each.
pub fn initial_parameters(p: usize, strategy: InitStrategy) -> (Vec<f64>, Vec<f64>) {
    match strategy {
        InitStrategy::Linear => {
            let gamma: Vec<f64> = (0..p)
                .map(|i| PI / 4.0 * (i + 1) as f64 / p as f64)
                .collect();
            let beta: Vec<f64> = (0..p)
                .map(|i| PI / 4.0 * (p - i) as f64 / p as f64)
                .collect();
            (gamma, beta)
        }
        InitStrategy::Fixed => (vec![PI / 4.0; p], vec![PI / 8.0; p]),
        InitStrategy::TrotterizedAdiabatic => {
            // Linear annealing schedule s(t): gamma ~ s, beta ~ (1 - s).
            let dt = 1.0 / (p + 1) as f64;
            let gamma: Vec<f64> = (1..=p)
                .map(|i| {
                    let s = i as f64 * dt;
                    s * PI / 2.0 * dt
                })
                .collect();
            let beta: Vec<f64> = (1..=p)
                .map(|i| {
                    let s = i as f64 * dt;
                    (1.0 - s) * PI / 2.0 * dt
                })
                .collect();
            (gamma, beta)
        }
        InitStrategy::Random => {
            // Deterministic pseudo-random for reproducibility.
            let mut seed: u64 = 42;
            let mut rand = || {
                seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
                (seed as f64 / u64::MAX as f64) * PI / 2.0
            };
            let gamma: Vec<f64> = (0..p).map(|_| rand()).collect();
            let beta: Vec<f64> = (0..p).map(|_| rand()).collect();
            (gamma, beta)
        }
        InitStrategy::Fourier => {
            let gamma: Vec<f64> = (0..p)
                .map(|k| PI / 4.0 * ((k as f64 + 0.5) * PI / p as f64).sin())
                .collect();
            let beta: Vec<f64> = (0..p)
                .map(|k| PI / 4.0 * ((k as f64 + 0.5) * PI / p as f64).cos())
                .collect();
            (gamma, beta)
        }
    }
}

/// Problem-aware initial parameters.
///
/// Scales gamma inversely with the root-mean-square coupling strength:
/// strongly coupled cost Hamiltonians need smaller cost-unitary steps.
pub fn problem_aware_initial_parameters(ising: &IsingModel, p: usize) -> (Vec<f64>, Vec<f64>) {
    let m = ising.j.len().max(1) as f64;
    let rms: f64 = (ising.j.iter().map(|(_, _, j)| j * j).sum::<f64>() / m).sqrt();
    let gamma_scale = if rms > 1.0 { 1.0 / rms.sqrt() } else { 1.0 };

    let (mut gamma, beta) = initial_parameters(p, InitStrategy::TrotterizedAdiabatic);
    for g in &mut gamma {
        *g *= gamma_scale;
    }
    (gamma, beta)
}

/// Bounds for QAOA parameters.
#[derive(Debug, Clone)]
pub struct ParameterBounds {
    /// Minimum gamma value.
    pub gamma_min: f64,
    /// Maximum gamma value.
    pub gamma_max: f64,
    /// Minimum beta value.
    pub beta_min: f64,
    /// Maximum beta value.
    pub beta_max: f64,
}

impl Default for ParameterBounds {
    fn default() -> Self {
        Self {
            gamma_min: 0.0,
            gamma_max: PI,
            beta_min: 0.0,
            beta_max: PI / 2.0,
        }
    }
}

impl ParameterBounds {
    /// Tight bounds for faster convergence on typical instances.
    pub fn tight() -> Self {
        Self {
            gamma_min: 0.0,
            gamma_max: PI / 2.0,
            beta_min: 0.0,
            beta_max: PI / 4.0,
        }
    }

    /// Clip parameters to bounds.
    pub fn clip(&self, gamma: &mut [f64], beta: &mut [f64]) {
        for g in gamma {
            *g = g.clamp(self.gamma_min, self.gamma_max);
        }
        for b in beta {
            *b = b.clamp(self.beta_min, self.beta_max);
        }
    }
}

/// Number of variational parameters for `p` repetitions.
pub fn num_parameters(p: usize) -> usize {
    2 * p
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problems::{PortfolioProblem, encode_program};

    fn demo_ising() -> IsingModel {
        let program = PortfolioProblem::two_asset().formulate();
        let (_, qubo) = encode_program(&program, None).unwrap();
        qubo.to_ising()
    }

    #[test]
    fn test_qaoa_circuit_shape() {
        let ising = demo_ising();
        let circuit = qaoa_circuit(&ising, &[0.5], &[0.3]);
        assert_eq!(circuit.num_qubits() as usize, ising.num_spins());
        // H layer + at least one cost and mixer gate.
        assert!(circuit.num_gates() > ising.num_spins() * 2);
    }

    #[test]
    fn test_multi_layer_grows_circuit() {
        let ising = demo_ising();
        let one = qaoa_circuit(&ising, &[0.1], &[0.2]);
        let three = qaoa_circuit(&ising, &[0.1, 0.2, 0.3], &[0.3, 0.2, 0.1]);
        assert!(three.num_gates() > one.num_gates());
    }

    #[test]
    fn test_initial_parameters_adiabatic() {
        let (gamma, beta) = initial_parameters(3, InitStrategy::TrotterizedAdiabatic);
        assert_eq!(gamma.len(), 3);
        assert_eq!(beta.len(), 3);
        // Gamma increases, beta decreases along the schedule.
        assert!(gamma[0] < gamma[1] && gamma[1] < gamma[2]);
        assert!(beta[0] > beta[1] && beta[1] > beta[2]);
    }

    #[test]
    fn test_parameter_bounds_clip() {
        let bounds = ParameterBounds::tight();
        let mut gamma = vec![10.0, -1.0];
        let mut beta = vec![10.0];
        bounds.clip(&mut gamma, &mut beta);
        assert_eq!(gamma, vec![bounds.gamma_max, 0.0]);
        assert_eq!(beta, vec![bounds.beta_max]);
    }

    #[test]
    fn test_num_parameters() {
        assert_eq!(num_parameters(1), 2);
        assert_eq!(num_parameters(3), 6);
    }
}
