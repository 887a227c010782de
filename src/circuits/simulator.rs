//! Dense statevector simulation of the QAOA gate set.

use num_complex::Complex64;

use crate::circuits::{Circuit, Gate};

/// Simulate a circuit from |0…0⟩ and return the final statevector.
pub fn simulate_statevector(circuit: &Circuit) -> Vec<Complex64> {
    let n = circuit.num_qubits() as usize;
    let dim = 1usize << n;
    let mut state = vec![Complex64::new(0.0, 0.0); dim];
    state[0] = Complex64::new(1.0, 0.0);

    for gate in circuit.gates() {
        apply_gate(&mut state, gate);
    }

    state
}

/// Basis-state probabilities |⟨x|ψ⟩|² of a statevector.
pub fn basis_probabilities(state: &[Complex64]) -> Vec<f64> {
    state.iter().map(Complex64::norm_sqr).collect()
}

/// Apply a single gate to the statevector in place.
fn apply_gate(state: &mut [Complex64], gate: &Gate) {
    match *gate {
        Gate::H(q) => {
            let q = q as usize;
            let h = std::f64::consts::FRAC_1_SQRT_2;
            for i in 0..state.len() {
                if (i >> q) & 1 == 0 {
                    let j = i | (1 << q);
                    let a = state[i];
                    let b = state[j];
                    state[i] = Complex64::new(h, 0.0) * (a + b);
                    state[j] = Complex64::new(h, 0.0) * (a - b);
                }
            }
        }
        Gate::Rx(theta, q) => {
            let q = q as usize;
            let c = (theta / 2.0).cos();
            let s = (theta / 2.0).sin();
            for i in 0..state.len() {
                if (i >> q) & 1 == 0 {
                    let j = i | (1 << q);
                    let a = state[i];
                    let b = state[j];
                    state[i] = Complex64::new(c, 0.0) * a - Complex64::new(0.0, s) * b;
                    state[j] = Complex64::new(0.0, -s) * a + Complex64::new(c, 0.0) * b;
                }
            }
        }
        Gate::Rz(theta, q) => {
            let q = q as usize;
            let phase0 = Complex64::new((-theta / 2.0).cos(), (-theta / 2.0).sin());
            let phase1 = Complex64::new((theta / 2.0).cos(), (theta / 2.0).sin());
            for (i, amp) in state.iter_mut().enumerate() {
                if (i >> q) & 1 == 0 {
                    *amp = phase0 * *amp;
                } else {
                    *amp = phase1 * *amp;
                }
            }
        }
        Gate::Cx(control, target) => {
            let control = control as usize;
            let target = target as usize;
            for i in 0..state.len() {
                if (i >> control) & 1 == 1 && (i >> target) & 1 == 0 {
                    let j = i | (1 << target);
                    state.swap(i, j);
                }
            }
        }
    }
}

/// Expand a basis index into its bit assignment (bit k of the index is
/// qubit k).
pub fn index_to_bits(index: usize, n_qubits: usize) -> Vec<u8> {
    (0..n_qubits).map(|k| ((index >> k) & 1) as u8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hadamard_superposition() {
        let mut c = Circuit::new("h", 2);
        c.h(0).h(1);
        let probs = basis_probabilities(&simulate_statevector(&c));
        for p in probs {
            assert!((p - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn test_cx_entangles() {
        let mut c = Circuit::new("bell", 2);
        c.h(0).cx(0, 1);
        let probs = basis_probabilities(&simulate_statevector(&c));
        assert!((probs[0b00] - 0.5).abs() < 1e-12);
        assert!((probs[0b11] - 0.5).abs() < 1e-12);
        assert!(probs[0b01] < 1e-12);
        assert!(probs[0b10] < 1e-12);
    }

    #[test]
    fn test_rx_pi_flips() {
        let mut c = Circuit::new("flip", 1);
        c.rx(std::f64::consts::PI, 0);
        let probs = basis_probabilities(&simulate_statevector(&c));
        assert!(probs[0] < 1e-12);
        assert!((probs[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rz_preserves_probabilities() {
        let mut c = Circuit::new("phase", 1);
        c.h(0).rz(1.234, 0);
        let probs = basis_probabilities(&simulate_statevector(&c));
        assert!((probs[0] - 0.5).abs() < 1e-12);
        assert!((probs[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_norm_preserved() {
        let mut c = Circuit::new("mixed", 3);
        c.h(0).h(1).h(2).cx(0, 2).rz(0.7, 2).rx(0.4, 1);
        let total: f64 = basis_probabilities(&simulate_statevector(&c)).iter().sum();
        assert!((total - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_index_to_bits() {
        assert_eq!(index_to_bits(0b101, 3), vec![1, 0, 1]);
        assert_eq!(index_to_bits(0, 2), vec![0, 0]);
    }
}
