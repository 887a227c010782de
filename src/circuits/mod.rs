//! Quantum circuit representation and QAOA ansatz construction.

pub mod qaoa;
pub mod simulator;

use serde::{Deserialize, Serialize};

/// A gate in the QAOA gate set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    /// Hadamard.
    H(u32),
    /// X rotation by an angle.
    Rx(f64, u32),
    /// Z rotation by an angle.
    Rz(f64, u32),
    /// Controlled-X as (control, target).
    Cx(u32, u32),
}

/// A gate-list circuit over a fixed qubit register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    name: String,
    n_qubits: u32,
    gates: Vec<Gate>,
}

impl Circuit {
    /// Create an empty circuit.
    pub fn new(name: impl Into<String>, n_qubits: u32) -> Self {
        Self {
            name: name.into(),
            n_qubits,
            gates: Vec::new(),
        }
    }

    /// Circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register width.
    pub fn num_qubits(&self) -> u32 {
        self.n_qubits
    }

    /// Number of gates.
    pub fn num_gates(&self) -> usize {
        self.gates.len()
    }

    /// The gate list in application order.
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Append a Hadamard.
    pub fn h(&mut self, q: u32) -> &mut Self {
        debug_assert!(q < self.n_qubits);
        self.gates.push(Gate::H(q));
        self
    }

    /// Append an RX rotation.
    pub fn rx(&mut self, theta: f64, q: u32) -> &mut Self {
        debug_assert!(q < self.n_qubits);
        self.gates.push(Gate::Rx(theta, q));
        self
    }

    /// Append an RZ rotation.
    pub fn rz(&mut self, theta: f64, q: u32) -> &mut Self {
        debug_assert!(q < self.n_qubits);
        self.gates.push(Gate::Rz(theta, q));
        self
    }

    /// Append a CX gate.
    pub fn cx(&mut self, control: u32, target: u32) -> &mut Self {
        debug_assert!(control < self.n_qubits && target < self.n_qubits && control != target);
        self.gates.push(Gate::Cx(control, target));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circuit_builder() {
        let mut c = Circuit::new("test", 2);
        c.h(0).cx(0, 1).rz(0.5, 1);
        assert_eq!(c.num_qubits(), 2);
        assert_eq!(c.num_gates(), 3);
        assert_eq!(c.gates()[1], Gate::Cx(0, 1));
    }
}
