//! Mathematical-program description produced by the formulator.
//!
//! A [`QuadraticProgram`] is an immutable problem description: variables with
//! bounded domains, one quadratic objective, and linear constraints. It holds
//! no solver state; solving happens behind the service boundary in
//! [`crate::solver`].

use serde::{Deserialize, Serialize};

/// Domain kind of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarKind {
    /// Variable in {0, 1}.
    Binary,
    /// Integer variable in [lower, upper].
    Integer,
    /// Continuous variable in [lower, upper].
    Continuous,
}

/// A bounded decision variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Variable name (e.g. `w_2`).
    pub name: String,
    /// Domain kind.
    pub kind: VarKind,
    /// Inclusive lower bound.
    pub lower: i64,
    /// Inclusive upper bound.
    pub upper: i64,
}

impl Variable {
    /// Create an integer variable over `[0, upper]`.
    pub fn integer(name: impl Into<String>, upper: i64) -> Self {
        Self {
            name: name.into(),
            kind: VarKind::Integer,
            lower: 0,
            upper,
        }
    }

    /// Create a binary variable.
    pub fn binary(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VarKind::Binary,
            lower: 0,
            upper: 1,
        }
    }

    /// Number of values in this variable's domain.
    pub fn domain_size(&self) -> u128 {
        (self.upper - self.lower + 1) as u128
    }
}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    /// Minimize the objective.
    Minimize,
    /// Maximize the objective.
    Maximize,
}

/// Quadratic objective c + l·x + Σ q_ij x_i x_j.
///
/// Quadratic terms are stored as `(i, j, coefficient)` with `i <= j`; the
/// coefficient is the full weight of the `x_i x_j` product (diagonal terms
/// use `i == j`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadraticObjective {
    /// Quadratic terms `(i, j, q_ij)` with `i <= j`.
    pub quadratic: Vec<(usize, usize, f64)>,
    /// Linear coefficients, one per variable.
    pub linear: Vec<f64>,
    /// Constant offset.
    pub constant: f64,
    /// Optimization direction.
    pub sense: Sense,
}

impl QuadraticObjective {
    /// Evaluate the objective at a concrete point.
    pub fn evaluate(&self, x: &[i64]) -> f64 {
        let mut value = self.constant;
        for (coeff, xi) in self.linear.iter().zip(x) {
            value += coeff * *xi as f64;
        }
        for &(i, j, q) in &self.quadratic {
            value += q * x[i] as f64 * x[j] as f64;
        }
        value
    }
}

/// Direction of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintSense {
    /// a·x <= rhs
    Le,
    /// a·x >= rhs
    Ge,
    /// a·x == rhs
    Eq,
}

/// A linear constraint a·x (<=|>=|==) rhs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConstraint {
    /// Constraint name (e.g. `total_budget`).
    pub name: String,
    /// Coefficients, one per variable.
    pub coefficients: Vec<f64>,
    /// Constraint direction.
    pub sense: ConstraintSense,
    /// Right-hand side.
    pub rhs: f64,
}

impl LinearConstraint {
    /// Left-hand side value at a concrete point.
    pub fn lhs(&self, x: &[i64]) -> f64 {
        self.coefficients
            .iter()
            .zip(x)
            .map(|(a, xi)| a * *xi as f64)
            .sum()
    }

    /// Whether a concrete point satisfies this constraint.
    pub fn is_satisfied(&self, x: &[i64]) -> bool {
        let lhs = self.lhs(x);
        match self.sense {
            ConstraintSense::Le => lhs <= self.rhs + 1e-9,
            ConstraintSense::Ge => lhs >= self.rhs - 1e-9,
            ConstraintSense::Eq => (lhs - self.rhs).abs() <= 1e-9,
        }
    }
}

/// A complete, validated mathematical-program description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadraticProgram {
    /// Program name.
    pub name: String,
    /// Decision variables.
    pub variables: Vec<Variable>,
    /// The objective function.
    pub objective: QuadraticObjective,
    /// Linear constraints.
    pub constraints: Vec<LinearConstraint>,
}

impl QuadraticProgram {
    /// Number of decision variables.
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Size of the box domain (product of per-variable domain sizes),
    /// before any constraint is applied.
    pub fn domain_size(&self) -> u128 {
        self.variables.iter().map(Variable::domain_size).product()
    }

    /// The shared variable kind, or `None` if kinds are mixed.
    ///
    /// Quantum lowering requires a single discrete kind across all
    /// variables; a mixed program must be rejected before lowering.
    pub fn uniform_kind(&self) -> Option<VarKind> {
        let first = self.variables.first()?.kind;
        self.variables
            .iter()
            .all(|v| v.kind == first)
            .then_some(first)
    }

    /// Evaluate the objective at a concrete point.
    pub fn evaluate(&self, x: &[i64]) -> f64 {
        self.objective.evaluate(x)
    }

    /// Whether a concrete point is inside all variable bounds and satisfies
    /// every constraint.
    pub fn is_feasible(&self, x: &[i64]) -> bool {
        if x.len() != self.variables.len() {
            return false;
        }
        let in_bounds = self
            .variables
            .iter()
            .zip(x)
            .all(|(v, xi)| (v.lower..=v.upper).contains(xi));
        in_bounds && self.constraints.iter().all(|c| c.is_satisfied(x))
    }

    /// Iterate over every point of the box domain.
    ///
    /// Intended for exact reference solving on small programs; callers must
    /// check [`Self::domain_size`] first.
    pub fn box_points(&self) -> BoxPoints<'_> {
        BoxPoints {
            program: self,
            current: self.variables.iter().map(|v| v.lower).collect(),
            done: self.variables.is_empty(),
        }
    }
}

/// Iterator over all points of a program's box domain.
pub struct BoxPoints<'a> {
    program: &'a QuadraticProgram,
    current: Vec<i64>,
    done: bool,
}

impl Iterator for BoxPoints<'_> {
    type Item = Vec<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.current.clone();
        // Odometer increment across variable domains.
        self.done = true;
        for (i, var) in self.program.variables.iter().enumerate() {
            if self.current[i] < var.upper {
                self.current[i] += 1;
                self.done = false;
                break;
            }
            self.current[i] = var.lower;
        }
        Some(item)
    }
}

impl std::fmt::Display for QuadraticProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} ({} variables, {} constraints):",
            self.name,
            self.variables.len(),
            self.constraints.len()
        )?;
        for v in &self.variables {
            writeln!(f, "  {} in [{}, {}]", v.name, v.lower, v.upper)?;
        }
        for c in &self.constraints {
            let op = match c.sense {
                ConstraintSense::Le => "<=",
                ConstraintSense::Ge => ">=",
                ConstraintSense::Eq => "==",
            };
            writeln!(f, "  {}: a.x {} {}", c.name, op, c.rhs)?;
        }
        Ok(())
    }
}
