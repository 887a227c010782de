//! Lowering a bounded-integer quadratic program to QUBO / Ising form.
//!
//! Each integer variable is expanded into binary digits with bounded
//! coefficients (1, 2, 4, …, remainder) so that exactly the values
//! `[lower, upper]` are representable. Inequality constraints gain an
//! integer slack variable and are folded into the objective as a squared
//! penalty. The resulting QUBO converts to an Ising model via
//! x = (1 − z) / 2, which is what the QAOA cost unitary consumes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::problems::program::{ConstraintSense, QuadraticProgram, Sense, VarKind};

/// Errors raised while lowering a program to QUBO form.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EncodingError {
    /// Variables do not share a single kind.
    #[error("mixed variable kinds: all decision variables must share one kind")]
    MixedVariableKinds,

    /// Continuous variables cannot be binary-encoded.
    #[error("unsupported variable kind: continuous variable {0} cannot be binary-encoded")]
    ContinuousVariable(String),

    /// A variable's bounds are inverted.
    #[error("invalid bounds for {name}: [{lower}, {upper}]")]
    InvalidBounds {
        /// Variable name.
        name: String,
        /// Lower bound.
        lower: i64,
        /// Upper bound.
        upper: i64,
    },

    /// A constraint cannot be satisfied anywhere in the variable box.
    #[error("constraint {0} is infeasible over the variable bounds")]
    InfeasibleConstraint(String),
}

/// Digit coefficients encoding the integers `[0, bound]`.
///
/// Powers of two followed by a remainder digit: every value in the range is
/// a subset sum, and no subset sum exceeds `bound`. `bound = 0` yields an
/// empty encoding (the variable is fixed).
pub fn bounded_coefficients(bound: u32) -> Vec<u32> {
    let mut coefficients = Vec::new();
    let mut remaining = bound;
    let mut digit = 1u32;
    while remaining > 0 {
        let c = digit.min(remaining);
        coefficients.push(c);
        remaining -= c;
        digit *= 2;
    }
    coefficients
}

/// Bit layout produced by lowering: one digit group per program variable,
/// then one group per slack variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryEncoding {
    /// Digit coefficients per program variable, in variable order.
    pub variable_digits: Vec<Vec<u32>>,
    /// Lower bound per program variable (added back on decode).
    pub variable_lowers: Vec<i64>,
    /// Digit coefficients per slack variable, in constraint order
    /// (empty groups for constraints that needed no slack).
    pub slack_digits: Vec<Vec<u32>>,
}

impl BinaryEncoding {
    /// Total number of qubits (program bits plus slack bits).
    pub fn num_qubits(&self) -> usize {
        self.num_variable_bits() + self.slack_digits.iter().map(Vec::len).sum::<usize>()
    }

    /// Number of bits spent on program variables.
    pub fn num_variable_bits(&self) -> usize {
        self.variable_digits.iter().map(Vec::len).sum()
    }

    /// Decode a bit assignment into program-variable values.
    ///
    /// Slack bits beyond the program-variable region are ignored.
    pub fn decode(&self, bits: &[u8]) -> Vec<i64> {
        let mut values = Vec::with_capacity(self.variable_digits.len());
        let mut offset = 0;
        for (digits, lower) in self.variable_digits.iter().zip(&self.variable_lowers) {
            let mut v = *lower;
            for (k, c) in digits.iter().enumerate() {
                if bits[offset + k] != 0 {
                    v += i64::from(*c);
                }
            }
            offset += digits.len();
            values.push(v);
        }
        values
    }

    /// Encode program-variable values (plus explicit slack values) to bits.
    ///
    /// Greedy digit fill; values outside a variable's domain are clamped to
    /// it. Primarily used by tests to cross-check the lowering.
    pub fn encode(&self, values: &[i64], slacks: &[i64]) -> Vec<u8> {
        let mut bits = Vec::with_capacity(self.num_qubits());
        for ((digits, lower), value) in self
            .variable_digits
            .iter()
            .zip(&self.variable_lowers)
            .zip(values)
        {
            fill_digits(&mut bits, digits, value - lower);
        }
        for (digits, slack) in self.slack_digits.iter().zip(slacks) {
            fill_digits(&mut bits, digits, *slack);
        }
        bits
    }
}

fn fill_digits(bits: &mut Vec<u8>, digits: &[u32], mut remaining: i64) {
    // Largest digit first makes the greedy fill exact for this digit set.
    let mut chosen = vec![0u8; digits.len()];
    for (k, c) in digits.iter().enumerate().rev() {
        if remaining >= i64::from(*c) {
            chosen[k] = 1;
            remaining -= i64::from(*c);
        }
    }
    bits.extend(chosen);
}

/// Quadratic unconstrained binary objective.
///
/// `value(x) = offset + Σ linear[i]·xᵢ + Σ quadratic[(i,j)]·xᵢxⱼ` with
/// `i < j`; diagonal products are folded into the linear part (x² = x).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Qubo {
    /// Linear coefficients, one per bit.
    pub linear: Vec<f64>,
    /// Strictly-upper-triangle pair coefficients `(i, j, q)` with `i < j`.
    pub quadratic: Vec<(usize, usize, f64)>,
    /// Constant offset.
    pub offset: f64,
    /// Penalty weight applied to constraint terms.
    pub penalty: f64,
}

impl Qubo {
    /// Number of binary variables.
    pub fn num_bits(&self) -> usize {
        self.linear.len()
    }

    /// Evaluate at a bit assignment.
    pub fn evaluate(&self, bits: &[u8]) -> f64 {
        let mut value = self.offset;
        for (l, b) in self.linear.iter().zip(bits) {
            if *b != 0 {
                value += l;
            }
        }
        for &(i, j, q) in &self.quadratic {
            if bits[i] != 0 && bits[j] != 0 {
                value += q;
            }
        }
        value
    }

    /// Convert to an Ising model via xᵢ = (1 − zᵢ) / 2.
    pub fn to_ising(&self) -> IsingModel {
        let n = self.num_bits();
        let mut h = vec![0.0; n];
        let mut offset = self.offset;
        for (i, l) in self.linear.iter().enumerate() {
            offset += l / 2.0;
            h[i] -= l / 2.0;
        }
        let mut j_terms = Vec::with_capacity(self.quadratic.len());
        for &(i, j, q) in &self.quadratic {
            offset += q / 4.0;
            h[i] -= q / 4.0;
            h[j] -= q / 4.0;
            j_terms.push((i, j, q / 4.0));
        }
        IsingModel {
            h,
            j: j_terms,
            offset,
        }
    }
}

/// Ising energy `offset + Σ hᵢzᵢ + Σ Jᵢⱼzᵢzⱼ` over spins z ∈ {+1, −1}.
///
/// Bit convention: x = 0 maps to z = +1 and x = 1 to z = −1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsingModel {
    /// Longitudinal fields hᵢ.
    pub h: Vec<f64>,
    /// Couplings `(i, j, Jᵢⱼ)` with `i < j`.
    pub j: Vec<(usize, usize, f64)>,
    /// Constant energy offset.
    pub offset: f64,
}

impl IsingModel {
    /// Number of spins.
    pub fn num_spins(&self) -> usize {
        self.h.len()
    }

    /// Energy of a bit assignment (bit 1 = spin down).
    pub fn evaluate_bits(&self, bits: &[u8]) -> f64 {
        let z = |b: u8| if b == 0 { 1.0 } else { -1.0 };
        let mut e = self.offset;
        for (hi, b) in self.h.iter().zip(bits) {
            e += hi * z(*b);
        }
        for &(i, j, jij) in &self.j {
            e += jij * z(bits[i]) * z(bits[j]);
        }
        e
    }
}

/// Lower a program to QUBO form with penalized constraints.
///
/// `penalty` of `None` selects a weight one larger than an upper bound on
/// the objective's range over the variable box, so a unit constraint
/// violation always costs more than any objective improvement.
pub fn encode_program(
    program: &QuadraticProgram,
    penalty: Option<f64>,
) -> Result<(BinaryEncoding, Qubo), EncodingError> {
    match program.uniform_kind() {
        Some(VarKind::Integer) | Some(VarKind::Binary) => {}
        Some(VarKind::Continuous) => {
            let name = program
                .variables
                .iter()
                .find(|v| v.kind == VarKind::Continuous)
                .map(|v| v.name.clone())
                .unwrap_or_default();
            return Err(EncodingError::ContinuousVariable(name));
        }
        None => return Err(EncodingError::MixedVariableKinds),
    }

    let mut variable_digits = Vec::with_capacity(program.num_variables());
    let mut variable_lowers = Vec::with_capacity(program.num_variables());
    for v in &program.variables {
        if v.upper < v.lower {
            return Err(EncodingError::InvalidBounds {
                name: v.name.clone(),
                lower: v.lower,
                upper: v.upper,
            });
        }
        variable_digits.push(bounded_coefficients((v.upper - v.lower) as u32));
        variable_lowers.push(v.lower);
    }

    // Bit offset of each program variable's digit group.
    let mut group_offsets = Vec::with_capacity(variable_digits.len());
    let mut cursor = 0usize;
    for digits in &variable_digits {
        group_offsets.push(cursor);
        cursor += digits.len();
    }
    let variable_bits = cursor;

    let sign = match program.objective.sense {
        Sense::Minimize => 1.0,
        Sense::Maximize => -1.0,
    };
    let penalty = penalty.unwrap_or_else(|| 1.0 + objective_range_bound(program));

    // Slack layout must be known before accumulation so the bit count is fixed.
    let mut slack_digits = Vec::with_capacity(program.constraints.len());
    let mut normalized = Vec::with_capacity(program.constraints.len());
    for c in &program.constraints {
        // Normalize Ge to Le by negation; Eq gets no slack.
        let (coeffs, rhs, needs_slack) = match c.sense {
            ConstraintSense::Le => (c.coefficients.clone(), c.rhs, true),
            ConstraintSense::Ge => (
                c.coefficients.iter().map(|a| -a).collect::<Vec<_>>(),
                -c.rhs,
                true,
            ),
            ConstraintSense::Eq => (c.coefficients.clone(), c.rhs, false),
        };
        let lhs_min: f64 = coeffs
            .iter()
            .zip(&program.variables)
            .map(|(a, v)| (a * v.lower as f64).min(a * v.upper as f64))
            .sum();
        if needs_slack {
            if rhs < lhs_min - 1e-9 {
                return Err(EncodingError::InfeasibleConstraint(c.name.clone()));
            }
            let bound = (rhs - lhs_min).floor().max(0.0) as u32;
            slack_digits.push(bounded_coefficients(bound));
        } else {
            slack_digits.push(Vec::new());
        }
        normalized.push((coeffs, rhs, needs_slack));
    }
    let encoding = BinaryEncoding {
        variable_digits,
        variable_lowers,
        slack_digits,
    };
    let n_bits = encoding.num_qubits();

    let mut linear = vec![0.0; n_bits];
    let mut pairs = vec![0.0; n_bits * n_bits];
    let mut offset = 0.0;
    let add_pair = |pairs: &mut Vec<f64>, linear: &mut Vec<f64>, a: usize, b: usize, q: f64| {
        if a == b {
            linear[a] += q; // x² = x
        } else {
            let (lo, hi) = if a < b { (a, b) } else { (b, a) };
            pairs[lo * n_bits + hi] += q;
        }
    };

    // Objective: substitute w_i = lower_i + Σ c_k x_k.
    offset += sign * program.objective.constant;
    for (i, l) in program.objective.linear.iter().enumerate() {
        offset += sign * l * encoding.variable_lowers[i] as f64;
        for (k, c) in encoding.variable_digits[i].iter().enumerate() {
            linear[group_offsets[i] + k] += sign * l * f64::from(*c);
        }
    }
    for &(i, j, q) in &program.objective.quadratic {
        let (li, lj) = (
            encoding.variable_lowers[i] as f64,
            encoding.variable_lowers[j] as f64,
        );
        offset += sign * q * li * lj;
        for (k, c) in encoding.variable_digits[i].iter().enumerate() {
            linear[group_offsets[i] + k] += sign * q * lj * f64::from(*c);
        }
        for (k, c) in encoding.variable_digits[j].iter().enumerate() {
            linear[group_offsets[j] + k] += sign * q * li * f64::from(*c);
        }
        for (ka, ca) in encoding.variable_digits[i].iter().enumerate() {
            for (kb, cb) in encoding.variable_digits[j].iter().enumerate() {
                add_pair(
                    &mut pairs,
                    &mut linear,
                    group_offsets[i] + ka,
                    group_offsets[j] + kb,
                    sign * q * f64::from(*ca) * f64::from(*cb),
                );
            }
        }
    }

    // Constraints: penalty · (Σ d_m x_m + t)² per constraint, where d_m are
    // the bit weights of the (normalized) lhs plus slack and t collects the
    // constant part minus rhs.
    let mut slack_cursor = variable_bits;
    for ((coeffs, rhs, needs_slack), digits) in normalized.iter().zip(&encoding.slack_digits) {
        let mut weights: Vec<(usize, f64)> = Vec::new();
        let mut t = -rhs;
        for (i, a) in coeffs.iter().enumerate() {
            t += a * encoding.variable_lowers[i] as f64;
            for (k, c) in encoding.variable_digits[i].iter().enumerate() {
                weights.push((group_offsets[i] + k, a * f64::from(*c)));
            }
        }
        if *needs_slack {
            for (k, c) in digits.iter().enumerate() {
                weights.push((slack_cursor + k, f64::from(*c)));
            }
            slack_cursor += digits.len();
        }
        offset += penalty * t * t;
        for &(m, d) in &weights {
            linear[m] += penalty * (d * d + 2.0 * t * d);
        }
        for (a, &(m, dm)) in weights.iter().enumerate() {
            for &(n, dn) in weights.iter().skip(a + 1) {
                add_pair(&mut pairs, &mut linear, m, n, penalty * 2.0 * dm * dn);
            }
        }
    }

    let mut quadratic = Vec::new();
    for i in 0..n_bits {
        for j in (i + 1)..n_bits {
            let q = pairs[i * n_bits + j];
            if q != 0.0 {
                quadratic.push((i, j, q));
            }
        }
    }

    Ok((
        encoding,
        Qubo {
            linear,
            quadratic,
            offset,
            penalty,
        },
    ))
}

/// Upper bound of |objective| variation over the variable box.
fn objective_range_bound(program: &QuadraticProgram) -> f64 {
    let max_abs: Vec<f64> = program
        .variables
        .iter()
        .map(|v| (v.lower.abs().max(v.upper.abs())) as f64)
        .collect();
    let mut bound = 0.0;
    for (i, l) in program.objective.linear.iter().enumerate() {
        bound += l.abs() * max_abs[i];
    }
    for &(i, j, q) in &program.objective.quadratic {
        bound += q.abs() * max_abs[i] * max_abs[j];
    }
    bound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problems::portfolio::PortfolioProblem;
    use crate::problems::program::{QuadraticObjective, QuadraticProgram, Sense, Variable};
    use proptest::prelude::*;

    #[test]
    fn test_bounded_coefficients() {
        assert_eq!(bounded_coefficients(0), Vec::<u32>::new());
        assert_eq!(bounded_coefficients(1), vec![1]);
        assert_eq!(bounded_coefficients(2), vec![1, 1]);
        assert_eq!(bounded_coefficients(3), vec![1, 2]);
        assert_eq!(bounded_coefficients(5), vec![1, 2, 2]);
        assert_eq!(bounded_coefficients(8), vec![1, 2, 4, 1]);
    }

    #[test]
    fn test_coefficients_cover_range_exactly() {
        for bound in 0..=12u32 {
            let coeffs = bounded_coefficients(bound);
            let mut reachable = vec![false; bound as usize + 1];
            for mask in 0..(1u32 << coeffs.len()) {
                let sum: u32 = coeffs
                    .iter()
                    .enumerate()
                    .filter(|(k, _)| mask >> k & 1 == 1)
                    .map(|(_, c)| *c)
                    .sum();
                assert!(sum <= bound, "bound {bound}: subset sum {sum} overshoots");
                reachable[sum as usize] = true;
            }
            assert!(
                reachable.iter().all(|r| *r),
                "bound {bound}: not all values reachable"
            );
        }
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let program = PortfolioProblem::demo_4().formulate();
        let (encoding, _) = encode_program(&program, None).unwrap();
        for w in program.box_points() {
            let bits = encoding.encode(&w, &[0]);
            assert_eq!(encoding.decode(&bits), w);
        }
    }

    #[test]
    fn test_qubo_matches_program_on_feasible_points() {
        let problem = PortfolioProblem::demo_4();
        let program = problem.formulate();
        let (encoding, qubo) = encode_program(&program, None).unwrap();
        assert_eq!(qubo.num_bits(), encoding.num_qubits());
        for w in program.box_points() {
            let total: i64 = w.iter().sum();
            if total > 8 {
                continue;
            }
            // Slack chosen so the penalized equality holds exactly.
            let bits = encoding.encode(&w, &[8 - total]);
            assert!(
                (qubo.evaluate(&bits) - program.evaluate(&w)).abs() < 1e-6,
                "lowering disagrees at {w:?}"
            );
        }
    }

    #[test]
    fn test_penalty_dominates_violations() {
        let program = PortfolioProblem::demo_4().formulate();
        let (encoding, qubo) = encode_program(&program, None).unwrap();
        // Feasible optimum over the lowered space must beat any violated point.
        let feasible_best = program
            .box_points()
            .filter(|w| program.is_feasible(w))
            .map(|w| program.evaluate(&w))
            .fold(f64::INFINITY, f64::min);
        // All-ones is maximally infeasible here (sum 8 + slack 8 > budget).
        let violated = vec![1u8; encoding.num_qubits()];
        assert!(qubo.evaluate(&violated) > feasible_best);
    }

    #[test]
    fn test_ising_matches_qubo() {
        let program = PortfolioProblem::two_asset().formulate();
        let (encoding, qubo) = encode_program(&program, None).unwrap();
        let ising = qubo.to_ising();
        let n = encoding.num_qubits();
        for mask in 0..(1usize << n) {
            let bits: Vec<u8> = (0..n).map(|k| (mask >> k & 1) as u8).collect();
            assert!(
                (qubo.evaluate(&bits) - ising.evaluate_bits(&bits)).abs() < 1e-9,
                "Ising conversion disagrees at {bits:?}"
            );
        }
    }

    #[test]
    fn test_mixed_kinds_rejected() {
        let mut program = PortfolioProblem::two_asset().formulate();
        program.variables[0].kind = VarKind::Continuous;
        let err = encode_program(&program, None).unwrap_err();
        assert!(matches!(err, EncodingError::MixedVariableKinds));
    }

    #[test]
    fn test_all_continuous_rejected() {
        let program = QuadraticProgram {
            name: "cont".into(),
            variables: vec![Variable {
                name: "y".into(),
                kind: VarKind::Continuous,
                lower: 0,
                upper: 1,
            }],
            objective: QuadraticObjective {
                quadratic: vec![],
                linear: vec![1.0],
                constant: 0.0,
                sense: Sense::Minimize,
            },
            constraints: vec![],
        };
        let err = encode_program(&program, None).unwrap_err();
        assert!(matches!(err, EncodingError::ContinuousVariable(_)));
    }

    #[test]
    fn test_infeasible_constraint_rejected() {
        let mut program = PortfolioProblem::two_asset().formulate();
        program.constraints[0].rhs = -1.0;
        let err = encode_program(&program, None).unwrap_err();
        assert!(matches!(err, EncodingError::InfeasibleConstraint(_)));
    }

    #[test]
    fn test_equality_constraint_without_slack() {
        let mut program = PortfolioProblem::two_asset().formulate();
        program.constraints[0].sense = ConstraintSense::Eq;
        program.constraints[0].rhs = 1.0;
        let (encoding, qubo) = encode_program(&program, None).unwrap();
        assert!(encoding.slack_digits.iter().all(Vec::is_empty));
        // Exactly-one-asset points carry no penalty.
        let bits = encoding.encode(&[1, 0], &[]);
        assert!((qubo.evaluate(&bits) - program.evaluate(&[1, 0])).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_qubo_agrees_with_program(
            mu in proptest::collection::vec(-3.0f64..3.0, 3),
            diag in proptest::collection::vec(0.1f64..1.0, 3),
            off in proptest::collection::vec(-0.5f64..0.5, 3),
            budget in 1u32..5,
        ) {
            let cov = vec![
                vec![diag[0], off[0], off[1]],
                vec![off[0], diag[1], off[2]],
                vec![off[1], off[2], diag[2]],
            ];
            let problem = PortfolioProblem::new(
                mu, cov, f64::from(budget), vec![1, 2, 1],
            ).unwrap();
            let program = problem.formulate();
            let (encoding, qubo) = encode_program(&program, None).unwrap();
            for w in program.box_points() {
                let total: i64 = w.iter().sum();
                let slack = i64::from(budget) - total;
                if slack < 0 {
                    continue;
                }
                let bits = encoding.encode(&w, &[slack]);
                prop_assert!(
                    (qubo.evaluate(&bits) - program.evaluate(&w)).abs() < 1e-6
                );
            }
        }
    }
}
