//! Portfolio selection problem for QAOA.
//!
//! Mean-variance portfolio optimization over an integer domain: choose how
//! many units of each asset to hold, minimizing risk-adjusted cost
//! wᵀΣw − μᵀw subject to per-asset limits and a total budget
//! Σ wᵢ ≤ B.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::problems::program::{
    ConstraintSense, LinearConstraint, QuadraticObjective, QuadraticProgram, Sense, Variable,
};

/// Tolerance for the covariance symmetry check.
const SYMMETRY_TOL: f64 = 1e-9;

/// A validated portfolio selection problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioProblem {
    /// Expected return μᵢ per asset.
    pub expected_returns: Vec<f64>,
    /// Symmetric covariance matrix Σ.
    pub covariances: Vec<Vec<f64>>,
    /// Total budget B for Σ wᵢ ≤ B.
    pub total_budget: f64,
    /// Per-asset holding limits: wᵢ ∈ {0, …, bᵢ}.
    pub asset_budgets: Vec<u32>,
}

impl PortfolioProblem {
    /// Create a problem, rejecting malformed inputs.
    ///
    /// Fails fast on length disagreement, ragged or asymmetric covariance,
    /// non-finite entries, and a negative total budget.
    pub fn new(
        expected_returns: Vec<f64>,
        covariances: Vec<Vec<f64>>,
        total_budget: f64,
        asset_budgets: Vec<u32>,
    ) -> ModelResult<Self> {
        let n = expected_returns.len();
        if asset_budgets.len() != n || covariances.len() != n {
            return Err(ModelError::ShapeMismatch {
                returns: n,
                budgets: asset_budgets.len(),
                rows: covariances.len(),
                cols: covariances.first().map_or(0, Vec::len),
            });
        }
        for (i, row) in covariances.iter().enumerate() {
            if row.len() != n {
                return Err(ModelError::RaggedCovariance {
                    row: i,
                    len: row.len(),
                    expected: n,
                });
            }
        }
        for (i, mu) in expected_returns.iter().enumerate() {
            if !mu.is_finite() {
                return Err(ModelError::NonFinite(format!("expected return {i}")));
            }
        }
        for i in 0..n {
            for j in 0..n {
                let s = covariances[i][j];
                if !s.is_finite() {
                    return Err(ModelError::NonFinite(format!("covariance [{i}][{j}]")));
                }
                if j > i {
                    let delta = (s - covariances[j][i]).abs();
                    if delta > SYMMETRY_TOL {
                        return Err(ModelError::AsymmetricCovariance {
                            row: i,
                            col: j,
                            delta,
                        });
                    }
                }
            }
        }
        if !total_budget.is_finite() {
            return Err(ModelError::NonFinite("total budget".into()));
        }
        if total_budget < 0.0 {
            return Err(ModelError::InvalidBudget(format!(
                "total budget {total_budget} is negative"
            )));
        }

        Ok(Self {
            expected_returns,
            covariances,
            total_budget,
            asset_budgets,
        })
    }

    /// Create a problem, symmetrizing the covariance matrix as (Σ+Σᵀ)/2.
    ///
    /// Use this when the data source is known to carry numerical asymmetry;
    /// unlike silent acceptance, the averaging is explicit and keeps the
    /// risk term wᵀΣw unchanged.
    pub fn new_symmetrized(
        expected_returns: Vec<f64>,
        mut covariances: Vec<Vec<f64>>,
        total_budget: f64,
        asset_budgets: Vec<u32>,
    ) -> ModelResult<Self> {
        let n = covariances.len();
        if covariances.iter().all(|row| row.len() == n) {
            for i in 0..n {
                for j in (i + 1)..n {
                    let avg = (covariances[i][j] + covariances[j][i]) / 2.0;
                    covariances[i][j] = avg;
                    covariances[j][i] = avg;
                }
            }
        }
        Self::new(expected_returns, covariances, total_budget, asset_budgets)
    }

    /// Number of assets.
    pub fn num_assets(&self) -> usize {
        self.expected_returns.len()
    }

    /// Size of the feasible box {0..b₀} × … × {0..bₙ₋₁}, before the
    /// total-budget constraint.
    pub fn domain_size(&self) -> u128 {
        self.asset_budgets
            .iter()
            .map(|b| u128::from(b + 1))
            .product()
    }

    /// Risk-adjusted cost wᵀΣw − μᵀw by direct arithmetic.
    pub fn cost(&self, weights: &[i64]) -> f64 {
        let n = self.num_assets();
        debug_assert_eq!(weights.len(), n);
        let mut risk = 0.0;
        for i in 0..n {
            for j in 0..n {
                risk += weights[i] as f64 * self.covariances[i][j] * weights[j] as f64;
            }
        }
        let ret: f64 = self
            .expected_returns
            .iter()
            .zip(weights)
            .map(|(mu, w)| mu * *w as f64)
            .sum();
        risk - ret
    }

    /// Whether a candidate respects the per-asset bounds and total budget.
    pub fn is_feasible(&self, weights: &[i64]) -> bool {
        if weights.len() != self.num_assets() {
            return false;
        }
        let in_bounds = self
            .asset_budgets
            .iter()
            .zip(weights)
            .all(|(b, w)| (0..=i64::from(*b)).contains(w));
        in_bounds && weights.iter().sum::<i64>() as f64 <= self.total_budget + 1e-9
    }

    /// Build the mathematical-program description.
    ///
    /// Objective: minimize wᵀΣw − μᵀw. One constraint: Σ wᵢ ≤ B. Integer
    /// variables wᵢ ∈ [0, bᵢ]. Pure: identical inputs produce value-equal
    /// programs.
    pub fn formulate(&self) -> QuadraticProgram {
        let n = self.num_assets();
        let variables: Vec<Variable> = self
            .asset_budgets
            .iter()
            .enumerate()
            .map(|(i, b)| Variable::integer(format!("w_{i}"), i64::from(*b)))
            .collect();

        // Upper triangle of the risk term: off-diagonal entries appear twice
        // in wᵀΣw, so they carry a factor of two.
        let mut quadratic = Vec::with_capacity(n * (n + 1) / 2);
        for i in 0..n {
            for j in i..n {
                let q = if i == j {
                    self.covariances[i][i]
                } else {
                    2.0 * self.covariances[i][j]
                };
                if q != 0.0 {
                    quadratic.push((i, j, q));
                }
            }
        }

        QuadraticProgram {
            name: "portfolio".into(),
            variables,
            objective: QuadraticObjective {
                quadratic,
                linear: self.expected_returns.iter().map(|mu| -mu).collect(),
                constant: 0.0,
                sense: Sense::Minimize,
            },
            constraints: vec![LinearConstraint {
                name: "total_budget".into(),
                coefficients: vec![1.0; n],
                sense: ConstraintSense::Le,
                rhs: self.total_budget,
            }],
        }
    }

    /// Four-asset demo instance.
    ///
    /// μ = [3, 4, −1, 3], B = 8, per-asset limits [2, 3, 2, 1]; the box
    /// domain has 3·4·3·2 = 72 points before the budget constraint.
    pub fn demo_4() -> Self {
        Self::new(
            vec![3.0, 4.0, -1.0, 3.0],
            vec![
                vec![0.9, 0.5, -0.7, 0.3],
                vec![0.5, 0.9, -0.2, 0.1],
                vec![-0.7, -0.2, 0.9, 0.4],
                vec![0.3, 0.1, 0.4, 0.9],
            ],
            8.0,
            vec![2, 3, 2, 1],
        )
        .expect("demo_4 inputs are valid")
    }

    /// Two-asset instance small enough for fast end-to-end tests
    /// (3 qubits after lowering).
    pub fn two_asset() -> Self {
        Self::new(
            vec![1.0, 2.0],
            vec![vec![0.2, 0.1], vec![0.1, 0.4]],
            1.0,
            vec![1, 1],
        )
        .expect("two_asset inputs are valid")
    }
}

impl std::fmt::Display for PortfolioProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Portfolio ({} assets, total budget {}):",
            self.num_assets(),
            self.total_budget
        )?;
        for (i, (mu, b)) in self
            .expected_returns
            .iter()
            .zip(&self.asset_budgets)
            .enumerate()
        {
            writeln!(f, "  asset {i}: return {mu:.2}, limit {b}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_4_shape() {
        let p = PortfolioProblem::demo_4();
        assert_eq!(p.num_assets(), 4);
        assert_eq!(p.domain_size(), 72);
    }

    #[test]
    fn test_cost_direct_substitution() {
        let p = PortfolioProblem::demo_4();
        let w = [2, 3, 0, 1];
        // Recompute independently of the implementation.
        let mut expected = 0.0;
        for i in 0..4 {
            for j in 0..4 {
                expected += w[i] as f64 * p.covariances[i][j] * w[j] as f64;
            }
            expected -= p.expected_returns[i] * w[i] as f64;
        }
        assert!((p.cost(&w) - expected).abs() < 1e-12);
        // With this instance: wᵀΣw = 20.4, μᵀw = 21.
        assert!((p.cost(&w) - (-0.6)).abs() < 1e-9);
    }

    #[test]
    fn test_formulation_matches_cost() {
        let p = PortfolioProblem::demo_4();
        let program = p.formulate();
        for w in [[0, 0, 0, 0], [2, 3, 0, 1], [1, 1, 2, 0], [2, 3, 2, 1]] {
            assert!(
                (program.evaluate(&w) - p.cost(&w)).abs() < 1e-9,
                "program and direct arithmetic disagree at {w:?}"
            );
        }
    }

    #[test]
    fn test_feasibility_matches_program() {
        let p = PortfolioProblem::demo_4();
        let program = p.formulate();
        for w in program.box_points() {
            assert_eq!(p.is_feasible(&w), program.is_feasible(&w), "at {w:?}");
        }
        // Budget violation: sums to 8 with a bound hit, fine; 2+3+2+1 = 8 <= 8.
        assert!(p.is_feasible(&[2, 3, 2, 1]));
        // Out of per-asset bounds.
        assert!(!p.is_feasible(&[3, 0, 0, 0]));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let err = PortfolioProblem::new(
            vec![1.0, 2.0, 3.0, 4.0],
            vec![vec![1.0; 4]; 4],
            5.0,
            vec![1, 1, 1],
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_asymmetric_covariance_rejected() {
        let err = PortfolioProblem::new(
            vec![1.0, 2.0],
            vec![vec![1.0, 0.5], vec![0.4, 1.0]],
            2.0,
            vec![1, 1],
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::AsymmetricCovariance { .. }));
    }

    #[test]
    fn test_symmetrized_constructor() {
        let p = PortfolioProblem::new_symmetrized(
            vec![1.0, 2.0],
            vec![vec![1.0, 0.5], vec![0.4, 1.0]],
            2.0,
            vec![1, 1],
        )
        .unwrap();
        assert!((p.covariances[0][1] - 0.45).abs() < 1e-12);
        assert_eq!(p.covariances[0][1], p.covariances[1][0]);
    }

    #[test]
    fn test_negative_budget_rejected() {
        let err =
            PortfolioProblem::new(vec![1.0], vec![vec![1.0]], -1.0, vec![1]).unwrap_err();
        assert!(matches!(err, ModelError::InvalidBudget(_)));
    }

    #[test]
    fn test_formulate_idempotent() {
        let p = PortfolioProblem::demo_4();
        assert_eq!(p.formulate(), p.formulate());
    }
}
