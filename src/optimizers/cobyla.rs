//! COBYLA-style simplex optimizer and SPSA.
//!
//! Derivative-free methods suited to variational quantum loops, where each
//! objective evaluation is a full circuit simulation and gradients are not
//! available.

use super::Optimizer;

/// Result of an optimization run.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Optimal parameter values.
    pub optimal_params: Vec<f64>,
    /// Optimal objective value.
    pub optimal_value: f64,
    /// Number of objective evaluations.
    pub num_evaluations: usize,
    /// Number of accepted improvements.
    pub num_iterations: usize,
    /// History of best objective values.
    pub history: Vec<f64>,
    /// Whether the run converged before hitting the iteration cap.
    pub converged: bool,
}

/// COBYLA-style optimizer: simplex search with a contracting trust region.
#[derive(Debug, Clone)]
pub struct Cobyla {
    /// Maximum number of iterations.
    pub maxiter: usize,
    /// Convergence tolerance on the simplex spread.
    pub tol: f64,
    /// Initial trust region radius.
    pub rho_start: f64,
    /// Final trust region radius.
    pub rho_end: f64,
}

impl Default for Cobyla {
    fn default() -> Self {
        Self {
            maxiter: 100,
            tol: 1e-6,
            rho_start: 0.5,
            rho_end: 1e-4,
        }
    }
}

impl Cobyla {
    /// Create an optimizer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum iterations.
    pub fn with_maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = maxiter;
        self
    }

    /// Set convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }
}

impl Optimizer for Cobyla {
    fn minimize<F>(&self, mut objective: F, initial_params: Vec<f64>) -> OptimizationResult
    where
        F: FnMut(&[f64]) -> f64,
    {
        let n = initial_params.len();
        let f_start = objective(&initial_params);
        let mut num_evaluations = 1;
        let mut best_value = f_start;
        let mut history = vec![f_start];

        // Vertices of the working simplex and their values.
        let mut simplex: Vec<Vec<f64>> = vec![initial_params.clone()];
        let mut values: Vec<f64> = vec![f_start];
        for i in 0..n {
            let mut vertex = initial_params.clone();
            vertex[i] += self.rho_start;
            values.push(objective(&vertex));
            num_evaluations += 1;
            simplex.push(vertex);
        }

        let mut rho = self.rho_start;
        let mut converged = false;

        for _ in 0..self.maxiter {
            let mut order: Vec<usize> = (0..=n).collect();
            order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap());
            let best = order[0];
            let worst = order[n];

            let spread = values[worst] - values[best];
            if spread < self.tol {
                if rho <= self.rho_end {
                    converged = true;
                    break;
                }
                // Shrink the trust region and rebuild around the best vertex.
                rho = (rho * 0.5).max(self.rho_end);
                let anchor = simplex[best].clone();
                let anchor_value = values[best];
                simplex = vec![anchor.clone()];
                values = vec![anchor_value];
                for i in 0..n {
                    let mut vertex = anchor.clone();
                    vertex[i] += rho;
                    values.push(objective(&vertex));
                    num_evaluations += 1;
                    simplex.push(vertex);
                }
                continue;
            }

            // Centroid of all vertices but the worst.
            let mut centroid = vec![0.0; n];
            for &idx in &order[..n] {
                for (c, x) in centroid.iter_mut().zip(&simplex[idx]) {
                    *c += x;
                }
            }
            for c in &mut centroid {
                *c /= n as f64;
            }

            // Reflect the worst vertex, capping the step at the trust radius.
            let mut reflected: Vec<f64> = centroid
                .iter()
                .zip(&simplex[worst])
                .map(|(c, w)| 2.0 * c - w)
                .collect();
            for (r, c) in reflected.iter_mut().zip(&centroid) {
                let step = *r - c;
                if step.abs() > rho {
                    *r = c + rho * step.signum();
                }
            }
            let f_reflected = objective(&reflected);
            num_evaluations += 1;

            if f_reflected < values[best] {
                // Try expanding past the reflection.
                let expanded: Vec<f64> = centroid
                    .iter()
                    .zip(&reflected)
                    .map(|(c, r)| c + 2.0 * (r - c))
                    .collect();
                let f_expanded = objective(&expanded);
                num_evaluations += 1;
                if f_expanded < f_reflected {
                    simplex[worst] = expanded;
                    values[worst] = f_expanded;
                } else {
                    simplex[worst] = reflected;
                    values[worst] = f_reflected;
                }
            } else if f_reflected < values[order[n - 1]] {
                simplex[worst] = reflected;
                values[worst] = f_reflected;
            } else {
                // Contract toward the centroid; shrink everything if even
                // that fails.
                let contracted: Vec<f64> = centroid
                    .iter()
                    .zip(&simplex[worst])
                    .map(|(c, w)| 0.5 * (c + w))
                    .collect();
                let f_contracted = objective(&contracted);
                num_evaluations += 1;
                if f_contracted < values[worst] {
                    simplex[worst] = contracted;
                    values[worst] = f_contracted;
                } else {
                    let anchor = simplex[best].clone();
                    for (i, vertex) in simplex.iter_mut().enumerate() {
                        if i == best {
                            continue;
                        }
                        for (x, a) in vertex.iter_mut().zip(&anchor) {
                            *x = 0.5 * (a + *x);
                        }
                        values[i] = objective(vertex);
                        num_evaluations += 1;
                    }
                }
            }

            let round_best = values.iter().cloned().fold(f64::INFINITY, f64::min);
            if round_best < best_value {
                best_value = round_best;
                history.push(best_value);
            }
        }

        let (min_idx, _) = values
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
            .expect("simplex is non-empty");

        OptimizationResult {
            optimal_params: simplex[min_idx].clone(),
            optimal_value: values[min_idx],
            num_evaluations,
            num_iterations: history.len(),
            history,
            converged,
        }
    }
}

/// SPSA: gradient-free stochastic approximation with two-sided perturbations.
#[derive(Debug, Clone)]
pub struct Spsa {
    /// Maximum number of iterations.
    pub maxiter: usize,
    /// Initial step size.
    pub a: f64,
    /// Perturbation size.
    pub c: f64,
    /// Perturbation decay exponent.
    pub gamma: f64,
    /// RNG seed for the perturbation directions.
    pub seed: u64,
}

impl Default for Spsa {
    fn default() -> Self {
        Self {
            maxiter: 100,
            a: 0.1,
            c: 0.1,
            gamma: 0.101,
            seed: 42,
        }
    }
}

impl Spsa {
    /// Create an optimizer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum iterations.
    pub fn with_maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = maxiter;
        self
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

impl Optimizer for Spsa {
    fn minimize<F>(&self, mut objective: F, initial_params: Vec<f64>) -> OptimizationResult
    where
        F: FnMut(&[f64]) -> f64,
    {
        let n = initial_params.len();
        let mut x = initial_params;
        let mut f_x = objective(&x);
        let mut history = vec![f_x];
        let mut num_evaluations = 1;

        // LCG Rademacher draws; seeded so runs are reproducible.
        let mut state = self.seed;
        let mut flip = || -> f64 {
            state = state.wrapping_mul(1103515245).wrapping_add(12345);
            if (state >> 16) & 1 == 1 { 1.0 } else { -1.0 }
        };

        for k in 0..self.maxiter {
            let a_k = self.a / (k + 1) as f64;
            let c_k = self.c / ((k + 1) as f64).powf(self.gamma);

            let delta: Vec<f64> = (0..n).map(|_| flip()).collect();
            let x_plus: Vec<f64> = x.iter().zip(&delta).map(|(xi, d)| xi + c_k * d).collect();
            let x_minus: Vec<f64> = x.iter().zip(&delta).map(|(xi, d)| xi - c_k * d).collect();
            let f_plus = objective(&x_plus);
            let f_minus = objective(&x_minus);
            num_evaluations += 2;

            for (xi, d) in x.iter_mut().zip(&delta) {
                *xi -= a_k * (f_plus - f_minus) / (2.0 * c_k * d);
            }
            f_x = objective(&x);
            num_evaluations += 1;
            history.push(f_x);
        }

        OptimizationResult {
            optimal_params: x,
            optimal_value: f_x,
            num_evaluations,
            num_iterations: self.maxiter,
            history,
            converged: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cobyla_quadratic_bowl() {
        let result = Cobyla::new().with_maxiter(200).minimize(
            |p| (p[0] - 1.0).powi(2) + (p[1] - 2.0).powi(2),
            vec![0.0, 0.0],
        );
        assert!(result.optimal_value < 0.01);
        assert!((result.optimal_params[0] - 1.0).abs() < 0.1);
        assert!((result.optimal_params[1] - 2.0).abs() < 0.1);
    }

    #[test]
    fn test_cobyla_rosenbrock_improves() {
        let result = Cobyla::new().with_maxiter(500).minimize(
            |p| (1.0 - p[0]).powi(2) + 100.0 * (p[1] - p[0].powi(2)).powi(2),
            vec![0.0, 0.0],
        );
        // Rosenbrock is hard; just require substantial progress.
        assert!(result.optimal_value < 1.0);
    }

    #[test]
    fn test_cobyla_history_monotone() {
        let result = Cobyla::new()
            .with_maxiter(100)
            .minimize(|p| p[0].powi(2), vec![3.0]);
        for pair in result.history.windows(2) {
            assert!(pair[1] <= pair[0]);
        }
    }

    #[test]
    fn test_spsa_quadratic() {
        let result = Spsa::new()
            .with_maxiter(100)
            .minimize(|p| p[0].powi(2) + p[1].powi(2), vec![1.0, 1.0]);
        assert!(result.optimal_value < 0.5);
    }

    #[test]
    fn test_spsa_seeded_reproducible() {
        let run = || {
            Spsa::new()
                .with_maxiter(50)
                .with_seed(7)
                .minimize(|p| (p[0] - 2.0).powi(2), vec![0.0])
        };
        assert_eq!(run().optimal_params, run().optimal_params);
    }
}
