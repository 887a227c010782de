//! Integration tests for the portfolio optimization pipeline.
//!
//! These exercise the formulator, the lowering, and both sides of the
//! service boundary end to end on the local simulator.

use qfolio::problems::{PortfolioProblem, VarKind, encode_program};
use qfolio::runners::PortfolioRunner;
use qfolio::solver::{
    ClassicalConfig, LocalSimulatorService, OptimizationService, QuantumConfig, Session,
    SolverError,
};

fn local_service() -> LocalSimulatorService {
    LocalSimulatorService::new(Session::local())
}

/// The four-asset scenario: 3·4·3·2 = 72 box points and the documented
/// cost at w = [2, 3, 0, 1].
#[test]
fn test_demo_scenario_numbers() {
    let problem = PortfolioProblem::demo_4();
    assert_eq!(problem.domain_size(), 72);

    let program = problem.formulate();
    assert_eq!(program.domain_size(), 72);
    let w = [2, 3, 0, 1];
    assert!((program.evaluate(&w) - problem.cost(&w)).abs() < 1e-9);
    assert!((problem.cost(&w) - (-0.6)).abs() < 1e-9);
}

/// Feasibility of the returned description matches the raw definition:
/// in-bounds weights whose sum respects the total budget.
#[test]
fn test_feasible_set() {
    let problem = PortfolioProblem::demo_4();
    let program = problem.formulate();
    let feasible = program.box_points().filter(|w| program.is_feasible(w));
    for w in feasible {
        assert!(w.iter().zip(&problem.asset_budgets).all(|(wi, b)| {
            (0..=i64::from(*b)).contains(wi)
        }));
        assert!(w.iter().sum::<i64>() <= 8);
    }
}

/// Formulation is idempotent: identical inputs give value-equal programs.
#[test]
fn test_formulate_idempotent() {
    let a = PortfolioProblem::demo_4().formulate();
    let b = PortfolioProblem::demo_4().formulate();
    assert_eq!(a, b);
    let json_a = serde_json::to_string(&a).unwrap();
    let json_b = serde_json::to_string(&b).unwrap();
    assert_eq!(json_a, json_b);
}

/// `generate` produces a circuit over the lowered register.
#[tokio::test]
async fn test_generate_artifact() {
    let service = local_service();
    let program = PortfolioProblem::demo_4().formulate();
    let artifact = service
        .generate(&program, &QuantumConfig::new(2))
        .await
        .unwrap();

    // 2+2+2+1 asset bits plus 4 slack bits for the budget of 8.
    assert_eq!(artifact.num_qubits, 11);
    assert_eq!(artifact.circuit.num_qubits(), 11);
    assert_eq!(artifact.initial_gamma.len(), 2);
    assert_eq!(artifact.initial_beta.len(), 2);
    assert!(artifact.circuit.num_gates() > 11);
}

/// Mixed variable kinds are rejected before any lowering work.
#[tokio::test]
async fn test_generate_rejects_mixed_kinds() {
    let service = local_service();
    let mut program = PortfolioProblem::demo_4().formulate();
    program.variables[2].kind = VarKind::Continuous;

    let err = service
        .generate(&program, &QuantumConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SolverError::MixedVariableKinds(_)));
}

/// Invalid configuration bundles fail fast.
#[tokio::test]
async fn test_invalid_configs_rejected() {
    let service = local_service();
    let program = PortfolioProblem::two_asset().formulate();

    let err = service
        .generate(&program, &QuantumConfig::new(0))
        .await
        .unwrap_err();
    assert!(matches!(err, SolverError::InvalidConfiguration(_)));

    let err = service
        .solve(
            &program,
            &QuantumConfig::default(),
            &ClassicalConfig::default().with_cvar_alpha(2.0),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SolverError::InvalidConfiguration(_)));
}

/// The classical reference solver agrees with exhaustive recomputation.
#[tokio::test]
async fn test_classical_reference_demo_4() {
    let service = local_service();
    let problem = PortfolioProblem::demo_4();
    let program = problem.formulate();

    let solution = service.solve_classically(&program).await.unwrap();

    let mut best = f64::INFINITY;
    for w in program.box_points() {
        if problem.is_feasible(&w) {
            best = best.min(problem.cost(&w));
        }
    }
    assert!((solution.objective - best).abs() < 1e-9);
    assert!(problem.is_feasible(&solution.weights));
}

/// End-to-end on the tiny instance: QAOA finds the exact optimum.
#[tokio::test]
async fn test_two_asset_end_to_end() {
    let service = local_service();
    let runner = PortfolioRunner::new(PortfolioProblem::two_asset())
        .with_quantum(QuantumConfig::new(2).with_restarts(2))
        .with_classical(
            ClassicalConfig::default()
                .with_maxiter(60)
                .with_cvar_alpha(0.5),
        );

    let report = runner.run(&service).await.unwrap();

    assert_eq!(report.reference.weights, vec![0, 1]);
    let best = report.distribution.best.as_ref().expect("feasible sample");
    assert!(
        best.objective <= report.reference.objective + 0.5,
        "best sampled {} too far from optimum {}",
        best.objective,
        report.reference.objective
    );
    // Probabilities form a distribution.
    let mass: f64 = report
        .distribution
        .candidates
        .iter()
        .map(|c| c.probability)
        .sum();
    assert!((mass - 1.0).abs() < 1e-9);
}

/// Same seed and configuration reproduce the same distribution.
#[tokio::test]
async fn test_solve_reproducible() {
    let service = local_service();
    let program = PortfolioProblem::two_asset().formulate();
    let quantum = QuantumConfig::default();
    let classical = ClassicalConfig::default().with_maxiter(20).with_seed(9);

    let a = service.solve(&program, &quantum, &classical).await.unwrap();
    let b = service.solve(&program, &quantum, &classical).await.unwrap();

    assert_eq!(a.candidates, b.candidates);
    assert_eq!(a.optimal_gamma, b.optimal_gamma);
}

/// The QUBO lowering preserves objective values on feasible points, so the
/// quantum side optimizes the same function the formulator describes.
#[test]
fn test_lowering_preserves_objective() {
    let problem = PortfolioProblem::demo_4();
    let program = problem.formulate();
    let (encoding, qubo) = encode_program(&program, None).unwrap();

    for w in [[0, 0, 0, 0], [2, 3, 0, 1], [1, 0, 2, 1]] {
        let slack = 8 - w.iter().sum::<i64>();
        let bits = encoding.encode(&w, &[slack]);
        assert!((qubo.evaluate(&bits) - problem.cost(&w)).abs() < 1e-6);
    }
}

/// Oversized programs are refused rather than attempted.
#[tokio::test]
async fn test_problem_too_large() {
    let service = local_service();
    let n = 12;
    let mut cov = vec![vec![0.0; n]; n];
    for (i, row) in cov.iter_mut().enumerate() {
        row[i] = 1.0;
    }
    // 12 assets with limits of 3 need 24 qubits plus slack.
    let problem = PortfolioProblem::new(vec![1.0; n], cov, 24.0, vec![3u32; n]).unwrap();
    let err = service
        .solve(
            &problem.formulate(),
            &QuantumConfig::default(),
            &ClassicalConfig::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, SolverError::ProblemTooLarge(_)));
}
