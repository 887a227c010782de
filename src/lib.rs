//! QAOA portfolio optimization.
//!
//! This crate formulates mean-variance portfolio selection as an integer
//! quadratic program and solves it through a quantum-classical service
//! boundary:
//!
//! - [`problems`]: validated problem formulation and QUBO/Ising lowering
//! - [`circuits`]: QAOA ansatz construction and statevector simulation
//! - [`optimizers`]: derivative-free classical parameter search
//! - [`solver`]: the external-collaborator contract plus a local
//!   simulator-backed implementation
//! - [`runners`]: end-to-end orchestration and reporting
//!
//! # Example
//!
//! ```no_run
//! use qfolio::problems::PortfolioProblem;
//! use qfolio::runners::PortfolioRunner;
//! use qfolio::solver::{LocalSimulatorService, Session};
//!
//! # async fn demo() -> Result<(), qfolio::solver::SolverError> {
//! let service = LocalSimulatorService::new(Session::local());
//! let runner = PortfolioRunner::new(PortfolioProblem::demo_4());
//! let report = runner.run(&service).await?;
//! println!("best sampled: {:?}", report.distribution.best);
//! # Ok(())
//! # }
//! ```

pub mod circuits;
pub mod error;
pub mod optimizers;
pub mod problems;
pub mod runners;
pub mod solver;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Create a progress bar for demo operations.
pub fn create_progress_bar(len: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )
        .unwrap()
        .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}

/// Print a demo header.
pub fn print_header(title: &str) {
    println!();
    println!("{}", style("═".repeat(60)).cyan());
    println!("{}", style(format!("  {title}")).cyan().bold());
    println!("{}", style("═".repeat(60)).cyan());
    println!();
}

/// Print a demo section.
pub fn print_section(title: &str) {
    println!();
    println!("{}", style(format!("▶ {title}")).green().bold());
    println!("{}", style("─".repeat(40)).dim());
}

/// Print a result line.
pub fn print_result(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}", style(format!("{label}:")).dim(), value);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("ℹ").blue(), message);
}
