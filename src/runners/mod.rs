//! End-to-end runners tying formulation, solving, and reporting together.

pub mod portfolio;

pub use portfolio::{PortfolioReport, PortfolioRunner};
