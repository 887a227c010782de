//! Error types for problem formulation.

use thiserror::Error;

/// Errors raised while building or validating a problem description.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// Input vectors and the covariance matrix disagree on the asset count.
    #[error(
        "shape mismatch: {returns} returns, {budgets} asset budgets, \
         covariance is {rows}x{cols}"
    )]
    ShapeMismatch {
        /// Length of the expected-returns vector.
        returns: usize,
        /// Length of the per-asset budget vector.
        budgets: usize,
        /// Covariance row count.
        rows: usize,
        /// Covariance column count.
        cols: usize,
    },

    /// Covariance matrix is not symmetric within tolerance.
    #[error(
        "asymmetric covariance: |S[{row}][{col}] - S[{col}][{row}]| = {delta:e} \
         exceeds tolerance"
    )]
    AsymmetricCovariance {
        /// Row index of the offending entry.
        row: usize,
        /// Column index of the offending entry.
        col: usize,
        /// Magnitude of the asymmetry.
        delta: f64,
    },

    /// Covariance matrix rows have inconsistent lengths.
    #[error("ragged covariance: row {row} has {len} entries, expected {expected}")]
    RaggedCovariance {
        /// Offending row index.
        row: usize,
        /// Length of that row.
        len: usize,
        /// Expected length (the asset count).
        expected: usize,
    },

    /// A budget value is unusable.
    #[error("invalid budget: {0}")]
    InvalidBudget(String),

    /// A numeric input is not finite.
    #[error("non-finite input: {0}")]
    NonFinite(String),
}

/// Result type for formulation operations.
pub type ModelResult<T> = Result<T, ModelError>;
