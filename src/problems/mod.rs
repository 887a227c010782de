//! Problem definitions and lowering for the quantum optimizer.

pub mod encoding;
pub mod portfolio;
pub mod program;

pub use encoding::{BinaryEncoding, EncodingError, IsingModel, Qubo, encode_program};
pub use portfolio::PortfolioProblem;
pub use program::{
    ConstraintSense, LinearConstraint, QuadraticObjective, QuadraticProgram, Sense, VarKind,
    Variable,
};
