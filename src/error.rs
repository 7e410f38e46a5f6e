//! Error types for the narx-aif crate

use thiserror::Error;

/// Main error type for the narx-aif crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("dimension mismatch: expected {expected} entries, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("parameter precision matrix is singular; cannot {operation}")]
    SingularPrecision { operation: &'static str },

    #[error(
        "predictive variance undefined: noise shape {shape} must exceed 1 \
         (degrees of freedom must exceed 2)"
    )]
    UndefinedVariance { shape: f64 },

    #[error("goal sequence has {goals} entries but the horizon requires {horizon}")]
    GoalHorizonMismatch { horizon: usize, goals: usize },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;
