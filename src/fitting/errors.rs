//! Errors for the fitting layer.
//!
//! [`FitError`] wraps circuit and optimizer failures and adds the checks
//! that only make sense once a sweep is assembled (seed tables, option
//! ranges, table axes).
use crate::{circuit::errors::CircuitError, optimization::errors::OptError};
use thiserror::Error;

pub type FitResult<T> = Result<T, FitError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error(transparent)]
    Circuit(#[from] CircuitError),

    #[error(transparent)]
    Optimization(#[from] OptError),

    // ---- Options ----
    #[error("Continuity weight must be finite and >= 0; got: {value}")]
    InvalidContinuityWeight { value: f64 },

    #[error("Fidelity scale must be finite and > 0; got: {value}")]
    InvalidFidelityScale { value: f64 },

    #[error("Barrier penalty {name} is invalid ({value}): {reason}")]
    InvalidPenalty { name: &'static str, value: f64, reason: &'static str },

    #[error("Progress interval must be > 0.")]
    InvalidProgressInterval,

    #[error("Initial guess must be finite; coefficient {index} is {value}")]
    InvalidInitialGuess { index: usize, value: f64 },

    // ---- Seeds and data ----
    #[error("Seed table has {actual} filters but the sweep has {expected} points.")]
    SeedLengthMismatch { expected: usize, actual: usize },

    #[error("Target has {actual} bins but the grid has {expected}.")]
    TargetLengthMismatch { expected: usize, actual: usize },

    #[error("Target response is non-finite at bin {index}.")]
    NonFiniteTarget { index: usize },

    // ---- Table ----
    #[error("Coefficient table is empty.")]
    EmptyTable,

    #[error("Table has {controls} control values but {filters} filters.")]
    TableLengthMismatch { controls: usize, filters: usize },

    #[error("Table control axis must be strictly increasing; violated at index {index}.")]
    NonMonotonicAxis { index: usize },

    #[error("Table serialization failed: {text}")]
    Serialization { text: String },
}

impl From<serde_json::Error> for FitError {
    fn from(err: serde_json::Error) -> Self {
        FitError::Serialization { text: err.to_string() }
    }
}
