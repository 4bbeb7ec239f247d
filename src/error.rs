//! Error types for the bucking core
//!
//! Configuration problems are rejected when the optimizer is built. Degenerate
//! stems are not errors: they produce a zero-value result instead.

use thiserror::Error;

/// Failure raised by a taper model
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TaperError {
    #[error("height {height:.2} m is outside the stem (0..={max:.2} m)")]
    HeightOutOfRange { height: f64, max: f64 },

    #[error("invalid diameter: {0} cm")]
    InvalidDiameter(f64),
}

/// Failure raised by the bucking optimizer or its inputs
#[derive(Debug, Error)]
pub enum BuckingError {
    #[error("no timber prices for species '{species}'")]
    MissingPrices { species: String },

    #[error("minimum log length must be at least 1 m (got {length_dm} dm)")]
    MinLogLengthTooShort { length_dm: usize },

    #[error("invalid tree: {0}")]
    InvalidTree(String),

    #[error("species '{0}' has neither timber nor pulpwood prices")]
    UnknownSpecies(String),

    #[error("price list fingerprint mismatch (cube built with {expected}, got {found})")]
    PricelistMismatch { expected: String, found: String },

    #[error(transparent)]
    Taper(#[from] TaperError),
}

pub type Result<T, E = BuckingError> = std::result::Result<T, E>;
