//! Error taxonomy for matrix construction and mode solving.

use thiserror::Error;

/// Everything that can go wrong while building or solving a chain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChainError {
    /// Fewer than two masses were requested.
    #[error("a chain needs at least 2 masses, got {0}")]
    InvalidSize(usize),

    /// An input sequence has the wrong length for this system.
    #[error("{what} must have {expected} elements, got {actual}")]
    InvalidDimension {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The topology tag is not one of the recognised values.
    #[error("unknown topology {0:?}; expected \"linear\" or \"circular\"")]
    InvalidTopology(String),

    /// A mass is not strictly positive, or a value is not finite.
    #[error("{what}[{index}] = {value} is not a valid physical parameter")]
    InvalidParameter {
        what: &'static str,
        index: usize,
        value: f64,
    },

    /// The symmetric fast path was handed a non-symmetric matrix.
    #[error("matrix is not symmetric at ({row}, {col})")]
    NotSymmetric { row: usize, col: usize },

    /// The eigen-decomposition did not converge or produced non-finite output.
    #[error("eigen-decomposition failed: {0}")]
    NumericalFailure(String),
}

pub type Result<T> = std::result::Result<T, ChainError>;
