//! Type aliases, constants, and core enums for the chain-modes library.

use std::fmt;
use std::str::FromStr;

use nalgebra::{DMatrix, DVector};
use num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::error::ChainError;

// Type aliases for the eigen-result containers
pub type C64 = Complex<f64>;
pub type ComplexVector = DVector<C64>;
pub type ComplexMatrix = DMatrix<C64>;

/// Smallest chain the system accepts.
pub const MIN_MASSES: usize = 2;

/// Eigenvalues with magnitude below this are treated as zero (rigid-body modes).
pub const LAMBDA_TOL: f64 = 1e-9;

/// Default tolerance on the imaginary part when deciding whether an eigenvalue is real.
pub const DEFAULT_IMAGINARY_TOL: f64 = 1e-9;

/// Relative tolerance for the symmetry check in the symmetric fast path.
pub const SYMMETRY_TOL: f64 = 1e-12;

/// Coupling topology of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    /// Open chain: no coupling between the first and last mass.
    Linear,
    /// Closed ring: the last mass couples back to the first.
    Circular,
}

impl Topology {
    /// Canonical lowercase tag, as accepted by `from_str`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Topology::Linear => "linear",
            Topology::Circular => "circular",
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topology {
    type Err = ChainError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "linear" | "open" => Ok(Topology::Linear),
            "circular" | "ring" | "closed" => Ok(Topology::Circular),
            _ => Err(ChainError::InvalidTopology(tag.to_string())),
        }
    }
}

/// Physical interpretation of a single normal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeKind {
    /// λ ≈ 0: the chain translates without deforming any spring.
    RigidBody,
    /// λ > 0: a genuine oscillation at ω = √λ.
    Oscillatory,
    /// λ < 0: exponentially growing motion (negative stiffness somewhere).
    Unstable,
    /// λ has a non-negligible imaginary part.
    Complex,
}

/// Solver tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Convergence threshold for the Schur and symmetric QR iterations.
    pub schur_eps: f64,
    /// Iteration cap for the QR iterations; 0 means unlimited.
    pub max_iterations: usize,
    /// Imaginary parts at or below this are considered zero.
    pub imaginary_tol: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            schur_eps: f64::EPSILON,
            max_iterations: 0,
            imaginary_tol: DEFAULT_IMAGINARY_TOL,
        }
    }
}

impl SolverConfig {
    /// Override the QR convergence threshold.
    pub fn with_schur_eps(mut self, eps: f64) -> Self {
        self.schur_eps = eps;
        self
    }

    /// Cap the QR iterations; a capped solve that runs out fails with `NumericalFailure`.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Override the tolerance below which imaginary parts count as zero.
    pub fn with_imaginary_tol(mut self, tol: f64) -> Self {
        self.imaginary_tol = tol;
        self
    }
}
