//! Normal modes of coupled spring-mass chains.
//!
//! A chain of `n` point masses is joined by springs, either as an open (linear)
//! chain or a closed (circular) ring. The crate assembles the dynamical matrix
//! `D = M^-1 K` and decomposes it into squared angular frequencies `λ = ω²` and
//! mode shapes.
//!
//! ```
//! use chain_modes::{System, Topology};
//!
//! let mut system = System::new(3).unwrap();
//! system
//!     .build_matrix(&[1.0, 1.0, 1.0], &[1.0, 1.0], Topology::Circular)
//!     .unwrap();
//!
//! let lambdas = system.eigenvalues().unwrap();
//! assert!(lambdas[0].norm() < 1e-9);
//! assert!((lambdas[2].re - 3.0).abs() < 1e-9);
//! ```
//!
//! ## Modules
//! - [`assembly`]: dynamical matrix construction (per-row and mass-weighted)
//! - [`solver`]: ordered eigen-decomposition on top of faer and nalgebra
//! - [`modes`]: frequencies and mode classification
//! - [`system`]: the stateful `System` wrapper

pub mod assembly;
pub mod error;
pub mod modes;
pub mod solver;
pub mod system;
pub mod types;

pub use assembly::{
    build_circular, build_closed_ring, build_linear, build_matrix, build_matrix_tagged,
    build_symmetrized, ring_stiffness_matrix, stiffness_matrix, validate_inputs,
};
pub use error::{ChainError, Result};
pub use modes::{
    angular_frequencies, classify_all_modes, classify_mode, frequencies_hz, normal_modes,
    oscillatory_frequencies_hz, NormalMode,
};
pub use solver::{eig, eig_symmetric, residual, to_complex, ModeSolver, ModeSpectrum};
pub use system::System;
pub use types::{
    ComplexMatrix, ComplexVector, ModeKind, SolverConfig, Topology, C64,
    DEFAULT_IMAGINARY_TOL, LAMBDA_TOL, MIN_MASSES,
};
