//! The `System` entity: a chain of `n` masses owning one dynamical matrix.
//!
//! The matrix starts as zeros and is fully overwritten by every build call. Each
//! query re-runs the eigen-decomposition of the current matrix; nothing is cached.
//! A failed build leaves the previous matrix untouched.

use nalgebra::DMatrix;

use crate::assembly;
use crate::error::Result;
use crate::modes::{self, NormalMode};
use crate::solver::{ModeSolver, ModeSpectrum};
use crate::types::{ComplexMatrix, ComplexVector, SolverConfig, Topology};

#[derive(Debug, Clone, PartialEq)]
pub struct System {
    n: usize,
    matrix: DMatrix<f64>,
    built: bool,
    solver: ModeSolver,
}

impl System {
    /// A chain of `n` masses with the default solver configuration.
    pub fn new(n: usize) -> Result<Self> {
        Self::with_config(n, SolverConfig::default())
    }

    /// A chain of `n` masses solved with `config`.
    pub fn with_config(n: usize, config: SolverConfig) -> Result<Self> {
        assembly::check_size(n)?;
        Ok(Self {
            n,
            matrix: DMatrix::zeros(n, n),
            built: false,
            solver: ModeSolver::new(config),
        })
    }

    /// Number of masses in the chain.
    pub fn size(&self) -> usize {
        self.n
    }

    /// The current dynamical matrix (zeros until the first build).
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Solver configuration used by every query.
    pub fn config(&self) -> &SolverConfig {
        self.solver.config()
    }

    fn store(&mut self, matrix: DMatrix<f64>, label: &str) -> &DMatrix<f64> {
        ftlog::debug!("built {} dynamical matrix for {} masses", label, self.n);
        self.matrix = matrix;
        self.built = true;
        &self.matrix
    }

    /// Rebuild the matrix for `topology` from `n` masses and `n - 1` springs.
    pub fn build_matrix(
        &mut self,
        masses: &[f64],
        springs: &[f64],
        topology: Topology,
    ) -> Result<&DMatrix<f64>> {
        let matrix = assembly::build_matrix(self.n, masses, springs, topology)?;
        Ok(self.store(matrix, topology.as_str()))
    }

    /// Same as [`System::build_matrix`] with a textual topology tag.
    pub fn build_matrix_tagged(
        &mut self,
        masses: &[f64],
        springs: &[f64],
        tag: &str,
    ) -> Result<&DMatrix<f64>> {
        let topology: Topology = tag.parse()?;
        self.build_matrix(masses, springs, topology)
    }

    pub fn build_linear(&mut self, masses: &[f64], springs: &[f64]) -> Result<&DMatrix<f64>> {
        self.build_matrix(masses, springs, Topology::Linear)
    }

    /// Closed ring; the closing spring reuses `springs[n - 2]`.
    pub fn build_circular(&mut self, masses: &[f64], springs: &[f64]) -> Result<&DMatrix<f64>> {
        self.build_matrix(masses, springs, Topology::Circular)
    }

    /// Closed ring with all `n` spring constants given explicitly.
    pub fn build_closed_ring(&mut self, masses: &[f64], springs: &[f64]) -> Result<&DMatrix<f64>> {
        let matrix = assembly::build_closed_ring(self.n, masses, springs)?;
        Ok(self.store(matrix, "closed ring"))
    }

    /// Mass-weighted symmetric matrix; solve it with [`System::symmetric_spectrum`].
    pub fn build_symmetrized(
        &mut self,
        masses: &[f64],
        springs: &[f64],
        topology: Topology,
    ) -> Result<&DMatrix<f64>> {
        let matrix = assembly::build_symmetrized(self.n, masses, springs, topology)?;
        Ok(self.store(matrix, "symmetrized"))
    }

    /// Fresh, ordered eigen-decomposition of the current matrix.
    pub fn spectrum(&self) -> Result<ModeSpectrum> {
        self.solver.solve(&self.matrix)
    }

    /// Symmetric-path decomposition; fails with `NotSymmetric` on a per-row matrix
    /// built from unequal masses.
    pub fn symmetric_spectrum(&self) -> Result<ModeSpectrum> {
        self.solver.solve_symmetric(&self.matrix)
    }

    /// λ = ω², ascending.
    pub fn eigenvalues(&self) -> Result<ComplexVector> {
        Ok(self.spectrum()?.eigenvalues)
    }

    /// Column `k` pairs with `eigenvalues()[k]`.
    pub fn eigenvectors(&self) -> Result<ComplexMatrix> {
        Ok(self.spectrum()?.eigenvectors)
    }

    /// Alias of [`System::eigenvalues`].
    pub fn angular_frequencies_squared(&self) -> Result<ComplexVector> {
        self.eigenvalues()
    }

    /// ω = √λ, or `None` when some mode is unstable or complex.
    pub fn angular_frequencies(&self) -> Result<Option<Vec<f64>>> {
        let spectrum = self.spectrum()?;
        Ok(modes::angular_frequencies(
            &spectrum,
            self.config().imaginary_tol,
        ))
    }

    pub fn normal_modes(&self) -> Result<Vec<NormalMode>> {
        let spectrum = self.spectrum()?;
        Ok(modes::normal_modes(&spectrum, self.config().imaginary_tol))
    }
}
