//! Eigenvalue solvers for chain normal-mode analysis.
//!
//! The per-row dynamical matrix is generally non-symmetric, so the default path
//! is faer's dense general eigendecomposition, which returns complex eigenvalues
//! and eigenvectors. On top of it:
//!
//! 1. Each eigenvector is normalised and phase-fixed.
//! 2. Eigenpairs are sorted ascending and the SAME permutation is applied to the
//!    eigenvector columns, so `eigenvalues[k]` always pairs with column `k`.
//!
//! A finite `max_iterations` budget is enforced by a nalgebra real `Schur` pass
//! before faer runs. A symmetric fast path backed by `SymmetricEigen` handles the
//! mass-weighted matrix.

use faer::complex_native::c64;
use faer::Mat;
use nalgebra::linalg::{Schur, SymmetricEigen};
use nalgebra::DMatrix;

use crate::error::{ChainError, Result};
use crate::types::{ComplexMatrix, ComplexVector, SolverConfig, C64, SYMMETRY_TOL};

/// Ordered eigenvalues and their eigenvector columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeSpectrum {
    /// λ = ω², ascending by real part (ties broken by imaginary part).
    pub eigenvalues: ComplexVector,
    /// Column `k` is the unit-norm mode shape for `eigenvalues[k]`.
    pub eigenvectors: ComplexMatrix,
}

impl ModeSpectrum {
    pub fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eigenvalues.is_empty()
    }

    /// True when every eigenvalue has `|Im λ| <= tol`.
    pub fn is_real(&self, tol: f64) -> bool {
        self.eigenvalues.iter().all(|l| l.im.abs() <= tol)
    }

    /// Real parts of the eigenvalues, or `None` if any imaginary part exceeds `tol`.
    pub fn real_eigenvalues(&self, tol: f64) -> Option<Vec<f64>> {
        self.is_real(tol)
            .then(|| self.eigenvalues.iter().map(|l| l.re).collect())
    }

    /// Real mode shapes, or `None` if any entry has a non-negligible imaginary part.
    pub fn real_eigenvectors(&self, tol: f64) -> Option<DMatrix<f64>> {
        if self.eigenvectors.iter().any(|z| z.im.abs() > tol) {
            return None;
        }
        Some(self.eigenvectors.map(|z| z.re))
    }

    /// The `k`-th mode shape as a column vector.
    pub fn mode_shape(&self, k: usize) -> Option<ComplexVector> {
        if k >= self.eigenvectors.ncols() {
            return None;
        }
        Some(self.eigenvectors.column(k).into_owned())
    }
}

/// Dense eigen-solver configured by [`SolverConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModeSolver {
    config: SolverConfig,
}

impl ModeSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// General (non-symmetric) solve; see [`eig`].
    pub fn solve(&self, matrix: &DMatrix<f64>) -> Result<ModeSpectrum> {
        eig(matrix, &self.config)
    }

    /// Symmetric solve; see [`eig_symmetric`].
    pub fn solve_symmetric(&self, matrix: &DMatrix<f64>) -> Result<ModeSpectrum> {
        eig_symmetric(matrix, &self.config)
    }
}

fn check_square_finite(matrix: &DMatrix<f64>) -> Result<()> {
    if !matrix.is_square() {
        return Err(ChainError::InvalidDimension {
            what: "matrix columns",
            expected: matrix.nrows(),
            actual: matrix.ncols(),
        });
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(ChainError::NumericalFailure(
            "matrix has non-finite entries".to_string(),
        ));
    }
    Ok(())
}

/// Eigenvalues and eigenvectors of a real square matrix, sorted ascending.
///
/// The all-zero matrix (an unbuilt system) yields all-zero eigenvalues and the
/// identity as eigenvectors. Running out of a non-zero `max_iterations` budget,
/// or a non-finite result, is reported as `NumericalFailure`.
pub fn eig(matrix: &DMatrix<f64>, config: &SolverConfig) -> Result<ModeSpectrum> {
    check_square_finite(matrix)?;
    let n = matrix.nrows();

    if matrix.iter().all(|v| *v == 0.0) {
        ftlog::debug!("zero {}x{} matrix, returning trivial spectrum", n, n);
        return Ok(ModeSpectrum {
            eigenvalues: ComplexVector::zeros(n),
            eigenvectors: ComplexMatrix::identity(n, n),
        });
    }

    if config.max_iterations > 0 {
        Schur::try_new(matrix.clone(), config.schur_eps, config.max_iterations).ok_or_else(
            || {
                ChainError::NumericalFailure(format!(
                    "Schur decomposition of {}x{} matrix did not converge within {} iterations",
                    n, n, config.max_iterations
                ))
            },
        )?;
    }

    let a = Mat::<f64>::from_fn(n, n, |i, j| matrix[(i, j)]);
    let evd = a.eigendecomposition::<c64>();
    let s = evd.s().column_vector();
    let u = evd.u();

    let eigenvalues: Vec<C64> = (0..n).map(|k| from_faer(s.read(k))).collect();
    if eigenvalues.iter().any(|l| !l.re.is_finite() || !l.im.is_finite()) {
        return Err(ChainError::NumericalFailure(
            "eigenvalues are not finite".to_string(),
        ));
    }
    let mut eigenvectors = ComplexMatrix::zeros(n, n);
    for k in 0..n {
        let mut v = ComplexVector::from_fn(n, |i, _| from_faer(u.read(i, k)));
        normalize_mode(&mut v)?;
        eigenvectors.set_column(k, &v);
    }

    let spectrum = sort_eigenpairs(eigenvalues, &eigenvectors);
    if !spectrum.is_real(config.imaginary_tol) {
        ftlog::warn!(
            "{}x{} dynamical matrix has complex eigenvalues; passing them through",
            n,
            n
        );
    }
    ftlog::debug!("solved {}x{} matrix: {:?}", n, n, spectrum.eigenvalues.as_slice());
    Ok(spectrum)
}

fn from_faer(z: c64) -> C64 {
    C64::new(z.re, z.im)
}

/// Eigenpairs of a real symmetric matrix via `SymmetricEigen`, sorted ascending.
pub fn eig_symmetric(matrix: &DMatrix<f64>, config: &SolverConfig) -> Result<ModeSpectrum> {
    check_square_finite(matrix)?;
    let n = matrix.nrows();

    let scale = matrix.amax().max(1.0);
    for j in 0..n {
        for i in (j + 1)..n {
            if (matrix[(i, j)] - matrix[(j, i)]).abs() > SYMMETRY_TOL * scale {
                return Err(ChainError::NotSymmetric { row: i, col: j });
            }
        }
    }

    let eig = SymmetricEigen::try_new(matrix.clone(), config.schur_eps, config.max_iterations)
        .ok_or_else(|| {
            ChainError::NumericalFailure(format!(
                "symmetric eigen-decomposition of {}x{} matrix did not converge within {} iterations",
                n, n, config.max_iterations
            ))
        })?;

    let eigenvalues: Vec<C64> = eig.eigenvalues.iter().map(|&l| C64::new(l, 0.0)).collect();
    let mut eigenvectors = eig.eigenvectors.map(|v| C64::new(v, 0.0));
    for mut col in eigenvectors.column_iter_mut() {
        let mut v = col.clone_owned();
        normalize_mode(&mut v)?;
        col.copy_from(&v);
    }

    Ok(sort_eigenpairs(eigenvalues, &eigenvectors))
}

/// Scale to unit norm and rotate so the largest component is real and positive.
fn normalize_mode(v: &mut ComplexVector) -> Result<()> {
    let norm = v.norm();
    if !norm.is_finite() || norm == 0.0 {
        return Err(ChainError::NumericalFailure(
            "eigenvector could not be normalised".to_string(),
        ));
    }
    v.unscale_mut(norm);

    let pivot = v
        .iter()
        .copied()
        .max_by(|a, b| a.norm().total_cmp(&b.norm()))
        .unwrap_or(C64::new(1.0, 0.0));
    let phase = pivot / pivot.norm();
    *v /= phase;
    Ok(())
}

/// Sort eigenvalues ascending and permute eigenvector COLUMNS to match.
pub(crate) fn sort_eigenpairs(eigenvalues: Vec<C64>, eigenvectors: &ComplexMatrix) -> ModeSpectrum {
    let n = eigenvalues.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        eigenvalues[a]
            .re
            .total_cmp(&eigenvalues[b].re)
            .then(eigenvalues[a].im.total_cmp(&eigenvalues[b].im))
    });

    let sorted_values = ComplexVector::from_iterator(n, order.iter().map(|&i| eigenvalues[i]));
    let sorted_vectors =
        ComplexMatrix::from_fn(eigenvectors.nrows(), n, |r, c| eigenvectors[(r, order[c])]);

    ModeSpectrum {
        eigenvalues: sorted_values,
        eigenvectors: sorted_vectors,
    }
}

/// Largest `‖D v_k − λ_k v_k‖∞` over all eigenpairs.
pub fn residual(matrix: &DMatrix<f64>, spectrum: &ModeSpectrum) -> f64 {
    let d = to_complex(matrix);
    (0..spectrum.len())
        .map(|k| {
            let v = spectrum.eigenvectors.column(k);
            let r: ComplexVector = &d * v - v * spectrum.eigenvalues[k];
            r.iter().map(|z| z.norm()).fold(0.0, f64::max)
        })
        .fold(0.0, f64::max)
}

/// Real matrix as a complex one, for callers comparing against spectra.
pub fn to_complex(matrix: &DMatrix<f64>) -> ComplexMatrix {
    matrix.map(|v| C64::new(v, 0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::{build_circular, build_linear, build_symmetrized};
    use crate::types::{Topology, LAMBDA_TOL};

    const EIG_TOL: f64 = 1e-9;

    fn solve(matrix: &DMatrix<f64>) -> ModeSpectrum {
        eig(matrix, &SolverConfig::default()).unwrap()
    }

    #[test]
    fn two_mass_chain_has_rigid_and_breathing_modes() {
        let d = build_linear(2, &[1.0, 1.0], &[1.0]).unwrap();
        let spectrum = solve(&d);
        let values = spectrum.real_eigenvalues(EIG_TOL).unwrap();
        assert!(values[0].abs() < EIG_TOL);
        assert!((values[1] - 2.0).abs() < EIG_TOL);

        // Rigid mode moves both masses together, breathing mode moves them apart.
        let rigid = spectrum.real_eigenvectors(EIG_TOL).unwrap();
        assert!((rigid[(0, 0)] - rigid[(1, 0)]).abs() < EIG_TOL);
        assert!((rigid[(0, 1)] + rigid[(1, 1)]).abs() < EIG_TOL);
        assert!(residual(&d, &spectrum) < EIG_TOL);
    }

    #[test]
    fn eigenvector_columns_follow_sorted_eigenvalues() {
        // A = P diag(5, 1, 3) P^-1, eigenvalues deliberately out of order.
        let p = DMatrix::from_row_slice(3, 3, &[1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 1.0]);
        let diag = DMatrix::from_diagonal(&nalgebra::DVector::from_vec(vec![5.0, 1.0, 3.0]));
        let a = &p * diag * p.clone().try_inverse().unwrap();
        let spectrum = solve(&a);

        let values = spectrum.real_eigenvalues(EIG_TOL).unwrap();
        assert!((values[0] - 1.0).abs() < EIG_TOL);
        assert!((values[1] - 3.0).abs() < EIG_TOL);
        assert!((values[2] - 5.0).abs() < EIG_TOL);

        // Sorted column k must be parallel to the matching column of P.
        let p = to_complex(&p);
        for (k, source) in [1, 2, 0].into_iter().enumerate() {
            let v = spectrum.eigenvectors.column(k);
            let expected = p.column(source);
            let cosine = v.dotc(&expected).norm() / (v.norm() * expected.norm());
            assert!((cosine - 1.0).abs() < EIG_TOL, "column {} cosine {}", k, cosine);
        }
        assert!(residual(&a, &spectrum) < EIG_TOL);
    }

    #[test]
    fn unequal_masses_give_consistent_pairs() {
        let d = build_linear(4, &[1.0, 2.0, 1.0, 2.0], &[1.0, 1.0, 1.0]).unwrap();
        let spectrum = solve(&d);
        assert!(residual(&d, &spectrum) < EIG_TOL);
        let values = spectrum.real_eigenvalues(EIG_TOL).unwrap();
        for pair in values.windows(2) {
            assert!(pair[0] <= pair[1] + LAMBDA_TOL);
        }
        assert!(values[0].abs() < EIG_TOL);
    }

    #[test]
    fn degenerate_ring_modes_are_resolved() {
        let d = build_circular(3, &[1.0; 3], &[1.0; 2]).unwrap();
        let spectrum = solve(&d);
        let values = spectrum.real_eigenvalues(EIG_TOL).unwrap();
        assert!(values[0].abs() < EIG_TOL);
        assert!((values[1] - 3.0).abs() < EIG_TOL);
        assert!((values[2] - 3.0).abs() < EIG_TOL);
        assert!(residual(&d, &spectrum) < EIG_TOL);
    }

    #[test]
    fn rotation_matrix_yields_complex_pair() {
        let d = DMatrix::from_row_slice(2, 2, &[0.0, -1.0, 1.0, 0.0]);
        let spectrum = solve(&d);
        assert!(spectrum.real_eigenvalues(EIG_TOL).is_none());
        let mut imag: Vec<f64> = spectrum.eigenvalues.iter().map(|l| l.im).collect();
        imag.sort_by(|a, b| a.total_cmp(b));
        assert!((imag[0] + 1.0).abs() < EIG_TOL);
        assert!((imag[1] - 1.0).abs() < EIG_TOL);
        assert!(spectrum.eigenvalues.iter().all(|l| l.re.abs() < EIG_TOL));
        assert!(residual(&d, &spectrum) < EIG_TOL);
    }

    #[test]
    fn zero_matrix_has_trivial_spectrum() {
        let d = DMatrix::<f64>::zeros(4, 4);
        let spectrum = solve(&d);
        assert!(spectrum.eigenvalues.iter().all(|l| l.norm() == 0.0));
        assert_eq!(spectrum.eigenvectors, ComplexMatrix::identity(4, 4));
    }

    #[test]
    fn non_square_and_non_finite_inputs_fail() {
        let config = SolverConfig::default();
        assert!(matches!(
            eig(&DMatrix::zeros(2, 3), &config),
            Err(ChainError::InvalidDimension { .. })
        ));
        let mut d = DMatrix::<f64>::identity(2, 2);
        d[(0, 1)] = f64::INFINITY;
        assert!(matches!(eig(&d, &config), Err(ChainError::NumericalFailure(_))));
    }

    #[test]
    fn symmetric_path_agrees_with_general_path() {
        let masses = [1.0, 3.0, 2.0, 5.0];
        let springs = [2.0, 1.0, 4.0];
        let d = build_linear(4, &masses, &springs).unwrap();
        let s = build_symmetrized(4, &masses, &springs, Topology::Linear).unwrap();

        let general = solve(&d).real_eigenvalues(EIG_TOL).unwrap();
        let symmetric = eig_symmetric(&s, &SolverConfig::default()).unwrap();
        assert!(residual(&s, &symmetric) < EIG_TOL);

        let symmetric = symmetric.real_eigenvalues(0.0).unwrap();
        for (g, s) in general.iter().zip(symmetric.iter()) {
            assert!((g - s).abs() < 1e-8, "general {} vs symmetric {}", g, s);
        }
    }

    #[test]
    fn symmetric_path_rejects_asymmetric_matrix() {
        let d = build_linear(3, &[1.0, 2.0, 1.0], &[1.0, 1.0]).unwrap();
        let err = eig_symmetric(&d, &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, ChainError::NotSymmetric { .. }));
    }

    #[test]
    fn modes_are_unit_norm_with_positive_pivot() {
        let d = build_linear(5, &[1.0, 2.0, 3.0, 2.0, 1.0], &[1.0, 2.0, 2.0, 1.0]).unwrap();
        let spectrum = solve(&d);
        for k in 0..spectrum.len() {
            let v = spectrum.mode_shape(k).unwrap();
            assert!((v.norm() - 1.0).abs() < EIG_TOL);
            let pivot = v
                .iter()
                .copied()
                .max_by(|a, b| a.norm().total_cmp(&b.norm()))
                .unwrap();
            assert!(pivot.re > 0.0);
            assert!(pivot.im.abs() < EIG_TOL);
        }
        assert!(spectrum.mode_shape(5).is_none());
    }

    #[test]
    fn exhausted_iteration_budget_is_a_numerical_failure() {
        let masses: Vec<f64> = (0..10).map(|i| 1.0 + 0.37 * i as f64).collect();
        let springs: Vec<f64> = (0..9).map(|i| 2.0 - 0.15 * i as f64).collect();
        let config = SolverConfig::default().with_max_iterations(1);

        let d = build_linear(10, &masses, &springs).unwrap();
        assert!(matches!(eig(&d, &config), Err(ChainError::NumericalFailure(_))));

        let s = build_symmetrized(10, &masses, &springs, Topology::Linear).unwrap();
        assert!(matches!(
            eig_symmetric(&s, &config),
            Err(ChainError::NumericalFailure(_))
        ));

        // An ample budget converges to the same spectrum as the unlimited default.
        let capped = eig(&d, &SolverConfig::default().with_max_iterations(10_000)).unwrap();
        let unlimited = solve(&d);
        for (a, b) in capped.eigenvalues.iter().zip(unlimited.eigenvalues.iter()) {
            assert!((a - b).norm() < EIG_TOL);
        }
    }

    #[test]
    fn sort_permutes_columns_not_rows() {
        let values = vec![C64::new(2.0, 0.0), C64::new(0.0, 0.0)];
        let vectors = ComplexMatrix::from_fn(2, 2, |r, c| C64::new((10 * r + c) as f64, 0.0));
        let sorted = sort_eigenpairs(values, &vectors);
        assert_eq!(sorted.eigenvalues[0], C64::new(0.0, 0.0));
        assert_eq!(sorted.eigenvectors.column(0), vectors.column(1));
        assert_eq!(sorted.eigenvectors.column(1), vectors.column(0));
    }
}
