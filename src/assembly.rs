//! Dynamical matrix assembly for linear and circular spring chains.
//!
//! Every builder first assembles the spring-coupling (stiffness) matrix `K` and
//! then normalises it by mass. The default normalisation divides each row by its
//! own mass, `D[i,j] = K[i,j] / m[i]`, which is the equation of motion per unit
//! mass and is generally non-symmetric when the masses differ. The mass-weighted
//! variant divides by `sqrt(m[i] m[j])` instead and stays symmetric.
//!
//! ## Spring-count convention
//!
//! Both topologies take `n - 1` spring constants. A circular chain reuses the
//! LAST constant as the closing spring between mass `n - 1` and mass `0`, so the
//! final bond and the closing bond always share a stiffness. Use
//! [`build_closed_ring`] to supply all `n` constants independently.

use nalgebra::DMatrix;

use crate::error::{ChainError, Result};
use crate::types::{Topology, MIN_MASSES};

pub(crate) fn check_size(n: usize) -> Result<()> {
    if n < MIN_MASSES {
        return Err(ChainError::InvalidSize(n));
    }
    Ok(())
}

fn check_len(what: &'static str, values: &[f64], expected: usize) -> Result<()> {
    if values.len() != expected {
        return Err(ChainError::InvalidDimension {
            what,
            expected,
            actual: values.len(),
        });
    }
    Ok(())
}

/// Validate mass and spring lists against a chain of `n` masses.
///
/// Length checks run first (masses, then springs) so a wrong-length list is
/// always reported as `InvalidDimension`, whatever its contents.
pub fn validate_inputs(
    n: usize,
    masses: &[f64],
    springs: &[f64],
    expected_springs: usize,
) -> Result<()> {
    check_size(n)?;
    check_len("masses", masses, n)?;
    check_len("springs", springs, expected_springs)?;

    if let Some((index, &value)) = masses
        .iter()
        .enumerate()
        .find(|(_, m)| !m.is_finite() || **m <= 0.0)
    {
        return Err(ChainError::InvalidParameter {
            what: "masses",
            index,
            value,
        });
    }
    if let Some((index, &value)) = springs.iter().enumerate().find(|(_, k)| !k.is_finite()) {
        return Err(ChainError::InvalidParameter {
            what: "springs",
            index,
            value,
        });
    }
    Ok(())
}

/// Spring-coupling matrix for `n` masses joined by `n - 1` springs.
///
/// Entries follow the positional rules of the chain: diagonal `i` sums the
/// springs touching mass `i`, the first off-diagonals carry `-k[min(i, j)]`, and
/// for a circular chain the corners carry the closing spring `-k[n - 2]`. When
/// `n == 2` the nearest-neighbour rule wins over the corner rule.
pub fn stiffness_matrix(n: usize, springs: &[f64], topology: Topology) -> Result<DMatrix<f64>> {
    check_size(n)?;
    check_len("springs", springs, n - 1)?;
    Ok(chain_stiffness(n, springs, topology))
}

/// Stiffness matrix of a ring with `n` independent springs.
///
/// Spring `i < n - 1` joins masses `i` and `i + 1`; spring `n - 1` joins mass
/// `n - 1` back to mass `0`. Contributions accumulate, so for `n == 2` both
/// springs act in parallel between the two masses.
pub fn ring_stiffness_matrix(n: usize, springs: &[f64]) -> Result<DMatrix<f64>> {
    check_size(n)?;
    check_len("springs", springs, n)?;
    Ok(ring_stiffness(n, springs))
}

// Callers have checked `n >= 2` and `springs.len() == n - 1`.
fn chain_stiffness(n: usize, springs: &[f64], topology: Topology) -> DMatrix<f64> {
    let closing = springs[n - 2];
    let mut k = DMatrix::<f64>::zeros(n, n);

    for i in 0..n {
        k[(i, i)] = match (topology, i) {
            (Topology::Linear, 0) => springs[0],
            (Topology::Linear, i) if i == n - 1 => springs[i - 1],
            (Topology::Circular, 0) => springs[0] + closing,
            (Topology::Circular, i) if i == n - 1 => springs[i - 1] + closing,
            (_, i) => springs[i - 1] + springs[i],
        };
        if i + 1 < n {
            k[(i, i + 1)] = -springs[i];
            k[(i + 1, i)] = -springs[i];
        }
    }

    if topology == Topology::Circular && n > 2 {
        k[(0, n - 1)] = -closing;
        k[(n - 1, 0)] = -closing;
    }

    k
}

// Callers have checked `n >= 2` and `springs.len() == n`.
fn ring_stiffness(n: usize, springs: &[f64]) -> DMatrix<f64> {
    let mut k = DMatrix::<f64>::zeros(n, n);
    for (a, &ka) in springs.iter().enumerate() {
        let b = (a + 1) % n;
        k[(a, a)] += ka;
        k[(b, b)] += ka;
        k[(a, b)] -= ka;
        k[(b, a)] -= ka;
    }
    k
}

/// Divide each row of `k` by its own mass.
fn row_normalize(mut k: DMatrix<f64>, masses: &[f64]) -> DMatrix<f64> {
    for (i, mut row) in k.row_iter_mut().enumerate() {
        row /= masses[i];
    }
    k
}

/// Divide entry `(i, j)` of `k` by `sqrt(m[i] m[j])`.
fn mass_weight(mut k: DMatrix<f64>, masses: &[f64]) -> DMatrix<f64> {
    let inv_sqrt: Vec<f64> = masses.iter().map(|m| 1.0 / m.sqrt()).collect();
    for j in 0..k.ncols() {
        for i in 0..k.nrows() {
            k[(i, j)] *= inv_sqrt[i] * inv_sqrt[j];
        }
    }
    k
}

/// Build the per-row dynamical matrix `D = M^-1 K` for the given topology.
pub fn build_matrix(
    n: usize,
    masses: &[f64],
    springs: &[f64],
    topology: Topology,
) -> Result<DMatrix<f64>> {
    validate_inputs(n, masses, springs, n.saturating_sub(1))?;
    Ok(row_normalize(chain_stiffness(n, springs, topology), masses))
}

/// Same as [`build_matrix`] with the topology given as a tag such as `"linear"`.
pub fn build_matrix_tagged(
    n: usize,
    masses: &[f64],
    springs: &[f64],
    tag: &str,
) -> Result<DMatrix<f64>> {
    let topology: Topology = tag.parse()?;
    build_matrix(n, masses, springs, topology)
}

/// Open chain: no coupling between the first and last mass.
pub fn build_linear(n: usize, masses: &[f64], springs: &[f64]) -> Result<DMatrix<f64>> {
    build_matrix(n, masses, springs, Topology::Linear)
}

/// Closed ring; the closing spring reuses the last of the `n - 1` constants.
pub fn build_circular(n: usize, masses: &[f64], springs: &[f64]) -> Result<DMatrix<f64>> {
    build_matrix(n, masses, springs, Topology::Circular)
}

/// Closed ring with an explicit closing spring: `springs` has `n` entries.
pub fn build_closed_ring(n: usize, masses: &[f64], springs: &[f64]) -> Result<DMatrix<f64>> {
    validate_inputs(n, masses, springs, n)?;
    Ok(row_normalize(ring_stiffness(n, springs), masses))
}

/// Mass-weighted symmetric dynamical matrix `M^-1/2 K M^-1/2`.
///
/// Shares its eigenvalues with [`build_matrix`]; an eigenvector `u` of this
/// matrix maps to the per-row eigenvector `M^-1/2 u`.
pub fn build_symmetrized(
    n: usize,
    masses: &[f64],
    springs: &[f64],
    topology: Topology,
) -> Result<DMatrix<f64>> {
    validate_inputs(n, masses, springs, n.saturating_sub(1))?;
    Ok(mass_weight(chain_stiffness(n, springs, topology), masses))
}
