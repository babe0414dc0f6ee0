//! Mode post-processing for chain vibration analysis.
//!
//! Converts eigenvalues into physical frequencies and sorts modes into
//! rigid-body, oscillatory, unstable, and complex families.

use std::collections::HashMap;
use std::f64::consts::PI;

use crate::solver::ModeSpectrum;
use crate::types::{ComplexVector, ModeKind, C64, LAMBDA_TOL};

/// A single normal mode: its eigenvalue, shape, and classification.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalMode {
    /// Column index in the originating spectrum.
    pub index: usize,
    /// λ = ω².
    pub eigenvalue: C64,
    /// Unit-norm relative amplitudes, one per mass.
    pub shape: ComplexVector,
    pub kind: ModeKind,
}

impl NormalMode {
    /// ω = √λ for oscillatory and rigid-body modes, `None` otherwise.
    pub fn angular_frequency(&self) -> Option<f64> {
        match self.kind {
            ModeKind::RigidBody => Some(0.0),
            ModeKind::Oscillatory => Some(self.eigenvalue.re.sqrt()),
            ModeKind::Unstable | ModeKind::Complex => None,
        }
    }

    /// f = ω / 2π in Hz.
    pub fn frequency_hz(&self) -> Option<f64> {
        self.angular_frequency().map(|w| w / (2.0 * PI))
    }
}

/// Classify a single eigenvalue.
///
/// `imaginary_tol` bounds the imaginary part of a real eigenvalue; the real part
/// is compared against [`LAMBDA_TOL`] scaled by `scale` (typically the largest
/// eigenvalue magnitude) to separate rigid-body modes from oscillations.
pub fn classify_mode(eigenvalue: C64, scale: f64, imaginary_tol: f64) -> ModeKind {
    if eigenvalue.im.abs() > imaginary_tol {
        return ModeKind::Complex;
    }
    let zero_tol = LAMBDA_TOL * scale.max(1.0);
    if eigenvalue.re.abs() <= zero_tol {
        ModeKind::RigidBody
    } else if eigenvalue.re > 0.0 {
        ModeKind::Oscillatory
    } else {
        ModeKind::Unstable
    }
}

fn spectrum_scale(spectrum: &ModeSpectrum) -> f64 {
    spectrum
        .eigenvalues
        .iter()
        .map(|l| l.norm())
        .fold(0.0, f64::max)
}

/// Split a spectrum into classified [`NormalMode`]s, in eigenvalue order.
pub fn normal_modes(spectrum: &ModeSpectrum, imaginary_tol: f64) -> Vec<NormalMode> {
    let scale = spectrum_scale(spectrum);
    spectrum
        .eigenvalues
        .iter()
        .enumerate()
        .map(|(index, &eigenvalue)| NormalMode {
            index,
            eigenvalue,
            shape: spectrum.eigenvectors.column(index).into_owned(),
            kind: classify_mode(eigenvalue, scale, imaginary_tol),
        })
        .collect()
}

/// Angular frequencies ω = √λ (rad/s); rigid-body modes map to 0.
///
/// Returns `None` if any mode is unstable or complex, since ω is not real then.
pub fn angular_frequencies(spectrum: &ModeSpectrum, imaginary_tol: f64) -> Option<Vec<f64>> {
    normal_modes(spectrum, imaginary_tol)
        .iter()
        .map(NormalMode::angular_frequency)
        .collect()
}

/// Frequencies in Hz, ω / 2π; same `None` rule as [`angular_frequencies`].
pub fn frequencies_hz(spectrum: &ModeSpectrum, imaginary_tol: f64) -> Option<Vec<f64>> {
    angular_frequencies(spectrum, imaginary_tol)
        .map(|ws| ws.into_iter().map(|w| w / (2.0 * PI)).collect())
}

/// Oscillatory frequencies (Hz) with rigid-body modes removed, lowest `num_modes` first.
pub fn oscillatory_frequencies_hz(
    spectrum: &ModeSpectrum,
    imaginary_tol: f64,
    num_modes: usize,
) -> Vec<f64> {
    let mut freqs: Vec<f64> = normal_modes(spectrum, imaginary_tol)
        .iter()
        .filter(|m| m.kind == ModeKind::Oscillatory)
        .filter_map(NormalMode::frequency_hz)
        .collect();
    freqs.sort_by(|a, b| a.total_cmp(b));
    freqs.truncate(num_modes.min(freqs.len()));
    freqs
}

/// Classify all modes of a spectrum.
///
/// Returns a map from `ModeKind` to a vector of tuples
/// `(eigenvalue_re, mode_index, family_rank)`, where `mode_index` is the column
/// index in the spectrum and `family_rank` is the 1-based order within its
/// family after sorting by eigenvalue.
pub fn classify_all_modes(
    spectrum: &ModeSpectrum,
    imaginary_tol: f64,
) -> HashMap<ModeKind, Vec<(f64, usize, usize)>> {
    let mut families: HashMap<ModeKind, Vec<(f64, usize, usize)>> = HashMap::new();
    families.insert(ModeKind::RigidBody, Vec::new());
    families.insert(ModeKind::Oscillatory, Vec::new());
    families.insert(ModeKind::Unstable, Vec::new());
    families.insert(ModeKind::Complex, Vec::new());

    for mode in normal_modes(spectrum, imaginary_tol) {
        families
            .entry(mode.kind)
            .or_default()
            .push((mode.eigenvalue.re, mode.index, 0));
    }

    // Sort and assign family ranks
    for modes in families.values_mut() {
        modes.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        for (i, mode) in modes.iter_mut().enumerate() {
            mode.2 = i + 1;
        }
    }

    families
}
