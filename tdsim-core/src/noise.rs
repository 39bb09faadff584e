//! Photometric noise realizations.
//!
//! Noise is Gaussian in flux with a standard deviation proportional to the
//! flux itself, then mapped back to magnitudes. Only the perturbation is
//! returned; callers add it to the curve explicitly. The same draw can then
//! be reapplied to another base curve or reused as a fit weight.

use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::{LightCurveError, Result};
use crate::rng::{rng_for, RngStream};

/// Default noise amplitude as a fraction of flux (3%).
pub const DEFAULT_NOISE_AMPLITUDE: f64 = 0.03;

/// Magnitude to (arbitrary-zero-point) flux.
pub fn mag_to_flux(mag: f64) -> f64 {
    10f64.powf(-0.4 * mag)
}

/// Flux to magnitude; inverse of [`mag_to_flux`].
pub fn flux_to_mag(flux: f64) -> f64 {
    -2.5 * flux.log10()
}

/// Magnitude deltas for one noise realization of `magnitudes`.
///
/// `fractional_amplitude` is the 1-sigma flux error as a fraction of the
/// flux. A zero amplitude yields all-zero deltas. Fails with
/// `InvalidParameter` if a deviate pushes any flux to zero or below, which
/// becomes likely once the amplitude approaches a few tenths.
pub fn perturb(magnitudes: &[f64], noise_seed: i64, fractional_amplitude: f64) -> Result<Vec<f64>> {
    if !(fractional_amplitude.is_finite() && fractional_amplitude >= 0.0) {
        return Err(LightCurveError::invalid(format!(
            "noise amplitude must be a non-negative fraction, got {fractional_amplitude}"
        )));
    }

    tracing::debug!(
        samples = magnitudes.len(),
        seed = noise_seed,
        percent = fractional_amplitude * 100.0,
        "drawing noise realization"
    );

    let mut rng = rng_for(noise_seed, RngStream::Noise);
    let mut deltas = Vec::with_capacity(magnitudes.len());
    for (i, &mag) in magnitudes.iter().enumerate() {
        let flux = mag_to_flux(mag);
        let z: f64 = rng.sample(StandardNormal);
        let deviate = z * flux * fractional_amplitude;
        if deviate == 0.0 {
            deltas.push(0.0);
            continue;
        }
        let perturbed = flux + deviate;
        if perturbed.is_nan() || perturbed <= 0.0 {
            return Err(LightCurveError::invalid(format!(
                "noise amplitude {fractional_amplitude} drove the flux of sample {i} non-positive"
            )));
        }
        deltas.push(flux_to_mag(perturbed) - mag);
    }
    Ok(deltas)
}
