//! Integer-step time delays with a rollover buffer.
//!
//! A delay is a circular rotation of `buffer ++ active` by a whole number of
//! samples. A positive shift moves the tail of the buffer into the head of
//! the active segment; whatever leaves one end of the concatenation comes
//! back at the other. With a buffer at least as long as the delay, the
//! active segment only ever receives genuine earlier signal.
//!
//! Only uniformly sampled ("intrinsic") curves may be delayed, and only by a
//! multiple of their step: anything else would need interpolation.

use crate::error::{LightCurveError, Result};
use crate::signal::sample_step;

/// Absolute tolerance, in steps, on `delay / step` being an integer.
pub const STEP_TOLERANCE: f64 = 1e-5;

/// Number of whole samples `delay_days` spans on the grid `time`.
///
/// Fails with `InsufficientResolution` when the delay is not within
/// [`STEP_TOLERANCE`] of a whole number of steps.
pub fn delay_steps(time: &[f64], delay_days: f64) -> Result<i64> {
    let step = sample_step(time).ok_or_else(|| {
        LightCurveError::invalid("a delay needs at least two time samples to define the step")
    })?;
    if !(step.is_finite() && step > 0.0) {
        return Err(LightCurveError::invalid(format!(
            "time must be strictly increasing, got step {step}"
        )));
    }
    if !delay_days.is_finite() {
        return Err(LightCurveError::invalid(format!(
            "delay must be finite, got {delay_days}"
        )));
    }

    // The ulp term only absorbs rounding in the division itself.
    let steps = delay_days / step;
    let nearest = steps.round();
    if (steps - nearest).abs() > STEP_TOLERANCE + 4.0 * f64::EPSILON * steps.abs() {
        return Err(LightCurveError::InsufficientResolution {
            delay: delay_days,
            step,
        });
    }
    Ok(nearest as i64)
}

/// Delay `active` by `delay_days`, rolling through `buffer` when given.
///
/// Both slices are rewritten in place; on error neither is touched.
/// Returns the applied shift in samples.
pub fn apply_delay(
    time: &[f64],
    active: &mut [f64],
    delay_days: f64,
    buffer: Option<&mut [f64]>,
) -> Result<i64> {
    let shift = delay_steps(time, delay_days)?;

    match buffer {
        None => rotate(active, shift),
        Some(buffer) => {
            let mut joined = Vec::with_capacity(buffer.len() + active.len());
            joined.extend_from_slice(buffer);
            joined.extend_from_slice(active);
            rotate(&mut joined, shift);

            let (head, tail) = joined.split_at(buffer.len());
            buffer.copy_from_slice(head);
            active.copy_from_slice(tail);
        }
    }

    tracing::debug!(delay_days, shift, "applied delay");
    Ok(shift)
}

/// Circular shift: element `i` moves to `(i + shift) mod len`.
fn rotate(values: &mut [f64], shift: i64) {
    let len = values.len();
    if len == 0 {
        return;
    }
    let k = shift.rem_euclid(len as i64) as usize;
    values.rotate_right(k);
}
