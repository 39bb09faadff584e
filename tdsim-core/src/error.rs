//! Error taxonomy shared by every engine operation.
//!
//! All failures are surfaced to the caller; nothing is retried or coerced
//! internally. Operations validate their inputs before touching any state,
//! so an `Err` always means the target was left exactly as it was.

use thiserror::Error;

/// Errors raised by the light-curve engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LightCurveError {
    /// Non-physical or out-of-range input (e.g. a non-positive timescale).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A delay that is not an integer number of intrinsic sample steps.
    #[error(
        "insufficient time resolution: delay of {delay} day(s) is not a multiple of the {step} day sample step"
    )]
    InsufficientResolution { delay: f64, step: f64 },

    /// Two sequences that must be aligned have different lengths.
    #[error("shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// A persisted record kind other than "good" or "evil".
    #[error("unsupported record type '{0}' (expected 'good' or 'evil')")]
    UnsupportedRecordType(String),

    /// More labeled curves than the observed-only record can carry.
    #[error("too many curves for an observed-only record: {count} (max {max})")]
    TooManyCurves { count: usize, max: usize },
}

impl LightCurveError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    pub(crate) fn shape(what: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            what: what.into(),
            expected,
            actual,
        }
    }
}

/// Convenience alias used throughout the engine.
pub type Result<T> = std::result::Result<T, LightCurveError>;

/// Fail with `ShapeMismatch` unless `actual == expected`.
pub(crate) fn ensure_len(what: &str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(LightCurveError::shape(what, expected, actual))
    }
}
