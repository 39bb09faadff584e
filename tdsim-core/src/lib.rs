//! tdsim core: stochastic quasar light curves for time-delay studies.
//!
//! This crate holds the simulation engine:
//! - CAR(1) (damped random walk) generator on a regular time grid
//! - Delay buffer that shifts a curve by whole sample steps
//! - Cadence sampler (daily, weekly, observing seasons, explicit indices)
//! - Flux-proportional photometric noise
//! - Weighted smoothing-spline reconstruction
//! - The [`LightCurve`] entity tying the above together, plus the record
//!   shapes the persistence layer writes
//!
//! Everything is deterministic given the process and noise seeds.

pub mod cadence;
pub mod delay;
pub mod error;
pub mod generator;
pub mod lightcurve;
pub mod noise;
pub mod record;
pub mod rng;
pub mod signal;
pub mod spline;

pub use cadence::{Cadence, SamplingPlan, SeasonWindow};
pub use error::{LightCurveError, Result};
pub use generator::{generate, generate_with, GeneratorOptions};
pub use lightcurve::{CurveOptions, LightCurve, ProcessOverrides, SampleRequest};
pub use record::{
    FieldValue, FluxCurve, LightCurveRecord, ObservedFlux, ObservedSet, RecordKind, FIELD_NAMES,
};
pub use signal::{ProcessParameters, Resolution, Signal};
pub use spline::{ReconstructOptions, SmoothingSpline};
