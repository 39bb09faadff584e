//! Time/value pairs and the parameters that describe the intrinsic process.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_len, LightCurveError, Result};

/// Ordered pair of equal-length sequences: time in days, value in magnitudes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Signal {
    pub time: Vec<f64>,
    pub value: Vec<f64>,
}

impl Signal {
    /// Pair up `time` and `value`, rejecting mismatched lengths.
    pub fn new(time: Vec<f64>, value: Vec<f64>) -> Result<Self> {
        ensure_len("signal value", time.len(), value.len())?;
        Ok(Self { time, value })
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Sample step of a uniformly sampled signal (`time[1] - time[0]`).
    pub fn step(&self) -> Option<f64> {
        sample_step(&self.time)
    }
}

/// `time[1] - time[0]`, or `None` for fewer than two samples.
pub fn sample_step(time: &[f64]) -> Option<f64> {
    match time {
        [t0, t1, ..] => Some(t1 - t0),
        _ => None,
    }
}

/// Intrinsic sampling resolution. The factor divides the one-day step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// 1 day.
    Low,
    /// 0.1 day.
    Medium,
    /// 0.01 day.
    #[default]
    High,
}

impl Resolution {
    pub fn factor(self) -> u32 {
        match self {
            Resolution::Low => 1,
            Resolution::Medium => 10,
            Resolution::High => 100,
        }
    }

    /// Sample step in days.
    pub fn step_days(self) -> f64 {
        1.0 / f64::from(self.factor())
    }

    pub fn from_factor(factor: u32) -> Result<Self> {
        match factor {
            1 => Ok(Resolution::Low),
            10 => Ok(Resolution::Medium),
            100 => Ok(Resolution::High),
            other => Err(LightCurveError::invalid(format!(
                "resolution factor must be 1, 10 or 100, got {other}"
            ))),
        }
    }
}

/// Physical parameters of the CAR(1) process.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessParameters {
    pub seed: i64,
    /// Long-term mean the process relaxes to [mag].
    pub mean_magnitude: f64,
    /// Magnitude at t = 0 [mag].
    pub initial_magnitude: f64,
    /// Relaxation timescale tau [day].
    pub timescale: f64,
    /// Volatility sigma [mag day^-1/2].
    pub volatility: f64,
}

pub const DEFAULT_MEAN_MAGNITUDE: f64 = 20.0;
pub const DEFAULT_TIMESCALE: f64 = 316.227_766_016_837_94; // 10^2.5 days
pub const DEFAULT_VOLATILITY: f64 = 8.0e-3;

impl ProcessParameters {
    /// Parameters with the reference defaults (`mag0 == meanmag`).
    pub fn with_seed(seed: i64) -> Self {
        Self {
            seed,
            mean_magnitude: DEFAULT_MEAN_MAGNITUDE,
            initial_magnitude: DEFAULT_MEAN_MAGNITUDE,
            timescale: DEFAULT_TIMESCALE,
            volatility: DEFAULT_VOLATILITY,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.timescale.is_finite() && self.timescale > 0.0) {
            return Err(LightCurveError::invalid(format!(
                "timescale must be positive, got {}",
                self.timescale
            )));
        }
        if !(self.volatility.is_finite() && self.volatility > 0.0) {
            return Err(LightCurveError::invalid(format!(
                "volatility must be positive, got {}",
                self.volatility
            )));
        }
        if !self.mean_magnitude.is_finite() || !self.initial_magnitude.is_finite() {
            return Err(LightCurveError::invalid("magnitudes must be finite"));
        }
        Ok(())
    }

    /// Analytic stationary variance of the process, `sigma^2 * tau / 2` [mag^2].
    pub fn stationary_variance(&self) -> f64 {
        self.volatility * self.volatility * self.timescale / 2.0
    }
}
