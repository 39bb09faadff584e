//! Observing cadence: which intrinsic samples end up in the observed set.
//!
//! A plan is either an explicit list of indices, which bypasses everything
//! else, or a cadence (intrinsic, daily, weekly) optionally gated by
//! observing seasons. Grid membership is decided on times rounded to 1e-5
//! day so that 0.01-day grids land exactly on whole days.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_len, LightCurveError, Result};
use crate::signal::Signal;

/// Rounding applied to times before testing grid membership (1e-5 day).
const TIME_QUANTUM: f64 = 1e5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    /// Keep every intrinsic sample.
    #[default]
    Intrinsic,
    /// One sample per whole day.
    Daily,
    /// One sample every seven days.
    Weekly,
}

impl Cadence {
    fn period_days(self) -> Option<f64> {
        match self {
            Cadence::Intrinsic => None,
            Cadence::Daily => Some(1.0),
            Cadence::Weekly => Some(7.0),
        }
    }
}

/// Periodic visibility window: `count` seasons of `length_days`, one every
/// `period_days`, starting at t = 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonWindow {
    pub period_days: f64,
    pub length_days: f64,
    pub count: u32,
}

impl Default for SeasonWindow {
    /// 120 days on, 245 days off, for ten years.
    fn default() -> Self {
        Self {
            period_days: 365.0,
            length_days: 120.0,
            count: 10,
        }
    }
}

impl SeasonWindow {
    pub fn contains(&self, t: f64) -> bool {
        (0..self.count).any(|k| {
            let start = self.period_days * f64::from(k);
            t >= start && t < start + self.length_days
        })
    }
}

/// How to subsample an intrinsic curve.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SamplingPlan {
    pub cadence: Cadence,
    /// Gate the cadence with [`SamplingPlan::window`].
    pub season: bool,
    pub window: SeasonWindow,
    /// Explicit sample indices. When present, cadence and season are ignored.
    pub index: Option<Vec<usize>>,
}

impl SamplingPlan {
    pub fn cadence(cadence: Cadence) -> Self {
        Self {
            cadence,
            ..Self::default()
        }
    }

    pub fn with_season(mut self) -> Self {
        self.season = true;
        self
    }

    pub fn indices(index: Vec<usize>) -> Self {
        Self {
            index: Some(index),
            ..Self::default()
        }
    }
}

/// Indices of `time` selected by `plan`, ascending and without repeats.
pub fn select_indices(time: &[f64], plan: &SamplingPlan) -> Result<Vec<usize>> {
    if let Some(index) = &plan.index {
        let mut index = index.clone();
        index.sort_unstable();
        index.dedup();
        if let Some(&last) = index.last() {
            if last >= time.len() {
                return Err(LightCurveError::invalid(format!(
                    "sample index {last} out of range for {} samples",
                    time.len()
                )));
            }
        }
        return Ok(index);
    }

    let period = plan.cadence.period_days();
    let selected = time
        .iter()
        .enumerate()
        .filter(|&(_, &t)| period.map_or(true, |p| on_grid(t, p)))
        .filter(|&(_, &t)| !plan.season || plan.window.contains(t))
        .map(|(i, _)| i)
        .collect();
    Ok(selected)
}

/// Subsample `signal` on `time` according to `plan`.
pub fn sample(time: &[f64], signal: &[f64], plan: &SamplingPlan) -> Result<Signal> {
    ensure_len("sampled signal", time.len(), signal.len())?;
    let index = select_indices(time, plan)?;
    Ok(gather(time, signal, &index))
}

/// `(time[index], signal[index])` for indices already known to be in range.
pub(crate) fn gather(time: &[f64], signal: &[f64], index: &[usize]) -> Signal {
    Signal {
        time: index.iter().map(|&i| time[i]).collect(),
        value: index.iter().map(|&i| signal[i]).collect(),
    }
}

fn on_grid(t: f64, period_days: f64) -> bool {
    (t * TIME_QUANTUM).round() % (period_days * TIME_QUANTUM) == 0.0
}
