//! The light-curve entity.
//!
//! A [`LightCurve`] owns one realization end to end: the process parameters,
//! the intrinsic curve split into an active segment and a delay buffer, the
//! sampled + noisy observation, and an optional spline reconstruction. Every
//! mutation goes through a method that validates first and assigns last, so
//! a failed call leaves the entity untouched.
//!
//! Derived data goes stale whenever its source changes:
//!
//! | operation      | resets                                   |
//! |----------------|------------------------------------------|
//! | `regenerate`   | buffer/active, sampled, noise, spline    |
//! | `add_delay`    | sampled, noise, spline, sampling flags   |
//! | `sample`       | spline                                   |
//!
//! `Clone` is a deep copy; give each concurrent consumer its own clone.

use serde::{Deserialize, Serialize};

use crate::cadence::{self, Cadence, SamplingPlan};
use crate::delay::apply_delay;
use crate::error::{LightCurveError, Result};
use crate::generator::{generate_with, GeneratorOptions, DAYS_PER_YEAR};
use crate::noise::{perturb, DEFAULT_NOISE_AMPLITUDE};
use crate::record::{FieldValue, LightCurveRecord, FIELD_NAMES};
use crate::signal::{
    sample_step, ProcessParameters, Resolution, Signal, DEFAULT_MEAN_MAGNITUDE, DEFAULT_TIMESCALE,
    DEFAULT_VOLATILITY,
};
use crate::spline::{self, ReconstructOptions};

/// Span reserved ahead of the active segment for delays [day].
pub const BUFFER_DAYS: f64 = 730.0;
/// Span of the active segment [day].
pub const ACTIVE_DAYS: f64 = 3650.0;

/// Optional physical parameters for a fresh curve. `None` means default.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CurveOptions {
    pub meanmag: Option<f64>,
    /// Defaults to `meanmag`.
    pub mag0: Option<f64>,
    pub tau: Option<f64>,
    pub sigma: Option<f64>,
    pub amp_n: Option<f64>,
}

/// Parameter overrides for [`LightCurve::regenerate`]. `None` keeps the
/// current value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProcessOverrides {
    pub seed: Option<i64>,
    pub meanmag: Option<f64>,
    pub mag0: Option<f64>,
    pub tau: Option<f64>,
    pub sigma: Option<f64>,
}

/// What [`LightCurve::sample`] should do.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SampleRequest {
    pub plan: SamplingPlan,
    /// Replaces the stored noise amplitude when present.
    pub amp_n: Option<f64>,
    /// Replaces the stored noise seed when present.
    pub seed_n: Option<i64>,
}

impl SampleRequest {
    pub fn new(plan: SamplingPlan) -> Self {
        Self {
            plan,
            ..Self::default()
        }
    }

    pub fn with_noise_seed(mut self, seed_n: i64) -> Self {
        self.seed_n = Some(seed_n);
        self
    }

    pub fn with_amplitude(mut self, amp_n: f64) -> Self {
        self.amp_n = Some(amp_n);
        self
    }
}

/// One simulated light curve and everything derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LightCurveRecord", into = "LightCurveRecord")]
pub struct LightCurve {
    seed: i64,
    seed_n: i64,
    meanmag: f64,
    mag0: f64,
    tau: f64,
    sigma: f64,
    amp_n: f64,
    tdelay: f64,

    time: Vec<f64>,
    lc: Vec<f64>,
    lc_buff: Vec<f64>,

    time_samp: Vec<f64>,
    lc_samp: Vec<f64>,
    noise: Vec<f64>,

    time_sp: Vec<f64>,
    lc_sp: Vec<f64>,

    daily: bool,
    weekly: bool,
    season: bool,
    usrind: Vec<i32>,
}

/// Buffer/active split of a freshly generated curve.
struct Intrinsic {
    time: Vec<f64>,
    lc: Vec<f64>,
    lc_buff: Vec<f64>,
}

impl Intrinsic {
    fn generate(
        params: &ProcessParameters,
        resolution: Resolution,
        options: &GeneratorOptions,
    ) -> Result<Self> {
        let years = (BUFFER_DAYS + ACTIVE_DAYS) / DAYS_PER_YEAR;
        let Signal { time, value } = generate_with(params, resolution, years, options)?;

        let split = time.partition_point(|&t| t < BUFFER_DAYS);
        let mut lc_buff = value;
        let lc = lc_buff.split_off(split);
        let time = time[..lc.len()].to_vec();
        Ok(Self { time, lc, lc_buff })
    }
}

impl LightCurve {
    /// Generate a fresh curve at 1-day resolution.
    pub fn new(seed: i64, seed_n: i64, options: CurveOptions) -> Result<Self> {
        let meanmag = options.meanmag.unwrap_or(DEFAULT_MEAN_MAGNITUDE);
        let params = ProcessParameters {
            seed,
            mean_magnitude: meanmag,
            initial_magnitude: options.mag0.unwrap_or(meanmag),
            timescale: options.tau.unwrap_or(DEFAULT_TIMESCALE),
            volatility: options.sigma.unwrap_or(DEFAULT_VOLATILITY),
        };
        let amp_n = options.amp_n.unwrap_or(DEFAULT_NOISE_AMPLITUDE);
        validate_amplitude(amp_n)?;

        let intrinsic = Intrinsic::generate(&params, Resolution::Low, &GeneratorOptions::default())?;
        let mut curve = Self {
            seed,
            seed_n,
            meanmag: params.mean_magnitude,
            mag0: params.initial_magnitude,
            tau: params.timescale,
            sigma: params.volatility,
            amp_n,
            tdelay: 0.0,
            time: Vec::new(),
            lc: Vec::new(),
            lc_buff: Vec::new(),
            time_samp: Vec::new(),
            lc_samp: Vec::new(),
            noise: Vec::new(),
            time_sp: Vec::new(),
            lc_sp: Vec::new(),
            daily: false,
            weekly: false,
            season: false,
            usrind: Vec::new(),
        };
        curve.install(intrinsic);
        tracing::info!(seed, seed_n, samples = curve.time.len(), "light curve created");
        Ok(curve)
    }

    /// Restore a curve from a persisted record. No generation happens.
    pub fn from_record(record: LightCurveRecord) -> Result<Self> {
        record.validate()?;
        Ok(Self {
            seed: record.seed,
            seed_n: record.seed_n,
            meanmag: record.meanmag,
            mag0: record.mag0,
            tau: record.tau,
            sigma: record.sigma,
            amp_n: record.amp_n,
            tdelay: record.tdelay,
            time: record.time,
            lc: record.lc,
            lc_buff: record.lc_buff,
            time_samp: record.time_samp,
            lc_samp: record.lc_samp,
            noise: record.noise,
            time_sp: record.time_sp,
            lc_sp: record.lc_sp,
            daily: record.daily,
            weekly: record.weekly,
            season: record.season,
            usrind: record.usrind,
        })
    }

    pub fn to_record(&self) -> LightCurveRecord {
        self.clone().into()
    }

    /// Regenerate the intrinsic curve at `resolution` with full summation.
    ///
    /// Overrides replace the stored parameters only if generation succeeds.
    pub fn regenerate(&mut self, overrides: ProcessOverrides, resolution: Resolution) -> Result<()> {
        self.regenerate_with(overrides, resolution, &GeneratorOptions::default())
    }

    /// [`regenerate`](Self::regenerate) with explicit generator options.
    ///
    /// Fine resolutions over the full 12-year span are quadratic in the
    /// sample count; a truncation window keeps them tractable.
    pub fn regenerate_with(
        &mut self,
        overrides: ProcessOverrides,
        resolution: Resolution,
        options: &GeneratorOptions,
    ) -> Result<()> {
        let params = ProcessParameters {
            seed: overrides.seed.unwrap_or(self.seed),
            mean_magnitude: overrides.meanmag.unwrap_or(self.meanmag),
            initial_magnitude: overrides.mag0.unwrap_or(self.mag0),
            timescale: overrides.tau.unwrap_or(self.tau),
            volatility: overrides.sigma.unwrap_or(self.sigma),
        };
        tracing::info!(seed = params.seed, resolution = ?resolution, "regenerating light curve");
        let intrinsic = Intrinsic::generate(&params, resolution, options)?;

        self.seed = params.seed;
        self.meanmag = params.mean_magnitude;
        self.mag0 = params.initial_magnitude;
        self.tau = params.timescale;
        self.sigma = params.volatility;
        self.install(intrinsic);
        Ok(())
    }

    /// Sample the intrinsic curve and draw a fresh noise realization.
    pub fn sample(&mut self, request: &SampleRequest) -> Result<()> {
        let amp_n = request.amp_n.unwrap_or(self.amp_n);
        let seed_n = request.seed_n.unwrap_or(self.seed_n);
        validate_amplitude(amp_n)?;

        let plan = &request.plan;
        let index = cadence::select_indices(&self.time, plan)?;
        let sampled = cadence::gather(&self.time, &self.lc, &index);
        let noise = perturb(&sampled.value, seed_n, amp_n)?;

        let explicit = plan.index.is_some();
        let mut usrind = vec![0; self.time.len()];
        if explicit {
            for &i in &index {
                usrind[i] = 1;
            }
        }

        tracing::info!(
            cadence = ?plan.cadence,
            season = plan.season,
            explicit,
            samples = sampled.len(),
            seed_n,
            "sampled light curve"
        );

        self.amp_n = amp_n;
        self.seed_n = seed_n;
        self.time_samp = sampled.time;
        self.lc_samp = sampled.value;
        self.noise = noise;
        self.daily = !explicit && plan.cadence == Cadence::Daily;
        self.weekly = !explicit && plan.cadence == Cadence::Weekly;
        self.season = !explicit && plan.season;
        self.usrind = usrind;
        self.reset_spline();
        Ok(())
    }

    /// Fit a spline to the observed curve, weighted by the noise.
    ///
    /// Defaults: the intrinsic time range with `time.len()` points.
    pub fn reconstruct(&mut self, options: &ReconstructOptions) -> Result<()> {
        let range = match options.range {
            Some(range) => range,
            None => self.time_range().ok_or_else(|| {
                LightCurveError::invalid("cannot reconstruct an empty light curve")
            })?,
        };
        let options = ReconstructOptions {
            range: Some(range),
            points: Some(options.points.unwrap_or(self.time.len())),
            smoothing: options.smoothing,
        };

        let fitted = spline::reconstruct(&self.time_samp, &self.observed(), &self.noise, &options)?;
        tracing::debug!(points = fitted.len(), "reconstructed light curve");

        self.time_sp = fitted.time;
        self.lc_sp = fitted.value;
        Ok(())
    }

    /// Delay the intrinsic curve by `days`, relative to its current state.
    ///
    /// `tdelay` accumulates across calls. The observation is reset to the
    /// delayed intrinsic curve with zero noise.
    pub fn add_delay(&mut self, days: f64) -> Result<()> {
        let shift = apply_delay(&self.time, &mut self.lc, days, Some(self.lc_buff.as_mut_slice()))?;
        // apply_delay has already rejected grids without a step.
        let step = sample_step(&self.time).unwrap_or_default();
        self.tdelay += shift as f64 * step;

        let span = self.buffer_span_days();
        if self.tdelay < 0.0 || self.tdelay > span {
            tracing::warn!(
                tdelay = self.tdelay,
                buffer_days = span,
                "cumulative delay exceeds the buffer; rotated samples have wrapped around"
            );
        }
        tracing::info!(days, shift, tdelay = self.tdelay, "added time delay");

        self.reset_observation();
        Ok(())
    }

    /// `lc_samp + noise`.
    pub fn observed(&self) -> Vec<f64> {
        self.lc_samp
            .iter()
            .zip(&self.noise)
            .map(|(m, n)| m + n)
            .collect()
    }

    /// Days of signal held in the delay buffer.
    pub fn buffer_span_days(&self) -> f64 {
        sample_step(&self.time).map_or(0.0, |dt| dt * self.lc_buff.len() as f64)
    }

    pub fn params(&self) -> ProcessParameters {
        ProcessParameters {
            seed: self.seed,
            mean_magnitude: self.meanmag,
            initial_magnitude: self.mag0,
            timescale: self.tau,
            volatility: self.sigma,
        }
    }

    /// Look up a field by its record name.
    pub fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        let value = match name {
            "seed" => FieldValue::Int(self.seed),
            "meanmag" => FieldValue::Float(self.meanmag),
            "mag0" => FieldValue::Float(self.mag0),
            "tau" => FieldValue::Float(self.tau),
            "sigma" => FieldValue::Float(self.sigma),
            "time" => FieldValue::Floats(&self.time),
            "lc" => FieldValue::Floats(&self.lc),
            "time_samp" => FieldValue::Floats(&self.time_samp),
            "lc_samp" => FieldValue::Floats(&self.lc_samp),
            "noise" => FieldValue::Floats(&self.noise),
            "time_sp" => FieldValue::Floats(&self.time_sp),
            "lc_sp" => FieldValue::Floats(&self.lc_sp),
            "daily" => FieldValue::Bool(self.daily),
            "weekly" => FieldValue::Bool(self.weekly),
            "season" => FieldValue::Bool(self.season),
            "usrind" => FieldValue::Ints(&self.usrind),
            "seed_n" => FieldValue::Int(self.seed_n),
            "amp_n" => FieldValue::Float(self.amp_n),
            "tdelay" => FieldValue::Float(self.tdelay),
            "lc_buff" => FieldValue::Floats(&self.lc_buff),
            _ => return None,
        };
        Some(value)
    }

    /// All fields in canonical order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, FieldValue<'_>)> + '_ {
        FIELD_NAMES
            .iter()
            .filter_map(move |&name| self.field(name).map(|value| (name, value)))
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }
    pub fn seed_n(&self) -> i64 {
        self.seed_n
    }
    pub fn meanmag(&self) -> f64 {
        self.meanmag
    }
    pub fn mag0(&self) -> f64 {
        self.mag0
    }
    pub fn tau(&self) -> f64 {
        self.tau
    }
    pub fn sigma(&self) -> f64 {
        self.sigma
    }
    pub fn amp_n(&self) -> f64 {
        self.amp_n
    }
    /// Total delay applied since the last (re)generation [day].
    pub fn tdelay(&self) -> f64 {
        self.tdelay
    }
    pub fn time(&self) -> &[f64] {
        &self.time
    }
    pub fn lc(&self) -> &[f64] {
        &self.lc
    }
    pub fn lc_buff(&self) -> &[f64] {
        &self.lc_buff
    }
    pub fn time_samp(&self) -> &[f64] {
        &self.time_samp
    }
    pub fn lc_samp(&self) -> &[f64] {
        &self.lc_samp
    }
    pub fn noise(&self) -> &[f64] {
        &self.noise
    }
    pub fn time_sp(&self) -> &[f64] {
        &self.time_sp
    }
    pub fn lc_sp(&self) -> &[f64] {
        &self.lc_sp
    }
    pub fn daily(&self) -> bool {
        self.daily
    }
    pub fn weekly(&self) -> bool {
        self.weekly
    }
    pub fn season(&self) -> bool {
        self.season
    }
    pub fn usrind(&self) -> &[i32] {
        &self.usrind
    }

    fn time_range(&self) -> Option<(f64, f64)> {
        let lo = self.time.iter().copied().reduce(f64::min)?;
        let hi = self.time.iter().copied().reduce(f64::max)?;
        Some((lo, hi))
    }

    fn install(&mut self, intrinsic: Intrinsic) {
        self.time = intrinsic.time;
        self.lc = intrinsic.lc;
        self.lc_buff = intrinsic.lc_buff;
        self.tdelay = 0.0;
        self.reset_observation();
    }

    fn reset_observation(&mut self) {
        self.time_samp = self.time.clone();
        self.lc_samp = self.lc.clone();
        self.noise = vec![0.0; self.lc_samp.len()];
        self.daily = false;
        self.weekly = false;
        self.season = false;
        self.usrind = vec![0; self.time.len()];
        self.reset_spline();
    }

    fn reset_spline(&mut self) {
        self.time_sp = vec![0.0; self.time.len()];
        self.lc_sp = vec![0.0; self.lc.len()];
    }
}

fn validate_amplitude(amp_n: f64) -> Result<()> {
    if amp_n.is_finite() && amp_n >= 0.0 {
        Ok(())
    } else {
        Err(LightCurveError::invalid(format!(
            "noise amplitude must be a non-negative fraction, got {amp_n}"
        )))
    }
}

impl TryFrom<LightCurveRecord> for LightCurve {
    type Error = LightCurveError;

    fn try_from(record: LightCurveRecord) -> Result<Self> {
        Self::from_record(record)
    }
}

impl From<LightCurve> for LightCurveRecord {
    fn from(c: LightCurve) -> Self {
        Self {
            seed: c.seed,
            meanmag: c.meanmag,
            mag0: c.mag0,
            tau: c.tau,
            sigma: c.sigma,
            time: c.time,
            lc: c.lc,
            time_samp: c.time_samp,
            lc_samp: c.lc_samp,
            noise: c.noise,
            time_sp: c.time_sp,
            lc_sp: c.lc_sp,
            daily: c.daily,
            weekly: c.weekly,
            season: c.season,
            usrind: c.usrind,
            seed_n: c.seed_n,
            amp_n: c.amp_n,
            tdelay: c.tdelay,
            lc_buff: c.lc_buff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> LightCurve {
        LightCurve::new(
            111,
            222,
            CurveOptions {
                meanmag: Some(21.2),
                mag0: Some(22.5),
                tau: Some(350.0),
                sigma: Some(7.5e-3),
                amp_n: Some(0.01),
            },
        )
        .unwrap()
    }

    #[test]
    fn fresh_curve_layout() {
        let c = fresh();
        assert_eq!(c.time().len(), 3650);
        assert_eq!(c.lc().len(), 3650);
        assert_eq!(c.lc_buff().len(), 730);
        assert_eq!(c.time()[0], 0.0);
        assert_eq!(c.time()[3649], 3649.0);
        assert_eq!(c.time_samp(), c.time());
        assert_eq!(c.lc_samp(), c.lc());
        assert!(c.noise().iter().all(|&n| n == 0.0));
        assert_eq!(c.lc_sp().len(), 3650);
        assert_eq!(c.usrind().len(), 3650);
        assert_eq!(c.tdelay(), 0.0);
        assert!(!c.daily() && !c.weekly() && !c.season());
    }

    #[test]
    fn defaults_fill_absent_parameters() {
        let c = LightCurve::new(1, 2, CurveOptions::default()).unwrap();
        assert_eq!(c.meanmag(), 20.0);
        assert_eq!(c.mag0(), 20.0);
        assert_eq!(c.tau(), DEFAULT_TIMESCALE);
        assert_eq!(c.sigma(), 8e-3);
        assert_eq!(c.amp_n(), 0.03);
    }

    #[test]
    fn explicit_zero_amplitude_is_kept() {
        let c = LightCurve::new(
            1,
            2,
            CurveOptions {
                amp_n: Some(0.0),
                mag0: Some(0.0),
                ..CurveOptions::default()
            },
        )
        .unwrap();
        assert_eq!(c.amp_n(), 0.0);
        assert_eq!(c.mag0(), 0.0);
    }

    #[test]
    fn buffer_precedes_active_segment() {
        // The buffer ends where the active segment begins on the original grid.
        let c = fresh();
        let full = crate::generator::generate(&c.params(), Resolution::Low, 12.0).unwrap();
        assert_eq!(c.lc_buff(), &full.value[..730]);
        assert_eq!(c.lc(), &full.value[730..]);
    }

    #[test]
    fn sample_sets_flags_and_noise() {
        let mut c = fresh();
        c.sample(&SampleRequest::new(SamplingPlan::cadence(Cadence::Weekly).with_season()))
            .unwrap();
        assert!(c.weekly() && c.season() && !c.daily());
        assert_eq!(c.time_samp().len(), c.noise().len());
        assert_eq!(c.time_samp().len(), c.lc_samp().len());
        assert!(c.time_samp().iter().all(|t| t % 7.0 == 0.0 && t % 365.0 < 120.0));
        assert!(c.noise().iter().any(|&n| n != 0.0));
        assert!(c.lc_sp().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn sample_with_indices_records_mask() {
        let mut c = fresh();
        let req = SampleRequest::new(SamplingPlan::indices(vec![5, 1, 9])).with_noise_seed(54);
        c.sample(&req).unwrap();
        assert_eq!(c.time_samp(), &[1.0, 5.0, 9.0]);
        assert_eq!(c.seed_n(), 54);
        assert_eq!(c.usrind().iter().filter(|&&m| m == 1).count(), 3);
        assert_eq!(c.usrind()[5], 1);
        assert!(!c.weekly());
    }

    #[test]
    fn failed_sample_leaves_state_untouched() {
        let mut c = fresh();
        let before = c.clone();
        assert!(c.sample(&SampleRequest::new(SamplingPlan::indices(vec![99_999]))).is_err());
        assert!(c
            .sample(&SampleRequest::new(SamplingPlan::default()).with_amplitude(-1.0))
            .is_err());
        assert_eq!(c, before);
    }

    #[test]
    fn add_delay_accumulates_and_resets_observation() {
        let mut c = fresh();
        let lc0 = c.lc().to_vec();
        let buff0 = c.lc_buff().to_vec();
        c.sample(&SampleRequest::new(SamplingPlan::cadence(Cadence::Weekly))).unwrap();

        c.add_delay(10.0).unwrap();
        c.add_delay(5.0).unwrap();
        assert_eq!(c.tdelay(), 15.0);
        assert_eq!(&c.lc()[15..], &lc0[..lc0.len() - 15]);
        assert_eq!(&c.lc()[..15], &buff0[buff0.len() - 15..]);
        assert_eq!(c.lc_samp(), c.lc());
        assert!(c.noise().iter().all(|&n| n == 0.0));
        assert!(!c.weekly());

        c.add_delay(-15.0).unwrap();
        assert_eq!(c.tdelay(), 0.0);
        assert_eq!(c.lc(), &lc0[..]);
        assert_eq!(c.lc_buff(), &buff0[..]);
    }

    #[test]
    fn sub_step_delay_is_rejected_without_mutation() {
        let mut c = fresh();
        let before = c.clone();
        let err = c.add_delay(0.37).unwrap_err();
        assert!(matches!(err, LightCurveError::InsufficientResolution { .. }));
        assert_eq!(c, before);
    }

    #[test]
    fn regenerate_resets_everything_derived() {
        let mut c = fresh();
        c.add_delay(3.0).unwrap();
        c.sample(&SampleRequest::new(SamplingPlan::cadence(Cadence::Weekly))).unwrap();

        c.regenerate(
            ProcessOverrides {
                seed: Some(7),
                ..ProcessOverrides::default()
            },
            Resolution::Low,
        )
        .unwrap();

        assert_eq!(c.seed(), 7);
        assert_eq!(c.tdelay(), 0.0);
        assert_eq!(c.lc_samp(), c.lc());
        assert_eq!(c.time_samp().len(), 3650);
        assert!(c.noise().iter().all(|&n| n == 0.0));
        assert!(c.lc_sp().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn finer_resolution_allows_fractional_delays() {
        let mut c = fresh();
        assert!(c.add_delay(14.7).is_err());

        c.regenerate_with(
            ProcessOverrides {
                tau: Some(10.0),
                ..ProcessOverrides::default()
            },
            Resolution::Medium,
            &GeneratorOptions::truncated(5.0),
        )
        .unwrap();
        assert_eq!(c.time().len(), 36_500);
        assert_eq!(c.lc_buff().len(), 7_300);
        assert!((c.buffer_span_days() - 730.0).abs() < 1e-6);

        c.add_delay(14.7).unwrap();
        assert!((c.tdelay() - 14.7).abs() < 1e-9);
    }

    #[test]
    fn sub_step_delay_on_a_long_shift_is_rejected() {
        let mut c = fresh();
        let before = c.clone();
        assert!(matches!(
            c.add_delay(600.004),
            Err(LightCurveError::InsufficientResolution { .. })
        ));
        assert_eq!(c, before);

        c.add_delay(600.000_001).unwrap();
        assert_eq!(c.tdelay(), 600.0);
    }

    #[test]
    fn sampling_fails_when_noise_drives_flux_negative() {
        let mut c = fresh();
        let before = c.clone();
        let request = SampleRequest::new(SamplingPlan::default()).with_amplitude(0.5);
        assert!(matches!(
            c.sample(&request),
            Err(LightCurveError::InvalidParameter(_))
        ));
        assert_eq!(c, before);
    }

    #[test]
    fn failed_regenerate_keeps_prior_state() {
        let mut c = fresh();
        let before = c.clone();
        let err = c
            .regenerate(
                ProcessOverrides {
                    tau: Some(-1.0),
                    ..ProcessOverrides::default()
                },
                Resolution::Low,
            )
            .unwrap_err();
        assert!(matches!(err, LightCurveError::InvalidParameter(_)));
        assert_eq!(c, before);
    }

    #[test]
    fn reconstruct_fills_regular_grid() {
        let mut c = fresh();
        c.sample(&SampleRequest::new(SamplingPlan::cadence(Cadence::Weekly))).unwrap();
        c.reconstruct(&ReconstructOptions::default()).unwrap();

        assert_eq!(c.time_sp().len(), c.time().len());
        assert_eq!(c.time_sp()[0], 0.0);
        assert_eq!(*c.time_sp().last().unwrap(), 3649.0);
        // Interpolates the observed points.
        let observed = c.observed();
        for (t, y) in c.time_samp().iter().zip(&observed).take(20) {
            let i = *t as usize;
            assert!((c.lc_sp()[i] - y).abs() < 1e-9);
        }
    }

    #[test]
    fn fields_follow_canonical_order() {
        let c = fresh();
        let names: Vec<&str> = c.fields().map(|(n, _)| n).collect();
        assert_eq!(names, FIELD_NAMES.to_vec());
        assert_eq!(c.field("seed"), Some(FieldValue::Int(111)));
        assert_eq!(c.field("lc_buff").map(|v| v.len()), Some(730));
        assert!(c.field("dtype").is_none());
    }

    #[test]
    fn record_round_trip_restores_exactly() {
        let mut c = fresh();
        c.add_delay(4.0).unwrap();
        c.sample(&SampleRequest::new(SamplingPlan::cadence(Cadence::Daily))).unwrap();
        let restored = LightCurve::from_record(c.to_record()).unwrap();
        assert_eq!(restored, c);
    }

    #[test]
    fn restore_rejects_broken_records() {
        let mut record = fresh().to_record();
        record.noise.pop();
        assert!(matches!(
            LightCurve::from_record(record),
            Err(LightCurveError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn clones_are_independent() {
        let a = fresh();
        let mut b = a.clone();
        b.add_delay(14.0).unwrap();
        assert_eq!(a.tdelay(), 0.0);
        assert_ne!(a.lc(), b.lc());
    }
}
