//! Persisted record shapes.
//!
//! Two record kinds exist:
//! - **evil**: every field of a [`LightCurve`](crate::LightCurve), enough to
//!   restore the entity exactly ([`LightCurveRecord`], [`FieldValue`]).
//! - **good**: observed curves only, for up to four labeled images
//!   ([`ObservedSet`]), converted to nanomaggies on the way out.
//!
//! This module fixes the data each record carries. The physical encodings
//! (Parquet, fixed-width text) live in `tdsim-io`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ensure_len, LightCurveError, Result};
use crate::noise::DEFAULT_NOISE_AMPLITUDE;

/// Record kinds understood by the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Observed curves only.
    Good,
    /// Full entity state.
    Evil,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Good => "good",
            RecordKind::Evil => "evil",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = LightCurveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "good" => Ok(RecordKind::Good),
            "evil" => Ok(RecordKind::Evil),
            _ => Err(LightCurveError::UnsupportedRecordType(s.to_string())),
        }
    }
}

// ── Full record ──────────────────────────────────────────────────────

/// Canonical field order of the full record.
pub const FIELD_NAMES: [&str; 20] = [
    "seed",
    "meanmag",
    "mag0",
    "tau",
    "sigma",
    "time",
    "lc",
    "time_samp",
    "lc_samp",
    "noise",
    "time_sp",
    "lc_sp",
    "daily",
    "weekly",
    "season",
    "usrind",
    "seed_n",
    "amp_n",
    "tdelay",
    "lc_buff",
];

/// Unit string for each field, in the order of [`FIELD_NAMES`].
pub fn field_unit(name: &str) -> Option<&'static str> {
    let unit = match name {
        "seed" | "seed_n" | "daily" | "weekly" | "season" | "usrind" | "amp_n" => "none",
        "meanmag" | "mag0" | "lc" | "lc_samp" | "lc_sp" | "lc_buff" => "mag",
        "tau" | "time" | "time_samp" | "time_sp" | "tdelay" => "day",
        "sigma" => "mag day^(-1/2)",
        "noise" => "Delta mag",
        _ => return None,
    };
    Some(unit)
}

/// A borrowed view of one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Int(i64),
    Float(f64),
    Bool(bool),
    Floats(&'a [f64]),
    Ints(&'a [i32]),
}

impl FieldValue<'_> {
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            FieldValue::Float(v) => Some(v),
            FieldValue::Int(v) => Some(v as f64),
            _ => None,
        }
    }

    pub fn as_floats(&self) -> Option<&[f64]> {
        match self {
            FieldValue::Floats(v) => Some(v),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            FieldValue::Floats(v) => v.len(),
            FieldValue::Ints(v) => v.len(),
            _ => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owned, plain-data form of the full record.
///
/// Field names match [`FIELD_NAMES`]. Converting into a
/// [`LightCurve`](crate::LightCurve) checks every length invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightCurveRecord {
    pub seed: i64,
    pub meanmag: f64,
    pub mag0: f64,
    pub tau: f64,
    pub sigma: f64,
    pub time: Vec<f64>,
    pub lc: Vec<f64>,
    pub time_samp: Vec<f64>,
    pub lc_samp: Vec<f64>,
    pub noise: Vec<f64>,
    pub time_sp: Vec<f64>,
    pub lc_sp: Vec<f64>,
    pub daily: bool,
    pub weekly: bool,
    pub season: bool,
    pub usrind: Vec<i32>,
    pub seed_n: i64,
    pub amp_n: f64,
    pub tdelay: f64,
    pub lc_buff: Vec<f64>,
}

impl LightCurveRecord {
    /// Check the array-length invariants of the entity.
    pub fn validate(&self) -> Result<()> {
        ensure_len("lc", self.time.len(), self.lc.len())?;
        ensure_len("lc_samp", self.time_samp.len(), self.lc_samp.len())?;
        ensure_len("noise", self.time_samp.len(), self.noise.len())?;
        ensure_len("lc_sp", self.time_sp.len(), self.lc_sp.len())?;
        ensure_len("usrind", self.time.len(), self.usrind.len())?;
        Ok(())
    }
}

// ── Observed-only record ─────────────────────────────────────────────

/// Maximum number of labeled curves in an observed-only record.
pub const MAX_CURVES: usize = 4;

/// Labels of the curves, in order.
pub const CURVE_LABELS: [&str; MAX_CURVES] = ["A", "B", "C", "D"];

/// AB zero point used for the flux conversion (nanomaggies).
pub const NANOMAGGIE_ZERO_POINT: f64 = 22.5;

/// AB magnitude to nanomaggies.
pub fn mag_to_nanomaggies(mag: f64) -> f64 {
    10f64.powf(-0.4 * (mag - NANOMAGGIE_ZERO_POINT))
}

/// Shared time base plus one magnitude curve and error fraction per image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedSet {
    time: Vec<f64>,
    curves: Vec<Vec<f64>>,
    error_fractions: Vec<f64>,
}

impl ObservedSet {
    /// Validate and assemble an observed set.
    ///
    /// `error_fractions` defaults to 3% per curve.
    pub fn new(
        time: Vec<f64>,
        curves: Vec<Vec<f64>>,
        error_fractions: Option<Vec<f64>>,
    ) -> Result<Self> {
        if curves.len() > MAX_CURVES {
            return Err(LightCurveError::TooManyCurves {
                count: curves.len(),
                max: MAX_CURVES,
            });
        }
        if curves.is_empty() {
            return Err(LightCurveError::invalid("an observed set needs at least one curve"));
        }
        for (label, curve) in CURVE_LABELS.iter().zip(&curves) {
            ensure_len(&format!("curve {label}"), time.len(), curve.len())?;
        }
        let error_fractions =
            error_fractions.unwrap_or_else(|| vec![DEFAULT_NOISE_AMPLITUDE; curves.len()]);
        ensure_len("error fractions", curves.len(), error_fractions.len())?;
        if error_fractions.iter().any(|e| !(e.is_finite() && *e >= 0.0)) {
            return Err(LightCurveError::invalid(
                "error fractions must be non-negative",
            ));
        }
        Ok(Self {
            time,
            curves,
            error_fractions,
        })
    }

    pub fn time(&self) -> &[f64] {
        &self.time
    }

    pub fn curves(&self) -> &[Vec<f64>] {
        &self.curves
    }

    pub fn error_fractions(&self) -> &[f64] {
        &self.error_fractions
    }

    /// Per-curve `(label, flux, flux_error)` in nanomaggies.
    pub fn to_flux(&self) -> Vec<FluxCurve> {
        CURVE_LABELS
            .iter()
            .zip(self.curves.iter().zip(&self.error_fractions))
            .map(|(label, (curve, &frac))| {
                let flux: Vec<f64> = curve.iter().map(|&m| mag_to_nanomaggies(m)).collect();
                let error = flux.iter().map(|f| f * frac).collect();
                FluxCurve {
                    label: (*label).to_string(),
                    flux,
                    error,
                }
            })
            .collect()
    }
}

/// One labeled curve in nanomaggies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluxCurve {
    pub label: String,
    pub flux: Vec<f64>,
    pub error: Vec<f64>,
}

/// An observed-only record as read back from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedFlux {
    pub time: Vec<f64>,
    pub curves: Vec<FluxCurve>,
}

impl ObservedFlux {
    pub fn validate(&self) -> Result<()> {
        if self.curves.len() > MAX_CURVES {
            return Err(LightCurveError::TooManyCurves {
                count: self.curves.len(),
                max: MAX_CURVES,
            });
        }
        for c in &self.curves {
            ensure_len(&format!("lc_{}", c.label), self.time.len(), c.flux.len())?;
            ensure_len(&format!("err_{}", c.label), self.time.len(), c.error.len())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_kind_parsing() {
        assert_eq!("good".parse::<RecordKind>().unwrap(), RecordKind::Good);
        assert_eq!(" EVIL ".parse::<RecordKind>().unwrap(), RecordKind::Evil);
        assert!(matches!(
            "ugly".parse::<RecordKind>(),
            Err(LightCurveError::UnsupportedRecordType(s)) if s == "ugly"
        ));
        assert_eq!(RecordKind::Evil.to_string(), "evil");
    }

    #[test]
    fn every_field_has_a_unit() {
        for name in FIELD_NAMES {
            assert!(field_unit(name).is_some(), "{name}");
        }
        assert!(field_unit("dtype").is_none());
    }

    #[test]
    fn five_curves_are_too_many() {
        let time = vec![0.0, 1.0];
        let curves = vec![vec![20.0, 20.0]; 5];
        assert_eq!(
            ObservedSet::new(time, curves, None).unwrap_err(),
            LightCurveError::TooManyCurves { count: 5, max: 4 }
        );
    }

    #[test]
    fn curve_and_error_lengths_are_checked() {
        let err = ObservedSet::new(vec![0.0, 1.0], vec![vec![20.0]], None).unwrap_err();
        assert!(matches!(err, LightCurveError::ShapeMismatch { .. }));

        let err = ObservedSet::new(
            vec![0.0],
            vec![vec![20.0], vec![21.0]],
            Some(vec![0.01]),
        )
        .unwrap_err();
        assert!(matches!(err, LightCurveError::ShapeMismatch { .. }));
    }

    #[test]
    fn flux_conversion_uses_ab_nanomaggies() {
        let set = ObservedSet::new(
            vec![0.0, 1.0],
            vec![vec![22.5, 20.0], vec![25.0, 22.5]],
            Some(vec![0.1, 0.02]),
        )
        .unwrap();
        let flux = set.to_flux();

        assert_eq!(flux.len(), 2);
        assert_eq!(flux[0].label, "A");
        assert_eq!(flux[1].label, "B");
        assert!((flux[0].flux[0] - 1.0).abs() < 1e-12);
        assert!((flux[0].flux[1] - 10.0).abs() < 1e-9);
        assert!((flux[0].error[1] - 1.0).abs() < 1e-9);
        assert!((flux[1].flux[0] - 0.1).abs() < 1e-12);
        assert!((flux[1].error[1] - 0.02).abs() < 1e-12);
    }

    #[test]
    fn default_error_fraction_is_three_percent() {
        let set = ObservedSet::new(vec![0.0], vec![vec![20.0]], None).unwrap();
        assert_eq!(set.error_fractions(), &[0.03]);
    }
}
