//! Serializable simulation configuration.
//!
//! ```toml
//! [process]
//! seed = 111
//! tau = 350.0
//! resolution = "medium"
//!
//! [noise]
//! seed = 222
//! amp = 0.03
//!
//! [sampling]
//! cadence = "weekly"
//! season = true
//!
//! [[images]]
//! label = "A"
//! delay = 0.0
//!
//! [[images]]
//! label = "B"
//! delay = 14.7
//!
//! [output]
//! dir = "out"
//! name = "rung0_pair1"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tdsim_core::record::MAX_CURVES;
use tdsim_core::{Cadence, CurveOptions, GeneratorOptions, ProcessOverrides, Resolution};

use crate::error::{Result, StoreError};
use crate::good::GoodFormat;

/// Content hash of a configuration.
pub type ConfigHash = String;

/// Everything needed to reproduce one lensed system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub process: ProcessConfig,
    #[serde(default)]
    pub noise: NoiseConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    pub images: Vec<ImageConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Intrinsic process parameters. Absent values take the engine defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProcessConfig {
    pub seed: i64,
    pub meanmag: Option<f64>,
    pub mag0: Option<f64>,
    pub tau: Option<f64>,
    pub sigma: Option<f64>,
    /// Resolution to regenerate at. Absent keeps the 1-day grid.
    pub resolution: Option<Resolution>,
    /// Truncation window for regeneration, in units of tau.
    pub truncate_after: Option<f64>,
}

impl ProcessConfig {
    pub fn curve_options(&self, amp_n: Option<f64>) -> CurveOptions {
        CurveOptions {
            meanmag: self.meanmag,
            mag0: self.mag0,
            tau: self.tau,
            sigma: self.sigma,
            amp_n,
        }
    }

    pub fn overrides(&self) -> ProcessOverrides {
        ProcessOverrides {
            seed: Some(self.seed),
            meanmag: self.meanmag,
            mag0: self.mag0,
            tau: self.tau,
            sigma: self.sigma,
        }
    }

    pub fn generator_options(&self) -> GeneratorOptions {
        GeneratorOptions {
            truncate_after: self.truncate_after,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Base noise seed; image `i` defaults to `seed + i`.
    #[serde(default)]
    pub seed: i64,
    /// Fractional flux error; absent means 3%.
    pub amp: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SamplingConfig {
    #[serde(default)]
    pub cadence: Cadence,
    #[serde(default)]
    pub season: bool,
}

/// One lensed image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageConfig {
    pub label: String,
    /// Delay relative to the intrinsic curve [day].
    #[serde(default)]
    pub delay: f64,
    /// Overrides the derived per-image noise seed.
    pub noise_seed: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub name: String,
    /// Write the observed record as text instead of Parquet.
    pub ascii: bool,
    pub overwrite: bool,
    /// Also write one full record per image.
    pub evil: bool,
    /// Fit a spline to each image after sampling.
    pub reconstruct: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            name: "lensed_system".to_string(),
            ascii: false,
            overwrite: false,
            evil: false,
            reconstruct: false,
        }
    }
}

impl OutputConfig {
    pub fn good_format(&self) -> GoodFormat {
        if self.ascii {
            GoodFormat::Ascii
        } else {
            GoodFormat::Parquet
        }
    }
}

impl SimulationConfig {
    /// Load and validate a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML content.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| StoreError::Config(format!("failed to parse config TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| StoreError::Config(format!("failed to serialize config: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        if self.images.is_empty() {
            return Err(StoreError::Config("at least one image is required".into()));
        }
        if self.images.len() > MAX_CURVES {
            return Err(StoreError::Config(format!(
                "at most {MAX_CURVES} images are supported, got {}",
                self.images.len()
            )));
        }
        let mut seen = HashSet::new();
        for image in &self.images {
            if image.label.trim().is_empty() {
                return Err(StoreError::Config("image labels must not be empty".into()));
            }
            if !seen.insert(image.label.as_str()) {
                return Err(StoreError::Config(format!(
                    "duplicate image label '{}'",
                    image.label
                )));
            }
            if !image.delay.is_finite() {
                return Err(StoreError::Config(format!(
                    "image '{}' has a non-finite delay",
                    image.label
                )));
            }
        }
        if self.output.name.trim().is_empty() {
            return Err(StoreError::Config("output name must not be empty".into()));
        }
        Ok(())
    }

    /// BLAKE3 hash of the canonical JSON form, recorded in metadata sidecars.
    pub fn config_hash(&self) -> Result<ConfigHash> {
        let json = serde_json::to_string(self)
            .map_err(|e| StoreError::Config(format!("config serialization failed: {e}")))?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    /// Noise seed for the image at `index`.
    pub fn noise_seed(&self, index: usize) -> i64 {
        self.images
            .get(index)
            .and_then(|img| img.noise_seed)
            .unwrap_or_else(|| self.noise.seed.wrapping_add(index as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAIR: &str = r#"
        [process]
        seed = 111
        tau = 350.0
        resolution = "low"

        [noise]
        seed = 222
        amp = 0.01

        [sampling]
        cadence = "weekly"
        season = true

        [[images]]
        label = "A"

        [[images]]
        label = "B"
        delay = 14.0
        noise_seed = 99

        [output]
        dir = "out"
        name = "pair"
        ascii = true
    "#;

    #[test]
    fn parses_a_full_config() {
        let c = SimulationConfig::from_toml(PAIR).unwrap();
        assert_eq!(c.process.seed, 111);
        assert_eq!(c.process.tau, Some(350.0));
        assert_eq!(c.process.sigma, None);
        assert_eq!(c.process.resolution, Some(Resolution::Low));
        assert_eq!(c.sampling.cadence, Cadence::Weekly);
        assert!(c.sampling.season);
        assert_eq!(c.images.len(), 2);
        assert_eq!(c.images[0].delay, 0.0);
        assert_eq!(c.output.good_format(), GoodFormat::Ascii);
    }

    #[test]
    fn noise_seeds_derive_from_the_base() {
        let c = SimulationConfig::from_toml(PAIR).unwrap();
        assert_eq!(c.noise_seed(0), 222);
        assert_eq!(c.noise_seed(1), 99);
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let c = SimulationConfig::from_toml(
            r#"
            [process]
            seed = 1
            [[images]]
            label = "A"
            "#,
        )
        .unwrap();
        assert_eq!(c.sampling.cadence, Cadence::Intrinsic);
        assert_eq!(c.noise.amp, None);
        assert_eq!(c.output.name, "lensed_system");
        assert!(!c.output.overwrite);
    }

    #[test]
    fn config_hash_is_deterministic_and_sensitive() {
        let a = SimulationConfig::from_toml(PAIR).unwrap();
        let mut b = a.clone();
        assert_eq!(a.config_hash().unwrap(), b.config_hash().unwrap());
        b.images[1].delay = 15.0;
        assert_ne!(a.config_hash().unwrap(), b.config_hash().unwrap());
    }

    #[test]
    fn toml_round_trip() {
        let a = SimulationConfig::from_toml(PAIR).unwrap();
        let b = SimulationConfig::from_toml(&a.to_toml().unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_invalid_image_sets() {
        let five = (0..5)
            .map(|i| format!("[[images]]\nlabel = \"I{i}\"\n"))
            .collect::<String>();
        let err = SimulationConfig::from_toml(&format!("[process]\nseed = 1\n{five}")).unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));

        let dup = "[process]\nseed = 1\n[[images]]\nlabel = \"A\"\n[[images]]\nlabel = \"A\"\n";
        assert!(matches!(
            SimulationConfig::from_toml(dup),
            Err(StoreError::Config(_))
        ));

        let none = "images = []\n[process]\nseed = 1\n";
        assert!(SimulationConfig::from_toml(none).is_err());
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        assert!(matches!(
            SimulationConfig::from_toml("[process\nseed = "),
            Err(StoreError::Config(_))
        ));
    }
}
