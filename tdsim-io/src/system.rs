//! Lensed-system runner: one intrinsic curve, up to four delayed images.
//!
//! Every image is a deep copy of the same intrinsic realization, shifted by
//! its own delay and observed with the shared cadence but its own noise
//! seed. The observed images together form the good record.

use std::path::PathBuf;

use tdsim_core::{LightCurve, ObservedSet, ReconstructOptions, SampleRequest, SamplingPlan};

use crate::config::{ConfigHash, OutputConfig, SimulationConfig};
use crate::error::{Result, StoreError};
use crate::evil::write_evil;
use crate::good::write_good;
use crate::meta::WriteOptions;

/// One simulated image of the lensed quasar.
#[derive(Debug, Clone, PartialEq)]
pub struct LensedImage {
    pub label: String,
    pub curve: LightCurve,
}

/// The result of [`run_system`].
#[derive(Debug, Clone, PartialEq)]
pub struct LensedSystem {
    pub config_hash: ConfigHash,
    pub images: Vec<LensedImage>,
}

impl LensedSystem {
    /// Observed curves of all images on the shared sampled time base.
    pub fn observed_set(&self) -> Result<ObservedSet> {
        let first = self
            .images
            .first()
            .ok_or_else(|| StoreError::Config("lensed system has no images".into()))?;
        let time = first.curve.time_samp().to_vec();
        let curves = self.images.iter().map(|img| img.curve.observed()).collect();
        let errors = self.images.iter().map(|img| img.curve.amp_n()).collect();
        Ok(ObservedSet::new(time, curves, Some(errors))?)
    }

    pub fn image(&self, label: &str) -> Option<&LensedImage> {
        self.images.iter().find(|img| img.label == label)
    }
}

/// Simulate every image described by `config`.
pub fn run_system(config: &SimulationConfig) -> Result<LensedSystem> {
    config.validate()?;
    let config_hash = config.config_hash()?;
    let process = &config.process;

    let mut intrinsic = LightCurve::new(
        process.seed,
        config.noise_seed(0),
        process.curve_options(config.noise.amp),
    )?;
    if let Some(resolution) = process.resolution {
        intrinsic.regenerate_with(process.overrides(), resolution, &process.generator_options())?;
    }

    let plan = SamplingPlan {
        cadence: config.sampling.cadence,
        season: config.sampling.season,
        ..SamplingPlan::default()
    };

    let mut images = Vec::with_capacity(config.images.len());
    for (index, image) in config.images.iter().enumerate() {
        let mut curve = intrinsic.clone();
        if image.delay != 0.0 {
            curve.add_delay(image.delay)?;
        }
        curve.sample(&SampleRequest::new(plan.clone()).with_noise_seed(config.noise_seed(index)))?;
        if config.output.reconstruct {
            curve.reconstruct(&ReconstructOptions::default())?;
        }
        tracing::info!(
            label = %image.label,
            delay = image.delay,
            samples = curve.time_samp().len(),
            "simulated image"
        );
        images.push(LensedImage {
            label: image.label.clone(),
            curve,
        });
    }

    Ok(LensedSystem {
        config_hash,
        images,
    })
}

/// Persist `system` under `output.dir`. Returns the record paths written.
///
/// Always writes `<name>.<ext>` (the good record); with `output.evil`, also
/// writes `<name>_<label>.evil.parquet` per image.
pub fn write_system(system: &LensedSystem, output: &OutputConfig) -> Result<Vec<PathBuf>> {
    let options = WriteOptions {
        overwrite: output.overwrite,
        config_hash: Some(system.config_hash.clone()),
    };
    let format = output.good_format();
    let mut written = Vec::new();

    let good_path = output
        .dir
        .join(format!("{}.{}", output.name, format.extension()));
    write_good(&good_path, &system.observed_set()?, format, &options)?;
    written.push(good_path);

    if output.evil {
        for image in &system.images {
            let path = output
                .dir
                .join(format!("{}_{}.evil.parquet", output.name, image.label));
            write_evil(&path, &image.curve, &options)?;
            written.push(path);
        }
    }

    tracing::info!(dir = %output.dir.display(), files = written.len(), "lensed system written");
    Ok(written)
}
