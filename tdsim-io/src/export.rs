//! CSV export of observed samples.
//!
//! Columns: time, lc, noise, observed (= lc + noise). Values are written
//! with full precision so the export can be re-read losslessly.

use std::path::Path;

use tdsim_core::LightCurve;

use crate::error::{Result, StoreError};
use crate::meta::write_atomic;

/// Render the sampled curve of `curve` as CSV.
pub fn export_samples_csv(curve: &LightCurve) -> Result<String> {
    let csv_err = |e: csv::Error| StoreError::Format(format!("csv: {e}"));
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["time", "lc", "noise", "observed"])
        .map_err(csv_err)?;

    let observed = curve.observed();
    for (((t, lc), n), obs) in curve
        .time_samp()
        .iter()
        .zip(curve.lc_samp())
        .zip(curve.noise())
        .zip(&observed)
    {
        wtr.write_record([t.to_string(), lc.to_string(), n.to_string(), obs.to_string()])
            .map_err(csv_err)?;
    }

    let data = wtr
        .into_inner()
        .map_err(|e| StoreError::Format(format!("failed to flush CSV writer: {e}")))?;
    String::from_utf8(data).map_err(|e| StoreError::Format(format!("CSV output is not valid UTF-8: {e}")))
}

/// Write the sampled curve of `curve` to `path` as CSV.
pub fn write_samples_csv(path: &Path, curve: &LightCurve, overwrite: bool) -> Result<()> {
    let csv = export_samples_csv(curve)?;
    write_atomic(path, csv.as_bytes(), overwrite)?;
    tracing::info!(path = %path.display(), rows = curve.time_samp().len(), "exported samples as CSV");
    Ok(())
}
