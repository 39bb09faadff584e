//! Observed-only ("good") record: time plus `(lc, err)` per labeled image,
//! in nanomaggies.
//!
//! Two encodings:
//! - Parquet with flat `Float64` columns `time, lc_A, err_A, lc_B, ...`
//! - fixed-width text with a `##` comment header and `%11.5f` columns

use std::fs;
use std::path::Path;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tdsim_core::{FluxCurve, ObservedFlux, ObservedSet, RecordKind};

use crate::error::{Result, StoreError};
use crate::evil::parquet_bytes;
use crate::meta::{self, ColumnInfo, RecordMeta, WriteOptions};

/// Physical encoding of a good record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoodFormat {
    #[default]
    Parquet,
    Ascii,
}

impl GoodFormat {
    pub fn extension(self) -> &'static str {
        match self {
            GoodFormat::Parquet => "parquet",
            GoodFormat::Ascii => "txt",
        }
    }
}

/// Write `set` to `path` in `format`, with its metadata sidecar.
pub fn write_good(
    path: &Path,
    set: &ObservedSet,
    format: GoodFormat,
    options: &WriteOptions,
) -> Result<RecordMeta> {
    meta::check_target(path, options.overwrite)?;

    let flux = ObservedFlux {
        time: set.time().to_vec(),
        curves: set.to_flux(),
    };
    let bytes = match format {
        GoodFormat::Parquet => parquet_bytes(&mut flux_to_dataframe(&flux)?)?,
        GoodFormat::Ascii => format_ascii(&flux).into_bytes(),
    };
    meta::write_atomic(path, &bytes, options.overwrite)?;

    let record_meta = RecordMeta::new(RecordKind::Good, &bytes, column_info(&flux))
        .with_config_hash(options.config_hash.clone());
    meta::write_meta(path, &record_meta)?;

    tracing::info!(
        path = %path.display(),
        format = ?format,
        curves = flux.curves.len(),
        samples = flux.time.len(),
        "wrote observed light curves"
    );
    Ok(record_meta)
}

/// Read a good record written in either format.
pub fn read_good(path: &Path, format: GoodFormat) -> Result<ObservedFlux> {
    let flux = match format {
        GoodFormat::Parquet => {
            let file = fs::File::open(path).map_err(|e| StoreError::io(path, e))?;
            let df = ParquetReader::new(file)
                .finish()
                .map_err(|e| StoreError::Parquet(format!("read {}: {e}", path.display())))?;
            dataframe_to_flux(&df)?
        }
        GoodFormat::Ascii => {
            let text = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
            parse_ascii(&text)?
        }
    };
    flux.validate()?;
    Ok(flux)
}

fn column_info(flux: &ObservedFlux) -> Vec<ColumnInfo> {
    let mut cols = vec![ColumnInfo::new("time", "day")];
    for c in &flux.curves {
        cols.push(ColumnInfo::new(format!("lc_{}", c.label), "nanomaggies"));
        cols.push(ColumnInfo::new(format!("err_{}", c.label), "nanomaggies"));
    }
    cols
}

// ── Parquet ──────────────────────────────────────────────────────────

pub fn flux_to_dataframe(flux: &ObservedFlux) -> Result<DataFrame> {
    let mut columns = vec![Column::new("time".into(), &flux.time)];
    for c in &flux.curves {
        columns.push(Column::new(format!("lc_{}", c.label).into(), &c.flux));
        columns.push(Column::new(format!("err_{}", c.label).into(), &c.error));
    }
    DataFrame::new(columns).map_err(|e| StoreError::Parquet(format!("dataframe creation: {e}")))
}

pub fn dataframe_to_flux(df: &DataFrame) -> Result<ObservedFlux> {
    let time = float_column(df, "time")?;

    let mut curves = Vec::new();
    for name in df.get_column_names() {
        let name = name.as_str();
        let Some(label) = name.strip_prefix("lc_") else {
            continue;
        };
        curves.push(FluxCurve {
            label: label.to_string(),
            flux: float_column(df, name)?,
            error: float_column(df, &format!("err_{label}"))?,
        });
    }
    Ok(ObservedFlux { time, curves })
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let col = df
        .column(name)
        .map_err(|_| StoreError::Format(format!("missing column '{name}'")))?;
    let ca = col
        .f64()
        .map_err(|e| StoreError::Format(format!("column '{name}': {e}")))?;
    ca.into_iter()
        .map(|v| v.ok_or_else(|| StoreError::Format(format!("null value in column '{name}'"))))
        .collect()
}

// ── Fixed-width text ─────────────────────────────────────────────────

const ASCII_TITLE: &str = "## Time Delay Challenge light curves";
const ASCII_UNITS: &str = "## [time]=days, [lc]=[err]=flux in nanomaggies";
const COLUMN_WIDTH: usize = 11;

pub fn format_ascii(flux: &ObservedFlux) -> String {
    let mut out = String::new();
    out.push_str(ASCII_TITLE);
    out.push_str("\n##\n");
    out.push_str(ASCII_UNITS);
    out.push_str("\n##\n");

    out.push_str("##");
    out.push_str(&format!("{:>w$}", "time", w = COLUMN_WIDTH));
    for c in &flux.curves {
        out.push_str(&format!("{:>w$}", format!("lc_{}", c.label), w = COLUMN_WIDTH));
        out.push_str(&format!("{:>w$}", format!("err_{}", c.label), w = COLUMN_WIDTH));
    }
    out.push('\n');

    out.push_str("##");
    out.push_str(&"-".repeat(COLUMN_WIDTH));
    for _ in &flux.curves {
        out.push_str(&"-".repeat(2 * COLUMN_WIDTH));
    }
    out.push('\n');

    for (i, t) in flux.time.iter().enumerate() {
        out.push_str("  ");
        out.push_str(&format!("{t:11.5}"));
        for c in &flux.curves {
            out.push_str(&format!("{:11.5}{:11.5}", c.flux[i], c.error[i]));
        }
        out.push('\n');
    }
    out
}

/// Parse the fixed-width text encoding.
///
/// Column names come from the last `##` line before the dashed rule; data
/// rows are whitespace-separated.
pub fn parse_ascii(text: &str) -> Result<ObservedFlux> {
    let mut names: Option<Vec<String>> = None;
    let mut last_comment: Option<&str> = None;
    let mut rows: Vec<Vec<f64>> = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        if let Some(body) = line.strip_prefix("##") {
            if body.starts_with('-') {
                let header = last_comment
                    .ok_or_else(|| StoreError::Format("dashed rule without column names".into()))?;
                names = Some(header.split_whitespace().map(str::to_string).collect());
            }
            last_comment = Some(body);
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|v| {
                v.parse::<f64>().map_err(|e| {
                    StoreError::Format(format!("line {}: bad value '{v}': {e}", lineno + 1))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }

    let names = names.ok_or_else(|| StoreError::Format("missing column header".into()))?;
    if names.first().map(String::as_str) != Some("time") {
        return Err(StoreError::Format("first column must be 'time'".into()));
    }
    if (names.len() - 1) % 2 != 0 {
        return Err(StoreError::Format(format!(
            "expected time plus (lc, err) pairs, found {} columns",
            names.len()
        )));
    }
    for (i, row) in rows.iter().enumerate() {
        if row.len() != names.len() {
            return Err(StoreError::Format(format!(
                "data row {} has {} values, expected {}",
                i + 1,
                row.len(),
                names.len()
            )));
        }
    }

    let column = |k: usize| rows.iter().map(|r| r[k]).collect::<Vec<f64>>();
    let curves = names[1..]
        .chunks(2)
        .enumerate()
        .map(|(j, pair)| {
            let label = pair[0].strip_prefix("lc_").unwrap_or(&pair[0]).to_string();
            FluxCurve {
                label,
                flux: column(1 + 2 * j),
                error: column(2 + 2 * j),
            }
        })
        .collect();

    Ok(ObservedFlux {
        time: column(0),
        curves,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> ObservedSet {
        ObservedSet::new(
            vec![0.0, 7.0, 14.0],
            vec![vec![22.5, 20.0, 21.0], vec![22.0, 22.5, 23.0]],
            Some(vec![0.03, 0.05]),
        )
        .unwrap()
    }

    fn flux() -> ObservedFlux {
        ObservedFlux {
            time: set().time().to_vec(),
            curves: set().to_flux(),
        }
    }

    #[test]
    fn ascii_header_layout() {
        let text = format_ascii(&flux());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "## Time Delay Challenge light curves");
        assert_eq!(lines[1], "##");
        assert_eq!(lines[2], "## [time]=days, [lc]=[err]=flux in nanomaggies");
        assert_eq!(lines[3], "##");
        assert_eq!(
            lines[4],
            "##       time       lc_A      err_A       lc_B      err_B"
        );
        assert_eq!(lines[5], format!("##{}", "-".repeat(11 + 2 * 22)));
        assert_eq!(lines[6], "      0.00000    1.00000    0.03000    1.58489    0.07924");
        assert_eq!(lines.len(), 9);
    }

    #[test]
    fn ascii_parse_recovers_values_to_print_precision() {
        let original = flux();
        let parsed = parse_ascii(&format_ascii(&original)).unwrap();
        parsed.validate().unwrap();
        assert_eq!(parsed.time, original.time);
        assert_eq!(parsed.curves.len(), 2);
        assert_eq!(parsed.curves[1].label, "B");
        for (a, b) in parsed.curves.iter().zip(&original.curves) {
            for (x, y) in a.flux.iter().zip(&b.flux) {
                assert!((x - y).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn ascii_rejects_ragged_rows() {
        let mut text = format_ascii(&flux());
        text.push_str("  1.0 2.0\n");
        assert!(matches!(parse_ascii(&text), Err(StoreError::Format(_))));
    }

    #[test]
    fn dataframe_columns_are_flat_and_labeled() {
        let df = flux_to_dataframe(&flux()).unwrap();
        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["time", "lc_A", "err_A", "lc_B", "err_B"]);
        assert_eq!(df.height(), 3);
        assert_eq!(dataframe_to_flux(&df).unwrap(), flux());
    }
}
