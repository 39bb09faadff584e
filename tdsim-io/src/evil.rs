//! Full-entity ("evil") record: one Parquet row, one column per field.
//!
//! Scalars are stored as length-1 columns. Sequences are `List(Float64)`
//! or `List(Int32)` columns holding a single list each. Columns follow the
//! entity's canonical field order.

use std::fs;
use std::path::Path;

use polars::prelude::*;
use tdsim_core::record::field_unit;
use tdsim_core::{FieldValue, LightCurve, LightCurveRecord, RecordKind, FIELD_NAMES};

use crate::error::{Result, StoreError};
use crate::meta::{self, ColumnInfo, RecordMeta, WriteOptions};

/// Write `curve` to `path` with its metadata sidecar.
pub fn write_evil(path: &Path, curve: &LightCurve, options: &WriteOptions) -> Result<RecordMeta> {
    meta::check_target(path, options.overwrite)?;

    let mut df = curve_to_dataframe(curve)?;
    let bytes = parquet_bytes(&mut df)?;
    meta::write_atomic(path, &bytes, options.overwrite)?;

    let columns = FIELD_NAMES
        .iter()
        .map(|&name| ColumnInfo::new(name, field_unit(name).unwrap_or("none")))
        .collect();
    let record_meta = RecordMeta::new(RecordKind::Evil, &bytes, columns)
        .with_config_hash(options.config_hash.clone());
    meta::write_meta(path, &record_meta)?;

    tracing::info!(
        path = %path.display(),
        seed = curve.seed(),
        tdelay = curve.tdelay(),
        bytes = bytes.len(),
        "wrote full light-curve record"
    );
    Ok(record_meta)
}

/// Read a full record back into a validated entity.
pub fn read_evil(path: &Path) -> Result<LightCurve> {
    let file = fs::File::open(path).map_err(|e| StoreError::io(path, e))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| StoreError::Parquet(format!("read {}: {e}", path.display())))?;
    let curve = dataframe_to_curve(&df)?;
    tracing::debug!(path = %path.display(), samples = curve.time().len(), "read full light-curve record");
    Ok(curve)
}

// ── DataFrame conversion ─────────────────────────────────────────────

pub fn curve_to_dataframe(curve: &LightCurve) -> Result<DataFrame> {
    let columns: Vec<Column> = curve
        .fields()
        .map(|(name, value)| match value {
            FieldValue::Int(v) => Column::new(name.into(), [v]),
            FieldValue::Float(v) => Column::new(name.into(), [v]),
            FieldValue::Bool(v) => Column::new(name.into(), [v]),
            FieldValue::Floats(v) => list_column(name, Series::new(PlSmallStr::EMPTY, v)),
            FieldValue::Ints(v) => list_column(name, Series::new(PlSmallStr::EMPTY, v)),
        })
        .collect();

    DataFrame::new(columns).map_err(|e| StoreError::Parquet(format!("dataframe creation: {e}")))
}

pub fn dataframe_to_curve(df: &DataFrame) -> Result<LightCurve> {
    if df.height() != 1 {
        return Err(StoreError::Format(format!(
            "full record must have exactly one row, found {}",
            df.height()
        )));
    }
    for name in FIELD_NAMES {
        if df.column(name).is_err() {
            return Err(StoreError::Format(format!("missing column '{name}'")));
        }
    }

    let record = LightCurveRecord {
        seed: int(df, "seed")?,
        meanmag: float(df, "meanmag")?,
        mag0: float(df, "mag0")?,
        tau: float(df, "tau")?,
        sigma: float(df, "sigma")?,
        time: floats(df, "time")?,
        lc: floats(df, "lc")?,
        time_samp: floats(df, "time_samp")?,
        lc_samp: floats(df, "lc_samp")?,
        noise: floats(df, "noise")?,
        time_sp: floats(df, "time_sp")?,
        lc_sp: floats(df, "lc_sp")?,
        daily: flag(df, "daily")?,
        weekly: flag(df, "weekly")?,
        season: flag(df, "season")?,
        usrind: ints(df, "usrind")?,
        seed_n: int(df, "seed_n")?,
        amp_n: float(df, "amp_n")?,
        tdelay: float(df, "tdelay")?,
        lc_buff: floats(df, "lc_buff")?,
    };
    Ok(LightCurve::from_record(record)?)
}

pub(crate) fn parquet_bytes(df: &mut DataFrame) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ParquetWriter::new(&mut buf)
        .finish(df)
        .map_err(|e| StoreError::Parquet(format!("write parquet: {e}")))?;
    Ok(buf)
}

fn list_column(name: &str, inner: Series) -> Column {
    Column::from(Series::new(name.into(), [inner]))
}

// ── Column readers ───────────────────────────────────────────────────

fn column_err(name: &str) -> impl Fn(PolarsError) -> StoreError + '_ {
    move |e| StoreError::Format(format!("column '{name}': {e}"))
}

fn null_err(name: &str) -> StoreError {
    StoreError::Format(format!("null value in column '{name}'"))
}

fn int(df: &DataFrame, name: &str) -> Result<i64> {
    df.column(name)
        .map_err(column_err(name))?
        .i64()
        .map_err(column_err(name))?
        .get(0)
        .ok_or_else(|| null_err(name))
}

fn float(df: &DataFrame, name: &str) -> Result<f64> {
    df.column(name)
        .map_err(column_err(name))?
        .f64()
        .map_err(column_err(name))?
        .get(0)
        .ok_or_else(|| null_err(name))
}

fn flag(df: &DataFrame, name: &str) -> Result<bool> {
    df.column(name)
        .map_err(column_err(name))?
        .bool()
        .map_err(column_err(name))?
        .get(0)
        .ok_or_else(|| null_err(name))
}

fn list_row(df: &DataFrame, name: &str) -> Result<Series> {
    df.column(name)
        .map_err(column_err(name))?
        .as_materialized_series()
        .list()
        .map_err(column_err(name))?
        .get_as_series(0)
        .ok_or_else(|| null_err(name))
}

fn floats(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let row = list_row(df, name)?;
    let ca = row.f64().map_err(column_err(name))?;
    ca.into_iter().map(|v| v.ok_or_else(|| null_err(name))).collect()
}

fn ints(df: &DataFrame, name: &str) -> Result<Vec<i32>> {
    let row = list_row(df, name)?;
    let ca = row.i32().map_err(column_err(name))?;
    ca.into_iter().map(|v| v.ok_or_else(|| null_err(name))).collect()
}
