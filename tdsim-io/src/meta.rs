//! Atomic file writes and the JSON metadata sidecar.
//!
//! Every record file `<name>` is accompanied by `<name>.meta.json`, which
//! records what was written, when, and a BLAKE3 hash of the payload bytes.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tdsim_core::RecordKind;

use crate::error::{Result, StoreError};

/// Version of the on-disk record layouts. Newer versions are rejected on load.
pub const SCHEMA_VERSION: u32 = 1;

/// Metadata sidecar for one record file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub kind: RecordKind,
    pub schema_version: u32,
    pub created_at: chrono::NaiveDateTime,
    /// BLAKE3 hash of the record file's bytes.
    pub data_hash: String,
    /// Columns in file order.
    pub fields: Vec<ColumnInfo>,
    /// Hash of the simulation config that produced the record, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
}

/// Name and physical unit of one persisted column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub unit: String,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
        }
    }
}

/// How a record file is written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Replace an existing file instead of failing.
    pub overwrite: bool,
    /// Recorded in the sidecar.
    pub config_hash: Option<String>,
}

impl RecordMeta {
    pub fn new(kind: RecordKind, payload: &[u8], fields: Vec<ColumnInfo>) -> Self {
        Self {
            kind,
            schema_version: SCHEMA_VERSION,
            created_at: chrono::Local::now().naive_local(),
            data_hash: hash_bytes(payload),
            fields,
            config_hash: None,
        }
    }

    pub fn with_config_hash(mut self, hash: Option<String>) -> Self {
        self.config_hash = hash;
        self
    }

    /// Whether `payload` still matches the recorded hash.
    pub fn matches(&self, payload: &[u8]) -> bool {
        self.data_hash == hash_bytes(payload)
    }
}

pub fn hash_bytes(payload: &[u8]) -> String {
    blake3::hash(payload).to_hex().to_string()
}

/// `<path>.meta.json`
pub fn meta_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".meta.json");
    PathBuf::from(name)
}

pub fn write_meta(path: &Path, meta: &RecordMeta) -> Result<()> {
    let json = serde_json::to_string_pretty(meta)
        .map_err(|e| StoreError::Format(format!("meta serialization: {e}")))?;
    let target = meta_path(path);
    write_atomic(&target, json.as_bytes(), true)
}

/// Load the sidecar of `path`, rejecting unknown schema versions.
pub fn read_meta(path: &Path) -> Result<RecordMeta> {
    let target = meta_path(path);
    let content = fs::read_to_string(&target).map_err(|e| StoreError::io(&target, e))?;
    let meta: RecordMeta = serde_json::from_str(&content)
        .map_err(|e| StoreError::Format(format!("meta parse: {e}")))?;
    if meta.schema_version > SCHEMA_VERSION {
        return Err(StoreError::Format(format!(
            "unsupported schema version {} (max supported: {SCHEMA_VERSION})",
            meta.schema_version
        )));
    }
    Ok(meta)
}

/// Write `bytes` to `path` via a `.tmp` sibling and a rename.
///
/// Fails with [`StoreError::AlreadyExists`] if `path` exists and
/// `overwrite` is false.
pub fn write_atomic(path: &Path, bytes: &[u8], overwrite: bool) -> Result<()> {
    check_target(path, overwrite)?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;
    }

    let tmp_path = tmp_path(path);
    fs::write(&tmp_path, bytes).map_err(|e| StoreError::io(&tmp_path, e))?;
    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        StoreError::io(path, e)
    })
}

pub(crate) fn check_target(path: &Path, overwrite: bool) -> Result<()> {
    if !overwrite && path.exists() {
        return Err(StoreError::AlreadyExists(path.to_path_buf()));
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidecar_sits_next_to_the_record() {
        assert_eq!(
            meta_path(Path::new("out/system.parquet")),
            PathBuf::from("out/system.parquet.meta.json")
        );
    }

    #[test]
    fn atomic_write_refuses_to_clobber() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");

        write_atomic(&path, b"one", false).unwrap();
        let err = write_atomic(&path, b"two", false).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
        assert_eq!(fs::read(&path).unwrap(), b"one");

        write_atomic(&path, b"two", true).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"two");
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn meta_round_trip_and_hash_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curve.parquet");
        let meta = RecordMeta::new(RecordKind::Evil, b"payload", vec![ColumnInfo::new("seed", "none")])
            .with_config_hash(Some("abc".into()));

        write_meta(&path, &meta).unwrap();
        let back = read_meta(&path).unwrap();
        assert_eq!(back, meta);
        assert!(back.matches(b"payload"));
        assert!(!back.matches(b"tampered"));
    }

    #[test]
    fn future_schema_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.parquet");
        let mut meta = RecordMeta::new(RecordKind::Good, b"", vec![]);
        meta.schema_version = SCHEMA_VERSION + 1;
        write_meta(&path, &meta).unwrap();
        assert!(matches!(read_meta(&path), Err(StoreError::Format(_))));
    }
}
