//! tdsim I/O: persistence and orchestration on top of `tdsim-core`.
//!
//! This crate provides:
//! - Full ("evil") light-curve records as single-row Parquet
//! - Observed-only ("good") records as flat Parquet or fixed-width text
//! - JSON metadata sidecars with content hashes
//! - CSV export of sampled curves
//! - TOML simulation configs and the lensed-system runner

pub mod config;
pub mod error;
pub mod evil;
pub mod export;
pub mod good;
pub mod meta;
pub mod system;

pub use config::{
    ConfigHash, ImageConfig, NoiseConfig, OutputConfig, ProcessConfig, SamplingConfig,
    SimulationConfig,
};
pub use error::{Result, StoreError};
pub use evil::{read_evil, write_evil};
pub use export::{export_samples_csv, write_samples_csv};
pub use good::{read_good, write_good, GoodFormat};
pub use meta::{read_meta, ColumnInfo, RecordMeta, WriteOptions, SCHEMA_VERSION};
pub use system::{run_system, write_system, LensedImage, LensedSystem};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<SimulationConfig>();
        assert_sync::<SimulationConfig>();
        assert_send::<WriteOptions>();
        assert_sync::<WriteOptions>();
    }

    #[test]
    fn system_is_send_sync() {
        assert_send::<LensedSystem>();
        assert_sync::<LensedSystem>();
    }

    #[test]
    fn record_meta_is_send_sync() {
        assert_send::<RecordMeta>();
        assert_sync::<RecordMeta>();
    }

    #[test]
    fn store_error_is_send_sync() {
        assert_send::<StoreError>();
        assert_sync::<StoreError>();
    }
}
