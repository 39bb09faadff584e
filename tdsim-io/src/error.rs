//! Error type for persistence, configuration and orchestration.

use std::path::PathBuf;

use tdsim_core::LightCurveError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Curve(#[from] LightCurveError),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parquet I/O error: {0}")]
    Parquet(String),

    /// Persisted data that does not have the expected layout.
    #[error("malformed record: {0}")]
    Format(String),

    #[error("refusing to overwrite existing file {} (overwrite not requested)", .0.display())]
    AlreadyExists(PathBuf),

    #[error("config error: {0}")]
    Config(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
