use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("unable to read table {}: {source}", path.display())]
    Table {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("repository query failed: {0}")]
    Query(String),
}

/// Reasons a persisted snapshot is rejected. Callers treat every variant
/// the same way: discard the snapshot and retrain.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a wishrec snapshot")]
    BadMagic,
    #[error("unsupported snapshot format version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("snapshot could not be encoded or decoded: {0}")]
    Codec(#[from] bincode::Error),
    #[error("snapshot is structurally incomplete: {0}")]
    Incomplete(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration could not be read: {0}")]
    Source(String),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

// The justconfig error is rendered eagerly so `ConfigError` stays `Send + Sync`.
impl From<justconfig::error::ConfigError> for ConfigError {
    fn from(error: justconfig::error::ConfigError) -> Self {
        ConfigError::Source(error.to_string())
    }
}

impl From<justconfig::sources::text::Error> for ConfigError {
    fn from(error: justconfig::sources::text::Error) -> Self {
        ConfigError::Source(error.to_string())
    }
}

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}
