use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

/// A stored record that cannot be turned back into an observation.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Stored timestamp '{value}' is not RFC 3339")]
    InvalidTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Stored column '{column}' is not valid JSON")]
    InvalidColumn {
        column: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Stored column '{column}' holds an unrecognised value '{value}'")]
    InvalidValue { column: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum CacheError {
    /// A different report is already stored under the same key. The stored
    /// one is kept.
    #[error("Observation for station {station} at {timestamp} already stored with different content")]
    PersistenceConflict {
        station: String,
        timestamp: DateTime<Utc>,
    },

    #[error("Corrupt record for station {station} at {timestamp}")]
    CorruptRecord {
        station: String,
        timestamp: DateTime<Utc>,
        #[source]
        source: RecordError,
    },

    #[error("Failed to read cache file '{0}'")]
    CacheRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to write cache file '{0}'")]
    CacheWrite(PathBuf, #[source] std::io::Error),

    #[error("Failed to move cache file into place at '{0}'")]
    CachePersist(PathBuf, #[source] tempfile::PersistError),

    #[error("Failed to decode cache data from '{0}'")]
    CacheDecode(PathBuf, #[source] Box<bincode::error::DecodeError>),

    #[error("Failed to encode cache data")]
    CacheEncode(#[source] Box<bincode::error::EncodeError>),

    #[error("Cache lock poisoned by a panicked writer")]
    LockPoisoned,

    #[error("Background cache task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
