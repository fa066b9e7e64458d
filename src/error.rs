//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use std::path::PathBuf;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
///
/// Misses are not errors: `get` and `delete` report them through `Option`.
/// Loader failures are returned to the caller in the loader's own error type.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Rejected construction parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The background reaper could not be spawned
    #[error("No tokio runtime available: {0}")]
    Runtime(String),

    /// Snapshot file could not be opened, created, read or written
    #[error("Snapshot I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cache content could not be encoded into a snapshot
    #[error("Snapshot encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Snapshot file content is malformed
    #[error("Snapshot decoding failed for {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
