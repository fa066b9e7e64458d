//! Snapshot Module
//!
//! JSON encoding of cache content and the file I/O around it.
//!
//! A snapshot is a JSON array ordered from most to least recently used:
//!
//! ```text
//! [
//!   {"key": "session", "value": "abc123", "expiresAt": "2026-10-18T12:00:05.123456789Z"},
//!   ...
//! ]
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::error::{CacheError, Result};

// == Snapshot Record ==
/// One persisted cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRecord<V> {
    pub key: String,
    pub value: V,
    pub expires_at: DateTime<Utc>,
}

// == Encode ==
/// Serializes records into the snapshot byte format.
pub fn encode<V: Serialize>(records: &[SnapshotRecord<V>]) -> Result<Vec<u8>> {
    serde_json::to_vec(records).map_err(CacheError::Encode)
}

// == Write ==
/// Writes an encoded snapshot, creating or truncating the file.
pub async fn write_snapshot(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })
}

// == Read ==
/// Reads and decodes a snapshot file.
///
/// Nothing is returned unless the whole file decodes.
pub async fn read_snapshot<V: DeserializeOwned>(path: &Path) -> Result<Vec<SnapshotRecord<V>>> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    serde_json::from_slice(&bytes).map_err(|source| CacheError::Decode {
        path: path.to_path_buf(),
        source,
    })
}
