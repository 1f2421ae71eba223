//! Errors for the few operations that can genuinely fail.
//!
//! Everything else in the core reports absence through `Option`/`bool`
//! sentinels rather than errors.

use thiserror::Error;

/// Failure to load a replay or checksum history from JSON.
///
/// The version and `inputs` variants only come from replay envelopes;
/// checksum histories fail with [`ImportError::Json`].
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unsupported format version {found} (expected {expected})")]
    UnsupportedVersion { found: u64, expected: u32 },
    #[error("document has no version field")]
    MissingVersion,
    #[error("`inputs` is missing or not an array")]
    MissingInputs,
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure to encode or decode a binary state snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] bincode::Error),
    #[error("failed to decode snapshot: {0}")]
    Decode(#[source] bincode::Error),
}
