//! Error types for the proximity engine.

use crate::types::AreaId;
use thiserror::Error;

/// Convenience result alias used across the crate.
pub type Result<T> = std::result::Result<T, ProximityError>;

/// Errors surfaced by the proximity engine and its collaborators.
///
/// Only `DataAccess` during a cache warm-up is a hard failure; everything
/// else either degrades gracefully inside the engine (skipped boundaries,
/// cache fallbacks) or reports invalid caller input.
#[derive(Error, Debug)]
pub enum ProximityError {
    /// The backing boundary store could not be read.
    #[error("data access error: {0}")]
    DataAccess(String),

    /// A stored boundary polygon is malformed (empty, self-intersecting,
    /// out-of-range coordinates). Raised by validation; warm-up converts
    /// this into a skip-with-warning rather than a hard failure.
    #[error("invalid geometry for area {id}: {reason}")]
    InvalidGeometry { id: AreaId, reason: String },

    /// Caller-supplied input is invalid (non-finite or out-of-range
    /// coordinates, negative radius, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The result cache backend failed. The query path never propagates
    /// this; it exists for cache implementations to report and for
    /// maintenance entry points.
    #[error("result cache unavailable: {0}")]
    CacheUnavailable(String),

    /// The boundary cache is cold and lazy rebuild is disabled.
    #[error("boundary cache is not warmed")]
    NotWarmed,

    /// A batch operation was cancelled via its `CancelToken`.
    #[error("operation cancelled")]
    Cancelled,

    /// Serializing or deserializing a cached context failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
