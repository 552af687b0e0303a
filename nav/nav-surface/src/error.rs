//! Error types for surface construction and tile persistence.

use thiserror::Error;

/// Errors that can occur while building or persisting navigation surfaces.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SurfaceError {
    /// Tile snapshot magic bytes did not match.
    #[error("invalid tile snapshot: expected magic bytes 'GWT1', got {0:?}")]
    InvalidMagic([u8; 4]),

    /// Tile snapshot version is not supported.
    #[error("unsupported tile snapshot version: {0} (supported: 1)")]
    UnsupportedVersion(u32),

    /// Snapshot payload failed to serialize.
    #[error("tile snapshot serialization error: {0}")]
    Serialize(String),

    /// Snapshot payload failed to deserialize.
    #[error("tile snapshot deserialization error: {0}")]
    Deserialize(String),

    /// Snapshot payload lengths disagree with the encoded dimensions.
    #[error("snapshot payload mismatch: expected {expected} entries, got {got}")]
    CountMismatch {
        /// Entry count implied by the snapshot dimensions.
        expected: usize,
        /// Entry count actually present in the payload.
        got: usize,
    },

    /// Bit grid reconstruction from snapshot words failed.
    #[error("bit grid error: {0}")]
    Grid(#[from] gw_grid::GridError),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for surface operations.
pub type Result<T> = std::result::Result<T, SurfaceError>;
