//! Error types for grid configuration and persistence.

use gw_grid::TileExtent;
use thiserror::Error;

/// Errors raised while configuring, saving, or loading a grid.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GridQueryError {
    /// Grid snapshot magic bytes did not match.
    #[error("invalid grid snapshot: expected magic bytes 'GWG1', got {0:?}")]
    InvalidMagic([u8; 4]),

    /// Grid snapshot version is not supported.
    #[error("unsupported grid snapshot version: {0} (supported: 1)")]
    UnsupportedVersion(u32),

    /// Snapshot payload failed to serialize.
    #[error("grid snapshot serialization error: {0}")]
    Serialize(String),

    /// Snapshot payload failed to deserialize.
    #[error("grid snapshot deserialization error: {0}")]
    Deserialize(String),

    /// Snapshot tiles were captured under a different tile extent.
    #[error("snapshot tile extent {got:?} does not match configured {expected:?}")]
    ExtentMismatch {
        /// Tile extent of the target configuration.
        expected: TileExtent,
        /// Tile extent the snapshot was captured with.
        got: TileExtent,
    },

    /// Generation parameters failed validation.
    #[error("generation config error: {0}")]
    Config(#[from] nav_gen::GenError),

    /// The default search filter failed validation.
    #[error("search filter error: {0}")]
    Filter(#[from] nav_path::PathError),

    /// A tile snapshot could not be captured or restored.
    #[error("tile snapshot error: {0}")]
    Surface(#[from] nav_surface::SurfaceError),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridQueryError>;
