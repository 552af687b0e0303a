//! Error types for tile regeneration.

use thiserror::Error;

/// Errors raised by generation configuration and geometry gathering.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenError {
    /// Tile extent does not line up with the bit grid tiling.
    #[error(
        "tile extent must be positive multiples of {expected_width}x{expected_height} cells, got {width}x{height}"
    )]
    InvalidTileExtent {
        /// Configured cells per tile along X.
        width: i32,
        /// Configured cells per tile along Y.
        height: i32,
        /// Required multiple along X.
        expected_width: i32,
        /// Required multiple along Y.
        expected_height: i32,
    },

    /// The cell size is not a positive finite number.
    #[error("cell size must be positive and finite, got {0}")]
    InvalidCellSize(f32),

    /// The walkable height delta is negative or not finite.
    #[error("max walkable height delta must be non-negative and finite, got {0}")]
    InvalidHeightDelta(f32),

    /// The vertical world clamp is inverted.
    #[error("z clamp is inverted: min {min} > max {max}")]
    InvalidZClamp {
        /// Configured lower bound.
        min: f32,
        /// Configured upper bound.
        max: f32,
    },

    /// The span merge tolerance is negative or not finite.
    #[error("span merge tolerance must be non-negative and finite, got {0}")]
    InvalidMergeTolerance(f32),

    /// The geometry source could not deliver data for a query box.
    #[error("geometry source failed: {0}")]
    Source(String),
}

/// Result type for generation operations.
pub type Result<T> = std::result::Result<T, GenError>;
