//! Error types for grid operations.

use crate::GridCoord;

/// Errors that can occur during grid operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GridError {
    /// The cell size must be positive and finite.
    #[error("cell size must be positive and finite, got {0}")]
    InvalidCellSize(f32),

    /// A coordinate is out of the valid range for grid operations.
    #[error("coordinate {coord:?} is out of bounds")]
    OutOfBounds {
        /// The coordinate that was out of bounds.
        coord: GridCoord,
    },

    /// The grid dimensions are invalid.
    #[error("invalid grid dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Width in cells.
        width: u32,
        /// Height in cells.
        height: u32,
    },

    /// The word buffer does not match the grid dimensions.
    #[error("word buffer holds {got} words, dimensions require {expected}")]
    WordCountMismatch {
        /// Number of words required by the dimensions.
        expected: usize,
        /// Number of words supplied.
        got: usize,
    },

    /// Integer overflow occurred during coordinate calculation.
    #[error("integer overflow during coordinate calculation")]
    IntegerOverflow,
}
