//! Error types for pathfinding queries.

use gw_grid::GridCoord;
use thiserror::Error;

/// Errors raised by search filters and path-level queries.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum PathError {
    /// The global heuristic scale is negative or not finite.
    #[error("heuristic scale must be non-negative and finite, got {0}")]
    InvalidHeuristicScale(f64),

    /// A per-axis heuristic scale is negative or not finite.
    #[error("axiswise heuristic scale must be non-negative and finite, got ({x}, {y})")]
    InvalidAxisScale {
        /// Configured scale along X.
        x: f64,
        /// Configured scale along Y.
        y: f64,
    },

    /// The cost limit is zero, negative, or NaN.
    #[error("cost limit must be positive, got {0}")]
    InvalidCostLimit(f64),

    /// The node budget leaves no room for the start node.
    #[error("node budget must be at least 1, got {0}")]
    InvalidNodeBudget(usize),

    /// The start cell is occupied or its tile does not exist.
    #[error("start cell ({}, {}) is blocked or has no tile", .0.x, .0.y)]
    StartBlocked(GridCoord),
}

/// Result type for pathfinding operations.
pub type Result<T> = std::result::Result<T, PathError>;
