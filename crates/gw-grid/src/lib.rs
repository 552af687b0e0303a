//! Tile-partitioned 2D grid foundation for the gridwalk navigation crates.
//!
//! This crate provides the discrete-space building blocks shared by the
//! navigation surface, generation, and pathfinding crates:
//!
//! - [`GridCoord`] and [`TileCoord`] - Integer cell and tile coordinates
//! - [`GridRect`] - Half-open rectangles of cells
//! - [`CellDirection`] - Cardinal neighbor directions and cell edges
//! - [`CellLayout`] - World-space to cell-space conversions
//! - [`BitGrid`] - Cache-line tiled bitset with bulk rect operations
//! - [`GridTraversal`] - Cell-by-cell walk along a world-space segment
//!
//! # Coordinate Systems
//!
//! Cell coordinates are discrete `i32` values and may be negative; cell
//! `(x, y)` covers the world square `[x * s, (x + 1) * s)` per axis for
//! cell size `s`. Tiles partition cells into fixed-size blocks
//! ([`TileExtent`]), floor-dividing so negative cells map to negative
//! tiles. Rects are half-open: `min` inclusive, `max` exclusive.
//!
//! # Example
//!
//! ```
//! use gw_grid::{BitGrid, CellLayout, GridCoord, GridRect, TileCoord, TileExtent};
//! use nalgebra::Point2;
//!
//! // World positions map to cells by flooring.
//! let layout = CellLayout::new(100.0);
//! let cell = layout.coord_of(Point2::new(-20.0, 250.0));
//! assert_eq!(cell, GridCoord::new(-1, 2));
//!
//! // Cells map to tiles by floor division.
//! let tile = TileCoord::containing(cell, TileExtent::square(128));
//! assert_eq!(tile, TileCoord::new(-1, 0));
//!
//! // Bulk bit operations cover whole rects at once.
//! let mut occupied = BitGrid::new(128, 128, false);
//! occupied.fill_rect(GridRect::new(GridCoord::new(8, 8), GridCoord::new(40, 40)), true);
//! assert!(occupied.get(GridCoord::new(39, 39)));
//! ```
//!
//! # Feature Flags
//!
//! - `serde`: Enables serialization/deserialization for the coordinate
//!   and rect types

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod bitgrid;
mod coord;
mod direction;
mod error;
mod layout;
mod rect;
mod traversal;

// Re-export core types
pub use bitgrid::{BIT_TILE_HEIGHT, BIT_TILE_WIDTH, BitGrid};
pub use coord::{GridCoord, TileCoord, TileExtent};
pub use direction::CellDirection;
pub use error::GridError;
pub use layout::CellLayout;
pub use rect::GridRect;
pub use traversal::{GridAxis, GridTraversal, TraversalStep};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Vector2};
