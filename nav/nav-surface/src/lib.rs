//! Per-tile navigation surface data for the gridwalk crates.
//!
//! A navigation tile is described by two structures built during
//! generation and consumed by pathfinding and world queries:
//!
//! - [`Heightfield`] - Vertical solid spans per cell, filled by
//!   rasterizing triangle geometry into grid columns
//! - [`TileLayer`] - One occupancy bit and one surface height per cell,
//!   derived from the heightfield and edited by area modifiers
//!
//! Tiles persist through [`TileSnapshot`] (magic bytes, version, bincode
//! payload), and the [`TileSource`] trait gives pathfinding and queries
//! read access to published tiles without fixing the storage behind it.
//!
//! # Example
//!
//! ```
//! use gw_grid::{GridCoord, GridRect};
//! use nalgebra::Point3;
//! use nav_surface::{Heightfield, DEFAULT_MERGE_TOLERANCE};
//!
//! let rect = GridRect::from_origin_size(GridCoord::new(0, 0), 32, 32);
//! let mut field = Heightfield::new(rect, 1.0, DEFAULT_MERGE_TOLERANCE);
//!
//! // A flat triangle leaves one zero-thickness span per covered cell.
//! field.rasterize_triangles(
//!     &[
//!         Point3::new(0.2, 0.2, 5.0),
//!         Point3::new(2.8, 0.2, 5.0),
//!         Point3::new(0.2, 2.8, 5.0),
//!     ],
//!     &[0, 1, 2],
//! );
//!
//! let spans: Vec<_> = field.spans(GridCoord::new(0, 0)).collect();
//! assert_eq!(spans.len(), 1);
//! assert_eq!(spans[0].min, 5.0);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod heightfield;
mod layer;
mod rasterize;
mod snapshot;
mod source;
mod span;

// Re-export core types
pub use error::{Result, SurfaceError};
pub use heightfield::{DEFAULT_MERGE_TOLERANCE, Heightfield, SpanIter};
pub use layer::TileLayer;
pub use snapshot::{
    HeightfieldSnapshot, LayerSnapshot, TILE_HEADER_SIZE, TILE_MAGIC, TILE_VERSION, TileHeader,
    TileSnapshot, is_tile_bytes, is_tile_file, load_tile_bytes, load_tile_file, load_tile_reader,
    save_tile_bytes, save_tile_file, save_tile_writer,
};
pub use source::TileSource;
pub use span::{SPANS_PER_BLOCK, Span, SpanArena, SpanIndex};
