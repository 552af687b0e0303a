//! Tile regeneration for the gridwalk crates.
//!
//! Rebuilding runs in three stages:
//!
//! - [`DirtyQueue`] coalesces marked world changes into per-tile work,
//!   keeping one pending entry per tile
//! - [`TileBuilder`] rebuilds a single tile from gathered geometry: it
//!   re-rasterizes dirty rects into a [`nav_surface::Heightfield`],
//!   derives occupancy and surface heights, paints area modifiers, and
//!   blocks cells outside the navigable bounds
//! - [`RegenScheduler`] drives the loop against a [`GeometrySource`]
//!   and a [`TilePublisher`], running builds on the rayon pool under a
//!   concurrency budget and publishing results on the calling thread
//!
//! # Example
//!
//! ```
//! use gw_grid::{GridCoord, GridRect, TileCoord, TileExtent};
//! use nalgebra::Point3;
//! use nav_gen::{CollectedGeometry, DirtyArea, DirtyFlags, GenConfig, TileBuilder, TriangleSoup};
//!
//! let config = GenConfig::new()
//!     .with_tile_extent(TileExtent::new(16, 32))
//!     .with_cell_size(1.0);
//! let bounds = [GridRect::from_origin_size(GridCoord::new(0, 0), 16, 32)];
//! let dirty = [DirtyArea::new(bounds[0], DirtyFlags::GEOMETRY)];
//! let builder = TileBuilder::new(&config, TileCoord::new(0, 0), &dirty, &bounds, None, None);
//!
//! // One flat triangle at z = 3 becomes walkable surface.
//! let mut geometry = CollectedGeometry::new();
//! geometry.triangles.push(TriangleSoup {
//!     vertices: vec![
//!         Point3::new(0.2, 0.2, 3.0),
//!         Point3::new(7.8, 0.2, 3.0),
//!         Point3::new(0.2, 7.8, 3.0),
//!     ],
//!     indices: vec![0, 1, 2],
//!     instances: Vec::new(),
//! });
//!
//! let output = builder.build(&geometry);
//! let layer = output.layer.unwrap();
//! assert!(!layer.is_occupied(GridCoord::new(1, 1)));
//! assert_eq!(layer.height_of(GridCoord::new(1, 1)), 3.0);
//! assert!(layer.is_occupied(GridCoord::new(12, 20)));
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod builder;
mod config;
mod dirty;
mod error;
mod geometry;
mod scheduler;

// Re-export core types
pub use builder::{TileBuildOutput, TileBuilder};
pub use config::GenConfig;
pub use dirty::{DirtyArea, DirtyFlags, DirtyQueue, PendingTile};
pub use error::{GenError, Result};
pub use geometry::{
    AreaEffect, AreaModifier, CollectedGeometry, GeometrySource, ModifierShape, TriangleSoup,
};
pub use scheduler::{RegenScheduler, TilePublisher};
