//! Tile-partitioned navigation grid for the gridwalk crates.
//!
//! [`NavGrid`] owns the published tiles and answers world-space
//! queries over them. Generator output arrives through its
//! [`TilePublisher`](nav_gen::TilePublisher) impl, and every search
//! from the sibling crates runs against its
//! [`TileSource`](nav_surface::TileSource) impl:
//!
//! - [`NavGrid`] - Tile store plus query facade: paths, raycasts,
//!   point projection, random sampling, and boundary collection, with
//!   outstanding paths flagged when a tile changes under them
//! - [`GridConfig`] - Generation parameters paired with the default
//!   search filter
//! - [`NodeRef`] - Packed stable handle of one grid cell
//! - [`GridSnapshot`] - Whole-grid persistence in the versioned tile
//!   snapshot format
//!
//! # Example
//!
//! ```
//! use gw_grid::{TileCoord, TileExtent};
//! use nalgebra::{Point3, Vector3};
//! use nav_gen::{GenConfig, TilePublisher};
//! use nav_grid::{GridConfig, NavGrid, PathOptions, QueryResult};
//! use nav_surface::TileLayer;
//!
//! let config = GridConfig::new().with_gen_config(
//!     GenConfig::new()
//!         .with_tile_extent(TileExtent::new(16, 32))
//!         .with_cell_size(1.0),
//! );
//! let mut grid = NavGrid::new(config)?;
//!
//! let tile = TileCoord::new(0, 0);
//! let layer = TileLayer::new(tile.cell_rect(config.tile_extent()), 1.0, false, 0.0);
//! grid.publish_tile(tile, Some(layer), None);
//!
//! let output = grid.find_path(
//!     Point3::new(0.5, 0.5, 0.0),
//!     Point3::new(10.5, 0.5, 0.0),
//!     &config.default_filter(),
//!     PathOptions::new(),
//! );
//! assert_eq!(output.result, QueryResult::Success);
//!
//! let projected = grid.project_point(Point3::new(-0.2, 0.5, 0.0), Vector3::new(1.0, 1.0, 1.0));
//! assert!(projected.is_some());
//! # Ok::<(), nav_grid::GridQueryError>(())
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod config;
mod error;
mod grid;
mod node_ref;
mod persist;
mod query;
mod random;
mod registry;
mod store;

// Re-export core types
pub use config::GridConfig;
pub use error::{GridQueryError, Result};
pub use grid::{NavGrid, PathOptions, PathQueryOutput, QueryResult};
pub use node_ref::NodeRef;
pub use persist::{
    GRID_HEADER_SIZE, GRID_MAGIC, GRID_VERSION, GridHeader, GridSnapshot, is_grid_bytes,
    is_grid_file, load_grid_bytes, load_grid_file, load_grid_reader, save_grid_bytes,
    save_grid_file, save_grid_writer,
};
pub use query::{BoundaryEdge, CellRaycast, ProjectedPoint, WorldRaycast};
pub use store::{TileData, TileStore};
