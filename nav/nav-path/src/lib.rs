//! Grid pathfinding for the gridwalk crates.
//!
//! Searches run over any [`TileSource`](nav_surface::TileSource), so
//! the same code serves a live grid and a test double:
//!
//! - [`GridAStar`] - Budgeted 4-connected A* over tile occupancy,
//!   tuned by a [`SearchFilter`] and reporting how it ended through
//!   [`SearchOutcome`]
//! - [`PathPostprocess`] - Turns the resulting cell corridor into
//!   world-space waypoints by string pulling or corner extraction
//! - [`NavPath`] - The shareable end product with a cached length and
//!   an invalidation flag
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use gw_grid::{GridCoord, TileCoord, TileExtent};
//! use nav_path::{GridAStar, SearchFilter, SearchResult};
//! use nav_surface::{Heightfield, TileLayer, TileSource};
//!
//! struct OneTile(Arc<TileLayer>);
//!
//! impl TileSource for OneTile {
//!     fn tile_extent(&self) -> TileExtent {
//!         TileExtent::new(16, 32)
//!     }
//!
//!     fn layer(&self, tile: TileCoord) -> Option<Arc<TileLayer>> {
//!         (tile == TileCoord::new(0, 0)).then(|| Arc::clone(&self.0))
//!     }
//!
//!     fn heightfield(&self, _tile: TileCoord) -> Option<Arc<Heightfield>> {
//!         None
//!     }
//! }
//!
//! let rect = TileCoord::new(0, 0).cell_rect(TileExtent::new(16, 32));
//! let mut layer = TileLayer::new(rect, 1.0, false, 0.0);
//! layer.set_occupied(GridCoord::new(1, 0), true);
//! let source = OneTile(Arc::new(layer));
//!
//! let search = GridAStar::new(&source, SearchFilter::new());
//! let outcome = search.find_path(GridCoord::new(0, 0), GridCoord::new(3, 0));
//!
//! assert_eq!(outcome.result, SearchResult::Found);
//! // The blocked cell forces a two-step detour.
//! assert_eq!(outcome.cells.len(), 6);
//! ```

// Safety: Deny unwrap/expect in library code. Tests may use them (workspace warns).
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod astar;
mod cache;
mod error;
mod filter;
mod path;
mod postprocess;

// Re-export core types
pub use astar::{GridAStar, SearchOutcome, SearchResult};
pub use cache::LayerCache;
pub use error::{PathError, Result};
pub use filter::SearchFilter;
pub use path::{NavPath, PathPoint};
pub use postprocess::{PathPostprocess, ProcessedPath};
