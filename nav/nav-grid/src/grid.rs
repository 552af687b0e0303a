//! The navigation grid facade.

use std::sync::Arc;

use gw_grid::{CellLayout, GridCoord, GridRect, TileCoord, TileExtent};
use nalgebra::Point3;
use nav_gen::TilePublisher;
use nav_path::{
    GridAStar, LayerCache, NavPath, PathError, PathPoint, PathPostprocess, SearchFilter,
    SearchResult,
};
use nav_surface::{Heightfield, TileLayer, TileSource};

use crate::config::GridConfig;
use crate::error::Result;
use crate::node_ref::NodeRef;
use crate::registry::PathRegistry;
use crate::store::{TileData, TileStore};

/// Locations this close along every axis count as the same place.
pub(crate) const SAME_POSITION_TOLERANCE: f32 = 1e-4;

/// How a path query ended.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    /// The goal was reached.
    Success,
    /// The goal was not reached; the path ends at the reachable cell
    /// closest to it.
    Partial,
    /// No path exists and partial solutions were disabled.
    Fail,
    /// The query could not run.
    Error(PathError),
}

/// The product of one path query.
#[derive(Debug, Clone)]
pub struct PathQueryOutput {
    /// How the query ended.
    pub result: QueryResult,
    /// The built path. Empty unless `result` is [`QueryResult::Success`]
    /// or [`QueryResult::Partial`].
    pub path: Arc<NavPath>,
}

/// Options applied per path query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathOptions {
    /// Whether the corridor is string-pulled or kept corner-only.
    string_pulling: bool,
}

impl PathOptions {
    /// Creates options with default settings: string pulling on.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            string_pulling: true,
        }
    }

    /// Enables or disables string pulling.
    #[must_use]
    pub const fn with_string_pulling(mut self, enabled: bool) -> Self {
        self.string_pulling = enabled;
        self
    }

    /// Returns whether string pulling is enabled.
    #[must_use]
    pub const fn string_pulling(&self) -> bool {
        self.string_pulling
    }
}

impl Default for PathOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// A tile-partitioned navigation grid.
///
/// The grid owns the published tile store and a registry of outstanding
/// paths. It implements [`nav_gen::TilePublisher`], so a regeneration
/// scheduler publishes rebuilt tiles straight into it; every publish
/// first flags registered paths crossing the changed tile. Queries take
/// `&self` and may run concurrently with each other.
///
/// # Example
///
/// ```
/// use gw_grid::{TileCoord, TileExtent};
/// use nalgebra::Point3;
/// use nav_gen::{GenConfig, TilePublisher};
/// use nav_grid::{GridConfig, NavGrid, PathOptions, QueryResult};
/// use nav_surface::TileLayer;
///
/// let config = GridConfig::new().with_gen_config(
///     GenConfig::new()
///         .with_tile_extent(TileExtent::new(16, 32))
///         .with_cell_size(1.0),
/// );
/// let mut grid = NavGrid::new(config).unwrap();
///
/// let tile = TileCoord::new(0, 0);
/// let layer = TileLayer::new(tile.cell_rect(grid.config().tile_extent()), 1.0, false, 0.0);
/// grid.publish_tile(tile, Some(layer), None);
///
/// let output = grid.find_path(
///     Point3::new(0.5, 0.5, 0.0),
///     Point3::new(10.5, 0.5, 0.0),
///     &grid.config().default_filter(),
///     PathOptions::new(),
/// );
/// assert_eq!(output.result, QueryResult::Success);
/// assert!((output.path.length() - 10.0).abs() < 1e-3);
/// ```
#[derive(Debug)]
pub struct NavGrid {
    config: GridConfig,
    store: TileStore,
    registry: PathRegistry,
}

impl NavGrid {
    /// Creates an empty grid.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration fails validation.
    pub fn new(config: GridConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store: TileStore::new(config.tile_extent()),
            registry: PathRegistry::new(),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Returns the world-space cell layout.
    #[must_use]
    pub fn layout(&self) -> CellLayout {
        self.config.layout()
    }

    /// Returns the union cell rect of every published tile.
    #[must_use]
    pub const fn bounds(&self) -> GridRect {
        self.store.bounds()
    }

    /// Returns the world-space box covered by the published tiles,
    /// clamped vertically to the configured Z range. `None` while no
    /// tiles are published.
    #[must_use]
    pub fn world_bounds(&self) -> Option<(Point3<f32>, Point3<f32>)> {
        let rect = self.store.bounds();
        if rect.is_empty() {
            return None;
        }
        Some(self.config.gen_config().world_bounds_of(rect))
    }

    /// Returns the number of published tiles.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.store.len()
    }

    /// Returns the stored data for one tile.
    #[must_use]
    pub fn tile(&self, tile: TileCoord) -> Option<&TileData> {
        self.store.tile(tile)
    }

    /// Iterates over the published tiles in arbitrary order.
    pub fn tiles(&self) -> impl Iterator<Item = (TileCoord, &TileData)> {
        self.store.iter()
    }

    /// Returns the number of registered paths still alive.
    #[must_use]
    pub fn outstanding_paths(&self) -> usize {
        self.registry.live_count()
    }

    /// Searches for a path between two world-space locations.
    ///
    /// The search runs over grid cells; the returned path starts at
    /// `start` and ends at `end`, or at the closest reachable cell
    /// center for partial results. Matching locations short-circuit
    /// into a single-point path. The path is registered with the grid
    /// and flagged invalid once a tile publish touches the cells it
    /// crosses.
    #[must_use]
    pub fn find_path(
        &self,
        start: Point3<f32>,
        end: Point3<f32>,
        filter: &SearchFilter,
        options: PathOptions,
    ) -> PathQueryOutput {
        let layout = self.layout();

        if same_position(start, end) {
            let cell = layout.coord_of(end.xy());
            let path = Arc::new(NavPath::single(
                PathPoint::new(end, cell),
                options.string_pulling(),
            ));
            self.registry.register(&path);
            return PathQueryOutput {
                result: QueryResult::Success,
                path,
            };
        }

        let start_cell = layout.coord_of(start.xy());
        let end_cell = layout.coord_of(end.xy());
        let outcome = GridAStar::new(&self.store, *filter).find_path(start_cell, end_cell);

        let (result, path) = match outcome.result {
            SearchResult::InvalidStart => (
                QueryResult::Error(PathError::StartBlocked(start_cell)),
                empty_path(options),
            ),
            SearchResult::NoPath => (QueryResult::Fail, empty_path(options)),
            SearchResult::Found => (
                QueryResult::Success,
                self.postprocess(start, end, &outcome.cells, options),
            ),
            SearchResult::Partial => {
                // The query goal is unreachable; aim the corridor at
                // the surface of the best cell the search expanded.
                let target = outcome.cells.last().map_or(end, |&cell| {
                    let center = layout.center_of(cell);
                    let mut cache = LayerCache::new();
                    Point3::new(center.x, center.y, cache.height_of(&self.store, cell))
                });
                (
                    QueryResult::Partial,
                    self.postprocess(start, target, &outcome.cells, options),
                )
            }
        };
        self.registry.register(&path);
        PathQueryOutput { result, path }
    }

    /// Tests whether a path exists without building one.
    ///
    /// Returns whether the goal is reachable together with the number
    /// of search nodes allocated. Locations in the same cell are always
    /// mutually reachable; partial corridors never count as reachable.
    #[must_use]
    pub fn test_path(
        &self,
        start: Point3<f32>,
        end: Point3<f32>,
        filter: &SearchFilter,
    ) -> (bool, usize) {
        let layout = self.layout();
        let start_cell = layout.coord_of(start.xy());
        let end_cell = layout.coord_of(end.xy());
        if start_cell == end_cell {
            return (true, 1);
        }
        let filter = filter.with_partial_solutions(false);
        let outcome = GridAStar::new(&self.store, filter).find_path(start_cell, end_cell);
        (outcome.result == SearchResult::Found, outcome.visited)
    }

    /// Measures a path without keeping it.
    ///
    /// Runs a throwaway string-pulled query and reports its length.
    /// Partial results report the partial corridor's length. Every step
    /// is charged its world-space distance, so cost and length coincide
    /// on this grid.
    #[must_use]
    pub fn path_length(
        &self,
        start: Point3<f32>,
        end: Point3<f32>,
        filter: &SearchFilter,
    ) -> (QueryResult, Option<f32>) {
        let output = self.find_path(start, end, filter, PathOptions::new());
        let length = matches!(output.result, QueryResult::Success | QueryResult::Partial)
            .then(|| output.path.length());
        (output.result, length)
    }

    /// True if the handle names a currently walkable cell.
    #[must_use]
    pub fn is_node_valid(&self, node: NodeRef) -> bool {
        if !node.is_valid() {
            return false;
        }
        let mut cache = LayerCache::new();
        cache.is_walkable(&self.store, node.coord())
    }

    /// True if a world location lies inside the cell a handle names, on
    /// its surface.
    #[must_use]
    pub fn node_contains_location(&self, node: NodeRef, location: Point3<f32>) -> bool {
        if !node.is_valid() {
            return false;
        }
        let coord = node.coord();
        let mut cache = LayerCache::new();
        if !cache.is_walkable(&self.store, coord) {
            return false;
        }
        let layout = self.layout();
        let corner = layout.corner_of(coord);
        let cell_size = layout.cell_size();
        let height = cache.height_of(&self.store, coord);
        location.x >= corner.x
            && location.x < corner.x + cell_size
            && location.y >= corner.y
            && location.y < corner.y + cell_size
            && (location.z - height).abs() <= SAME_POSITION_TOLERANCE
    }

    /// Runs the configured postprocess mode over a search corridor.
    fn postprocess(
        &self,
        start: Point3<f32>,
        end: Point3<f32>,
        cells: &[GridCoord],
        options: PathOptions,
    ) -> Arc<NavPath> {
        let postprocess = PathPostprocess::new(&self.store, self.layout());
        let processed = if options.string_pulling() {
            postprocess.string_pull(start, end, cells)
        } else {
            postprocess.corners_only(start, end, cells)
        };
        Arc::new(NavPath::new(
            processed.points,
            processed.grid_bounds,
            options.string_pulling(),
        ))
    }
}

impl TileSource for NavGrid {
    fn tile_extent(&self) -> TileExtent {
        self.store.tile_extent()
    }

    fn layer(&self, tile: TileCoord) -> Option<Arc<TileLayer>> {
        self.store.layer(tile)
    }

    fn heightfield(&self, tile: TileCoord) -> Option<Arc<Heightfield>> {
        self.store.heightfield(tile)
    }
}

impl TilePublisher for NavGrid {
    fn publish_tile(
        &mut self,
        tile: TileCoord,
        layer: Option<TileLayer>,
        heightfield: Option<Heightfield>,
    ) {
        // Flag paths before the tile changes under them.
        self.registry
            .invalidate_intersecting(tile.cell_rect(self.config.tile_extent()));
        match layer {
            Some(layer) => self.store.publish(tile, layer, heightfield),
            None => self.store.remove(tile),
        }
    }
}

/// An empty path carrying no points and empty bounds.
fn empty_path(options: PathOptions) -> Arc<NavPath> {
    Arc::new(NavPath::new(
        Vec::new(),
        GridRect::EMPTY,
        options.string_pulling(),
    ))
}

/// True when two locations coincide along every axis within tolerance.
fn same_position(a: Point3<f32>, b: Point3<f32>) -> bool {
    (a.x - b.x).abs() <= SAME_POSITION_TOLERANCE
        && (a.y - b.y).abs() <= SAME_POSITION_TOLERANCE
        && (a.z - b.z).abs() <= SAME_POSITION_TOLERANCE
}
