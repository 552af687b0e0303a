//! Per-query tile resolution.
//!
//! Grid queries visit runs of cells that almost always share a tile, so
//! each query carries a one-entry layer cache. The cache is local to a
//! single call and is never shared between queries.

use std::sync::Arc;

use gw_grid::{GridCoord, TileCoord};
use nav_surface::{TileLayer, TileSource};

/// One-entry tile layer cache.
///
/// A lookup outside the cached layer's rect refetches through the
/// source, so the cache also tracks "no tile here" between refetches.
#[derive(Debug, Default)]
pub struct LayerCache {
    current: Option<Arc<TileLayer>>,
}

impl LayerCache {
    /// Creates an empty cache.
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Resolves the layer covering `coord`, refetching on a cache miss.
    fn resolve<S: TileSource + ?Sized>(
        &mut self,
        source: &S,
        coord: GridCoord,
    ) -> Option<&TileLayer> {
        let cached_hit = self
            .current
            .as_ref()
            .is_some_and(|layer| layer.rect().contains(coord));
        if !cached_hit {
            let tile = TileCoord::containing(coord, source.tile_extent());
            self.current = source.layer(tile);
        }
        self.current.as_deref()
    }

    /// True if the cell's tile exists and the cell is unoccupied.
    ///
    /// A cell without a tile is impassable, not free.
    pub fn is_walkable<S: TileSource + ?Sized>(
        &mut self,
        source: &S,
        coord: GridCoord,
    ) -> bool {
        self.resolve(source, coord)
            .is_some_and(|layer| !layer.is_occupied(coord))
    }

    /// The cell's traversable height, or zero if its tile is missing.
    pub fn height_of<S: TileSource + ?Sized>(
        &mut self,
        source: &S,
        coord: GridCoord,
    ) -> f32 {
        self.resolve(source, coord)
            .map_or(0.0, |layer| layer.height_of(coord))
    }
}
