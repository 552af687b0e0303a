//! Published tile storage.
//!
//! The store maps tile coordinates to immutable published snapshots and
//! keeps the union rect of every stored tile current. All mutation
//! happens on the orchestrating thread (the regeneration scheduler
//! applies completions on its caller's thread), so the map carries no
//! lock; queries share tile snapshots through `Arc` and never observe a
//! half-published tile.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use gw_grid::{GridRect, TileCoord, TileExtent};
use nav_surface::{Heightfield, TileLayer, TileSource};

/// One published tile: occupancy plus the heightfield it was derived
/// from, when the publishing build rasterized one.
#[derive(Debug, Clone)]
pub struct TileData {
    /// Occupancy bits and surface heights.
    pub layer: Arc<TileLayer>,
    /// Solid-surface spans, kept for snapshots and later rebuilds.
    pub heightfield: Option<Arc<Heightfield>>,
}

/// Tile-keyed storage for published navigation data.
#[derive(Debug)]
pub struct TileStore {
    extent: TileExtent,
    tiles: HashMap<TileCoord, TileData>,
    /// Union of every stored tile's cell rect.
    bounds: GridRect,
}

impl TileStore {
    /// Creates an empty store for tiles of the given extent.
    #[must_use]
    pub fn new(extent: TileExtent) -> Self {
        Self {
            extent,
            tiles: HashMap::new(),
            bounds: GridRect::EMPTY,
        }
    }

    /// Returns the stored data for a tile.
    #[must_use]
    pub fn tile(&self, tile: TileCoord) -> Option<&TileData> {
        self.tiles.get(&tile)
    }

    /// Returns the union cell rect of every stored tile.
    #[must_use]
    pub const fn bounds(&self) -> GridRect {
        self.bounds
    }

    /// Returns the number of stored tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// True if no tiles are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Iterates over the stored tiles in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (TileCoord, &TileData)> {
        self.tiles.iter().map(|(tile, data)| (*tile, data))
    }

    /// Publishes a tile, replacing any previous snapshot.
    ///
    /// A publish without a heightfield keeps the previously stored one:
    /// modifier-only rebuilds replace occupancy while the rasterized
    /// spans stay valid.
    pub fn publish(&mut self, tile: TileCoord, layer: TileLayer, heightfield: Option<Heightfield>) {
        match self.tiles.entry(tile) {
            Entry::Occupied(mut entry) => {
                let data = entry.get_mut();
                data.layer = Arc::new(layer);
                if let Some(field) = heightfield {
                    data.heightfield = Some(Arc::new(field));
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(TileData {
                    layer: Arc::new(layer),
                    heightfield: heightfield.map(Arc::new),
                });
            }
        }
        self.bounds = self.bounds.union(tile.cell_rect(self.extent));
    }

    /// Removes a tile. Unknown coordinates are ignored.
    pub fn remove(&mut self, tile: TileCoord) {
        if self.tiles.remove(&tile).is_some() {
            self.recompute_bounds();
        }
    }

    /// Rebuilds the union rect from scratch. Removals are rare next to
    /// publishes, so shrinking pays the full scan.
    fn recompute_bounds(&mut self) {
        self.bounds = self
            .tiles
            .keys()
            .fold(GridRect::EMPTY, |bounds, tile| {
                bounds.union(tile.cell_rect(self.extent))
            });
    }
}

impl TileSource for TileStore {
    fn tile_extent(&self) -> TileExtent {
        self.extent
    }

    fn layer(&self, tile: TileCoord) -> Option<Arc<TileLayer>> {
        self.tiles.get(&tile).map(|data| Arc::clone(&data.layer))
    }

    fn heightfield(&self, tile: TileCoord) -> Option<Arc<Heightfield>> {
        self.tiles
            .get(&tile)
            .and_then(|data| data.heightfield.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gw_grid::GridCoord;

    const EXTENT: TileExtent = TileExtent::new(16, 32);

    fn open_layer(tile: TileCoord) -> TileLayer {
        TileLayer::new(tile.cell_rect(EXTENT), 1.0, false, 0.0)
    }

    fn flat_field(tile: TileCoord, z: f32) -> Heightfield {
        let mut field = Heightfield::new(tile.cell_rect(EXTENT), 1.0, 0.0);
        field.insert_span(tile.cell_rect(EXTENT).min, z, z);
        field
    }

    #[test]
    fn test_publish_and_fetch() {
        let mut store = TileStore::new(EXTENT);
        let tile = TileCoord::new(0, 0);
        assert!(store.is_empty());
        assert!(store.layer(tile).is_none());

        store.publish(tile, open_layer(tile), None);
        assert_eq!(store.len(), 1);
        assert_eq!(store.tile_extent(), EXTENT);

        let layer = store.layer(tile).unwrap();
        assert!(!layer.is_occupied(GridCoord::new(3, 3)));
        assert!(store.heightfield(tile).is_none());
        assert!(store.layer(TileCoord::new(1, 0)).is_none());
    }

    #[test]
    fn test_republish_replaces_layer_and_keeps_heightfield() {
        let mut store = TileStore::new(EXTENT);
        let tile = TileCoord::new(0, 0);
        store.publish(tile, open_layer(tile), Some(flat_field(tile, 4.0)));
        assert!(store.heightfield(tile).is_some());

        let mut blocked = open_layer(tile);
        blocked.set_occupied(GridCoord::new(2, 2), true);
        store.publish(tile, blocked, None);

        let layer = store.layer(tile).unwrap();
        assert!(layer.is_occupied(GridCoord::new(2, 2)));
        // The heightfield from the first publish is still there.
        assert!(store.heightfield(tile).is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_clears_tile() {
        let mut store = TileStore::new(EXTENT);
        let west = TileCoord::new(0, 0);
        let east = TileCoord::new(1, 0);
        store.publish(west, open_layer(west), None);
        store.publish(east, open_layer(east), None);

        store.remove(east);
        assert_eq!(store.len(), 1);
        assert!(store.layer(east).is_none());
        assert!(store.layer(west).is_some());

        // Removing again is a no-op.
        store.remove(east);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_bounds_track_published_tiles() {
        let mut store = TileStore::new(EXTENT);
        assert!(store.bounds().is_empty());

        let origin = TileCoord::new(0, 0);
        store.publish(origin, open_layer(origin), None);
        assert_eq!(
            store.bounds(),
            GridRect::new(GridCoord::new(0, 0), GridCoord::new(16, 32))
        );

        let far = TileCoord::new(2, 1);
        store.publish(far, open_layer(far), None);
        assert_eq!(
            store.bounds(),
            GridRect::new(GridCoord::new(0, 0), GridCoord::new(48, 64))
        );

        store.remove(far);
        assert_eq!(
            store.bounds(),
            GridRect::new(GridCoord::new(0, 0), GridCoord::new(16, 32))
        );

        store.remove(origin);
        assert!(store.bounds().is_empty());
    }
}
