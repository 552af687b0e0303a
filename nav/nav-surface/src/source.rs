//! Read access to published tiles.

use std::sync::Arc;

use gw_grid::{GridCoord, TileCoord, TileExtent};

use crate::heightfield::Heightfield;
use crate::layer::TileLayer;

/// Read access to the published tiles of a navigation grid.
///
/// Implemented by tile stores and consumed by the pathfinder, the
/// regeneration scheduler, and world-space queries. Published tiles are
/// immutable: regeneration publishes replacement tiles instead of
/// mutating them, so a returned [`Arc`] stays valid for the whole of a
/// query even while publishes proceed concurrently.
pub trait TileSource {
    /// The tile dimensions, in cells, shared by every tile.
    fn tile_extent(&self) -> TileExtent;

    /// Get a tile's occupancy layer.
    ///
    /// Returns `None` when the tile has never been published or was
    /// removed. Callers treat an absent tile as blocking.
    fn layer(&self, tile: TileCoord) -> Option<Arc<TileLayer>>;

    /// Get the heightfield a tile was generated from.
    ///
    /// Returns `None` for absent tiles and for stores that do not retain
    /// heightfields.
    fn heightfield(&self, tile: TileCoord) -> Option<Arc<Heightfield>>;

    /// Get the occupancy layer of the tile containing a cell.
    fn layer_at(&self, cell: GridCoord) -> Option<Arc<TileLayer>> {
        self.layer(TileCoord::containing(cell, self.tile_extent()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gw_grid::GridRect;

    /// A source holding exactly one published tile.
    struct SingleTile {
        extent: TileExtent,
        coord: TileCoord,
        layer: Arc<TileLayer>,
    }

    impl TileSource for SingleTile {
        fn tile_extent(&self) -> TileExtent {
            self.extent
        }

        fn layer(&self, tile: TileCoord) -> Option<Arc<TileLayer>> {
            (tile == self.coord).then(|| Arc::clone(&self.layer))
        }

        fn heightfield(&self, _tile: TileCoord) -> Option<Arc<Heightfield>> {
            None
        }
    }

    #[test]
    fn test_layer_at_resolves_containing_tile() {
        let extent = TileExtent::square(32);
        let coord = TileCoord::new(-1, 0);
        let source = SingleTile {
            extent,
            coord,
            layer: Arc::new(TileLayer::new(coord.cell_rect(extent), 1.0, false, 0.0)),
        };

        assert!(source.layer_at(GridCoord::new(-32, 0)).is_some());
        assert!(source.layer_at(GridCoord::new(-1, 31)).is_some());
        assert!(source.layer_at(GridCoord::new(0, 0)).is_none());
        assert!(source.layer_at(GridCoord::new(-33, 0)).is_none());

        let rect = source.layer_at(GridCoord::new(-16, 16)).map(|l| l.rect());
        assert_eq!(
            rect,
            Some(GridRect::from_origin_size(GridCoord::new(-32, 0), 32, 32)),
        );
    }
}
