//! Dirty area tracking and the pending tile queue.
//!
//! Edits to the world arrive as [`DirtyArea`] values. The [`DirtyQueue`]
//! buckets them by overlapped tile and hands out one [`PendingTile`] at a
//! time, preserving the order in which tiles first became dirty.

use std::collections::VecDeque;
use std::ops::{BitOr, BitOrAssign};

use gw_grid::{GridRect, TileCoord, TileExtent};

/// What kind of change a dirty area describes.
///
/// Flags combine with `|`. Geometry and bounds changes force a heightfield
/// rebuild of the touched cells; a modifiers-only change repaints occupancy
/// on top of the existing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DirtyFlags(u8);

impl DirtyFlags {
    /// No change. Areas with this flag set are ignored.
    pub const NONE: Self = Self(0);
    /// Solid geometry changed; the heightfield must be re-rasterized.
    pub const GEOMETRY: Self = Self(1);
    /// Only area modifiers changed; occupancy is repainted from the
    /// existing surface.
    pub const MODIFIERS: Self = Self(1 << 1);
    /// The navigable bounds changed.
    pub const BOUNDS: Self = Self(1 << 2);
    /// Every kind of change at once.
    pub const ALL: Self = Self(0b111);

    /// Returns `true` when any flag in `other` is also set in `self`.
    #[must_use]
    pub const fn has(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns `true` when no flag is set.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for DirtyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for DirtyFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// A rect of cells that changed, tagged with what changed in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyArea {
    /// Cells touched by the change.
    pub rect: GridRect,
    /// Kind of change.
    pub flags: DirtyFlags,
}

impl DirtyArea {
    /// Creates a dirty area.
    #[must_use]
    pub const fn new(rect: GridRect, flags: DirtyFlags) -> Self {
        Self { rect, flags }
    }
}

/// A tile waiting to be rebuilt, with every dirty area that touched it.
#[derive(Debug, Clone)]
pub struct PendingTile {
    /// The tile to rebuild.
    pub coord: TileCoord,
    /// Dirty areas overlapping this tile, in arrival order. Rects are not
    /// yet clipped to the tile.
    pub areas: Vec<DirtyArea>,
}

/// FIFO queue of tiles awaiting a rebuild.
///
/// Marking a tile that is already queued appends to its area list instead
/// of enqueueing it again, so a tile is rebuilt once per drain no matter
/// how many edits hit it.
#[derive(Debug)]
pub struct DirtyQueue {
    extent: TileExtent,
    pending: VecDeque<PendingTile>,
}

impl DirtyQueue {
    /// Creates an empty queue for tiles of the given extent.
    #[must_use]
    pub fn new(extent: TileExtent) -> Self {
        Self {
            extent,
            pending: VecDeque::new(),
        }
    }

    /// Records dirty areas, enqueueing every tile they overlap.
    ///
    /// Areas with an empty rect or no flags are skipped.
    pub fn mark(&mut self, areas: &[DirtyArea]) {
        for &area in areas {
            if area.rect.is_empty() || area.flags.is_none() {
                continue;
            }
            for tile in area.rect.tiles(self.extent) {
                match self.pending.iter_mut().find(|p| p.coord == tile) {
                    Some(pending) => pending.areas.push(area),
                    None => self.pending.push_back(PendingTile {
                        coord: tile,
                        areas: vec![area],
                    }),
                }
            }
        }
    }

    /// Removes and returns the oldest tile for which `is_blocked` is
    /// `false`, or `None` when every queued tile is blocked.
    pub fn take_next<F>(&mut self, mut is_blocked: F) -> Option<PendingTile>
    where
        F: FnMut(TileCoord) -> bool,
    {
        let index = self.pending.iter().position(|p| !is_blocked(p.coord))?;
        self.pending.remove(index)
    }

    /// Puts a tile back at the end of the queue.
    ///
    /// If the tile was re-marked in the meantime its areas merge into the
    /// existing entry, keeping that entry's queue position.
    pub fn requeue(&mut self, tile: PendingTile) {
        match self.pending.iter_mut().find(|p| p.coord == tile.coord) {
            Some(pending) => pending.areas.extend(tile.areas),
            None => self.pending.push_back(tile),
        }
    }

    /// Number of queued tiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` when no tile is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drops every queued tile.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Iterates queued tiles in drain order.
    pub fn iter(&self) -> impl Iterator<Item = &PendingTile> {
        self.pending.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gw_grid::GridCoord;

    fn rect(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> GridRect {
        GridRect::new(GridCoord::new(min_x, min_y), GridCoord::new(max_x, max_y))
    }

    #[test]
    fn test_flags_combine() {
        let flags = DirtyFlags::GEOMETRY | DirtyFlags::BOUNDS;
        assert!(flags.has(DirtyFlags::GEOMETRY));
        assert!(flags.has(DirtyFlags::BOUNDS));
        assert!(!flags.has(DirtyFlags::MODIFIERS));
        assert!(flags.has(DirtyFlags::ALL));
        assert!(!DirtyFlags::NONE.has(DirtyFlags::ALL));
        assert!(DirtyFlags::NONE.is_none());

        let mut flags = DirtyFlags::MODIFIERS;
        flags |= DirtyFlags::GEOMETRY;
        assert!(flags.has(DirtyFlags::GEOMETRY | DirtyFlags::MODIFIERS));
    }

    #[test]
    fn test_mark_single_tile() {
        let mut queue = DirtyQueue::new(TileExtent::square(32));
        queue.mark(&[DirtyArea::new(rect(5, 5, 10, 10), DirtyFlags::GEOMETRY)]);

        assert_eq!(queue.len(), 1);
        let tile = queue.take_next(|_| false).unwrap();
        assert_eq!(tile.coord, TileCoord::new(0, 0));
        assert_eq!(tile.areas.len(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_mark_spanning_area_enqueues_each_tile() {
        let mut queue = DirtyQueue::new(TileExtent::square(32));
        queue.mark(&[DirtyArea::new(rect(-1, -1, 33, 1), DirtyFlags::GEOMETRY)]);

        let coords: Vec<_> = queue.iter().map(|p| p.coord).collect();
        assert_eq!(
            coords,
            vec![
                TileCoord::new(-1, -1),
                TileCoord::new(0, -1),
                TileCoord::new(1, -1),
                TileCoord::new(-1, 0),
                TileCoord::new(0, 0),
                TileCoord::new(1, 0),
            ],
        );
    }

    #[test]
    fn test_mark_merges_into_queued_tile() {
        let mut queue = DirtyQueue::new(TileExtent::square(32));
        queue.mark(&[DirtyArea::new(rect(0, 0, 4, 4), DirtyFlags::GEOMETRY)]);
        queue.mark(&[DirtyArea::new(rect(40, 0, 44, 4), DirtyFlags::MODIFIERS)]);
        queue.mark(&[DirtyArea::new(rect(8, 8, 12, 12), DirtyFlags::MODIFIERS)]);

        // Tile (0, 0) keeps its original queue position with both areas.
        assert_eq!(queue.len(), 2);
        let first = queue.take_next(|_| false).unwrap();
        assert_eq!(first.coord, TileCoord::new(0, 0));
        assert_eq!(first.areas.len(), 2);
        assert!(first.areas[0].flags.has(DirtyFlags::GEOMETRY));
        assert!(first.areas[1].flags.has(DirtyFlags::MODIFIERS));
    }

    #[test]
    fn test_mark_skips_empty_and_flagless() {
        let mut queue = DirtyQueue::new(TileExtent::square(32));
        queue.mark(&[
            DirtyArea::new(GridRect::EMPTY, DirtyFlags::ALL),
            DirtyArea::new(rect(0, 0, 4, 4), DirtyFlags::NONE),
        ]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_take_next_skips_blocked() {
        let mut queue = DirtyQueue::new(TileExtent::square(32));
        queue.mark(&[
            DirtyArea::new(rect(0, 0, 1, 1), DirtyFlags::GEOMETRY),
            DirtyArea::new(rect(32, 0, 33, 1), DirtyFlags::GEOMETRY),
        ]);

        let blocked = TileCoord::new(0, 0);
        let tile = queue.take_next(|coord| coord == blocked).unwrap();
        assert_eq!(tile.coord, TileCoord::new(1, 0));

        // The blocked tile stays queued.
        assert_eq!(queue.len(), 1);
        assert!(queue.take_next(|coord| coord == blocked).is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_requeue_merges_with_new_marks() {
        let mut queue = DirtyQueue::new(TileExtent::square(32));
        queue.mark(&[DirtyArea::new(rect(0, 0, 1, 1), DirtyFlags::GEOMETRY)]);
        let taken = queue.take_next(|_| false).unwrap();

        queue.mark(&[DirtyArea::new(rect(2, 2, 3, 3), DirtyFlags::MODIFIERS)]);
        queue.requeue(taken);

        assert_eq!(queue.len(), 1);
        let merged = queue.take_next(|_| false).unwrap();
        assert_eq!(merged.areas.len(), 2);
    }

    #[test]
    fn test_clear() {
        let mut queue = DirtyQueue::new(TileExtent::square(32));
        queue.mark(&[DirtyArea::new(rect(0, 0, 64, 64), DirtyFlags::ALL)]);
        assert!(!queue.is_empty());
        queue.clear();
        assert!(queue.is_empty());
    }
}
