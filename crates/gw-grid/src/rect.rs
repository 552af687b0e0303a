//! Half-open rectangles in cell space.

use crate::{GridCoord, TileCoord, TileExtent};

/// An axis-aligned, half-open rectangle of cells: `[min, max)`.
///
/// A rect is empty when either axis has no extent (`max <= min`). Empty
/// rects are legal inputs everywhere; bulk operations treat them as no-ops.
///
/// # Example
///
/// ```
/// use gw_grid::{GridCoord, GridRect};
///
/// let rect = GridRect::new(GridCoord::new(0, 0), GridCoord::new(4, 2));
/// assert_eq!(rect.width(), 4);
/// assert_eq!(rect.height(), 2);
/// assert_eq!(rect.area(), 8);
/// assert!(rect.contains(GridCoord::new(3, 1)));
/// assert!(!rect.contains(GridCoord::new(4, 1)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridRect {
    /// Inclusive lower corner.
    pub min: GridCoord,
    /// Exclusive upper corner.
    pub max: GridCoord,
}

impl GridRect {
    /// The canonical empty rect at the origin.
    pub const EMPTY: Self = Self {
        min: GridCoord::new(0, 0),
        max: GridCoord::new(0, 0),
    };

    /// Creates a rect from its corners.
    #[must_use]
    pub const fn new(min: GridCoord, max: GridCoord) -> Self {
        Self { min, max }
    }

    /// Creates a rect from a corner and a size.
    #[must_use]
    pub const fn from_origin_size(min: GridCoord, width: i32, height: i32) -> Self {
        Self {
            min,
            max: GridCoord::new(min.x + width, min.y + height),
        }
    }

    /// Width in cells. Negative when the rect is inverted.
    #[must_use]
    pub const fn width(self) -> i32 {
        self.max.x - self.min.x
    }

    /// Height in cells. Negative when the rect is inverted.
    #[must_use]
    pub const fn height(self) -> i32 {
        self.max.y - self.min.y
    }

    /// Number of cells covered. Zero for empty rects.
    #[must_use]
    pub fn area(self) -> i64 {
        if self.is_empty() {
            0
        } else {
            i64::from(self.width()) * i64::from(self.height())
        }
    }

    /// Returns `true` when the rect covers no cells.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y
    }

    /// Returns `true` when the cell lies inside the rect.
    #[must_use]
    pub const fn contains(self, coord: GridCoord) -> bool {
        coord.x >= self.min.x && coord.x < self.max.x && coord.y >= self.min.y && coord.y < self.max.y
    }

    /// Returns `true` when `other` lies entirely inside this rect.
    ///
    /// Every rect contains the empty rect.
    #[must_use]
    pub fn contains_rect(self, other: Self) -> bool {
        other.is_empty()
            || (other.min.x >= self.min.x
                && other.max.x <= self.max.x
                && other.min.y >= self.min.y
                && other.max.y <= self.max.y)
    }

    /// Returns `true` when the rects share at least one cell.
    #[must_use]
    pub fn intersects(self, other: Self) -> bool {
        !self.intersection(other).is_empty()
    }

    /// Component-wise intersection.
    ///
    /// The result may be inverted when the rects do not overlap; check
    /// [`is_empty`](Self::is_empty) before using it.
    #[must_use]
    pub fn intersection(self, other: Self) -> Self {
        Self {
            min: GridCoord::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y)),
            max: GridCoord::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y)),
        }
    }

    /// Smallest rect covering both inputs. Empty inputs are ignored.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Self {
            min: GridCoord::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: GridCoord::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }

    /// Grows the rect to cover `coord`.
    #[must_use]
    pub fn expanded_to(self, coord: GridCoord) -> Self {
        self.union(Self::from_origin_size(coord, 1, 1))
    }

    /// Shifts the rect by an offset.
    #[must_use]
    pub const fn translated(self, offset: GridCoord) -> Self {
        Self {
            min: GridCoord::new(self.min.x + offset.x, self.min.y + offset.y),
            max: GridCoord::new(self.max.x + offset.x, self.max.y + offset.y),
        }
    }

    /// Iterates the cells of the rect in column-major order (X outer,
    /// Y inner). Yields nothing for empty rects.
    pub fn cells(self) -> impl Iterator<Item = GridCoord> {
        let ys = if self.is_empty() {
            0..0
        } else {
            self.min.y..self.max.y
        };
        (self.min.x..self.max.x).flat_map(move |x| ys.clone().map(move |y| GridCoord::new(x, y)))
    }

    /// Iterates the tiles overlapped by this rect, in row-major order
    /// (Y outer, X inner). Yields nothing for empty rects.
    ///
    /// # Example
    ///
    /// ```
    /// use gw_grid::{GridCoord, GridRect, TileCoord, TileExtent};
    ///
    /// let rect = GridRect::new(GridCoord::new(-1, 0), GridCoord::new(33, 16));
    /// let tiles: Vec<_> = rect.tiles(TileExtent::square(32)).collect();
    /// assert_eq!(
    ///     tiles,
    ///     vec![TileCoord::new(-1, 0), TileCoord::new(0, 0), TileCoord::new(1, 0)],
    /// );
    /// ```
    pub fn tiles(self, extent: TileExtent) -> impl Iterator<Item = TileCoord> {
        let (min_tile, max_tile) = if self.is_empty() {
            (TileCoord::new(0, 0), TileCoord::new(0, 0))
        } else {
            let lo = TileCoord::containing(self.min, extent);
            let hi = TileCoord::containing(self.max - GridCoord::new(1, 1), extent);
            (lo, TileCoord::new(hi.x + 1, hi.y + 1))
        };
        (min_tile.y..max_tile.y)
            .flat_map(move |y| (min_tile.x..max_tile.x).map(move |x| TileCoord::new(x, y)))
    }
}
