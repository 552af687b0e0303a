//! Cell and tile coordinate types.

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// A discrete 2D coordinate in grid space.
///
/// Uses `i32` coordinates to support both positive and negative indices,
/// allowing the grid origin to be placed anywhere in world space. One
/// coordinate addresses one square cell; the cell covers the half-open
/// world region `[x * cell_size, (x + 1) * cell_size)` on each axis.
///
/// # Example
///
/// ```
/// use gw_grid::GridCoord;
///
/// let coord = GridCoord::new(3, -7);
/// assert_eq!(coord.x, 3);
/// assert_eq!(coord.y, -7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridCoord {
    /// X coordinate (column).
    pub x: i32,
    /// Y coordinate (row).
    pub y: i32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Creates a coordinate at the origin (0, 0).
    #[must_use]
    pub const fn origin() -> Self {
        Self::new(0, 0)
    }

    /// Returns the coordinate as a tuple.
    #[must_use]
    pub const fn as_tuple(self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Returns the four edge-adjacent neighbors, in east, north, west,
    /// south order.
    ///
    /// # Example
    ///
    /// ```
    /// use gw_grid::GridCoord;
    ///
    /// let neighbors = GridCoord::origin().edge_neighbors();
    /// assert_eq!(neighbors[0], GridCoord::new(1, 0));
    /// assert_eq!(neighbors[3], GridCoord::new(0, -1));
    /// ```
    #[must_use]
    pub const fn edge_neighbors(self) -> [Self; 4] {
        [
            Self::new(self.x.wrapping_add(1), self.y),
            Self::new(self.x, self.y.wrapping_add(1)),
            Self::new(self.x.wrapping_sub(1), self.y),
            Self::new(self.x, self.y.wrapping_sub(1)),
        ]
    }

    /// Computes the Manhattan distance to another coordinate.
    ///
    /// # Example
    ///
    /// ```
    /// use gw_grid::GridCoord;
    ///
    /// let a = GridCoord::new(0, 0);
    /// let b = GridCoord::new(3, -4);
    /// assert_eq!(a.manhattan_distance(b), 7);
    /// ```
    #[must_use]
    pub const fn manhattan_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }

    /// Adds an offset to this coordinate, returning `None` on overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        Some(Self::new(
            self.x.checked_add(other.x)?,
            self.y.checked_add(other.y)?,
        ))
    }
}

impl Add for GridCoord {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for GridCoord {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for GridCoord {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for GridCoord {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Neg for GridCoord {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl From<(i32, i32)> for GridCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// The size of one tile, in cells.
///
/// Both axes must be positive. Tile partitioning is uniform: tile `(0, 0)`
/// covers cells `[0, width) x [0, height)`, tile `(-1, 0)` covers
/// `[-width, 0) x [0, height)`, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileExtent {
    /// Cells per tile along X.
    pub width: i32,
    /// Cells per tile along Y.
    pub height: i32,
}

impl TileExtent {
    /// Creates a new tile extent.
    ///
    /// Both dimensions must be positive.
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        debug_assert!(width > 0 && height > 0);
        Self { width, height }
    }

    /// Creates a square tile extent.
    #[must_use]
    pub const fn square(side: i32) -> Self {
        Self::new(side, side)
    }

    /// Number of cells in one tile.
    #[must_use]
    pub fn cell_count(self) -> i64 {
        i64::from(self.width) * i64::from(self.height)
    }
}

/// A discrete 2D coordinate in tile space.
///
/// Each tile covers a [`TileExtent`]-sized block of cells; tile coordinates
/// are the floor-division of cell coordinates by the extent and may be
/// negative.
///
/// # Example
///
/// ```
/// use gw_grid::{GridCoord, TileCoord, TileExtent};
///
/// let extent = TileExtent::square(128);
/// assert_eq!(
///     TileCoord::containing(GridCoord::new(-1, 130), extent),
///     TileCoord::new(-1, 1),
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileCoord {
    /// X coordinate of the tile.
    pub x: i32,
    /// Y coordinate of the tile.
    pub y: i32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the tile containing the given cell.
    #[must_use]
    pub const fn containing(cell: GridCoord, extent: TileExtent) -> Self {
        Self::new(
            cell.x.div_euclid(extent.width),
            cell.y.div_euclid(extent.height),
        )
    }

    /// Returns the half-open cell rect covered by this tile.
    ///
    /// # Example
    ///
    /// ```
    /// use gw_grid::{GridCoord, TileCoord, TileExtent};
    ///
    /// let rect = TileCoord::new(-1, 0).cell_rect(TileExtent::square(32));
    /// assert_eq!(rect.min, GridCoord::new(-32, 0));
    /// assert_eq!(rect.max, GridCoord::new(0, 32));
    /// ```
    #[must_use]
    pub const fn cell_rect(self, extent: TileExtent) -> crate::GridRect {
        let min = GridCoord::new(self.x * extent.width, self.y * extent.height);
        crate::GridRect {
            min,
            max: GridCoord::new(min.x + extent.width, min.y + extent.height),
        }
    }
}

impl From<(i32, i32)> for TileCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}
