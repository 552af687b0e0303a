//! Cardinal cell directions.

use crate::GridCoord;

/// One of the four cardinal directions between edge-adjacent cells.
///
/// The discriminant order (east, north, west, south) is the neighbor
/// expansion order used throughout the crate family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CellDirection {
    /// Towards +X.
    East,
    /// Towards +Y.
    North,
    /// Towards -X.
    West,
    /// Towards -Y.
    South,
}

impl CellDirection {
    /// All four directions, in east, north, west, south order.
    pub const ALL: [Self; 4] = [Self::East, Self::North, Self::West, Self::South];

    /// The cell offset of one step in this direction.
    #[must_use]
    pub const fn offset(self) -> GridCoord {
        match self {
            Self::East => GridCoord::new(1, 0),
            Self::North => GridCoord::new(0, 1),
            Self::West => GridCoord::new(-1, 0),
            Self::South => GridCoord::new(0, -1),
        }
    }

    /// The neighbor of `cell` in this direction.
    #[must_use]
    pub const fn step(self, cell: GridCoord) -> GridCoord {
        let offset = self.offset();
        GridCoord::new(cell.x + offset.x, cell.y + offset.y)
    }

    /// The direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::East => Self::West,
            Self::North => Self::South,
            Self::West => Self::East,
            Self::South => Self::North,
        }
    }

    /// Corner lattice coordinates of the cell edge facing this direction.
    ///
    /// Corners live on the lattice of cell minima: corner `(x, y)` is the
    /// world position `(x * cell_size, y * cell_size)`. The returned pair
    /// is ordered clockwise around the cell, so the edges of the four
    /// directions chain into a closed outline.
    ///
    /// # Example
    ///
    /// ```
    /// use gw_grid::{CellDirection, GridCoord};
    ///
    /// let cell = GridCoord::new(2, 3);
    /// let (start, end) = CellDirection::East.edge_corners(cell);
    /// assert_eq!(start, GridCoord::new(3, 4));
    /// assert_eq!(end, GridCoord::new(3, 3));
    /// ```
    #[must_use]
    pub const fn edge_corners(self, cell: GridCoord) -> (GridCoord, GridCoord) {
        let (start, end) = match self {
            Self::East => ((1, 1), (1, 0)),
            Self::North => ((0, 1), (1, 1)),
            Self::West => ((0, 0), (0, 1)),
            Self::South => ((1, 0), (0, 0)),
        };
        (
            GridCoord::new(cell.x + start.0, cell.y + start.1),
            GridCoord::new(cell.x + end.0, cell.y + end.1),
        )
    }
}
