//! World-space to cell-space conversions.

use nalgebra::Point2;

use crate::{GridCoord, GridError, GridRect};

/// Conversion between continuous world space and discrete cell space.
///
/// A layout is just a positive cell size; the grid origin is fixed at the
/// world origin. Cell `(x, y)` covers the half-open world square
/// `[x * cell_size, (x + 1) * cell_size)` on each axis.
///
/// # Example
///
/// ```
/// use gw_grid::{CellLayout, GridCoord};
/// use nalgebra::Point2;
///
/// let layout = CellLayout::new(100.0);
/// assert_eq!(layout.coord_of(Point2::new(250.0, -1.0)), GridCoord::new(2, -1));
/// assert_eq!(layout.center_of(GridCoord::new(2, -1)), Point2::new(250.0, -50.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellLayout {
    cell_size: f32,
}

impl CellLayout {
    /// Creates a layout with the given cell size.
    ///
    /// The cell size must be positive and finite; use
    /// [`try_new`](Self::try_new) for fallible construction.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        debug_assert!(cell_size.is_finite() && cell_size > 0.0);
        Self { cell_size }
    }

    /// Creates a layout, validating the cell size.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidCellSize`] when the size is not a
    /// positive finite number.
    pub fn try_new(cell_size: f32) -> Result<Self, GridError> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(GridError::InvalidCellSize(cell_size));
        }
        Ok(Self { cell_size })
    }

    /// The world-space edge length of one cell.
    #[must_use]
    pub const fn cell_size(self) -> f32 {
        self.cell_size
    }

    /// The cell containing a world-space point.
    ///
    /// Points exactly on a cell boundary belong to the cell on the
    /// positive side.
    #[must_use]
    pub fn coord_of(self, point: Point2<f32>) -> GridCoord {
        #[allow(clippy::cast_possible_truncation)]
        let floor_div = |value: f32| -> i32 {
            if self.cell_size.abs() < f32::EPSILON {
                value.floor() as i32
            } else {
                (value / self.cell_size).floor() as i32
            }
        };
        GridCoord::new(floor_div(point.x), floor_div(point.y))
    }

    /// The world-space center of a cell.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn center_of(self, coord: GridCoord) -> Point2<f32> {
        Point2::new(
            (coord.x as f32 + 0.5) * self.cell_size,
            (coord.y as f32 + 0.5) * self.cell_size,
        )
    }

    /// The world-space minimum corner of a cell.
    ///
    /// Also maps corner lattice coordinates (as produced by
    /// [`CellDirection::edge_corners`](crate::CellDirection::edge_corners))
    /// to world positions.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn corner_of(self, coord: GridCoord) -> Point2<f32> {
        Point2::new(coord.x as f32 * self.cell_size, coord.y as f32 * self.cell_size)
    }

    /// The smallest rect covering a world-space box.
    ///
    /// The box is inclusive on both corners: a degenerate box (equal
    /// corners) still covers the one cell containing the point.
    #[must_use]
    pub fn rect_of(self, world_min: Point2<f32>, world_max: Point2<f32>) -> GridRect {
        GridRect::new(
            self.coord_of(world_min),
            self.coord_of(world_max) + GridCoord::new(1, 1),
        )
    }

    /// The world-space bounds of a rect, as (min, max) corners.
    #[must_use]
    pub fn world_bounds(self, rect: GridRect) -> (Point2<f32>, Point2<f32>) {
        (self.corner_of(rect.min), self.corner_of(rect.max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_coord_of_floors() {
        let layout = CellLayout::new(100.0);
        assert_eq!(layout.coord_of(Point2::new(0.0, 0.0)), GridCoord::new(0, 0));
        assert_eq!(layout.coord_of(Point2::new(99.9, 100.0)), GridCoord::new(0, 1));
        assert_eq!(layout.coord_of(Point2::new(-0.1, -100.0)), GridCoord::new(-1, -1));
        assert_eq!(layout.coord_of(Point2::new(-100.1, 250.0)), GridCoord::new(-2, 2));
    }

    #[test]
    fn test_center_and_corner() {
        let layout = CellLayout::new(50.0);
        let coord = GridCoord::new(-2, 3);
        assert_relative_eq!(layout.center_of(coord).x, -75.0);
        assert_relative_eq!(layout.center_of(coord).y, 175.0);
        assert_relative_eq!(layout.corner_of(coord).x, -100.0);
        assert_relative_eq!(layout.corner_of(coord).y, 150.0);

        // A cell center maps back to its own cell.
        assert_eq!(layout.coord_of(layout.center_of(coord)), coord);
    }

    #[test]
    fn test_rect_of_covers_box() {
        let layout = CellLayout::new(100.0);
        let rect = layout.rect_of(Point2::new(-50.0, 0.0), Point2::new(150.0, 99.0));
        assert_eq!(rect, GridRect::new(GridCoord::new(-1, 0), GridCoord::new(2, 1)));

        // Degenerate box still covers one cell.
        let point_rect = layout.rect_of(Point2::new(10.0, 10.0), Point2::new(10.0, 10.0));
        assert_eq!(point_rect.area(), 1);
    }

    #[test]
    fn test_try_new_rejects_bad_sizes() {
        assert!(CellLayout::try_new(0.0).is_err());
        assert!(CellLayout::try_new(-5.0).is_err());
        assert!(CellLayout::try_new(f32::NAN).is_err());
        assert!(CellLayout::try_new(f32::INFINITY).is_err());
        assert!(CellLayout::try_new(25.0).is_ok());
    }

    #[test]
    fn test_world_bounds_roundtrip() {
        let layout = CellLayout::new(10.0);
        let rect = GridRect::new(GridCoord::new(-3, 2), GridCoord::new(4, 5));
        let (min, max) = layout.world_bounds(rect);
        assert_relative_eq!(min.x, -30.0);
        assert_relative_eq!(max.y, 50.0);
        assert_eq!(layout.coord_of(min), rect.min);
    }
}
