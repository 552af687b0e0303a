//! Navigation path containers.
//!
//! A [`NavPath`] is the world-space product of a grid query: an ordered
//! run of waypoints, the grid-space bounding box of the cells behind
//! them, and a validity flag a grid may clear when a tile under the
//! path changes.

use std::sync::atomic::{AtomicBool, Ordering};

use gw_grid::{GridCoord, GridRect};
use nalgebra::Point3;

/// One waypoint of a navigation path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    /// World-space location of the waypoint.
    pub position: Point3<f32>,
    /// The grid cell the waypoint stands on.
    pub cell: GridCoord,
}

impl PathPoint {
    /// Creates a waypoint.
    #[must_use]
    pub const fn new(position: Point3<f32>, cell: GridCoord) -> Self {
        Self { position, cell }
    }
}

/// A world-space path over a navigation grid.
///
/// Paths are immutable once built apart from their validity flag, so a
/// grid can hand out `Arc<NavPath>` and later invalidate affected paths
/// in place while readers keep their snapshots.
///
/// # Example
///
/// ```
/// use gw_grid::{GridCoord, GridRect};
/// use nalgebra::Point3;
/// use nav_path::{NavPath, PathPoint};
///
/// let path = NavPath::new(
///     vec![
///         PathPoint::new(Point3::new(0.5, 0.5, 0.0), GridCoord::new(0, 0)),
///         PathPoint::new(Point3::new(3.5, 0.5, 0.0), GridCoord::new(3, 0)),
///         PathPoint::new(Point3::new(3.5, 4.5, 0.0), GridCoord::new(3, 4)),
///     ],
///     GridRect::new(GridCoord::new(0, 0), GridCoord::new(4, 5)),
///     true,
/// );
///
/// assert_eq!(path.len(), 3);
/// assert!((path.length() - 7.0).abs() < 1e-6);
/// assert!(path.is_valid());
/// ```
#[derive(Debug)]
pub struct NavPath {
    /// Ordered waypoints, query start first.
    points: Vec<PathPoint>,
    /// Grid cells covered by the retained waypoints, exclusive max.
    grid_bounds: GridRect,
    /// Whether the path was built with string pulling.
    wants_string_pulling: bool,
    /// Cached world-space length over all segments.
    length: f32,
    /// Cleared when a tile under `grid_bounds` is republished.
    valid: AtomicBool,
}

impl NavPath {
    /// Creates a path from postprocessed waypoints.
    #[must_use]
    pub fn new(points: Vec<PathPoint>, grid_bounds: GridRect, wants_string_pulling: bool) -> Self {
        let length = segment_length(&points, 0);
        Self {
            points,
            grid_bounds,
            wants_string_pulling,
            length,
            valid: AtomicBool::new(true),
        }
    }

    /// Creates a single-point path.
    ///
    /// Used for queries whose start and end fall together. The grid
    /// bounding box stays empty, so tile changes never invalidate the
    /// path.
    #[must_use]
    pub fn single(point: PathPoint, wants_string_pulling: bool) -> Self {
        Self::new(vec![point], GridRect::EMPTY, wants_string_pulling)
    }

    /// Returns the waypoints, query start first.
    #[must_use]
    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    /// Returns the first waypoint, if any.
    #[must_use]
    pub fn first(&self) -> Option<&PathPoint> {
        self.points.first()
    }

    /// Returns the last waypoint, if any.
    #[must_use]
    pub fn last(&self) -> Option<&PathPoint> {
        self.points.last()
    }

    /// Returns the number of waypoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the path has no waypoints.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns the total world-space length.
    #[must_use]
    pub const fn length(&self) -> f32 {
        self.length
    }

    /// Returns the length of the remaining path from the waypoint at
    /// `index` to the end.
    ///
    /// Indices at or past the last waypoint cost nothing.
    #[must_use]
    pub fn length_from(&self, index: usize) -> f32 {
        segment_length(&self.points, index)
    }

    /// Returns the grid-space bounding box of the retained cells.
    ///
    /// The maximum is exclusive. Tile republishes intersecting this box
    /// invalidate the path.
    #[must_use]
    pub const fn grid_bounds(&self) -> GridRect {
        self.grid_bounds
    }

    /// Returns whether the path was built with string pulling.
    #[must_use]
    pub const fn wants_string_pulling(&self) -> bool {
        self.wants_string_pulling
    }

    /// Returns `true` while no tile under the path has changed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Relaxed)
    }

    /// Marks the path stale.
    pub fn invalidate(&self) {
        self.valid.store(false, Ordering::Relaxed);
    }
}

/// Sum of segment lengths from the waypoint at `index` to the end.
fn segment_length(points: &[PathPoint], index: usize) -> f32 {
    let tail = points.get(index..).unwrap_or_default();
    tail.windows(2)
        .map(|pair| (pair[1].position - pair[0].position).norm())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn waypoint(x: f32, y: f32, z: f32) -> PathPoint {
        PathPoint::new(
            Point3::new(x, y, z),
            GridCoord::new(x.floor() as i32, y.floor() as i32),
        )
    }

    #[test]
    fn test_length_accumulates_segments() {
        let path = NavPath::new(
            vec![
                waypoint(0.0, 0.0, 0.0),
                waypoint(3.0, 0.0, 0.0),
                waypoint(3.0, 4.0, 0.0),
            ],
            GridRect::new(GridCoord::new(0, 0), GridCoord::new(4, 5)),
            true,
        );

        assert_relative_eq!(path.length(), 7.0);
        assert_relative_eq!(path.length_from(0), 7.0);
        assert_relative_eq!(path.length_from(1), 4.0);
        assert_relative_eq!(path.length_from(2), 0.0);
        assert_relative_eq!(path.length_from(9), 0.0);
    }

    #[test]
    fn test_length_includes_height_changes() {
        let path = NavPath::new(
            vec![waypoint(0.0, 0.0, 0.0), waypoint(0.0, 3.0, 4.0)],
            GridRect::EMPTY,
            false,
        );
        assert_relative_eq!(path.length(), 5.0);
    }

    #[test]
    fn test_single_point_path() {
        let path = NavPath::single(waypoint(2.5, 2.5, 1.0), true);
        assert_eq!(path.len(), 1);
        assert!(!path.is_empty());
        assert_relative_eq!(path.length(), 0.0);
        assert!(path.grid_bounds().is_empty());
        assert!(path.wants_string_pulling());
    }

    #[test]
    fn test_invalidate_is_sticky() {
        let path = NavPath::new(vec![waypoint(0.0, 0.0, 0.0)], GridRect::EMPTY, false);
        assert!(path.is_valid());
        path.invalidate();
        assert!(!path.is_valid());
        path.invalidate();
        assert!(!path.is_valid());
    }

    #[test]
    fn test_first_and_last() {
        let path = NavPath::new(
            vec![waypoint(0.0, 0.0, 0.0), waypoint(1.0, 0.0, 0.0)],
            GridRect::EMPTY,
            true,
        );
        assert_eq!(path.first().map(|p| p.cell), Some(GridCoord::new(0, 0)));
        assert_eq!(path.last().map(|p| p.cell), Some(GridCoord::new(1, 0)));
    }
}
