//! Corridor postprocessing.
//!
//! A raw search result is a run of adjacent cells. Postprocessing turns
//! it into world-space waypoints, either by string pulling (drop every
//! cell the previous waypoint can already see past) or by keeping only
//! the cells where the corridor changes direction. Both modes also
//! accumulate the grid-space bounding box of the retained cells, which
//! the owning grid later uses to invalidate paths when tiles change.

use gw_grid::{CellLayout, GridCoord, GridRect, GridTraversal};
use nalgebra::{Point2, Point3};
use nav_surface::TileSource;

use crate::cache::LayerCache;
use crate::path::PathPoint;

/// A postprocessed corridor.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedPath {
    /// World-space waypoints, query start first.
    pub points: Vec<PathPoint>,
    /// Grid cells covered by the retained waypoints, exclusive max.
    pub grid_bounds: GridRect,
}

impl ProcessedPath {
    fn empty() -> Self {
        Self {
            points: Vec::new(),
            grid_bounds: GridRect::EMPTY,
        }
    }
}

/// Turns cell corridors into world-space waypoint runs.
#[derive(Debug)]
pub struct PathPostprocess<'a, S: TileSource + ?Sized> {
    source: &'a S,
    layout: CellLayout,
}

impl<'a, S: TileSource + ?Sized> PathPostprocess<'a, S> {
    /// Creates a postprocessor over `source` with the grid's cell layout.
    #[must_use]
    pub const fn new(source: &'a S, layout: CellLayout) -> Self {
        Self { source, layout }
    }

    /// String-pulls a corridor into the fewest waypoints with pairwise
    /// line of sight.
    ///
    /// `start` and `end` are the exact query locations and are kept
    /// verbatim as the first and last waypoints. Interior waypoints sit
    /// on cell centers at the cell's surface height. Each retained
    /// waypoint has an unobstructed 2D segment to the next one; if even
    /// the end cell's center cannot see `end` directly, the center is
    /// kept as a final interior waypoint.
    ///
    /// An empty corridor yields an empty path.
    #[must_use]
    pub fn string_pull(
        &self,
        start: Point3<f32>,
        end: Point3<f32>,
        cells: &[GridCoord],
    ) -> ProcessedPath {
        let Some(&start_cell) = cells.first() else {
            return ProcessedPath::empty();
        };
        let end_cell = cells[cells.len() - 1];
        let mut cache = LayerCache::new();

        let mut points = vec![PathPoint::new(start, start_cell)];
        let mut bounds = GridRect::from_origin_size(start_cell, 1, 1);
        // Last committed waypoint, in 2D. Casts run from here.
        let mut anchor = start.xy();

        for pair in cells.windows(2) {
            let target = self.layout.center_of(pair[1]);
            if self.segment_blocked(&mut cache, anchor, target) {
                // The next center is out of sight, so the cell before
                // it becomes a waypoint.
                let retained = pair[0];
                let center = self.layout.center_of(retained);
                let height = cache.height_of(self.source, retained);
                points.push(PathPoint::new(
                    Point3::new(center.x, center.y, height),
                    retained,
                ));
                bounds = bounds.expanded_to(retained);
                anchor = center;
            }
        }

        if self.segment_blocked(&mut cache, anchor, end.xy()) {
            let center = self.layout.center_of(end_cell);
            let height = cache.height_of(self.source, end_cell);
            points.push(PathPoint::new(
                Point3::new(center.x, center.y, height),
                end_cell,
            ));
        }

        points.push(PathPoint::new(end, end_cell));
        ProcessedPath {
            points,
            grid_bounds: bounds.expanded_to(end_cell),
        }
    }

    /// Keeps only the cells where the corridor changes direction.
    ///
    /// Cheaper than string pulling and keeps waypoints on the corridor
    /// itself, at the cost of more waypoints on staircase corridors.
    #[must_use]
    pub fn corners_only(
        &self,
        start: Point3<f32>,
        end: Point3<f32>,
        cells: &[GridCoord],
    ) -> ProcessedPath {
        let Some(&start_cell) = cells.first() else {
            return ProcessedPath::empty();
        };
        let end_cell = cells[cells.len() - 1];
        let mut cache = LayerCache::new();

        let mut points = vec![PathPoint::new(start, start_cell)];
        let mut bounds = GridRect::from_origin_size(start_cell, 1, 1);
        let mut anchor_cell = start_cell;

        for index in 2..cells.len() {
            // A step off both of the anchor's axes means the corridor
            // turned at the previous cell.
            let diff = cells[index] - anchor_cell;
            if diff.x != 0 && diff.y != 0 {
                let corner = cells[index - 1];
                let center = self.layout.center_of(corner);
                let height = cache.height_of(self.source, corner);
                points.push(PathPoint::new(
                    Point3::new(center.x, center.y, height),
                    corner,
                ));
                bounds = bounds.expanded_to(corner);
                anchor_cell = corner;
            }
        }

        points.push(PathPoint::new(end, end_cell));
        ProcessedPath {
            points,
            grid_bounds: bounds.expanded_to(end_cell),
        }
    }

    /// True if the 2D segment from `from` to `to` leaves walkable cells
    /// at any point, including at `from` itself.
    fn segment_blocked(&self, cache: &mut LayerCache, from: Point2<f32>, to: Point2<f32>) -> bool {
        if !cache.is_walkable(self.source, self.layout.coord_of(from)) {
            return true;
        }
        GridTraversal::new(from, to, self.layout)
            .any(|step| !cache.is_walkable(self.source, step.coord))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use approx::assert_relative_eq;
    use gw_grid::{GridRect, TileCoord, TileExtent};
    use nav_surface::{Heightfield, TileLayer};

    use super::*;

    const EXTENT: TileExtent = TileExtent::new(16, 32);

    /// Single-tile source with individually blockable cells.
    struct TestGrid {
        layer: Arc<TileLayer>,
    }

    impl TestGrid {
        fn open(height: f32) -> Self {
            let rect = TileCoord::new(0, 0).cell_rect(EXTENT);
            Self {
                layer: Arc::new(TileLayer::new(rect, 1.0, false, height)),
            }
        }

        fn block(&mut self, x: i32, y: i32) {
            Arc::make_mut(&mut self.layer).set_occupied(GridCoord::new(x, y), true);
        }
    }

    impl TileSource for TestGrid {
        fn tile_extent(&self) -> TileExtent {
            EXTENT
        }

        fn layer(&self, tile: TileCoord) -> Option<Arc<TileLayer>> {
            (tile == TileCoord::new(0, 0)).then(|| Arc::clone(&self.layer))
        }

        fn heightfield(&self, _tile: TileCoord) -> Option<Arc<Heightfield>> {
            None
        }
    }

    fn layout() -> CellLayout {
        CellLayout::new(1.0)
    }

    fn straight_cells(len: i32) -> Vec<GridCoord> {
        (0..len).map(|x| GridCoord::new(x, 0)).collect()
    }

    #[test]
    fn test_string_pull_collapses_straight_corridor() {
        let grid = TestGrid::open(0.0);
        let post = PathPostprocess::new(&grid, layout());
        let start = Point3::new(0.5, 0.5, 0.0);
        let end = Point3::new(6.5, 0.5, 0.0);

        let processed = post.string_pull(start, end, &straight_cells(7));

        assert_eq!(processed.points.len(), 2);
        assert_eq!(processed.points[0].position, start);
        assert_eq!(processed.points[0].cell, GridCoord::new(0, 0));
        assert_eq!(processed.points[1].position, end);
        assert_eq!(processed.points[1].cell, GridCoord::new(6, 0));
        assert_eq!(
            processed.grid_bounds,
            GridRect::new(GridCoord::new(0, 0), GridCoord::new(7, 1))
        );
    }

    #[test]
    fn test_string_pull_retains_corner_of_l_corridor() {
        let mut grid = TestGrid::open(2.0);
        // Wall filling the inside of the L. Free cells are the column
        // x = 0 and the row y = 5.
        for x in 1..6 {
            for y in 0..5 {
                grid.block(x, y);
            }
        }
        let post = PathPostprocess::new(&grid, layout());

        let mut cells: Vec<GridCoord> = (0..6).map(|y| GridCoord::new(0, y)).collect();
        cells.extend((1..6).map(|x| GridCoord::new(x, 5)));
        let start = Point3::new(0.5, 0.5, 7.5);
        let end = Point3::new(5.5, 5.5, 9.0);

        let processed = post.string_pull(start, end, &cells);

        assert_eq!(processed.points.len(), 3);
        // Query locations are kept verbatim, heights included.
        assert_eq!(processed.points[0].position, start);
        assert_eq!(processed.points[2].position, end);
        // The corner waypoint sits on the cell center at surface height.
        assert_eq!(processed.points[1].cell, GridCoord::new(0, 5));
        assert_relative_eq!(processed.points[1].position.x, 0.5);
        assert_relative_eq!(processed.points[1].position.y, 5.5);
        assert_relative_eq!(processed.points[1].position.z, 2.0);
        assert_eq!(
            processed.grid_bounds,
            GridRect::new(GridCoord::new(0, 0), GridCoord::new(6, 6))
        );
    }

    #[test]
    fn test_string_pull_appends_end_cell_center_when_end_is_out_of_sight() {
        let mut grid = TestGrid::open(1.5);
        grid.block(0, 1);
        let post = PathPostprocess::new(&grid, layout());

        // Two-step corridor bending around the blocked cell. Every cell
        // center is visible from the start, but the end location up in
        // the corner of (1, 1) is not.
        let cells = vec![
            GridCoord::new(0, 0),
            GridCoord::new(1, 0),
            GridCoord::new(1, 1),
        ];
        let start = Point3::new(0.6, 0.5, 0.0);
        let end = Point3::new(1.2, 1.8, 0.0);

        let processed = post.string_pull(start, end, &cells);

        assert_eq!(processed.points.len(), 3);
        let appended = processed.points[1];
        assert_eq!(appended.cell, GridCoord::new(1, 1));
        assert_relative_eq!(appended.position.x, 1.5);
        assert_relative_eq!(appended.position.y, 1.5);
        assert_relative_eq!(appended.position.z, 1.5);
        assert_eq!(processed.points[2].position, end);
    }

    #[test]
    fn test_string_pull_single_cell_keeps_query_locations() {
        let grid = TestGrid::open(0.0);
        let post = PathPostprocess::new(&grid, layout());
        let start = Point3::new(0.2, 0.2, 1.0);
        let end = Point3::new(0.7, 0.7, 1.0);

        let processed = post.string_pull(start, end, &[GridCoord::new(0, 0)]);

        assert_eq!(processed.points.len(), 2);
        assert_eq!(processed.points[0].position, start);
        assert_eq!(processed.points[1].position, end);
        assert_eq!(
            processed.grid_bounds,
            GridRect::new(GridCoord::new(0, 0), GridCoord::new(1, 1))
        );
    }

    #[test]
    fn test_empty_corridor_yields_empty_path() {
        let grid = TestGrid::open(0.0);
        let post = PathPostprocess::new(&grid, layout());

        let pulled = post.string_pull(Point3::origin(), Point3::origin(), &[]);
        assert!(pulled.points.is_empty());
        assert!(pulled.grid_bounds.is_empty());

        let corners = post.corners_only(Point3::origin(), Point3::origin(), &[]);
        assert!(corners.points.is_empty());
        assert!(corners.grid_bounds.is_empty());
    }

    #[test]
    fn test_corners_only_retains_single_turn() {
        let grid = TestGrid::open(0.5);
        let post = PathPostprocess::new(&grid, layout());

        let cells = vec![
            GridCoord::new(0, 0),
            GridCoord::new(1, 0),
            GridCoord::new(2, 0),
            GridCoord::new(2, 1),
            GridCoord::new(2, 2),
        ];
        let start = Point3::new(0.5, 0.5, 0.5);
        let end = Point3::new(2.5, 2.5, 0.5);

        let processed = post.corners_only(start, end, &cells);

        assert_eq!(processed.points.len(), 3);
        assert_eq!(processed.points[1].cell, GridCoord::new(2, 0));
        assert_relative_eq!(processed.points[1].position.x, 2.5);
        assert_relative_eq!(processed.points[1].position.y, 0.5);
        assert_relative_eq!(processed.points[1].position.z, 0.5);
        assert_eq!(
            processed.grid_bounds,
            GridRect::new(GridCoord::new(0, 0), GridCoord::new(3, 3))
        );
    }

    #[test]
    fn test_corners_only_keeps_every_staircase_bend() {
        let grid = TestGrid::open(0.0);
        let post = PathPostprocess::new(&grid, layout());

        let cells = vec![
            GridCoord::new(0, 0),
            GridCoord::new(1, 0),
            GridCoord::new(1, 1),
            GridCoord::new(2, 1),
            GridCoord::new(2, 2),
        ];
        let start = Point3::new(0.5, 0.5, 0.0);
        let end = Point3::new(2.5, 2.5, 0.0);

        let processed = post.corners_only(start, end, &cells);

        let retained: Vec<GridCoord> = processed.points[1..processed.points.len() - 1]
            .iter()
            .map(|point| point.cell)
            .collect();
        assert_eq!(
            retained,
            vec![
                GridCoord::new(1, 0),
                GridCoord::new(1, 1),
                GridCoord::new(2, 1),
            ]
        );
    }
}
