//! Per-tile occupancy and height layer.

use gw_grid::{BitGrid, CellLayout, GridCoord, GridRect, Point2};

/// Occupancy bits plus per-cell surface heights for one tile.
///
/// The layer covers a fixed cell rectangle. Occupancy is backed by a
/// [`BitGrid`] addressed in layer-local space; heights are a parallel
/// array with one `f32` per cell. Reads outside the rect are total:
/// occupancy reads `false`, heights read `0.0`. Blocked-by-absence
/// semantics live a level up, where a missing tile blocks movement.
///
/// # Example
///
/// ```
/// use gw_grid::{GridCoord, GridRect};
/// use nav_surface::TileLayer;
///
/// let rect = GridRect::from_origin_size(GridCoord::new(0, 0), 8, 8);
/// let mut layer = TileLayer::new(rect, 100.0, false, 0.0);
///
/// let cell = GridCoord::new(3, 4);
/// assert!(layer.set_occupied(cell, true));
/// layer.set_height(cell, 250.0);
///
/// assert!(layer.is_occupied(cell));
/// assert_eq!(layer.height_of(cell), 250.0);
/// assert!(!layer.is_occupied(GridCoord::new(100, 100)));
/// ```
#[derive(Debug, Clone)]
pub struct TileLayer {
    occupancy: BitGrid,
    heights: Vec<f32>,
    rect: GridRect,
    cell_size: f32,
}

impl TileLayer {
    /// Creates a layer covering `rect` with every cell set to `occupied`
    /// and every height set to `height`.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn new(rect: GridRect, cell_size: f32, occupied: bool, height: f32) -> Self {
        debug_assert!(cell_size > 0.0);
        let cell_count = rect.area() as usize;
        Self {
            occupancy: BitGrid::new(rect.width() as u32, rect.height() as u32, occupied),
            heights: vec![height; cell_count],
            rect,
            cell_size,
        }
    }

    /// The cell rectangle this layer covers.
    #[must_use]
    pub const fn rect(&self) -> GridRect {
        self.rect
    }

    /// World-space edge length of one cell.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Whether `coord` is occupied; `false` outside the layer's rect.
    #[must_use]
    pub fn is_occupied(&self, coord: GridCoord) -> bool {
        if !self.rect.contains(coord) {
            return false;
        }
        self.occupancy.get(self.to_local(coord))
    }

    /// Sets `coord`'s occupancy bit.
    ///
    /// Returns `false` without writing when `coord` lies outside the rect.
    pub fn set_occupied(&mut self, coord: GridCoord, occupied: bool) -> bool {
        if !self.rect.contains(coord) {
            return false;
        }
        self.occupancy.set(self.to_local(coord), occupied);
        true
    }

    /// Surface height at `coord`; `0.0` outside the layer's rect.
    #[must_use]
    pub fn height_of(&self, coord: GridCoord) -> f32 {
        if self.rect.contains(coord) {
            self.heights[self.cell_index(coord)]
        } else {
            0.0
        }
    }

    /// Sets the surface height at `coord`; ignored outside the rect.
    pub fn set_height(&mut self, coord: GridCoord, height: f32) {
        if self.rect.contains(coord) {
            let index = self.cell_index(coord);
            self.heights[index] = height;
        }
    }

    /// The portion of `rect` covered by this layer, empty when disjoint.
    #[must_use]
    pub fn clip_to_rect(&self, rect: GridRect) -> GridRect {
        let clipped = self.rect.intersection(rect);
        if clipped.is_empty() {
            GridRect::EMPTY
        } else {
            clipped
        }
    }

    /// Whether any cell of `rect` (clipped to the layer) is occupied.
    #[must_use]
    pub fn has_occupied_cell(&self, rect: GridRect) -> bool {
        let clipped = self.clip_to_rect(rect);
        if clipped.is_empty() {
            return false;
        }
        self.occupancy
            .any_in_rect(clipped.translated(-self.rect.min), true)
    }

    /// Whether any cell of `rect` (clipped to the layer) is unoccupied.
    #[must_use]
    pub fn has_unoccupied_cell(&self, rect: GridRect) -> bool {
        let clipped = self.clip_to_rect(rect);
        if clipped.is_empty() {
            return false;
        }
        self.occupancy
            .any_in_rect(clipped.translated(-self.rect.min), false)
    }

    /// Sets every cell of `rect` (clipped to the layer) to `occupied`.
    pub fn set_cells_in_rect(&mut self, rect: GridRect, occupied: bool) {
        let clipped = self.clip_to_rect(rect);
        if clipped.is_empty() {
            return;
        }
        self.occupancy
            .fill_rect(clipped.translated(-self.rect.min), occupied);
    }

    /// Sets every cell whose rect overlaps the world-space box to
    /// `occupied`.
    pub fn set_cells_in_box(&mut self, box_min: Point2<f32>, box_max: Point2<f32>, occupied: bool) {
        let bounding = self.layout().rect_of(box_min, box_max);
        self.set_cells_in_rect(bounding, occupied);
    }

    /// Sets every cell whose *center* lies within the circle to
    /// `occupied`. A center exactly on the boundary counts as inside.
    pub fn set_cells_in_circle(&mut self, center: Point2<f32>, radius: f32, occupied: bool) {
        let layout = self.layout();
        let half_extent = Point2::new(radius, radius);
        let bounding = layout.rect_of(center - half_extent.coords, center + half_extent.coords);
        let clipped = self.clip_to_rect(bounding);
        for coord in clipped.cells() {
            let distance_sq = (layout.center_of(coord) - center).norm_squared();
            if radius * radius >= distance_sq {
                self.occupancy.set(self.to_local(coord), occupied);
            }
        }
    }

    /// Sets every cell whose *center* lies inside the counterclockwise
    /// convex polygon to `occupied`. A center exactly on an edge counts as
    /// inside; fewer than three vertices is a no-op.
    pub fn set_cells_in_convex(&mut self, vertices: &[Point2<f32>], occupied: bool) {
        if vertices.len() < 3 {
            return;
        }
        let layout = self.layout();
        let mut bounding_min = vertices[0];
        let mut bounding_max = vertices[0];
        for vertex in &vertices[1..] {
            bounding_min = Point2::new(bounding_min.x.min(vertex.x), bounding_min.y.min(vertex.y));
            bounding_max = Point2::new(bounding_max.x.max(vertex.x), bounding_max.y.max(vertex.y));
        }
        let clipped = self.clip_to_rect(layout.rect_of(bounding_min, bounding_max));
        for coord in clipped.cells() {
            if point_in_ccw_convex(layout.center_of(coord), vertices) {
                self.occupancy.set(self.to_local(coord), occupied);
            }
        }
    }

    /// Copies occupancy and heights from `src` for every cell of `rect`
    /// covered by this layer.
    ///
    /// Cells of `rect` outside `src` copy as unoccupied with height
    /// `0.0`, matching `src`'s out-of-rect reads.
    pub fn copy_from(&mut self, src: &TileLayer, rect: GridRect) {
        let clipped = self.clip_to_rect(rect);
        for coord in clipped.cells() {
            self.set_height(coord, src.height_of(coord));
            self.set_occupied(coord, src.is_occupied(coord));
        }
    }

    /// Reassembles a layer from snapshot parts. Lengths were validated by
    /// the caller.
    pub(crate) fn from_parts(
        rect: GridRect,
        cell_size: f32,
        occupancy: BitGrid,
        heights: Vec<f32>,
    ) -> Self {
        debug_assert_eq!(heights.len() as i64, rect.area());
        Self {
            occupancy,
            heights,
            rect,
            cell_size,
        }
    }

    pub(crate) fn occupancy(&self) -> &BitGrid {
        &self.occupancy
    }

    pub(crate) fn heights(&self) -> &[f32] {
        &self.heights
    }

    fn layout(&self) -> CellLayout {
        CellLayout::new(self.cell_size)
    }

    fn to_local(&self, coord: GridCoord) -> GridCoord {
        coord - self.rect.min
    }

    #[allow(clippy::cast_sign_loss)]
    fn cell_index(&self, coord: GridCoord) -> usize {
        debug_assert!(self.rect.contains(coord));
        let dx = (coord.x - self.rect.min.x) as usize;
        let dy = (coord.y - self.rect.min.y) as usize;
        dx * self.rect.height() as usize + dy
    }
}

/// Whether `point` is on the inner (left) side of every directed edge of
/// a counterclockwise convex polygon. On-edge points count as inside.
fn point_in_ccw_convex(point: Point2<f32>, vertices: &[Point2<f32>]) -> bool {
    debug_assert!(vertices.len() > 2);
    let mut prev = vertices[vertices.len() - 1];
    for &vertex in vertices {
        let edge = vertex - prev;
        let to_point = point - prev;
        if edge.x * to_point.y - edge.y * to_point.x < 0.0 {
            return false;
        }
        prev = vertex;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> TileLayer {
        let rect = GridRect::from_origin_size(GridCoord::new(0, 0), 8, 8);
        TileLayer::new(rect, 1.0, false, 0.0)
    }

    #[test]
    fn test_reads_outside_rect_are_total() {
        let layer = layer();
        let outside = GridCoord::new(-1, 4);
        assert!(!layer.is_occupied(outside));
        assert_eq!(layer.height_of(outside), 0.0);
    }

    #[test]
    fn test_writes_outside_rect_are_rejected() {
        let mut layer = layer();
        let outside = GridCoord::new(8, 0);
        assert!(!layer.set_occupied(outside, true));
        layer.set_height(outside, 5.0);
        assert_eq!(layer.height_of(outside), 0.0);
    }

    #[test]
    fn test_initial_fill_values() {
        let rect = GridRect::from_origin_size(GridCoord::new(-4, -4), 8, 8);
        let layer = TileLayer::new(rect, 1.0, true, 7.5);
        assert!(layer.is_occupied(GridCoord::new(-4, -4)));
        assert!(layer.is_occupied(GridCoord::new(3, 3)));
        assert_eq!(layer.height_of(GridCoord::new(0, 0)), 7.5);
    }

    #[test]
    fn test_negative_origin_indexing() {
        let rect = GridRect::from_origin_size(GridCoord::new(-4, -4), 8, 8);
        let mut layer = TileLayer::new(rect, 1.0, false, 0.0);
        let cell = GridCoord::new(-2, 3);
        assert!(layer.set_occupied(cell, true));
        layer.set_height(cell, 42.0);
        assert!(layer.is_occupied(cell));
        assert_eq!(layer.height_of(cell), 42.0);
        assert!(!layer.is_occupied(GridCoord::new(-3, 3)));
    }

    #[test]
    fn test_fill_rect_clips_to_layer() {
        let mut layer = layer();
        layer.set_cells_in_rect(
            GridRect::from_origin_size(GridCoord::new(6, 6), 10, 10),
            true,
        );
        assert!(layer.is_occupied(GridCoord::new(6, 6)));
        assert!(layer.is_occupied(GridCoord::new(7, 7)));
        assert!(!layer.is_occupied(GridCoord::new(5, 5)));
    }

    #[test]
    fn test_has_occupied_cell_clips() {
        let mut layer = layer();
        layer.set_occupied(GridCoord::new(7, 7), true);
        assert!(layer.has_occupied_cell(GridRect::from_origin_size(GridCoord::new(6, 6), 20, 20)));
        assert!(!layer.has_occupied_cell(GridRect::from_origin_size(GridCoord::new(0, 0), 7, 7)));
        // Fully disjoint query.
        assert!(!layer.has_occupied_cell(GridRect::from_origin_size(
            GridCoord::new(50, 50),
            4,
            4
        )));
    }

    #[test]
    fn test_has_unoccupied_cell_clips() {
        let rect = GridRect::from_origin_size(GridCoord::new(0, 0), 8, 8);
        let mut blocked = TileLayer::new(rect, 1.0, true, 0.0);
        assert!(!blocked.has_unoccupied_cell(blocked.rect()));

        blocked.set_occupied(GridCoord::new(2, 5), false);
        assert!(blocked.has_unoccupied_cell(blocked.rect()));
        assert!(blocked.has_unoccupied_cell(GridRect::from_origin_size(GridCoord::new(2, 5), 1, 1)));
        assert!(!blocked.has_unoccupied_cell(GridRect::from_origin_size(GridCoord::new(3, 5), 4, 2)));
        // Fully disjoint query.
        assert!(!blocked.has_unoccupied_cell(GridRect::from_origin_size(
            GridCoord::new(50, 50),
            4,
            4
        )));
    }

    #[test]
    fn test_clip_to_rect_disjoint_is_empty() {
        let layer = layer();
        let clipped = layer.clip_to_rect(GridRect::from_origin_size(GridCoord::new(20, 20), 4, 4));
        assert!(clipped.is_empty());
    }

    #[test]
    fn test_circle_fill_tests_cell_centers() {
        let mut layer = layer();
        layer.set_cells_in_circle(Point2::new(4.5, 4.5), 1.0, true);

        // Centers at exactly radius distance count as inside.
        for (x, y) in [(4, 4), (3, 4), (5, 4), (4, 3), (4, 5)] {
            assert!(layer.is_occupied(GridCoord::new(x, y)), "cell ({x}, {y})");
        }
        for (x, y) in [(3, 3), (5, 5), (3, 5), (5, 3), (2, 4)] {
            assert!(!layer.is_occupied(GridCoord::new(x, y)), "cell ({x}, {y})");
        }
    }

    #[test]
    fn test_convex_fill_boundary_is_inclusive() {
        let mut layer = layer();
        // Counterclockwise square whose left edge passes through cell
        // centers at x = 1.5.
        let square = [
            Point2::new(1.5, 1.5),
            Point2::new(5.5, 1.5),
            Point2::new(5.5, 5.5),
            Point2::new(1.5, 5.5),
        ];
        layer.set_cells_in_convex(&square, true);

        assert!(layer.is_occupied(GridCoord::new(1, 2)));
        assert!(layer.is_occupied(GridCoord::new(3, 3)));
        assert!(layer.is_occupied(GridCoord::new(5, 5)));
        assert!(!layer.is_occupied(GridCoord::new(0, 3)));
        assert!(!layer.is_occupied(GridCoord::new(6, 3)));
    }

    #[test]
    fn test_degenerate_convex_is_noop() {
        let mut layer = layer();
        layer.set_cells_in_convex(&[Point2::new(0.0, 0.0), Point2::new(5.0, 5.0)], true);
        assert!(!layer.has_occupied_cell(layer.rect()));
    }

    #[test]
    fn test_box_fill_covers_touched_cells() {
        let mut layer = layer();
        layer.set_cells_in_box(Point2::new(1.2, 1.2), Point2::new(2.8, 1.8), true);
        // The box's bounding rect covers x 1..=2, y 1 in cell coords.
        assert!(layer.is_occupied(GridCoord::new(1, 1)));
        assert!(layer.is_occupied(GridCoord::new(2, 1)));
        assert!(!layer.is_occupied(GridCoord::new(3, 1)));
        assert!(!layer.is_occupied(GridCoord::new(1, 2)));
    }

    #[test]
    fn test_copy_from_clips_to_destination() {
        let src_rect = GridRect::from_origin_size(GridCoord::new(0, 0), 4, 4);
        let mut src = TileLayer::new(src_rect, 1.0, false, 0.0);
        src.set_occupied(GridCoord::new(1, 1), true);
        src.set_height(GridCoord::new(1, 1), 9.0);
        src.set_occupied(GridCoord::new(3, 3), true);

        let dst_rect = GridRect::from_origin_size(GridCoord::new(1, 1), 4, 4);
        let mut dst = TileLayer::new(dst_rect, 1.0, true, 1.0);
        dst.copy_from(&src, src.rect());

        assert!(dst.is_occupied(GridCoord::new(1, 1)));
        assert_eq!(dst.height_of(GridCoord::new(1, 1)), 9.0);
        assert!(dst.is_occupied(GridCoord::new(3, 3)));
        // Copied cells that were free in the source are cleared.
        assert!(!dst.is_occupied(GridCoord::new(2, 2)));
        assert_eq!(dst.height_of(GridCoord::new(2, 2)), 0.0);
        // Cells outside the copy rect keep their previous state.
        assert!(dst.is_occupied(GridCoord::new(4, 4)));
        assert_eq!(dst.height_of(GridCoord::new(4, 4)), 1.0);
    }
}
