//! Triangle rasterization into heightfield columns.
//!
//! Each triangle is swept column by column: the polygon is clipped against
//! successive grid column planes (keeping a residual for the columns still
//! ahead), then each column strip is clipped against row planes the same
//! way. Every per-cell polygon with at least three vertices contributes its
//! vertical extent as a span. Clipping runs in `f64`; spans are stored as
//! `f32` like the rest of the surface data.

use gw_grid::{CellLayout, GridCoord, Point2};
use nalgebra::{Isometry3, Point3};

use crate::Heightfield;

/// Upper bound on clipped polygon vertices per stage.
///
/// A triangle clipped by two pairs of parallel axis planes has at most
/// seven vertices.
const MAX_POLYGON_VERTS: usize = 7;

/// Fixed-capacity polygon used by the clipping sweeps.
#[derive(Debug, Clone, Copy)]
struct ClipBuffer {
    verts: [Point3<f64>; MAX_POLYGON_VERTS],
    len: usize,
}

impl ClipBuffer {
    fn empty() -> Self {
        Self {
            verts: [Point3::origin(); MAX_POLYGON_VERTS],
            len: 0,
        }
    }

    fn from_triangle(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        let mut buffer = Self::empty();
        buffer.verts[0] = v0;
        buffer.verts[1] = v1;
        buffer.verts[2] = v2;
        buffer.len = 3;
        buffer
    }

    fn as_slice(&self) -> &[Point3<f64>] {
        &self.verts[..self.len]
    }

    fn push(&mut self, vert: Point3<f64>) {
        self.verts[self.len] = vert;
        self.len += 1;
    }
}

/// Splits a convex polygon by the axis-aligned plane `v[AXIS] == offset`.
///
/// Returns the part on the non-negative side (at or below the plane along
/// the axis) and the residual on the other side. A vertex exactly on the
/// plane lands in both outputs, so the comparisons are exact.
#[allow(clippy::float_cmp)]
fn split_convex_by_axis_plane<const AXIS: usize>(
    input: &[Point3<f64>],
    plane_offset: f64,
) -> (ClipBuffer, ClipBuffer) {
    let mut kept = ClipBuffer::empty();
    let mut residual = ClipBuffer::empty();
    let Some(&last) = input.last() else {
        return (kept, residual);
    };

    let mut prev = last;
    let mut prev_dist = plane_offset - prev[AXIS];
    let mut prev_negative = prev_dist < 0.0;
    for &vert in input {
        let dist = plane_offset - vert[AXIS];
        let negative = dist < 0.0;
        if negative == prev_negative {
            if negative {
                residual.push(vert);
            } else {
                kept.push(vert);
                if dist == 0.0 {
                    residual.push(vert);
                }
            }
        } else {
            let crossing = prev + (vert - prev) * (prev_dist / (prev_dist - dist));
            kept.push(crossing);
            residual.push(crossing);
            if negative {
                residual.push(vert);
            } else if dist != 0.0 {
                kept.push(vert);
            }
        }
        prev = vert;
        prev_dist = dist;
        prev_negative = negative;
    }
    (kept, residual)
}

fn axis_min_max<const AXIS: usize>(verts: &[Point3<f64>]) -> (f64, f64) {
    let mut min = verts[0][AXIS];
    let mut max = min;
    for vert in &verts[1..] {
        min = min.min(vert[AXIS]);
        max = max.max(vert[AXIS]);
    }
    (min, max)
}

impl Heightfield {
    /// Rasterizes an indexed triangle list into the field's columns.
    ///
    /// `indices` holds triangles as consecutive index triplets referring
    /// into `vertices`; its length must be a multiple of three and every
    /// index must be in range.
    pub fn rasterize_triangles(&mut self, vertices: &[Point3<f32>], indices: &[u32]) {
        self.rasterize_with(vertices, indices, |vert| vert.cast::<f64>());
    }

    /// Rasterizes an indexed triangle list placed by `transform`.
    ///
    /// Used for instanced geometry, where one vertex buffer is rasterized
    /// once per instance placement.
    pub fn rasterize_triangles_transformed(
        &mut self,
        vertices: &[Point3<f32>],
        indices: &[u32],
        transform: &Isometry3<f32>,
    ) {
        self.rasterize_with(vertices, indices, |vert| (transform * vert).cast::<f64>());
    }

    fn rasterize_with(
        &mut self,
        vertices: &[Point3<f32>],
        indices: &[u32],
        to_world: impl Fn(Point3<f32>) -> Point3<f64>,
    ) {
        debug_assert_eq!(indices.len() % 3, 0);
        if self.rect().is_empty() {
            return;
        }

        let layout = CellLayout::new(self.cell_size());
        let (bounds_min, bounds_max) = layout.world_bounds(self.rect());
        let bounds_min = Point2::new(f64::from(bounds_min.x), f64::from(bounds_min.y));
        let bounds_max = Point2::new(f64::from(bounds_max.x), f64::from(bounds_max.y));
        let inv_cell_size = f64::from(1.0 / self.cell_size());

        for triangle in indices.chunks_exact(3) {
            let v0 = to_world(vertices[triangle[0] as usize]);
            let v1 = to_world(vertices[triangle[1] as usize]);
            let v2 = to_world(vertices[triangle[2] as usize]);
            self.rasterize_triangle(v0, v1, v2, bounds_min, bounds_max, inv_cell_size);
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn rasterize_triangle(
        &mut self,
        v0: Point3<f64>,
        v1: Point3<f64>,
        v2: Point3<f64>,
        bounds_min: Point2<f64>,
        bounds_max: Point2<f64>,
        inv_cell_size: f64,
    ) {
        let tri_min_x = v0.x.min(v1.x).min(v2.x);
        let tri_max_x = v0.x.max(v1.x).max(v2.x);
        let tri_min_y = v0.y.min(v1.y).min(v2.y);
        let tri_max_y = v0.y.max(v1.y).max(v2.y);

        // Touching bounds count as overlapping.
        if tri_max_x < bounds_min.x
            || tri_min_x > bounds_max.x
            || tri_max_y < bounds_min.y
            || tri_min_y > bounds_max.y
        {
            return;
        }

        let rect = self.rect();
        let cell_size = self.cell_size();
        let mut input = ClipBuffer::from_triangle(v0, v1, v2);

        let start_x =
            ((tri_min_x * inv_cell_size).floor() as i32).clamp(rect.min.x - 1, rect.max.x - 1);
        let end_x = ((tri_max_x * inv_cell_size).floor() as i32).clamp(rect.min.x, rect.max.x - 1);

        for x in start_x..=end_x {
            let column_plane = f64::from((x + 1) as f32 * cell_size);
            let (mut row, rest) = split_convex_by_axis_plane::<0>(input.as_slice(), column_plane);
            input = rest;

            if row.len < 3 || x < rect.min.x {
                continue;
            }

            let (row_min_y, row_max_y) = axis_min_max::<1>(row.as_slice());
            let start_y = (row_min_y * inv_cell_size).floor() as i32;
            let end_y = (row_max_y * inv_cell_size).floor() as i32;
            if start_y >= rect.max.y || end_y < rect.min.y {
                continue;
            }
            let start_y = start_y.clamp(rect.min.y - 1, rect.max.y - 1);
            let end_y = end_y.clamp(rect.min.y, rect.max.y - 1);

            for y in start_y..=end_y {
                let row_plane = f64::from((y + 1) as f32 * cell_size);
                let (cell_polygon, rest) =
                    split_convex_by_axis_plane::<1>(row.as_slice(), row_plane);
                row = rest;

                if cell_polygon.len < 3 || y < rect.min.y {
                    continue;
                }

                let (min_z, max_z) = axis_min_max::<2>(cell_polygon.as_slice());
                self.insert_span(GridCoord::new(x, y), min_z as f32, max_z as f32);
            }
        }
    }
}
