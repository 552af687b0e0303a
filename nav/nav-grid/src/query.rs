//! Continuous-space queries over published tiles.
//!
//! Raycasts walk the cell grid with the traversal iterator and stop at
//! the first occupied or uncovered cell. Projection resolves a world
//! location to the nearest walkable cell surface inside a search box.
//! Boundary collection floods the walkable region around a cell and
//! reports the wall segments it runs into, clipped to a convex search
//! area.

use std::collections::HashSet;

use gw_grid::{CellDirection, GridCoord, GridRect, GridTraversal};
use nalgebra::{Point2, Point3, Vector2, Vector3};
use nav_path::{LayerCache, NavPath};
use nav_surface::TileSource;

use crate::grid::NavGrid;
use crate::node_ref::NodeRef;

/// The product of one cell-grid raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRaycast {
    /// True if the ray stopped before reaching its end.
    pub blocked: bool,
    /// Where the ray stopped.
    pub location: Point2<f32>,
    /// The last walkable cell the ray passed through; the end cell for
    /// a clear ray, `None` when the start itself was blocked.
    pub cell: Option<GridCoord>,
}

/// The product of one world-space raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldRaycast {
    /// True if the ray stopped before reaching its end.
    pub blocked: bool,
    /// Where the ray stopped, on the walked surface.
    pub location: Point3<f32>,
    /// Handle of the last walkable cell, or [`NodeRef::INVALID`] when
    /// the start could not be projected onto the grid.
    pub node: NodeRef,
    /// True if the ray's end projected onto a walkable cell.
    pub end_projected: bool,
}

/// A world location resolved to a walkable cell surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedPoint {
    /// The resolved location: the query point clamped into the chosen
    /// cell, at the cell's surface height.
    pub location: Point3<f32>,
    /// Handle of the chosen cell.
    pub node: NodeRef,
}

/// One wall segment between a walkable cell and its blocked or
/// uncovered neighbor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryEdge {
    /// Start of the segment, at the walkable cell's surface height.
    pub start: Point3<f32>,
    /// End of the segment, at the walkable cell's surface height.
    pub end: Point3<f32>,
}

impl NavGrid {
    /// Half-extent of the search box used by queries that project a
    /// location without an explicit box: half a cell sideways, two and
    /// a half cells vertically.
    pub(crate) fn default_projection_extent(&self) -> Vector3<f32> {
        let cell = self.config().cell_size();
        Vector3::new(0.5 * cell, 0.5 * cell, 2.5 * cell)
    }

    /// Casts a 2D ray across the cell grid.
    ///
    /// The ray stops at the first occupied or uncovered cell. A blocked
    /// ray reports the entry point into the blocking cell and the last
    /// walkable cell before it; a clear ray reports its end location
    /// and end cell.
    #[must_use]
    pub fn raycast_cells(&self, start: Point2<f32>, end: Point2<f32>) -> CellRaycast {
        let layout = self.layout();
        let mut cache = LayerCache::new();

        let start_cell = layout.coord_of(start);
        if !cache.is_walkable(self, start_cell) {
            return CellRaycast {
                blocked: true,
                location: start,
                cell: None,
            };
        }

        let direction = end - start;
        let mut last_free = start_cell;
        for step in GridTraversal::new(start, end, layout) {
            if !cache.is_walkable(self, step.coord) {
                return CellRaycast {
                    blocked: true,
                    location: start + direction * step.entry_t as f32,
                    cell: Some(last_free),
                };
            }
            last_free = step.coord;
        }
        CellRaycast {
            blocked: false,
            location: end,
            cell: Some(last_free),
        }
    }

    /// Casts a ray between two world locations along the walked
    /// surface.
    ///
    /// Both ends project onto the grid first. A start that cannot be
    /// projected blocks the ray where it stands; an end that cannot be
    /// projected leaves the ray aimed at the raw end location. The
    /// reported height is the surface height of the cell the ray
    /// stopped in.
    #[must_use]
    pub fn raycast(&self, start: Point3<f32>, end: Point3<f32>) -> WorldRaycast {
        let extent = self.default_projection_extent();
        let Some(projected_start) = self.project_point(start, extent) else {
            return WorldRaycast {
                blocked: true,
                location: start,
                node: NodeRef::INVALID,
                end_projected: false,
            };
        };
        let (end_location, end_projected) = match self.project_point(end, extent) {
            Some(projected) => (projected.location, true),
            None => (end, false),
        };

        let cast = self.raycast_cells(projected_start.location.xy(), end_location.xy());
        let (location, node) = match cast.cell {
            Some(cell) => {
                let mut cache = LayerCache::new();
                let z = cache.height_of(self, cell);
                (
                    Point3::new(cast.location.x, cast.location.y, z),
                    NodeRef::from_coord(cell),
                )
            }
            // A start projected onto a cell's max boundary resolves
            // into the neighbor, which may be blocked.
            None => (projected_start.location, projected_start.node),
        };
        WorldRaycast {
            blocked: cast.blocked,
            location,
            node,
            end_projected,
        }
    }

    /// Projects a world location onto the nearest walkable cell surface
    /// within a search box.
    ///
    /// The box spans `point` plus or minus `extent`. Of every walkable
    /// cell the box overlaps, the winner is the one whose surface comes
    /// closest to `point` in 3D; its surface must itself lie inside the
    /// box, which in practice bounds how far below or above the point a
    /// surface may sit.
    #[must_use]
    pub fn project_point(&self, point: Point3<f32>, extent: Vector3<f32>) -> Option<ProjectedPoint> {
        let layout = self.layout();
        let cell_size = layout.cell_size();
        let box_min = point - extent;
        let box_max = point + extent;

        let min_cell = layout.coord_of(Point2::new(box_min.x, box_min.y));
        let max_cell = layout.coord_of(Point2::new(box_max.x, box_max.y));
        let query_rect = GridRect::new(
            min_cell,
            GridCoord::new(max_cell.x + 1, max_cell.y + 1),
        );

        let extent_tiles = self.config().tile_extent();
        let mut best: Option<(f32, Point3<f32>, GridCoord)> = None;
        for tile in query_rect.tiles(extent_tiles) {
            let Some(layer) = self.layer(tile) else {
                continue;
            };
            let clipped = query_rect.intersection(tile.cell_rect(extent_tiles));
            for cell in clipped.cells() {
                if layer.is_occupied(cell) {
                    continue;
                }
                let corner = layout.corner_of(cell);
                let candidate = Point3::new(
                    point.x.clamp(corner.x, corner.x + cell_size),
                    point.y.clamp(corner.y, corner.y + cell_size),
                    layer.height_of(cell),
                );
                let distance = (candidate - point).norm_squared();
                if best.map_or(true, |(best_distance, _, _)| distance < best_distance) {
                    best = Some((distance, candidate, cell));
                }
            }
        }

        let (_, location, cell) = best?;
        // The XY clamp keeps candidates inside the box sideways; the
        // surface height can still fall outside it.
        let inside = location.x >= box_min.x
            && location.x <= box_max.x
            && location.y >= box_min.y
            && location.y <= box_max.y
            && location.z >= box_min.z
            && location.z <= box_max.z;
        inside.then_some(ProjectedPoint {
            location,
            node: NodeRef::from_coord(cell),
        })
    }

    /// Slides from a known cell toward a target, stopping at the first
    /// blocked cell.
    ///
    /// `start` must lie inside the cell `node` names, on its surface;
    /// otherwise there is nothing to slide along and the move is
    /// rejected.
    #[must_use]
    pub fn move_along_surface(
        &self,
        start: Point3<f32>,
        node: NodeRef,
        target: Point3<f32>,
    ) -> Option<ProjectedPoint> {
        if !self.node_contains_location(node, start) {
            return None;
        }
        let cast = self.raycast(start, target);
        Some(ProjectedPoint {
            location: cast.location,
            node: cast.node,
        })
    }

    /// Collects the wall segments around the walkable region containing
    /// a cell, clipped to a convex search area.
    ///
    /// The flood starts at the cell `node` names and spreads across
    /// 4-connected walkable cells whose shared edges cross the area.
    /// Every crossing edge that borders an occupied or uncovered cell
    /// is reported at the walkable cell's surface height. The area is a
    /// convex polygon in world space, wound counterclockwise. `None`
    /// when the starting cell is not walkable.
    #[must_use]
    pub fn boundary_edges(
        &self,
        node: NodeRef,
        search_area: &[Point2<f32>],
    ) -> Option<Vec<BoundaryEdge>> {
        if !self.is_node_valid(node) {
            return None;
        }
        Some(self.flood_boundary_edges(&[node.coord()], search_area))
    }

    /// Collects wall segments along a stretch of a path.
    ///
    /// The stretch runs from the first path point in the cell `from`
    /// names through the point in the cell `to` names, or through the
    /// path's end if `to` never occurs. The flood seeds with every cell
    /// on the stretch and otherwise behaves like
    /// [`NavGrid::boundary_edges`]. `None` when `from` is not on the
    /// path.
    #[must_use]
    pub fn path_boundary_edges(
        &self,
        path: &NavPath,
        from: NodeRef,
        to: NodeRef,
        search_area: &[Point2<f32>],
    ) -> Option<Vec<BoundaryEdge>> {
        let points = path.points();
        let start_index = points.iter().position(|point| point.cell == from.coord())?;
        let mut cells = Vec::new();
        for point in &points[start_index..] {
            cells.push(point.cell);
            if point.cell == to.coord() {
                break;
            }
        }
        Some(self.flood_boundary_edges(&cells, search_area))
    }

    fn flood_boundary_edges(
        &self,
        seeds: &[GridCoord],
        search_area: &[Point2<f32>],
    ) -> Vec<BoundaryEdge> {
        let layout = self.layout();
        let mut cache = LayerCache::new();

        let mut visited: HashSet<GridCoord> = seeds.iter().copied().collect();
        let mut stack: Vec<GridCoord> = seeds.to_vec();
        let mut edges = Vec::new();

        while let Some(cell) = stack.pop() {
            for direction in CellDirection::ALL {
                let neighbor = direction.step(cell);
                if visited.contains(&neighbor) {
                    continue;
                }
                let (corner_a, corner_b) = direction.edge_corners(cell);
                let edge_start = layout.corner_of(corner_a);
                let edge_end = layout.corner_of(corner_b);
                if !segment_intersects_convex(edge_start, edge_end, search_area) {
                    continue;
                }
                if cache.is_walkable(self, neighbor) {
                    visited.insert(neighbor);
                    stack.push(neighbor);
                } else {
                    let z = cache.height_of(self, cell);
                    edges.push(BoundaryEdge {
                        start: Point3::new(edge_start.x, edge_start.y, z),
                        end: Point3::new(edge_end.x, edge_end.y, z),
                    });
                }
            }
        }
        edges
    }
}

/// True if any part of a segment lies inside a convex polygon.
///
/// The polygon is wound counterclockwise; fewer than three vertices
/// reject everything. The segment's parameter range is clipped against
/// each edge's inner half-plane, boundary included, and the segment
/// intersects when a non-empty range survives.
fn segment_intersects_convex(
    start: Point2<f32>,
    end: Point2<f32>,
    polygon: &[Point2<f32>],
) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let direction = end - start;
    let mut enter = 0.0_f32;
    let mut exit = 1.0_f32;
    for (index, &vertex) in polygon.iter().enumerate() {
        let next = polygon[(index + 1) % polygon.len()];
        let edge = next - vertex;
        // Inward normal of a counterclockwise edge.
        let normal = Vector2::new(-edge.y, edge.x);
        let distance = normal.dot(&(start - vertex));
        let speed = normal.dot(&direction);
        if speed.abs() <= f32::EPSILON {
            // Parallel to the edge: entirely on one side of it.
            if distance < 0.0 {
                return false;
            }
            continue;
        }
        let t = -distance / speed;
        if speed > 0.0 {
            enter = enter.max(t);
        } else {
            exit = exit.min(t);
        }
        if enter > exit {
            return false;
        }
    }
    true
}
