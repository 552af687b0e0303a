//! Random sampling of walkable cells.
//!
//! Every sampler takes the random source as an argument, so callers
//! control seeding. Draws resolve to a uniform point inside the chosen
//! cell, at the cell's surface height.

use std::collections::HashSet;

use gw_grid::{CellDirection, GridCoord, GridRect};
use nalgebra::{Point2, Point3, Vector2};
use nav_path::LayerCache;
use nav_surface::TileSource;
use rand::Rng;

use crate::grid::NavGrid;
use crate::node_ref::NodeRef;
use crate::query::ProjectedPoint;

impl NavGrid {
    /// Draws a random walkable point anywhere on the grid.
    ///
    /// A tile is drawn uniformly first, assuming roughly equal walkable
    /// area per tile, then a cell uniformly among that tile's walkable
    /// cells. `None` when no tiles are published or the drawn tile has
    /// no walkable cells.
    #[must_use]
    pub fn random_point<R: Rng>(&self, rng: &mut R) -> Option<ProjectedPoint> {
        let count = self.tile_count();
        if count == 0 {
            return None;
        }
        let (_, data) = self.tiles().nth(rng.gen_range(0..count))?;
        let layer = &data.layer;

        let mut walkable = 0;
        let mut chosen = None;
        for cell in layer.rect().cells() {
            if layer.is_occupied(cell) {
                continue;
            }
            walkable += 1;
            if rng.gen_range(0..walkable) == 0 {
                chosen = Some(cell);
            }
        }
        chosen.map(|cell| self.point_within_cell(cell, rng))
    }

    /// Draws a random walkable point reachable from `origin` without
    /// crossing blocked or uncovered cells.
    ///
    /// The origin projects onto the grid first; `None` when it cannot.
    /// A flood then spreads across 4-connected walkable cells whose
    /// centers lie within `radius` of the projected origin, drawing
    /// uniformly among the flooded cells. The origin's own cell backs
    /// the draw when nothing else is in range.
    #[must_use]
    pub fn random_reachable_point<R: Rng>(
        &self,
        origin: Point3<f32>,
        radius: f32,
        rng: &mut R,
    ) -> Option<ProjectedPoint> {
        let mut extent = self.default_projection_extent();
        extent.z = f32::MAX;
        let projected = self.project_point(origin, extent)?;
        let origin_cell = projected.node.coord();
        let origin_xy = projected.location.xy();

        let layout = self.layout();
        let sq_radius = radius * radius;
        let mut cache = LayerCache::new();
        let mut visited: HashSet<GridCoord> = HashSet::new();
        let mut stack = vec![origin_cell];
        visited.insert(origin_cell);
        let mut chosen = origin_cell;

        while let Some(cell) = stack.pop() {
            for direction in CellDirection::ALL {
                let neighbor = direction.step(cell);
                let center = layout.center_of(neighbor);
                if (center - origin_xy).norm_squared() > sq_radius
                    || visited.contains(&neighbor)
                {
                    continue;
                }
                if cache.is_walkable(self, neighbor) {
                    visited.insert(neighbor);
                    stack.push(neighbor);
                    if rng.gen_range(0..visited.len()) == 0 {
                        chosen = neighbor;
                    }
                }
            }
        }
        Some(self.point_within_cell(chosen, rng))
    }

    /// Draws a random walkable point within `radius` of `origin`,
    /// reachable or not.
    ///
    /// One point is thrown uniformly into the disc and projected onto
    /// the grid; a hit comes back directly. Otherwise the draw falls
    /// back to a uniform pick among every walkable cell whose center
    /// lies within the radius. `None` when no such cell exists.
    #[must_use]
    pub fn random_point_in_radius<R: Rng>(
        &self,
        origin: Point3<f32>,
        radius: f32,
        rng: &mut R,
    ) -> Option<ProjectedPoint> {
        let mut extent = self.default_projection_extent();
        extent.z = f32::MAX;
        {
            let offset = random_in_disc(radius, rng);
            let thrown = Point3::new(origin.x + offset.x, origin.y + offset.y, 0.0);
            if let Some(projected) = self.project_point(thrown, extent) {
                return Some(projected);
            }
        }

        let layout = self.layout();
        let min_cell = layout.coord_of(Point2::new(origin.x - radius, origin.y - radius));
        let max_cell = layout.coord_of(Point2::new(origin.x + radius, origin.y + radius));
        let search_rect = GridRect::new(
            min_cell,
            GridCoord::new(max_cell.x + 1, max_cell.y + 1),
        );
        let origin_xy = origin.xy();
        let sq_radius = radius * radius;
        let tile_extent = self.config().tile_extent();

        let mut walkable = 0;
        let mut chosen = None;
        for tile in search_rect.tiles(tile_extent) {
            let Some(layer) = self.layer(tile) else {
                continue;
            };
            let clipped = search_rect.intersection(tile.cell_rect(tile_extent));
            for cell in clipped.cells() {
                if layer.is_occupied(cell) {
                    continue;
                }
                let center = layout.center_of(cell);
                if (center - origin_xy).norm_squared() > sq_radius {
                    continue;
                }
                walkable += 1;
                if rng.gen_range(0..walkable) == 0 {
                    chosen = Some(cell);
                }
            }
        }
        chosen.map(|cell| self.point_within_cell(cell, rng))
    }

    /// Uniform point inside a cell, at the cell's surface height.
    fn point_within_cell<R: Rng>(&self, cell: GridCoord, rng: &mut R) -> ProjectedPoint {
        let layout = self.layout();
        let cell_size = layout.cell_size();
        let corner = layout.corner_of(cell);
        let mut cache = LayerCache::new();
        let z = cache.height_of(self, cell);
        ProjectedPoint {
            location: Point3::new(
                corner.x + rng.gen::<f32>() * cell_size,
                corner.y + rng.gen::<f32>() * cell_size,
                z,
            ),
            node: NodeRef::from_coord(cell),
        }
    }
}

/// Uniform point in a disc of the given radius around the origin.
fn random_in_disc<R: Rng>(radius: f32, rng: &mut R) -> Vector2<f32> {
    let angle = rng.gen::<f32>() * std::f32::consts::TAU;
    let distance = radius * rng.gen::<f32>().sqrt();
    Vector2::new(angle.cos() * distance, angle.sin() * distance)
}
