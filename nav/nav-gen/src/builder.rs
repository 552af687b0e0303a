//! Single-tile rebuild pipeline.
//!
//! A [`TileBuilder`] is constructed on the orchestrating thread from the
//! tile's previous snapshots, its dirty rects, and the navigable bounds.
//! [`build`](TileBuilder::build) then runs anywhere: it owns or shares
//! everything it reads and writes only freshly allocated outputs, never
//! the published tile state.

use std::sync::Arc;

use gw_grid::{GridRect, TileCoord};
use nalgebra::Point2;
use nav_surface::{Heightfield, TileLayer};

use crate::config::GenConfig;
use crate::dirty::{DirtyArea, DirtyFlags};
use crate::geometry::{AreaModifier, CollectedGeometry, ModifierShape, TriangleSoup};

/// Result of rebuilding one tile.
#[derive(Debug)]
pub struct TileBuildOutput {
    /// New navigation layer, or `None` when the tile fell outside the
    /// navigable bounds and must be removed from the store.
    pub layer: Option<TileLayer>,
    /// New surface heightfield. `None` when the rebuild only repainted
    /// occupancy; the previously stored heightfield then stays valid.
    pub heightfield: Option<Heightfield>,
}

/// Rebuilds one tile's layer and heightfield from dirty rects.
///
/// Previous snapshots arrive as shared `Arc`s straight out of the store;
/// the builder clones their contents before mutating, so concurrent
/// readers of the published state are never disturbed.
#[derive(Debug)]
pub struct TileBuilder {
    config: GenConfig,
    tile: TileCoord,
    tile_rect: GridRect,
    /// Intersections of the navigable bounds with the tile rect. Empty
    /// when `fully_inside` is set.
    bounds_overlaps: Vec<GridRect>,
    /// The tile rect lies entirely inside one bounds rect, so the
    /// outside-bounds clamp has nothing to do.
    fully_inside: bool,
    geometry_rects: Vec<GridRect>,
    modifier_rects: Vec<GridRect>,
    previous_layer: Option<Arc<TileLayer>>,
    previous_heightfield: Option<Arc<Heightfield>>,
}

impl TileBuilder {
    /// Prepares a rebuild of `tile`.
    ///
    /// Dirty rects are clipped to the tile and split by what they force:
    /// geometry and bounds changes re-rasterize the surface, modifier
    /// changes only repaint occupancy. Areas that miss the tile entirely
    /// are dropped.
    #[must_use]
    pub fn new(
        config: &GenConfig,
        tile: TileCoord,
        dirty: &[DirtyArea],
        navigable_bounds: &[GridRect],
        previous_layer: Option<Arc<TileLayer>>,
        previous_heightfield: Option<Arc<Heightfield>>,
    ) -> Self {
        let tile_rect = tile.cell_rect(config.tile_extent());

        let mut bounds_overlaps = Vec::new();
        let mut fully_inside = false;
        for &bounds in navigable_bounds {
            if bounds.contains_rect(tile_rect) {
                fully_inside = true;
                bounds_overlaps.clear();
                break;
            }
            let overlap = bounds.intersection(tile_rect);
            if !overlap.is_empty() {
                bounds_overlaps.push(overlap);
            }
        }

        let mut geometry_rects = Vec::new();
        let mut modifier_rects = Vec::new();
        for area in dirty {
            let clipped = area.rect.intersection(tile_rect);
            if clipped.is_empty() {
                continue;
            }
            if area.flags.has(DirtyFlags::GEOMETRY | DirtyFlags::BOUNDS) {
                geometry_rects.push(clipped);
            } else if area.flags.has(DirtyFlags::MODIFIERS) {
                modifier_rects.push(clipped);
            }
        }

        Self {
            config: *config,
            tile,
            tile_rect,
            bounds_overlaps,
            fully_inside,
            geometry_rects,
            modifier_rects,
            previous_layer,
            previous_heightfield,
        }
    }

    /// The tile being rebuilt.
    #[must_use]
    pub const fn tile(&self) -> TileCoord {
        self.tile
    }

    /// The cell rect covered by the tile.
    #[must_use]
    pub const fn tile_rect(&self) -> GridRect {
        self.tile_rect
    }

    /// Whether the tile overlaps the navigable bounds at all. A tile
    /// that does not is removed instead of rebuilt.
    #[must_use]
    pub fn intersects_navigable_bounds(&self) -> bool {
        self.fully_inside || !self.bounds_overlaps.is_empty()
    }

    /// Whether any dirty rect actually touches the tile.
    #[must_use]
    pub fn has_work(&self) -> bool {
        !self.geometry_rects.is_empty() || !self.modifier_rects.is_empty()
    }

    /// Dirty rects that force surface re-rasterization, clipped to the
    /// tile.
    #[must_use]
    pub fn geometry_rects(&self) -> &[GridRect] {
        &self.geometry_rects
    }

    /// Dirty rects that only repaint modifier occupancy, clipped to the
    /// tile.
    #[must_use]
    pub fn modifier_rects(&self) -> &[GridRect] {
        &self.modifier_rects
    }

    /// Runs the rebuild against gathered geometry.
    ///
    /// A tile outside the navigable bounds yields an all-`None` output
    /// without touching the inputs. Otherwise the heightfield is rebuilt
    /// for geometry-dirty rects, occupancy and heights are derived from
    /// the surviving surface, modifiers are painted on top, and cells
    /// outside the bounds are blocked.
    #[must_use]
    pub fn build(self, geometry: &CollectedGeometry) -> TileBuildOutput {
        if !self.intersects_navigable_bounds() {
            return TileBuildOutput {
                layer: None,
                heightfield: None,
            };
        }

        let generated_field = self.rebuild_heightfield(geometry);

        let mut layer = match &self.previous_layer {
            Some(previous) => previous.as_ref().clone(),
            None => TileLayer::new(self.tile_rect, self.config.cell_size(), true, 0.0),
        };

        // With no surface at all the layer passes through unchanged.
        if let Some(field) = generated_field
            .as_ref()
            .or(self.previous_heightfield.as_deref())
        {
            let delta = self.config.max_height_delta();
            for &rect in &self.geometry_rects {
                derive_cells(&mut layer, field, rect, delta, true);
            }
            for &rect in &self.modifier_rects {
                derive_cells(&mut layer, field, rect, delta, false);
            }
            self.paint_modifiers(&mut layer, &geometry.modifiers);
            self.clamp_to_bounds(&mut layer);
        }

        TileBuildOutput {
            layer: Some(layer),
            heightfield: generated_field,
        }
    }

    /// Re-rasterizes the surface when any rect carries a geometry change.
    ///
    /// Starts from the previous field with the dirty rects cleared, or
    /// from an empty field for a brand-new tile, then reduces every
    /// column to its top span.
    fn rebuild_heightfield(&self, geometry: &CollectedGeometry) -> Option<Heightfield> {
        if self.geometry_rects.is_empty() {
            return None;
        }
        let mut field = match &self.previous_heightfield {
            Some(previous) => {
                let mut field = previous.as_ref().clone();
                for &rect in &self.geometry_rects {
                    field.clear_rect(rect);
                }
                field
            }
            None => Heightfield::new(
                self.tile_rect,
                self.config.cell_size(),
                self.config.merge_tolerance(),
            ),
        };
        for soup in &geometry.triangles {
            rasterize_soup(&mut field, soup);
        }
        Some(reduce_to_top_spans(&field))
    }

    fn paint_modifiers(&self, layer: &mut TileLayer, modifiers: &[AreaModifier]) {
        for modifier in modifiers {
            let occupied = modifier.effect.occupancy();
            if modifier.instances.is_empty() {
                self.paint_shape(layer, &modifier.shape, occupied);
            } else {
                for placement in &modifier.instances {
                    self.paint_shape(layer, &modifier.shape.transformed(placement), occupied);
                }
            }
        }
    }

    fn paint_shape(&self, layer: &mut TileLayer, shape: &ModifierShape, occupied: bool) {
        let (aabb_min, aabb_max) = shape.world_aabb();
        // Shapes entirely outside the generated Z range paint nothing.
        if aabb_max.z < self.config.min_z() || aabb_min.z > self.config.max_z() {
            return;
        }
        match shape {
            ModifierShape::Cylinder { center, radius, .. } => {
                layer.set_cells_in_circle(center.xy(), *radius, occupied);
            }
            ModifierShape::OrientedBox { .. } => {
                layer.set_cells_in_box(aabb_min.xy(), aabb_max.xy(), occupied);
            }
            ModifierShape::ConvexOutline { points, .. } => {
                if is_counterclockwise(points) {
                    layer.set_cells_in_convex(points, occupied);
                } else {
                    let reversed: Vec<_> = points.iter().rev().copied().collect();
                    layer.set_cells_in_convex(&reversed, occupied);
                }
            }
        }
    }

    /// Blocks every tile cell outside the navigable bounds.
    fn clamp_to_bounds(&self, layer: &mut TileLayer) {
        if self.fully_inside {
            return;
        }
        for coord in self.tile_rect.cells() {
            if !self.bounds_overlaps.iter().any(|rect| rect.contains(coord)) {
                layer.set_occupied(coord, true);
            }
        }
    }
}

/// Writes occupancy for every cell of `rect` from the cell's top span:
/// occupied when there is no span or the span is thicker than the
/// walkable delta. With `with_heights` the span midpoint is stored too,
/// whether or not the cell ended up occupied.
fn derive_cells(
    layer: &mut TileLayer,
    field: &Heightfield,
    rect: GridRect,
    max_height_delta: f32,
    with_heights: bool,
) {
    for coord in rect.cells() {
        match field.spans(coord).last() {
            Some(span) => {
                layer.set_occupied(coord, span.max - span.min > max_height_delta);
                if with_heights {
                    layer.set_height(coord, 0.5 * (span.min + span.max));
                }
            }
            None => {
                layer.set_occupied(coord, true);
            }
        }
    }
}

fn rasterize_soup(field: &mut Heightfield, soup: &TriangleSoup) {
    if !soup.is_well_formed() {
        tracing::warn!(
            "Skipping malformed triangle soup: {} indices over {} vertices",
            soup.indices.len(),
            soup.vertices.len()
        );
        return;
    }
    if soup.instances.is_empty() {
        field.rasterize_triangles(&soup.vertices, &soup.indices);
    } else {
        for placement in &soup.instances {
            field.rasterize_triangles_transformed(&soup.vertices, &soup.indices, placement);
        }
    }
}

/// Rebuilds the field keeping only each column's highest span, the one
/// occupancy and height derive from.
fn reduce_to_top_spans(field: &Heightfield) -> Heightfield {
    let mut reduced = Heightfield::new(field.rect(), field.cell_size(), field.merge_tolerance());
    for coord in field.rect().cells() {
        if let Some(span) = field.spans(coord).last() {
            reduced.insert_span(coord, span.min, span.max);
        }
    }
    reduced
}

/// Signed-area orientation test. Degenerate outlines count as
/// counterclockwise; painting rejects them downstream anyway.
fn is_counterclockwise(points: &[Point2<f32>]) -> bool {
    let Some(&last) = points.last() else {
        return true;
    };
    let mut doubled_area = 0.0;
    let mut prev = last;
    for &point in points {
        doubled_area += prev.x * point.y - point.x * prev.y;
        prev = point;
    }
    doubled_area >= 0.0
}
