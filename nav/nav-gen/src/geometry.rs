//! Geometry and modifier inputs to tile generation.
//!
//! A [`GeometrySource`] hands the scheduler triangle soups and area
//! modifiers overlapping a queried world box. Both carry optional
//! per-instance placements, so an asset gathered once can stamp many
//! copies into a tile.

use nalgebra::{Isometry3, Point2, Point3, Vector3};

use crate::error::Result;

/// An indexed triangle mesh gathered from the world.
#[derive(Debug, Clone, Default)]
pub struct TriangleSoup {
    /// Triangle vertices. Local space when `instances` is non-empty,
    /// world space otherwise.
    pub vertices: Vec<Point3<f32>>,
    /// Triangles as consecutive index triplets into `vertices`.
    pub indices: Vec<u32>,
    /// Placements to rasterize `vertices` under. Empty means the
    /// vertices are already in world space and rasterize once.
    pub instances: Vec<Isometry3<f32>>,
}

impl TriangleSoup {
    /// Returns `true` when `indices` forms whole triangles that stay in
    /// bounds of `vertices`.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.indices.len() % 3 == 0
            && self
                .indices
                .iter()
                .all(|&index| (index as usize) < self.vertices.len())
    }

    /// Number of whole triangles described.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// How an area modifier changes the cells it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaEffect {
    /// Covered cells become occupied.
    Blocked,
    /// Covered cells become unoccupied, reopening them for traversal.
    Clear,
}

impl AreaEffect {
    /// The occupancy value painted into covered cells.
    #[must_use]
    pub const fn occupancy(self) -> bool {
        matches!(self, Self::Blocked)
    }
}

/// The footprint of one area modifier.
///
/// Shapes live in world space, or in instance-local space when stamped
/// through [`AreaModifier::instances`]. Painting uses only the
/// two-dimensional footprint; the vertical extent exists to cull shapes
/// outside the generated Z range.
#[derive(Debug, Clone, PartialEq)]
pub enum ModifierShape {
    /// A vertical cylinder; paints its circular cross section.
    Cylinder {
        /// Center of the cylinder.
        center: Point3<f32>,
        /// Cross-section radius.
        radius: f32,
        /// Half the cylinder's vertical extent.
        half_height: f32,
    },
    /// An oriented box; paints the bounding rect of its footprint.
    OrientedBox {
        /// Placement of the box center.
        transform: Isometry3<f32>,
        /// Half extents along the box's local axes.
        half_extents: Vector3<f32>,
    },
    /// A convex polygon extruded over a vertical range; paints the
    /// polygon interior. Vertex orientation does not matter; painting
    /// normalizes it.
    ConvexOutline {
        /// Polygon vertices in world space.
        points: Vec<Point2<f32>>,
        /// Lower end of the extrusion.
        min_z: f32,
        /// Upper end of the extrusion.
        max_z: f32,
    },
}

impl ModifierShape {
    /// Returns the shape placed under `placement`.
    ///
    /// Placements are rigid. Cylinders stay axis-aligned and keep their
    /// radius; outlines move within the grid plane and shift vertically
    /// by the placement's Z translation.
    #[must_use]
    pub fn transformed(&self, placement: &Isometry3<f32>) -> Self {
        match self {
            Self::Cylinder {
                center,
                radius,
                half_height,
            } => Self::Cylinder {
                center: placement * center,
                radius: *radius,
                half_height: *half_height,
            },
            Self::OrientedBox {
                transform,
                half_extents,
            } => Self::OrientedBox {
                transform: placement * transform,
                half_extents: *half_extents,
            },
            Self::ConvexOutline {
                points,
                min_z,
                max_z,
            } => Self::ConvexOutline {
                points: points
                    .iter()
                    .map(|point| (placement * Point3::new(point.x, point.y, 0.0)).xy())
                    .collect(),
                min_z: min_z + placement.translation.z,
                max_z: max_z + placement.translation.z,
            },
        }
    }

    /// The world-space axis-aligned box enclosing the shape, as
    /// (min, max) corners.
    ///
    /// An outline with no points yields a zero-size box at the world
    /// origin.
    #[must_use]
    pub fn world_aabb(&self) -> (Point3<f32>, Point3<f32>) {
        match self {
            Self::Cylinder {
                center,
                radius,
                half_height,
            } => {
                let half = Vector3::new(*radius, *radius, *half_height);
                (center - half, center + half)
            }
            Self::OrientedBox {
                transform,
                half_extents,
            } => {
                let half = transform.rotation.to_rotation_matrix().into_inner().abs() * half_extents;
                let center = Point3::from(transform.translation.vector);
                (center - half, center + half)
            }
            Self::ConvexOutline {
                points,
                min_z,
                max_z,
            } => {
                let mut min = Point2::new(0.0, 0.0);
                let mut max = min;
                if let Some((first, rest)) = points.split_first() {
                    min = *first;
                    max = *first;
                    for point in rest {
                        min = Point2::new(min.x.min(point.x), min.y.min(point.y));
                        max = Point2::new(max.x.max(point.x), max.y.max(point.y));
                    }
                }
                (
                    Point3::new(min.x, min.y, *min_z),
                    Point3::new(max.x, max.y, *max_z),
                )
            }
        }
    }
}

/// One modifier gathered from the world: a footprint, its effect, and the
/// placements to stamp it under.
#[derive(Debug, Clone)]
pub struct AreaModifier {
    /// Footprint to paint.
    pub shape: ModifierShape,
    /// Occupancy painted into covered cells.
    pub effect: AreaEffect,
    /// Placements to stamp `shape` under. Empty means the shape is
    /// already in world space and stamps once.
    pub instances: Vec<Isometry3<f32>>,
}

/// Everything a [`GeometrySource`] returned for one query box.
#[derive(Debug, Clone, Default)]
pub struct CollectedGeometry {
    /// Triangle soups to rasterize.
    pub triangles: Vec<TriangleSoup>,
    /// Area modifiers to paint.
    pub modifiers: Vec<AreaModifier>,
}

impl CollectedGeometry {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when nothing was gathered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty() && self.modifiers.is_empty()
    }

    /// Moves everything out of `other` into `self`.
    pub fn append(&mut self, other: &mut CollectedGeometry) {
        self.triangles.append(&mut other.triangles);
        self.modifiers.append(&mut other.modifiers);
    }
}

/// Supplies world geometry to tile generation.
///
/// The scheduler gathers on its own thread, before a tile task starts, so
/// implementations need no internal synchronization. `collect` is called
/// once per dirty rect of a launching tile with that rect's world box.
pub trait GeometrySource {
    /// Gathers geometry overlapping the world box `[bounds_min, bounds_max]`.
    ///
    /// Area modifiers are always gathered; triangle soups only when
    /// `want_triangles` is set, which lets modifier-only repaints skip the
    /// mesh export entirely.
    ///
    /// # Errors
    ///
    /// Any error aborts the launch of the requesting tile; the tile is
    /// re-queued and retried on a later pass.
    fn collect(
        &mut self,
        bounds_min: Point3<f32>,
        bounds_max: Point3<f32>,
        want_triangles: bool,
    ) -> Result<CollectedGeometry>;
}
