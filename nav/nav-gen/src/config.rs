//! Build configuration for tile regeneration.

use gw_grid::{BIT_TILE_HEIGHT, BIT_TILE_WIDTH, CellLayout, GridRect, TileExtent};
use nalgebra::Point3;
use nav_surface::DEFAULT_MERGE_TOLERANCE;

use crate::error::{GenError, Result};

/// Parameters shared by every generated tile.
///
/// The defaults describe a grid of 128x128-cell tiles with one-meter cells
/// (100 world units), walkable steps of up to half a meter, and an
/// effectively unbounded vertical clamp.
///
/// # Example
///
/// ```
/// use gw_grid::TileExtent;
/// use nav_gen::GenConfig;
///
/// let config = GenConfig::default()
///     .with_tile_extent(TileExtent::square(64))
///     .with_cell_size(50.0)
///     .with_max_height_delta(25.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenConfig {
    /// Cells per tile on each axis.
    tile_extent: TileExtent,
    /// World-space edge length of one cell.
    cell_size: f32,
    /// Largest span thickness a cell can carry and stay walkable.
    max_height_delta: f32,
    /// Lower world-space Z bound considered during generation.
    min_z: f32,
    /// Upper world-space Z bound considered during generation.
    max_z: f32,
    /// Vertical distance within which rasterized spans merge.
    merge_tolerance: f32,
}

impl GenConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            tile_extent: TileExtent::new(128, 128),
            cell_size: 100.0,
            max_height_delta: 50.0,
            min_z: -1e9,
            max_z: 1e9,
            merge_tolerance: DEFAULT_MERGE_TOLERANCE,
        }
    }

    /// Sets the tile extent.
    ///
    /// Both axes must be positive multiples of the bit grid tile
    /// dimensions ([`BIT_TILE_WIDTH`] x [`BIT_TILE_HEIGHT`]) so occupancy
    /// updates take the whole-tile fast path and snapshots carry no
    /// padding words.
    #[must_use]
    pub const fn with_tile_extent(mut self, extent: TileExtent) -> Self {
        self.tile_extent = extent;
        self
    }

    /// Sets the world-space cell size.
    #[must_use]
    pub const fn with_cell_size(mut self, cell_size: f32) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Sets the walkable height delta.
    ///
    /// A cell whose chosen span is thicker than this is occupied.
    #[must_use]
    pub const fn with_max_height_delta(mut self, delta: f32) -> Self {
        self.max_height_delta = delta;
        self
    }

    /// Sets the vertical world clamp applied to geometry queries.
    #[must_use]
    pub const fn with_z_clamp(mut self, min_z: f32, max_z: f32) -> Self {
        self.min_z = min_z;
        self.max_z = max_z;
        self
    }

    /// Sets the span merge tolerance for rebuilt heightfields.
    #[must_use]
    pub const fn with_merge_tolerance(mut self, tolerance: f32) -> Self {
        self.merge_tolerance = tolerance;
        self
    }

    /// Returns the tile extent.
    #[must_use]
    pub const fn tile_extent(&self) -> TileExtent {
        self.tile_extent
    }

    /// Returns the world-space cell size.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Returns the walkable height delta.
    #[must_use]
    pub const fn max_height_delta(&self) -> f32 {
        self.max_height_delta
    }

    /// Returns the lower vertical clamp.
    #[must_use]
    pub const fn min_z(&self) -> f32 {
        self.min_z
    }

    /// Returns the upper vertical clamp.
    #[must_use]
    pub const fn max_z(&self) -> f32 {
        self.max_z
    }

    /// Returns the span merge tolerance.
    #[must_use]
    pub const fn merge_tolerance(&self) -> f32 {
        self.merge_tolerance
    }

    /// Returns the world-space cell layout for this configuration.
    #[must_use]
    pub fn layout(&self) -> CellLayout {
        CellLayout::new(self.cell_size)
    }

    /// Returns the world-space box covered by a grid rect, clamped
    /// vertically to the configured Z range.
    ///
    /// Geometry queries use this box, so anything a source reports must
    /// overlap it.
    #[must_use]
    pub fn world_bounds_of(&self, rect: GridRect) -> (Point3<f32>, Point3<f32>) {
        let (min, max) = self.layout().world_bounds(rect);
        (
            Point3::new(min.x, min.y, self.min_z),
            Point3::new(max.x, max.y, self.max_z),
        )
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns the [`GenError`] describing the first invalid parameter
    /// found.
    pub fn validate(&self) -> Result<()> {
        #[allow(clippy::cast_possible_wrap)]
        let (unit_w, unit_h) = (BIT_TILE_WIDTH as i32, BIT_TILE_HEIGHT as i32);
        if self.tile_extent.width <= 0
            || self.tile_extent.height <= 0
            || self.tile_extent.width % unit_w != 0
            || self.tile_extent.height % unit_h != 0
        {
            return Err(GenError::InvalidTileExtent {
                width: self.tile_extent.width,
                height: self.tile_extent.height,
                expected_width: unit_w,
                expected_height: unit_h,
            });
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(GenError::InvalidCellSize(self.cell_size));
        }
        if !self.max_height_delta.is_finite() || self.max_height_delta < 0.0 {
            return Err(GenError::InvalidHeightDelta(self.max_height_delta));
        }
        if self.min_z > self.max_z {
            return Err(GenError::InvalidZClamp {
                min: self.min_z,
                max: self.max_z,
            });
        }
        if !self.merge_tolerance.is_finite() || self.merge_tolerance < 0.0 {
            return Err(GenError::InvalidMergeTolerance(self.merge_tolerance));
        }
        Ok(())
    }
}

impl Default for GenConfig {
    fn default() -> Self {
        Self::new()
    }
}
