//! Grid-wide configuration.

use gw_grid::{CellLayout, TileExtent};
use nav_gen::GenConfig;
use nav_path::SearchFilter;

use crate::error::Result;

/// Parameters fixed for the lifetime of one navigation grid.
///
/// Generation parameters shape every rebuilt tile and define the cell
/// layout queries resolve against; the default filter seeds path
/// queries that do not bring their own. Defaults match [`GenConfig`]
/// and [`SearchFilter`].
///
/// # Example
///
/// ```
/// use gw_grid::TileExtent;
/// use nav_gen::GenConfig;
/// use nav_grid::GridConfig;
///
/// let config = GridConfig::new().with_gen_config(
///     GenConfig::new()
///         .with_tile_extent(TileExtent::square(64))
///         .with_cell_size(50.0),
/// );
/// assert_eq!(config.tile_extent(), TileExtent::square(64));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    /// Tile generation parameters.
    gen_config: GenConfig,
    /// Filter applied when a path query does not supply one.
    default_filter: SearchFilter,
}

impl GridConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            gen_config: GenConfig::new(),
            default_filter: SearchFilter::new(),
        }
    }

    /// Sets the tile generation parameters.
    #[must_use]
    pub const fn with_gen_config(mut self, config: GenConfig) -> Self {
        self.gen_config = config;
        self
    }

    /// Sets the default search filter.
    #[must_use]
    pub const fn with_default_filter(mut self, filter: SearchFilter) -> Self {
        self.default_filter = filter;
        self
    }

    /// Returns the tile generation parameters.
    #[must_use]
    pub const fn gen_config(&self) -> GenConfig {
        self.gen_config
    }

    /// Returns the default search filter.
    #[must_use]
    pub const fn default_filter(&self) -> SearchFilter {
        self.default_filter
    }

    /// Returns the tile extent.
    #[must_use]
    pub const fn tile_extent(&self) -> TileExtent {
        self.gen_config.tile_extent()
    }

    /// Returns the world-space cell size.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.gen_config.cell_size()
    }

    /// Returns the world-space cell layout.
    #[must_use]
    pub fn layout(&self) -> CellLayout {
        self.gen_config.layout()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns the error describing the first invalid parameter found,
    /// checking generation parameters before the default filter.
    pub fn validate(&self) -> Result<()> {
        self.gen_config.validate()?;
        self.default_filter.validate()?;
        Ok(())
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::error::GridQueryError;

    #[test]
    fn test_default_config() {
        let config = GridConfig::default();
        assert_eq!(config.tile_extent(), TileExtent::square(128));
        assert_relative_eq!(config.cell_size(), 100.0);
        assert_eq!(config.default_filter().node_budget(), 2048);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = GridConfig::new()
            .with_gen_config(GenConfig::new().with_cell_size(25.0))
            .with_default_filter(SearchFilter::new().with_node_budget(64));

        assert_relative_eq!(config.cell_size(), 25.0);
        assert_relative_eq!(config.gen_config().cell_size(), 25.0);
        assert_eq!(config.default_filter().node_budget(), 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_propagates_gen_errors() {
        let config = GridConfig::new().with_gen_config(GenConfig::new().with_cell_size(0.0));
        assert!(matches!(
            config.validate(),
            Err(GridQueryError::Config(_))
        ));
    }

    #[test]
    fn test_validate_propagates_filter_errors() {
        let config =
            GridConfig::new().with_default_filter(SearchFilter::new().with_node_budget(0));
        assert!(matches!(
            config.validate(),
            Err(GridQueryError::Filter(_))
        ));
    }
}
