//! Versioned binary snapshots of a whole grid.
//!
//! A grid persists as a fixed header followed by a bincode payload:
//!
//! 1. **Magic bytes**: `GWG1` (4 bytes) - identifies the format
//! 2. **Version**: `u32` little-endian (4 bytes) - currently 1
//! 3. **Flags**: `u32` little-endian (4 bytes) - reserved
//! 4. **Payload**: bincode-encoded [`GridSnapshot`]
//!
//! The payload holds the tile extent followed by every published tile
//! as a coordinate paired with its tile snapshot, in row-major tile
//! order. Restoring replays the tiles into a fresh [`NavGrid`] under a
//! caller-supplied configuration, whose tile extent must match the
//! captured one.
//!
//! # Example
//!
//! ```
//! use gw_grid::{GridCoord, TileCoord, TileExtent};
//! use nav_gen::{GenConfig, TilePublisher};
//! use nav_grid::{load_grid_bytes, save_grid_bytes, GridConfig, GridSnapshot, NavGrid};
//! use nav_surface::{TileLayer, TileSource};
//!
//! let config = GridConfig::new().with_gen_config(
//!     GenConfig::new().with_tile_extent(TileExtent::square(32)),
//! );
//! let mut grid = NavGrid::new(config)?;
//! let tile = TileCoord::new(0, 0);
//! let mut layer = TileLayer::new(tile.cell_rect(config.tile_extent()), 100.0, false, 0.0);
//! layer.set_occupied(GridCoord::new(3, 4), true);
//! grid.publish_tile(tile, Some(layer), None);
//!
//! let bytes = save_grid_bytes(&GridSnapshot::capture(&grid))?;
//! let restored = load_grid_bytes(&bytes)?.restore(config)?;
//! assert!(restored.layer(tile).is_some_and(|layer| layer.is_occupied(GridCoord::new(3, 4))));
//! # Ok::<(), nav_grid::GridQueryError>(())
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use gw_grid::{TileCoord, TileExtent};
use nav_gen::TilePublisher;
use nav_surface::TileSnapshot;
use serde::{Deserialize, Serialize};

use crate::config::GridConfig;
use crate::error::{GridQueryError, Result};
use crate::grid::NavGrid;

/// Magic bytes identifying a grid snapshot.
pub const GRID_MAGIC: [u8; 4] = *b"GWG1";

/// Current grid snapshot format version.
pub const GRID_VERSION: u32 = 1;

/// Header size in bytes (magic + version + flags).
pub const GRID_HEADER_SIZE: usize = 12;

/// Grid snapshot file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridHeader {
    /// Magic bytes (must be `GWG1`).
    pub magic: [u8; 4],
    /// Format version.
    pub version: u32,
    /// Flags (reserved for future use).
    pub flags: u32,
}

impl GridHeader {
    /// Create a new header with current format values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: GRID_MAGIC,
            version: GRID_VERSION,
            flags: 0,
        }
    }

    /// Write the header to a writer.
    fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.magic)?;
        writer.write_all(&self.version.to_le_bytes())?;
        writer.write_all(&self.flags.to_le_bytes())?;
        Ok(())
    }

    /// Read the header from a reader.
    fn read_from<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;

        let mut version_bytes = [0u8; 4];
        reader.read_exact(&mut version_bytes)?;
        let version = u32::from_le_bytes(version_bytes);

        let mut flags_bytes = [0u8; 4];
        reader.read_exact(&mut flags_bytes)?;
        let flags = u32::from_le_bytes(flags_bytes);

        Ok(Self {
            magic,
            version,
            flags,
        })
    }

    /// Validate the header.
    fn validate(&self) -> Result<()> {
        if self.magic != GRID_MAGIC {
            return Err(GridQueryError::InvalidMagic(self.magic));
        }
        if self.version != GRID_VERSION {
            return Err(GridQueryError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

impl Default for GridHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Complete persisted state of a grid's published tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSnapshot {
    /// Cells per tile the grid was partitioned with.
    pub tile_extent: TileExtent,
    /// Published tiles in row-major tile order.
    pub tiles: Vec<(TileCoord, TileSnapshot)>,
}

impl GridSnapshot {
    /// Captures every published tile of a grid.
    #[must_use]
    pub fn capture(grid: &NavGrid) -> Self {
        let mut tiles: Vec<(TileCoord, TileSnapshot)> = grid
            .tiles()
            .map(|(tile, data)| {
                (
                    tile,
                    TileSnapshot::capture(&data.layer, data.heightfield.as_deref()),
                )
            })
            .collect();
        // Row-major order keeps snapshots of the same grid byte-identical.
        tiles.sort_by_key(|(tile, _)| (tile.y, tile.x));
        Self {
            tile_extent: grid.config().tile_extent(),
            tiles,
        }
    }

    /// Cells per tile the snapshot was captured with.
    #[must_use]
    pub const fn tile_extent(&self) -> TileExtent {
        self.tile_extent
    }

    /// Number of captured tiles.
    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Rebuilds a grid under the given configuration and republishes
    /// every captured tile into it.
    ///
    /// # Errors
    ///
    /// Returns [`GridQueryError::ExtentMismatch`] when the
    /// configuration partitions tiles differently than the snapshot,
    /// [`GridQueryError::Config`] when the configuration is invalid,
    /// and [`GridQueryError::Surface`] when a tile payload disagrees
    /// with its dimensions.
    pub fn restore(&self, config: GridConfig) -> Result<NavGrid> {
        if config.tile_extent() != self.tile_extent {
            return Err(GridQueryError::ExtentMismatch {
                expected: config.tile_extent(),
                got: self.tile_extent,
            });
        }
        let mut grid = NavGrid::new(config)?;
        for (tile, snapshot) in &self.tiles {
            let (layer, heightfield) = snapshot.restore()?;
            grid.publish_tile(*tile, Some(layer), heightfield);
        }
        Ok(grid)
    }
}

/// Save a [`GridSnapshot`] to a file.
///
/// # Errors
///
/// Returns an error when the file cannot be created or serialization
/// fails.
pub fn save_grid_file(snapshot: &GridSnapshot, path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    save_grid_writer(snapshot, &mut writer)
}

/// Save a [`GridSnapshot`] to a writer.
///
/// # Errors
///
/// Returns [`GridQueryError::Serialize`] when the header or payload
/// fails to write.
pub fn save_grid_writer<W: Write>(snapshot: &GridSnapshot, writer: &mut W) -> Result<()> {
    let header = GridHeader::new();
    header
        .write_to(writer)
        .map_err(|e| GridQueryError::Serialize(e.to_string()))?;

    bincode::serialize_into(writer, snapshot)
        .map_err(|e| GridQueryError::Serialize(e.to_string()))?;

    Ok(())
}

/// Save a [`GridSnapshot`] to a byte vector.
///
/// # Errors
///
/// Returns [`GridQueryError::Serialize`] when serialization fails.
pub fn save_grid_bytes(snapshot: &GridSnapshot) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    save_grid_writer(snapshot, &mut buffer)?;
    Ok(buffer)
}

/// Load a [`GridSnapshot`] from a file.
///
/// # Errors
///
/// Returns an error when the file cannot be opened, the header is
/// invalid, or the payload fails to decode.
pub fn load_grid_file(path: impl AsRef<Path>) -> Result<GridSnapshot> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    load_grid_reader(&mut reader)
}

/// Load a [`GridSnapshot`] from a reader.
///
/// # Errors
///
/// Returns [`GridQueryError::InvalidMagic`] or
/// [`GridQueryError::UnsupportedVersion`] for bad headers and
/// [`GridQueryError::Deserialize`] when the payload fails to decode.
pub fn load_grid_reader<R: Read>(reader: &mut R) -> Result<GridSnapshot> {
    let header = GridHeader::read_from(reader)
        .map_err(|e| GridQueryError::Deserialize(format!("failed to read header: {e}")))?;
    header.validate()?;

    let snapshot: GridSnapshot = bincode::deserialize_from(reader)
        .map_err(|e| GridQueryError::Deserialize(e.to_string()))?;

    Ok(snapshot)
}

/// Load a [`GridSnapshot`] from a byte slice.
///
/// # Errors
///
/// Same conditions as [`load_grid_reader`].
pub fn load_grid_bytes(bytes: &[u8]) -> Result<GridSnapshot> {
    let mut reader = std::io::Cursor::new(bytes);
    load_grid_reader(&mut reader)
}

/// Check whether a file starts with the grid snapshot magic bytes.
#[must_use]
pub fn is_grid_file(path: impl AsRef<Path>) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    let mut reader = BufReader::new(file);
    let mut magic = [0u8; 4];
    if reader.read_exact(&mut magic).is_err() {
        return false;
    }
    magic == GRID_MAGIC
}

/// Check whether a byte slice starts with the grid snapshot magic bytes.
#[must_use]
pub fn is_grid_bytes(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && bytes[..4] == GRID_MAGIC
}
