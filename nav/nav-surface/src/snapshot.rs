//! Versioned binary tile snapshots.
//!
//! A published tile persists as a fixed header followed by a bincode
//! payload:
//!
//! 1. **Magic bytes**: `GWT1` (4 bytes) - identifies the format
//! 2. **Version**: `u32` little-endian (4 bytes) - currently 1
//! 3. **Flags**: `u32` little-endian (4 bytes) - reserved
//! 4. **Payload**: bincode-encoded [`TileSnapshot`]
//!
//! The payload field order is part of the format: the optional
//! heightfield first (rect, cell size, merge tolerance, then per cell a
//! span count followed by its span bounds in list order), then the
//! occupancy layer (rect, cell size, bit words, cell heights).
//!
//! # Example
//!
//! ```
//! use gw_grid::{GridCoord, GridRect};
//! use nav_surface::{load_tile_bytes, save_tile_bytes, TileLayer, TileSnapshot};
//!
//! let rect = GridRect::from_origin_size(GridCoord::new(0, 0), 32, 32);
//! let mut layer = TileLayer::new(rect, 100.0, false, 0.0);
//! layer.set_occupied(GridCoord::new(3, 4), true);
//!
//! let bytes = save_tile_bytes(&TileSnapshot::capture(&layer, None)).unwrap();
//! let (restored, heightfield) = load_tile_bytes(&bytes).unwrap().restore().unwrap();
//! assert!(restored.is_occupied(GridCoord::new(3, 4)));
//! assert!(heightfield.is_none());
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use gw_grid::{BitGrid, GridRect};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SurfaceError};
use crate::heightfield::Heightfield;
use crate::layer::TileLayer;

/// Magic bytes identifying a tile snapshot.
pub const TILE_MAGIC: [u8; 4] = *b"GWT1";

/// Current tile snapshot format version.
pub const TILE_VERSION: u32 = 1;

/// Header size in bytes (magic + version + flags).
pub const TILE_HEADER_SIZE: usize = 12;

/// Tile snapshot file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileHeader {
    /// Magic bytes (must be `GWT1`).
    pub magic: [u8; 4],
    /// Format version.
    pub version: u32,
    /// Flags (reserved for future use).
    pub flags: u32,
}

impl TileHeader {
    /// Create a new header with current format values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: TILE_MAGIC,
            version: TILE_VERSION,
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
        if self.magic != TILE_MAGIC {
            return Err(SurfaceError::InvalidMagic(self.magic));
        }
        if self.version != TILE_VERSION {
            return Err(SurfaceError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

impl Default for TileHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialized form of a [`TileLayer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSnapshot {
    /// Cell rect the layer covers.
    pub rect: GridRect,
    /// World-space cell edge length.
    pub cell_size: f32,
    /// Occupancy bit words in tile order, padded dimensions included.
    pub words: Vec<u32>,
    /// Per-cell surface heights, one per cell of `rect`.
    pub heights: Vec<f32>,
}

impl LayerSnapshot {
    /// Captures a layer's occupancy and heights.
    #[must_use]
    pub fn capture(layer: &TileLayer) -> Self {
        Self {
            rect: layer.rect(),
            cell_size: layer.cell_size(),
            words: layer.occupancy().words().collect(),
            heights: layer.heights().to_vec(),
        }
    }

    /// Rebuilds the layer.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Grid`] when the bit words do not match the
    /// rect's dimensions and [`SurfaceError::CountMismatch`] when the
    /// height array does not cover the rect.
    #[allow(clippy::cast_sign_loss)]
    pub fn restore(&self) -> Result<TileLayer> {
        let width = self.rect.width().max(0) as u32;
        let height = self.rect.height().max(0) as u32;
        let occupancy = BitGrid::from_words(width, height, &self.words)?;

        let expected = self.rect.area() as usize;
        if self.heights.len() != expected {
            return Err(SurfaceError::CountMismatch {
                expected,
                got: self.heights.len(),
            });
        }

        Ok(TileLayer::from_parts(
            self.rect,
            self.cell_size,
            occupancy,
            self.heights.clone(),
        ))
    }
}

/// Serialized form of a [`Heightfield`].
///
/// Span bounds are stored flattened: each cell of `rect` (column-major)
/// contributes `span_counts[cell]` consecutive `(min, max)` pairs in
/// bottom-to-top list order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightfieldSnapshot {
    /// Cell rect the heightfield covers.
    pub rect: GridRect,
    /// World-space cell edge length.
    pub cell_size: f32,
    /// Interval merge tolerance.
    pub merge_tolerance: f32,
    /// Number of spans per cell, one entry per cell of `rect`.
    pub span_counts: Vec<u32>,
    /// Flattened `(min, max)` span bounds.
    pub span_bounds: Vec<(f32, f32)>,
}

impl HeightfieldSnapshot {
    /// Captures a heightfield's span columns.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn capture(heightfield: &Heightfield) -> Self {
        let rect = heightfield.rect();
        let mut span_counts = Vec::with_capacity(rect.area() as usize);
        let mut span_bounds = Vec::with_capacity(heightfield.live_spans());
        for coord in rect.cells() {
            let mut count = 0u32;
            for span in heightfield.spans(coord) {
                span_bounds.push((span.min, span.max));
                count += 1;
            }
            span_counts.push(count);
        }
        Self {
            rect,
            cell_size: heightfield.cell_size(),
            merge_tolerance: heightfield.merge_tolerance(),
            span_counts,
            span_bounds,
        }
    }

    /// Rebuilds the heightfield with a compact span arena.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::CountMismatch`] when the span counts do
    /// not cover the rect or the flattened bounds do not sum to the
    /// counts.
    #[allow(clippy::cast_sign_loss)]
    pub fn restore(&self) -> Result<Heightfield> {
        let expected = self.rect.area() as usize;
        if self.span_counts.len() != expected {
            return Err(SurfaceError::CountMismatch {
                expected,
                got: self.span_counts.len(),
            });
        }
        let total: usize = self.span_counts.iter().map(|&count| count as usize).sum();
        if self.span_bounds.len() != total {
            return Err(SurfaceError::CountMismatch {
                expected: total,
                got: self.span_bounds.len(),
            });
        }

        let mut heightfield = Heightfield::new(self.rect, self.cell_size, self.merge_tolerance);
        let mut cursor = 0;
        for (coord, &count) in self.rect.cells().zip(self.span_counts.iter()) {
            let end = cursor + count as usize;
            // Stored bottom-to-top; columns obeying the merge invariant
            // rebuild span for span without merging.
            for &(min, max) in &self.span_bounds[cursor..end] {
                heightfield.insert_span(coord, min, max);
            }
            cursor = end;
        }
        if heightfield.live_spans() != total {
            tracing::warn!(
                "Snapshot spans overlapped within tolerance; {} stored spans rebuilt as {}",
                total,
                heightfield.live_spans()
            );
        }
        Ok(heightfield)
    }
}

/// Complete persisted state of one published tile.
///
/// The heightfield is optional: stores that never regenerate
/// incrementally publish layers alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSnapshot {
    /// Span columns the layer was derived from, when retained.
    pub heightfield: Option<HeightfieldSnapshot>,
    /// Occupancy and heights.
    pub layer: LayerSnapshot,
}

impl TileSnapshot {
    /// Captures a tile's layer and, when present, its heightfield.
    #[must_use]
    pub fn capture(layer: &TileLayer, heightfield: Option<&Heightfield>) -> Self {
        Self {
            heightfield: heightfield.map(HeightfieldSnapshot::capture),
            layer: LayerSnapshot::capture(layer),
        }
    }

    /// Rebuilds the tile's layer and heightfield.
    ///
    /// # Errors
    ///
    /// Returns an error when either component's payload disagrees with
    /// its dimensions.
    pub fn restore(&self) -> Result<(TileLayer, Option<Heightfield>)> {
        let layer = self.layer.restore()?;
        let heightfield = match &self.heightfield {
            Some(snapshot) => Some(snapshot.restore()?),
            None => None,
        };
        Ok((layer, heightfield))
    }
}

/// Save a [`TileSnapshot`] to a file.
///
/// # Errors
///
/// Returns an error when the file cannot be created or serialization
/// fails.
pub fn save_tile_file(snapshot: &TileSnapshot, path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    save_tile_writer(snapshot, &mut writer)
}

/// Save a [`TileSnapshot`] to a writer.
///
/// # Errors
///
/// Returns [`SurfaceError::Serialize`] when the header or payload fails
/// to write.
pub fn save_tile_writer<W: Write>(snapshot: &TileSnapshot, writer: &mut W) -> Result<()> {
    let header = TileHeader::new();
    header
        .write_to(writer)
        .map_err(|e| SurfaceError::Serialize(e.to_string()))?;

    bincode::serialize_into(writer, snapshot).map_err(|e| SurfaceError::Serialize(e.to_string()))?;

    Ok(())
}

/// Save a [`TileSnapshot`] to a byte vector.
///
/// # Errors
///
/// Returns [`SurfaceError::Serialize`] when serialization fails.
pub fn save_tile_bytes(snapshot: &TileSnapshot) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    save_tile_writer(snapshot, &mut buffer)?;
    Ok(buffer)
}

/// Load a [`TileSnapshot`] from a file.
///
/// # Errors
///
/// Returns an error when the file cannot be opened, the header is
/// invalid, or the payload fails to decode.
pub fn load_tile_file(path: impl AsRef<Path>) -> Result<TileSnapshot> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    load_tile_reader(&mut reader)
}

/// Load a [`TileSnapshot`] from a reader.
///
/// # Errors
///
/// Returns [`SurfaceError::InvalidMagic`] or
/// [`SurfaceError::UnsupportedVersion`] for bad headers and
/// [`SurfaceError::Deserialize`] when the payload fails to decode.
pub fn load_tile_reader<R: Read>(reader: &mut R) -> Result<TileSnapshot> {
    let header = TileHeader::read_from(reader)
        .map_err(|e| SurfaceError::Deserialize(format!("failed to read header: {e}")))?;
    header.validate()?;

    let snapshot: TileSnapshot =
        bincode::deserialize_from(reader).map_err(|e| SurfaceError::Deserialize(e.to_string()))?;

    Ok(snapshot)
}

/// Load a [`TileSnapshot`] from a byte slice.
///
/// # Errors
///
/// Same conditions as [`load_tile_reader`].
pub fn load_tile_bytes(bytes: &[u8]) -> Result<TileSnapshot> {
    let mut reader = std::io::Cursor::new(bytes);
    load_tile_reader(&mut reader)
}

/// Check whether a file starts with the tile snapshot magic bytes.
#[must_use]
pub fn is_tile_file(path: impl AsRef<Path>) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    let mut reader = BufReader::new(file);
    let mut magic = [0u8; 4];
    if reader.read_exact(&mut magic).is_err() {
        return false;
    }
    magic == TILE_MAGIC
}

/// Check whether a byte slice starts with the tile snapshot magic bytes.
#[must_use]
pub fn is_tile_bytes(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && bytes[..4] == TILE_MAGIC
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use gw_grid::GridCoord;

    fn sample_layer() -> TileLayer {
        let rect = GridRect::from_origin_size(GridCoord::new(-32, 0), 32, 32);
        let mut layer = TileLayer::new(rect, 100.0, false, 0.0);
        layer.set_occupied(GridCoord::new(-32, 0), true);
        layer.set_occupied(GridCoord::new(-5, 17), true);
        layer.set_height(GridCoord::new(-5, 17), 350.0);
        layer.set_height(GridCoord::new(-1, 31), -120.0);
        layer
    }

    fn sample_heightfield() -> Heightfield {
        let rect = GridRect::from_origin_size(GridCoord::new(-32, 0), 32, 32);
        let mut heightfield = Heightfield::new(rect, 100.0, 1e-8);
        heightfield.insert_span(GridCoord::new(-32, 0), 0.0, 50.0);
        heightfield.insert_span(GridCoord::new(-32, 0), 200.0, 260.0);
        heightfield.insert_span(GridCoord::new(-5, 17), -10.0, 350.0);
        heightfield
    }

    #[test]
    fn test_header_roundtrip() {
        let header = TileHeader::new();
        let mut buffer = Vec::new();
        header.write_to(&mut buffer).unwrap();

        assert_eq!(buffer.len(), TILE_HEADER_SIZE);

        let mut cursor = std::io::Cursor::new(&buffer);
        let loaded = TileHeader::read_from(&mut cursor).unwrap();

        assert_eq!(header, loaded);
    }

    #[test]
    fn test_header_validation() {
        let mut header = TileHeader::new();
        assert!(header.validate().is_ok());

        header.magic = *b"NOPE";
        assert!(matches!(
            header.validate(),
            Err(SurfaceError::InvalidMagic(_))
        ));

        header.magic = TILE_MAGIC;
        header.version = 999;
        assert!(matches!(
            header.validate(),
            Err(SurfaceError::UnsupportedVersion(999))
        ));
    }

    #[test]
    fn test_layer_snapshot_roundtrip() {
        let layer = sample_layer();
        let restored = LayerSnapshot::capture(&layer).restore().unwrap();

        assert_eq!(restored.rect(), layer.rect());
        assert_eq!(restored.cell_size(), layer.cell_size());
        for coord in layer.rect().cells() {
            assert_eq!(restored.is_occupied(coord), layer.is_occupied(coord));
            assert_eq!(restored.height_of(coord), layer.height_of(coord));
        }
    }

    #[test]
    fn test_heightfield_snapshot_roundtrip() {
        let heightfield = sample_heightfield();
        let restored = HeightfieldSnapshot::capture(&heightfield)
            .restore()
            .unwrap();

        assert_eq!(restored.rect(), heightfield.rect());
        assert_eq!(restored.merge_tolerance(), heightfield.merge_tolerance());
        for coord in heightfield.rect().cells() {
            let original: Vec<_> = heightfield.spans(coord).map(|s| (s.min, s.max)).collect();
            let rebuilt: Vec<_> = restored.spans(coord).map(|s| (s.min, s.max)).collect();
            assert_eq!(original, rebuilt, "at {coord:?}");
        }
        // The rebuilt arena holds exactly the live spans.
        assert_eq!(restored.total_allocated_spans(), restored.live_spans());
        assert_eq!(restored.free_spans(), 0);
    }

    #[test]
    fn test_tile_bytes_roundtrip() {
        let layer = sample_layer();
        let heightfield = sample_heightfield();
        let snapshot = TileSnapshot::capture(&layer, Some(&heightfield));

        let bytes = save_tile_bytes(&snapshot).unwrap();
        assert!(is_tile_bytes(&bytes));

        let loaded = load_tile_bytes(&bytes).unwrap();
        assert_eq!(loaded, snapshot);

        let (restored_layer, restored_heightfield) = loaded.restore().unwrap();
        assert!(restored_layer.is_occupied(GridCoord::new(-5, 17)));
        let heightfield = restored_heightfield.unwrap();
        let spans: Vec<_> = heightfield.spans(GridCoord::new(-32, 0)).collect();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].min, 0.0);
        assert_eq!(spans[1].max, 260.0);
    }

    #[test]
    fn test_tile_without_heightfield() {
        let snapshot = TileSnapshot::capture(&sample_layer(), None);
        let bytes = save_tile_bytes(&snapshot).unwrap();

        let (_, heightfield) = load_tile_bytes(&bytes).unwrap().restore().unwrap();
        assert!(heightfield.is_none());
    }

    #[test]
    fn test_file_roundtrip() {
        let layer = sample_layer();
        let snapshot = TileSnapshot::capture(&layer, Some(&sample_heightfield()));

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("tile.gwt");

        save_tile_file(&snapshot, &path).unwrap();
        assert!(is_tile_file(&path));

        let loaded = load_tile_file(&path).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_invalid_magic_bytes() {
        let result = load_tile_bytes(b"NOPE1234567890");
        assert!(matches!(result, Err(SurfaceError::InvalidMagic(_))));
    }

    #[test]
    fn test_invalid_version() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&TILE_MAGIC);
        buffer.extend_from_slice(&999u32.to_le_bytes());
        buffer.extend_from_slice(&0u32.to_le_bytes());
        buffer.extend_from_slice(&[0u8; 64]);

        let result = load_tile_bytes(&buffer);
        assert!(matches!(result, Err(SurfaceError::UnsupportedVersion(999))));
    }

    #[test]
    fn test_truncated_payload() {
        let snapshot = TileSnapshot::capture(&sample_layer(), None);
        let bytes = save_tile_bytes(&snapshot).unwrap();

        let result = load_tile_bytes(&bytes[..TILE_HEADER_SIZE + 10]);
        assert!(matches!(result, Err(SurfaceError::Deserialize(_))));
    }

    #[test]
    fn test_is_tile_bytes() {
        assert!(is_tile_bytes(b"GWT1anything"));
        assert!(!is_tile_bytes(b"GWT"));
        assert!(!is_tile_bytes(b"MJB1data"));
        assert!(!is_tile_bytes(b""));
    }

    #[test]
    fn test_restore_rejects_mismatched_lengths() {
        let mut snapshot = LayerSnapshot::capture(&sample_layer());
        snapshot.heights.pop();
        assert!(matches!(
            snapshot.restore(),
            Err(SurfaceError::CountMismatch { .. })
        ));

        let mut snapshot = LayerSnapshot::capture(&sample_layer());
        snapshot.words.pop();
        assert!(matches!(snapshot.restore(), Err(SurfaceError::Grid(_))));

        let mut snapshot = HeightfieldSnapshot::capture(&sample_heightfield());
        snapshot.span_bounds.pop();
        assert!(matches!(
            snapshot.restore(),
            Err(SurfaceError::CountMismatch { .. })
        ));
    }
}
