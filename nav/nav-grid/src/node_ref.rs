//! Stable cell handles.
//!
//! Queries hand out one opaque handle per cell so callers can keep a
//! result without borrowing any grid state. A handle stays meaningful
//! across tile republishes; whether the cell it names is still walkable
//! is a separate question answered by the grid.

use gw_grid::GridCoord;

/// Opaque handle to one grid cell.
///
/// Both signed coordinate axes are biased by `i32::MIN` and packed into
/// one `u64`, X in the high word and Y in the low word. The all-zero
/// handle is reserved as [`NodeRef::INVALID`]; it corresponds to the
/// coordinate (`i32::MIN`, `i32::MIN`), which queries never produce.
///
/// # Example
///
/// ```
/// use gw_grid::GridCoord;
/// use nav_grid::NodeRef;
///
/// let node = NodeRef::from_coord(GridCoord::new(-7, 12));
/// assert!(node.is_valid());
/// assert_eq!(node.coord(), GridCoord::new(-7, 12));
/// assert!(!NodeRef::INVALID.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(u64);

impl NodeRef {
    /// Handle that names no cell.
    pub const INVALID: Self = Self(0);

    /// Packs a cell coordinate into a handle.
    #[must_use]
    pub fn from_coord(coord: GridCoord) -> Self {
        const BIAS: i64 = i32::MIN as i64;
        #[allow(clippy::cast_sign_loss)]
        let x = (i64::from(coord.x) - BIAS) as u64;
        #[allow(clippy::cast_sign_loss)]
        let y = (i64::from(coord.y) - BIAS) as u64;
        Self((x << 32) | y)
    }

    /// Unpacks the handle into its cell coordinate.
    #[must_use]
    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    pub fn coord(self) -> GridCoord {
        const BIAS: i64 = i32::MIN as i64;
        let x = ((self.0 >> 32) as i64 + BIAS) as i32;
        let y = ((self.0 & 0xFFFF_FFFF) as i64 + BIAS) as i32;
        GridCoord::new(x, y)
    }

    /// True unless this is [`NodeRef::INVALID`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// Returns the raw packed value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}
