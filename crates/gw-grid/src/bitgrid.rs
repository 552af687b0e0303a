//! Cache-line tiled bit grid.
//!
//! A [`BitGrid`] stores one bit per cell, grouped into 64-byte tiles of
//! 16 `u32` words. A tile covers 16 cells along X (one word per column)
//! and 32 cells along Y (one bit per row), so a full tile fits in a single
//! cache line of most modern CPUs.
//!
//! Bulk operations ([`BitGrid::fill_rect`], [`BitGrid::any_in_rect`])
//! decompose a rect into partially covered boundary tiles, handled with
//! word-range and bit-mask arithmetic, and fully covered interior tiles,
//! handled as whole-tile fills and compares.

// Coordinates are asserted non-negative and within the padded dimensions
// before any narrowing cast.
#![allow(clippy::cast_sign_loss, clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use crate::{GridCoord, GridError, GridRect};

/// Cells per bit tile along X (one `u32` word per column).
pub const BIT_TILE_WIDTH: u32 = 16;

/// Cells per bit tile along Y (one bit per row).
pub const BIT_TILE_HEIGHT: u32 = 32;

const WORDS_PER_TILE: usize = BIT_TILE_WIDTH as usize;
const FULL_WORD: u32 = u32::MAX;

/// One 64-byte tile: 16 x 32 cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(align(64))]
struct BitTile {
    words: [u32; WORDS_PER_TILE],
}

impl BitTile {
    const fn filled(value: bool) -> Self {
        Self {
            words: [if value { FULL_WORD } else { 0 }; WORDS_PER_TILE],
        }
    }

    /// Applies `mask` to the words in `[from_word, to_word)`.
    fn fill_words(&mut self, value: bool, from_word: usize, to_word: usize, mask: u32) {
        if value {
            for word in &mut self.words[from_word..to_word] {
                *word |= mask;
            }
        } else {
            for word in &mut self.words[from_word..to_word] {
                *word &= !mask;
            }
        }
    }

    /// Returns `true` when any masked bit in `[from_word, to_word)`
    /// equals `value`.
    fn any_words(&self, value: bool, from_word: usize, to_word: usize, mask: u32) -> bool {
        let miss = if value { 0 } else { FULL_WORD };
        self.words[from_word..to_word]
            .iter()
            .any(|&word| (word & mask) != (miss & mask))
    }
}

/// A dense 2D bitset with cache-line tiling.
///
/// Cells are addressed in the grid's own space: `(0, 0)` up to
/// `(width, height)` exclusive. Callers working in a larger coordinate
/// system translate before indexing. Dimensions are rounded up to whole
/// tiles at construction, so `width()` and `height()` report the padded
/// sizes.
///
/// Addressing a cell or rect outside the padded dimensions is a
/// programmer error, checked by debug assertions.
///
/// # Example
///
/// ```
/// use gw_grid::{BitGrid, GridCoord, GridRect};
///
/// let mut grid = BitGrid::new(40, 40, false);
/// assert_eq!(grid.width(), 48); // padded to tile multiples
/// assert_eq!(grid.height(), 64);
///
/// let rect = GridRect::new(GridCoord::new(3, 5), GridCoord::new(20, 37));
/// grid.fill_rect(rect, true);
/// assert!(grid.get(GridCoord::new(3, 5)));
/// assert!(!grid.get(GridCoord::new(2, 5)));
/// assert!(grid.any_in_rect(rect, true));
/// assert!(!grid.any_in_rect(rect, false));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitGrid {
    tiles: Vec<BitTile>,
    width: u32,
    height: u32,
}

impl BitGrid {
    /// Creates a grid of at least `width` x `height` cells, every cell set
    /// to `value`.
    ///
    /// Dimensions are rounded up to multiples of [`BIT_TILE_WIDTH`] and
    /// [`BIT_TILE_HEIGHT`].
    #[must_use]
    pub fn new(width: u32, height: u32, value: bool) -> Self {
        let mut grid = Self {
            tiles: Vec::new(),
            width: 0,
            height: 0,
        };
        grid.resize(width, height, value);
        grid
    }

    /// Creates a grid, validating that the padded dimensions are
    /// representable.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidDimensions`] when a padded dimension
    /// would not fit signed 32-bit cell coordinates.
    pub fn try_new(width: u32, height: u32, value: bool) -> Result<Self, GridError> {
        if Self::padded(width, BIT_TILE_WIDTH) > i32::MAX as u32
            || Self::padded(height, BIT_TILE_HEIGHT) > i32::MAX as u32
        {
            return Err(GridError::InvalidDimensions { width, height });
        }
        Ok(Self::new(width, height, value))
    }

    /// Resizes the grid, discarding previous contents and filling every
    /// cell with `value`.
    pub fn resize(&mut self, width: u32, height: u32, value: bool) {
        self.width = Self::padded(width, BIT_TILE_WIDTH);
        self.height = Self::padded(height, BIT_TILE_HEIGHT);
        debug_assert!(self.width <= i32::MAX as u32 && self.height <= i32::MAX as u32);
        let tile_count = (self.width / BIT_TILE_WIDTH) as usize * (self.height / BIT_TILE_HEIGHT) as usize;
        self.tiles.clear();
        self.tiles.resize(tile_count, BitTile::filled(value));
    }

    /// Sets every cell to `value`.
    pub fn fill_all(&mut self, value: bool) {
        self.tiles.fill(BitTile::filled(value));
    }

    /// Padded width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Padded height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells, including padding.
    #[must_use]
    pub fn cell_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Reads one cell.
    #[must_use]
    pub fn get(&self, coord: GridCoord) -> bool {
        self.check_coord(coord);
        let (x, y) = (coord.x as u32, coord.y as u32);
        let tile = &self.tiles[self.tile_index(x / BIT_TILE_WIDTH, y / BIT_TILE_HEIGHT)];
        tile.words[(x % BIT_TILE_WIDTH) as usize] & (1 << (y % BIT_TILE_HEIGHT)) != 0
    }

    /// Writes one cell.
    pub fn set(&mut self, coord: GridCoord, value: bool) {
        self.check_coord(coord);
        let (x, y) = (coord.x as u32, coord.y as u32);
        let index = self.tile_index(x / BIT_TILE_WIDTH, y / BIT_TILE_HEIGHT);
        let word = &mut self.tiles[index].words[(x % BIT_TILE_WIDTH) as usize];
        let bit = 1 << (y % BIT_TILE_HEIGHT);
        if value {
            *word |= bit;
        } else {
            *word &= !bit;
        }
    }

    /// Sets every cell inside `rect` to `value`.
    ///
    /// An empty rect is a no-op. The rect must lie within the padded
    /// dimensions.
    pub fn fill_rect(&mut self, rect: GridRect, value: bool) {
        if rect.is_empty() {
            return;
        }
        self.check_rect(rect);
        let bounds = RectTiling::of(rect);
        let stride = (self.width / BIT_TILE_WIDTH) as usize;

        if bounds.tx0 == bounds.tx1 {
            if bounds.ty0 == bounds.ty1 {
                let index = self.tile_index(bounds.tx0, bounds.ty0);
                self.tiles[index].fill_words(
                    value,
                    bounds.start_word,
                    bounds.end_word,
                    bounds.start_mask & bounds.end_mask,
                );
            } else {
                let first = self.tile_index(bounds.tx0, bounds.ty0);
                let last = self.tile_index(bounds.tx0, bounds.ty1);
                self.tiles[first].fill_words(value, bounds.start_word, bounds.end_word, bounds.start_mask);
                for index in ((first + stride)..last).step_by(stride) {
                    self.tiles[index].fill_words(value, bounds.start_word, bounds.end_word, FULL_WORD);
                }
                self.tiles[last].fill_words(value, bounds.start_word, bounds.end_word, bounds.end_mask);
            }
        } else if bounds.ty0 == bounds.ty1 {
            let first = self.tile_index(bounds.tx0, bounds.ty0);
            let last = self.tile_index(bounds.tx1, bounds.ty0);
            self.fill_run(first, last, value, bounds.start_mask & bounds.end_mask, &bounds);
        } else {
            // First tile row.
            let first = self.tile_index(bounds.tx0, bounds.ty0);
            let last = self.tile_index(bounds.tx1, bounds.ty0);
            self.fill_run(first, last, value, bounds.start_mask, &bounds);

            // Interior tile rows: boundary tiles by words, fully covered
            // tiles as whole-tile fills.
            let inner = (bounds.tx1 - bounds.tx0 - 1) as usize;
            let uniform = BitTile::filled(value);
            let row_begin = self.tile_index(bounds.tx0, bounds.ty0 + 1);
            let row_end = self.tile_index(bounds.tx0, bounds.ty1);
            for row_first in (row_begin..row_end).step_by(stride) {
                self.tiles[row_first].fill_words(value, bounds.start_word, WORDS_PER_TILE, FULL_WORD);
                self.tiles[row_first + 1..row_first + 1 + inner].fill(uniform);
                self.tiles[row_first + 1 + inner].fill_words(value, 0, bounds.end_word, FULL_WORD);
            }

            // Last tile row.
            let first = self.tile_index(bounds.tx0, bounds.ty1);
            let last = self.tile_index(bounds.tx1, bounds.ty1);
            self.fill_run(first, last, value, bounds.end_mask, &bounds);
        }
    }

    /// Returns `true` when any cell inside `rect` equals `value`.
    ///
    /// An empty rect yields `false`. The rect must lie within the padded
    /// dimensions.
    #[must_use]
    pub fn any_in_rect(&self, rect: GridRect, value: bool) -> bool {
        if rect.is_empty() {
            return false;
        }
        self.check_rect(rect);
        let bounds = RectTiling::of(rect);
        let stride = (self.width / BIT_TILE_WIDTH) as usize;

        if bounds.tx0 == bounds.tx1 {
            if bounds.ty0 == bounds.ty1 {
                let index = self.tile_index(bounds.tx0, bounds.ty0);
                return self.tiles[index].any_words(
                    value,
                    bounds.start_word,
                    bounds.end_word,
                    bounds.start_mask & bounds.end_mask,
                );
            }
            let first = self.tile_index(bounds.tx0, bounds.ty0);
            let last = self.tile_index(bounds.tx0, bounds.ty1);
            if self.tiles[first].any_words(value, bounds.start_word, bounds.end_word, bounds.start_mask) {
                return true;
            }
            for index in ((first + stride)..last).step_by(stride) {
                if self.tiles[index].any_words(value, bounds.start_word, bounds.end_word, FULL_WORD) {
                    return true;
                }
            }
            return self.tiles[last].any_words(value, bounds.start_word, bounds.end_word, bounds.end_mask);
        }

        if bounds.ty0 == bounds.ty1 {
            let first = self.tile_index(bounds.tx0, bounds.ty0);
            let last = self.tile_index(bounds.tx1, bounds.ty0);
            return self.any_run(first, last, value, bounds.start_mask & bounds.end_mask, &bounds);
        }

        // First tile row.
        let first = self.tile_index(bounds.tx0, bounds.ty0);
        let last = self.tile_index(bounds.tx1, bounds.ty0);
        if self.any_run(first, last, value, bounds.start_mask, &bounds) {
            return true;
        }

        // Interior tile rows: fully covered tiles miss only when they are
        // uniformly the opposite value.
        let inner = (bounds.tx1 - bounds.tx0 - 1) as usize;
        let uniform_miss = BitTile::filled(!value);
        let row_begin = self.tile_index(bounds.tx0, bounds.ty0 + 1);
        let row_end = self.tile_index(bounds.tx0, bounds.ty1);
        for row_first in (row_begin..row_end).step_by(stride) {
            if self.tiles[row_first].any_words(value, bounds.start_word, WORDS_PER_TILE, FULL_WORD) {
                return true;
            }
            if self.tiles[row_first + 1..row_first + 1 + inner]
                .iter()
                .any(|tile| *tile != uniform_miss)
            {
                return true;
            }
            if self.tiles[row_first + 1 + inner].any_words(value, 0, bounds.end_word, FULL_WORD) {
                return true;
            }
        }

        // Last tile row.
        let first = self.tile_index(bounds.tx0, bounds.ty1);
        let last = self.tile_index(bounds.tx1, bounds.ty1);
        self.any_run(first, last, value, bounds.end_mask, &bounds)
    }

    /// Number of `u32` words backing the grid.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.tiles.len() * WORDS_PER_TILE
    }

    /// Iterates the backing words in tile order.
    pub fn words(&self) -> impl Iterator<Item = u32> + '_ {
        self.tiles.iter().flat_map(|tile| tile.words.iter().copied())
    }

    /// Rebuilds a grid from dimensions and backing words, as produced by
    /// [`words`](Self::words).
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidDimensions`] for unrepresentable
    /// dimensions and [`GridError::WordCountMismatch`] when the word
    /// buffer does not match them.
    pub fn from_words(width: u32, height: u32, words: &[u32]) -> Result<Self, GridError> {
        let mut grid = Self::try_new(width, height, false)?;
        if words.len() != grid.word_count() {
            return Err(GridError::WordCountMismatch {
                expected: grid.word_count(),
                got: words.len(),
            });
        }
        for (tile, chunk) in grid.tiles.iter_mut().zip(words.chunks_exact(WORDS_PER_TILE)) {
            tile.words.copy_from_slice(chunk);
        }
        Ok(grid)
    }

    fn padded(size: u32, multiple: u32) -> u32 {
        size.div_ceil(multiple) * multiple
    }

    fn tile_index(&self, tile_x: u32, tile_y: u32) -> usize {
        (tile_y * (self.width / BIT_TILE_WIDTH) + tile_x) as usize
    }

    /// Fills `[first, last]` along one tile row; `first` must differ from
    /// `last`.
    fn fill_run(&mut self, first: usize, last: usize, value: bool, mask: u32, bounds: &RectTiling) {
        self.tiles[first].fill_words(value, bounds.start_word, WORDS_PER_TILE, mask);
        for tile in &mut self.tiles[first + 1..last] {
            tile.fill_words(value, 0, WORDS_PER_TILE, mask);
        }
        self.tiles[last].fill_words(value, 0, bounds.end_word, mask);
    }

    /// Tests `[first, last]` along one tile row; `first` must differ from
    /// `last`.
    fn any_run(&self, first: usize, last: usize, value: bool, mask: u32, bounds: &RectTiling) -> bool {
        if self.tiles[first].any_words(value, bounds.start_word, WORDS_PER_TILE, mask) {
            return true;
        }
        for tile in &self.tiles[first + 1..last] {
            if tile.any_words(value, 0, WORDS_PER_TILE, mask) {
                return true;
            }
        }
        self.tiles[last].any_words(value, 0, bounds.end_word, mask)
    }

    fn check_coord(&self, coord: GridCoord) {
        debug_assert!(
            coord.x >= 0
                && coord.y >= 0
                && (coord.x as u32) < self.width
                && (coord.y as u32) < self.height,
            "cell {coord:?} outside padded grid {}x{}",
            self.width,
            self.height,
        );
    }

    fn check_rect(&self, rect: GridRect) {
        debug_assert!(
            rect.min.x >= 0
                && rect.min.y >= 0
                && rect.max.x as i64 <= i64::from(self.width)
                && rect.max.y as i64 <= i64::from(self.height),
            "rect {rect:?} outside padded grid {}x{}",
            self.width,
            self.height,
        );
    }
}

/// Tile-space decomposition of a cell rect.
struct RectTiling {
    /// Inclusive tile column range.
    tx0: u32,
    tx1: u32,
    /// Inclusive tile row range.
    ty0: u32,
    ty1: u32,
    /// Word range covered in boundary tiles along X.
    start_word: usize,
    end_word: usize,
    /// Bit masks covered in boundary tiles along Y.
    start_mask: u32,
    end_mask: u32,
}

impl RectTiling {
    fn of(rect: GridRect) -> Self {
        let (min_x, min_y) = (rect.min.x as u32, rect.min.y as u32);
        let (max_x, max_y) = (rect.max.x as u32, rect.max.y as u32);
        Self {
            tx0: min_x / BIT_TILE_WIDTH,
            tx1: (max_x - 1) / BIT_TILE_WIDTH,
            ty0: min_y / BIT_TILE_HEIGHT,
            ty1: (max_y - 1) / BIT_TILE_HEIGHT,
            start_word: (min_x % BIT_TILE_WIDTH) as usize,
            end_word: ((max_x - 1) % BIT_TILE_WIDTH) as usize + 1,
            start_mask: FULL_WORD << (min_y % BIT_TILE_HEIGHT),
            end_mask: FULL_WORD >> ((BIT_TILE_HEIGHT - max_y % BIT_TILE_HEIGHT) % BIT_TILE_HEIGHT),
        }
    }
}
