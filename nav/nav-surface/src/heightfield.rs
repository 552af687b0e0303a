//! Column heightfield built from merged vertical spans.

use gw_grid::{GridCoord, GridRect};

use crate::span::{Span, SpanArena, SpanIndex};

/// Default span merge tolerance for newly built heightfields.
pub const DEFAULT_MERGE_TOLERANCE: f32 = 1e-8;

/// A rectangular field of span columns.
///
/// Each cell of `rect` holds a list of [`Span`]s ascending by `min`,
/// pairwise separated by at least `merge_tolerance`. Inserting a span that
/// reaches an existing one (within the tolerance) replaces everything it
/// touches with a single merged span, so the per-cell invariant holds after
/// every operation.
///
/// All spans live in one [`SpanArena`] owned by the heightfield; cloning
/// deep-copies them through the clone's own arena, moving transfers the
/// arena as a whole.
///
/// # Example
///
/// ```
/// use gw_grid::{GridCoord, GridRect};
/// use nav_surface::Heightfield;
///
/// let rect = GridRect::from_origin_size(GridCoord::new(0, 0), 4, 4);
/// let mut field = Heightfield::new(rect, 100.0, 0.0);
///
/// let cell = GridCoord::new(1, 2);
/// field.insert_span(cell, 0.0, 5.0);
/// field.insert_span(cell, 4.0, 9.0);
///
/// let spans: Vec<_> = field.spans(cell).map(|s| (s.min, s.max)).collect();
/// assert_eq!(spans, vec![(0.0, 9.0)]);
/// ```
#[derive(Debug)]
pub struct Heightfield {
    rect: GridRect,
    cell_size: f32,
    merge_tolerance: f32,
    cells: Vec<SpanIndex>,
    arena: SpanArena,
}

impl Heightfield {
    /// Creates an empty heightfield covering `rect`.
    ///
    /// `cell_size` is the world-space edge length of one cell and must be
    /// positive.
    #[must_use]
    pub fn new(rect: GridRect, cell_size: f32, merge_tolerance: f32) -> Self {
        debug_assert!(cell_size > 0.0);
        #[allow(clippy::cast_sign_loss)]
        let cell_count = rect.area() as usize;
        Self {
            rect,
            cell_size,
            merge_tolerance,
            cells: vec![SpanIndex::NONE; cell_count],
            arena: SpanArena::new(),
        }
    }

    /// The cell rectangle this heightfield covers.
    #[must_use]
    pub const fn rect(&self) -> GridRect {
        self.rect
    }

    /// World-space edge length of one cell.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Vertical distance within which neighboring spans merge.
    #[must_use]
    pub const fn merge_tolerance(&self) -> f32 {
        self.merge_tolerance
    }

    /// Inserts the solid interval `[min, max]` into `coord`'s column,
    /// merging with every existing span it reaches.
    ///
    /// The merge boundary is asymmetric: a gap of exactly the tolerance
    /// below an existing span merges, the same gap above it stays separate.
    /// Coordinates outside [`rect`](Heightfield::rect) are ignored.
    pub fn insert_span(&mut self, coord: GridCoord, min: f32, max: f32) {
        debug_assert!(min <= max);
        if !self.rect.contains(coord) {
            return;
        }
        let cell = self.cell_index(coord);
        let tol = self.merge_tolerance;
        let mut new_min = min;
        let mut new_max = max;

        let mut previous = SpanIndex::NONE;
        let mut current = self.cells[cell];

        // Walk past spans entirely below the new one.
        while current.is_some() && self.arena.get(current).max + tol <= new_min {
            previous = current;
            current = self.arena.get(current).next;
        }

        if current.is_some() && new_max + tol >= self.arena.get(current).min {
            // Absorb every span the new one reaches. The first absorbed
            // span carries the lowest min, the last the highest max.
            new_min = new_min.min(self.arena.get(current).min);
            let mut last_merged = current;
            current = self.arena.get(current).next;
            while current.is_some() && new_max + tol >= self.arena.get(current).min {
                self.arena.free(last_merged);
                last_merged = current;
                current = self.arena.get(current).next;
            }
            new_max = new_max.max(self.arena.get(last_merged).max);
            self.arena.free(last_merged);
        }
        // Everything from `current` on is entirely above the merged span.

        let new_span = self.arena.alloc(new_min, new_max, current);
        if previous.is_some() {
            self.arena.get_mut(previous).next = new_span;
        } else {
            self.cells[cell] = new_span;
        }
    }

    /// Iterates `coord`'s spans in ascending order.
    ///
    /// Empty for coordinates outside [`rect`](Heightfield::rect).
    #[must_use]
    pub fn spans(&self, coord: GridCoord) -> SpanIter<'_> {
        let head = if self.rect.contains(coord) {
            self.cells[self.cell_index(coord)]
        } else {
            SpanIndex::NONE
        };
        SpanIter {
            arena: &self.arena,
            current: head,
        }
    }

    /// Drops every span in every cell, recycling the arena wholesale.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.cells.fill(SpanIndex::NONE);
    }

    /// Drops the spans of every cell inside `rect`, leaving the rest of
    /// the field untouched.
    ///
    /// Freed spans return to the arena's free list for reuse.
    pub fn clear_rect(&mut self, rect: GridRect) {
        let clipped = self.rect.intersection(rect);
        if clipped.is_empty() {
            return;
        }
        for coord in clipped.cells() {
            let cell = self.cell_index(coord);
            let head = self.cells[cell];
            self.arena.free_chain(head);
            self.cells[cell] = SpanIndex::NONE;
        }
    }

    /// Rebuilds the field compacted, keeping at most the first
    /// `max_spans_per_cell` spans of each (ascending) column.
    ///
    /// `0` keeps every span and only compacts the arena. The first spans of
    /// a column are its lowest; callers that want a particular surface
    /// select it themselves before rebuilding.
    pub fn shrink_to(&mut self, max_spans_per_cell: usize) {
        if max_spans_per_cell == 0 {
            *self = self.clone();
            return;
        }
        let mut compact = Self::new(self.rect, self.cell_size, self.merge_tolerance);
        for (cell, &head) in self.cells.iter().enumerate() {
            if head.is_none() {
                continue;
            }
            let span = self.arena.get(head);
            let mut dst = compact.arena.alloc(span.min, span.max, SpanIndex::NONE);
            compact.cells[cell] = dst;

            let mut src = span.next;
            let mut kept = 1;
            while kept < max_spans_per_cell && src.is_some() {
                let span = self.arena.get(src);
                let appended = compact.arena.alloc(span.min, span.max, SpanIndex::NONE);
                compact.arena.get_mut(dst).next = appended;
                dst = appended;
                src = span.next;
                kept += 1;
            }
        }
        *self = compact;
    }

    /// Spans currently linked into cell lists.
    #[must_use]
    pub const fn live_spans(&self) -> usize {
        self.arena.live_spans()
    }

    /// Spans waiting on the arena's free list.
    #[must_use]
    pub const fn free_spans(&self) -> usize {
        self.arena.free_spans()
    }

    /// Total spans the arena has handed out since the last full clear.
    #[must_use]
    pub const fn total_allocated_spans(&self) -> usize {
        self.arena.total_allocated()
    }

    /// Appends deep copies of `other`'s span lists, cell by cell.
    ///
    /// Both fields must cover rects of identical area.
    fn copy_spans(&mut self, other: &Self) {
        debug_assert_eq!(self.cells.len(), other.cells.len());
        for (cell, &head) in other.cells.iter().enumerate() {
            if head.is_none() {
                continue;
            }
            let span = other.arena.get(head);
            let mut dst = self.arena.alloc(span.min, span.max, SpanIndex::NONE);
            self.cells[cell] = dst;

            let mut src = span.next;
            while src.is_some() {
                let span = other.arena.get(src);
                let appended = self.arena.alloc(span.min, span.max, SpanIndex::NONE);
                self.arena.get_mut(dst).next = appended;
                dst = appended;
                src = span.next;
            }
        }
    }

    #[allow(clippy::cast_sign_loss)]
    fn cell_index(&self, coord: GridCoord) -> usize {
        debug_assert!(self.rect.contains(coord));
        let dx = (coord.x - self.rect.min.x) as usize;
        let dy = (coord.y - self.rect.min.y) as usize;
        dx * self.rect.height() as usize + dy
    }
}

impl Clone for Heightfield {
    /// Deep copy through the clone's own arena; the result is compact
    /// regardless of how fragmented `self`'s arena is.
    fn clone(&self) -> Self {
        let mut copy = Self::new(self.rect, self.cell_size, self.merge_tolerance);
        copy.copy_spans(self);
        copy
    }
}

/// Iterator over one cell's spans, ascending by `min`.
#[derive(Debug, Clone)]
pub struct SpanIter<'a> {
    arena: &'a SpanArena,
    current: SpanIndex,
}

impl Iterator for SpanIter<'_> {
    type Item = Span;

    fn next(&mut self) -> Option<Span> {
        if self.current.is_none() {
            return None;
        }
        let span = *self.arena.get(self.current);
        self.current = span.next;
        Some(span)
    }
}
