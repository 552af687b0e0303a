//! Span storage for heightfield columns.
//!
//! A [`Span`] is a vertical solid interval inside one grid cell. Spans are
//! stored in a [`SpanArena`] and linked into per-cell lists through indices,
//! so a heightfield owns exactly one allocation for all of its spans and
//! can recycle them without touching the global allocator.

/// Number of spans the arena grows by when it runs out of storage.
///
/// Matches the block size used for capacity reservation so that span
/// allocation touches the global allocator once per block, not per span.
pub const SPANS_PER_BLOCK: usize = 1 << 11;

/// Index of a span inside a [`SpanArena`].
///
/// `SpanIndex::NONE` terminates per-cell span lists and the arena's
/// internal free list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpanIndex(u32);

impl SpanIndex {
    /// Sentinel marking the end of a span list.
    pub const NONE: Self = Self(u32::MAX);

    /// Returns `true` if this index refers to a span.
    #[must_use]
    pub const fn is_some(self) -> bool {
        self.0 != u32::MAX
    }

    /// Returns `true` if this is the list-terminating sentinel.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    pub(crate) const fn from_usize(index: usize) -> Self {
        debug_assert!(index < u32::MAX as usize);
        Self(index as u32)
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A vertical solid interval inside one grid cell.
///
/// `min`/`max` are world-space heights with `min <= max`. Within a cell,
/// spans form a list ascending by `min`, pairwise separated by at least
/// the owning heightfield's merge tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    /// Bottom of the solid interval.
    pub min: f32,
    /// Top of the solid interval.
    pub max: f32,
    /// Next span in the cell's list (or free list while reclaimed).
    pub(crate) next: SpanIndex,
}

impl Span {
    /// The next span in this span's cell list, or [`SpanIndex::NONE`].
    #[must_use]
    pub const fn next(&self) -> SpanIndex {
        self.next
    }
}

/// Block-growing arena that owns every [`Span`] of one heightfield.
///
/// Freed spans are recycled through an intrusive free list threaded through
/// [`Span::next`], so `total_allocated` only ever grows until [`clear`].
/// The counters satisfy `live_spans() + free_spans() == total_allocated()`
/// at all times.
///
/// [`clear`]: SpanArena::clear
///
/// # Example
///
/// ```
/// use nav_surface::{SpanArena, SpanIndex};
///
/// let mut arena = SpanArena::new();
/// let a = arena.alloc(0.0, 1.0, SpanIndex::NONE);
/// let b = arena.alloc(2.0, 3.0, a);
/// assert_eq!(arena.get(b).next(), a);
/// assert_eq!(arena.live_spans(), 2);
///
/// arena.free(b);
/// assert_eq!(arena.live_spans(), 1);
/// assert_eq!(arena.free_spans(), 1);
/// assert_eq!(arena.total_allocated(), 2);
/// ```
#[derive(Debug)]
pub struct SpanArena {
    spans: Vec<Span>,
    free_head: SpanIndex,
    free_count: usize,
}

impl Default for SpanArena {
    fn default() -> Self {
        Self::new()
    }
}

impl SpanArena {
    /// Creates an empty arena. No storage is reserved until the first
    /// allocation.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            spans: Vec::new(),
            free_head: SpanIndex::NONE,
            free_count: 0,
        }
    }

    /// Allocates a span, preferring the free list over fresh storage.
    pub fn alloc(&mut self, min: f32, max: f32, next: SpanIndex) -> SpanIndex {
        debug_assert!(min <= max);
        if self.free_head.is_some() {
            let index = self.free_head;
            self.free_head = self.spans[index.index()].next;
            self.free_count -= 1;
            self.spans[index.index()] = Span { min, max, next };
            return index;
        }
        if self.spans.len() % SPANS_PER_BLOCK == 0 {
            self.spans.reserve(SPANS_PER_BLOCK);
        }
        let index = SpanIndex::from_usize(self.spans.len());
        self.spans.push(Span { min, max, next });
        index
    }

    /// Returns a single span to the free list.
    ///
    /// The index must come from this arena's [`alloc`](SpanArena::alloc)
    /// and must not already be on the free list.
    pub fn free(&mut self, index: SpanIndex) {
        debug_assert!(index.is_some());
        self.spans[index.index()].next = self.free_head;
        self.free_head = index;
        self.free_count += 1;
    }

    /// Returns a whole span list to the free list by splicing it in.
    ///
    /// Walks the list once to find its tail; a `NONE` head is a no-op.
    pub fn free_chain(&mut self, head: SpanIndex) {
        if head.is_none() {
            return;
        }
        let mut tail = head;
        let mut count = 1;
        while self.spans[tail.index()].next.is_some() {
            tail = self.spans[tail.index()].next;
            count += 1;
        }
        self.spans[tail.index()].next = self.free_head;
        self.free_head = head;
        self.free_count += count;
    }

    /// Drops every span, live or free, keeping the storage block.
    ///
    /// All previously returned indices become invalid.
    pub fn clear(&mut self) {
        self.spans.clear();
        self.free_head = SpanIndex::NONE;
        self.free_count = 0;
    }

    /// Borrows a live span.
    ///
    /// The index must refer to a live span of this arena; reading a freed
    /// index yields free-list bookkeeping, not span data.
    #[must_use]
    pub fn get(&self, index: SpanIndex) -> &Span {
        debug_assert!(index.is_some());
        &self.spans[index.index()]
    }

    /// Mutably borrows a live span.
    pub fn get_mut(&mut self, index: SpanIndex) -> &mut Span {
        debug_assert!(index.is_some());
        &mut self.spans[index.index()]
    }

    /// Total spans ever allocated from this arena since the last
    /// [`clear`](SpanArena::clear).
    #[must_use]
    pub const fn total_allocated(&self) -> usize {
        self.spans.len()
    }

    /// Spans currently on the free list.
    #[must_use]
    pub const fn free_spans(&self) -> usize {
        self.free_count
    }

    /// Spans currently in use by cell lists.
    #[must_use]
    pub const fn live_spans(&self) -> usize {
        self.spans.len() - self.free_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_sentinel() {
        assert!(SpanIndex::NONE.is_none());
        assert!(!SpanIndex::NONE.is_some());
        let arena_index = SpanIndex::from_usize(0);
        assert!(arena_index.is_some());
    }

    #[test]
    fn test_alloc_links_spans() {
        let mut arena = SpanArena::new();
        let first = arena.alloc(0.0, 1.0, SpanIndex::NONE);
        let second = arena.alloc(5.0, 6.0, first);

        assert_eq!(arena.get(second).min, 5.0);
        assert_eq!(arena.get(second).next(), first);
        assert_eq!(arena.get(first).next(), SpanIndex::NONE);
    }

    #[test]
    fn test_free_list_recycles() {
        let mut arena = SpanArena::new();
        let a = arena.alloc(0.0, 1.0, SpanIndex::NONE);
        let b = arena.alloc(2.0, 3.0, SpanIndex::NONE);
        assert_eq!(arena.total_allocated(), 2);

        arena.free(a);
        arena.free(b);
        assert_eq!(arena.live_spans(), 0);
        assert_eq!(arena.free_spans(), 2);

        // LIFO: the most recently freed index comes back first.
        let c = arena.alloc(7.0, 8.0, SpanIndex::NONE);
        assert_eq!(c, b);
        assert_eq!(arena.total_allocated(), 2);
        assert_eq!(arena.live_spans(), 1);
    }

    #[test]
    fn test_free_chain_splices_whole_list() {
        let mut arena = SpanArena::new();
        let tail = arena.alloc(4.0, 5.0, SpanIndex::NONE);
        let mid = arena.alloc(2.0, 3.0, tail);
        let head = arena.alloc(0.0, 1.0, mid);

        arena.free_chain(head);
        assert_eq!(arena.free_spans(), 3);
        assert_eq!(arena.live_spans(), 0);

        // The chain is consumed head-first on reallocation.
        assert_eq!(arena.alloc(0.0, 0.0, SpanIndex::NONE), head);
        assert_eq!(arena.alloc(0.0, 0.0, SpanIndex::NONE), mid);
        assert_eq!(arena.alloc(0.0, 0.0, SpanIndex::NONE), tail);
        assert_eq!(arena.total_allocated(), 3);
    }

    #[test]
    fn test_free_chain_none_is_noop() {
        let mut arena = SpanArena::new();
        arena.free_chain(SpanIndex::NONE);
        assert_eq!(arena.free_spans(), 0);
    }

    #[test]
    fn test_clear_invalidates_everything() {
        let mut arena = SpanArena::new();
        let a = arena.alloc(0.0, 1.0, SpanIndex::NONE);
        arena.free(a);
        arena.clear();

        assert_eq!(arena.total_allocated(), 0);
        assert_eq!(arena.free_spans(), 0);
        assert_eq!(arena.live_spans(), 0);

        let fresh = arena.alloc(1.0, 2.0, SpanIndex::NONE);
        assert_eq!(fresh.index(), 0);
    }

    #[test]
    fn test_conservation_property() {
        let mut arena = SpanArena::new();
        let mut live = Vec::new();
        for i in 0..100 {
            let h = i as f32;
            live.push(arena.alloc(h, h + 1.0, SpanIndex::NONE));
        }
        for index in live.drain(..40) {
            arena.free(index);
        }
        assert_eq!(
            arena.live_spans() + arena.free_spans(),
            arena.total_allocated()
        );
        assert_eq!(arena.total_allocated(), 100);
        assert_eq!(arena.free_spans(), 40);
    }
}
