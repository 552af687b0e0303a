//! A* search over a tile-resolved grid.
//!
//! The search is 4-connected and runs over an abstractly unbounded grid:
//! cells resolve lazily through a [`TileSource`], and a cell whose tile
//! does not exist is impassable rather than free. All search state (node
//! pool, open heap, tile cache) is local to a single call, so one
//! pathfinder may serve concurrent searches over a shared source.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use gw_grid::{CellDirection, GridCoord};
use nav_surface::TileSource;

use crate::cache::LayerCache;
use crate::filter::SearchFilter;

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchResult {
    /// The goal was reached; the cells run from start to goal.
    Found,
    /// The goal was not reached; the cells run from the start to the
    /// expanded node closest to the goal.
    Partial,
    /// The goal was not reached and partial solutions were disabled.
    NoPath,
    /// The start cell is occupied or has no tile; nothing was searched.
    InvalidStart,
}

/// The product of one search.
///
/// A failed search is an outcome, not an error: callers branch on
/// [`SearchOutcome::result`] and read the statistics either way.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// How the search ended.
    pub result: SearchResult,
    /// The path, start cell first. Empty unless `result` is
    /// [`SearchResult::Found`] or [`SearchResult::Partial`].
    pub cells: Vec<GridCoord>,
    /// Number of search nodes allocated before termination.
    pub visited: usize,
}

/// One allocated search node.
#[derive(Debug, Clone, Copy)]
struct SearchNode {
    coord: GridCoord,
    parent: Option<usize>,
    /// Exact step count from the start.
    cost: f64,
    /// `cost` plus the scaled heuristic to the goal.
    estimate: f64,
    closed: bool,
}

/// Open list entry; ordered so the cheapest estimate pops first.
///
/// Improving a node pushes a fresh entry instead of re-keying the heap;
/// stale entries are recognized at pop time and skipped.
#[derive(Debug, Clone, Copy, PartialEq)]
struct OpenEntry {
    estimate: f64,
    index: usize,
}

impl Eq for OpenEntry {}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; flip the operands for cheapest-first.
        // Equal estimates pop in allocation order.
        other
            .estimate
            .total_cmp(&self.estimate)
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* pathfinder over a tile source.
///
/// Every cardinal step costs exactly 1; diagonals are never generated.
/// The heuristic is the axis-weighted Manhattan distance scaled by the
/// filter's global factor, which defaults slightly above 1 and is
/// therefore inadmissible.
///
/// The search terminates when the goal pops from the open list, the open
/// list empties, the node budget fills, or the cheapest open estimate
/// exceeds the cost limit. With partial solutions enabled, the last
/// three cases return the path to the expanded node with the smallest
/// remaining heuristic instead of failing outright.
pub struct GridAStar<'a, S: TileSource + ?Sized> {
    /// Tile-resolved occupancy the search walks over.
    source: &'a S,
    /// Per-call tuning parameters.
    filter: SearchFilter,
}

impl<'a, S: TileSource + ?Sized> GridAStar<'a, S> {
    /// Creates a pathfinder over the given source.
    #[must_use]
    pub const fn new(source: &'a S, filter: SearchFilter) -> Self {
        Self { source, filter }
    }

    /// Returns the search filter.
    #[must_use]
    pub const fn filter(&self) -> &SearchFilter {
        &self.filter
    }

    /// Scaled heuristic distance from `from` to `goal`.
    fn heuristic(&self, from: GridCoord, goal: GridCoord) -> f64 {
        let scale = self.filter.axiswise_scale();
        let dx = f64::from(from.x.abs_diff(goal.x));
        let dy = f64::from(from.y.abs_diff(goal.y));
        (dx * scale.x + dy * scale.y) * self.filter.heuristic_scale()
    }

    /// Searches for a path from `start` to `goal`.
    ///
    /// The returned cells include the start. `start == goal` succeeds
    /// without searching. A blocked or uncovered start yields
    /// [`SearchResult::InvalidStart`]; an unreachable goal yields
    /// [`SearchResult::NoPath`] or, with partial solutions enabled, the
    /// best-effort path toward it.
    #[must_use]
    pub fn find_path(&self, start: GridCoord, goal: GridCoord) -> SearchOutcome {
        let mut cache = LayerCache::new();

        if !cache.is_walkable(self.source, start) {
            return SearchOutcome {
                result: SearchResult::InvalidStart,
                cells: Vec::new(),
                visited: 0,
            };
        }
        if start == goal {
            return SearchOutcome {
                result: SearchResult::Found,
                cells: vec![start],
                visited: 1,
            };
        }

        let mut pool = Vec::new();
        let mut indices = HashMap::new();
        let mut open = BinaryHeap::new();

        let start_estimate = self.heuristic(start, goal);
        pool.push(SearchNode {
            coord: start,
            parent: None,
            cost: 0.0,
            estimate: start_estimate,
            closed: false,
        });
        indices.insert(start, 0);
        open.push(OpenEntry {
            estimate: start_estimate,
            index: 0,
        });

        // Fallback target for partial solutions: the expanded node with
        // the smallest remaining heuristic, earliest expansion winning
        // ties.
        let mut best_index = 0;
        let mut best_remaining = f64::INFINITY;
        let mut reached_goal = false;

        'search: while let Some(entry) = open.pop() {
            let node = pool[entry.index];
            if node.closed || entry.estimate > node.estimate {
                continue;
            }
            pool[entry.index].closed = true;

            if node.coord == goal {
                reached_goal = true;
                best_index = entry.index;
                break;
            }
            if node.estimate > self.filter.cost_limit() {
                break;
            }

            let remaining = node.estimate - node.cost;
            if remaining < best_remaining {
                best_remaining = remaining;
                best_index = entry.index;
            }

            for direction in CellDirection::ALL {
                let next = direction.step(node.coord);
                if !cache.is_walkable(self.source, next) {
                    continue;
                }
                let next_cost = node.cost + 1.0;
                let next_estimate = next_cost + self.heuristic(next, goal);

                if let Some(&existing) = indices.get(&next) {
                    let known = &mut pool[existing];
                    // Closed nodes are never reopened.
                    if known.closed || next_estimate >= known.estimate {
                        continue;
                    }
                    known.parent = Some(entry.index);
                    known.cost = next_cost;
                    known.estimate = next_estimate;
                    open.push(OpenEntry {
                        estimate: next_estimate,
                        index: existing,
                    });
                } else {
                    if pool.len() >= self.filter.node_budget() {
                        break 'search;
                    }
                    let index = pool.len();
                    pool.push(SearchNode {
                        coord: next,
                        parent: Some(entry.index),
                        cost: next_cost,
                        estimate: next_estimate,
                        closed: false,
                    });
                    indices.insert(next, index);
                    open.push(OpenEntry {
                        estimate: next_estimate,
                        index,
                    });
                }
            }
        }

        let visited = pool.len();
        if reached_goal {
            return SearchOutcome {
                result: SearchResult::Found,
                cells: reconstruct(&pool, best_index),
                visited,
            };
        }
        if self.filter.allow_partial() {
            return SearchOutcome {
                result: SearchResult::Partial,
                cells: reconstruct(&pool, best_index),
                visited,
            };
        }
        SearchOutcome {
            result: SearchResult::NoPath,
            cells: Vec::new(),
            visited,
        }
    }
}

/// Walks the parent chain from `index` back to the start.
fn reconstruct(pool: &[SearchNode], index: usize) -> Vec<GridCoord> {
    let mut cells = Vec::new();
    let mut cursor = Some(index);
    while let Some(i) = cursor {
        cells.push(pool[i].coord);
        cursor = pool[i].parent;
    }
    cells.reverse();
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use gw_grid::{GridRect, TileCoord, TileExtent};
    use nav_surface::TileLayer;

    /// Map-backed tile source with mutable occupancy.
    struct TestGrid {
        extent: TileExtent,
        layers: HashMap<TileCoord, Arc<TileLayer>>,
    }

    impl TestGrid {
        /// All tiles in `tiles_x` x `tiles_y` open, flat at height zero.
        fn open(tiles_x: i32, tiles_y: i32) -> Self {
            let extent = TileExtent::new(16, 32);
            let mut layers = HashMap::new();
            for ty in 0..tiles_y {
                for tx in 0..tiles_x {
                    let tile = TileCoord::new(tx, ty);
                    let layer = TileLayer::new(tile.cell_rect(extent), 1.0, false, 0.0);
                    layers.insert(tile, Arc::new(layer));
                }
            }
            Self { extent, layers }
        }

        fn block(&mut self, x: i32, y: i32) {
            self.block_rect(GridRect::from_origin_size(GridCoord::new(x, y), 1, 1));
        }

        fn block_rect(&mut self, rect: GridRect) {
            for (tile, layer) in &mut self.layers {
                let overlap = rect.intersection(tile.cell_rect(self.extent));
                if !overlap.is_empty() {
                    Arc::make_mut(layer).set_cells_in_rect(overlap, true);
                }
            }
        }
    }

    impl TileSource for TestGrid {
        fn tile_extent(&self) -> TileExtent {
            self.extent
        }

        fn layer(&self, tile: TileCoord) -> Option<Arc<TileLayer>> {
            self.layers.get(&tile).map(Arc::clone)
        }

        fn heightfield(&self, _tile: TileCoord) -> Option<Arc<nav_surface::Heightfield>> {
            None
        }
    }

    fn assert_walk(grid: &TestGrid, cells: &[GridCoord]) {
        let mut cache = LayerCache::new();
        for pair in cells.windows(2) {
            assert_eq!(pair[0].manhattan_distance(pair[1]), 1);
            assert!(cache.is_walkable(grid, pair[1]));
        }
    }

    #[test]
    fn test_straight_corridor() {
        let grid = TestGrid::open(1, 1);
        let search = GridAStar::new(&grid, SearchFilter::default());

        let outcome = search.find_path(GridCoord::new(0, 0), GridCoord::new(5, 0));
        assert_eq!(outcome.result, SearchResult::Found);
        assert_eq!(outcome.cells.len(), 6);
        assert_eq!(outcome.cells.first(), Some(&GridCoord::new(0, 0)));
        assert_eq!(outcome.cells.last(), Some(&GridCoord::new(5, 0)));
        assert!(outcome.visited >= outcome.cells.len());
        assert_walk(&grid, &outcome.cells);
    }

    #[test]
    fn test_start_equals_goal() {
        let grid = TestGrid::open(1, 1);
        let search = GridAStar::new(&grid, SearchFilter::default());

        let outcome = search.find_path(GridCoord::new(4, 4), GridCoord::new(4, 4));
        assert_eq!(outcome.result, SearchResult::Found);
        assert_eq!(outcome.cells, vec![GridCoord::new(4, 4)]);
        assert_eq!(outcome.visited, 1);
    }

    #[test]
    fn test_blocked_start_is_invalid() {
        let mut grid = TestGrid::open(1, 1);
        grid.block(0, 0);
        let search = GridAStar::new(&grid, SearchFilter::default());

        let outcome = search.find_path(GridCoord::new(0, 0), GridCoord::new(5, 0));
        assert_eq!(outcome.result, SearchResult::InvalidStart);
        assert!(outcome.cells.is_empty());
        assert_eq!(outcome.visited, 0);
    }

    #[test]
    fn test_start_outside_tiles_is_invalid() {
        let grid = TestGrid::open(1, 1);
        let search = GridAStar::new(&grid, SearchFilter::default());

        let outcome = search.find_path(GridCoord::new(-1, 0), GridCoord::new(5, 0));
        assert_eq!(outcome.result, SearchResult::InvalidStart);
    }

    #[test]
    fn test_wall_forces_detour() {
        let mut grid = TestGrid::open(1, 1);
        // Wall across the whole tile at x = 5, except a gap at y = 20.
        grid.block_rect(GridRect::new(GridCoord::new(5, 0), GridCoord::new(6, 20)));
        grid.block_rect(GridRect::new(GridCoord::new(5, 21), GridCoord::new(6, 32)));
        let search = GridAStar::new(&grid, SearchFilter::default());

        let outcome = search.find_path(GridCoord::new(0, 0), GridCoord::new(10, 0));
        assert_eq!(outcome.result, SearchResult::Found);
        // The detour through (5, 20) is far longer than the direct line.
        assert!(outcome.cells.len() > 11);
        assert!(outcome.cells.contains(&GridCoord::new(5, 20)));
        assert_walk(&grid, &outcome.cells);
    }

    #[test]
    fn test_enclosed_start_has_no_path() {
        let mut grid = TestGrid::open(1, 1);
        // (0, 0) sits in the corner; its two in-grid neighbors seal it.
        grid.block(1, 0);
        grid.block(0, 1);
        let search = GridAStar::new(&grid, SearchFilter::default());

        let outcome = search.find_path(GridCoord::new(0, 0), GridCoord::new(5, 0));
        assert_eq!(outcome.result, SearchResult::NoPath);
        assert!(outcome.cells.is_empty());
        assert!(outcome.visited >= 1);
    }

    #[test]
    fn test_partial_ends_at_cell_closest_to_goal() {
        let mut grid = TestGrid::open(1, 1);
        // Everything east of x = 2 is blocked; the goal is unreachable.
        grid.block_rect(GridRect::new(GridCoord::new(3, 0), GridCoord::new(16, 32)));
        let filter = SearchFilter::default().with_partial_solutions(true);
        let search = GridAStar::new(&grid, filter);

        let outcome = search.find_path(GridCoord::new(0, 0), GridCoord::new(10, 0));
        assert_eq!(outcome.result, SearchResult::Partial);
        // Of every expanded cell, (2, 0) has the smallest heuristic.
        assert_eq!(outcome.cells.first(), Some(&GridCoord::new(0, 0)));
        assert_eq!(outcome.cells.last(), Some(&GridCoord::new(2, 0)));
        assert_walk(&grid, &outcome.cells);
    }

    #[test]
    fn test_unreachable_without_partial_is_no_path() {
        let mut grid = TestGrid::open(1, 1);
        grid.block_rect(GridRect::new(GridCoord::new(3, 0), GridCoord::new(16, 32)));
        let search = GridAStar::new(&grid, SearchFilter::default());

        let outcome = search.find_path(GridCoord::new(0, 0), GridCoord::new(10, 0));
        assert_eq!(outcome.result, SearchResult::NoPath);
        assert!(outcome.cells.is_empty());
    }

    #[test]
    fn test_node_budget_caps_allocation() {
        let grid = TestGrid::open(1, 1);
        let filter = SearchFilter::default()
            .with_node_budget(8)
            .with_partial_solutions(true);
        let search = GridAStar::new(&grid, filter);

        // The goal lies outside the tiled area, so only the budget stops
        // the search.
        let outcome = search.find_path(GridCoord::new(8, 16), GridCoord::new(100, 16));
        assert_eq!(outcome.result, SearchResult::Partial);
        assert_eq!(outcome.visited, 8);
        // Expansion marches east; the partial path follows it.
        assert_eq!(
            outcome.cells,
            vec![
                GridCoord::new(8, 16),
                GridCoord::new(9, 16),
                GridCoord::new(10, 16),
            ],
        );
    }

    #[test]
    fn test_cost_limit_stops_search() {
        let grid = TestGrid::open(1, 1);
        let filter = SearchFilter::default().with_cost_limit(3.0);
        let search = GridAStar::new(&grid, filter);

        let outcome = search.find_path(GridCoord::new(0, 0), GridCoord::new(10, 0));
        assert_eq!(outcome.result, SearchResult::NoPath);
        // The start estimate already exceeds the limit.
        assert_eq!(outcome.visited, 1);

        let relaxed = SearchFilter::default().with_cost_limit(100.0);
        let search = GridAStar::new(&grid, relaxed);
        let outcome = search.find_path(GridCoord::new(0, 0), GridCoord::new(10, 0));
        assert_eq!(outcome.result, SearchResult::Found);
    }

    #[test]
    fn test_path_crosses_tile_boundary() {
        let grid = TestGrid::open(2, 1);
        let search = GridAStar::new(&grid, SearchFilter::default());

        let outcome = search.find_path(GridCoord::new(14, 5), GridCoord::new(18, 5));
        assert_eq!(outcome.result, SearchResult::Found);
        assert_eq!(outcome.cells.len(), 5);
        assert!(outcome.cells.contains(&GridCoord::new(16, 5)));
        assert_walk(&grid, &outcome.cells);
    }

    #[test]
    fn test_goal_beyond_tiles_yields_partial_at_edge() {
        let grid = TestGrid::open(2, 1);
        let filter = SearchFilter::default().with_partial_solutions(true);
        let search = GridAStar::new(&grid, filter);

        let outcome = search.find_path(GridCoord::new(5, 5), GridCoord::new(40, 5));
        assert_eq!(outcome.result, SearchResult::Partial);
        // The tiled area ends at x = 31; the best effort stops there.
        assert_eq!(outcome.cells.last(), Some(&GridCoord::new(31, 5)));
    }
}
