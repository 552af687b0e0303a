//! Outstanding path tracking.
//!
//! Path queries hand out `Arc<NavPath>` results; the registry keeps
//! weak handles to them so tile publishes can flag affected paths
//! without keeping any path alive. The list is the grid's only shared
//! mutable state: registration runs on query threads while
//! invalidation runs on the publishing thread, so a mutex guards it.
//! Scans are short and never block on anything else.

use std::sync::{Arc, Mutex, Weak};

use gw_grid::GridRect;
use nav_path::NavPath;

/// Weak list of paths produced by this grid and not yet dropped.
#[derive(Debug, Default)]
pub(crate) struct PathRegistry {
    paths: Mutex<Vec<Weak<NavPath>>>,
}

impl PathRegistry {
    pub(crate) const fn new() -> Self {
        Self {
            paths: Mutex::new(Vec::new()),
        }
    }

    /// Number of registered paths still alive.
    pub(crate) fn live_count(&self) -> usize {
        self.paths.lock().map_or(0, |paths| {
            paths.iter().filter(|weak| weak.strong_count() > 0).count()
        })
    }

    /// Registers a freshly built path.
    pub(crate) fn register(&self, path: &Arc<NavPath>) {
        match self.paths.lock() {
            Ok(mut paths) => paths.push(Arc::downgrade(path)),
            Err(_) => {
                tracing::warn!("Path registry lock poisoned; path left unregistered");
            }
        }
    }

    /// Flags every live path whose grid bounds intersect `rect` and
    /// drops dead or flagged entries from the list.
    ///
    /// Returns the number of paths flagged. Paths with empty bounds
    /// cross no tile and are never flagged.
    pub(crate) fn invalidate_intersecting(&self, rect: GridRect) -> usize {
        let Ok(mut paths) = self.paths.lock() else {
            tracing::warn!("Path registry lock poisoned; skipping invalidation");
            return 0;
        };
        let mut flagged = 0;
        paths.retain(|weak| {
            let Some(path) = weak.upgrade() else {
                return false;
            };
            if path.grid_bounds().intersects(rect) {
                path.invalidate();
                flagged += 1;
                return false;
            }
            true
        });
        flagged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gw_grid::GridCoord;
    use nalgebra::Point3;
    use nav_path::PathPoint;

    fn path_over(min: (i32, i32), max: (i32, i32)) -> Arc<NavPath> {
        let bounds = GridRect::new(
            GridCoord::new(min.0, min.1),
            GridCoord::new(max.0, max.1),
        );
        // Point positions are irrelevant here; only the bounds matter.
        let points = vec![PathPoint::new(Point3::origin(), GridCoord::new(min.0, min.1))];
        Arc::new(NavPath::new(points, bounds, true))
    }

    fn rect(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> GridRect {
        GridRect::new(GridCoord::new(min_x, min_y), GridCoord::new(max_x, max_y))
    }

    #[test]
    fn test_invalidate_flags_intersecting_paths() {
        let registry = PathRegistry::new();
        let near = path_over((0, 0), (4, 4));
        let far = path_over((10, 10), (12, 12));
        registry.register(&near);
        registry.register(&far);
        assert_eq!(registry.live_count(), 2);

        let flagged = registry.invalidate_intersecting(rect(3, 3, 5, 5));
        assert_eq!(flagged, 1);
        assert!(!near.is_valid());
        assert!(far.is_valid());
        // The flagged path left the list; the other stays registered.
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_dropped_paths_are_pruned() {
        let registry = PathRegistry::new();
        let path = path_over((0, 0), (4, 4));
        registry.register(&path);
        drop(path);

        let flagged = registry.invalidate_intersecting(rect(0, 0, 8, 8));
        assert_eq!(flagged, 0);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_empty_bounds_survive_every_publish() {
        let registry = PathRegistry::new();
        let point = PathPoint::new(Point3::new(1.5, 1.5, 0.0), GridCoord::new(1, 1));
        let trivial = Arc::new(NavPath::single(point, true));
        registry.register(&trivial);

        registry.invalidate_intersecting(rect(-1000, -1000, 1000, 1000));
        assert!(trivial.is_valid());
        assert_eq!(registry.live_count(), 1);
    }
}
