//! Budgeted background regeneration.
//!
//! [`RegenScheduler`] turns marked dirty areas into tile rebuilds. Each
//! tick it publishes finished builds, then launches new ones up to a
//! concurrency budget derived from the worker pool size. Builds run on
//! the rayon pool; completions come back over a channel and are applied
//! to the store on the caller's thread, so stores need no internal
//! locking.

use std::sync::mpsc::{Receiver, Sender};

use gw_grid::{GridRect, TileCoord};
use nav_surface::{Heightfield, TileLayer, TileSource};

use crate::builder::{TileBuildOutput, TileBuilder};
use crate::config::GenConfig;
use crate::dirty::{DirtyArea, DirtyFlags, DirtyQueue};
use crate::error::Result;
use crate::geometry::{CollectedGeometry, GeometrySource};

/// Write access to the published tiles of a navigation grid.
///
/// Extends [`TileSource`] with the one mutation regeneration performs:
/// replacing or removing a single tile's published state.
pub trait TilePublisher: TileSource {
    /// Publish a rebuilt tile.
    ///
    /// `layer: None` removes the tile. A present layer with an absent
    /// heightfield replaces occupancy only and the previously stored
    /// heightfield stays valid.
    fn publish_tile(
        &mut self,
        tile: TileCoord,
        layer: Option<TileLayer>,
        heightfield: Option<Heightfield>,
    );
}

struct BuildCompletion {
    tile: TileCoord,
    output: TileBuildOutput,
}

/// Schedules tile rebuilds against a geometry source and a tile store.
///
/// The scheduler owns the dirty queue and the navigable bounds. It never
/// touches the store from worker threads: previous tile snapshots are
/// taken while launching and finished tiles are published during
/// [`tick`](Self::tick), both on the calling thread.
pub struct RegenScheduler {
    config: GenConfig,
    bounds: Vec<GridRect>,
    queue: DirtyQueue,
    running: Vec<TileCoord>,
    budget: usize,
    tx: Sender<BuildCompletion>,
    rx: Receiver<BuildCompletion>,
}

impl RegenScheduler {
    /// Creates a scheduler for a validated configuration.
    ///
    /// The concurrency budget is twice the rayon pool size, so a tick
    /// can keep every worker busy and still have the next tile staged.
    pub fn new(config: GenConfig) -> Result<Self> {
        config.validate()?;
        let (tx, rx) = std::sync::mpsc::channel();
        Ok(Self {
            config,
            bounds: Vec::new(),
            queue: DirtyQueue::new(config.tile_extent()),
            running: Vec::new(),
            budget: (rayon::current_num_threads() * 2).max(1),
            tx,
            rx,
        })
    }

    /// The configuration rebuilds run under.
    #[must_use]
    pub const fn config(&self) -> &GenConfig {
        &self.config
    }

    /// The current navigable bounds rects, in cells.
    #[must_use]
    pub fn navigable_bounds(&self) -> &[GridRect] {
        &self.bounds
    }

    /// Queues dirty areas for regeneration.
    pub fn mark_dirty(&mut self, areas: &[DirtyArea]) {
        self.queue.mark(areas);
    }

    /// Replaces the navigable bounds.
    ///
    /// Every tile under the old or the new bounds is queued with a
    /// bounds change: tiles leaving the bounds get removed on their next
    /// build, tiles entering them get generated.
    pub fn set_navigable_bounds(&mut self, bounds: &[GridRect]) {
        let dirty: Vec<DirtyArea> = self
            .bounds
            .iter()
            .chain(bounds)
            .map(|&rect| DirtyArea::new(rect, DirtyFlags::BOUNDS))
            .collect();
        self.queue.mark(&dirty);
        self.bounds = bounds.to_vec();
    }

    /// Queues a full rebuild of everything under the navigable bounds.
    pub fn rebuild_all(&mut self) {
        let dirty: Vec<DirtyArea> = self
            .bounds
            .iter()
            .map(|&rect| DirtyArea::new(rect, DirtyFlags::GEOMETRY | DirtyFlags::BOUNDS))
            .collect();
        self.queue.mark(&dirty);
    }

    /// Whether any rebuild is queued or in flight.
    #[must_use]
    pub fn has_pending_work(&self) -> bool {
        !self.queue.is_empty() || !self.running.is_empty()
    }

    /// Number of tiles waiting in the dirty queue.
    #[must_use]
    pub fn queued_tiles(&self) -> usize {
        self.queue.len()
    }

    /// Number of builds currently in flight.
    #[must_use]
    pub fn running_tasks(&self) -> usize {
        self.running.len()
    }

    /// Publishes finished builds and launches queued ones up to the
    /// budget.
    ///
    /// Tiles that no longer intersect the navigable bounds are removed
    /// from the store immediately, without a background build. A
    /// geometry source failure stops launching for this tick and leaves
    /// the failed tile queued for a retry.
    pub fn tick<S, P>(&mut self, source: &mut S, publisher: &mut P)
    where
        S: GeometrySource + ?Sized,
        P: TilePublisher + ?Sized,
    {
        debug_assert_eq!(publisher.tile_extent(), self.config.tile_extent());
        self.process_completed(publisher);

        while self.running.len() < self.budget {
            let running = &self.running;
            let Some(pending) = self.queue.take_next(|tile| running.contains(&tile)) else {
                break;
            };
            let tile = pending.coord;

            let builder = TileBuilder::new(
                &self.config,
                tile,
                &pending.areas,
                &self.bounds,
                publisher.layer(tile),
                publisher.heightfield(tile),
            );

            if !builder.intersects_navigable_bounds() {
                publisher.publish_tile(tile, None, None);
                continue;
            }
            if !builder.has_work() {
                continue;
            }

            let geometry = match gather(source, &self.config, &builder) {
                Ok(geometry) => geometry,
                Err(error) => {
                    tracing::warn!(
                        "Geometry gathering failed for tile ({}, {}); its areas stay queued: {}",
                        tile.x,
                        tile.y,
                        error
                    );
                    self.queue.requeue(pending);
                    break;
                }
            };

            self.running.push(tile);
            let tx = self.tx.clone();
            rayon::spawn(move || {
                let output = builder.build(&geometry);
                // Send failure means the scheduler is gone and the
                // result is moot.
                let _ = tx.send(BuildCompletion { tile, output });
            });
        }
    }

    /// Drives ticks until the queue drains and every build has been
    /// published.
    ///
    /// Blocks on in-flight builds between ticks. Returns early when a
    /// persistently failing geometry source leaves tiles queued with
    /// nothing running.
    pub fn wait_idle<S, P>(&mut self, source: &mut S, publisher: &mut P)
    where
        S: GeometrySource + ?Sized,
        P: TilePublisher + ?Sized,
    {
        loop {
            self.tick(source, publisher);
            if self.running.is_empty() {
                if !self.queue.is_empty() {
                    tracing::warn!(
                        "Regeneration stalled with {} tiles still queued",
                        self.queue.len()
                    );
                }
                return;
            }
            match self.rx.recv() {
                Ok(completion) => self.finish(completion, publisher),
                Err(_) => return,
            }
        }
    }

    /// Drops all queued work and blocks until in-flight builds finish,
    /// discarding their results.
    ///
    /// Nothing is published: the store keeps whatever it held before the
    /// cancelled builds started.
    pub fn cancel(&mut self) {
        self.queue.clear();
        while !self.running.is_empty() {
            match self.rx.recv() {
                Ok(completion) => {
                    if let Some(index) =
                        self.running.iter().position(|&t| t == completion.tile)
                    {
                        self.running.swap_remove(index);
                    }
                }
                Err(_) => {
                    self.running.clear();
                }
            }
        }
    }

    fn process_completed<P>(&mut self, publisher: &mut P)
    where
        P: TilePublisher + ?Sized,
    {
        while let Ok(completion) = self.rx.try_recv() {
            self.finish(completion, publisher);
        }
    }

    fn finish<P>(&mut self, completion: BuildCompletion, publisher: &mut P)
    where
        P: TilePublisher + ?Sized,
    {
        if let Some(index) = self.running.iter().position(|&t| t == completion.tile) {
            self.running.swap_remove(index);
        }
        publisher.publish_tile(
            completion.tile,
            completion.output.layer,
            completion.output.heightfield,
        );
    }
}

impl std::fmt::Debug for RegenScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegenScheduler")
            .field("config", &self.config)
            .field("bounds", &self.bounds)
            .field("queued", &self.queue.len())
            .field("running", &self.running)
            .field("budget", &self.budget)
            .finish_non_exhaustive()
    }
}

/// Queries the geometry source once per dirty rect. Geometry rects pull
/// triangles and modifiers, modifier rects pull modifiers only.
fn gather<S>(source: &mut S, config: &GenConfig, builder: &TileBuilder) -> Result<CollectedGeometry>
where
    S: GeometrySource + ?Sized,
{
    let mut collected = CollectedGeometry::new();
    for &rect in builder.geometry_rects() {
        let (lo, hi) = config.world_bounds_of(rect);
        let mut batch = source.collect(lo, hi, true)?;
        collected.append(&mut batch);
    }
    for &rect in builder.modifier_rects() {
        let (lo, hi) = config.world_bounds_of(rect);
        let mut batch = source.collect(lo, hi, false)?;
        collected.append(&mut batch);
    }
    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::Entry;
    use std::collections::HashMap;
    use std::sync::Arc;

    use gw_grid::{GridCoord, TileExtent};
    use nalgebra::Point3;

    use crate::error::GenError;
    use crate::geometry::{AreaEffect, AreaModifier, ModifierShape, TriangleSoup};

    fn rect(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> GridRect {
        GridRect::new(GridCoord::new(min_x, min_y), GridCoord::new(max_x, max_y))
    }

    fn test_config() -> GenConfig {
        GenConfig::new()
            .with_tile_extent(TileExtent::new(16, 32))
            .with_cell_size(1.0)
            .with_max_height_delta(0.25)
    }

    fn floor_soup(min_x: f32, min_y: f32, max_x: f32, max_y: f32, z: f32) -> TriangleSoup {
        TriangleSoup {
            vertices: vec![
                Point3::new(min_x, min_y, z),
                Point3::new(max_x, min_y, z),
                Point3::new(max_x, max_y, z),
                Point3::new(min_x, max_y, z),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
            instances: Vec::new(),
        }
    }

    /// Store double keeping published tiles in a map.
    struct MemoryStore {
        extent: TileExtent,
        tiles: HashMap<TileCoord, (Arc<TileLayer>, Option<Arc<Heightfield>>)>,
        publishes: usize,
        removals: usize,
    }

    impl MemoryStore {
        fn new(extent: TileExtent) -> Self {
            Self {
                extent,
                tiles: HashMap::new(),
                publishes: 0,
                removals: 0,
            }
        }

        fn seed(&mut self, tile: TileCoord, cell_size: f32) {
            let layer = TileLayer::new(tile.cell_rect(self.extent), cell_size, true, 0.0);
            self.tiles.insert(tile, (Arc::new(layer), None));
        }
    }

    impl TileSource for MemoryStore {
        fn tile_extent(&self) -> TileExtent {
            self.extent
        }

        fn layer(&self, tile: TileCoord) -> Option<Arc<TileLayer>> {
            self.tiles.get(&tile).map(|(layer, _)| Arc::clone(layer))
        }

        fn heightfield(&self, tile: TileCoord) -> Option<Arc<Heightfield>> {
            self.tiles.get(&tile).and_then(|(_, field)| field.clone())
        }
    }

    impl TilePublisher for MemoryStore {
        fn publish_tile(
            &mut self,
            tile: TileCoord,
            layer: Option<TileLayer>,
            heightfield: Option<Heightfield>,
        ) {
            self.publishes += 1;
            let Some(layer) = layer else {
                self.tiles.remove(&tile);
                self.removals += 1;
                return;
            };
            match self.tiles.entry(tile) {
                Entry::Occupied(mut entry) => {
                    let slot = entry.get_mut();
                    slot.0 = Arc::new(layer);
                    if let Some(field) = heightfield {
                        slot.1 = Some(Arc::new(field));
                    }
                }
                Entry::Vacant(entry) => {
                    entry.insert((Arc::new(layer), heightfield.map(Arc::new)));
                }
            }
        }
    }

    /// Geometry source double returning the same world for every query.
    struct StaticWorld {
        triangles: Vec<TriangleSoup>,
        modifiers: Vec<AreaModifier>,
        wants: Vec<bool>,
        fail_next: bool,
    }

    impl StaticWorld {
        fn new() -> Self {
            Self {
                triangles: Vec::new(),
                modifiers: Vec::new(),
                wants: Vec::new(),
                fail_next: false,
            }
        }
    }

    impl GeometrySource for StaticWorld {
        fn collect(
            &mut self,
            _bounds_min: Point3<f32>,
            _bounds_max: Point3<f32>,
            want_triangles: bool,
        ) -> Result<CollectedGeometry> {
            self.wants.push(want_triangles);
            if self.fail_next {
                self.fail_next = false;
                return Err(GenError::Source("collision data still streaming".into()));
            }
            let mut collected = CollectedGeometry::new();
            if want_triangles {
                collected.triangles.extend(self.triangles.iter().cloned());
            }
            collected.modifiers.extend(self.modifiers.iter().cloned());
            Ok(collected)
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = RegenScheduler::new(test_config().with_cell_size(0.0));
        assert!(matches!(result, Err(GenError::InvalidCellSize(_))));
    }

    #[test]
    fn test_bounds_change_builds_and_publishes() {
        let mut scheduler = RegenScheduler::new(test_config()).unwrap();
        let mut store = MemoryStore::new(TileExtent::new(16, 32));
        let mut world = StaticWorld::new();
        world
            .triangles
            .push(floor_soup(0.25, 0.25, 15.75, 31.75, 2.0));

        scheduler.set_navigable_bounds(&[rect(0, 0, 16, 32)]);
        assert!(scheduler.has_pending_work());
        scheduler.wait_idle(&mut world, &mut store);

        assert!(!scheduler.has_pending_work());
        assert_eq!(store.publishes, 1);
        let tile = TileCoord::new(0, 0);
        let layer = store.layer(tile).unwrap();
        assert!(!layer.is_occupied(GridCoord::new(5, 5)));
        assert_eq!(layer.height_of(GridCoord::new(5, 5)), 2.0);
        assert!(store.heightfield(tile).is_some());
    }

    #[test]
    fn test_repeated_marks_coalesce_into_one_build() {
        let mut scheduler = RegenScheduler::new(test_config()).unwrap();
        let mut store = MemoryStore::new(TileExtent::new(16, 32));
        let mut world = StaticWorld::new();
        world.triangles.push(floor_soup(0.25, 0.25, 7.75, 7.75, 0.0));

        scheduler.set_navigable_bounds(&[rect(0, 0, 16, 32)]);
        scheduler.wait_idle(&mut world, &mut store);

        let area = DirtyArea::new(rect(0, 0, 8, 8), DirtyFlags::GEOMETRY);
        scheduler.mark_dirty(&[area]);
        scheduler.mark_dirty(&[area]);
        assert_eq!(scheduler.queued_tiles(), 1);
        scheduler.wait_idle(&mut world, &mut store);

        assert_eq!(store.publishes, 2);
    }

    #[test]
    fn test_tile_outside_bounds_is_removed_synchronously() {
        let mut scheduler = RegenScheduler::new(test_config()).unwrap();
        let mut store = MemoryStore::new(TileExtent::new(16, 32));
        let mut world = StaticWorld::new();

        let stale = TileCoord::new(1, 0);
        store.seed(stale, 1.0);
        scheduler.set_navigable_bounds(&[rect(0, 0, 16, 32)]);
        scheduler.cancel();
        let publishes_before = store.publishes;

        scheduler.mark_dirty(&[DirtyArea::new(rect(16, 0, 32, 32), DirtyFlags::GEOMETRY)]);
        scheduler.tick(&mut world, &mut store);

        // Removal happens on the calling thread, before any gathering.
        assert!(store.layer(stale).is_none());
        assert_eq!(store.removals, 1);
        assert_eq!(store.publishes, publishes_before + 1);
        assert!(world.wants.is_empty());
        assert_eq!(scheduler.running_tasks(), 0);
    }

    #[test]
    fn test_bounds_shrink_removes_stale_tiles() {
        let mut scheduler = RegenScheduler::new(test_config()).unwrap();
        let mut store = MemoryStore::new(TileExtent::new(16, 32));
        let mut world = StaticWorld::new();
        world
            .triangles
            .push(floor_soup(0.25, 0.25, 31.75, 31.75, 0.0));

        scheduler.set_navigable_bounds(&[rect(0, 0, 32, 32)]);
        scheduler.wait_idle(&mut world, &mut store);
        assert!(store.layer(TileCoord::new(0, 0)).is_some());
        assert!(store.layer(TileCoord::new(1, 0)).is_some());

        scheduler.set_navigable_bounds(&[rect(0, 0, 16, 32)]);
        scheduler.wait_idle(&mut world, &mut store);

        assert!(store.layer(TileCoord::new(0, 0)).is_some());
        assert!(store.layer(TileCoord::new(1, 0)).is_none());
        assert_eq!(store.removals, 1);
    }

    #[test]
    fn test_source_failure_keeps_tile_queued() {
        let mut scheduler = RegenScheduler::new(test_config()).unwrap();
        let mut store = MemoryStore::new(TileExtent::new(16, 32));
        let mut world = StaticWorld::new();
        world.triangles.push(floor_soup(0.25, 0.25, 7.75, 7.75, 0.0));
        world.fail_next = true;

        scheduler.set_navigable_bounds(&[rect(0, 0, 16, 32)]);
        scheduler.wait_idle(&mut world, &mut store);

        // The failed tile stays queued and nothing was published.
        assert_eq!(scheduler.queued_tiles(), 1);
        assert_eq!(store.publishes, 0);

        scheduler.wait_idle(&mut world, &mut store);
        assert!(!scheduler.has_pending_work());
        assert!(store.layer(TileCoord::new(0, 0)).is_some());
    }

    #[test]
    fn test_cancel_discards_queue_and_in_flight_results() {
        let mut scheduler = RegenScheduler::new(test_config()).unwrap();
        let mut store = MemoryStore::new(TileExtent::new(16, 32));
        let mut world = StaticWorld::new();
        world
            .triangles
            .push(floor_soup(0.25, 0.25, 31.75, 31.75, 0.0));

        scheduler.set_navigable_bounds(&[rect(0, 0, 32, 32)]);
        scheduler.cancel();
        assert!(!scheduler.has_pending_work());
        assert_eq!(store.publishes, 0);

        // Launch, then cancel: finished builds are waited on but never
        // installed.
        scheduler.set_navigable_bounds(&[rect(0, 0, 32, 32)]);
        scheduler.tick(&mut world, &mut store);
        scheduler.cancel();
        assert!(!scheduler.has_pending_work());
        assert_eq!(store.publishes, 0);
        assert!(store.layer(TileCoord::new(0, 0)).is_none());
    }

    #[test]
    fn test_modifier_delta_reuses_stored_heightfield() {
        let mut scheduler = RegenScheduler::new(test_config()).unwrap();
        let mut store = MemoryStore::new(TileExtent::new(16, 32));
        let mut world = StaticWorld::new();
        world
            .triangles
            .push(floor_soup(0.25, 0.25, 15.75, 31.75, 0.0));

        scheduler.set_navigable_bounds(&[rect(0, 0, 16, 32)]);
        scheduler.wait_idle(&mut world, &mut store);
        let tile = TileCoord::new(0, 0);
        assert!(!store.layer(tile).unwrap().is_occupied(GridCoord::new(4, 4)));

        // A modifier appears; only occupancy needs repainting.
        world.modifiers.push(AreaModifier {
            shape: ModifierShape::Cylinder {
                center: Point3::new(4.5, 4.5, 0.0),
                radius: 1.6,
                half_height: 1.0,
            },
            effect: AreaEffect::Blocked,
            instances: Vec::new(),
        });
        scheduler.mark_dirty(&[DirtyArea::new(rect(0, 0, 16, 32), DirtyFlags::MODIFIERS)]);
        scheduler.wait_idle(&mut world, &mut store);

        let layer = store.layer(tile).unwrap();
        assert!(layer.is_occupied(GridCoord::new(4, 4)));
        assert!(!layer.is_occupied(GridCoord::new(10, 10)));
        // The store kept the original heightfield.
        assert!(store.heightfield(tile).is_some());
        assert_eq!(world.wants, vec![true, false]);
    }

    #[test]
    fn test_rebuild_all_requeues_bounds() {
        let mut scheduler = RegenScheduler::new(test_config()).unwrap();
        let mut store = MemoryStore::new(TileExtent::new(16, 32));
        let mut world = StaticWorld::new();
        world.triangles.push(floor_soup(0.25, 0.25, 7.75, 7.75, 0.0));

        scheduler.set_navigable_bounds(&[rect(0, 0, 16, 32)]);
        scheduler.wait_idle(&mut world, &mut store);
        assert_eq!(store.publishes, 1);

        scheduler.rebuild_all();
        assert_eq!(scheduler.queued_tiles(), 1);
        scheduler.wait_idle(&mut world, &mut store);
        assert_eq!(store.publishes, 2);
    }
}
