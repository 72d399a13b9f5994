// Test-only helpers for end-to-end navigation volume tests.
//
// Provides a cell-aligned scene builder (so scenarios can be written in grid
// coordinates instead of world units) and a `CountingWorld` wrapper that
// records how many static and live collision queries the volume issues.
// Counting is how the tests observe the two freshness models: static
// queries happen only during `build()`, live queries only during searches.
//
// All volume logic runs through the public `octnav_volume` API; nothing here
// reaches into crate internals.
//
// See also: `tests/volume_queries.rs` for the scenarios.

use std::cell::Cell;

use glam::Vec3;
use octnav_volume::{
    Aabb, ActorId, Capsule, CategoryMask, CollisionWorld, GridCoord, NavVolume, Obstacle,
    ObstacleScene, OverlapFilter, VolumeConfig, VolumeTransform,
};

/// Cell size used by every helper in this crate.
pub const CELL: f32 = 100.0;

/// World-space box covering the cells from `from` to `to` inclusive, for a
/// volume at `origin`.
pub fn cell_span(origin: Vec3, from: GridCoord, to: GridCoord) -> Aabb {
    let corner = |c: GridCoord| Vec3::new(c.x as f32, c.y as f32, c.z as f32) * CELL;
    Aabb::new(
        origin + corner(from),
        origin + corner(to.offset(1, 1, 1)),
    )
}

/// Builds an `ObstacleScene` from grid-space boxes.
pub struct SceneBuilder {
    origin: Vec3,
    next_id: u64,
    scene: ObstacleScene,
}

impl SceneBuilder {
    pub fn new(origin: Vec3) -> Self {
        Self {
            origin,
            next_id: 1,
            scene: ObstacleScene::new(),
        }
    }

    /// Add a box over a cell range. Returns the obstacle's id.
    pub fn block(&mut self, from: GridCoord, to: GridCoord, categories: CategoryMask) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id += 1;
        self.scene
            .insert(Obstacle::new(id, cell_span(self.origin, from, to), categories));
        id
    }

    /// Add a class-tagged box over a cell range.
    pub fn tagged(
        &mut self,
        from: GridCoord,
        to: GridCoord,
        categories: CategoryMask,
        class: &str,
    ) -> ActorId {
        let id = ActorId(self.next_id);
        self.next_id += 1;
        self.scene.insert(
            Obstacle::new(id, cell_span(self.origin, from, to), categories).with_class(class),
        );
        id
    }

    pub fn finish(self) -> ObstacleScene {
        self.scene
    }
}

/// Collision world wrapper that counts queries.
pub struct CountingWorld<W> {
    inner: W,
    box_queries: Cell<usize>,
    capsule_queries: Cell<usize>,
}

impl<W: CollisionWorld> CountingWorld<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            box_queries: Cell::new(0),
            capsule_queries: Cell::new(0),
        }
    }

    pub fn inner(&self) -> &W {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    pub fn box_queries(&self) -> usize {
        self.box_queries.get()
    }

    pub fn capsule_queries(&self) -> usize {
        self.capsule_queries.get()
    }

    pub fn reset(&self) {
        self.box_queries.set(0);
        self.capsule_queries.set(0);
    }
}

impl<W: CollisionWorld> CollisionWorld for CountingWorld<W> {
    fn box_overlaps(&self, bounds: &Aabb, categories: CategoryMask) -> bool {
        self.box_queries.set(self.box_queries.get() + 1);
        self.inner.box_overlaps(bounds, categories)
    }

    fn capsule_overlaps(&self, capsule: &Capsule, filter: &OverlapFilter) -> bool {
        self.capsule_queries.set(self.capsule_queries.get() + 1);
        self.inner.capsule_overlaps(capsule, filter)
    }
}

/// Build a volume with `CELL`-sized cells at `origin`.
pub fn build_volume<W: CollisionWorld + ?Sized>(
    dims: (u32, u32, u32),
    min_shared_axes: u8,
    origin: Vec3,
    world: &W,
) -> NavVolume {
    let mut config = VolumeConfig::with_grid(dims, CELL);
    config.min_shared_axes = min_shared_axes;
    let mut volume = NavVolume::new(config, VolumeTransform::from_translation(origin))
        .unwrap_or_else(|e| panic!("test volume config rejected: {e}"));
    volume
        .build(world)
        .unwrap_or_else(|e| panic!("test volume build failed: {e}"));
    volume
}

/// World-space centre of a cell in a `CELL`-sized volume at `origin`.
pub fn centre(origin: Vec3, x: i32, y: i32, z: i32) -> Vec3 {
    origin + Vec3::new(x as f32, y as f32, z as f32) * CELL + Vec3::splat(CELL * 0.5)
}
