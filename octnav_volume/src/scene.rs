// In-memory collision scene.
//
// `ObstacleScene` is a flat list of axis-aligned box obstacles, each with
// an actor id, a category mask and an optional actor-class tag. It
// implements `CollisionWorld` by brute-force testing every obstacle, which
// is plenty for tests, benches and scripted scenarios.
//
// Obstacles can be added, moved and removed at any time. Moving an obstacle
// after the volume is built is how the two freshness models become
// observable: the octree keeps its build-time answer while live capsule
// queries see the new position immediately.
//
// See also: `collision.rs` for the trait and query shapes, the
// `octnav_tests` crate which drives scenes through full volume queries.

use crate::collision::{Capsule, CollisionWorld, OverlapFilter};
use crate::types::{ActorId, Aabb, CategoryMask};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// One box obstacle in the scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: ActorId,
    pub bounds: Aabb,
    pub categories: CategoryMask,
    /// Actor-class tag matched against `OverlapFilter::class`.
    #[serde(default)]
    pub class: Option<String>,
}

impl Obstacle {
    pub fn new(id: ActorId, bounds: Aabb, categories: CategoryMask) -> Self {
        Self {
            id,
            bounds,
            categories,
            class: None,
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    fn admitted_by(&self, filter: &OverlapFilter) -> bool {
        if !self.categories.intersects(filter.categories) {
            return false;
        }
        if filter.ignore_actor == Some(self.id) {
            return false;
        }
        match &filter.class {
            Some(class) => self.class.as_deref() == Some(class.as_str()),
            None => true,
        }
    }
}

/// Brute-force collision world made of box obstacles.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ObstacleScene {
    obstacles: Vec<Obstacle>,
}

impl ObstacleScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an obstacle. An existing obstacle with the same id is replaced.
    pub fn insert(&mut self, obstacle: Obstacle) {
        self.remove(obstacle.id);
        self.obstacles.push(obstacle);
    }

    /// Convenience: add a box by corners.
    pub fn add_box(&mut self, id: ActorId, min: Vec3, max: Vec3, categories: CategoryMask) {
        self.insert(Obstacle::new(id, Aabb::new(min, max), categories));
    }

    /// Remove an obstacle. Returns it if it existed.
    pub fn remove(&mut self, id: ActorId) -> Option<Obstacle> {
        let pos = self.obstacles.iter().position(|o| o.id == id)?;
        Some(self.obstacles.remove(pos))
    }

    /// Shift an obstacle by `delta`. Returns `false` if the id is unknown.
    pub fn translate(&mut self, id: ActorId, delta: Vec3) -> bool {
        match self.obstacles.iter_mut().find(|o| o.id == id) {
            Some(obstacle) => {
                obstacle.bounds = obstacle.bounds.translated(delta);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: ActorId) -> Option<&Obstacle> {
        self.obstacles.iter().find(|o| o.id == id)
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }
}

impl CollisionWorld for ObstacleScene {
    fn box_overlaps(&self, bounds: &Aabb, categories: CategoryMask) -> bool {
        self.obstacles
            .iter()
            .any(|o| o.categories.intersects(categories) && o.bounds.overlaps(bounds))
    }

    fn capsule_overlaps(&self, capsule: &Capsule, filter: &OverlapFilter) -> bool {
        self.obstacles
            .iter()
            .any(|o| o.admitted_by(filter) && capsule.overlaps_box(&o.bounds))
    }
}
