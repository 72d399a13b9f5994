// Collision capability consumed by the navigation volume.
//
// The volume never owns world geometry. It asks a `CollisionWorld` two
// questions, with two different freshness models:
//
// - `box_overlaps()`: static occlusion. Asked once per octree leaf at build
//   time; the answer is cached in the tree and never re-asked until the
//   volume is rebuilt.
// - `capsule_overlaps()`: live dynamic overlap. Asked during every search
//   (BFS per visited cell, A* per improved edge), so it always reflects the
//   world as it is at query time.
//
// Implementations must be read-only (`&self`) so a built volume can be
// queried from several threads at once. `scene.rs` provides an in-memory
// implementation used by the tests, the benches and the `nav_query` CLI.

use crate::config::AgentShape;
use crate::error::{NavError, Result};
use crate::types::{ActorId, Aabb, CategoryMask};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Vertical (z-up) capsule placed in the world for a live overlap test.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Capsule {
    pub center: Vec3,
    pub radius: f32,
    /// Half of the total height, hemispheres included. Values below
    /// `radius` degenerate to a sphere.
    pub half_height: f32,
}

impl Capsule {
    pub fn new(center: Vec3, agent: AgentShape) -> Self {
        Self {
            center,
            radius: agent.radius,
            half_height: agent.half_height,
        }
    }

    /// Half-length of the inner segment (the capsule's spine).
    pub fn segment_half_length(&self) -> f32 {
        (self.half_height - self.radius).max(0.0)
    }

    /// Whether the capsule overlaps a box. Touching counts as clear, matching
    /// `Aabb::overlaps()`.
    pub fn overlaps_box(&self, bounds: &Aabb) -> bool {
        // Closest approach between a vertical segment and a box splits into
        // the planar distance (x, y clamp) and the gap between the segment's
        // z-interval and the box's z-interval.
        let h = self.segment_half_length();
        let dx = self.center.x - self.center.x.clamp(bounds.min.x, bounds.max.x);
        let dy = self.center.y - self.center.y.clamp(bounds.min.y, bounds.max.y);
        let lo = self.center.z - h;
        let hi = self.center.z + h;
        let dz = if hi < bounds.min.z {
            bounds.min.z - hi
        } else if lo > bounds.max.z {
            lo - bounds.max.z
        } else {
            0.0
        };
        let dist_sq = dx * dx + dy * dy + dz * dz;
        if self.radius > 0.0 {
            dist_sq < self.radius * self.radius
        } else {
            // Zero radius: only a strictly interior spine point overlaps.
            dist_sq == 0.0
                && self.center.x > bounds.min.x
                && self.center.x < bounds.max.x
                && self.center.y > bounds.min.y
                && self.center.y < bounds.max.y
                && hi > bounds.min.z
                && lo < bounds.max.z
        }
    }
}

/// Which obstacles a live overlap test considers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlapFilter {
    /// Obstacle categories that block the agent.
    pub categories: CategoryMask,
    /// Actor excluded from the test (usually the agent itself).
    pub ignore_actor: Option<ActorId>,
    /// When set, only obstacles tagged with this actor class count.
    pub class: Option<String>,
}

impl OverlapFilter {
    pub fn new(categories: CategoryMask) -> Self {
        Self {
            categories,
            ..Self::default()
        }
    }

    pub fn ignoring(mut self, actor: ActorId) -> Self {
        self.ignore_actor = Some(actor);
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Reject malformed filters before any search work begins.
    pub fn validate(&self) -> Result<()> {
        match &self.class {
            Some(class) if class.trim().is_empty() => Err(NavError::EmptyClassFilter),
            _ => Ok(()),
        }
    }
}

/// Collision queries the navigation volume needs from the host world.
pub trait CollisionWorld {
    /// Static query: does `bounds` overlap any obstacle in `categories`?
    fn box_overlaps(&self, bounds: &Aabb, categories: CategoryMask) -> bool;

    /// Live query: does `capsule` overlap any obstacle admitted by `filter`?
    fn capsule_overlaps(&self, capsule: &Capsule, filter: &OverlapFilter) -> bool;
}

impl<W: CollisionWorld + ?Sized> CollisionWorld for &W {
    fn box_overlaps(&self, bounds: &Aabb, categories: CategoryMask) -> bool {
        (**self).box_overlaps(bounds, categories)
    }

    fn capsule_overlaps(&self, capsule: &Capsule, filter: &OverlapFilter) -> bool {
        (**self).capsule_overlaps(capsule, filter)
    }
}
