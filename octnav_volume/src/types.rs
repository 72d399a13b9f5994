// Core types shared across the navigation volume.
//
// Defines grid coordinates (`GridCoord`), compact cell indices (`CellId`),
// actor handles used by collision filters (`ActorId`), obstacle category
// bitmasks (`CategoryMask`), and the world-space axis-aligned box (`Aabb`)
// used by the octree and the collision scene. All types derive `Serialize`
// and `Deserialize` so configs, scenes and built grids can be saved and
// reloaded.
//
// World-space math uses `glam::Vec3`. Grid-space math stays in integers;
// the only float grid operation is `GridCoord::distance()`, which A* uses
// for both edge costs and the heuristic.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

// ---------------------------------------------------------------------------
// Grid types
// ---------------------------------------------------------------------------

/// A position in the navigation grid. Each component is in cell units.
///
/// Z is the "layer" axis: the neighbour template is grouped into the layer
/// above (z + 1), the same layer, and the layer below (z - 1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridCoord {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Component-wise offset.
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Number of axes on which the two coordinates agree (0..=3).
    pub fn shared_axes(self, other: Self) -> u8 {
        u8::from(self.x == other.x) + u8::from(self.y == other.y) + u8::from(self.z == other.z)
    }

    /// Euclidean distance in cell units.
    pub fn distance(self, other: Self) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        let dz = (self.z - other.z) as f32;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Index of a cell in the dense cell array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(pub u32);

impl CellId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Opaque handle of an actor in the collision world. Used to exclude the
/// querying agent from its own overlap tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Obstacle categories
// ---------------------------------------------------------------------------

/// Bitmask of obstacle categories (collision object types).
///
/// A query matches an obstacle when the two masks intersect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryMask(pub u32);

impl CategoryMask {
    pub const NONE: Self = Self(0);
    pub const WORLD_STATIC: Self = Self(1 << 0);
    pub const WORLD_DYNAMIC: Self = Self(1 << 1);
    pub const PAWN: Self = Self(1 << 2);
    pub const PHYSICS_BODY: Self = Self(1 << 3);
    pub const ALL: Self = Self(u32::MAX);

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl BitOr for CategoryMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

// ---------------------------------------------------------------------------
// World-space boxes
// ---------------------------------------------------------------------------

/// World-space axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Create a box from its corners.
    ///
    /// # Panics
    /// Debug-asserts that min <= max on all axes.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        debug_assert!(
            min.cmple(max).all(),
            "Aabb min must be <= max on all axes"
        );
        Self { min, max }
    }

    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        self.size() * 0.5
    }

    /// Length of the longest side.
    #[inline]
    pub fn max_side(&self) -> f32 {
        self.size().max_element()
    }

    /// Same box shifted by `offset`.
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Closed containment test (boundary points are inside).
    #[inline]
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Open-interval overlap: boxes that only touch on a face, edge or
    /// corner do not overlap. Grid-aligned obstacles therefore never leak
    /// into the neighbouring cell.
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.cmplt(other.max).all() && self.max.cmpgt(other.min).all()
    }

    /// Squared distance from `point` to the closest point of the box
    /// (zero when the point is inside).
    pub fn distance_squared_to_point(&self, point: Vec3) -> f32 {
        let closest = point.clamp(self.min, self.max);
        closest.distance_squared(point)
    }

    /// Index of the octant containing `point`:
    /// bit 0 = x >= centre, bit 1 = y >= centre, bit 2 = z >= centre.
    pub fn octant_index(&self, point: Vec3) -> usize {
        let c = self.center();
        usize::from(point.x >= c.x)
            | (usize::from(point.y >= c.y) << 1)
            | (usize::from(point.z >= c.z) << 2)
    }

    /// The octant box for an index produced by `octant_index()`.
    pub fn octant(&self, index: usize) -> Aabb {
        debug_assert!(index < 8, "octant index out of range: {index}");
        let c = self.center();
        let pick = |bit: usize, lo: f32, mid: f32, hi: f32| {
            if index & bit != 0 { (mid, hi) } else { (lo, mid) }
        };
        let (x0, x1) = pick(1, self.min.x, c.x, self.max.x);
        let (y0, y1) = pick(2, self.min.y, c.y, self.max.y);
        let (z0, z1) = pick(4, self.min.z, c.z, self.max.z);
        Aabb::new(Vec3::new(x0, y0, z0), Vec3::new(x1, y1, z1))
    }
}
