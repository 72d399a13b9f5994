// Static occlusion octree.
//
// A split-by-8 tree over the volume box. Every node is either an internal
// node with exactly 8 children or a leaf carrying a blocked flag resolved
// once, at build time, by one `CollisionWorld::box_overlaps()` query. The
// tree is never patched; a rebuild replaces it wholesale.
//
// Storage is an arena: `nodes: Vec<OctreeNode>` with children referenced by
// `OctreeNodeId`. Children are built before their parent is pushed, so the
// root is the last node in the arena. The all-8-or-none invariant is carried
// by the `OctreeNodeKind` sum type; there is no way to express a partial
// child set.
//
// Leaf rule: a box becomes a leaf when its longest side is at most
// `min_leaf_size` (plus a 1e-4 tolerance for float drift from repeated
// halving) or when `max_depth` is reached. All-blocked siblings are not
// merged.
//
// Query: descend from the root choosing the child whose octant index is
// formed by comparing the point with the node centre (bit 0 = x, bit 1 = y,
// bit 2 = z; `>=` goes high) and return the leaf's flag. Points outside the
// root box still land in the nearest extreme leaf.
//
// See also: `types.rs` for `Aabb::octant()`/`octant_index()`, `volume.rs`
// which owns the tree, `probe.rs` which consults it during searches.

use crate::collision::CollisionWorld;
use crate::types::{Aabb, CategoryMask};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Tolerance added to the leaf size test.
const LEAF_SIZE_EPSILON: f32 = 1e-4;

/// Index of a node in the octree arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OctreeNodeId(pub u32);

/// Leaf or internal node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OctreeNodeKind {
    Leaf { blocked: bool },
    Internal { children: [OctreeNodeId; 8] },
}

/// One node of the octree.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OctreeNode {
    pub bounds: Aabb,
    pub kind: OctreeNodeKind,
}

impl OctreeNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, OctreeNodeKind::Leaf { .. })
    }
}

/// Shape parameters for an octree build.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OctreeParams {
    pub min_leaf_size: f32,
    pub max_depth: u32,
    /// Obstacle categories that block a leaf.
    pub categories: CategoryMask,
}

/// Summary counts of a built tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OctreeStats {
    pub nodes: usize,
    pub leaves: usize,
    pub blocked_leaves: usize,
    /// Depth of the deepest leaf (root = 0).
    pub depth: u32,
}

/// Immutable occlusion octree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OcclusionOctree {
    nodes: Vec<OctreeNode>,
    root: OctreeNodeId,
    depth: u32,
}

impl OcclusionOctree {
    /// Build the tree over `bounds`, classifying each leaf with one static
    /// box query against `world`.
    pub fn build<W: CollisionWorld + ?Sized>(bounds: Aabb, params: &OctreeParams, world: &W) -> Self {
        let mut builder = Builder {
            params,
            world,
            nodes: Vec::new(),
            depth: 0,
        };
        let root = builder.build_node(bounds, 0);
        Self {
            nodes: builder.nodes,
            root,
            depth: builder.depth,
        }
    }

    pub fn root(&self) -> OctreeNodeId {
        self.root
    }

    /// Get a node by id.
    ///
    /// # Panics
    /// On an id not produced by this tree.
    pub fn node(&self, id: OctreeNodeId) -> &OctreeNode {
        &self.nodes[id.0 as usize]
    }

    pub fn bounds(&self) -> Aabb {
        self.node(self.root).bounds
    }

    /// The leaf containing `point`.
    pub fn leaf_at(&self, point: Vec3) -> &OctreeNode {
        let mut node = self.node(self.root);
        while let OctreeNodeKind::Internal { children } = &node.kind {
            node = self.node(children[node.bounds.octant_index(point)]);
        }
        node
    }

    /// Cached static occlusion at `point`.
    pub fn is_blocked(&self, point: Vec3) -> bool {
        let mut node = self.node(self.root);
        loop {
            match node.kind {
                OctreeNodeKind::Leaf { blocked } => return blocked,
                OctreeNodeKind::Internal { children } => {
                    node = self.node(children[node.bounds.octant_index(point)]);
                }
            }
        }
    }

    /// Iterate over all leaves.
    pub fn leaves(&self) -> impl Iterator<Item = &OctreeNode> + '_ {
        self.nodes.iter().filter(|n| n.is_leaf())
    }

    pub fn stats(&self) -> OctreeStats {
        let leaves = self.leaves().count();
        let blocked_leaves = self
            .leaves()
            .filter(|n| matches!(n.kind, OctreeNodeKind::Leaf { blocked: true }))
            .count();
        OctreeStats {
            nodes: self.nodes.len(),
            leaves,
            blocked_leaves,
            depth: self.depth,
        }
    }
}

/// Recursive build state.
struct Builder<'a, W: ?Sized> {
    params: &'a OctreeParams,
    world: &'a W,
    nodes: Vec<OctreeNode>,
    depth: u32,
}

impl<W: CollisionWorld + ?Sized> Builder<'_, W> {
    fn build_node(&mut self, bounds: Aabb, depth: u32) -> OctreeNodeId {
        let small_enough = bounds.max_side() <= self.params.min_leaf_size + LEAF_SIZE_EPSILON;
        let kind = if small_enough || depth >= self.params.max_depth {
            self.depth = self.depth.max(depth);
            OctreeNodeKind::Leaf {
                blocked: self.world.box_overlaps(&bounds, self.params.categories),
            }
        } else {
            let children =
                std::array::from_fn(|octant| self.build_node(bounds.octant(octant), depth + 1));
            OctreeNodeKind::Internal { children }
        };
        let id = OctreeNodeId(self.nodes.len() as u32);
        self.nodes.push(OctreeNode { bounds, kind });
        id
    }
}
