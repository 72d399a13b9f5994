// Per-query view of a built volume.
//
// A `CellProbe` bundles everything a graph search needs to classify a cell:
// the cell grid, the octree (if any), the world mapping, the collision world
// and the query's filter and agent shape. Both searches (`search.rs` BFS and
// `pathfinding.rs` A*) take a probe instead of a long argument list.
//
// The two tests read different data:
// - `statically_blocked()` reads the octree, i.e. the world as it was at
//   build time. With no octree every cell is statically free.
// - `dynamically_overlapped()` places the agent capsule at the cell centre
//   and asks the live world.
//
// A probe borrows everything and holds no state, so it is created per call
// and dropped when the search returns.

use crate::collision::{Capsule, CollisionWorld, OverlapFilter};
use crate::config::AgentShape;
use crate::grid::CellGrid;
use crate::mapping::GridMapping;
use crate::octree::OcclusionOctree;
use crate::types::{CellId, GridCoord};
use glam::Vec3;

pub struct CellProbe<'a, W: ?Sized> {
    pub grid: &'a CellGrid,
    pub octree: Option<&'a OcclusionOctree>,
    pub mapping: &'a GridMapping,
    pub world: &'a W,
    pub filter: &'a OverlapFilter,
    pub agent: AgentShape,
}

impl<W: CollisionWorld + ?Sized> CellProbe<'_, W> {
    pub fn coord(&self, id: CellId) -> GridCoord {
        self.grid.coord(id)
    }

    /// World-space centre of a cell.
    pub fn center(&self, id: CellId) -> Vec3 {
        self.mapping.cell_to_world(self.grid.coord(id))
    }

    /// Cached static occlusion at the cell centre.
    pub fn statically_blocked(&self, id: CellId) -> bool {
        match self.octree {
            Some(tree) => tree.is_blocked(self.center(id)),
            None => false,
        }
    }

    /// Live capsule overlap at the cell centre.
    pub fn dynamically_overlapped(&self, id: CellId) -> bool {
        let capsule = Capsule::new(self.center(id), self.agent);
        self.world.capsule_overlaps(&capsule, self.filter)
    }

    /// Statically free and clear of live obstacles. The octree is consulted
    /// first; the live query only runs for statically free cells.
    pub fn is_free(&self, id: CellId) -> bool {
        !self.statically_blocked(id) && !self.dynamically_overlapped(id)
    }
}
