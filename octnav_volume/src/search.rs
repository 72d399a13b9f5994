// Nearest-free-cell search.
//
// Breadth-first search over the adjacency graph from a seed cell. Each
// dequeued cell is classified through the probe (octree first, then the live
// capsule test); the first free cell wins. Because the frontier grows in
// hop order, the result is the free cell with the fewest graph hops from the
// seed, ties going to the earlier neighbour in `NEIGHBOR_OFFSETS` order.
//
// Used by path requests to relocate a goal that sits inside an obstacle, and
// exposed directly through `NavVolume::find_nearest_free_cell()`.
//
// See also: `probe.rs` for the cell tests, `pathfinding.rs` for the A*
// search that runs after relocation.

use crate::collision::CollisionWorld;
use crate::probe::CellProbe;
use crate::types::CellId;
use std::collections::VecDeque;

/// BFS from `seed` to the nearest free cell. Returns `None` once the
/// seed's connected component is exhausted.
pub fn nearest_free_cell<W: CollisionWorld + ?Sized>(
    probe: &CellProbe<'_, W>,
    seed: CellId,
) -> Option<CellId> {
    let mut visited = vec![false; probe.grid.len()];
    let mut queue = VecDeque::new();
    visited[seed.index()] = true;
    queue.push_back(seed);

    while let Some(current) = queue.pop_front() {
        if probe.is_free(current) {
            return Some(current);
        }
        for &n in probe.grid.neighbors(current) {
            if !visited[n.index()] {
                visited[n.index()] = true;
                queue.push_back(n);
            }
        }
    }
    None
}
