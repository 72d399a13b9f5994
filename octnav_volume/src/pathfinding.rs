// A* pathfinding over the cell grid.
//
// Implements A* using a `BinaryHeap` (min-heap via reversed ordering). Scores
// and came-from data are stored in `Vec`s indexed by `CellId` for O(1)
// access; cells themselves stay read-only, so any number of searches can run
// against one built volume.
//
// Edge cost and heuristic are both the Euclidean distance between grid
// coordinates (1, √2 or √3 per step), so the heuristic is consistent and the
// returned cost is in cell units. Multiply by the cell size for world units.
//
// Per neighbour the order of checks is:
// 1. skip closed cells;
// 2. skip cells the octree marks as statically blocked;
// 3. compute the tentative g and stop unless it strictly improves;
// 4. only then run the live capsule overlap test, skipping on overlap.
// The live test never runs for an edge that cannot change the result.
//
// This module also defines the request/outcome types of a path query. "No
// path" is a `PathFailure` value, never an error.
//
// See also: `probe.rs` for the cell tests, `search.rs` for the BFS used to
// relocate a blocked goal, `volume.rs` which resolves world points and turns
// cell paths into waypoints.
//
// **Critical constraint: determinism.** A* is a pure function of the grid,
// the octree, the live world and the start/goal cells. Equal f-scores are
// broken by the lower cell index, and `total_cmp` orders the floats.

use crate::collision::{CollisionWorld, OverlapFilter};
use crate::config::AgentShape;
use crate::error::Result;
use crate::probe::CellProbe;
use crate::types::{CategoryMask, CellId, GridCoord};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

// ---------------------------------------------------------------------------
// Requests and outcomes
// ---------------------------------------------------------------------------

/// Per-query parameters for path and nearest-free-cell requests.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PathRequest {
    /// Live obstacle filter for capsule tests.
    #[serde(default)]
    pub filter: OverlapFilter,
    /// Agent capsule. `None` uses the volume's configured default agent.
    #[serde(default)]
    pub agent: Option<AgentShape>,
}

impl PathRequest {
    pub fn new(categories: CategoryMask) -> Self {
        Self {
            filter: OverlapFilter::new(categories),
            agent: None,
        }
    }

    pub fn with_filter(filter: OverlapFilter) -> Self {
        Self {
            filter,
            agent: None,
        }
    }

    pub fn with_agent(mut self, agent: AgentShape) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Check the filter and agent before any search work.
    pub fn validate(&self) -> Result<()> {
        self.filter.validate()?;
        if let Some(agent) = self.agent {
            agent.validate()?;
        }
        Ok(())
    }
}

/// Why a path request produced no path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathFailure {
    /// The start point lies outside the volume box.
    StartOutsideVolume,
    /// The goal point lies outside the volume box.
    GoalOutsideVolume,
    /// The goal was blocked and no free cell is reachable from it.
    NoFreeGoal,
    /// The open set ran dry before reaching the goal.
    Exhausted,
}

impl fmt::Display for PathFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            PathFailure::StartOutsideVolume => "start is outside the navigation volume",
            PathFailure::GoalOutsideVolume => "goal is outside the navigation volume",
            PathFailure::NoFreeGoal => "no free cell near the goal",
            PathFailure::Exhausted => "no path between start and goal",
        };
        f.write_str(msg)
    }
}

/// Counters collected during one A* run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Cells popped and closed.
    pub expanded: usize,
    /// Neighbours skipped because the octree marks them blocked.
    pub static_rejections: usize,
    /// Live capsule tests issued.
    pub overlap_queries: usize,
}

/// A found path in grid and world space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NavPath {
    /// Cells from start to goal (inclusive).
    pub cells: Vec<GridCoord>,
    /// Cell centres, one per entry in `cells`.
    pub waypoints: Vec<Vec3>,
    /// Total A* cost in cell units.
    pub cost: f32,
    /// Whether the goal was moved off a blocked cell.
    pub goal_relocated: bool,
    pub stats: SearchStats,
}

impl NavPath {
    /// Summed length of the waypoint polyline in world units.
    pub fn world_length(&self) -> f32 {
        self.waypoints
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum()
    }
}

/// Result of a path request that passed validation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PathOutcome {
    Found(NavPath),
    Failed(PathFailure),
}

impl PathOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PathOutcome::Found(_))
    }

    pub fn path(&self) -> Option<&NavPath> {
        match self {
            PathOutcome::Found(path) => Some(path),
            PathOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<PathFailure> {
        match self {
            PathOutcome::Found(_) => None,
            PathOutcome::Failed(reason) => Some(*reason),
        }
    }

    /// Waypoints of a found path, empty on failure.
    pub fn waypoints(&self) -> &[Vec3] {
        match self {
            PathOutcome::Found(path) => &path.waypoints,
            PathOutcome::Failed(_) => &[],
        }
    }
}

// ---------------------------------------------------------------------------
// A*
// ---------------------------------------------------------------------------

/// The result of a successful A* search, in cell ids.
#[derive(Clone, Debug)]
pub struct CellPath {
    /// Sequence of cells from start to goal (inclusive).
    pub cells: Vec<CellId>,
    /// Total traversal cost in cell units.
    pub total_cost: f32,
    pub stats: SearchStats,
}

/// Entry in the A* open set (min-heap via reversed ordering).
struct OpenEntry {
    cell: CellId,
    f_score: f32,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f_score.total_cmp(&other.f_score) == Ordering::Equal && self.cell == other.cell
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap: smallest f_score is "greatest", and on equal
        // f the lower cell index is "greatest".
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.cell.0.cmp(&self.cell.0))
    }
}

/// Find the cheapest path from `start` to `goal` using A*.
///
/// Returns `None` if the open set is exhausted. The start cell itself is
/// never tested; the goal should already be free (see
/// `search::nearest_free_cell()`).
pub fn astar<W: CollisionWorld + ?Sized>(
    probe: &CellProbe<'_, W>,
    start: CellId,
    goal: CellId,
) -> Option<CellPath> {
    let mut stats = SearchStats::default();
    if start == goal {
        return Some(CellPath {
            cells: vec![start],
            total_cost: 0.0,
            stats,
        });
    }

    let n = probe.grid.len();
    let goal_coord = probe.coord(goal);
    // g_score[cell] = cost of cheapest known path from start to cell.
    let mut g_score = vec![f32::INFINITY; n];
    let mut came_from: Vec<Option<CellId>> = vec![None; n];
    let mut closed = vec![false; n];

    g_score[start.index()] = 0.0;

    let mut open = BinaryHeap::new();
    open.push(OpenEntry {
        cell: start,
        f_score: probe.coord(start).distance(goal_coord),
    });

    while let Some(current) = open.pop() {
        let current_id = current.cell;
        let ci = current_id.index();

        if current_id == goal {
            return Some(reconstruct_path(&came_from, start, goal, g_score[ci], stats));
        }

        if closed[ci] {
            continue;
        }
        closed[ci] = true;
        stats.expanded += 1;

        let current_g = g_score[ci];
        let current_coord = probe.coord(current_id);

        for &neighbor in probe.grid.neighbors(current_id) {
            let ni = neighbor.index();
            if closed[ni] {
                continue;
            }
            if probe.statically_blocked(neighbor) {
                stats.static_rejections += 1;
                continue;
            }

            let neighbor_coord = probe.coord(neighbor);
            let tentative_g = current_g + current_coord.distance(neighbor_coord);
            if tentative_g >= g_score[ni] {
                continue;
            }

            stats.overlap_queries += 1;
            if probe.dynamically_overlapped(neighbor) {
                continue;
            }

            g_score[ni] = tentative_g;
            came_from[ni] = Some(current_id);
            open.push(OpenEntry {
                cell: neighbor,
                f_score: tentative_g + neighbor_coord.distance(goal_coord),
            });
        }
    }

    tracing::debug!(
        start = %probe.coord(start),
        goal = %goal_coord,
        expanded = stats.expanded,
        "A* open set exhausted"
    );
    None
}

/// Walk came-from links back from the goal, then reverse.
fn reconstruct_path(
    came_from: &[Option<CellId>],
    start: CellId,
    goal: CellId,
    total_cost: f32,
    stats: SearchStats,
) -> CellPath {
    let mut cells = Vec::new();
    let mut current = goal;

    loop {
        cells.push(current);
        if current == start {
            break;
        }
        match came_from[current.index()] {
            Some(prev) => current = prev,
            None => break,
        }
    }

    cells.reverse();

    CellPath {
        cells,
        total_cost,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NavError;
    use crate::scene::ObstacleScene;
    use crate::search::tests::{Fixture, cell_box};

    fn coords(fx: &Fixture, path: &CellPath) -> Vec<GridCoord> {
        path.cells.iter().map(|&c| fx.grid.coord(c)).collect()
    }

    #[test]
    fn trivial_path() {
        let scene = ObstacleScene::new();
        let fx = Fixture::new(3, 0, &scene);
        let a = fx.id(1, 1, 1);
        let path = astar(&fx.probe(&scene), a, a).unwrap();
        assert_eq!(path.cells, vec![a]);
        assert_eq!(path.total_cost, 0.0);
        assert_eq!(path.stats, SearchStats::default());
    }

    #[test]
    fn straight_line_on_six_connected_grid() {
        let scene = ObstacleScene::new();
        let fx = Fixture::new(5, 2, &scene);
        let path = astar(&fx.probe(&scene), fx.id(0, 2, 2), fx.id(4, 2, 2)).unwrap();
        assert_eq!(path.cells.len(), 5);
        assert_eq!(path.total_cost, 4.0);
        for (i, c) in coords(&fx, &path).iter().enumerate() {
            assert_eq!(*c, GridCoord::new(i as i32, 2, 2));
        }
    }

    #[test]
    fn full_diagonal_uses_corner_steps() {
        let scene = ObstacleScene::new();
        let fx = Fixture::new(5, 0, &scene);
        let path = astar(&fx.probe(&scene), fx.id(0, 0, 0), fx.id(4, 4, 4)).unwrap();
        assert_eq!(path.cells.len(), 5);
        assert!((path.total_cost - 4.0 * 3f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn detours_around_static_wall() {
        let mut scene = ObstacleScene::new();
        // Wall across x = 2 with a gap at y = 3.
        cell_box(&mut scene, 1, (2, 0, 0), (2, 2, 3), CategoryMask::WORLD_STATIC);
        let fx = Fixture::new(4, 2, &scene);
        let path = astar(&fx.probe(&scene), fx.id(0, 0, 0), fx.id(3, 0, 0)).unwrap();
        let cells = coords(&fx, &path);
        assert!(cells.iter().any(|c| c.x == 2 && c.y == 3));
        assert!(path.stats.static_rejections > 0);
        // 3 along x, 3 up and 3 back down in y.
        assert_eq!(path.total_cost, 9.0);
    }

    #[test]
    fn dynamic_obstacle_blocks_edges() {
        let mut scene = ObstacleScene::new();
        cell_box(&mut scene, 1, (2, 0, 0), (2, 3, 3), CategoryMask::WORLD_DYNAMIC);
        let fx = Fixture::new(4, 0, &scene);
        let probe = fx.probe(&scene);
        assert!(astar(&probe, fx.id(0, 0, 0), fx.id(3, 0, 0)).is_none());
    }

    #[test]
    fn overlap_tests_only_run_on_improvement() {
        let scene = ObstacleScene::new();
        let fx = Fixture::new(4, 0, &scene);
        let path = astar(&fx.probe(&scene), fx.id(0, 0, 0), fx.id(3, 3, 3)).unwrap();
        // Expands (0,0,0), (1,1,1), (2,2,2). Queries: 7 corner neighbours,
        // then 19 and 19 new cells; the 6 already-scored cells around each
        // diagonal step never improve, so they are never re-tested.
        assert_eq!(path.stats.expanded, 3);
        assert_eq!(path.stats.overlap_queries, 7 + 19 + 19);
    }

    #[test]
    fn deterministic() {
        let mut scene = ObstacleScene::new();
        cell_box(&mut scene, 1, (1, 1, 0), (2, 2, 3), CategoryMask::WORLD_STATIC);
        let fx = Fixture::new(4, 1, &scene);
        let probe = fx.probe(&scene);
        let r1 = astar(&probe, fx.id(0, 0, 0), fx.id(3, 3, 3)).unwrap();
        let r2 = astar(&probe, fx.id(0, 0, 0), fx.id(3, 3, 3)).unwrap();
        assert_eq!(r1.cells, r2.cells);
        assert_eq!(r1.total_cost, r2.total_cost);
    }

    #[test]
    fn open_entry_tie_breaks_on_lower_cell() {
        let mut heap = BinaryHeap::new();
        heap.push(OpenEntry {
            cell: CellId(9),
            f_score: 2.0,
        });
        heap.push(OpenEntry {
            cell: CellId(4),
            f_score: 2.0,
        });
        heap.push(OpenEntry {
            cell: CellId(1),
            f_score: 3.0,
        });
        let order: Vec<u32> = std::iter::from_fn(|| heap.pop().map(|e| e.cell.0)).collect();
        assert_eq!(order, vec![4, 9, 1]);
    }

    #[test]
    fn request_validation() {
        let bad = PathRequest::with_filter(OverlapFilter::new(CategoryMask::PAWN).with_class(""));
        assert!(matches!(bad.validate(), Err(NavError::EmptyClassFilter)));

        let bad = PathRequest::new(CategoryMask::PAWN).with_agent(AgentShape::new(f32::NAN, 1.0));
        assert!(matches!(bad.validate(), Err(NavError::InvalidAgentShape { .. })));

        assert!(PathRequest::default().validate().is_ok());
    }

    #[test]
    fn outcome_accessors() {
        let failed = PathOutcome::Failed(PathFailure::NoFreeGoal);
        assert!(!failed.is_success());
        assert!(failed.waypoints().is_empty());
        assert_eq!(failed.failure(), Some(PathFailure::NoFreeGoal));
        assert_eq!(failed.failure().unwrap().to_string(), "no free cell near the goal");

        let path = NavPath {
            cells: vec![GridCoord::new(0, 0, 0), GridCoord::new(1, 0, 0)],
            waypoints: vec![Vec3::splat(50.0), Vec3::new(150.0, 50.0, 50.0)],
            cost: 1.0,
            goal_relocated: false,
            stats: SearchStats::default(),
        };
        assert_eq!(path.world_length(), 100.0);
        let found = PathOutcome::Found(path);
        assert!(found.is_success());
        assert_eq!(found.waypoints().len(), 2);
    }
}
