// The navigation volume: lifecycle and query surface.
//
// `NavVolume` owns a validated `VolumeConfig`, the world mapping, and, once
// built, the cell grid and the occlusion octree. It is the only type a host
// needs to hold.
//
// Lifecycle:
// - `new()` validates the config and fixes the mapping. Nothing is
//   allocated yet; queries return `NavError::NotBuilt`.
// - `build()` links the cell grid and classifies the octree against the
//   collision world. Building an active volume is `NavError::AlreadyBuilt`.
// - `teardown()` drops both structures. The volume can then be rebuilt
//   (e.g. after static geometry moved).
//
// Path requests resolve world points strictly (`try_world_to_cell()`): a
// point outside the volume box is `PathFailure::StartOutsideVolume` or
// `GoalOutsideVolume`. A goal that is statically blocked or dynamically
// overlapped is relocated to the nearest free cell by BFS before A* runs.
//
// All queries take `&self`; the built structures are immutable, so one
// volume can serve many threads. The collision world is passed per call and
// is never stored.
//
// See also: `grid.rs`, `octree.rs`, `mapping.rs` for the owned structures,
// `search.rs` and `pathfinding.rs` for the two searches, `probe.rs` for the
// per-query view handed to them.

use crate::collision::CollisionWorld;
use crate::config::VolumeConfig;
use crate::error::{NavError, Result};
use crate::grid::{CellGrid, GridDims};
use crate::mapping::{GridMapping, VolumeTransform};
use crate::octree::{OcclusionOctree, OctreeParams, OctreeStats};
use crate::pathfinding::{self, NavPath, PathFailure, PathOutcome, PathRequest};
use crate::probe::CellProbe;
use crate::search;
use crate::types::{Aabb, GridCoord};
use glam::Vec3;

/// Structures that exist only while the volume is active.
#[derive(Clone, Debug)]
struct BuiltVolume {
    grid: CellGrid,
    octree: OcclusionOctree,
}

/// A 3D grid navigation volume with static occlusion culling.
#[derive(Clone, Debug)]
pub struct NavVolume {
    config: VolumeConfig,
    transform: VolumeTransform,
    mapping: GridMapping,
    built: Option<BuiltVolume>,
}

impl NavVolume {
    /// Validate `config` and place the volume. Call `build()` before
    /// querying.
    pub fn new(config: VolumeConfig, transform: VolumeTransform) -> Result<Self> {
        let config = config.validated()?;
        let mapping = GridMapping::new(&config, &transform);
        Ok(Self {
            config,
            transform,
            mapping,
            built: None,
        })
    }

    /// Build the cell grid and the occlusion octree. Static occlusion is
    /// sampled from `world` now and never again until the next build.
    pub fn build<W: CollisionWorld + ?Sized>(&mut self, world: &W) -> Result<()> {
        if self.built.is_some() {
            return Err(NavError::AlreadyBuilt);
        }

        let grid = CellGrid::build(self.mapping.dims(), self.config.min_shared_axes);
        let params = OctreeParams {
            min_leaf_size: self.config.octree_min_leaf_size,
            max_depth: self.config.octree_max_depth,
            categories: self.config.static_categories,
        };
        let octree = OcclusionOctree::build(self.mapping.volume_box(), &params, world);

        let stats = octree.stats();
        tracing::info!(
            cells = grid.len(),
            octree_nodes = stats.nodes,
            octree_leaves = stats.leaves,
            blocked_leaves = stats.blocked_leaves,
            "navigation volume built"
        );
        self.built = Some(BuiltVolume { grid, octree });
        Ok(())
    }

    /// Release the grid and the octree. Returns whether the volume was
    /// active.
    pub fn teardown(&mut self) -> bool {
        let was_active = self.built.take().is_some();
        if was_active {
            tracing::debug!("navigation volume torn down");
        }
        was_active
    }

    pub fn is_active(&self) -> bool {
        self.built.is_some()
    }

    fn active(&self) -> Result<&BuiltVolume> {
        self.built.as_ref().ok_or(NavError::NotBuilt)
    }

    // -----------------------------------------------------------------------
    // Geometry
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &VolumeConfig {
        &self.config
    }

    pub fn transform(&self) -> &VolumeTransform {
        &self.transform
    }

    pub fn mapping(&self) -> &GridMapping {
        &self.mapping
    }

    /// Grid dimensions per axis.
    pub fn grid_bounds(&self) -> GridDims {
        self.mapping.dims()
    }

    pub fn cell_count(&self) -> usize {
        self.mapping.dims().cell_count()
    }

    /// World-space size per axis.
    pub fn extent(&self) -> Vec3 {
        self.mapping.extent()
    }

    /// The volume as a world-aligned box (translation only).
    pub fn volume_box(&self) -> Aabb {
        self.mapping.volume_box()
    }

    /// Grid coordinate containing `point`, clamped into the grid.
    pub fn world_to_cell(&self, point: Vec3) -> GridCoord {
        self.mapping.world_to_cell(point)
    }

    /// Centre of a cell in world space (coordinate clamped).
    pub fn cell_to_world(&self, coord: GridCoord) -> Vec3 {
        self.mapping.cell_to_world(coord)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Cached static occlusion at `point`. An inactive volume has no octree,
    /// so every point reads as free.
    pub fn is_point_blocked(&self, point: Vec3) -> bool {
        self.built
            .as_ref()
            .is_some_and(|b| b.octree.is_blocked(point))
    }

    /// Linked neighbours of a cell. Out-of-bounds coordinates have none.
    pub fn neighbors(&self, coord: GridCoord) -> Result<Vec<GridCoord>> {
        let built = self.active()?;
        let Some(id) = built.grid.cell_id(coord) else {
            return Ok(Vec::new());
        };
        Ok(built
            .grid
            .neighbors(id)
            .iter()
            .map(|&n| built.grid.coord(n))
            .collect())
    }

    pub fn octree_stats(&self) -> Result<OctreeStats> {
        Ok(self.active()?.octree.stats())
    }

    /// Nearest cell to `seed` (in graph hops) that is statically free and
    /// clear of live obstacles for the request's agent. `Ok(None)` if the
    /// seed is out of bounds or its component has no free cell.
    pub fn find_nearest_free_cell<W: CollisionWorld + ?Sized>(
        &self,
        world: &W,
        seed: GridCoord,
        request: &PathRequest,
    ) -> Result<Option<GridCoord>> {
        let built = self.active()?;
        request.validate()?;
        let Some(seed_id) = built.grid.cell_id(seed) else {
            return Ok(None);
        };
        let probe = self.probe(built, world, request);
        Ok(search::nearest_free_cell(&probe, seed_id).map(|id| built.grid.coord(id)))
    }

    /// Find a path between two world points.
    ///
    /// Errors only for an inactive volume or a malformed request; every
    /// "no path" case is a `PathOutcome::Failed` value.
    pub fn find_path<W: CollisionWorld + ?Sized>(
        &self,
        world: &W,
        start: Vec3,
        goal: Vec3,
        request: &PathRequest,
    ) -> Result<PathOutcome> {
        let built = self.active()?;
        request.validate()?;

        let resolve = |point: Vec3| {
            self.mapping
                .try_world_to_cell(point)
                .and_then(|c| built.grid.cell_id(c))
        };
        let Some(start_id) = resolve(start) else {
            tracing::debug!(?start, "path start outside volume");
            return Ok(PathOutcome::Failed(PathFailure::StartOutsideVolume));
        };
        let Some(mut goal_id) = resolve(goal) else {
            tracing::debug!(?goal, "path goal outside volume");
            return Ok(PathOutcome::Failed(PathFailure::GoalOutsideVolume));
        };

        let probe = self.probe(built, world, request);

        let mut goal_relocated = false;
        if !probe.is_free(goal_id) {
            let Some(free) = search::nearest_free_cell(&probe, goal_id) else {
                tracing::debug!(goal = %probe.coord(goal_id), "no free cell near goal");
                return Ok(PathOutcome::Failed(PathFailure::NoFreeGoal));
            };
            tracing::debug!(
                from = %probe.coord(goal_id),
                to = %probe.coord(free),
                "goal relocated"
            );
            goal_relocated = true;
            goal_id = free;
        }

        let Some(found) = pathfinding::astar(&probe, start_id, goal_id) else {
            return Ok(PathOutcome::Failed(PathFailure::Exhausted));
        };

        let cells: Vec<GridCoord> = found.cells.iter().map(|&id| probe.coord(id)).collect();
        let waypoints = cells.iter().map(|&c| self.mapping.cell_to_world(c)).collect();
        Ok(PathOutcome::Found(NavPath {
            cells,
            waypoints,
            cost: found.total_cost,
            goal_relocated,
            stats: found.stats,
        }))
    }

    fn probe<'a, W: CollisionWorld + ?Sized>(
        &'a self,
        built: &'a BuiltVolume,
        world: &'a W,
        request: &'a PathRequest,
    ) -> CellProbe<'a, W> {
        CellProbe {
            grid: &built.grid,
            octree: Some(&built.octree),
            mapping: &self.mapping,
            world,
            filter: &request.filter,
            agent: request.agent.unwrap_or(self.config.default_agent),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::OverlapFilter;
    use crate::scene::ObstacleScene;
    use crate::types::{ActorId, CategoryMask};
    use glam::Quat;

    fn built(side: u32, scene: &ObstacleScene) -> NavVolume {
        let config = VolumeConfig::with_grid((side, side, side), 100.0);
        let mut volume = NavVolume::new(config, VolumeTransform::default()).unwrap();
        volume.build(scene).unwrap();
        volume
    }

    fn dynamic() -> PathRequest {
        PathRequest::new(CategoryMask::WORLD_DYNAMIC)
    }

    fn centre(x: i32, y: i32, z: i32) -> Vec3 {
        Vec3::new(x as f32, y as f32, z as f32) * 100.0 + Vec3::splat(50.0)
    }

    fn fill_cell(scene: &mut ObstacleScene, id: u64, c: (i32, i32, i32), cat: CategoryMask) {
        let min = Vec3::new(c.0 as f32, c.1 as f32, c.2 as f32) * 100.0;
        scene.add_box(ActorId(id), min, min + Vec3::splat(100.0), cat);
    }

    #[test]
    fn volume_is_sync() {
        fn assert_sync<T: Sync + Send>() {}
        assert_sync::<NavVolume>();
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let config = VolumeConfig::with_grid((0, 4, 4), 100.0);
        let err = NavVolume::new(config, VolumeTransform::default()).unwrap_err();
        assert!(matches!(err, NavError::InvalidDimensions { .. }));
    }

    #[test]
    fn lifecycle() {
        let scene = ObstacleScene::new();
        let config = VolumeConfig::with_grid((3, 3, 3), 100.0);
        let mut volume = NavVolume::new(config, VolumeTransform::default()).unwrap();
        assert!(!volume.is_active());
        assert!(matches!(volume.octree_stats(), Err(NavError::NotBuilt)));
        assert!(matches!(
            volume.find_path(&scene, Vec3::ZERO, Vec3::ONE, &dynamic()),
            Err(NavError::NotBuilt)
        ));

        volume.build(&scene).unwrap();
        assert!(volume.is_active());
        assert!(matches!(volume.build(&scene), Err(NavError::AlreadyBuilt)));

        assert!(volume.teardown());
        assert!(!volume.teardown());
        assert!(matches!(
            volume.find_nearest_free_cell(&scene, GridCoord::new(0, 0, 0), &dynamic()),
            Err(NavError::NotBuilt)
        ));
        volume.build(&scene).unwrap();
        assert!(volume.is_active());
    }

    #[test]
    fn unbuilt_volume_reports_points_free() {
        let mut scene = ObstacleScene::new();
        fill_cell(&mut scene, 1, (0, 0, 0), CategoryMask::WORLD_STATIC);
        let config = VolumeConfig::with_grid((2, 2, 2), 100.0);
        let mut volume = NavVolume::new(config, VolumeTransform::default()).unwrap();
        assert!(!volume.is_point_blocked(centre(0, 0, 0)));
        volume.build(&scene).unwrap();
        assert!(volume.is_point_blocked(centre(0, 0, 0)));
        assert!(!volume.is_point_blocked(centre(1, 1, 1)));
    }

    #[test]
    fn geometry_accessors() {
        let config = VolumeConfig::with_grid((4, 2, 3), 50.0);
        let transform = VolumeTransform::from_translation(Vec3::new(10.0, 20.0, 30.0));
        let volume = NavVolume::new(config, transform).unwrap();
        assert_eq!(volume.grid_bounds(), GridDims::new(4, 2, 3));
        assert_eq!(volume.cell_count(), 24);
        assert_eq!(volume.extent(), Vec3::new(200.0, 100.0, 150.0));
        assert_eq!(volume.volume_box().min, Vec3::new(10.0, 20.0, 30.0));
        assert_eq!(volume.volume_box().max, Vec3::new(210.0, 120.0, 180.0));
        assert_eq!(
            volume.cell_to_world(GridCoord::new(0, 0, 0)),
            Vec3::new(35.0, 45.0, 55.0)
        );
        assert_eq!(
            volume.world_to_cell(Vec3::new(209.0, 119.0, 179.0)),
            GridCoord::new(3, 1, 2)
        );
    }

    #[test]
    fn rotation_and_scale_are_ignored() {
        let config = VolumeConfig::with_grid((2, 2, 2), 100.0);
        let transform = VolumeTransform {
            translation: Vec3::ZERO,
            rotation: Quat::from_rotation_z(0.7),
            scale: Vec3::splat(2.0),
        };
        let volume = NavVolume::new(config, transform).unwrap();
        assert_eq!(volume.volume_box().max, Vec3::splat(200.0));
        assert_eq!(volume.cell_to_world(GridCoord::new(1, 1, 1)), Vec3::splat(150.0));
    }

    #[test]
    fn neighbors_accessor() {
        let scene = ObstacleScene::new();
        let volume = built(3, &scene);
        assert_eq!(volume.neighbors(GridCoord::new(0, 0, 0)).unwrap().len(), 7);
        assert_eq!(volume.neighbors(GridCoord::new(1, 1, 1)).unwrap().len(), 26);
        assert!(volume.neighbors(GridCoord::new(5, 0, 0)).unwrap().is_empty());
    }

    #[test]
    fn diagonal_path_on_empty_grid() {
        let scene = ObstacleScene::new();
        let volume = built(5, &scene);
        let outcome = volume
            .find_path(&scene, centre(0, 0, 0), centre(4, 4, 4), &dynamic())
            .unwrap();
        let path = outcome.path().unwrap();
        assert_eq!(path.waypoints.first(), Some(&centre(0, 0, 0)));
        assert_eq!(path.waypoints.last(), Some(&centre(4, 4, 4)));
        assert!(!path.goal_relocated);
        let expected = path.cost * volume.mapping().cell_size();
        assert!((path.world_length() - expected).abs() < 1e-2);
    }

    #[test]
    fn same_cell_path_is_one_waypoint() {
        let scene = ObstacleScene::new();
        let volume = built(3, &scene);
        let outcome = volume
            .find_path(
                &scene,
                Vec3::new(110.0, 120.0, 130.0),
                Vec3::new(190.0, 180.0, 170.0),
                &dynamic(),
            )
            .unwrap();
        assert_eq!(outcome.waypoints(), &[centre(1, 1, 1)]);
        assert_eq!(outcome.path().unwrap().cost, 0.0);
    }

    #[test]
    fn points_outside_volume_fail_resolution() {
        let scene = ObstacleScene::new();
        let volume = built(3, &scene);
        let outside = Vec3::new(-10.0, 50.0, 50.0);
        let inside = centre(1, 1, 1);
        let r = volume.find_path(&scene, outside, inside, &dynamic()).unwrap();
        assert_eq!(r.failure(), Some(PathFailure::StartOutsideVolume));
        let r = volume.find_path(&scene, inside, outside, &dynamic()).unwrap();
        assert_eq!(r.failure(), Some(PathFailure::GoalOutsideVolume));
    }

    #[test]
    fn blocked_goal_is_relocated_to_nearest_free_cell() {
        let mut scene = ObstacleScene::new();
        fill_cell(&mut scene, 1, (3, 3, 3), CategoryMask::WORLD_STATIC);
        let volume = built(4, &scene);
        let request = dynamic();

        let expected = volume
            .find_nearest_free_cell(&scene, GridCoord::new(3, 3, 3), &request)
            .unwrap()
            .unwrap();
        assert_ne!(expected, GridCoord::new(3, 3, 3));

        let outcome = volume
            .find_path(&scene, centre(0, 0, 0), centre(3, 3, 3), &request)
            .unwrap();
        let path = outcome.path().unwrap();
        assert!(path.goal_relocated);
        assert_eq!(path.cells.last(), Some(&expected));
        assert_eq!(path.waypoints.last(), Some(&volume.cell_to_world(expected)));
    }

    #[test]
    fn enclosed_goal_fails_both_operations() {
        let mut scene = ObstacleScene::new();
        // Everything is covered by a live obstacle.
        scene.add_box(
            ActorId(1),
            Vec3::splat(-10.0),
            Vec3::splat(310.0),
            CategoryMask::WORLD_DYNAMIC,
        );
        let volume = built(3, &scene);
        let request = dynamic();
        assert_eq!(
            volume
                .find_nearest_free_cell(&scene, GridCoord::new(1, 1, 1), &request)
                .unwrap(),
            None
        );
        let outcome = volume
            .find_path(&scene, centre(0, 0, 0), centre(2, 2, 2), &request)
            .unwrap();
        assert_eq!(outcome.failure(), Some(PathFailure::NoFreeGoal));
    }

    #[test]
    fn separated_start_exhausts_search() {
        let mut scene = ObstacleScene::new();
        // Solid static wall across x = 2.
        scene.add_box(
            ActorId(1),
            Vec3::new(200.0, 0.0, 0.0),
            Vec3::new(300.0, 400.0, 400.0),
            CategoryMask::WORLD_STATIC,
        );
        let volume = built(4, &scene);
        let outcome = volume
            .find_path(&scene, centre(0, 1, 1), centre(3, 1, 1), &dynamic())
            .unwrap();
        assert_eq!(outcome.failure(), Some(PathFailure::Exhausted));
    }

    #[test]
    fn invalid_seed_is_not_found() {
        let scene = ObstacleScene::new();
        let volume = built(3, &scene);
        let found = volume
            .find_nearest_free_cell(&scene, GridCoord::new(-1, 0, 0), &dynamic())
            .unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn malformed_filter_rejects_query() {
        let scene = ObstacleScene::new();
        let volume = built(3, &scene);
        let request =
            PathRequest::with_filter(OverlapFilter::new(CategoryMask::PAWN).with_class(" "));
        let err = volume
            .find_path(&scene, centre(0, 0, 0), centre(2, 2, 2), &request)
            .unwrap_err();
        assert!(matches!(err, NavError::EmptyClassFilter));
    }

    #[test]
    fn identical_requests_give_identical_paths() {
        let mut scene = ObstacleScene::new();
        fill_cell(&mut scene, 1, (2, 2, 2), CategoryMask::WORLD_STATIC);
        fill_cell(&mut scene, 2, (1, 2, 2), CategoryMask::WORLD_DYNAMIC);
        let volume = built(5, &scene);
        let a = volume
            .find_path(&scene, centre(0, 2, 2), centre(4, 2, 2), &dynamic())
            .unwrap();
        let b = volume
            .find_path(&scene, centre(0, 2, 2), centre(4, 2, 2), &dynamic())
            .unwrap();
        assert!(a.is_success());
        assert_eq!(a.waypoints(), b.waypoints());
    }
}
