// octnav_volume: 3D grid navigation volume with octree occlusion culling.
//
// This crate turns an axis-aligned box of space into a regular grid of
// cells, links each cell to its neighbours, and caches coarse static
// occlusion in an octree. On top of that it answers two queries: the nearest
// free cell to a seed (BFS) and a waypoint path between two world points
// (A*). Both combine the cached static data with live capsule overlap tests
// against the host's collision world.
//
// Module overview:
// - `types.rs`:       GridCoord, CellId, ActorId, CategoryMask, Aabb.
// - `error.rs`:       NavError + Result alias.
// - `config.rs`:      VolumeConfig + AgentShape: all tunable parameters, JSON loading, validation.
// - `collision.rs`:   CollisionWorld trait, Capsule, OverlapFilter.
// - `scene.rs`:       ObstacleScene: in-memory box-obstacle CollisionWorld.
// - `mapping.rs`:     VolumeTransform + GridMapping: world <-> grid conversion.
// - `grid.rs`:        CellGrid: dense cell store and neighbour linking.
// - `octree.rs`:      OcclusionOctree: static occlusion cache.
// - `probe.rs`:       CellProbe: per-query cell classification.
// - `search.rs`:      BFS nearest-free-cell search.
// - `pathfinding.rs`: A* search plus PathRequest / PathOutcome types.
// - `volume.rs`:      NavVolume: lifecycle and the public query surface.
//
// The crate has no engine dependencies. Collision geometry comes in through
// the `CollisionWorld` trait on every call, so the crate can be tested,
// benchmarked and driven headless (see the `nav_query` binary).
//
// **Critical constraint: determinism.** Given the same config, world and
// query, every search returns the same result. Searches use `Vec`-indexed
// tables and explicit tie-breaking; no `HashMap` iteration order leaks into
// results.

pub mod collision;
pub mod config;
pub mod error;
pub mod grid;
pub mod mapping;
pub mod octree;
pub mod pathfinding;
pub mod probe;
pub mod scene;
pub mod search;
pub mod types;
pub mod volume;

pub use collision::{Capsule, CollisionWorld, OverlapFilter};
pub use config::{AgentShape, VolumeConfig};
pub use error::{NavError, Result};
pub use mapping::VolumeTransform;
pub use octree::OctreeStats;
pub use pathfinding::{NavPath, PathFailure, PathOutcome, PathRequest, SearchStats};
pub use scene::{Obstacle, ObstacleScene};
pub use types::{ActorId, Aabb, CategoryMask, GridCoord};
pub use volume::NavVolume;
