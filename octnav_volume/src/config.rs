// Data-driven volume configuration.
//
// All tunable parameters of a navigation volume live in `VolumeConfig`,
// loadable from JSON. The volume never uses magic numbers; it reads from
// the config. A config is fixed for the lifetime of a built volume;
// changing any value requires `teardown()` + `build()`.
//
// `validated()` is the single gate between user-supplied values and the
// build: it rejects values that cannot produce a grid (zero dimensions,
// non-positive cell size, out-of-range connectivity or depth) and
// normalises the rest (octree leaf size is clamped up to the cell size, so
// no leaf is ever finer than a grid cell).
//
// See also: `volume.rs` which owns the validated config, `grid.rs` and
// `octree.rs` which consume it, `error.rs` for the rejection variants.

use crate::error::{NavError, Result};
use crate::types::CategoryMask;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest accepted octree depth.
pub const MAX_OCTREE_DEPTH: u32 = 10;

/// Vertical capsule approximating an agent for live overlap tests.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentShape {
    /// Capsule radius in world units.
    pub radius: f32,
    /// Half of the capsule's total height (hemispheres included).
    pub half_height: f32,
}

impl AgentShape {
    pub const fn new(radius: f32, half_height: f32) -> Self {
        Self {
            radius,
            half_height,
        }
    }

    /// Reject negative or non-finite dimensions.
    pub fn validate(self) -> Result<Self> {
        let ok = self.radius.is_finite()
            && self.half_height.is_finite()
            && self.radius >= 0.0
            && self.half_height >= 0.0;
        if ok {
            Ok(self)
        } else {
            Err(NavError::InvalidAgentShape {
                radius: self.radius,
                half_height: self.half_height,
            })
        }
    }
}

impl Default for AgentShape {
    fn default() -> Self {
        Self::new(34.0, 44.0)
    }
}

/// Navigation volume configuration. Loaded from JSON, never mutated while
/// the volume is active.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VolumeConfig {
    /// Number of cells along each axis (x, y, z).
    pub dimensions: (u32, u32, u32),

    /// Edge length of one cubic cell in world units.
    pub cell_size: f32,

    /// Minimum number of coordinate axes two cells must share to be linked.
    /// 0 = 26-connected, 1 = 18-connected, 2 = 6-connected.
    pub min_shared_axes: u8,

    /// Octree nodes whose longest side is at or below this size become
    /// leaves. Clamped up to `cell_size` by `validated()`.
    pub octree_min_leaf_size: f32,

    /// Depth at which octree subdivision stops regardless of size (1–10).
    pub octree_max_depth: u32,

    /// Obstacle categories that count as static occlusion when the octree
    /// leaves are classified at build time.
    pub static_categories: CategoryMask,

    /// Agent capsule used when a query does not specify one.
    pub default_agent: AgentShape,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            dimensions: (10, 10, 10),
            cell_size: 100.0,
            min_shared_axes: 0,
            octree_min_leaf_size: 100.0,
            octree_max_depth: 5,
            static_categories: CategoryMask::WORLD_STATIC,
            default_agent: AgentShape::default(),
        }
    }
}

impl VolumeConfig {
    /// A default config with the given dimensions and cell size.
    pub fn with_grid(dimensions: (u32, u32, u32), cell_size: f32) -> Self {
        Self {
            dimensions,
            cell_size,
            octree_min_leaf_size: cell_size,
            ..Self::default()
        }
    }

    /// Parse a config from a JSON string. The result is not yet validated.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON config file. The result is not yet validated.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Total number of cells in the grid.
    pub fn cell_count(&self) -> usize {
        let (x, y, z) = self.dimensions;
        x as usize * y as usize * z as usize
    }

    /// World-space size of the grid along each axis.
    pub fn extent(&self) -> (f32, f32, f32) {
        let (x, y, z) = self.dimensions;
        (
            x as f32 * self.cell_size,
            y as f32 * self.cell_size,
            z as f32 * self.cell_size,
        )
    }

    /// Check every value and return a normalised copy.
    pub fn validated(&self) -> Result<Self> {
        let (x, y, z) = self.dimensions;
        let count = u64::from(x) * u64::from(y) * u64::from(z);
        let axis_ok = |d: u32| (1..=i32::MAX as u32).contains(&d);
        if !(axis_ok(x) && axis_ok(y) && axis_ok(z)) || count > u64::from(u32::MAX) {
            return Err(NavError::InvalidDimensions { x, y, z });
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(NavError::InvalidCellSize(self.cell_size));
        }
        if self.min_shared_axes > 2 {
            return Err(NavError::InvalidConnectivity(self.min_shared_axes));
        }
        if !(1..=MAX_OCTREE_DEPTH).contains(&self.octree_max_depth) {
            return Err(NavError::InvalidOctreeDepth(self.octree_max_depth));
        }
        if self.octree_min_leaf_size.is_nan() {
            return Err(NavError::InvalidLeafSize(self.octree_min_leaf_size));
        }
        self.default_agent.validate()?;

        let mut config = self.clone();
        if config.octree_min_leaf_size < config.cell_size {
            tracing::debug!(
                requested = config.octree_min_leaf_size,
                cell_size = config.cell_size,
                "octree min leaf size clamped up to cell size"
            );
            config.octree_min_leaf_size = config.cell_size;
        }
        Ok(config)
    }
}
