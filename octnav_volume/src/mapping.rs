// World ↔ grid coordinate mapping.
//
// A volume occupies the local box `[0, dims * cell_size]` shifted into the
// world by its transform's translation. Rotation and scale are not
// supported: the volume is always axis-aligned in world space. A transform
// carrying either is accepted with a `warn!` and only its translation is
// applied.
//
// Conversions:
// - `world_to_cell()`: floor(local / cell_size), clamped into the grid.
// - `try_world_to_cell()`: same, but `None` for points outside the volume
//   box (used by path requests, where a far-away point is a resolution
//   failure rather than something to silently snap).
// - `cell_to_world()`: clamps the coordinate, returns the cell centre.
//
// See also: `grid.rs` for `GridDims` (bounds checks and flat indexing),
// `volume.rs` which owns the mapping.

use crate::config::VolumeConfig;
use crate::grid::GridDims;
use crate::types::{Aabb, GridCoord};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Placement of a volume in the world. Only `translation` is applied.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VolumeTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for VolumeTransform {
    fn default() -> Self {
        Self::from_translation(Vec3::ZERO)
    }
}

impl VolumeTransform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    pub fn has_rotation(&self) -> bool {
        !self.rotation.is_near_identity()
    }

    pub fn has_scale(&self) -> bool {
        !self.scale.abs_diff_eq(Vec3::ONE, 1e-4)
    }
}

/// Conversion between world positions and grid coordinates for one volume.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridMapping {
    dims: GridDims,
    cell_size: f32,
    origin: Vec3,
}

impl GridMapping {
    /// Build the mapping for a validated config. Rotation and scale in
    /// `transform` are reported and dropped.
    pub fn new(config: &VolumeConfig, transform: &VolumeTransform) -> Self {
        if transform.has_rotation() {
            tracing::warn!("navigation volume rotation is ignored; keep the volume unrotated");
        }
        if transform.has_scale() {
            tracing::warn!(
                scale = ?transform.scale,
                "navigation volume scale is ignored; keep scale = (1, 1, 1)"
            );
        }
        Self {
            dims: GridDims::from_config(config),
            cell_size: config.cell_size,
            origin: transform.translation,
        }
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// World-space size of the grid.
    pub fn extent(&self) -> Vec3 {
        Vec3::new(
            self.dims.x as f32,
            self.dims.y as f32,
            self.dims.z as f32,
        ) * self.cell_size
    }

    /// The whole volume as a world-aligned box (translation only).
    pub fn volume_box(&self) -> Aabb {
        Aabb::new(Vec3::ZERO, self.extent()).translated(self.origin)
    }

    /// World-space box of one cell (coordinate clamped).
    pub fn cell_bounds(&self, coord: GridCoord) -> Aabb {
        let half = Vec3::splat(self.cell_size * 0.5);
        Aabb::from_center_half_extents(self.cell_to_world(coord), half)
    }

    /// Grid coordinate containing `point`, clamped into the grid.
    pub fn world_to_cell(&self, point: Vec3) -> GridCoord {
        let local = (point - self.origin) / self.cell_size;
        self.dims.clamp(GridCoord::new(
            local.x.floor() as i32,
            local.y.floor() as i32,
            local.z.floor() as i32,
        ))
    }

    /// Grid coordinate containing `point`, or `None` if the point lies
    /// outside the volume box. Points on the far faces belong to the last
    /// cell on that axis.
    pub fn try_world_to_cell(&self, point: Vec3) -> Option<GridCoord> {
        if !self.volume_box().contains_point(point) {
            return None;
        }
        Some(self.world_to_cell(point))
    }

    /// World position of the centre of `coord` (clamped into the grid).
    pub fn cell_to_world(&self, coord: GridCoord) -> Vec3 {
        let c = self.dims.clamp(coord);
        let local = Vec3::new(c.x as f32, c.y as f32, c.z as f32) * self.cell_size
            + Vec3::splat(self.cell_size * 0.5);
        self.origin + local
    }
}
