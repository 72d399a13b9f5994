// Dense cell store and adjacency builder.
//
// Every grid position gets exactly one `Cell` in a flat `Vec<Cell>` indexed
// by `x + y * dim_x + z * dim_x * dim_y`. A cell stores its coordinate and
// the `CellId`s of its neighbours; links are integer indices into the same
// array, so the grid is a plain value that can be cloned, moved or
// serialised.
//
// Adjacency is built once per volume activation. For each cell, each of the
// 26 offsets in `NEIGHBOR_OFFSETS` is tried; out-of-bounds candidates are
// dropped, and a candidate is linked only if the number of axes it shares
// with the cell is at least `min_shared_axes`:
//
//   min_shared_axes = 0 → 26-connected (faces, edges, corners)
//   min_shared_axes = 1 → 18-connected (faces, edges)
//   min_shared_axes = 2 →  6-connected (faces only)
//
// Links are computed per cell without mirroring. Both the bounds check and
// the shared-axis count are symmetric, so on a box grid every link has its
// reverse; the tests pin that down rather than forcing it.
//
// See also: `mapping.rs` for world ↔ grid conversion, `search.rs` and
// `pathfinding.rs` which walk the neighbour lists.

use crate::config::VolumeConfig;
use crate::types::{CellId, GridCoord};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// The 26 neighbour offsets, grouped by layer (z + 1, z, z − 1).
pub const NEIGHBOR_OFFSETS: [(i32, i32, i32); 26] = [
    // Above (z + 1)
    (1, -1, 1),
    (1, 0, 1),
    (1, 1, 1),
    (0, -1, 1),
    (0, 0, 1),
    (0, 1, 1),
    (-1, -1, 1),
    (-1, 0, 1),
    (-1, 1, 1),
    // Same layer (z)
    (1, -1, 0),
    (1, 0, 0),
    (1, 1, 0),
    (0, -1, 0),
    (0, 1, 0),
    (-1, -1, 0),
    (-1, 0, 0),
    (-1, 1, 0),
    // Below (z − 1)
    (1, -1, -1),
    (1, 0, -1),
    (1, 1, -1),
    (0, -1, -1),
    (0, 0, -1),
    (0, 1, -1),
    (-1, -1, -1),
    (-1, 0, -1),
    (-1, 1, -1),
];

/// Grid dimensions with bounds checks and flat indexing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDims {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GridDims {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Dimensions of a validated config.
    pub fn from_config(config: &VolumeConfig) -> Self {
        let (x, y, z) = config.dimensions;
        Self::new(x as i32, y as i32, z as i32)
    }

    pub fn cell_count(&self) -> usize {
        self.x as usize * self.y as usize * self.z as usize
    }

    /// Check whether a coordinate is inside the grid.
    pub fn in_bounds(&self, c: GridCoord) -> bool {
        c.x >= 0 && c.x < self.x && c.y >= 0 && c.y < self.y && c.z >= 0 && c.z < self.z
    }

    /// Clamp each component into `[0, dim - 1]`.
    pub fn clamp(&self, c: GridCoord) -> GridCoord {
        GridCoord::new(
            c.x.clamp(0, self.x - 1),
            c.y.clamp(0, self.y - 1),
            c.z.clamp(0, self.z - 1),
        )
    }

    /// Flat index of a coordinate. Returns `None` if out of bounds.
    pub fn index(&self, c: GridCoord) -> Option<usize> {
        if !self.in_bounds(c) {
            return None;
        }
        let (x, y, z) = (c.x as usize, c.y as usize, c.z as usize);
        let sx = self.x as usize;
        let sy = self.y as usize;
        Some(z * sx * sy + y * sx + x)
    }

    /// Coordinate of a flat index. The index must be below `cell_count()`.
    pub fn coord(&self, index: usize) -> GridCoord {
        let sx = self.x as usize;
        let layer = sx * self.y as usize;
        GridCoord::new(
            (index % sx) as i32,
            ((index % layer) / sx) as i32,
            (index / layer) as i32,
        )
    }
}

/// One grid cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub coord: GridCoord,
    /// Linked neighbours, in `NEIGHBOR_OFFSETS` order.
    pub neighbors: SmallVec<[CellId; 26]>,
}

/// The dense cell array plus its adjacency.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellGrid {
    dims: GridDims,
    min_shared_axes: u8,
    cells: Vec<Cell>,
}

impl CellGrid {
    /// Allocate every cell and link neighbours. Cells are independent, so the
    /// adjacency pass runs on the rayon pool; the call returns once every
    /// cell is linked.
    pub fn build(dims: GridDims, min_shared_axes: u8) -> Self {
        let cells = (0..dims.cell_count())
            .into_par_iter()
            .map(|index| {
                let coord = dims.coord(index);
                Cell {
                    coord,
                    neighbors: link_neighbors(dims, coord, min_shared_axes),
                }
            })
            .collect();
        Self {
            dims,
            min_shared_axes,
            cells,
        }
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn min_shared_axes(&self) -> u8 {
        self.min_shared_axes
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell id for a coordinate, `None` if out of bounds.
    pub fn cell_id(&self, coord: GridCoord) -> Option<CellId> {
        self.dims.index(coord).map(|i| CellId(i as u32))
    }

    /// Get a cell by id.
    ///
    /// # Panics
    /// On an id not produced by this grid.
    pub fn cell(&self, id: CellId) -> &Cell {
        &self.cells[id.index()]
    }

    pub fn coord(&self, id: CellId) -> GridCoord {
        self.cell(id).coord
    }

    pub fn neighbors(&self, id: CellId) -> &[CellId] {
        &self.cell(id).neighbors
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

/// Apply the neighbour template to one cell.
fn link_neighbors(dims: GridDims, coord: GridCoord, min_shared_axes: u8) -> SmallVec<[CellId; 26]> {
    let mut out = SmallVec::new();
    for &(dx, dy, dz) in &NEIGHBOR_OFFSETS {
        let candidate = coord.offset(dx, dy, dz);
        let Some(index) = dims.index(candidate) else {
            continue;
        };
        let shared = coord.shared_axes(candidate);
        if shared >= min_shared_axes && shared < 3 {
            out.push(CellId(index as u32));
        }
    }
    out
}
