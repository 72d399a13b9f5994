// Error types for the navigation volume.
//
// `NavError` covers everything that rejects an operation outright: invalid
// configuration, malformed query filters, config I/O, and lifecycle misuse
// (querying an inactive volume, building an active one). It never covers
// "no path exists"; that is an expected outcome and is reported as a
// `PathFailure` value inside `PathOutcome` (see `pathfinding.rs`).
//
// Structural invariant violations (a cell or octree index out of range) are
// not represented here. They indicate a build bug and panic at the indexing
// site instead of being tolerated.

use thiserror::Error;

/// Errors that reject a volume or query operation before any work begins.
#[derive(Debug, Error)]
pub enum NavError {
    /// A grid dimension was zero or too large to index.
    #[error("invalid grid dimensions {x}x{y}x{z} (each axis must be >= 1 and the cell count must fit in u32)")]
    InvalidDimensions { x: u32, y: u32, z: u32 },

    /// Cell size was not a positive finite number.
    #[error("invalid cell size: {0} (must be finite and > 0)")]
    InvalidCellSize(f32),

    /// Minimum shared-axis connectivity outside 0..=2.
    #[error("invalid minimum shared axes: {0} (must be 0, 1 or 2)")]
    InvalidConnectivity(u8),

    /// Octree depth outside 1..=10.
    #[error("invalid octree max depth: {0} (must be between 1 and 10)")]
    InvalidOctreeDepth(u32),

    /// Octree leaf size was not a finite number.
    #[error("invalid octree min leaf size: {0}")]
    InvalidLeafSize(f32),

    /// Agent capsule with a negative or non-finite dimension.
    #[error("invalid agent shape: radius {radius}, half height {half_height}")]
    InvalidAgentShape { radius: f32, half_height: f32 },

    /// An actor-class filter that names no class.
    #[error("actor class filter must not be empty")]
    EmptyClassFilter,

    /// Query on a volume that has not been built (or was torn down).
    #[error("navigation volume is not active; call build() first")]
    NotBuilt,

    /// Build on a volume that is already active.
    #[error("navigation volume is already active; call teardown() before rebuilding")]
    AlreadyBuilt,

    /// Config or scenario JSON could not be parsed.
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Config or scenario file could not be read.
    #[error("config read error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for volume operations.
pub type Result<T> = std::result::Result<T, NavError>;
