//! Error taxonomy for grid and paint operations

use thiserror::Error;

/// Failures surfaced by build, remap, and fill operations.
///
/// `RaycastMiss`, `NonCoplanarRemap`, and `DegenerateGeometry` are routine
/// per-cell failures: the operation for that cell is a no-op and the mesh is
/// left untouched. `MissingGridOrTexture` aborts a whole action before any
/// mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// No qualifying geometry or plane intersection along the ray.
    #[error("raycast found no qualifying hit")]
    RaycastMiss,
    /// Remap target is not coplanar with the working grid.
    #[error("remap target is not coplanar with the working plane")]
    NonCoplanarRemap,
    /// Zero-area cell span or NaN UV projection.
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(&'static str),
    /// Grid, material, or image lookup failed.
    #[error("missing grid or texture: {0}")]
    MissingGridOrTexture(&'static str),
}
