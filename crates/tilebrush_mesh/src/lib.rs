//! Editable mesh surface and raycasting for tilebrush
//!
//! This crate owns the geometry side of the paint engine:
//! - `TileMesh` - Faces, vertices, per-loop UVs, and per-face tile metadata,
//!   with vertex merging and an explicit revision counter
//! - `RayIndex` - A triangle index rebuilt on demand, with staleness tracked
//!   against the mesh revision
//! - Raycasts: mesh pass-through casting, work-plane intersection, and
//!   grid-cell sampling

mod index;
mod mesh;
mod raycast;

pub use index::RayIndex;
pub use mesh::{Face, FaceId, TileMesh, VertexId};
pub use raycast::{
    raycast_grid_cell, raycast_mesh, raycast_work_plane, Ray, RayHit, GRID_CAST_OFFSET,
    SKIP_EPSILON,
};
