//! Core data structures for tilebrush
//!
//! This crate provides the fundamental types for painting meshes with tiles
//! cut from a 2-D texture atlas:
//! - `TileGrid` - Atlas slicing configuration (cell size, padding, margin)
//! - `GridRegistry` - Grids and the materials backing them
//! - `WorkingPlane` - The ephemeral build plane at the 3-D cursor
//! - `PaintSettings` - Per-face paint options with a packed integer codec
//! - `FaceTileMetadata` - Integer attributes attached to painted faces
//! - Grid math: world/grid/UV conversions and axis snapping

mod error;
mod grid;
mod math;
mod metadata;
mod plane;
mod settings;

pub use error::GridError;
pub use grid::{GridRegistry, MaterialEntry, TileGrid, TileSelection};
pub use math::{
    axis_snap, grid_to_world, tile_bounds, world_to_grid_coord, GridCoord, EPSILON,
};
pub use metadata::{FaceTileMetadata, WorkLayer, BASE_LAYER_MASK, EVERY_LAYER_MASK};
pub use plane::WorkingPlane;
pub use settings::{
    PaintSettings, TileAlignment, TileRotation, ALIGNMENT_MASK, EDGE_SNAP_BIT, FLIP_X_BIT,
    FLIP_Y_BIT, ROTATION_MASK, ROTATION_SHIFT, STRETCH_X_BIT, STRETCH_Y_BIT, UV_SNAP_BIT,
};
