//! # tilebrush
//!
//! Paint 3D meshes with tiles cut from a 2D texture atlas.
//!
//! A host editor feeds pointer and timer events into a [`PaintSession`]; the
//! session raycasts the mesh or the virtual work plane, builds or remaps
//! faces cell by cell, writes their UVs and tile metadata, and hands a
//! preview payload back for the host to render.
//!
//! ## Quick Start
//!
//! ```rust
//! use tilebrush::prelude::*;
//! use tilebrush::{Modifiers, Ray, ToolEvent};
//! use glam::Vec3;
//!
//! let mut registry = GridRegistry::new();
//! let material = registry.add_material("atlas", 128, 128);
//! let grid = registry.add_grid(material, 16, 16).unwrap();
//!
//! let mut session = PaintSession::new(registry, TileMesh::new());
//! session.active_grid = Some(grid);
//!
//! // One click on the work plane builds one tile-mapped quad
//! session.handle_event(ToolEvent::ButtonPress {
//!     ray: Ray::new(Vec3::new(0.1, 0.1, 1.0), -Vec3::Z),
//!     modifiers: Modifiers::default(),
//! });
//! session.handle_event(ToolEvent::ButtonRelease);
//! assert_eq!(session.mesh.face_count(), 1);
//! ```
//!
//! ## Crate Structure
//!
//! This umbrella crate re-exports the tilebrush_* sub-crates:
//!
//! - [`core`] - Grids, working plane, paint settings, grid math
//! - [`mesh`] - The editable mesh surface and raycasting
//! - [`tools`] - Build/paint/fill tools and the session state machine

/// Core data types: grids, the working plane, paint settings, grid math.
pub mod core {
    pub use tilebrush_core::*;
}

pub use tilebrush_core::{
    axis_snap, grid_to_world, tile_bounds, world_to_grid_coord, FaceTileMetadata, GridCoord,
    GridError, GridRegistry, MaterialEntry, PaintSettings, TileAlignment, TileGrid, TileRotation,
    TileSelection, WorkLayer, WorkingPlane,
};

/// The editable mesh surface and raycasting.
pub mod mesh {
    pub use tilebrush_mesh::*;
}

pub use tilebrush_mesh::{
    raycast_grid_cell, raycast_mesh, raycast_work_plane, Face, FaceId, Ray, RayHit, RayIndex,
    TileMesh, VertexId,
};

/// Build/paint/fill tools and the session state machine.
pub mod tools {
    pub use tilebrush_tools::*;
}

pub use tilebrush_tools::{
    build_fill_map, build_or_remap_face, compute_face_uvs, execute_fill, flood_fill, map_face,
    FillMap, Modifiers, PaintSession, PaintTool, PreviewPayload, SessionConfig, ToolEvent,
    VirtualCursorHistory,
};

/// Commonly used types and traits.
pub mod prelude {
    pub use crate::{
        GridRegistry, PaintSession, PaintSettings, PaintTool, TileAlignment, TileGrid, TileMesh,
        TileSelection, WorkLayer, WorkingPlane,
    };
}
