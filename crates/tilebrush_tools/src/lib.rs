//! Tile paint tools for tilebrush
//!
//! Drives the mesh and grid layers from pointer and timer events:
//! - `FaceBuilder` (`build_or_remap_face`) - Create a quad for a grid cell or
//!   remap the face already occupying it
//! - UV mapping (`map_face`, `compute_face_uvs`) - Tile selection to per-loop
//!   UVs plus the face metadata the picker and fill read back
//! - `FillEngine` (`build_fill_map`, `flood_fill`, `execute_fill`) - Scanline
//!   flood fill over a sampled work-plane grid
//! - `PaintSession` - The per-mode tool state machine, drag tracking, preview
//!   payload, and cursor flow

mod build;
mod cursor;
mod fill;
mod session;
mod uv;

pub use build::{
    build_or_remap_face, cell_corners, layer_origin, BASE_MERGE_DISTANCE, DECAL_LAYER_OFFSET,
    DECAL_MERGE_DISTANCE,
};
pub use cursor::{VirtualCursorHistory, CURSOR_HISTORY_LEN, MIN_SAMPLE_DISTANCE};
pub use fill::{build_fill_map, execute_fill, flood_fill, FillMap, EMPTY_CELL, VISITED_MARKER};
pub use session::{
    Modifiers, PaintSession, PaintTool, PreviewPayload, SessionConfig, ToolEvent,
};
pub use uv::{compute_face_uvs, map_face, EDGE_SNAP_THRESHOLD};
