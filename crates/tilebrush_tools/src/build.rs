//! Face building: create a quad for a grid cell or remap the face already
//! occupying it

use glam::Vec3;
use tilebrush_core::{
    GridError, GridRegistry, PaintSettings, WorkLayer, WorkingPlane, BASE_LAYER_MASK, EPSILON,
};
use tilebrush_mesh::{raycast_mesh, FaceId, RayIndex, TileMesh, GRID_CAST_OFFSET};

use crate::uv::map_face;

/// Vertex weld distance for base-layer merges
pub const BASE_MERGE_DISTANCE: f32 = 1e-3;
/// Vertex weld distance for decal-layer merges; looser so decals offset from
/// the base surface still close their seams
pub const DECAL_MERGE_DISTANCE: f32 = 1e-2;
/// How far decal faces sit above the base plane along its normal
pub const DECAL_LAYER_OFFSET: f32 = 0.02;

/// Tolerance for the remap coplanarity check; slightly looser than the grid
/// epsilon to absorb the cast offset
const COPLANAR_EPSILON: f32 = 1e-4;
/// Tolerance for the remap normal-parallelism check
const PARALLEL_EPSILON: f32 = 1e-3;

/// The plane origin for a work layer: decals build on an offset copy of the
/// base plane.
pub fn layer_origin(plane: &WorkingPlane, layer: WorkLayer) -> Vec3 {
    match layer {
        WorkLayer::Base => plane.origin,
        WorkLayer::Decal => plane.origin + plane.normal * DECAL_LAYER_OFFSET,
    }
}

/// The four world-space corners of a cell run, wound to face the plane
/// normal.
///
/// The winding flips when the scaled basis is mirrored (quadrant II/IV), so
/// the quad's normal agrees with the plane regardless of basis handedness.
pub fn cell_corners(
    origin: Vec3,
    scaled_right: Vec3,
    scaled_up: Vec3,
    normal: Vec3,
    cell_x: i32,
    cell_y: i32,
    span_x: i32,
    span_y: i32,
) -> [Vec3; 4] {
    let p00 = origin + scaled_right * cell_x as f32 + scaled_up * cell_y as f32;
    let p10 = p00 + scaled_right * span_x as f32;
    let p01 = p00 + scaled_up * span_y as f32;
    let p11 = p10 + scaled_up * span_y as f32;

    if scaled_right.cross(scaled_up).dot(normal) >= 0.0 {
        [p00, p10, p11, p01]
    } else {
        [p00, p01, p11, p10]
    }
}

/// Create a new quad for a grid cell run, or remap the coplanar face already
/// occupying it, then UV-map the result.
///
/// With `require_base_layer` the cell must have base geometry beneath it; a
/// miss on both the target layer and the base layer builds nothing. Remap
/// targets must lie on the layer's plane with a parallel or antiparallel
/// normal, otherwise the operation is skipped without touching the mesh.
/// Auto-merge welds the new face's vertices against faces on the same layer
/// and re-resolves the face id afterwards by recasting the cell.
pub fn build_or_remap_face(
    mesh: &mut TileMesh,
    index: &mut RayIndex,
    registry: &GridRegistry,
    grid_id: u32,
    plane: &WorkingPlane,
    pixels_per_unit: f32,
    cell_x: i32,
    cell_y: i32,
    span_x: i32,
    span_y: i32,
    tile_x: i32,
    tile_y: i32,
    settings: &PaintSettings,
    work_layer: WorkLayer,
    require_base_layer: bool,
    auto_merge: bool,
    paint_mode: bool,
) -> Result<FaceId, GridError> {
    let grid = registry
        .grid(grid_id)
        .ok_or(GridError::MissingGridOrTexture("unknown grid"))?;
    if !grid.is_valid() {
        return Err(GridError::MissingGridOrTexture("invalid grid"));
    }
    if span_x <= 0 || span_y <= 0 {
        return Err(GridError::DegenerateGeometry("zero-area cell span"));
    }
    if pixels_per_unit <= EPSILON {
        return Err(GridError::DegenerateGeometry("zero pixel density"));
    }

    let stride = grid.stride();
    let cell_world = stride / pixels_per_unit;
    if cell_world.x <= EPSILON || cell_world.y <= EPSILON {
        return Err(GridError::DegenerateGeometry("zero-size cell"));
    }

    let (right, up) = plane.basis();
    let scaled_right = right * cell_world.x;
    let scaled_up = up * cell_world.y;
    let origin = layer_origin(plane, work_layer);
    let center = origin
        + scaled_right * (cell_x as f32 + span_x as f32 * 0.5)
        + scaled_up * (cell_y as f32 + span_y as f32 * 0.5);

    let hit = raycast_mesh(
        mesh,
        index,
        center + plane.normal * GRID_CAST_OFFSET,
        -plane.normal,
        2.0 * GRID_CAST_OFFSET,
        work_layer.mask(),
        true,
    );

    let mut built_new = false;
    let mut face_id = match hit {
        Some(hit) => {
            // Remap: the occupying face must lie on the layer's plane with a
            // parallel or antiparallel normal
            let perp = (hit.position - origin).dot(plane.normal);
            if perp.abs() > COPLANAR_EPSILON
                || hit.normal.dot(plane.normal).abs() < 1.0 - PARALLEL_EPSILON
            {
                return Err(GridError::NonCoplanarRemap);
            }
            hit.face
        }
        None => {
            if require_base_layer {
                let base_center = plane.origin
                    + scaled_right * (cell_x as f32 + span_x as f32 * 0.5)
                    + scaled_up * (cell_y as f32 + span_y as f32 * 0.5);
                let base_hit = raycast_mesh(
                    mesh,
                    index,
                    base_center + plane.normal * GRID_CAST_OFFSET,
                    -plane.normal,
                    2.0 * GRID_CAST_OFFSET,
                    BASE_LAYER_MASK,
                    true,
                );
                if base_hit.is_none() {
                    return Err(GridError::RaycastMiss);
                }
            }

            let corners = cell_corners(
                origin, scaled_right, scaled_up, plane.normal, cell_x, cell_y, span_x, span_y,
            );
            built_new = true;
            let face = mesh.add_face(&corners);
            index.build(mesh);
            face
        }
    };

    map_face(
        mesh, face_id, registry, grid_id, right, up, cell_world, tile_x, tile_y, span_x, span_y,
        paint_mode, settings, work_layer,
    )?;

    if built_new && auto_merge {
        let threshold = match work_layer {
            WorkLayer::Base => BASE_MERGE_DISTANCE,
            WorkLayer::Decal => DECAL_MERGE_DISTANCE,
        };
        let tag = work_layer.tag();
        let merged = mesh.merge_by_distance(threshold, |f| f.meta.work_layer == tag);
        if merged > 0 {
            mesh.reindex();
        }
        index.build(mesh);

        // Vertex welding can renumber geometry; recover the face id by
        // recasting the cell instead of trusting the stale id
        let recovered = raycast_mesh(
            mesh,
            index,
            center + plane.normal * GRID_CAST_OFFSET,
            -plane.normal,
            2.0 * GRID_CAST_OFFSET,
            work_layer.mask(),
            true,
        );
        if let Some(hit) = recovered {
            face_id = hit.face;
        }
    }

    Ok(face_id)
}
