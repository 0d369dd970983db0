//! Raycasts against the mesh and the virtual work-plane grid

use glam::Vec3;
use tilebrush_core::{WorkLayer, EPSILON};

use crate::index::RayIndex;
use crate::mesh::{FaceId, TileMesh};

/// Distance a skipped hit is advanced past before recasting
pub const SKIP_EPSILON: f32 = 1e-4;
/// Offset of a grid-cell cast origin along the plane normal
pub const GRID_CAST_OFFSET: f32 = 0.01;

/// Upper bound on pass-through skips per cast; together with the remaining
/// ray distance this guarantees termination on pathological geometry
const MAX_SKIPS: u32 = 64;

/// A world-space ray with a normalized direction
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self {
            origin,
            dir: dir.normalize_or_zero(),
        }
    }
}

/// A qualifying mesh intersection
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub position: Vec3,
    pub normal: Vec3,
    pub face: FaceId,
    pub distance: f32,
}

/// Nearest qualifying intersection along a ray.
///
/// Hits on hidden faces, faces outside `layer_mask`, or backfaces (when
/// `allow_backface` is off) are passed through: the ray advances just past
/// the rejected face and casts again. The loop spends the remaining ray
/// distance and is additionally capped, so it always terminates.
pub fn raycast_mesh(
    mesh: &TileMesh,
    index: &mut RayIndex,
    origin: Vec3,
    dir: Vec3,
    max_dist: f32,
    layer_mask: u32,
    allow_backface: bool,
) -> Option<RayHit> {
    let dir = dir.normalize_or_zero();
    if dir == Vec3::ZERO {
        return None;
    }
    index.ensure_built(mesh);

    let mut start = origin;
    let mut traveled = 0.0;
    for _ in 0..MAX_SKIPS {
        let remaining = max_dist - traveled;
        if remaining <= 0.0 {
            return None;
        }

        let raw = index.cast(start, dir, remaining)?;
        let face = mesh.face(raw.face)?;

        let layer_ok = layer_mask & WorkLayer::from_tag(face.meta.work_layer).mask() != 0;
        let backface = face.normal.dot(dir) > 0.0;
        if face.hidden || !layer_ok || (backface && !allow_backface) {
            traveled += raw.distance + SKIP_EPSILON;
            start = raw.position + dir * SKIP_EPSILON;
            continue;
        }

        return Some(RayHit {
            position: raw.position,
            normal: face.normal,
            face: raw.face,
            distance: traveled + raw.distance,
        });
    }
    None
}

/// Intersection of a ray with an infinite plane.
///
/// Returns `None` when the ray is parallel to the plane or points away from
/// it.
pub fn raycast_work_plane(
    plane_origin: Vec3,
    plane_normal: Vec3,
    ray_origin: Vec3,
    ray_dir: Vec3,
) -> Option<Vec3> {
    let denom = plane_normal.dot(ray_dir);
    if denom.abs() < EPSILON {
        return None;
    }
    let t = (plane_origin - ray_origin).dot(plane_normal) / denom;
    if t < 0.0 {
        return None;
    }
    Some(ray_origin + ray_dir * t)
}

/// Sample one grid cell for existing geometry.
///
/// Casts from just above the cell center down through the plane, so faces
/// sitting exactly on the plane are found without self-intersection issues.
/// Both facings qualify; remap validation decides what to do with
/// antiparallel faces.
pub fn raycast_grid_cell(
    mesh: &TileMesh,
    index: &mut RayIndex,
    x: i32,
    y: i32,
    origin: Vec3,
    scaled_right: Vec3,
    scaled_up: Vec3,
    normal: Vec3,
    layer_mask: u32,
) -> Option<RayHit> {
    let center =
        origin + scaled_right * (x as f32 + 0.5) + scaled_up * (y as f32 + 0.5);
    raycast_mesh(
        mesh,
        index,
        center + normal * GRID_CAST_OFFSET,
        -normal,
        2.0 * GRID_CAST_OFFSET,
        layer_mask,
        true,
    )
}
