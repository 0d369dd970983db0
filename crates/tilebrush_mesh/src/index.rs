//! Triangle index for raycasting, rebuilt on demand

use glam::Vec3;

use crate::mesh::{FaceId, TileMesh};

#[derive(Debug, Clone, Copy)]
struct IndexTri {
    a: Vec3,
    b: Vec3,
    c: Vec3,
    face: FaceId,
}

/// Nearest intersection reported by the index, before any pass-through policy
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawHit {
    pub face: FaceId,
    pub distance: f32,
    pub position: Vec3,
}

/// A flat triangle index over the mesh's faces.
///
/// The index records the mesh revision it was built from. A mutation makes
/// it stale; querying a stale index is a programming error in debug builds
/// (`debug_assert`) and a silent rebuild in release.
#[derive(Debug, Clone, Default)]
pub struct RayIndex {
    tris: Vec<IndexTri>,
    built_revision: u64,
}

impl RayIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the mesh has mutated since the last build
    pub fn is_stale(&self, mesh: &TileMesh) -> bool {
        self.built_revision != mesh.revision()
    }

    /// Rebuild from the current mesh state, fan-triangulating each polygon.
    ///
    /// Hidden faces are indexed too; the pass-through raycast policy decides
    /// whether to skip them.
    pub fn build(&mut self, mesh: &TileMesh) {
        self.tris.clear();
        for (face_idx, face) in mesh.faces().iter().enumerate() {
            if face.verts.len() < 3 {
                continue;
            }
            let Some(positions) = mesh.face_positions(face_idx as FaceId) else {
                continue;
            };
            for i in 1..positions.len() - 1 {
                self.tris.push(IndexTri {
                    a: positions[0],
                    b: positions[i],
                    c: positions[i + 1],
                    face: face_idx as FaceId,
                });
            }
        }
        self.built_revision = mesh.revision();
    }

    /// Build if the index was never built; rebuild (with a warning) if stale.
    pub(crate) fn ensure_built(&mut self, mesh: &TileMesh) {
        if self.built_revision == 0 {
            self.build(mesh);
        } else if self.is_stale(mesh) {
            debug_assert!(
                false,
                "raycast attempted on a stale index; rebuild after mutating the mesh"
            );
            log::warn!("stale ray index rebuilt before query");
            self.build(mesh);
        }
    }

    /// Nearest triangle intersection within `max_dist`, ignoring facing
    pub(crate) fn cast(&self, origin: Vec3, dir: Vec3, max_dist: f32) -> Option<RawHit> {
        let mut nearest: Option<RawHit> = None;
        for tri in &self.tris {
            let Some(t) = ray_triangle(origin, dir, tri.a, tri.b, tri.c) else {
                continue;
            };
            if t > max_dist {
                continue;
            }
            if nearest.map(|h| t < h.distance).unwrap_or(true) {
                nearest = Some(RawHit {
                    face: tri.face,
                    distance: t,
                    position: origin + dir * t,
                });
            }
        }
        nearest
    }
}

/// Moller-Trumbore without backface culling
fn ray_triangle(origin: Vec3, dir: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    const DET_EPSILON: f32 = 1e-9;
    const BARY_EPSILON: f32 = 1e-6;

    let e1 = b - a;
    let e2 = c - a;
    let p = dir.cross(e2);
    let det = e1.dot(p);
    if det.abs() < DET_EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(-BARY_EPSILON..=1.0 + BARY_EPSILON).contains(&u) {
        return None;
    }

    let q = s.cross(e1);
    let v = dir.dot(q) * inv_det;
    if v < -BARY_EPSILON || u + v > 1.0 + BARY_EPSILON {
        return None;
    }

    let t = e2.dot(q) * inv_det;
    if t <= BARY_EPSILON {
        return None;
    }
    Some(t)
}
