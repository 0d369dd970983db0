//! The editable mesh surface painted by the tools

use glam::{Vec2, Vec3};
use tilebrush_core::FaceTileMetadata;
use uuid::Uuid;

/// Index into the mesh's vertex array
pub type VertexId = u32;
/// Index into the mesh's face array
pub type FaceId = u32;

/// A polygon face with per-loop UVs and tile metadata.
#[derive(Debug, Clone)]
pub struct Face {
    /// Vertex ids in winding order
    pub verts: Vec<VertexId>,
    /// Per-loop UVs, one per vertex in the same order
    pub uvs: Vec<Vec2>,
    /// Face normal, recomputed when geometry changes
    pub normal: Vec3,
    /// Hidden faces are passed through by raycasts
    pub hidden: bool,
    /// Index into the mesh's material slot table
    pub material_slot: u32,
    /// Tile metadata written by the UV mapper
    pub meta: FaceTileMetadata,
}

/// An editable mesh with the attribute layers the paint engine needs.
///
/// Every geometry mutation bumps `revision`; the ray index compares against
/// it to detect staleness, which formalizes the
/// mutate-invalidate-rebuild-query ordering as data instead of call-order
/// convention.
#[derive(Debug, Clone)]
pub struct TileMesh {
    verts: Vec<Vec3>,
    faces: Vec<Face>,
    material_slots: Vec<Uuid>,
    revision: u64,
}

impl Default for TileMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl TileMesh {
    pub fn new() -> Self {
        Self {
            verts: Vec::new(),
            faces: Vec::new(),
            material_slots: Vec::new(),
            // Starts above the index's never-built revision of zero
            revision: 1,
        }
    }

    /// Monotonic geometry revision; bumped on every mutation
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn vertex_count(&self) -> usize {
        self.verts.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn vertex(&self, id: VertexId) -> Option<Vec3> {
        self.verts.get(id as usize).copied()
    }

    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(id as usize)
    }

    pub fn face_mut(&mut self, id: FaceId) -> Option<&mut Face> {
        self.faces.get_mut(id as usize)
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Add a standalone vertex
    pub fn add_vertex(&mut self, position: Vec3) -> VertexId {
        self.verts.push(position);
        self.revision += 1;
        (self.verts.len() - 1) as VertexId
    }

    /// Create a face from world positions, minting a fresh vertex per corner.
    ///
    /// Coincident corners are welded later by `merge_by_distance`, matching
    /// how the editor builds first and merges as a separate pass.
    pub fn add_face(&mut self, positions: &[Vec3]) -> FaceId {
        let verts: Vec<VertexId> = positions
            .iter()
            .map(|&p| {
                self.verts.push(p);
                (self.verts.len() - 1) as VertexId
            })
            .collect();

        let normal = polygon_normal(positions);
        self.faces.push(Face {
            uvs: vec![Vec2::ZERO; verts.len()],
            verts,
            normal,
            hidden: false,
            material_slot: 0,
            meta: FaceTileMetadata::default(),
        });
        self.revision += 1;
        (self.faces.len() - 1) as FaceId
    }

    /// World positions of a face's corners in winding order
    pub fn face_positions(&self, id: FaceId) -> Option<Vec<Vec3>> {
        let face = self.face(id)?;
        face.verts
            .iter()
            .map(|&v| self.vertex(v))
            .collect::<Option<Vec<_>>>()
    }

    /// Centroid of a face's corners
    pub fn face_center(&self, id: FaceId) -> Option<Vec3> {
        let positions = self.face_positions(id)?;
        if positions.is_empty() {
            return None;
        }
        Some(positions.iter().sum::<Vec3>() / positions.len() as f32)
    }

    /// Write per-loop UVs; the count must match the face's corner count
    pub fn set_face_uvs(&mut self, id: FaceId, uvs: &[Vec2]) -> bool {
        match self.faces.get_mut(id as usize) {
            Some(face) if face.verts.len() == uvs.len() => {
                face.uvs = uvs.to_vec();
                true
            }
            _ => false,
        }
    }

    /// Slot index for a material, creating the slot if needed
    pub fn ensure_material_slot(&mut self, material: Uuid) -> u32 {
        if let Some(slot) = self.material_slots.iter().position(|&m| m == material) {
            return slot as u32;
        }
        self.material_slots.push(material);
        (self.material_slots.len() - 1) as u32
    }

    pub fn material_slots(&self) -> &[Uuid] {
        &self.material_slots
    }

    /// Weld vertices of the faces selected by `filter` that lie within
    /// `distance` of each other.
    ///
    /// The first-seen vertex of each cluster survives; all faces referencing
    /// a merged vertex are remapped. Returns the number of vertices removed.
    /// Call `reindex` afterwards to compact the vertex array.
    pub fn merge_by_distance<F>(&mut self, distance: f32, filter: F) -> usize
    where
        F: Fn(&Face) -> bool,
    {
        let mut participating: Vec<VertexId> = Vec::new();
        let mut seen = vec![false; self.verts.len()];
        for face in self.faces.iter().filter(|f| filter(f)) {
            for &v in &face.verts {
                if let Some(flag) = seen.get_mut(v as usize) {
                    if !*flag {
                        *flag = true;
                        participating.push(v);
                    }
                }
            }
        }

        // Greedy clustering: each vertex maps to the first earlier vertex
        // within range, measured against the cluster representative
        let dist_sq = distance * distance;
        let mut remap: Vec<VertexId> = (0..self.verts.len() as VertexId).collect();
        let mut canonical: Vec<VertexId> = Vec::new();
        for &v in &participating {
            let p = self.verts[v as usize];
            let target = canonical
                .iter()
                .copied()
                .find(|&c| self.verts[c as usize].distance_squared(p) <= dist_sq);
            match target {
                Some(c) => remap[v as usize] = c,
                None => canonical.push(v),
            }
        }

        let merged = participating
            .iter()
            .filter(|&&v| remap[v as usize] != v)
            .count();
        if merged == 0 {
            return 0;
        }

        for face in &mut self.faces {
            for v in &mut face.verts {
                *v = remap[*v as usize];
            }
        }
        self.revision += 1;
        merged
    }

    /// Drop vertices no face references and renumber the rest.
    ///
    /// Face ids are unchanged; vertex ids are only stable until the next
    /// reindex, which is why callers re-raycast instead of holding on to
    /// ids across a merge.
    pub fn reindex(&mut self) -> usize {
        let mut used = vec![false; self.verts.len()];
        for face in &self.faces {
            for &v in &face.verts {
                used[v as usize] = true;
            }
        }

        let mut remap = vec![VertexId::MAX; self.verts.len()];
        let mut verts = Vec::with_capacity(self.verts.len());
        for (i, &p) in self.verts.iter().enumerate() {
            if used[i] {
                remap[i] = verts.len() as VertexId;
                verts.push(p);
            }
        }

        let removed = self.verts.len() - verts.len();
        if removed == 0 {
            return 0;
        }

        for face in &mut self.faces {
            for v in &mut face.verts {
                *v = remap[*v as usize];
            }
        }
        self.verts = verts;
        self.revision += 1;
        removed
    }
}

/// Newell's method; robust for arbitrary simple polygons
fn polygon_normal(positions: &[Vec3]) -> Vec3 {
    let mut normal = Vec3::ZERO;
    for (i, &current) in positions.iter().enumerate() {
        let next = positions[(i + 1) % positions.len()];
        normal += (current - next).cross(current + next);
    }
    normal.normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_on_xy(origin: Vec3, size: f32) -> [Vec3; 4] {
        [
            origin,
            origin + Vec3::X * size,
            origin + Vec3::new(size, size, 0.0),
            origin + Vec3::Y * size,
        ]
    }

    #[test]
    fn test_add_face_computes_normal() {
        let mut mesh = TileMesh::new();
        let face = mesh.add_face(&quad_on_xy(Vec3::ZERO, 1.0));
        let normal = mesh.face(face).unwrap().normal;
        assert!((normal - Vec3::Z).length() < 1e-5);
        assert_eq!(mesh.vertex_count(), 4);
    }

    #[test]
    fn test_mutations_bump_revision() {
        let mut mesh = TileMesh::new();
        let r0 = mesh.revision();
        mesh.add_face(&quad_on_xy(Vec3::ZERO, 1.0));
        assert!(mesh.revision() > r0);

        // UV writes are not geometry mutations
        let r1 = mesh.revision();
        let face = 0;
        assert!(mesh.set_face_uvs(face, &[Vec2::ZERO; 4]));
        assert_eq!(mesh.revision(), r1);
    }

    #[test]
    fn test_merge_welds_shared_edge() {
        let mut mesh = TileMesh::new();
        mesh.add_face(&quad_on_xy(Vec3::ZERO, 1.0));
        mesh.add_face(&quad_on_xy(Vec3::X, 1.0));
        assert_eq!(mesh.vertex_count(), 8);

        let merged = mesh.merge_by_distance(1e-3, |_| true);
        assert_eq!(merged, 2);
        mesh.reindex();
        assert_eq!(mesh.vertex_count(), 6);

        // The two faces now share exactly two vertex ids
        let a: std::collections::HashSet<_> =
            mesh.face(0).unwrap().verts.iter().copied().collect();
        let b: std::collections::HashSet<_> =
            mesh.face(1).unwrap().verts.iter().copied().collect();
        assert_eq!(a.intersection(&b).count(), 2);
    }

    #[test]
    fn test_merge_filter_limits_participants() {
        let mut mesh = TileMesh::new();
        let a = mesh.add_face(&quad_on_xy(Vec3::ZERO, 1.0));
        mesh.add_face(&quad_on_xy(Vec3::X, 1.0));
        mesh.face_mut(a).unwrap().meta.work_layer = 1;

        // Only one face participates, so nothing is close enough to weld
        let merged = mesh.merge_by_distance(1e-3, |f| f.meta.work_layer == 1);
        assert_eq!(merged, 0);
        assert_eq!(mesh.vertex_count(), 8);
    }

    #[test]
    fn test_material_slots_are_deduplicated() {
        let mut mesh = TileMesh::new();
        let m = Uuid::new_v4();
        let slot = mesh.ensure_material_slot(m);
        assert_eq!(mesh.ensure_material_slot(m), slot);
        assert_eq!(mesh.material_slots().len(), 1);
    }
}
