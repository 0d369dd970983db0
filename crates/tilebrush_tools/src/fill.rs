//! Flood fill over a sampled work-plane grid

use glam::{IVec2, Vec3};
use tilebrush_core::{
    world_to_grid_coord, GridError, GridRegistry, PaintSettings, WorkLayer, WorkingPlane,
};
use tilebrush_mesh::{raycast_grid_cell, FaceId, RayIndex, TileMesh};

use crate::build::{build_or_remap_face, layer_origin};

/// Content id for a cell with no (painted) face
pub const EMPTY_CELL: i64 = -1;
/// Marker written over visited cells during a flood fill; outside the packed
/// tile-id range and distinct from `EMPTY_CELL`
pub const VISITED_MARKER: i64 = i64::MIN;

/// A dense sampling of the work plane: per-cell tile content ids plus the
/// face occupying each cell.
///
/// Built fresh for each fill operation and discarded afterwards.
#[derive(Debug, Clone)]
pub struct FillMap {
    min: IVec2,
    size: IVec2,
    content: Vec<i64>,
    face_index: Vec<i64>,
}

impl FillMap {
    pub fn new(min: IVec2, size: IVec2) -> Self {
        let len = (size.x.max(0) * size.y.max(0)) as usize;
        Self {
            min,
            size,
            content: vec![EMPTY_CELL; len],
            face_index: vec![-1; len],
        }
    }

    pub fn min(&self) -> IVec2 {
        self.min
    }

    pub fn size(&self) -> IVec2 {
        self.size
    }

    pub fn contains(&self, cell: IVec2) -> bool {
        cell.x >= self.min.x
            && cell.y >= self.min.y
            && cell.x < self.min.x + self.size.x
            && cell.y < self.min.y + self.size.y
    }

    fn idx(&self, cell: IVec2) -> usize {
        let local = cell - self.min;
        (local.y * self.size.x + local.x) as usize
    }

    pub fn content(&self, cell: IVec2) -> Option<i64> {
        self.contains(cell).then(|| self.content[self.idx(cell)])
    }

    pub fn set_content(&mut self, cell: IVec2, value: i64) {
        if self.contains(cell) {
            let idx = self.idx(cell);
            self.content[idx] = value;
        }
    }

    /// The face sampled at a cell, if any
    pub fn face_at(&self, cell: IVec2) -> Option<FaceId> {
        if !self.contains(cell) {
            return None;
        }
        let raw = self.face_index[self.idx(cell)];
        (raw >= 0).then_some(raw as FaceId)
    }

    fn set_face(&mut self, cell: IVec2, face: FaceId) {
        if self.contains(cell) {
            let idx = self.idx(cell);
            self.face_index[idx] = face as i64;
        }
    }
}

/// Sample every cell in bounds by raycasting it.
///
/// Content is the face's packed tile id, or `EMPTY_CELL` on a miss or an
/// unpainted face. Tile ids inside the grid's current multi-cell selection
/// canonicalize to the selection's origin id, so a stamped multi-tile
/// pattern fills as one region.
pub fn build_fill_map(
    mesh: &TileMesh,
    index: &mut RayIndex,
    registry: &GridRegistry,
    grid_id: u32,
    plane: &WorkingPlane,
    pixels_per_unit: f32,
    bounds_min: IVec2,
    bounds_size: IVec2,
    work_layer: WorkLayer,
) -> Result<FillMap, GridError> {
    let grid = registry
        .grid(grid_id)
        .ok_or(GridError::MissingGridOrTexture("unknown grid"))?;
    let (image_w, _) = registry
        .image_size(grid_id)
        .ok_or(GridError::MissingGridOrTexture("material has no image"))?;

    let stride = grid.stride();
    let cell_world = stride / pixels_per_unit;
    let (right, up) = plane.basis();
    let scaled_right = right * cell_world.x;
    let scaled_up = up * cell_world.y;
    let origin = layer_origin(plane, work_layer);

    let selection = grid.selection;
    let origin_id = grid.selection_origin_id(image_w) as i64;

    let mut map = FillMap::new(bounds_min, bounds_size);
    for y in bounds_min.y..bounds_min.y + bounds_size.y {
        for x in bounds_min.x..bounds_min.x + bounds_size.x {
            let cell = IVec2::new(x, y);
            let Some(hit) = raycast_grid_cell(
                mesh,
                index,
                x,
                y,
                origin,
                scaled_right,
                scaled_up,
                plane.normal,
                work_layer.mask(),
            ) else {
                continue;
            };
            let Some(face) = mesh.face(hit.face) else {
                continue;
            };

            map.set_face(cell, hit.face);
            if face.meta.tile_id < 0 {
                continue;
            }

            let mut content = face.meta.tile_id as i64;
            if selection.is_multi_cell() {
                let (tx, ty) = grid.unpack_tile_id(image_w, face.meta.tile_id);
                if selection.contains(tx, ty) {
                    content = origin_id;
                }
            }
            map.set_content(cell, content);
        }
    }
    Ok(map)
}

/// Scanline flood fill from a seed cell, 4-connected.
///
/// Cells matching the seed's content are overwritten with `empty_marker` as
/// they are collected, which doubles as the visited set. Each row above and
/// below a filled span contributes one stack entry per contiguous run, so the
/// stack stays proportional to the region's perimeter rather than its area.
///
/// Returns the filled coordinates in discovery order; empty when the seed is
/// out of bounds or `empty_marker` equals the seed's content.
pub fn flood_fill(map: &mut FillMap, seed: IVec2, empty_marker: i64) -> Vec<IVec2> {
    let Some(target) = map.content(seed) else {
        return Vec::new();
    };
    if target == empty_marker {
        return Vec::new();
    }

    let mut filled = Vec::new();
    let mut stack = vec![seed];
    while let Some(cell) = stack.pop() {
        if map.content(cell) != Some(target) {
            continue;
        }

        // Expand the span along the row
        let mut x1 = cell.x;
        while map.content(IVec2::new(x1 - 1, cell.y)) == Some(target) {
            x1 -= 1;
        }
        let mut x2 = cell.x;
        while map.content(IVec2::new(x2 + 1, cell.y)) == Some(target) {
            x2 += 1;
        }

        for x in x1..=x2 {
            let c = IVec2::new(x, cell.y);
            map.set_content(c, empty_marker);
            filled.push(c);
        }

        // One seed per contiguous run in the rows above and below
        for dy in [-1, 1] {
            let y = cell.y + dy;
            let mut x = x1;
            while x <= x2 {
                if map.content(IVec2::new(x, y)) == Some(target) {
                    stack.push(IVec2::new(x, y));
                    while x <= x2 && map.content(IVec2::new(x, y)) == Some(target) {
                        x += 1;
                    }
                } else {
                    x += 1;
                }
            }
        }
    }
    filled
}

/// Flood-fill from a world-space seed hit and paint every collected cell.
///
/// The fill map and coordinate set are fixed before any mutation, so a
/// per-cell failure leaves only that cell unpainted. With `lock_transform`
/// each cell keeps its face's existing paint settings (cached up front);
/// otherwise `settings` applies everywhere. The tile offset repeats the
/// grid's multi-cell selection modulo its own size across the region.
///
/// Returns the number of cells painted.
pub fn execute_fill(
    mesh: &mut TileMesh,
    index: &mut RayIndex,
    registry: &GridRegistry,
    grid_id: u32,
    plane: &WorkingPlane,
    pixels_per_unit: f32,
    seed_world: Vec3,
    bounds_min: IVec2,
    bounds_size: IVec2,
    settings: &PaintSettings,
    work_layer: WorkLayer,
    require_base_layer: bool,
    auto_merge: bool,
    lock_transform: bool,
) -> Result<usize, GridError> {
    let grid = registry
        .grid(grid_id)
        .ok_or(GridError::MissingGridOrTexture("unknown grid"))?;
    let stride = grid.stride();
    let (right, up) = plane.basis();
    let origin = layer_origin(plane, work_layer);
    let selection = grid.selection;

    let coord = world_to_grid_coord(
        seed_world,
        origin,
        right,
        up,
        pixels_per_unit,
        stride.x,
        stride.y,
    )
    .ok_or(GridError::DegenerateGeometry("zero-size cell"))?;
    let seed = IVec2::new(coord.x, coord.y);

    let mut map = build_fill_map(
        mesh,
        index,
        registry,
        grid_id,
        plane,
        pixels_per_unit,
        bounds_min,
        bounds_size,
        work_layer,
    )?;
    if !map.contains(seed) {
        return Ok(0);
    }

    let cells = flood_fill(&mut map, seed, VISITED_MARKER);

    // Cache per-cell settings before any mutation renumbers faces
    let locked: Vec<Option<PaintSettings>> = if lock_transform {
        cells
            .iter()
            .map(|&cell| {
                map.face_at(cell)
                    .and_then(|f| mesh.face(f))
                    .filter(|f| f.meta.is_painted())
                    .map(|f| PaintSettings::decode(f.meta.paint_settings))
            })
            .collect()
    } else {
        Vec::new()
    };

    let mut painted = 0;
    for (i, cell) in cells.iter().enumerate() {
        let tile_x = selection.x + cell.x.rem_euclid(selection.width);
        let tile_y = selection.y + cell.y.rem_euclid(selection.height);
        let cell_settings = locked
            .get(i)
            .copied()
            .flatten()
            .unwrap_or(*settings);

        match build_or_remap_face(
            mesh,
            index,
            registry,
            grid_id,
            plane,
            pixels_per_unit,
            cell.x,
            cell.y,
            1,
            1,
            tile_x,
            tile_y,
            &cell_settings,
            work_layer,
            require_base_layer,
            false,
            true,
        ) {
            Ok(_) => painted += 1,
            Err(err) => {
                log::debug!("fill skipped cell ({}, {}): {err}", cell.x, cell.y);
            }
        }
    }

    if auto_merge && painted > 0 {
        let threshold = match work_layer {
            WorkLayer::Base => crate::build::BASE_MERGE_DISTANCE,
            WorkLayer::Decal => crate::build::DECAL_MERGE_DISTANCE,
        };
        let tag = work_layer.tag();
        let merged = mesh.merge_by_distance(threshold, |f| f.meta.work_layer == tag);
        if merged > 0 {
            mesh.reindex();
        }
        index.build(mesh);
    }

    Ok(painted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_from_rows(rows: &[&[i64]]) -> FillMap {
        let size = IVec2::new(rows[0].len() as i32, rows.len() as i32);
        let mut map = FillMap::new(IVec2::ZERO, size);
        for (y, row) in rows.iter().enumerate() {
            for (x, &value) in row.iter().enumerate() {
                map.set_content(IVec2::new(x as i32, y as i32), value);
            }
        }
        map
    }

    #[test]
    fn test_flood_fill_collects_seed_region() {
        let mut map = map_from_rows(&[&[1, 1, 2], &[1, 1, 2], &[2, 2, 2]]);
        let filled = flood_fill(&mut map, IVec2::ZERO, VISITED_MARKER);

        let set: std::collections::HashSet<_> = filled.iter().copied().collect();
        let expected: std::collections::HashSet<_> = [
            IVec2::new(0, 0),
            IVec2::new(1, 0),
            IVec2::new(0, 1),
            IVec2::new(1, 1),
        ]
        .into_iter()
        .collect();
        assert_eq!(set, expected);
        assert_eq!(filled.len(), 4);
    }

    #[test]
    fn test_flood_fill_other_region() {
        let mut map = map_from_rows(&[&[1, 1, 2], &[1, 1, 2], &[2, 2, 2]]);
        let filled = flood_fill(&mut map, IVec2::new(2, 2), VISITED_MARKER);
        assert_eq!(filled.len(), 5);
        assert!(filled.contains(&IVec2::new(2, 0)));
        assert!(!filled.contains(&IVec2::new(0, 0)));
    }

    #[test]
    fn test_flood_fill_noop_when_marker_equals_seed() {
        let mut map = map_from_rows(&[&[1, 1], &[1, 1]]);
        let before = map.clone();
        let filled = flood_fill(&mut map, IVec2::ZERO, 1);
        assert!(filled.is_empty());
        assert_eq!(map.content, before.content);
    }

    #[test]
    fn test_flood_fill_out_of_bounds_seed() {
        let mut map = map_from_rows(&[&[1]]);
        assert!(flood_fill(&mut map, IVec2::new(5, 5), VISITED_MARKER).is_empty());
    }

    #[test]
    fn test_flood_fill_discovery_marks_visited() {
        let mut map = map_from_rows(&[&[3, 3], &[3, 3]]);
        let filled = flood_fill(&mut map, IVec2::ZERO, VISITED_MARKER);
        assert_eq!(filled.len(), 4);
        for cell in filled {
            assert_eq!(map.content(cell), Some(VISITED_MARKER));
        }
    }

    #[test]
    fn test_fill_map_bounds() {
        let map = FillMap::new(IVec2::new(-2, -2), IVec2::new(4, 4));
        assert!(map.contains(IVec2::new(-2, -2)));
        assert!(map.contains(IVec2::new(1, 1)));
        assert!(!map.contains(IVec2::new(2, 0)));
        assert_eq!(map.content(IVec2::new(-1, -1)), Some(EMPTY_CELL));
        assert_eq!(map.face_at(IVec2::new(-1, -1)), None);
    }
}
