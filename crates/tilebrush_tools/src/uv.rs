//! UV computation: tile selection to per-loop UVs plus face metadata

use glam::{Vec2, Vec3};
use tilebrush_core::{GridError, GridRegistry, PaintSettings, TileGrid, WorkLayer, EPSILON};
use tilebrush_mesh::{FaceId, TileMesh};

/// Fraction of a tile edge within which `edge_snap` clamps UVs onto the edge
pub const EDGE_SNAP_THRESHOLD: f32 = 0.05;

/// Compute per-loop UVs for a face from a tile run.
///
/// `right`/`up` are the working plane's unit basis, `cell_world` the world
/// size of one grid cell. Corners are projected onto the basis relative to
/// `center` into the run's fractional space, rotated and flipped, then placed
/// into the tile's pixel bounds (grid offset and rotation applied) and scaled
/// into UV space. Paint mode layers alignment/stretch/edge-snap on top before
/// the final texel snap.
///
/// Returns `None` when any coordinate degenerates to NaN.
pub fn compute_face_uvs(
    grid: &TileGrid,
    image_width: u32,
    image_height: u32,
    right: Vec3,
    up: Vec3,
    tile_x: i32,
    tile_y: i32,
    span_x: i32,
    span_y: i32,
    positions: &[Vec3],
    center: Vec3,
    cell_world: Vec2,
    paint_mode: bool,
    settings: &PaintSettings,
) -> Option<Vec<Vec2>> {
    if image_width == 0 || image_height == 0 {
        return None;
    }
    let run_world = Vec2::new(
        cell_world.x * span_x as f32,
        cell_world.y * span_y as f32,
    );
    if run_world.x <= EPSILON || run_world.y <= EPSILON {
        return None;
    }

    let (bounds_min, bounds_max) = grid.tile_bounds(tile_x, tile_y, span_x, span_y);
    let atlas_offset = Vec2::new(grid.offset_x as f32, grid.offset_y as f32);
    let bounds_min = bounds_min + atlas_offset;
    let bounds_max = bounds_max + atlas_offset;

    let mut pixels: Vec<Vec2> = Vec::with_capacity(positions.len());
    for &p in positions {
        let offset = p - center;
        let mut local = Vec2::new(
            offset.dot(right) / run_world.x + 0.5,
            offset.dot(up) / run_world.y + 0.5,
        );

        local = rotate_fraction(local, settings.rotation.quarter_turns());
        if settings.flip_x {
            local.x = 1.0 - local.x;
        }
        if settings.flip_y {
            local.y = 1.0 - local.y;
        }

        let px = bounds_min + local * (bounds_max - bounds_min);
        if !px.is_finite() {
            return None;
        }
        pixels.push(px);
    }

    if paint_mode {
        apply_paint_adjustments(&mut pixels, bounds_min, bounds_max, settings);
    }

    // Grid rotation spins the run around its own pixel center
    if grid.rotation.abs() > EPSILON {
        let pivot = (bounds_min + bounds_max) * 0.5;
        let (sin, cos) = grid.rotation.sin_cos();
        for px in &mut pixels {
            let d = *px - pivot;
            *px = pivot + Vec2::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos);
        }
    }

    let image = Vec2::new(image_width as f32, image_height as f32);
    let mut uvs: Vec<Vec2> = pixels.into_iter().map(|px| px / image).collect();

    // Texel-center snap; paint mode exposes it as a toggle
    let snap = if paint_mode { settings.uv_snap } else { true };
    if snap {
        let texel = Vec2::ONE / image;
        for uv in &mut uvs {
            *uv = (*uv / texel).round() * texel;
        }
    }

    if uvs.iter().any(|uv| !uv.is_finite()) {
        return None;
    }
    Some(uvs)
}

/// Shift, stretch, and edge-snap the UV island inside its tile cell.
///
/// Stretch scales the island's bounding box to exactly fill the cell per
/// axis. Alignment then moves the box so the matching edge or corner touches
/// the cell's; an axis filled by stretch has no freedom left, so that
/// component of the alignment naturally degrades to centered (the documented
/// corner-with-stretch to edge mapping). Edge snap finally clamps coordinates
/// within the threshold of a cell edge onto the edge.
fn apply_paint_adjustments(
    pixels: &mut [Vec2],
    cell_min: Vec2,
    cell_max: Vec2,
    settings: &PaintSettings,
) {
    if pixels.is_empty() {
        return;
    }

    let island = |pixels: &[Vec2]| {
        let mut min = pixels[0];
        let mut max = pixels[0];
        for &p in pixels.iter().skip(1) {
            min = min.min(p);
            max = max.max(p);
        }
        (min, max)
    };

    if settings.stretch_x || settings.stretch_y {
        let (min, max) = island(pixels);
        let size = max - min;
        for p in pixels.iter_mut() {
            if settings.stretch_x && size.x > EPSILON {
                p.x = cell_min.x + (p.x - min.x) / size.x * (cell_max.x - cell_min.x);
            }
            if settings.stretch_y && size.y > EPSILON {
                p.y = cell_min.y + (p.y - min.y) / size.y * (cell_max.y - cell_min.y);
            }
        }
    }

    if let Some(alignment) = settings.alignment {
        let (min, max) = island(pixels);
        let horizontal = if settings.stretch_x { 0 } else { alignment.horizontal() };
        let vertical = if settings.stretch_y { 0 } else { alignment.vertical() };

        let shift = Vec2::new(
            match horizontal {
                -1 => cell_min.x - min.x,
                1 => cell_max.x - max.x,
                _ => (cell_min.x + cell_max.x - min.x - max.x) * 0.5,
            },
            match vertical {
                -1 => cell_min.y - min.y,
                1 => cell_max.y - max.y,
                _ => (cell_min.y + cell_max.y - min.y - max.y) * 0.5,
            },
        );
        for p in pixels.iter_mut() {
            *p += shift;
        }
    }

    if settings.edge_snap {
        let threshold = (cell_max - cell_min) * EDGE_SNAP_THRESHOLD;
        for p in pixels.iter_mut() {
            if (p.x - cell_min.x).abs() <= threshold.x {
                p.x = cell_min.x;
            } else if (p.x - cell_max.x).abs() <= threshold.x {
                p.x = cell_max.x;
            }
            if (p.y - cell_min.y).abs() <= threshold.y {
                p.y = cell_min.y;
            } else if (p.y - cell_max.y).abs() <= threshold.y {
                p.y = cell_max.y;
            }
        }
    }
}

/// Rotate a cell fraction counter-clockwise around the cell center
fn rotate_fraction(local: Vec2, quarter_turns: u32) -> Vec2 {
    match quarter_turns % 4 {
        1 => Vec2::new(1.0 - local.y, local.x),
        2 => Vec2::new(1.0 - local.x, 1.0 - local.y),
        3 => Vec2::new(local.y, 1.0 - local.x),
        _ => local,
    }
}

/// Map a tile run onto a face: write UVs, metadata, and the material slot.
pub fn map_face(
    mesh: &mut TileMesh,
    face: FaceId,
    registry: &GridRegistry,
    grid_id: u32,
    right: Vec3,
    up: Vec3,
    cell_world: Vec2,
    tile_x: i32,
    tile_y: i32,
    span_x: i32,
    span_y: i32,
    paint_mode: bool,
    settings: &PaintSettings,
    work_layer: WorkLayer,
) -> Result<(), GridError> {
    let grid = registry
        .grid(grid_id)
        .ok_or(GridError::MissingGridOrTexture("unknown grid"))?;
    let (image_w, image_h) = registry
        .image_size(grid_id)
        .ok_or(GridError::MissingGridOrTexture("material has no image"))?;

    let positions = mesh
        .face_positions(face)
        .ok_or(GridError::DegenerateGeometry("missing face"))?;
    let center = mesh
        .face_center(face)
        .ok_or(GridError::DegenerateGeometry("empty face"))?;

    let uvs = compute_face_uvs(
        grid, image_w, image_h, right, up, tile_x, tile_y, span_x, span_y, &positions, center,
        cell_world, paint_mode, settings,
    )
    .ok_or(GridError::DegenerateGeometry("uv projection produced NaN"))?;

    let material = grid.material;
    let tile_id = grid.pack_tile_id(image_w, tile_x, tile_y);
    let sel_width = grid.selection.width;
    let sel_height = grid.selection.height;
    let sel_origin = grid.selection_origin_id(image_w);

    let slot = mesh.ensure_material_slot(material);
    mesh.set_face_uvs(face, &uvs);
    if let Some(face) = mesh.face_mut(face) {
        face.material_slot = slot;
        face.meta.grid_id = grid_id as i32;
        face.meta.tile_id = tile_id;
        face.meta.sel_width = sel_width;
        face.meta.sel_height = sel_height;
        face.meta.sel_origin = sel_origin;
        face.meta.work_layer = work_layer.tag();
        face.meta.paint_settings = settings.encode();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilebrush_core::{TileAlignment, TileRotation};

    fn registry_with_grid(image: u32, cell: i32) -> (GridRegistry, u32) {
        let mut registry = GridRegistry::new();
        let material = registry.add_material("atlas", image, image);
        let grid = registry.add_grid(material, cell, cell).unwrap();
        (registry, grid)
    }

    fn unit_quad() -> (Vec<Vec3>, Vec3) {
        let positions = vec![
            Vec3::ZERO,
            Vec3::X,
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::Y,
        ];
        let center = Vec3::new(0.5, 0.5, 0.0);
        (positions, center)
    }

    #[test]
    fn test_uvs_cover_selected_tile() {
        let (registry, grid_id) = registry_with_grid(64, 16);
        let grid = registry.grid(grid_id).unwrap();
        let (positions, center) = unit_quad();

        let uvs = compute_face_uvs(
            grid,
            64,
            64,
            Vec3::X,
            Vec3::Y,
            1,
            2,
            1,
            1,
            &positions,
            center,
            Vec2::ONE,
            false,
            &PaintSettings::default(),
        )
        .unwrap();

        // Tile (1,2) of a 16px grid on a 64px atlas: u in [0.25, 0.5], v in [0.5, 0.75]
        assert!((uvs[0] - Vec2::new(0.25, 0.5)).length() < 1e-5);
        assert!((uvs[2] - Vec2::new(0.5, 0.75)).length() < 1e-5);
    }

    #[test]
    fn test_flip_x_mirrors_us() {
        let (registry, grid_id) = registry_with_grid(64, 16);
        let grid = registry.grid(grid_id).unwrap();
        let (positions, center) = unit_quad();

        let plain = compute_face_uvs(
            grid, 64, 64, Vec3::X, Vec3::Y, 0, 0, 1, 1, &positions, center, Vec2::ONE, false,
            &PaintSettings::default(),
        )
        .unwrap();
        let flipped = compute_face_uvs(
            grid, 64, 64, Vec3::X, Vec3::Y, 0, 0, 1, 1, &positions, center, Vec2::ONE, false,
            &PaintSettings {
                flip_x: true,
                ..Default::default()
            },
        )
        .unwrap();

        assert!((plain[0].x - flipped[1].x).abs() < 1e-5);
        assert!((plain[0].y - flipped[0].y).abs() < 1e-5);
    }

    #[test]
    fn test_rotation_quadrant_rotates_island() {
        let (registry, grid_id) = registry_with_grid(64, 16);
        let grid = registry.grid(grid_id).unwrap();
        let (positions, center) = unit_quad();

        let rotated = compute_face_uvs(
            grid, 64, 64, Vec3::X, Vec3::Y, 0, 0, 1, 1, &positions, center, Vec2::ONE, false,
            &PaintSettings {
                rotation: TileRotation::Ccw90,
                ..Default::default()
            },
        )
        .unwrap();

        // Corner (0,0) rotates to the cell's (1,0) corner
        assert!((rotated[0] - Vec2::new(0.25, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_stretch_fills_cell_and_degrades_alignment() {
        let (registry, grid_id) = registry_with_grid(64, 16);
        let grid = registry.grid(grid_id).unwrap();
        // A half-size quad leaves the island covering a quarter of the cell
        let positions = vec![
            Vec3::ZERO,
            Vec3::X * 0.5,
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::Y * 0.5,
        ];
        let center = Vec3::new(0.25, 0.25, 0.0);

        let uvs = compute_face_uvs(
            grid,
            64,
            64,
            Vec3::X,
            Vec3::Y,
            0,
            0,
            1,
            1,
            &positions,
            center,
            Vec2::ONE,
            true,
            &PaintSettings {
                alignment: Some(TileAlignment::TopLeft),
                stretch_x: true,
                uv_snap: true,
                ..Default::default()
            },
        )
        .unwrap();

        let min_u = uvs.iter().map(|uv| uv.x).fold(f32::MAX, f32::min);
        let max_u = uvs.iter().map(|uv| uv.x).fold(f32::MIN, f32::max);
        let max_v = uvs.iter().map(|uv| uv.y).fold(f32::MIN, f32::max);
        // Stretched across the full cell width; TopLeft degrades to Top, so
        // the island touches the cell's top edge
        assert!((min_u - 0.0).abs() < 1e-5);
        assert!((max_u - 0.25).abs() < 1e-5);
        assert!((max_v - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_projection_returns_none() {
        let (registry, grid_id) = registry_with_grid(64, 16);
        let grid = registry.grid(grid_id).unwrap();
        let (positions, center) = unit_quad();

        assert!(compute_face_uvs(
            grid,
            64,
            64,
            Vec3::X,
            Vec3::Y,
            0,
            0,
            1,
            1,
            &positions,
            center,
            Vec2::ZERO,
            false,
            &PaintSettings::default(),
        )
        .is_none());
    }

    #[test]
    fn test_map_face_writes_metadata_and_material() {
        let (registry, grid_id) = registry_with_grid(64, 16);
        let mut mesh = TileMesh::new();
        let face = mesh.add_face(&[
            Vec3::ZERO,
            Vec3::X,
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::Y,
        ]);

        let settings = PaintSettings {
            flip_y: true,
            ..Default::default()
        };
        map_face(
            &mut mesh,
            face,
            &registry,
            grid_id,
            Vec3::X,
            Vec3::Y,
            Vec2::ONE,
            2,
            1,
            1,
            1,
            false,
            &settings,
            WorkLayer::Base,
        )
        .unwrap();

        let face = mesh.face(face).unwrap();
        assert_eq!(face.meta.grid_id, grid_id as i32);
        // Tile (2,1) on a 4-tile row packs to 6
        assert_eq!(face.meta.tile_id, 6);
        assert_eq!(face.meta.paint_settings, settings.encode());
        assert!(face.meta.is_painted());
        assert_eq!(mesh.material_slots().len(), 1);
    }

    #[test]
    fn test_map_face_requires_known_grid() {
        let (registry, _) = registry_with_grid(64, 16);
        let mut mesh = TileMesh::new();
        let face = mesh.add_face(&[Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y]);

        let err = map_face(
            &mut mesh,
            face,
            &registry,
            99,
            Vec3::X,
            Vec3::Y,
            Vec2::ONE,
            0,
            0,
            1,
            1,
            false,
            &PaintSettings::default(),
            WorkLayer::Base,
        )
        .unwrap_err();
        assert!(matches!(err, GridError::MissingGridOrTexture(_)));
    }
}
