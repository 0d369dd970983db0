//! Grid geometry: world/grid conversions, axis snapping, tile bounds

use glam::{Vec2, Vec3};

/// Tolerance for "is zero" and "is coplanar" checks
pub const EPSILON: f32 = 1e-5;

/// A world point resolved to an integer grid cell.
///
/// `scaled_right` / `scaled_up` are the plane basis vectors scaled to exactly
/// one cell's world size, ready for building face geometry without
/// recomputing the cell dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
    pub scaled_right: Vec3,
    pub scaled_up: Vec3,
}

/// Project a world point onto a grid basis and floor to integer coordinates.
///
/// `right` and `up` must be unit vectors; `cell_w`/`cell_h` are the cell size
/// in pixels and `pixels_per_unit` converts them to world units. Flooring
/// (not truncation) makes the grid extend infinitely in both directions, so
/// negative coordinates behave the same as positive ones.
///
/// Returns `None` for a degenerate cell size or pixel density.
pub fn world_to_grid_coord(
    point: Vec3,
    origin: Vec3,
    right: Vec3,
    up: Vec3,
    pixels_per_unit: f32,
    cell_w: f32,
    cell_h: f32,
) -> Option<GridCoord> {
    if pixels_per_unit <= EPSILON || cell_w <= EPSILON || cell_h <= EPSILON {
        return None;
    }

    let world_w = cell_w / pixels_per_unit;
    let world_h = cell_h / pixels_per_unit;

    let offset = point - origin;
    let x = (offset.dot(right) / world_w).floor() as i32;
    let y = (offset.dot(up) / world_h).floor() as i32;

    Some(GridCoord {
        x,
        y,
        scaled_right: right * world_w,
        scaled_up: up * world_h,
    })
}

/// World position of a grid cell's corner (the inverse of
/// [`world_to_grid_coord`] up to the in-cell fraction).
pub fn grid_to_world(origin: Vec3, scaled_right: Vec3, scaled_up: Vec3, x: i32, y: i32) -> Vec3 {
    origin + scaled_right * x as f32 + scaled_up * y as f32
}

/// Snap a vector to the world axis it is least orthogonal to.
///
/// Ties are broken by axis priority X before Y before Z. With `mirrored` the
/// result opposes the input where they are aligned; without it the result
/// points the same way.
pub fn axis_snap(v: Vec3, mirrored: bool) -> Vec3 {
    const AXES: [Vec3; 3] = [Vec3::X, Vec3::Y, Vec3::Z];

    let dots = [v.dot(Vec3::X), v.dot(Vec3::Y), v.dot(Vec3::Z)];
    let mut best = 0;
    for i in 1..3 {
        if dots[i].abs() > dots[best].abs() {
            best = i;
        }
    }

    let mut sign = if dots[best] < 0.0 { -1.0 } else { 1.0 };
    if mirrored {
        sign = -sign;
    }
    AXES[best] * sign
}

/// Pixel-space bounding box of a tile run.
///
/// `margin` is `[top, right, bottom, left]`. Padding is subtracted from both
/// edges of the run, so the box covers tile content only; the same bounds
/// feed the selection highlight and the UV mapping.
pub fn tile_bounds(
    cell_w: f32,
    cell_h: f32,
    padding: Vec2,
    margin: [f32; 4],
    x: i32,
    y: i32,
    span_x: i32,
    span_y: i32,
) -> (Vec2, Vec2) {
    let stride_x = cell_w + 2.0 * padding.x;
    let stride_y = cell_h + 2.0 * padding.y;

    let min = Vec2::new(
        margin[3] + x as f32 * stride_x + padding.x,
        margin[2] + y as f32 * stride_y + padding.y,
    );
    let max = Vec2::new(
        min.x + span_x as f32 * stride_x - 2.0 * padding.x,
        min.y + span_y as f32 * stride_y - 2.0 * padding.y,
    );
    (min, max)
}
