//! Tile grids and the material registry backing them

use glam::Vec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::math;

/// Rectangle of selected tiles in grid-cell units.
///
/// Width and height are always at least one cell; a single-tile selection is
/// a 1x1 rectangle at the tile's coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSelection {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Default for TileSelection {
    fn default() -> Self {
        Self::single(0, 0)
    }
}

impl TileSelection {
    /// A 1x1 selection at the given tile
    pub fn single(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            width: 1,
            height: 1,
        }
    }

    /// A multi-cell selection; width/height are clamped to at least 1
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width: width.max(1),
            height: height.max(1),
        }
    }

    /// Whether a tile coordinate falls inside the selection
    pub fn contains(&self, tile_x: i32, tile_y: i32) -> bool {
        tile_x >= self.x
            && tile_x < self.x + self.width
            && tile_y >= self.y
            && tile_y < self.y + self.height
    }

    /// Whether the selection spans more than one cell
    pub fn is_multi_cell(&self) -> bool {
        self.width > 1 || self.height > 1
    }
}

/// How one material's texture atlas is sliced into tiles.
///
/// Many grids may reference the same material (decal layers reuse the base
/// atlas); a grid's lifetime is tied to its material's (see
/// [`GridRegistry::prune`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileGrid {
    /// Registry-assigned id, stored in face metadata
    pub id: u32,
    /// The material whose texture this grid slices
    pub material: Uuid,
    /// Tile content width in pixels
    pub cell_width: i32,
    /// Tile content height in pixels
    pub cell_height: i32,
    /// Per-cell padding in pixels, applied on both sides of each axis
    pub padding_x: i32,
    pub padding_y: i32,
    /// Atlas margin in pixels: top, right, bottom, left
    pub margin: [i32; 4],
    /// Atlas offset in pixels
    pub offset_x: i32,
    pub offset_y: i32,
    /// Grid rotation in radians, applied in UV space
    pub rotation: f32,
    /// The currently selected tile rectangle
    pub selection: TileSelection,
    /// When set, padding is derived from `auto_pad_offset`
    #[serde(default)]
    pub auto_pad: bool,
    #[serde(default)]
    pub auto_pad_offset: f32,
}

impl TileGrid {
    /// Create a grid slicing `material` into `cell_width` x `cell_height`
    /// pixel tiles. The id is assigned by the registry.
    pub fn new(id: u32, material: Uuid, cell_width: i32, cell_height: i32) -> Self {
        Self {
            id,
            material,
            cell_width,
            cell_height,
            padding_x: 0,
            padding_y: 0,
            margin: [0; 4],
            offset_x: 0,
            offset_y: 0,
            rotation: 0.0,
            selection: TileSelection::default(),
            auto_pad: false,
            auto_pad_offset: 0.0,
        }
    }

    /// Cell stride in pixels including padding on both sides
    pub fn stride(&self) -> Vec2 {
        Vec2::new(
            (self.cell_width + 2 * self.padding_x) as f32,
            (self.cell_height + 2 * self.padding_y) as f32,
        )
    }

    /// Derived cell size including padding and margin must stay positive in
    /// both axes, and the selection must cover at least one cell.
    pub fn is_valid(&self) -> bool {
        let w = self.cell_width + 2 * self.padding_x + self.margin[1] + self.margin[3];
        let h = self.cell_height + 2 * self.padding_y + self.margin[0] + self.margin[2];
        w > 0 && h > 0 && self.selection.width >= 1 && self.selection.height >= 1
    }

    /// Re-derive padding from `auto_pad_offset`.
    ///
    /// Call after mutating `auto_pad` or `auto_pad_offset`; padding is only
    /// coupled to the offset while auto-pad is enabled.
    pub fn recompute_padding(&mut self) {
        if self.auto_pad {
            let pad = self.auto_pad_offset.round() as i32;
            self.padding_x = pad;
            self.padding_y = pad;
        }
    }

    /// Tiles per atlas row at the given image width
    pub fn row_size(&self, image_width: u32) -> i32 {
        let stride = self.stride().x;
        if stride <= 0.0 {
            return 1;
        }
        ((image_width as f32 / stride).floor() as i32).max(1)
    }

    /// Row-major packed id for a tile coordinate
    #[inline]
    pub fn pack_tile_id(&self, image_width: u32, tile_x: i32, tile_y: i32) -> i32 {
        tile_y * self.row_size(image_width) + tile_x
    }

    /// Tile coordinate for a packed id
    #[inline]
    pub fn unpack_tile_id(&self, image_width: u32, id: i32) -> (i32, i32) {
        let row = self.row_size(image_width);
        (id.rem_euclid(row), id.div_euclid(row))
    }

    /// Packed id of the current selection's origin cell
    pub fn selection_origin_id(&self, image_width: u32) -> i32 {
        self.pack_tile_id(image_width, self.selection.x, self.selection.y)
    }

    /// Pixel-space bounds of a tile run, padding and margin subtracted
    pub fn tile_bounds(&self, x: i32, y: i32, span_x: i32, span_y: i32) -> (Vec2, Vec2) {
        math::tile_bounds(
            self.cell_width as f32,
            self.cell_height as f32,
            Vec2::new(self.padding_x as f32, self.padding_y as f32),
            [
                self.margin[0] as f32,
                self.margin[1] as f32,
                self.margin[2] as f32,
                self.margin[3] as f32,
            ],
            x,
            y,
            span_x,
            span_y,
        )
    }
}

/// A material known to the registry, with its texture dimensions.
///
/// This mirrors the host's material list; `users` tracks how many host
/// objects still reference the material so orphaned grids can be pruned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialEntry {
    pub id: Uuid,
    pub name: String,
    pub image_width: u32,
    pub image_height: u32,
    pub users: u32,
}

/// All tile grids and the materials backing them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GridRegistry {
    materials: Vec<MaterialEntry>,
    grids: Vec<TileGrid>,
    next_grid_id: u32,
}

impl GridRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a material with its texture dimensions
    pub fn add_material(&mut self, name: &str, image_width: u32, image_height: u32) -> Uuid {
        let id = Uuid::new_v4();
        self.materials.push(MaterialEntry {
            id,
            name: name.to_string(),
            image_width,
            image_height,
            users: 1,
        });
        id
    }

    /// Remove a material; its grids are dropped on the next `prune`
    pub fn remove_material(&mut self, id: Uuid) -> Option<MaterialEntry> {
        self.materials
            .iter()
            .position(|m| m.id == id)
            .map(|pos| self.materials.remove(pos))
    }

    pub fn material(&self, id: Uuid) -> Option<&MaterialEntry> {
        self.materials.iter().find(|m| m.id == id)
    }

    pub fn material_mut(&mut self, id: Uuid) -> Option<&mut MaterialEntry> {
        self.materials.iter_mut().find(|m| m.id == id)
    }

    /// Create a grid on a registered material.
    ///
    /// Returns the new grid's id, or `None` when the material is unknown.
    pub fn add_grid(&mut self, material: Uuid, cell_width: i32, cell_height: i32) -> Option<u32> {
        self.material(material)?;
        let id = self.next_grid_id;
        self.next_grid_id += 1;
        self.grids.push(TileGrid::new(id, material, cell_width, cell_height));
        Some(id)
    }

    pub fn grid(&self, id: u32) -> Option<&TileGrid> {
        self.grids.iter().find(|g| g.id == id)
    }

    pub fn grid_mut(&mut self, id: u32) -> Option<&mut TileGrid> {
        self.grids.iter_mut().find(|g| g.id == id)
    }

    pub fn grids(&self) -> &[TileGrid] {
        &self.grids
    }

    /// Texture dimensions for a grid's material
    pub fn image_size(&self, grid_id: u32) -> Option<(u32, u32)> {
        let grid = self.grid(grid_id)?;
        let material = self.material(grid.material)?;
        Some((material.image_width, material.image_height))
    }

    /// Drop grids whose material was deleted or has no users left.
    ///
    /// Returns how many grids were removed.
    pub fn prune(&mut self) -> usize {
        let materials = &self.materials;
        let before = self.grids.len();
        self.grids.retain(|g| {
            materials
                .iter()
                .any(|m| m.id == g.material && m.users > 0)
        });
        before - self.grids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_never_collapses() {
        let sel = TileSelection::new(2, 3, 0, -4);
        assert_eq!((sel.width, sel.height), (1, 1));
        assert!(sel.contains(2, 3));
        assert!(!sel.contains(3, 3));
    }

    #[test]
    fn test_packed_tile_ids_round_trip() {
        let registry_material = Uuid::new_v4();
        let grid = TileGrid::new(0, registry_material, 16, 16);
        // 128px atlas / 16px cells = 8 tiles per row
        assert_eq!(grid.row_size(128), 8);
        let id = grid.pack_tile_id(128, 3, 2);
        assert_eq!(id, 19);
        assert_eq!(grid.unpack_tile_id(128, id), (3, 2));
    }

    #[test]
    fn test_auto_pad_recompute() {
        let mut grid = TileGrid::new(0, Uuid::new_v4(), 16, 16);
        grid.auto_pad = true;
        grid.auto_pad_offset = 2.4;
        grid.recompute_padding();
        assert_eq!((grid.padding_x, grid.padding_y), (2, 2));

        // Disabled auto-pad leaves padding alone
        grid.auto_pad = false;
        grid.auto_pad_offset = 9.0;
        grid.recompute_padding();
        assert_eq!((grid.padding_x, grid.padding_y), (2, 2));
    }

    #[test]
    fn test_validity_requires_positive_cell() {
        let mut grid = TileGrid::new(0, Uuid::new_v4(), 4, 4);
        assert!(grid.is_valid());
        grid.padding_x = -3;
        assert!(!grid.is_valid());
    }

    #[test]
    fn test_prune_drops_orphaned_grids() {
        let mut registry = GridRegistry::new();
        let kept = registry.add_material("atlas", 64, 64);
        let deleted = registry.add_material("doomed", 64, 64);
        let unused = registry.add_material("unused", 64, 64);

        registry.add_grid(kept, 16, 16).unwrap();
        registry.add_grid(deleted, 16, 16).unwrap();
        registry.add_grid(unused, 16, 16).unwrap();

        registry.remove_material(deleted);
        registry.material_mut(unused).unwrap().users = 0;

        assert_eq!(registry.prune(), 2);
        assert_eq!(registry.grids().len(), 1);
        assert_eq!(registry.grids()[0].material, kept);
    }

    #[test]
    fn test_grid_requires_known_material() {
        let mut registry = GridRegistry::new();
        assert!(registry.add_grid(Uuid::new_v4(), 16, 16).is_none());
    }

    #[test]
    fn test_registry_serialization_round_trip() {
        let mut registry = GridRegistry::new();
        let material = registry.add_material("atlas", 256, 256);
        let grid_id = registry.add_grid(material, 16, 16).unwrap();
        registry.grid_mut(grid_id).unwrap().selection = TileSelection::new(2, 1, 2, 2);

        let json = serde_json::to_string(&registry).unwrap();
        let restored: GridRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.grids().len(), 1);
        assert_eq!(restored.grid(grid_id).unwrap().selection.width, 2);
        assert_eq!(restored.material(material).unwrap().image_width, 256);
    }

    #[test]
    fn test_grid_ids_are_stable_across_prune() {
        let mut registry = GridRegistry::new();
        let a = registry.add_material("a", 64, 64);
        let b = registry.add_material("b", 64, 64);
        let first = registry.add_grid(a, 16, 16).unwrap();
        let second = registry.add_grid(b, 16, 16).unwrap();
        assert_ne!(first, second);

        registry.remove_material(a);
        registry.prune();
        assert!(registry.grid(first).is_none());
        assert!(registry.grid(second).is_some());
    }
}
