//! Per-face integer attributes written by the UV mapper

use serde::{Deserialize, Serialize};

/// Layer mask matching only base-layer faces
pub const BASE_LAYER_MASK: u32 = 1 << 0;
/// Layer mask matching every work layer
pub const EVERY_LAYER_MASK: u32 = u32::MAX;

/// Logical z-offset layer a painted face belongs to.
///
/// Raycasts filter by layer so decals can sit on top of base geometry without
/// stealing its hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WorkLayer {
    #[default]
    Base,
    Decal,
}

impl WorkLayer {
    /// Integer tag stored in face metadata
    #[inline]
    pub fn tag(self) -> i32 {
        match self {
            Self::Base => 0,
            Self::Decal => 1,
        }
    }

    /// Rebuild from a stored tag; unknown tags are treated as decals
    pub fn from_tag(tag: i32) -> Self {
        if tag == 0 {
            Self::Base
        } else {
            Self::Decal
        }
    }

    /// Raycast mask matching only this layer
    #[inline]
    pub fn mask(self) -> u32 {
        1 << self.tag() as u32
    }
}

/// Tile metadata attached to each painted face.
///
/// Stored in the mesh's per-face integer attribute layers; read back by the
/// tile picker and by fill's lock-transform cache. Removed only with the
/// face itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceTileMetadata {
    /// Id of the grid that painted the face, -1 if unpainted
    pub grid_id: i32,
    /// Row-major packed tile id (`tile_y * row_size + tile_x`), -1 if unpainted
    pub tile_id: i32,
    /// Width of the selection the face was painted from, in cells
    pub sel_width: i32,
    /// Height of the selection the face was painted from, in cells
    pub sel_height: i32,
    /// Packed id of the selection's top-left cell, -1 if unknown
    pub sel_origin: i32,
    /// Work-layer tag (`WorkLayer::tag`)
    pub work_layer: i32,
    /// Packed paint settings (`PaintSettings::encode`)
    pub paint_settings: u32,
}

impl Default for FaceTileMetadata {
    fn default() -> Self {
        Self {
            grid_id: -1,
            tile_id: -1,
            sel_width: 1,
            sel_height: 1,
            sel_origin: -1,
            work_layer: WorkLayer::Base.tag(),
            paint_settings: 0,
        }
    }
}

impl FaceTileMetadata {
    /// Whether the face has been painted by any grid
    pub fn is_painted(&self) -> bool {
        self.grid_id >= 0 && self.tile_id >= 0
    }

    /// The face's work layer
    pub fn layer(&self) -> WorkLayer {
        WorkLayer::from_tag(self.work_layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_tags_round_trip() {
        assert_eq!(WorkLayer::from_tag(WorkLayer::Base.tag()), WorkLayer::Base);
        assert_eq!(WorkLayer::from_tag(WorkLayer::Decal.tag()), WorkLayer::Decal);
    }

    #[test]
    fn test_layer_masks_are_disjoint() {
        assert_eq!(WorkLayer::Base.mask() & WorkLayer::Decal.mask(), 0);
        assert_eq!(WorkLayer::Base.mask(), BASE_LAYER_MASK);
        assert_ne!(EVERY_LAYER_MASK & WorkLayer::Decal.mask(), 0);
    }

    #[test]
    fn test_default_metadata_is_unpainted() {
        let meta = FaceTileMetadata::default();
        assert!(!meta.is_painted());
        assert_eq!(meta.layer(), WorkLayer::Base);
        assert_eq!(meta.sel_origin, -1);
    }
}
