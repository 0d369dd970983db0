//! Per-face paint settings and their packed integer codec

use serde::{Deserialize, Serialize};

/// Mask for the alignment code (0 = unset, 1-9 = `TileAlignment`)
pub const ALIGNMENT_MASK: u32 = 0x000F;
/// Bit flag for vertical stretch
pub const STRETCH_Y_BIT: u32 = 1 << 4;
/// Bit flag for horizontal stretch
pub const STRETCH_X_BIT: u32 = 1 << 5;
/// Bit flag for edge snapping
pub const EDGE_SNAP_BIT: u32 = 1 << 6;
/// Bit flag for texel snapping
pub const UV_SNAP_BIT: u32 = 1 << 7;
/// Bit flag for vertical flip
pub const FLIP_Y_BIT: u32 = 1 << 8;
/// Bit flag for horizontal flip
pub const FLIP_X_BIT: u32 = 1 << 9;
/// Shift for the 2-bit rotation quadrant
pub const ROTATION_SHIFT: u32 = 10;
/// Mask for the rotation quadrant (after shifting)
pub const ROTATION_MASK: u32 = 0b11 << ROTATION_SHIFT;

/// Where the UV island sits inside its tile cell when it does not fill it.
///
/// Codes 1-9 pack into the low nibble of the settings bitfield; 0 is "unset".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TileAlignment {
    TopLeft = 1,
    Top = 2,
    TopRight = 3,
    Left = 4,
    Center = 5,
    Right = 6,
    BottomLeft = 7,
    Bottom = 8,
    BottomRight = 9,
}

impl TileAlignment {
    /// Packed code for this alignment (1-9)
    #[inline]
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Decode a packed alignment code; 0 and out-of-range codes are unset
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::TopLeft),
            2 => Some(Self::Top),
            3 => Some(Self::TopRight),
            4 => Some(Self::Left),
            5 => Some(Self::Center),
            6 => Some(Self::Right),
            7 => Some(Self::BottomLeft),
            8 => Some(Self::Bottom),
            9 => Some(Self::BottomRight),
            _ => None,
        }
    }

    /// Horizontal component: -1 left, 0 centered, +1 right
    pub fn horizontal(self) -> i32 {
        match self {
            Self::TopLeft | Self::Left | Self::BottomLeft => -1,
            Self::Top | Self::Center | Self::Bottom => 0,
            Self::TopRight | Self::Right | Self::BottomRight => 1,
        }
    }

    /// Vertical component: -1 bottom, 0 centered, +1 top
    pub fn vertical(self) -> i32 {
        match self {
            Self::BottomLeft | Self::Bottom | Self::BottomRight => -1,
            Self::Left | Self::Center | Self::Right => 0,
            Self::TopLeft | Self::Top | Self::TopRight => 1,
        }
    }

    /// Rebuild an alignment from its horizontal/vertical components
    pub fn from_components(horizontal: i32, vertical: i32) -> Self {
        match (horizontal.signum(), vertical.signum()) {
            (-1, 1) => Self::TopLeft,
            (0, 1) => Self::Top,
            (1, 1) => Self::TopRight,
            (-1, 0) => Self::Left,
            (1, 0) => Self::Right,
            (-1, -1) => Self::BottomLeft,
            (0, -1) => Self::Bottom,
            (1, -1) => Self::BottomRight,
            _ => Self::Center,
        }
    }
}

/// Quarter-turn rotation applied to a tile before mapping.
///
/// The quadrant codes match the packed layout: 0 = 0°, 1 = 270°, 2 = 180°,
/// 3 = 90°, counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum TileRotation {
    #[default]
    None = 0,
    Ccw270 = 1,
    Ccw180 = 2,
    Ccw90 = 3,
}

impl TileRotation {
    /// Packed quadrant code (0-3)
    #[inline]
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Decode a quadrant code, wrapping out-of-range values
    pub fn from_code(code: u32) -> Self {
        match code & 0b11 {
            1 => Self::Ccw270,
            2 => Self::Ccw180,
            3 => Self::Ccw90,
            _ => Self::None,
        }
    }

    /// Rotation angle in radians
    pub fn radians(self) -> f32 {
        use std::f32::consts::FRAC_PI_2;
        match self {
            Self::None => 0.0,
            Self::Ccw90 => FRAC_PI_2,
            Self::Ccw180 => 2.0 * FRAC_PI_2,
            Self::Ccw270 => 3.0 * FRAC_PI_2,
        }
    }

    /// Number of counter-clockwise quarter turns (0-3)
    pub fn quarter_turns(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Ccw90 => 1,
            Self::Ccw180 => 2,
            Self::Ccw270 => 3,
        }
    }
}

/// Paint options applied when mapping a tile onto a face.
///
/// The whole struct round-trips losslessly through [`PaintSettings::encode`] /
/// [`PaintSettings::decode`], which is what lets the tile picker and fill's
/// lock-transform cache restore a face's paint state from its metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaintSettings {
    /// Alignment of the UV island inside the tile cell; `None` leaves the
    /// island where projection put it
    pub alignment: Option<TileAlignment>,
    /// Scale the island to exactly fill the tile width
    pub stretch_x: bool,
    /// Scale the island to exactly fill the tile height
    pub stretch_y: bool,
    /// Clamp UVs near a tile edge onto the edge
    pub edge_snap: bool,
    /// Snap final UVs to texel centers
    pub uv_snap: bool,
    /// Mirror the tile horizontally
    pub flip_x: bool,
    /// Mirror the tile vertically
    pub flip_y: bool,
    /// Quarter-turn rotation
    pub rotation: TileRotation,
}

impl PaintSettings {
    /// Pack into the per-face integer attribute layout
    pub fn encode(&self) -> u32 {
        let mut packed = self.alignment.map(TileAlignment::code).unwrap_or(0);
        if self.stretch_y {
            packed |= STRETCH_Y_BIT;
        }
        if self.stretch_x {
            packed |= STRETCH_X_BIT;
        }
        if self.edge_snap {
            packed |= EDGE_SNAP_BIT;
        }
        if self.uv_snap {
            packed |= UV_SNAP_BIT;
        }
        if self.flip_y {
            packed |= FLIP_Y_BIT;
        }
        if self.flip_x {
            packed |= FLIP_X_BIT;
        }
        packed |= self.rotation.code() << ROTATION_SHIFT;
        packed
    }

    /// Exact inverse of [`PaintSettings::encode`]
    pub fn decode(packed: u32) -> Self {
        Self {
            alignment: TileAlignment::from_code(packed & ALIGNMENT_MASK),
            stretch_y: packed & STRETCH_Y_BIT != 0,
            stretch_x: packed & STRETCH_X_BIT != 0,
            edge_snap: packed & EDGE_SNAP_BIT != 0,
            uv_snap: packed & UV_SNAP_BIT != 0,
            flip_y: packed & FLIP_Y_BIT != 0,
            flip_x: packed & FLIP_X_BIT != 0,
            rotation: TileRotation::from_code((packed & ROTATION_MASK) >> ROTATION_SHIFT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALIGNMENTS: [Option<TileAlignment>; 10] = [
        None,
        Some(TileAlignment::TopLeft),
        Some(TileAlignment::Top),
        Some(TileAlignment::TopRight),
        Some(TileAlignment::Left),
        Some(TileAlignment::Center),
        Some(TileAlignment::Right),
        Some(TileAlignment::BottomLeft),
        Some(TileAlignment::Bottom),
        Some(TileAlignment::BottomRight),
    ];

    const ROTATIONS: [TileRotation; 4] = [
        TileRotation::None,
        TileRotation::Ccw90,
        TileRotation::Ccw180,
        TileRotation::Ccw270,
    ];

    #[test]
    fn test_codec_round_trip_all_fields() {
        for alignment in ALIGNMENTS {
            for rotation in ROTATIONS {
                for bits in 0u32..64 {
                    let settings = PaintSettings {
                        alignment,
                        stretch_x: bits & 1 != 0,
                        stretch_y: bits & 2 != 0,
                        edge_snap: bits & 4 != 0,
                        uv_snap: bits & 8 != 0,
                        flip_x: bits & 16 != 0,
                        flip_y: bits & 32 != 0,
                        rotation,
                    };
                    assert_eq!(PaintSettings::decode(settings.encode()), settings);
                }
            }
        }
    }

    #[test]
    fn test_bit_layout_matches_packed_format() {
        let settings = PaintSettings {
            alignment: Some(TileAlignment::BottomRight),
            stretch_y: true,
            flip_x: true,
            rotation: TileRotation::Ccw90,
            ..Default::default()
        };
        let packed = settings.encode();
        assert_eq!(packed & ALIGNMENT_MASK, 9);
        assert_ne!(packed & STRETCH_Y_BIT, 0);
        assert_ne!(packed & FLIP_X_BIT, 0);
        assert_eq!((packed & ROTATION_MASK) >> ROTATION_SHIFT, 3);
    }

    #[test]
    fn test_default_encodes_to_zero() {
        assert_eq!(PaintSettings::default().encode(), 0);
        assert_eq!(PaintSettings::decode(0), PaintSettings::default());
    }

    #[test]
    fn test_alignment_components_round_trip() {
        for alignment in ALIGNMENTS.into_iter().flatten() {
            let rebuilt =
                TileAlignment::from_components(alignment.horizontal(), alignment.vertical());
            assert_eq!(rebuilt, alignment);
        }
    }
}
