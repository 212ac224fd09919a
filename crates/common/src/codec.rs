//! Pick-buffer byte protocol.
//!
//! Every pixel of the ID render target holds four bytes. The first three carry
//! either a cube index or a ground position, the fourth says which:
//!
//! | byte 3    | meaning                                        |
//! |-----------|------------------------------------------------|
//! | 1..=6     | face of the cube whose index is in bytes 0..3  |
//! | 254       | background, nothing was hit                    |
//! | 255       | ground plane, bytes 0..3 hold a grid position  |
//!
//! Any other value decodes as background.

use crate::types::GridPos;
use glam::IVec3;
use serde::{Deserialize, Serialize};

/// Face byte written where no geometry was drawn.
pub const FACE_BACKGROUND: u8 = 254;
/// Face byte written by the ground plane.
pub const FACE_GROUND: u8 = 255;
/// Largest index representable in three bytes.
pub const MAX_PICKABLE: u32 = (1 << 24) - 1;
/// Largest |x| or |z| the ground encoding can carry.
pub const MAX_GROUND_COORD: i32 = 255;

const GROUND_NEG_X: u8 = 0x1;
const GROUND_NEG_Z: u8 = 0x2;
const GROUND_BELOW: u8 = 0x4;

/// Pack an index into three little-endian bytes. Bits above 24 are dropped.
pub fn encode_index(index: u32) -> [u8; 3] {
    [
        (index & 0xFF) as u8,
        ((index >> 8) & 0xFF) as u8,
        ((index >> 16) & 0xFF) as u8,
    ]
}

/// Inverse of [`encode_index`].
pub fn decode_index(bytes: [u8; 3]) -> u32 {
    bytes[0] as u32 + ((bytes[1] as u32) << 8) + ((bytes[2] as u32) << 16)
}

/// Decode the ground payload: magnitudes in bytes 0 and 1, sign and level flags in byte 2.
pub fn decode_position(bytes: [u8; 3]) -> GridPos {
    let flags = bytes[2];
    let mut x = bytes[0] as i32;
    if flags & GROUND_NEG_X != 0 {
        x = -x;
    }
    let mut z = bytes[1] as i32;
    if flags & GROUND_NEG_Z != 0 {
        z = -z;
    }
    let y = if flags & GROUND_BELOW != 0 { -1 } else { 0 };
    IVec3::new(x, y, z)
}

/// Inverse of [`decode_position`]. `None` when the cell cannot be represented.
pub fn encode_position(pos: GridPos) -> Option<[u8; 3]> {
    if pos.x.abs() > MAX_GROUND_COORD || pos.z.abs() > MAX_GROUND_COORD {
        return None;
    }
    let mut flags = 0;
    if pos.x < 0 {
        flags |= GROUND_NEG_X;
    }
    if pos.z < 0 {
        flags |= GROUND_NEG_Z;
    }
    match pos.y {
        0 => {}
        -1 => flags |= GROUND_BELOW,
        _ => return None,
    }
    Some([pos.x.unsigned_abs() as u8, pos.z.unsigned_abs() as u8, flags])
}

/// One of the six faces of a unit cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Face {
    Front,
    Back,
    Top,
    Bottom,
    Right,
    Left,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::Front,
        Face::Back,
        Face::Top,
        Face::Bottom,
        Face::Right,
        Face::Left,
    ];

    /// Face byte as written to the ID target. Zero is skipped on purpose.
    pub fn id(self) -> u8 {
        match self {
            Face::Front => 1,
            Face::Back => 2,
            Face::Top => 3,
            Face::Bottom => 4,
            Face::Right => 5,
            Face::Left => 6,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Face::Front),
            2 => Some(Face::Back),
            3 => Some(Face::Top),
            4 => Some(Face::Bottom),
            5 => Some(Face::Right),
            6 => Some(Face::Left),
            _ => None,
        }
    }

    /// Outward unit normal in grid space.
    pub fn normal(self) -> IVec3 {
        match self {
            Face::Front => IVec3::Z,
            Face::Back => IVec3::NEG_Z,
            Face::Top => IVec3::Y,
            Face::Bottom => IVec3::NEG_Y,
            Face::Right => IVec3::X,
            Face::Left => IVec3::NEG_X,
        }
    }

    /// Face whose outward normal matches `normal`, if it is axis-aligned.
    pub fn from_normal(normal: IVec3) -> Option<Self> {
        Face::ALL.into_iter().find(|f| f.normal() == normal)
    }
}

/// The four bytes sampled from the ID target at one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PickSample {
    pub id: [u8; 3],
    pub face: u8,
}

/// What a pick sample refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickHit {
    /// Nothing under the pointer.
    Background,
    /// A face of the cube at `index`.
    Face { index: u32, face: Face },
    /// Empty ground cell where a cube could be placed.
    Ground { position: GridPos },
}

impl PickSample {
    pub const BACKGROUND: Self = Self {
        id: [0, 0, 0],
        face: FACE_BACKGROUND,
    };

    pub fn from_rgba(rgba: [u8; 4]) -> Self {
        Self {
            id: [rgba[0], rgba[1], rgba[2]],
            face: rgba[3],
        }
    }

    pub fn to_rgba(self) -> [u8; 4] {
        [self.id[0], self.id[1], self.id[2], self.face]
    }

    pub fn cube(index: u32, face: Face) -> Self {
        Self {
            id: encode_index(index),
            face: face.id(),
        }
    }

    /// Sample for a ground cell, or background if the cell is out of encoding range.
    pub fn ground(position: GridPos) -> Self {
        match encode_position(position) {
            Some(id) => Self {
                id,
                face: FACE_GROUND,
            },
            None => Self::BACKGROUND,
        }
    }

    pub fn hit(self) -> PickHit {
        match self.face {
            FACE_GROUND => PickHit::Ground {
                position: decode_position(self.id),
            },
            byte => match Face::from_id(byte) {
                Some(face) => PickHit::Face {
                    index: decode_index(self.id),
                    face,
                },
                None => PickHit::Background,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_layout_is_little_endian() {
        assert_eq!(encode_index(0x0012_3456), [0x56, 0x34, 0x12]);
        assert_eq!(decode_index([0x56, 0x34, 0x12]), 0x0012_3456);
    }

    #[test]
    fn index_round_trip_across_range() {
        for i in (0..=MAX_PICKABLE).step_by(4099) {
            assert_eq!(decode_index(encode_index(i)), i);
        }
        for i in [0, 1, 255, 256, 65_535, 65_536, MAX_PICKABLE - 1, MAX_PICKABLE] {
            assert_eq!(decode_index(encode_index(i)), i);
        }
    }

    #[test]
    fn index_above_capacity_is_truncated() {
        assert_eq!(decode_index(encode_index(MAX_PICKABLE + 1)), 0);
        assert_eq!(decode_index(encode_index(MAX_PICKABLE + 6)), 5);
    }

    #[test]
    fn face_ids_skip_zero_and_sentinels() {
        for face in Face::ALL {
            let id = face.id();
            assert!((1..=6).contains(&id));
            assert_eq!(Face::from_id(id), Some(face));
        }
        assert_eq!(Face::from_id(0), None);
        assert_eq!(Face::from_id(FACE_BACKGROUND), None);
        assert_eq!(Face::from_id(FACE_GROUND), None);
    }

    #[test]
    fn face_normals_are_outward() {
        assert_eq!(Face::Front.normal(), IVec3::new(0, 0, 1));
        assert_eq!(Face::Back.normal(), IVec3::new(0, 0, -1));
        assert_eq!(Face::Top.normal(), IVec3::new(0, 1, 0));
        assert_eq!(Face::Bottom.normal(), IVec3::new(0, -1, 0));
        assert_eq!(Face::Right.normal(), IVec3::new(1, 0, 0));
        assert_eq!(Face::Left.normal(), IVec3::new(-1, 0, 0));
        for face in Face::ALL {
            assert_eq!(Face::from_normal(face.normal()), Some(face));
        }
        assert_eq!(Face::from_normal(IVec3::ONE), None);
    }

    #[test]
    fn decode_position_flags() {
        assert_eq!(decode_position([3, 4, 0]), IVec3::new(3, 0, 4));
        assert_eq!(decode_position([3, 4, 0x1]), IVec3::new(-3, 0, 4));
        assert_eq!(decode_position([3, 4, 0x2]), IVec3::new(3, 0, -4));
        assert_eq!(decode_position([3, 4, 0x7]), IVec3::new(-3, -1, -4));
    }

    #[test]
    fn encode_position_inverts_decode() {
        for pos in [
            IVec3::new(0, 0, 0),
            IVec3::new(-7, 0, 12),
            IVec3::new(255, -1, -255),
        ] {
            let bytes = encode_position(pos).unwrap();
            assert_eq!(decode_position(bytes), pos);
        }
    }

    #[test]
    fn encode_position_rejects_out_of_range() {
        assert_eq!(encode_position(IVec3::new(256, 0, 0)), None);
        assert_eq!(encode_position(IVec3::new(0, 0, -300)), None);
        assert_eq!(encode_position(IVec3::new(0, 1, 0)), None);
    }

    #[test]
    fn sample_decodes_cube_hit() {
        let sample = PickSample::from_rgba([0x02, 0x01, 0x00, 3]);
        assert_eq!(
            sample.hit(),
            PickHit::Face {
                index: 258,
                face: Face::Top
            }
        );
        assert_eq!(PickSample::cube(258, Face::Top), sample);
    }

    #[test]
    fn sample_decodes_sentinels() {
        assert_eq!(PickSample::BACKGROUND.hit(), PickHit::Background);
        assert_eq!(
            PickSample::from_rgba([9, 9, 9, 0]).hit(),
            PickHit::Background
        );
        assert_eq!(
            PickSample::from_rgba([9, 9, 9, 100]).hit(),
            PickHit::Background
        );
        assert_eq!(
            PickSample::from_rgba([2, 5, 0x2, FACE_GROUND]).hit(),
            PickHit::Ground {
                position: IVec3::new(2, 0, -5)
            }
        );
    }

    #[test]
    fn ground_sample_out_of_range_is_background() {
        assert_eq!(
            PickSample::ground(IVec3::new(1000, 0, 0)),
            PickSample::BACKGROUND
        );
    }

    #[test]
    fn rgba_round_trip() {
        let rgba = [1, 2, 3, 4];
        assert_eq!(PickSample::from_rgba(rgba).to_rgba(), rgba);
    }
}
