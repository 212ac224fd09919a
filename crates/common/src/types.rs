use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

/// Integer grid cell occupied by a unit cube.
pub type GridPos = IVec3;

/// Errors from strict `#RRGGBB` parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexColourError {
    #[error("colour {0:?} is not a 7-character #RRGGBB string")]
    Malformed(String),
    #[error("colour {text:?} has a non-hex {channel} channel")]
    BadChannel { text: String, channel: &'static str },
}

/// Linear RGB colour with components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Colour {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Colour {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Build a colour from 8-bit channels, each mapped to `byte / 255.0`.
    pub fn from_bytes(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Parse a `#RRGGBB` string.
    pub fn parse_hex(text: &str) -> Result<Self, HexColourError> {
        if text.len() != 7 || !text.is_ascii() || !text.starts_with('#') {
            return Err(HexColourError::Malformed(text.to_string()));
        }
        let channel = |range: std::ops::Range<usize>, name: &'static str| {
            u8::from_str_radix(&text[range], 16).map_err(|_| HexColourError::BadChannel {
                text: text.to_string(),
                channel: name,
            })
        };
        let r = channel(1..3, "red")?;
        let g = channel(3..5, "green")?;
        let b = channel(5..7, "blue")?;
        Ok(Self::from_bytes(r, g, b))
    }

    /// Lenient parse used for colour-picker values: anything malformed is black.
    pub fn from_hex(text: &str) -> Self {
        match Self::parse_hex(text) {
            Ok(colour) => colour,
            Err(e) => {
                tracing::debug!("falling back to black: {e}");
                Self::BLACK
            }
        }
    }

    /// Format as `#RRGGBB`, rounding each channel to the nearest byte.
    pub fn to_hex(self) -> String {
        let [r, g, b] = self.to_bytes();
        format!("#{r:02X}{g:02X}{b:02X}")
    }

    pub fn to_bytes(self) -> [u8; 3] {
        let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [byte(self.r), byte(self.g), byte(self.b)]
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<Vec3> for Colour {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Colour> for Vec3 {
    fn from(c: Colour) -> Self {
        Vec3::new(c.r, c.g, c.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_maps_bytes_to_unit_range() {
        let c = Colour::parse_hex("#FF8000").unwrap();
        assert_eq!(c.r, 1.0);
        assert_eq!(c.g, 128.0 / 255.0);
        assert_eq!(c.b, 0.0);
    }

    #[test]
    fn parse_hex_accepts_lowercase() {
        let c = Colour::parse_hex("#00ff7f").unwrap();
        assert_eq!(c.to_bytes(), [0, 255, 127]);
    }

    #[test]
    fn parse_hex_rejects_wrong_length() {
        assert!(matches!(
            Colour::parse_hex("#FFF"),
            Err(HexColourError::Malformed(_))
        ));
        assert!(Colour::parse_hex("FF8000A").is_err());
    }

    #[test]
    fn parse_hex_rejects_bad_channel() {
        let err = Colour::parse_hex("#12GG34").unwrap_err();
        assert_eq!(
            err,
            HexColourError::BadChannel {
                text: "#12GG34".into(),
                channel: "green"
            }
        );
    }

    #[test]
    fn from_hex_falls_back_to_black() {
        assert_eq!(Colour::from_hex("not a colour"), Colour::BLACK);
        assert_eq!(Colour::from_hex(""), Colour::BLACK);
        assert_eq!(Colour::from_hex("#éé0000"), Colour::BLACK);
    }

    #[test]
    fn to_hex_formats_uppercase() {
        assert_eq!(Colour::new(0.0, 0.5, 1.0).to_hex(), "#0080FF");
        assert_eq!(Colour::from_hex("#3a7bd5").to_hex(), "#3A7BD5");
    }

    #[test]
    fn vec3_conversion() {
        let v: Vec3 = Colour::new(0.1, 0.2, 0.3).into();
        assert_eq!(Colour::from(v), Colour::new(0.1, 0.2, 0.3));
    }
}
