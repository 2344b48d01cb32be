use crate::util::{FiniteF32, FiniteF32Error};

/// A straight (non-premultiplied) RGBA color, each channel in `[0, 1]`.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "[f32; 4]", into = "[f32; 4]")]
pub struct Color([FiniteF32; 4]);
impl Color {
    pub const TRANSPARENT: Self = Self([FiniteF32::ZERO; 4]);
    pub const WHITE: Self = Self([FiniteF32::ONE; 4]);
    pub const BLACK: Self = Self([
        FiniteF32::ZERO,
        FiniteF32::ZERO,
        FiniteF32::ZERO,
        FiniteF32::ONE,
    ]);
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Result<Self, ColorError> {
        let mut channels = [FiniteF32::ZERO; 4];
        for (channel, value) in channels.iter_mut().zip([r, g, b, a]) {
            let value = FiniteF32::new(value)?;
            if !(0.0..=1.0).contains(&value.get()) {
                return Err(ColorError::OutOfRange);
            }
            *channel = value;
        }
        Ok(Self(channels))
    }
    pub fn from_array([r, g, b, a]: [f32; 4]) -> Result<Self, ColorError> {
        Self::new(r, g, b, a)
    }
    #[must_use]
    pub fn as_array(&self) -> [f32; 4] {
        self.0.map(FiniteF32::get)
    }
    #[must_use]
    pub const fn as_finite_array(&self) -> [FiniteF32; 4] {
        self.0
    }
    /// Format as `#rrggbbaa`, rounding each channel to 8 bits.
    #[must_use]
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = self.as_array().map(|c| (c * 255.0).round() as u8);
        format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}
impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}
impl TryFrom<[f32; 4]> for Color {
    type Error = ColorError;
    fn try_from(value: [f32; 4]) -> Result<Self, Self::Error> {
        Self::from_array(value)
    }
}
impl From<Color> for [f32; 4] {
    fn from(value: Color) -> Self {
        value.as_array()
    }
}
/// Parses `#rgb`, `#rrggbb`, or `#rrggbbaa`. The leading `#` is optional.
impl std::str::FromStr for Color {
    type Err = ColorError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        let nibble = |c: u8| -> Result<u8, ColorError> {
            (c as char)
                .to_digit(16)
                .map(|d| d as u8)
                .ok_or(ColorError::BadHex)
        };
        let bytes = hex.as_bytes();
        let channels: Vec<u8> = match bytes.len() {
            3 => bytes
                .iter()
                .map(|&c| nibble(c).map(|n| n * 17))
                .collect::<Result<_, _>>()?,
            6 | 8 => bytes
                .chunks_exact(2)
                .map(|pair| Ok(nibble(pair[0])? << 4 | nibble(pair[1])?))
                .collect::<Result<_, ColorError>>()?,
            _ => return Err(ColorError::BadHex),
        };
        let channel = |idx: usize| f32::from(channels.get(idx).copied().unwrap_or(255)) / 255.0;
        Self::new(channel(0), channel(1), channel(2), channel(3))
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorError {
    #[error("color channel {}", .0)]
    NotFinite(#[from] FiniteF32Error),
    #[error("color channel outside of [0, 1]")]
    OutOfRange,
    #[error("expected a color like #rrggbb or #rrggbbaa")]
    BadHex,
}

#[cfg(test)]
mod test {
    use super::{Color, ColorError};
    #[test]
    fn range_checked() {
        assert_eq!(Color::new(1.5, 0.0, 0.0, 1.0), Err(ColorError::OutOfRange));
        assert!(matches!(
            Color::new(f32::NAN, 0.0, 0.0, 1.0),
            Err(ColorError::NotFinite(_))
        ));
        assert_eq!(Color::new(0.0, 0.0, 0.0, 1.0), Ok(Color::BLACK));
    }
    #[test]
    fn hex() {
        assert_eq!("#000".parse::<Color>(), Ok(Color::BLACK));
        assert_eq!("ffffffff".parse::<Color>(), Ok(Color::WHITE));
        assert_eq!("#ff000080".parse::<Color>().unwrap().to_hex(), "#ff000080");
        assert_eq!("#12345".parse::<Color>(), Err(ColorError::BadHex));
        assert_eq!("#gg0000".parse::<Color>(), Err(ColorError::BadHex));
    }
}
