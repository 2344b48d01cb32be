//! Tool descriptors, as handed to the ink-capture surface.

use crate::stroke::StrokeStyle;

#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Default,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum EraserMode {
    /// Removes whole strokes it touches.
    Vector,
    /// Removes only the pixels it touches, splitting strokes.
    #[default]
    Bitmap,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case", tag = "tool")]
pub enum Tool {
    Ink(StrokeStyle),
    Eraser { mode: EraserMode },
}
impl Default for Tool {
    fn default() -> Self {
        Self::Ink(StrokeStyle::default())
    }
}
impl Tool {
    #[must_use]
    pub fn eraser(mode: EraserMode) -> Self {
        Self::Eraser { mode }
    }
    #[must_use]
    pub fn is_eraser(&self) -> bool {
        matches!(self, Self::Eraser { .. })
    }
    #[must_use]
    pub fn style(&self) -> Option<&StrokeStyle> {
        match self {
            Self::Ink(style) => Some(style),
            Self::Eraser { .. } => None,
        }
    }
}
