//! # Strokes
//!
//! A [`Drawing`] is an ordered list of [`Stroke`]s, each a path of points plus the style it was
//! inked with. Geometry is carried, never interpreted - rendering is the ink surface's business.

use crate::{
    color::Color,
    util::{FiniteF32, FiniteF32Error},
};

/// A single sampled point of a stroke.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Point {
    x: FiniteF32,
    y: FiniteF32,
    /// Normalized stylus force. Touch input reports 1.0.
    pressure: FiniteF32,
}
impl Point {
    /// Number of bytes one point occupies on disk.
    pub const ENCODED_LEN: usize = 12;
    pub fn new(x: f32, y: f32, pressure: f32) -> Result<Self, FiniteF32Error> {
        Ok(Self {
            x: FiniteF32::new(x)?,
            y: FiniteF32::new(y)?,
            pressure: FiniteF32::new(pressure)?,
        })
    }
    #[must_use]
    pub fn from_finite(x: FiniteF32, y: FiniteF32, pressure: FiniteF32) -> Self {
        Self { x, y, pressure }
    }
    #[must_use]
    pub fn position(&self) -> [f32; 2] {
        [self.x.get(), self.y.get()]
    }
    #[must_use]
    pub fn pressure(&self) -> f32 {
        self.pressure.get()
    }
    #[must_use]
    pub fn as_finite_array(&self) -> [FiniteF32; 3] {
        [self.x, self.y, self.pressure]
    }
}

/// Ink styles offered by the tool palette.
///
/// The discriminant is the on-disk tag - never renumber.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Default,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::FromRepr,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum InkKind {
    #[default]
    Pen = 0,
    Pencil = 1,
    Marker = 2,
    Monoline = 3,
    FountainPen = 4,
    Watercolor = 5,
    Crayon = 6,
}
impl InkKind {
    #[must_use]
    pub fn tag(self) -> u8 {
        self as u8
    }
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::from_repr(tag)
    }
}

/// Per-stroke settings, captured from the active tool at the moment the stroke was inked.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawStrokeStyle", into = "RawStrokeStyle")]
pub struct StrokeStyle {
    ink: InkKind,
    color: Color,
    /// Nominal diameter, in canvas points. Always > 0.
    width: FiniteF32,
}
impl StrokeStyle {
    pub fn new(ink: InkKind, color: Color, width: f32) -> Result<Self, StyleError> {
        let width = FiniteF32::new(width)?;
        if width.get() <= 0.0 {
            return Err(StyleError::NonPositiveWidth);
        }
        Ok(Self { ink, color, width })
    }
    #[must_use]
    pub fn ink(&self) -> InkKind {
        self.ink
    }
    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }
    #[must_use]
    pub fn width(&self) -> f32 {
        self.width.get()
    }
    #[must_use]
    pub fn with_ink(self, ink: InkKind) -> Self {
        Self { ink, ..self }
    }
    #[must_use]
    pub fn with_color(self, color: Color) -> Self {
        Self { color, ..self }
    }
    pub fn with_width(self, width: f32) -> Result<Self, StyleError> {
        Self::new(self.ink, self.color, width)
    }
}
impl Default for StrokeStyle {
    /// Black pen, three points wide.
    fn default() -> Self {
        Self {
            ink: InkKind::Pen,
            color: Color::BLACK,
            width: FiniteF32::new(3.0).unwrap_or(FiniteF32::ONE),
        }
    }
}
#[derive(serde::Serialize, serde::Deserialize)]
struct RawStrokeStyle {
    ink: InkKind,
    color: Color,
    width: f32,
}
impl TryFrom<RawStrokeStyle> for StrokeStyle {
    type Error = StyleError;
    fn try_from(raw: RawStrokeStyle) -> Result<Self, Self::Error> {
        Self::new(raw.ink, raw.color, raw.width)
    }
}
impl From<StrokeStyle> for RawStrokeStyle {
    fn from(style: StrokeStyle) -> Self {
        Self {
            ink: style.ink,
            color: style.color,
            width: style.width.get(),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleError {
    #[error("stroke width {}", .0)]
    NotFinite(#[from] FiniteF32Error),
    #[error("stroke width must be greater than zero")]
    NonPositiveWidth,
}

/// One continuous ink gesture.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Stroke {
    pub style: StrokeStyle,
    pub points: Vec<Point>,
}
impl Stroke {
    #[must_use]
    pub fn new(style: StrokeStyle, points: Vec<Point>) -> Self {
        Self { style, points }
    }
    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// An ordered collection of strokes. Later strokes draw over earlier ones.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Drawing {
    strokes: Vec<Stroke>,
}
impl Drawing {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }
    pub fn iter(&self) -> std::slice::Iter<'_, Stroke> {
        self.strokes.iter()
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.strokes.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }
    /// Total number of points over every stroke.
    #[must_use]
    pub fn point_count(&self) -> usize {
        self.strokes.iter().map(Stroke::len).sum()
    }
    #[must_use]
    pub fn last(&self) -> Option<&Stroke> {
        self.strokes.last()
    }
    pub fn push(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
    }
    pub fn pop(&mut self) -> Option<Stroke> {
        self.strokes.pop()
    }
    /// Append every stroke of `other` after the strokes of `self`, preserving order.
    pub fn append(&mut self, other: &Drawing) {
        self.strokes.extend_from_slice(&other.strokes);
    }
}
impl From<Vec<Stroke>> for Drawing {
    fn from(strokes: Vec<Stroke>) -> Self {
        Self { strokes }
    }
}
impl FromIterator<Stroke> for Drawing {
    fn from_iter<T: IntoIterator<Item = Stroke>>(iter: T) -> Self {
        Self {
            strokes: iter.into_iter().collect(),
        }
    }
}
impl Extend<Stroke> for Drawing {
    fn extend<T: IntoIterator<Item = Stroke>>(&mut self, iter: T) {
        self.strokes.extend(iter);
    }
}
impl<'a> IntoIterator for &'a Drawing {
    type Item = &'a Stroke;
    type IntoIter = std::slice::Iter<'a, Stroke>;
    fn into_iter(self) -> Self::IntoIter {
        self.strokes.iter()
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::{Drawing, InkKind, Point, Stroke, StrokeStyle, StyleError};
    use crate::color::Color;

    /// A small stroke whose points are offset by `seed`, so different seeds compare unequal.
    pub(crate) fn stroke(seed: f32) -> Stroke {
        let points = (0..4)
            .map(|i| Point::new(seed + i as f32, seed * 2.0 - i as f32, 0.5).unwrap())
            .collect();
        Stroke::new(StrokeStyle::default(), points)
    }

    #[test]
    fn append_preserves_order() {
        let mut a: Drawing = [stroke(1.0), stroke(2.0)].into_iter().collect();
        let b: Drawing = [stroke(3.0)].into_iter().collect();
        a.append(&b);
        assert_eq!(a.strokes(), &[stroke(1.0), stroke(2.0), stroke(3.0)]);
        assert_eq!(a.point_count(), 12);
    }
    #[test]
    fn style_validation() {
        assert_eq!(
            StrokeStyle::new(InkKind::Marker, Color::BLACK, 0.0),
            Err(StyleError::NonPositiveWidth)
        );
        assert!(matches!(
            StrokeStyle::new(InkKind::Marker, Color::BLACK, f32::NAN),
            Err(StyleError::NotFinite(_))
        ));
        let style = StrokeStyle::default();
        assert_eq!(style.ink(), InkKind::Pen);
        assert_eq!(style.color(), Color::BLACK);
        assert_eq!(style.width(), 3.0);
    }
    #[test]
    fn ink_tags_are_stable() {
        use strum::IntoEnumIterator;
        for (expected, ink) in InkKind::iter().enumerate() {
            assert_eq!(usize::from(ink.tag()), expected);
            assert_eq!(InkKind::from_tag(ink.tag()), Some(ink));
        }
        assert_eq!(InkKind::from_tag(200), None);
        assert_eq!("fountain-pen".parse::<InkKind>(), Ok(InkKind::FountainPen));
        assert_eq!(InkKind::Watercolor.to_string(), "watercolor");
    }
}
