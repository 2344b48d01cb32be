//! Utility types, used throughout the crate.

/// A float which is finite (non-NaN, non-infinite).
///
/// Stroke geometry and styles are built from these so that drawings can be compared
/// for equality, which the codec round-trip relies upon.
#[derive(Copy, Clone, PartialEq, PartialOrd, Debug, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "f32", into = "f32")]
#[repr(transparent)]
pub struct FiniteF32(f32);
impl FiniteF32 {
    pub const ZERO: Self = Self(0.0);
    pub const ONE: Self = Self(1.0);
    pub fn new(val: f32) -> Result<Self, FiniteF32Error> {
        if val.is_finite() {
            Ok(Self(val))
        } else {
            Err(FiniteF32Error::NotFinite)
        }
    }
    #[must_use]
    pub fn get(self) -> f32 {
        self.0
    }
    /// Little-endian bit pattern, as stored on disk.
    #[must_use]
    pub fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
    /// Read back a value written by [`Self::to_le_bytes`].
    pub fn from_le_bytes(bytes: [u8; 4]) -> Result<Self, FiniteF32Error> {
        Self::new(f32::from_le_bytes(bytes))
    }
}

impl Default for FiniteF32 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl TryFrom<f32> for FiniteF32 {
    type Error = FiniteF32Error;
    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
impl From<FiniteF32> for f32 {
    fn from(value: FiniteF32) -> Self {
        value.get()
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FiniteF32Error {
    #[error("not finite")]
    NotFinite,
}

// No component is ever NaN, so PartialEq acts like Eq.
impl Eq for FiniteF32 {}
#[allow(clippy::derive_ord_xor_partial_ord)]
impl Ord for FiniteF32 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Never None, NaN is unrepresentable.
        self.0
            .partial_cmp(&other.0)
            .unwrap_or(std::cmp::Ordering::Equal)
    }
}
impl std::hash::Hash for FiniteF32 {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // -0.0 == 0.0, so they must hash alike.
        let normalized = if self.0 == 0.0 { 0.0f32 } else { self.0 };
        state.write_u32(normalized.to_bits());
    }
}
impl std::fmt::Display for FiniteF32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod test {
    use super::{FiniteF32, FiniteF32Error};
    #[test]
    fn rejects_non_finite() {
        assert_eq!(FiniteF32::new(f32::NAN), Err(FiniteF32Error::NotFinite));
        assert_eq!(FiniteF32::new(f32::INFINITY), Err(FiniteF32Error::NotFinite));
        assert_eq!(
            FiniteF32::new(f32::NEG_INFINITY),
            Err(FiniteF32Error::NotFinite)
        );
        assert_eq!(FiniteF32::new(2.5).map(FiniteF32::get), Ok(2.5));
    }
    #[test]
    fn le_bytes() {
        let value = FiniteF32::new(-13.75).unwrap();
        assert_eq!(FiniteF32::from_le_bytes(value.to_le_bytes()), Ok(value));
        assert!(FiniteF32::from_le_bytes(f32::NAN.to_le_bytes()).is_err());
    }
    #[test]
    fn signed_zero() {
        let neg = FiniteF32::new(-0.0).unwrap();
        assert_eq!(neg, FiniteF32::ZERO);
        assert_eq!(neg.cmp(&FiniteF32::ZERO), std::cmp::Ordering::Equal);
    }
}
