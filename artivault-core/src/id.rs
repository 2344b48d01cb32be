//! Durable, namespaced identifiers.
//!
//! Unlike in-process counters, these survive a restart: they're random v4 UUIDs, and render
//! as the usual hyphenated text.

use std::marker::PhantomData;

/// An ID for a `T`. The namespace only exists at compile time.
pub struct DurableID<T> {
    id: uuid::Uuid,
    _phantom: PhantomData<fn() -> T>,
}
impl<T> DurableID<T> {
    /// A fresh random ID.
    #[must_use]
    pub fn new() -> Self {
        Self::from_uuid(uuid::Uuid::new_v4())
    }
    #[must_use]
    pub fn from_uuid(id: uuid::Uuid) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }
    #[must_use]
    pub fn uuid(&self) -> uuid::Uuid {
        self.id
    }
}
impl<T> Default for DurableID<T> {
    fn default() -> Self {
        Self::new()
    }
}
// Manual impls, derives would demand `T: Clone` and friends.
impl<T> Clone for DurableID<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for DurableID<T> {}
impl<T> PartialEq for DurableID<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl<T> Eq for DurableID<T> {}
impl<T> PartialOrd for DurableID<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl<T> Ord for DurableID<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}
impl<T> std::hash::Hash for DurableID<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
impl<T> std::fmt::Debug for DurableID<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = std::any::type_name::<T>();
        // Just the type's name, not the whole path.
        let name = name.rsplit("::").next().unwrap_or(name);
        write!(f, "{name}ID({})", self.id)
    }
}
impl<T> std::fmt::Display for DurableID<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.id.as_hyphenated(), f)
    }
}
impl<T> std::str::FromStr for DurableID<T> {
    type Err = uuid::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self::from_uuid)
    }
}
impl<T> serde::Serialize for DurableID<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.id.serialize(serializer)
    }
}
impl<'de, T> serde::Deserialize<'de> for DurableID<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        uuid::Uuid::deserialize(deserializer).map(Self::from_uuid)
    }
}

#[cfg(test)]
mod test {
    use super::DurableID;
    struct Thing;

    #[test]
    fn unique_and_parseable() {
        let a = DurableID::<Thing>::new();
        let b = DurableID::<Thing>::new();
        assert_ne!(a, b);
        let text = a.to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(text.parse::<DurableID<Thing>>().unwrap(), a);
        assert!("not-an-id".parse::<DurableID<Thing>>().is_err());
        assert!(format!("{a:?}").starts_with("ThingID("));
    }
}
