//! Extracted field values
//!
//! `ExtractedFields` keeps insertion order so that artifact columns follow the
//! order in which the schema declares its fields.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Value recorded for a field that could not be extracted
pub const PLACEHOLDER: &str = "N/A";

/// Ordered mapping from field name to extracted value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    entries: Vec<(String, String)>,
}

impl ExtractedFields {
    /// Creates an empty field set
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a field set with every name mapped to `"N/A"`
    pub fn placeholder<S: AsRef<str>>(names: &[S]) -> Self {
        let mut fields = Self::new();
        for name in names {
            fields.insert(name.as_ref(), PLACEHOLDER);
        }
        fields
    }

    /// Sets a field, replacing an existing value in place
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Returns the value of a field
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Field names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// `(name, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ExtractedFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
