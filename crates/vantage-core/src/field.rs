//! three-state nested values and dotted field paths.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// a nested object that distinguishes "not set" from "set but empty".
///
/// `Empty` travels as `{}` on the wire and is a meaningful value: it asks the
/// service to clear the object rather than leave it untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Nested<T> {
    #[default]
    Absent,
    Empty,
    Present(T),
}

impl<T> Nested<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Nested::Absent)
    }

    /// true for the explicit empty marker only.
    pub fn is_empty(&self) -> bool {
        matches!(self, Nested::Empty)
    }

    pub fn as_present(&self) -> Option<&T> {
        match self {
            Nested::Present(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_present(self) -> Option<T> {
        match self {
            Nested::Present(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> From<Option<T>> for Nested<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Nested::Present(value),
            None => Nested::Absent,
        }
    }
}

impl<T: Serialize> Serialize for Nested<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Nested::Absent => serializer.serialize_none(),
            Nested::Empty => serializer.serialize_map(Some(0))?.end(),
            Nested::Present(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Nested<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(Nested::Absent),
            Some(Value::Object(map)) if map.is_empty() => Ok(Nested::Empty),
            Some(value) => serde_json::from_value(value)
                .map(Nested::Present)
                .map_err(de::Error::custom),
        }
    }
}

/// dotted path to a field, e.g. `ServiceLevelIndicator.BasicSli.Method`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldName {
    segments: Vec<String>,
}

impl FieldName {
    /// the empty path at the root of a resource.
    pub fn root() -> Self {
        Self::default()
    }

    /// return a child path.
    pub fn nest(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// lower camel form used by `updateMask`, e.g. `serviceLevelIndicator.basicSli`.
    pub fn json_path(&self) -> String {
        self.segments
            .iter()
            .map(|segment| lower_first(segment))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl From<&str> for FieldName {
    fn from(value: &str) -> Self {
        Self {
            segments: value
                .split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

fn lower_first(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
