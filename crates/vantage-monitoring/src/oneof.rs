//! deserialization for oneof enums flattened into a parent object.
//!
//! serde's own handling of a flattened `Option` turns any error inside the
//! member into `None`. these helpers pick the member key out of the parent's
//! leftover entries and parse it strictly, so a bad member fails the parse.

use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::Deserialize;
use serde_json::Value;
use vantage_core::JsonMap;

/// a oneof enum whose variants are keyed by `MEMBERS` on the wire.
pub(crate) trait Oneof: DeserializeOwned {
    const MEMBERS: &'static [&'static str];
}

/// `deserialize_with` target for `#[serde(flatten)] Option<T>` oneof fields.
pub(crate) fn flattened<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Oneof,
{
    let mut entries = JsonMap::deserialize(deserializer)?;
    let mut members = T::MEMBERS
        .iter()
        .filter_map(|key| entries.remove_entry(*key))
        .filter(|(_, value)| !value.is_null());
    let Some((key, value)) = members.next() else {
        return Ok(None);
    };
    if let Some((other, _)) = members.next() {
        return Err(D::Error::custom(format!(
            "at most one of [{key}, {other}] may be set"
        )));
    }
    let mut member = JsonMap::new();
    member.insert(key, value);
    serde_json::from_value(Value::Object(member))
        .map(Some)
        .map_err(D::Error::custom)
}
