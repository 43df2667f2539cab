//! Field-level serde helpers shared by the document, op and IR shapes.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize an optional JSON value where an explicit `null` is kept as
/// `Some(Value::Null)`. Pair with `#[serde(default)]` so an absent field is `None`.
pub fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Deserialize a nullable field that must still be present on the wire.
///
/// Without `#[serde(default)]` a missing field is a hard error, while `null`
/// decodes to `None`.
pub fn required_nullable<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer)
}
