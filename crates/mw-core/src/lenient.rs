//! Field-level tolerant decoding for upstream payloads.
//!
//! Upstream JSON is only loosely typed. A field holding the wrong kind of
//! value is treated as absent so the rest of the payload still decodes.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decodes an optional field, mapping `null` and wrong-typed values to `None`.
pub(crate) fn field<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(decode(&value))
}

/// Decodes an optional list, keeping one slot per element. Elements of the
/// wrong type become `None`; a value that is not a list at all is `None`.
pub(crate) fn seq<'de, D, T>(deserializer: D) -> Result<Option<Vec<Option<T>>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        if !value.is_null() {
            tracing::debug!(%value, "ignoring malformed list");
        }
        return Ok(None);
    };
    Ok(Some(items.iter().map(decode).collect()))
}

fn decode<T: DeserializeOwned>(value: &Value) -> Option<T> {
    if value.is_null() {
        return None;
    }
    match T::deserialize(value) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            tracing::debug!(%value, error = %err, "ignoring malformed field");
            None
        }
    }
}
