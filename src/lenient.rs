//! Field decoders for imported documents.
//!
//! A field of the wrong shape reads as absent instead of failing the whole
//! document; the host decides later whether what is left is usable.

use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use serde_json::Value;

pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_f64().unwrap_or(0.0))
}

pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        _ => Ok(String::new()),
    }
}

pub fn optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(decoded) => Ok(Some(decoded)),
        Err(err) => {
            log::warn!("ignoring unreadable field: {}", err);
            Ok(None)
        }
    }
}

/// Items that fail to decode are dropped; a non-array reads as empty.
pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                log::warn!("dropping unreadable entry: {}", err);
                None
            }
        })
        .collect())
}

/// Numeric font weight, rounded and clamped to 1..=1000.
pub fn weight<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u16>, D::Error> {
    Ok(Value::deserialize(deserializer)?
        .as_f64()
        .filter(|w| w.is_finite())
        .map(|w| w.round().clamp(1.0, 1000.0) as u16))
}

/// Decodes `value` as `T` when its `type` tag matches, else keeps it raw.
pub fn tagged<T: DeserializeOwned>(value: &Value, tag: &str) -> Option<T> {
    if value.get("type").and_then(Value::as_str) != Some(tag) {
        return None;
    }
    serde_json::from_value(value.clone()).ok()
}
