//! Tolerant scalar decoding for stored records.
//!
//! Stored JSON may come from older app builds or hand-edited exports, so a
//! field can hold `null` or a value of the wrong scalar type. These helpers
//! coerce such values instead of failing the whole collection.
//!
//! # Invariants
//! - `null` decodes to the field default (`""`, `false`, `0`, `None`).
//! - Numbers and booleans in string fields become their JSON text.
//! - `isActive` is only `true` for a JSON `true`.

use crate::model::person::PersonKind;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub(crate) fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_string(deserializer)?.unwrap_or_default())
}

pub(crate) fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    })
}

pub(crate) fn strict_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

pub(crate) fn opt_strict_true<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        other => Some(matches!(other, Value::Bool(true))),
    })
}

/// Integer ids pass through; floats truncate; numeric strings parse;
/// anything else is `0`.
pub(crate) fn epoch_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64))
            .unwrap_or_default(),
        Value::String(text) => text.trim().parse().unwrap_or_default(),
        _ => 0,
    })
}

pub(crate) fn opt_kind<'de, D>(deserializer: D) -> Result<Option<PersonKind>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_string(deserializer)?.map(PersonKind::from))
}
