//! Lenient deserializers for host-supplied snapshots.
//!
//! Attribute values and facts arrive as strings, numbers or booleans
//! depending on which host version produced them, and timestamps arrive
//! either as ISO-8601 strings (with or without a colon in the offset) or as
//! epoch milliseconds.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Render a scalar JSON value as the string the rules compare against.
fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }
}

/// Deserialize an optional string that may have been sent as a number or bool.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(scalar_to_string))
}

/// Deserialize a fact map, dropping null values and stringifying scalars.
pub fn lenient_string_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(k, v)| scalar_to_string(v).map(|v| (k, v)))
        .collect())
}

/// Deserialize a list that the host may send as `null`.
pub fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse a timestamp string in any of the formats the host emits.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map(|d| d.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|n| n.and_utc())
        })
}

fn timestamp_from_value<E: serde::de::Error>(value: Value) -> Result<Option<DateTime<Utc>>, E> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(Some)
            .ok_or_else(|| E::custom(format!("timestamp out of range: {n}"))),
        Value::String(s) => parse_timestamp(&s)
            .map(Some)
            .ok_or_else(|| E::custom(format!("unrecognised timestamp: '{s}'"))),
        other => Err(E::custom(format!("expected a timestamp, got {other}"))),
    }
}

/// Deserialize a required timestamp.
pub fn timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    timestamp_from_value(value)?.ok_or_else(|| D::Error::custom("timestamp must not be null"))
}

/// Deserialize an optional timestamp.
pub fn option_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        Some(v) => timestamp_from_value(v),
        None => Ok(None),
    }
}

/// The earliest instant a pool can start.
pub fn distant_past() -> DateTime<Utc> {
    DateTime::<Utc>::MIN_UTC
}

/// The latest instant a pool can end.
pub fn distant_future() -> DateTime<Utc> {
    DateTime::<Utc>::MAX_UTC
}
