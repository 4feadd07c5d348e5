//! Shared serde helper functions used across multiple modules.

use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

/// Serde default function that returns `true`.
///
/// Used for boolean fields that should default to enabled/active.
pub fn default_true() -> bool {
    true
}

/// Accept any scalar as an optional string; empty strings, null and
/// non-scalar values become `None`.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Read the lower-cased `name` of every entry in a list of mappings.
///
/// Entries without a string `name`, and values that are not lists at all,
/// contribute nothing.
pub fn lenient_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Sequence(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .iter()
        .filter_map(|item| item.get("name").and_then(Value::as_str))
        .filter(|name| !name.is_empty())
        .map(str::to_lowercase)
        .collect())
}

/// Deserialize a list of records, skipping entries that are not mappings or
/// do not fit `T`.
///
/// `null` is `None`. Any other non-list value is present but empty.
pub fn lenient_records<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        Value::Sequence(items) => Some(
            items
                .into_iter()
                .filter(Value::is_mapping)
                .filter_map(|item| serde_yaml::from_value(item).ok())
                .collect(),
        ),
        _ => Some(Vec::new()),
    })
}
