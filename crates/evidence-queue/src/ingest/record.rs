//! Mapping of parsed records onto task fields.

use serde_json::Value;

use crate::dates::{normalize_date, NormalizedDate};

/// Record fields carrying provenance, in priority order.
pub const SOURCE_KEYS: &[&str] = &["source", "provenance", "archive", "archival_source"];

/// Record fields carrying a document date, in priority order.
pub const DATE_KEYS: &[&str] = &["date", "timestamp", "created", "created_at", "dated"];

/// First non-empty value among `keys`, matching field names case-insensitively.
/// Numbers are rendered as text so a bare `1880` year still counts.
pub fn first_text_field(record: &Value, keys: &[&str]) -> Option<String> {
    let map = record.as_object()?;
    keys.iter().find_map(|key| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .and_then(|(_, v)| match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    })
}

pub fn record_source(record: &Value) -> Option<String> {
    first_text_field(record, SOURCE_KEYS)
}

/// The raw date string and its normalized form.
pub fn record_date(record: &Value) -> Option<(String, NormalizedDate)> {
    let raw = first_text_field(record, DATE_KEYS)?;
    let normalized = normalize_date(&raw);
    Some((raw, normalized))
}

/// Serialized form used for both the fingerprint and the stored content.
pub fn serialize_record(record: &Value) -> String {
    match record {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
