//! Coercing deserializers for model-produced JSON.
//!
//! Models drift from the requested schema in predictable ways: prices come
//! back as `"$1,140"`, single items arrive without the surrounding list,
//! narrative fields hold numbers. These helpers accept those shapes instead
//! of rejecting the whole stage.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

/// Interpret a JSON value as a finite number.
///
/// Strings are accepted after removing currency symbols, thousands
/// separators and whitespace.
#[must_use]
pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !matches!(c, '$' | '€' | '£' | ',' | '_') && !c.is_whitespace())
                .collect();
            let cleaned = cleaned
                .trim_start_matches("USD")
                .trim_end_matches("USD")
                .to_string();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Render any JSON value as display text.
#[must_use]
pub fn coerce_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(coerce_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_number(&value))
}

/// Like [`number`] but missing or unreadable values become zero.
pub fn number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    number(deserializer).map(|n| n.unwrap_or(0.0))
}

pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_text(&value))
}

pub fn text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items
            .iter()
            .map(coerce_text)
            .filter(|s| !s.trim().is_empty())
            .collect(),
        Value::Null => Vec::new(),
        other => {
            let single = coerce_text(&other);
            if single.trim().is_empty() {
                Vec::new()
            } else {
                vec![single]
            }
        }
    })
}

/// A list of records; a lone object counts as a one-element list and
/// elements that do not fit `T` are dropped.
pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let items = match value {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        _ => Vec::new(),
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

/// An optional record; anything that does not fit `T` becomes `None`.
pub fn record<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        obj @ Value::Object(_) => Ok(serde_json::from_value(obj).ok()),
        _ => Ok(None),
    }
}

/// Emit whole-valued amounts as integers so `1840.0` prints as `1840`.
pub fn amount<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

pub fn opt_amount<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) => amount(v, serializer),
        None => serializer.serialize_none(),
    }
}
