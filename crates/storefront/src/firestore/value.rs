//! Conversion between plain JSON and Firestore's typed value encoding.
//!
//! Firestore REST wraps every value in a single-key object naming its type
//! (`{"stringValue": "x"}`, `{"integerValue": "12"}`, ...). Records are
//! serialized to `serde_json::Value` first and converted here, so the domain
//! types only need their ordinary serde derives.

use serde_json::{Map, Value, json};

use super::FirestoreError;

/// Encode a plain JSON value as a Firestore value.
#[must_use]
pub fn encode(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                // 64-bit integers travel as strings.
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            json!({ "arrayValue": { "values": items.iter().map(encode).collect::<Vec<_>>() } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Encode the top-level fields of a document.
#[must_use]
pub fn encode_fields(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(key, value)| (key.clone(), encode(value)))
        .collect()
}

/// Decode a Firestore value into plain JSON.
///
/// # Errors
///
/// Returns `FirestoreError::Decode` for unknown or malformed value types.
pub fn decode(value: &Value) -> Result<Value, FirestoreError> {
    let Some((kind, inner)) = value.as_object().and_then(|o| o.iter().next()) else {
        return Err(FirestoreError::Decode(format!("not a typed value: {value}")));
    };

    match kind.as_str() {
        "nullValue" => Ok(Value::Null),
        "booleanValue" | "doubleValue" => Ok(inner.clone()),
        "integerValue" => {
            let parsed = match inner {
                Value::String(s) => s.parse::<i64>().ok(),
                Value::Number(n) => n.as_i64(),
                _ => None,
            };
            parsed
                .map(Value::from)
                .ok_or_else(|| FirestoreError::Decode(format!("bad integerValue: {inner}")))
        }
        "stringValue" | "timestampValue" | "referenceValue" => Ok(inner.clone()),
        "arrayValue" => inner
            .get("values")
            .and_then(Value::as_array)
            .map_or_else(
                || Ok(Vec::new()),
                |values| values.iter().map(decode).collect::<Result<Vec<_>, _>>(),
            )
            .map(Value::Array),
        "mapValue" => match inner.get("fields").and_then(Value::as_object) {
            Some(fields) => decode_fields(fields).map(Value::Object),
            None => Ok(Value::Object(Map::new())),
        },
        other => Err(FirestoreError::Decode(format!(
            "unsupported value type: {other}"
        ))),
    }
}

/// Decode the `fields` map of a document.
///
/// # Errors
///
/// Returns `FirestoreError::Decode` if any field fails to decode.
pub fn decode_fields(fields: &Map<String, Value>) -> Result<Map<String, Value>, FirestoreError> {
    fields
        .iter()
        .map(|(key, value)| decode(value).map(|decoded| (key.clone(), decoded)))
        .collect()
}
