// Mappers module
pub mod messages;

use serde_json::Value;

/// Coerce any JSON value to text. `null` becomes empty, strings are taken
/// as-is and everything else is rendered as JSON text.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse a request body leniently; anything that is not valid JSON is
/// treated as an empty object.
pub fn parse_json_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap_or_else(|_| Value::Object(Default::default()))
}
