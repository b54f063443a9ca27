// src/pipeline/json_extract.rs

use serde_json::{Map, Value};

/// Best-effort recovery of a JSON object from free text.
///
/// Takes everything from the first `{` to the last `}` and decodes it. Prose
/// around the object is tolerated; two separate objects, or braces inside the
/// surrounding prose, make the slice invalid and yield `None`.
pub fn extract_first_json_object(text: &str) -> Option<Map<String, Value>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
