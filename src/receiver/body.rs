use serde_json::{Map, Value};
use super::error::ReceiverError;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

pub fn parse_request_body(raw_body: &str, content_type: Option<&str>) -> Result<Value, ReceiverError> {
    if content_type.map_or(false, is_form_urlencoded) {
        let fields = parse_form_fields(raw_body)?;

        if let Some(Value::String(payload)) = fields.get("payload") {
            return parse_json(payload);
        }

        return Ok(Value::Object(fields));
    }

    parse_json(raw_body)
}

fn is_form_urlencoded(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(|media_type| media_type.trim().eq_ignore_ascii_case(FORM_URLENCODED))
        .unwrap_or(false)
}

// Repeated keys are gathered into an array, in order of appearance.
fn parse_form_fields(raw_body: &str) -> Result<Map<String, Value>, ReceiverError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(raw_body)
        .map_err(|e| ReceiverError::MalformedBody(format!("Failed to decode url-encoded body: {}", e)))?;

    let mut fields = Map::new();
    for (key, value) in pairs {
        match fields.get_mut(&key) {
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            },
            None => {
                fields.insert(key, Value::String(value));
            },
        }
    }

    Ok(fields)
}

fn parse_json(text: &str) -> Result<Value, ReceiverError> {
    serde_json::from_str(text)
        .map_err(|e| ReceiverError::MalformedBody(format!("Failed to parse JSON body: {}", e)))
}
