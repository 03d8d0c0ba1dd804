use serde_json::{Map, Value, json};

use super::error::{DifyError, Result};

pub fn build_payload(text: &str, instruction: &str, user: &str) -> Value {
    json!({
        "inputs": {
            "text": text,
            "prompt": instruction,
        },
        "response_mode": "blocking",
        "user": user,
    })
}

/// Reads `data.outputs.modified_text`, then `outputs.modified_text`.
///
/// A response that is not an object, or whose `data`/`outputs` is present but
/// not an object, is malformed rather than a schema mismatch.
pub fn extract_result(response: &Value) -> Result<String> {
    let object = response
        .as_object()
        .ok_or_else(|| DifyError::Unexpected("response is not a JSON object".to_string()))?;

    let primary = match object_field(object, "data")? {
        Some(data) => modified_text(data)?,
        None => None,
    };
    let found = match primary {
        Some(text) => Some(text),
        None => modified_text(object)?,
    };

    found
        .map(str::to_string)
        .ok_or_else(|| DifyError::MissingResult {
            keys: object.keys().cloned().collect(),
        })
}

fn modified_text(parent: &Map<String, Value>) -> Result<Option<&str>> {
    Ok(object_field(parent, "outputs")?
        .and_then(|outputs| outputs.get("modified_text"))
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty()))
}

fn object_field<'a>(
    parent: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>> {
    match parent.get(key) {
        None => Ok(None),
        Some(Value::Object(inner)) => Ok(Some(inner)),
        Some(_) => Err(DifyError::Unexpected(format!(
            "`{key}` in the response is not a JSON object"
        ))),
    }
}
