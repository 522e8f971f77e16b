//! String and JSON codecs for BYTES tensors

use crate::error::{Error, Result};
use crate::protocol::{Datatype, InferenceRequest, Parameters, RequestInput, ResponseOutput};
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// Content type attached to JSON outputs
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Decode a BYTES input into its text elements.
///
/// Nested arrays are flattened in order. Every element must be a string.
pub fn decode_strings(input: &RequestInput) -> Result<Vec<String>> {
    let mut out = Vec::new();
    collect_strings(&input.name, &input.data, &mut out)?;
    Ok(out)
}

fn collect_strings(name: &str, value: &Value, out: &mut Vec<String>) -> Result<()> {
    match value {
        Value::String(s) => {
            out.push(s.clone());
            Ok(())
        }
        Value::Array(items) => items
            .iter()
            .try_for_each(|item| collect_strings(name, item, out)),
        other => Err(Error::codec(format!(
            "input '{}' holds a non-string element: {}",
            name, other
        ))),
    }
}

/// Decode every input as concatenated UTF-8 text parsed as JSON,
/// keyed by input name.
pub fn decode_json_inputs(request: &InferenceRequest) -> Result<HashMap<String, Value>> {
    let mut decoded = HashMap::with_capacity(request.inputs.len());
    for input in &request.inputs {
        let text = decode_strings(input)?.concat();
        let value: Value = serde_json::from_str(&text).map_err(|e| {
            Error::codec(format!("input '{}' is not valid JSON: {}", input.name, e))
        })?;
        decoded.insert(input.name.clone(), value);
    }
    Ok(decoded)
}

/// Serialize a value to JSON text, then encode that text once more as a
/// JSON string. The resulting bytes are what the `prediction_output`
/// tensor carries.
pub fn encode_double_json<T: Serialize>(value: &T) -> Result<Bytes> {
    let inner = serde_json::to_string(value)?;
    let outer = serde_json::to_string(&inner)?;
    Ok(Bytes::from(outer))
}

/// Parse a payload produced by [`encode_double_json`]
pub fn decode_double_json(payload: &[u8]) -> Result<Value> {
    let inner: String = serde_json::from_slice(payload)?;
    Ok(serde_json::from_str(&inner)?)
}

/// Wrap raw bytes as a single-element BYTES output.
///
/// The declared shape is the payload length in bytes.
pub fn encode_bytes_output(
    name: impl Into<String>,
    payload: &Bytes,
    content_type: &str,
) -> Result<ResponseOutput> {
    let text = std::str::from_utf8(payload)
        .map_err(|e| Error::codec(format!("payload is not valid UTF-8: {}", e)))?;

    Ok(ResponseOutput {
        name: name.into(),
        shape: vec![payload.len() as i64],
        datatype: Datatype::Bytes,
        parameters: Some(Parameters::with_content_type(content_type)),
        data: Value::Array(vec![Value::String(text.to_string())]),
    })
}
