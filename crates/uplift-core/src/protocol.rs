//! Open Inference (V2) protocol payloads
//!
//! Only the REST/JSON shapes are modelled. Tensor `data` is kept as raw
//! JSON because its layout depends on the datatype and the codec that
//! reads it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tensor element type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Datatype {
    Bool,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int8,
    Int16,
    Int32,
    Int64,
    Fp16,
    Fp32,
    Fp64,
    Bytes,
}

/// Free-form parameters attached to requests, inputs, and outputs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// Content type hint used to pick a codec
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Any other parameters, passed through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Parameters {
    /// Parameters carrying only a content type
    pub fn with_content_type(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            extra: Map::new(),
        }
    }
}

/// One named input tensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestInput {
    pub name: String,
    pub shape: Vec<i64>,
    pub datatype: Datatype,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
    pub data: Value,
}

impl RequestInput {
    /// A BYTES input holding a single text element
    pub fn bytes(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            name: name.into(),
            shape: vec![text.len() as i64],
            datatype: Datatype::Bytes,
            parameters: None,
            data: Value::Array(vec![Value::String(text)]),
        }
    }
}

/// Output requested by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestOutput {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
}

/// Inference request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
    pub inputs: Vec<RequestInput>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<RequestOutput>,
}

impl InferenceRequest {
    /// Request with the given inputs and no id
    pub fn new(inputs: Vec<RequestInput>) -> Self {
        Self {
            id: None,
            parameters: None,
            inputs,
            outputs: Vec::new(),
        }
    }

    /// Set the request id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// One named output tensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseOutput {
    pub name: String,
    pub shape: Vec<i64>,
    pub datatype: Datatype,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
    pub data: Value,
}

/// Inference response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResponse {
    pub model_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
    pub outputs: Vec<ResponseOutput>,
}

impl InferenceResponse {
    /// Find an output by name
    pub fn output(&self, name: &str) -> Option<&ResponseOutput> {
        self.outputs.iter().find(|o| o.name == name)
    }
}

/// Tensor description used in model metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataTensor {
    pub name: String,
    pub datatype: Datatype,
    pub shape: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Parameters>,
}

/// `GET /v2` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerMetadata {
    pub name: String,
    pub version: String,
    pub extensions: Vec<String>,
}

/// `GET /v2/models/{name}` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub name: String,
    #[serde(default)]
    pub versions: Vec<String>,
    pub platform: String,
    #[serde(default)]
    pub inputs: Vec<MetadataTensor>,
    #[serde(default)]
    pub outputs: Vec<MetadataTensor>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_client_request() {
        let body = json!({
            "inputs": [{
                "name": "predict_request",
                "shape": [12],
                "datatype": "BYTES",
                "data": ["{\"data\": []}"]
            }]
        });

        let request: InferenceRequest = serde_json::from_value(body).unwrap();
        assert!(request.id.is_none());
        assert_eq!(request.inputs.len(), 1);
        assert_eq!(request.inputs[0].datatype, Datatype::Bytes);
        assert!(request.outputs.is_empty());
    }

    #[test]
    fn test_parameters_keep_unknown_keys() {
        let params: Parameters =
            serde_json::from_value(json!({"content_type": "str", "headers": {"x": "1"}})).unwrap();
        assert_eq!(params.content_type.as_deref(), Some("str"));
        assert!(params.extra.contains_key("headers"));
    }

    #[test]
    fn test_bytes_input_shape_matches_length() {
        let input = RequestInput::bytes("predict_request", "{\"data\": []}");
        assert_eq!(input.shape, vec![12]);
        assert_eq!(input.data, json!(["{\"data\": []}"]));
    }

    #[test]
    fn test_response_omits_empty_fields() {
        let response = InferenceResponse {
            model_name: "m".to_string(),
            model_version: None,
            id: Some("1".to_string()),
            parameters: None,
            outputs: vec![],
        };
        let value = serde_json::to_value(&response).unwrap();
        assert!(value.get("model_version").is_none());
        assert_eq!(value["id"], "1");
    }
}
