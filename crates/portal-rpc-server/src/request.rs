use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{JsonRpcVersion, RequestId};

/// Parameters for a JSON-RPC request
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RequestParams {
    /// Positional parameters as an array
    Array(Vec<Value>),
    /// Named parameters as an object
    Object(Map<String, Value>),
}

impl RequestParams {
    /// Get a parameter by name (object params only)
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            RequestParams::Object(map) => map.get(key),
            RequestParams::Array(_) => None,
        }
    }

    /// Get a parameter by index (array params only)
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            RequestParams::Array(vec) => vec.get(index),
            RequestParams::Object(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RequestParams::Object(map) => map.len(),
            RequestParams::Array(vec) => vec.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_positional(&self) -> bool {
        matches!(self, RequestParams::Array(_))
    }

    /// Convert to a serde_json::Value
    pub fn to_value(&self) -> Value {
        match self {
            RequestParams::Object(map) => Value::Object(map.clone()),
            RequestParams::Array(arr) => Value::Array(arr.clone()),
        }
    }
}

impl From<Map<String, Value>> for RequestParams {
    fn from(map: Map<String, Value>) -> Self {
        RequestParams::Object(map)
    }
}

impl From<Vec<Value>> for RequestParams {
    fn from(vec: Vec<Value>) -> Self {
        RequestParams::Array(vec)
    }
}

/// Why an envelope was rejected as an invalid request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    #[error("request is not a JSON object")]
    NotAnObject,
    #[error("jsonrpc must be \"2.0\"")]
    BadVersion,
    #[error("method must be a non-empty string")]
    MissingMethod,
    #[error("params must be an object or an array")]
    UnstructuredParams,
}

/// A JSON-RPC request envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<RequestParams>,
    pub id: RequestId,
}

impl RpcRequest {
    pub fn new(id: RequestId, method: impl Into<String>, params: Option<RequestParams>) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            method: method.into(),
            params,
            id,
        }
    }

    /// Validate a decoded envelope.
    ///
    /// The id is read first so that a rejected envelope can still echo it.
    pub fn from_value(value: &Value) -> Result<Self, (RequestId, EnvelopeError)> {
        let Value::Object(envelope) = value else {
            return Err((RequestId::sentinel(), EnvelopeError::NotAnObject));
        };
        let id = RequestId::from_envelope(envelope.get("id"));

        if envelope.get("jsonrpc").and_then(Value::as_str) != Some(crate::JSONRPC_VERSION) {
            return Err((id, EnvelopeError::BadVersion));
        }

        let method = match envelope.get("method").and_then(Value::as_str) {
            Some(method) if !method.is_empty() => method.to_string(),
            _ => return Err((id, EnvelopeError::MissingMethod)),
        };

        let params = match envelope.get("params") {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(RequestParams::Object(map.clone())),
            Some(Value::Array(vec)) => Some(RequestParams::Array(vec.clone())),
            Some(_) => return Err((id, EnvelopeError::UnstructuredParams)),
        };

        Ok(Self::new(id, method, params))
    }

    /// Get a parameter by name (if params are an object)
    pub fn get_param(&self, name: &str) -> Option<&Value> {
        self.params.as_ref()?.get(name)
    }

    /// Get a parameter by index (if params are an array)
    pub fn get_param_index(&self, index: usize) -> Option<&Value> {
        self.params.as_ref()?.get_index(index)
    }
}
