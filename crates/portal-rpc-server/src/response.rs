use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{RpcErrorObject, RpcErrorResponse};
use crate::types::{JsonRpcVersion, RequestId};

/// A successful JSON-RPC response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub result: Value,
    pub id: RequestId,
}

impl RpcResponse {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            result,
            id,
        }
    }
}

/// Either a success or an error response.
///
/// Keeping the two apart at the type level guarantees that no entry ever
/// carries both `result` and `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcMessage {
    /// Error response with error field
    Error(RpcErrorResponse),
    /// Successful response with result field
    Response(RpcResponse),
}

impl RpcMessage {
    pub fn success(id: RequestId, result: Value) -> Self {
        Self::Response(RpcResponse::success(id, result))
    }

    pub fn error(id: RequestId, error: RpcErrorObject) -> Self {
        Self::Error(RpcErrorResponse::new(id, error))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RpcMessage::Error(_))
    }

    pub fn id(&self) -> &RequestId {
        match self {
            RpcMessage::Response(resp) => &resp.id,
            RpcMessage::Error(err) => &err.id,
        }
    }

    pub fn result(&self) -> Option<&Value> {
        match self {
            RpcMessage::Response(resp) => Some(&resp.result),
            RpcMessage::Error(_) => None,
        }
    }

    pub fn error_object(&self) -> Option<&RpcErrorObject> {
        match self {
            RpcMessage::Response(_) => None,
            RpcMessage::Error(err) => Some(&err.error),
        }
    }
}

impl From<RpcResponse> for RpcMessage {
    fn from(response: RpcResponse) -> Self {
        Self::Response(response)
    }
}

impl From<RpcErrorResponse> for RpcMessage {
    fn from(error: RpcErrorResponse) -> Self {
        Self::Error(error)
    }
}

/// What the transport should write back: one object, or an array
/// matching the shape of a batch request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DispatchOutcome {
    Single(RpcMessage),
    Batch(Vec<RpcMessage>),
}

impl DispatchOutcome {
    pub fn is_batch(&self) -> bool {
        matches!(self, DispatchOutcome::Batch(_))
    }

    /// Response entries in request order
    pub fn messages(&self) -> &[RpcMessage] {
        match self {
            DispatchOutcome::Single(message) => std::slice::from_ref(message),
            DispatchOutcome::Batch(messages) => messages,
        }
    }

    pub fn to_value(&self) -> Value {
        // Every field is a plain string, integer or already-built Value.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn to_json_string(&self) -> String {
        self.to_value().to_string()
    }
}
