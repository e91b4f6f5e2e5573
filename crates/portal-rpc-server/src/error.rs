use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::types::{JsonRpcVersion, RequestId};

/// Error codes emitted by the dispatcher
///
/// Besides the reserved JSON-RPC codes the portal uses HTTP-style statuses
/// (400, 403, 404, 500) and passes domain / external-system codes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InternalError,
    /// HTTP-style status (400, 403, 404, 500, ...)
    Http(u16),
    /// Code owned by a domain rule or an external system
    Custom(i64),
}

impl RpcErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            RpcErrorCode::ParseError => crate::error_codes::PARSE_ERROR,
            RpcErrorCode::InvalidRequest => crate::error_codes::INVALID_REQUEST,
            RpcErrorCode::MethodNotFound => crate::error_codes::METHOD_NOT_FOUND,
            RpcErrorCode::InternalError => crate::error_codes::INTERNAL_ERROR,
            RpcErrorCode::Http(status) => i64::from(*status),
            RpcErrorCode::Custom(code) => *code,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RpcErrorCode::ParseError => "invalid JSON",
            RpcErrorCode::InvalidRequest => "invalid RPC request",
            RpcErrorCode::MethodNotFound => "RPC method not found",
            RpcErrorCode::InternalError => "internal server error",
            RpcErrorCode::Http(400) => "bad request",
            RpcErrorCode::Http(403) => "forbidden",
            RpcErrorCode::Http(404) => "not found",
            RpcErrorCode::Http(500) => "internal server error",
            RpcErrorCode::Http(_) => "request failed",
            RpcErrorCode::Custom(_) => "server error",
        }
    }
}

impl fmt::Display for RpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcErrorObject {
    pub fn new(code: RpcErrorCode, message: Option<String>, data: Option<Value>) -> Self {
        Self {
            code: code.code(),
            message: message.unwrap_or_else(|| code.message().to_string()),
            data,
        }
    }

    pub fn parse_error() -> Self {
        Self::new(RpcErrorCode::ParseError, None, None)
    }

    pub fn invalid_request() -> Self {
        Self::new(RpcErrorCode::InvalidRequest, None, None)
    }

    pub fn method_not_found() -> Self {
        Self::new(RpcErrorCode::MethodNotFound, None, None)
    }

    pub fn internal_error(data: Option<Value>) -> Self {
        Self::new(RpcErrorCode::InternalError, None, data)
    }

    pub fn http(status: u16, message: impl Into<String>, data: Option<Value>) -> Self {
        Self::new(RpcErrorCode::Http(status), Some(message.into()), data)
    }

    pub fn custom(code: i64, message: impl Into<String>, data: Option<Value>) -> Self {
        Self::new(RpcErrorCode::Custom(code), Some(message.into()), data)
    }

    /// Attach an extra key to `data`, turning it into an object if needed.
    pub fn with_data_entry(mut self, key: &str, value: Value) -> Self {
        let mut data = match self.data.take() {
            Some(Value::Object(map)) => map,
            Some(other) => {
                let mut map = serde_json::Map::new();
                map.insert("context".to_string(), other);
                map
            }
            None => serde_json::Map::new(),
        };
        data.insert(key.to_string(), value);
        self.data = Some(Value::Object(data));
        self
    }
}

/// JSON-RPC error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorResponse {
    #[serde(rename = "jsonrpc")]
    pub version: JsonRpcVersion,
    pub error: RpcErrorObject,
    pub id: RequestId,
}

impl RpcErrorResponse {
    pub fn new(id: RequestId, error: RpcErrorObject) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            error,
            id,
        }
    }

    pub fn parse_error() -> Self {
        Self::new(RequestId::sentinel(), RpcErrorObject::parse_error())
    }

    pub fn invalid_request(id: RequestId) -> Self {
        Self::new(id, RpcErrorObject::invalid_request())
    }

    pub fn method_not_found(id: RequestId) -> Self {
        Self::new(id, RpcErrorObject::method_not_found())
    }

    pub fn internal_error(id: RequestId) -> Self {
        Self::new(id, RpcErrorObject::internal_error(None))
    }
}

impl fmt::Display for RpcErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JSON-RPC Error {}: {}", self.error.code, self.error.message)
    }
}

impl std::error::Error for RpcErrorResponse {}
