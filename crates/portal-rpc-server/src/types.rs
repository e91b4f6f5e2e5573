use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Identifier echoed back from a JSON-RPC request.
///
/// Strings, numbers and `null` are echoed verbatim, numbers exactly as
/// received (fractions and values beyond `i64` included). A missing id, an
/// object or an array is unreadable and answered with
/// [`RequestId::sentinel`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(Number),
    Null,
}

impl RequestId {
    /// Id used when the request's own id could not be read.
    pub const SENTINEL: &'static str = "-1";

    pub fn sentinel() -> Self {
        RequestId::String(Self::SENTINEL.to_string())
    }

    /// Read an id out of a raw envelope field, falling back to the sentinel.
    pub fn from_envelope(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) => RequestId::String(s.clone()),
            Some(Value::Number(n)) => RequestId::Number(n.clone()),
            Some(Value::Null) => RequestId::Null,
            _ => Self::sentinel(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(self, RequestId::String(s) if s == Self::SENTINEL)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RequestId::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RequestId::Number(n) => n.as_i64(),
            _ => None,
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{}", s),
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::Null => write!(f, "null"),
        }
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n.into())
    }
}

impl From<Number> for RequestId {
    fn from(n: Number) -> Self {
        RequestId::Number(n)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        RequestId::String(s.to_string())
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        RequestId::String(s)
    }
}

/// JSON-RPC version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonRpcVersion {
    #[default]
    V2_0,
}

impl JsonRpcVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonRpcVersion::V2_0 => crate::JSONRPC_VERSION,
        }
    }
}

impl fmt::Display for JsonRpcVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            crate::JSONRPC_VERSION => Ok(JsonRpcVersion::V2_0),
            _ => Err(serde::de::Error::custom(format!(
                "Invalid JSON-RPC version: {}",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_id_serialization() {
        assert_eq!(serde_json::to_string(&RequestId::from("a")).unwrap(), r#""a""#);
        assert_eq!(serde_json::to_string(&RequestId::from(42)).unwrap(), "42");
        assert_eq!(serde_json::to_string(&RequestId::Null).unwrap(), "null");
    }

    #[test]
    fn test_id_from_envelope() {
        assert_eq!(RequestId::from_envelope(Some(&json!("7"))), RequestId::from("7"));
        assert_eq!(RequestId::from_envelope(Some(&json!(7))), RequestId::from(7));
        assert_eq!(RequestId::from_envelope(Some(&json!(null))), RequestId::Null);
        assert!(RequestId::from_envelope(None).is_sentinel());
        assert!(RequestId::from_envelope(Some(&json!({"x": 1}))).is_sentinel());
    }

    #[test]
    fn test_non_i64_numbers_are_echoed_as_received() {
        let fractional = RequestId::from_envelope(Some(&json!(1.5)));
        assert!(!fractional.is_sentinel());
        assert_eq!(serde_json::to_value(&fractional).unwrap(), json!(1.5));
        assert_eq!(fractional.as_i64(), None);

        let huge: Value = serde_json::from_str("18446744073709551615").unwrap();
        let id = RequestId::from_envelope(Some(&huge));
        assert_eq!(serde_json::to_string(&id).unwrap(), "18446744073709551615");
        assert_eq!(id.to_string(), "18446744073709551615");
    }

    #[test]
    fn test_json_rpc_version() {
        let parsed: JsonRpcVersion = serde_json::from_str(r#""2.0""#).unwrap();
        assert_eq!(parsed, JsonRpcVersion::V2_0);
        assert!(serde_json::from_str::<JsonRpcVersion>(r#""1.0""#).is_err());
    }
}
