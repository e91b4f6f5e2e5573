//! Failure taxonomy
//!
//! Every way a call can fail ends up as an [`RpcFault`]. Handlers return it
//! directly (`Result<T, RpcFault>`) and the dispatcher produces it for
//! protocol, authorization and binding failures. The
//! [`ErrorMapper`](crate::mapper::ErrorMapper) turns it into the wire error.

use std::panic::Location;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

#[derive(Debug, Error)]
pub enum RpcFault {
    #[error("invalid JSON: {0}")]
    Parse(String),

    #[error("invalid RPC request: {0}")]
    InvalidRequest(String),

    #[error("RPC method not found: {0}")]
    MethodNotFound(String),

    #[error("no permission: {capability}")]
    AccessDenied { capability: String },

    #[error("{message}")]
    Validation {
        message: String,
        violations: Vec<Violation>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Http { status: u16, message: String },

    /// A business rule was violated; code, message and context reach the
    /// caller verbatim.
    #[error("{message}")]
    Domain {
        code: i64,
        message: String,
        context: Option<Value>,
    },

    /// Error raised by an external system such as the database.
    #[error("external error {code}: {message}")]
    External { code: i64, message: String },

    /// Anything the handler did not expect.
    #[error("{error}")]
    Internal {
        name: &'static str,
        error: anyhow::Error,
        location: &'static Location<'static>,
    },

    #[error("handler panicked: {message}")]
    Panic { message: String },
}

impl RpcFault {
    pub fn access_denied(capability: impl Into<String>) -> Self {
        Self::AccessDenied {
            capability: capability.into(),
        }
    }

    /// Validation failure carrying every violation found.
    pub fn validation(violations: Vec<Violation>) -> Self {
        Self::Validation {
            message: summarize(&violations),
            violations,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    pub fn domain(code: i64, message: impl Into<String>) -> Self {
        Self::Domain {
            code,
            message: message.into(),
            context: None,
        }
    }

    /// Attach structured context to a domain violation (no-op otherwise).
    pub fn with_context(mut self, value: Value) -> Self {
        if let Self::Domain { context, .. } = &mut self {
            *context = Some(value);
        }
        self
    }

    pub fn external(code: i64, message: impl Into<String>) -> Self {
        Self::External {
            code,
            message: message.into(),
        }
    }

    /// Wrap an unexpected error, remembering where it was raised.
    #[track_caller]
    pub fn internal<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal {
            name: std::any::type_name::<E>(),
            error: anyhow::Error::new(error),
            location: Location::caller(),
        }
    }

    #[track_caller]
    pub fn internal_msg(message: impl std::fmt::Display + Send + Sync + 'static) -> Self {
        Self::Internal {
            name: "anyhow::Error",
            error: anyhow::Error::msg(message.to_string()),
            location: Location::caller(),
        }
    }

    /// Failures the caller was not meant to see; these get reported.
    pub fn is_unexpected(&self) -> bool {
        matches!(self, Self::Internal { .. } | Self::Panic { .. })
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Validation { violations, .. } => violations,
            _ => &[],
        }
    }
}

fn summarize(violations: &[Violation]) -> String {
    match violations {
        [] => "invalid parameters".to_string(),
        [single] => single.to_string(),
        many => format!(
            "{} invalid parameters: {}",
            many.len(),
            many.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ")
        ),
    }
}

impl From<anyhow::Error> for RpcFault {
    #[track_caller]
    fn from(error: anyhow::Error) -> Self {
        Self::Internal {
            name: "anyhow::Error",
            error,
            location: Location::caller(),
        }
    }
}

impl From<serde_json::Error> for RpcFault {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        Self::internal(error)
    }
}

impl From<std::io::Error> for RpcFault {
    #[track_caller]
    fn from(error: std::io::Error) -> Self {
        Self::internal(error)
    }
}

/// Result type for handlers
pub type RpcResult<T> = Result<T, RpcFault>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fault_display() {
        assert_eq!(
            RpcFault::access_denied("menu:loans").to_string(),
            "no permission: menu:loans"
        );
        assert_eq!(RpcFault::not_found("Loan 7 not found").to_string(), "Loan 7 not found");
        assert_eq!(
            RpcFault::external(1062, "Duplicate entry").to_string(),
            "external error 1062: Duplicate entry"
        );
    }

    #[test]
    fn test_validation_summary() {
        let single = RpcFault::validation(vec![Violation::new("email", "must not be blank")]);
        assert_eq!(single.to_string(), "email: must not be blank");

        let many = RpcFault::validation(vec![
            Violation::new("email", "must not be blank"),
            Violation::new("age", "must be positive"),
        ]);
        assert_eq!(
            many.to_string(),
            "2 invalid parameters: email: must not be blank; age: must be positive"
        );
        assert_eq!(many.violations().len(), 2);
    }

    #[test]
    fn test_domain_context() {
        let fault = RpcFault::domain(4001, "Loan already closed").with_context(json!({"loanId": 7}));
        let RpcFault::Domain { code, context, .. } = fault else {
            panic!("expected domain fault");
        };
        assert_eq!(code, 4001);
        assert_eq!(context, Some(json!({"loanId": 7})));
    }

    #[test]
    fn test_internal_records_location() {
        let fault = RpcFault::internal_msg("boom");
        let RpcFault::Internal { location, .. } = &fault else {
            panic!("expected internal fault");
        };
        assert!(location.file().ends_with("fault.rs"));
        assert!(fault.is_unexpected());
    }

    #[test]
    fn test_question_mark_converts_serde_errors() {
        fn parse() -> RpcResult<Value> {
            let value = serde_json::from_str("{not json")?;
            Ok(value)
        }
        let fault = parse().unwrap_err();
        let RpcFault::Internal { name, .. } = fault else {
            panic!("expected internal fault");
        };
        assert!(name.contains("serde_json"));
    }
}
