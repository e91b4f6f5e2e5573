//! Caller identity and per-call context
//!
//! The transport/session layer authenticates the caller and hands the
//! dispatcher a [`CallerIdentity`]. It is threaded explicitly through the
//! pipeline; handlers receive it inside a [`CallContext`].

use serde::{Deserialize, Serialize};

use crate::types::RequestId;

/// Authenticated principal making the call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl CallerIdentity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Identity used when the transport did not authenticate anyone
    pub fn anonymous() -> Self {
        Self::new("anonymous", "anonymous")
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Everything a handler may know about the call it is serving
#[derive(Debug, Clone)]
pub struct CallContext {
    /// Registered method name
    pub method: String,
    /// Id echoed in the response
    pub request_id: RequestId,
    /// Caller identity, read-only
    pub identity: CallerIdentity,
}

impl CallContext {
    pub fn new(method: impl Into<String>, request_id: RequestId, identity: CallerIdentity) -> Self {
        Self {
            method: method.into(),
            request_id,
            identity,
        }
    }

    pub fn identity(&self) -> &CallerIdentity {
        &self.identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_builders() {
        let identity = CallerIdentity::new("42", "Ada")
            .with_email("ada@example.org")
            .with_role("hr")
            .with_permission("loan.view");

        assert!(identity.has_role("hr"));
        assert!(!identity.has_role("admin"));
        assert!(identity.has_permission("loan.view"));
        assert_eq!(identity.email.as_deref(), Some("ada@example.org"));
    }

    #[test]
    fn test_identity_deserializes_with_defaults() {
        let identity: CallerIdentity =
            serde_json::from_value(serde_json::json!({"id": "1", "name": "n"})).unwrap();
        assert!(identity.roles.is_empty());
        assert!(identity.email.is_none());
    }
}
