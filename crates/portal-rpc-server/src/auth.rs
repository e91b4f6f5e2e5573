//! Authorization gate
//!
//! Every call passes two capability checks before any business code runs:
//! the method's own action capability, then the menu capability of the
//! module it belongs to. A stage without a rule is granted.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::context::CallerIdentity;
use crate::fault::{RpcFault, RpcResult};
use crate::registry::MethodRegistry;

/// Host-provided capability lookups (may hit a database)
#[async_trait]
pub trait AuthorizationStore: Send + Sync {
    async fn has_action_capability(&self, identity: &CallerIdentity, expr: &str) -> bool;

    async fn has_menu_capability(&self, identity: &CallerIdentity, expr: &str) -> bool;
}

/// Runs the action and menu checks for a registered method
#[derive(Clone)]
pub struct AuthorizationGate {
    store: Arc<dyn AuthorizationStore>,
    registry: Arc<MethodRegistry>,
    disabled: bool,
}

impl AuthorizationGate {
    pub fn new(store: Arc<dyn AuthorizationStore>, registry: Arc<MethodRegistry>) -> Self {
        Self {
            store,
            registry,
            disabled: false,
        }
    }

    /// Skip both checks for every call.
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub async fn check_action_access(&self, identity: &CallerIdentity, method: &str) -> RpcResult<()> {
        if self.disabled {
            return Ok(());
        }
        let Some(expr) = self
            .registry
            .lookup(method)
            .and_then(|descriptor| descriptor.access.action.as_deref())
        else {
            return Ok(());
        };

        if self.store.has_action_capability(identity, expr).await {
            Ok(())
        } else {
            warn!(method, user = %identity.id, capability = expr, "Action access denied");
            Err(RpcFault::access_denied(expr))
        }
    }

    pub async fn check_menu_access(&self, identity: &CallerIdentity, method: &str) -> RpcResult<()> {
        if self.disabled {
            return Ok(());
        }
        let Some(expr) = self
            .registry
            .lookup(method)
            .and_then(|descriptor| descriptor.access.menu.as_deref())
        else {
            return Ok(());
        };

        if self.store.has_menu_capability(identity, expr).await {
            Ok(())
        } else {
            warn!(method, user = %identity.id, capability = expr, "Menu access denied");
            Err(RpcFault::access_denied(expr))
        }
    }

    /// Action check, then menu check; the first denial wins.
    pub async fn authorize(&self, identity: &CallerIdentity, method: &str) -> RpcResult<()> {
        self.check_action_access(identity, method).await?;
        self.check_menu_access(identity, method).await?;
        debug!(method, user = %identity.id, "Access granted");
        Ok(())
    }
}

/// In-memory [`AuthorizationStore`].
///
/// A capability is held when the identity lists it in `permissions` or has
/// a role it was granted to.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthorizationStore {
    role_grants: HashMap<String, Vec<String>>,
}

impl StaticAuthorizationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant_role(mut self, role: impl Into<String>, capability: impl Into<String>) -> Self {
        self.role_grants
            .entry(role.into())
            .or_default()
            .push(capability.into());
        self
    }

    pub fn holds(&self, identity: &CallerIdentity, capability: &str) -> bool {
        identity.has_permission(capability)
            || identity.roles.iter().any(|role| {
                self.role_grants
                    .get(role)
                    .is_some_and(|grants| grants.iter().any(|grant| grant == capability))
            })
    }
}

#[async_trait]
impl AuthorizationStore for StaticAuthorizationStore {
    async fn has_action_capability(&self, identity: &CallerIdentity, expr: &str) -> bool {
        self.holds(identity, expr)
    }

    async fn has_menu_capability(&self, identity: &CallerIdentity, expr: &str) -> bool {
        self.holds(identity, expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::Arguments;
    use crate::context::CallContext;
    use crate::method::positional;
    use crate::registry::AccessRule;
    use serde_json::Value;
    use std::sync::Mutex;

    /// Records which checks reached the store
    #[derive(Default)]
    struct RecordingStore {
        grant_action: bool,
        grant_menu: bool,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AuthorizationStore for RecordingStore {
        async fn has_action_capability(&self, _: &CallerIdentity, expr: &str) -> bool {
            self.calls.lock().unwrap().push(format!("action:{expr}"));
            self.grant_action
        }

        async fn has_menu_capability(&self, _: &CallerIdentity, expr: &str) -> bool {
            self.calls.lock().unwrap().push(format!("menu:{expr}"));
            self.grant_menu
        }
    }

    fn registry() -> Arc<MethodRegistry> {
        let noop = || positional(vec![], |_: Arguments, _: CallContext| async move { Ok(Value::Null) });
        Arc::new(
            MethodRegistry::builder()
                .register_with_access(
                    "loan.approve",
                    noop(),
                    AccessRule::menu("loans").with_action("loan.approve"),
                )
                .register("directory.search", noop())
                .build()
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_action_denial_short_circuits_menu_check() {
        let store = Arc::new(RecordingStore {
            grant_action: false,
            grant_menu: true,
            ..Default::default()
        });
        let gate = AuthorizationGate::new(store.clone(), registry());

        let fault = gate
            .authorize(&CallerIdentity::anonymous(), "loan.approve")
            .await
            .unwrap_err();
        assert_eq!(fault.to_string(), "no permission: loan.approve");
        assert_eq!(*store.calls.lock().unwrap(), vec!["action:loan.approve"]);
    }

    #[tokio::test]
    async fn test_menu_denial() {
        let store = Arc::new(RecordingStore {
            grant_action: true,
            grant_menu: false,
            ..Default::default()
        });
        let gate = AuthorizationGate::new(store.clone(), registry());

        let fault = gate
            .authorize(&CallerIdentity::anonymous(), "loan.approve")
            .await
            .unwrap_err();
        assert_eq!(fault.to_string(), "no permission: loans");
        assert_eq!(store.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_methods_without_rules_are_granted() {
        let store = Arc::new(RecordingStore::default());
        let gate = AuthorizationGate::new(store.clone(), registry());

        gate.authorize(&CallerIdentity::anonymous(), "directory.search")
            .await
            .unwrap();
        assert!(store.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_gate_skips_the_store() {
        let store = Arc::new(RecordingStore::default());
        let gate = AuthorizationGate::new(store.clone(), registry()).disabled(true);

        gate.authorize(&CallerIdentity::anonymous(), "loan.approve")
            .await
            .unwrap();
        assert!(store.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_static_store_roles_and_permissions() {
        let store = StaticAuthorizationStore::new().grant_role("hr", "loans");
        let clerk = CallerIdentity::new("1", "clerk").with_role("hr");
        let direct = CallerIdentity::new("2", "direct").with_permission("loan.approve");

        assert!(store.has_menu_capability(&clerk, "loans").await);
        assert!(!store.has_action_capability(&clerk, "loan.approve").await);
        assert!(store.has_action_capability(&direct, "loan.approve").await);
        assert!(!store.has_menu_capability(&direct, "loans").await);
    }
}
