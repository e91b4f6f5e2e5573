//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use portal_rpc_server::prelude::*;
use serde_json::{Value, json};

/// Handler that counts its invocations
#[derive(Clone, Default)]
pub struct Spy {
    calls: Arc<AtomicUsize>,
}

impl Spy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// A handler taking no parameters that answers `{"ok": true}`.
    pub fn handler(&self) -> Arc<dyn RpcMethod> {
        let calls = self.calls.clone();
        positional(vec![], move |_: Arguments, _: CallContext| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(json!({"ok": true}))
            }
        })
    }
}

pub fn ok_handler() -> Arc<dyn RpcMethod> {
    positional(vec![], |_: Arguments, _: CallContext| async move {
        Ok(json!({"ok": true}))
    })
}

pub fn clerk() -> CallerIdentity {
    CallerIdentity::new("1001", "Clerk").with_role("clerk")
}

pub async fn call(dispatcher: &Dispatcher, body: Value) -> Value {
    dispatcher.handle_value(body, &clerk()).await.to_value()
}

pub async fn call_as(dispatcher: &Dispatcher, identity: &CallerIdentity, body: Value) -> Value {
    dispatcher.handle_value(body, identity).await.to_value()
}

/// Exactly one of `result` / `error` is present.
pub fn assert_well_formed(response: &Value) {
    let object = response.as_object().expect("response must be an object");
    assert_eq!(object.get("jsonrpc"), Some(&json!("2.0")));
    assert!(object.contains_key("id"), "response without id: {response}");
    assert_ne!(
        object.contains_key("result"),
        object.contains_key("error"),
        "response must carry exactly one of result/error: {response}"
    );
}
