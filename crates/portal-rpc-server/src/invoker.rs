//! Handler invocation

use std::any::Any;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;

use crate::binder::BoundArguments;
use crate::context::CallContext;
use crate::fault::{RpcFault, RpcResult};
use crate::registry::MethodDescriptor;

/// Executes a resolved handler.
///
/// Hosts wrap this to run their own lifecycle around each call
/// (transactions, auditing). Implementations must not reinterpret errors.
#[async_trait]
pub trait HandlerInvoker: Send + Sync {
    async fn invoke(
        &self,
        descriptor: &MethodDescriptor,
        args: BoundArguments,
        ctx: CallContext,
    ) -> RpcResult<Value>;
}

/// Calls the handler directly; a panic becomes [`RpcFault::Panic`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectInvoker;

#[async_trait]
impl HandlerInvoker for DirectInvoker {
    async fn invoke(
        &self,
        descriptor: &MethodDescriptor,
        args: BoundArguments,
        ctx: CallContext,
    ) -> RpcResult<Value> {
        AssertUnwindSafe(descriptor.handler().call(args, ctx))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(panic_fault(payload.as_ref())))
    }
}

pub(crate) fn panic_fault(payload: &(dyn Any + Send)) -> RpcFault {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    RpcFault::Panic { message }
}
