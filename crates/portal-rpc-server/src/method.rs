//! RPC method handlers
//!
//! A registered method is an `Arc<dyn RpcMethod>`. Most handlers are built
//! from typed async closures with [`automapped`] (one request struct filled
//! from the whole `params` object) or [`positional`] (declared parameters
//! resolved by name or position).
//!
//! ```rust,no_run
//! use portal_rpc_server::prelude::*;
//!
//! #[derive(FromParams)]
//! struct ListLoans {
//!     #[param(min = 1)]
//!     employee_id: u32,
//! }
//!
//! impl Validate for ListLoans {}
//!
//! let handler = automapped(|request: ListLoans, _ctx: CallContext| async move {
//!     Ok(vec![request.employee_id])
//! });
//! ```

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::binder::{Arguments, BoundArguments};
use crate::context::CallContext;
use crate::fault::{RpcFault, RpcResult};
use crate::normalize::normalize;
use crate::validate::{FromParams, RequestValidator, Validate, Validator};

/// Kind of value a declared parameter accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Any,
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    /// Filled from the caller identity, never from `params`
    Caller,
}

impl ParamKind {
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ParamKind::Any | ParamKind::Caller => true,
            ParamKind::String => value.is_string(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
            ParamKind::Object => value.is_object(),
            ParamKind::Array => value.is_array(),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ParamKind::Any => "any value",
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
            ParamKind::Object => "object",
            ParamKind::Array => "array",
            ParamKind::Caller => "caller identity",
        }
    }
}

/// Declared handler parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn required(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: None,
        }
    }

    /// Parameter receiving the caller identity
    pub fn caller(name: impl Into<String>) -> Self {
        Self::required(name, ParamKind::Caller)
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.required = false;
        self.default = Some(default);
        self
    }
}

/// How a handler wants its parameters bound
#[derive(Clone)]
pub enum MethodSignature {
    /// The whole `params` object becomes one validated request object
    Automapped(Arc<dyn Validator>),
    /// Each declared parameter is resolved on its own
    Parameters(Vec<ParamSpec>),
}

impl MethodSignature {
    pub fn is_automapped(&self) -> bool {
        matches!(self, MethodSignature::Automapped(_))
    }
}

impl fmt::Debug for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodSignature::Automapped(_) => f.write_str("Automapped"),
            MethodSignature::Parameters(params) => {
                f.debug_tuple("Parameters").field(params).finish()
            }
        }
    }
}

/// A callable registered under a method name
#[async_trait]
pub trait RpcMethod: Send + Sync {
    fn signature(&self) -> &MethodSignature;

    /// Run the handler with already bound arguments and return the
    /// normalized result.
    async fn call(&self, args: BoundArguments, ctx: CallContext) -> RpcResult<Value>;
}

/// Handler taking one structured request object
pub struct AutomappedMethod<T, R, F> {
    signature: MethodSignature,
    handler: F,
    _types: PhantomData<fn(T) -> R>,
}

#[async_trait]
impl<T, R, F, Fut> RpcMethod for AutomappedMethod<T, R, F>
where
    T: FromParams + Validate + Send + 'static,
    R: Serialize + Send + 'static,
    F: Fn(T, CallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RpcResult<R>> + Send + 'static,
{
    fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    async fn call(&self, args: BoundArguments, ctx: CallContext) -> RpcResult<Value> {
        let BoundArguments::Structured(Value::Object(params)) = args else {
            return Err(RpcFault::internal_msg(format!(
                "{} expects a structured request object",
                ctx.method
            )));
        };
        let request = T::from_params(&params).map_err(RpcFault::validation)?;
        let result = (self.handler)(request, ctx).await?;
        normalize(&result)
    }
}

/// Build an automapped handler from a typed async closure.
pub fn automapped<T, R, F, Fut>(handler: F) -> Arc<dyn RpcMethod>
where
    T: FromParams + Validate + Send + 'static,
    R: Serialize + Send + 'static,
    F: Fn(T, CallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RpcResult<R>> + Send + 'static,
{
    Arc::new(AutomappedMethod {
        signature: MethodSignature::Automapped(Arc::new(RequestValidator::<T>::new())),
        handler,
        _types: PhantomData,
    })
}

/// Handler with individually declared parameters
pub struct PositionalMethod<R, F> {
    signature: MethodSignature,
    handler: F,
    _result: PhantomData<fn() -> R>,
}

#[async_trait]
impl<R, F, Fut> RpcMethod for PositionalMethod<R, F>
where
    R: Serialize + Send + 'static,
    F: Fn(Arguments, CallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RpcResult<R>> + Send + 'static,
{
    fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    async fn call(&self, args: BoundArguments, ctx: CallContext) -> RpcResult<Value> {
        let BoundArguments::Positional(arguments) = args else {
            return Err(RpcFault::internal_msg(format!(
                "{} expects declared parameters",
                ctx.method
            )));
        };
        let result = (self.handler)(arguments, ctx).await?;
        normalize(&result)
    }
}

/// Build a handler whose parameters are declared one by one.
pub fn positional<R, F, Fut>(params: Vec<ParamSpec>, handler: F) -> Arc<dyn RpcMethod>
where
    R: Serialize + Send + 'static,
    F: Fn(Arguments, CallContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RpcResult<R>> + Send + 'static,
{
    Arc::new(PositionalMethod {
        signature: MethodSignature::Parameters(params),
        handler,
        _result: PhantomData,
    })
}
