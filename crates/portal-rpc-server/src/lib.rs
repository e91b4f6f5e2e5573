//! # Portal JSON-RPC 2.0 Dispatcher
//!
//! Transport-agnostic JSON-RPC 2.0 dispatch core for the intranet portal.
//! The transport hands over a request body and the authenticated caller;
//! the dispatcher answers with a single response or a batch array.
//!
//! ## Pipeline
//! - **Registry**: method name to typed handler, built once at startup
//! - **Authorization**: action then menu capability check, before any handler runs
//! - **Binding**: `params` mapped onto the handler signature field by field, every violation reported at once
//! - **Invocation**: handler errors and panics captured per call
//! - **Normalization**: results serialized through serde, enums as `{name, value?, title?}`
//! - **Error mapping**: one error envelope for the whole failure taxonomy
//!
//! ```rust,no_run
//! use portal_rpc_server::prelude::*;
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), RegistryError> {
//! let registry = MethodRegistry::builder()
//!     .register(
//!         "directory.greet",
//!         positional(
//!             vec![ParamSpec::required("name", ParamKind::String)],
//!             |args: Arguments, _ctx: CallContext| async move {
//!                 let name: String = args.get("name")?;
//!                 Ok(json!({ "greeting": format!("Hello, {name}") }))
//!             },
//!         ),
//!     )
//!     .build()?;
//!
//! let dispatcher = Dispatcher::builder().registry(registry).build();
//! let outcome = dispatcher
//!     .handle_body(
//!         r#"{"jsonrpc":"2.0","method":"directory.greet","params":["Ada"],"id":1}"#,
//!         &CallerIdentity::anonymous(),
//!     )
//!     .await;
//! println!("{}", outcome.to_json_string());
//! # Ok(())
//! # }
//! ```

extern crate self as portal_rpc_server;

pub mod auth;
pub mod binder;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod fault;
pub mod invoker;
pub mod mapper;
pub mod method;
pub mod normalize;
pub mod registry;
pub mod reporter;
pub mod request;
pub mod response;
pub mod types;
pub mod validate;

pub mod prelude;

// Re-export main types
pub use auth::{AuthorizationGate, AuthorizationStore, StaticAuthorizationStore};
pub use binder::{ArgumentBinder, Arguments, BoundArguments};
pub use config::{ConfigError, DispatcherConfig, Environment};
pub use context::{CallContext, CallerIdentity};
pub use dispatcher::{Dispatcher, DispatcherBuilder, Stage};
pub use error::{RpcErrorCode, RpcErrorObject, RpcErrorResponse};
pub use fault::{RpcFault, RpcResult, Violation};
pub use invoker::{DirectInvoker, HandlerInvoker};
pub use mapper::ErrorMapper;
pub use method::{MethodSignature, ParamKind, ParamSpec, RpcMethod, automapped, positional};
pub use normalize::{ToWireValue, WireEnum, normalize, serialize_wire_enum};
pub use registry::{
    AccessRule, MethodBinding, MethodBindingSource, MethodDescriptor, MethodRegistry,
    MethodRegistryBuilder, RegistryError,
};
pub use reporter::{
    CodeTableFormatter, ErrorReporter, ExternalErrorFormatter, FaultReport, QueuedErrorReporter,
    ReportedFault, TracingErrorReporter,
};
pub use request::{RequestParams, RpcRequest};
pub use response::{DispatchOutcome, RpcMessage, RpcResponse};
pub use types::{JsonRpcVersion, RequestId};
pub use validate::{FromParams, RequestValidator, Validate, Validator, Violations};

#[cfg(feature = "derive")]
pub use portal_rpc_derive::{FromParams, WireEnum};

#[doc(hidden)]
pub mod __private {
    pub use serde;
    pub use serde_json;
}

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Error codes used on the wire
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INTERNAL_ERROR: i64 = -32603;

    // HTTP-style statuses
    pub const BAD_REQUEST: u16 = 400;
    pub const FORBIDDEN: u16 = 403;
    pub const NOT_FOUND: u16 = 404;
    pub const SERVER_ERROR: u16 = 500;
}
