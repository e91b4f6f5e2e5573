//! # Portal RPC Prelude
//!
//! Everything needed to register handlers and run the dispatcher.
//!
//! ```rust
//! use portal_rpc_server::prelude::*;
//! ```

pub use crate::auth::{AuthorizationStore, StaticAuthorizationStore};
pub use crate::binder::{Arguments, BoundArguments};
pub use crate::config::{DispatcherConfig, Environment};
pub use crate::context::{CallContext, CallerIdentity};
pub use crate::dispatcher::Dispatcher;
pub use crate::fault::{RpcFault, RpcResult, Violation};
pub use crate::invoker::HandlerInvoker;
pub use crate::method::{ParamKind, ParamSpec, RpcMethod, automapped, positional};
pub use crate::normalize::{WireEnum, serialize_wire_enum};
pub use crate::registry::{
    AccessRule, MethodBinding, MethodBindingSource, MethodRegistry, RegistryError,
};
pub use crate::reporter::{CodeTableFormatter, ErrorReporter, QueuedErrorReporter};
pub use crate::response::{DispatchOutcome, RpcMessage};
pub use crate::types::RequestId;
pub use crate::validate::{FromParams, Validate, Violations};

#[cfg(feature = "derive")]
pub use portal_rpc_derive::{FromParams, WireEnum};

pub use crate::error_codes::*;
