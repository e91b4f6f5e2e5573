//! # Portal RPC Derive Macros
//!
//! - `#[derive(WireEnum)]` - serialize a fieldless enum as `{name, value?, title?}`
//! - `#[derive(FromParams)]` - bind a request struct from named `params`, one field at a time
//!
//! ## WireEnum attributes
//!
//! Per variant, all optional:
//!
//! - `#[wire(name = "...")]` - wire name (defaults to the variant identifier)
//! - `#[wire(value = ...)]` - backing scalar (string, integer, float or bool literal)
//! - `#[wire(title = "...")]` - human-readable title
//!
//! A variant with an explicit discriminant (`Low = 1`) is backed by it unless
//! `value` says otherwise. When any variant is backed, all must be.
//!
//! ```rust,ignore
//! use portal_rpc_server::WireEnum;
//!
//! #[derive(WireEnum)]
//! enum LeaveType {
//!     #[wire(title = "Annual leave")]
//!     Annual = 1,
//!     #[wire(title = "Sick leave")]
//!     Sick = 2,
//! }
//! ```
//!
//! ## FromParams attributes
//!
//! - `#[param(rename_all = "camelCase")]` on the struct
//! - `#[param(rename = "...")]` - key in `params` (defaults to the field name)
//! - `#[param(default)]` - missing or `null` takes `Default::default()`
//! - `#[param(min = ..., max = ...)]` - inclusive numeric bounds
//!
//! Every field is read on its own, so all missing, mistyped and out-of-range
//! fields are reported together. `Option` fields may be omitted.
//!
//! ```rust,ignore
//! use portal_rpc_server::prelude::*;
//!
//! #[derive(FromParams)]
//! #[param(rename_all = "camelCase")]
//! struct LeaveRequest {
//!     employee_email: String,
//!     #[param(min = 1, max = 30)]
//!     days: i32,
//!     comment: Option<String>,
//! }
//! ```

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod from_params_derive;
mod utils;
mod wire_enum_derive;

/// Derive `WireEnum` and a matching `serde::Serialize` impl.
#[proc_macro_derive(WireEnum, attributes(wire))]
pub fn derive_wire_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    wire_enum_derive::derive_wire_enum_impl(input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

/// Derive `FromParams` for a struct with named fields.
#[proc_macro_derive(FromParams, attributes(param))]
pub fn derive_from_params(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_params_derive::derive_from_params_impl(input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
