//! Result normalization
//!
//! Handler results are turned into plain JSON through serde. Any
//! `Serialize` type is a [`ToWireValue`]. Enumerations opt into the
//! portal's `{name, value?, title?}` shape by implementing [`WireEnum`]
//! (usually via `#[derive(WireEnum)]`), whose `Serialize` impl delegates to
//! [`serialize_wire_enum`]. Because the rule lives in the enum's own
//! `Serialize` impl it applies wherever the enum appears in a result tree.

use std::borrow::Cow;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::fault::RpcFault;

/// Enumeration with a stable wire representation
pub trait WireEnum {
    /// Variant name
    fn wire_name(&self) -> &'static str;

    /// Backing scalar, for scalar-backed enumerations
    fn wire_value(&self) -> Option<Value> {
        None
    }

    /// Human-readable title, for enumerations that expose one
    fn wire_title(&self) -> Option<Cow<'static, str>> {
        None
    }
}

#[derive(Serialize)]
struct WireEnumRepr<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<Cow<'static, str>>,
}

/// `Serialize` body shared by every [`WireEnum`].
///
/// Usable directly as `#[serde(serialize_with = "serialize_wire_enum")]`.
pub fn serialize_wire_enum<E, S>(value: &E, serializer: S) -> Result<S::Ok, S::Error>
where
    E: WireEnum + ?Sized,
    S: Serializer,
{
    WireEnumRepr {
        name: value.wire_name(),
        value: value.wire_value(),
        title: value.wire_title(),
    }
    .serialize(serializer)
}

/// Conversion of a handler result into a JSON-safe value
pub trait ToWireValue {
    fn to_wire_value(&self) -> Result<Value, RpcFault>;
}

impl<T> ToWireValue for T
where
    T: Serialize + ?Sized,
{
    fn to_wire_value(&self) -> Result<Value, RpcFault> {
        serde_json::to_value(self).map_err(RpcFault::internal)
    }
}

/// Normalize any result tree.
pub fn normalize<T>(value: &T) -> Result<Value, RpcFault>
where
    T: ToWireValue + ?Sized,
{
    value.to_wire_value()
}
