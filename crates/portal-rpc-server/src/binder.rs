//! Argument binding
//!
//! Maps the `params` of a request onto what the handler declared. Every
//! problem found is collected and reported as one validation fault; the
//! handler is never called with partially bound arguments.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::context::CallerIdentity;
use crate::fault::{RpcFault, RpcResult, Violation};
use crate::method::{MethodSignature, ParamKind, ParamSpec};
use crate::registry::MethodDescriptor;
use crate::request::RequestParams;

/// Arguments ready to be handed to a handler
#[derive(Debug, Clone, PartialEq)]
pub enum BoundArguments {
    /// Validated request object of an automapped method
    Structured(Value),
    /// Resolved declared parameters
    Positional(Arguments),
}

/// Declared parameters resolved to values, in declaration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Vec<(String, Value)>,
}

impl Arguments {
    pub fn from_pairs(values: Vec<(String, Value)>) -> Self {
        Self { values }
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(param, _)| param == name)
            .map(|(_, value)| value)
    }

    /// Deserialize the argument `name` into `T`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> RpcResult<T> {
        let value = self.value(name).cloned().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|err| {
            RpcFault::validation(vec![Violation::new(name, err.to_string())])
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Binds request params to a method's signature
#[derive(Debug, Clone, Copy, Default)]
pub struct ArgumentBinder;

impl ArgumentBinder {
    pub fn new() -> Self {
        Self
    }

    pub fn bind(
        &self,
        descriptor: &MethodDescriptor,
        params: Option<&RequestParams>,
        identity: &CallerIdentity,
    ) -> RpcResult<BoundArguments> {
        match descriptor.signature() {
            MethodSignature::Automapped(validator) => {
                let value = match params {
                    None => Value::Object(Map::new()),
                    Some(RequestParams::Object(map)) => Value::Object(map.clone()),
                    Some(RequestParams::Array(_)) => {
                        return Err(RpcFault::validation(vec![Violation::new(
                            "params",
                            "expected named parameters, got an array",
                        )]));
                    }
                };
                let violations = validator.validate(&value);
                if violations.is_empty() {
                    Ok(BoundArguments::Structured(value))
                } else {
                    Err(RpcFault::validation(violations))
                }
            }
            MethodSignature::Parameters(specs) => {
                bind_declared(specs, params, identity).map(BoundArguments::Positional)
            }
        }
    }
}

fn bind_declared(
    specs: &[ParamSpec],
    params: Option<&RequestParams>,
    identity: &CallerIdentity,
) -> RpcResult<Arguments> {
    let mut values = Vec::with_capacity(specs.len());
    let mut violations = Vec::new();
    let mut position = 0;

    for spec in specs {
        if spec.kind == ParamKind::Caller {
            match serde_json::to_value(identity) {
                Ok(value) => values.push((spec.name.clone(), value)),
                Err(err) => return Err(RpcFault::internal(err)),
            }
            continue;
        }

        let supplied = match params {
            Some(RequestParams::Object(map)) => map.get(&spec.name),
            Some(RequestParams::Array(items)) => items.get(position),
            None => None,
        };
        position += 1;

        match supplied {
            None => match &spec.default {
                Some(default) => values.push((spec.name.clone(), default.clone())),
                None if spec.required => {
                    violations.push(Violation::new(&spec.name, "is required"));
                }
                None => values.push((spec.name.clone(), Value::Null)),
            },
            Some(Value::Null) if spec.required => {
                violations.push(Violation::new(&spec.name, "must not be null"));
            }
            Some(Value::Null) => {
                let value = spec.default.clone().unwrap_or(Value::Null);
                values.push((spec.name.clone(), value));
            }
            Some(value) if !spec.kind.accepts(value) => {
                violations.push(Violation::new(
                    &spec.name,
                    format!(
                        "expected {}, got {}",
                        spec.kind.describe(),
                        json_type_name(value)
                    ),
                ));
            }
            Some(value) => values.push((spec.name.clone(), value.clone())),
        }
    }

    if let Some(RequestParams::Array(items)) = params {
        if items.len() > position {
            violations.push(Violation::new(
                "params",
                format!(
                    "expected at most {} positional parameters, got {}",
                    position,
                    items.len()
                ),
            ));
        }
    }

    if violations.is_empty() {
        Ok(Arguments::from_pairs(values))
    } else {
        Err(RpcFault::validation(violations))
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
