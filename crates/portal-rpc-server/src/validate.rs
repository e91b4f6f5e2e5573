//! Validation of structured (automapped) request objects
//!
//! A request object is bound field by field through [`FromParams`], so one
//! bad field never hides another. Field-level failures (missing, null, wrong
//! type, out of range) are all reported together; the type's own
//! [`Validate`] checks run once every field has bound.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::fault::Violation;

/// Constraint checks a request type performs on itself.
///
/// Implementations must report every violation they find, not just the
/// first one.
pub trait Validate {
    fn validate(&self) -> Vec<Violation> {
        Vec::new()
    }
}

/// Request object built from the named `params` of a call.
///
/// Usually derived with `#[derive(FromParams)]`; hand-written impls bind
/// each field with [`bind_field`] so every failure is collected.
pub trait FromParams: Sized {
    fn from_params(params: &Map<String, Value>) -> Result<Self, Vec<Violation>>;
}

/// Bind the field `name`, recording a violation when it cannot be read.
///
/// A missing field binds like `null`, so `Option` fields may be omitted.
pub fn bind_field<T: DeserializeOwned>(
    params: &Map<String, Value>,
    name: &str,
    violations: &mut Vec<Violation>,
) -> Option<T> {
    let supplied = params.get(name);
    match T::deserialize(supplied.unwrap_or(&Value::Null)) {
        Ok(value) => Some(value),
        Err(_) if supplied.is_none() => {
            violations.push(Violation::new(name, "is required"));
            None
        }
        Err(_) if supplied.is_some_and(Value::is_null) => {
            violations.push(Violation::new(name, "must not be null"));
            None
        }
        Err(err) => {
            violations.push(Violation::new(name, err.to_string()));
            None
        }
    }
}

/// Like [`bind_field`], but a missing or `null` field takes `T::default()`.
pub fn bind_field_or_default<T: DeserializeOwned + Default>(
    params: &Map<String, Value>,
    name: &str,
    violations: &mut Vec<Violation>,
) -> Option<T> {
    match params.get(name) {
        None | Some(Value::Null) => Some(T::default()),
        Some(_) => bind_field(params, name, violations),
    }
}

/// Check a numeric field against inclusive bounds.
///
/// Missing and non-numeric fields are left to [`bind_field`].
pub fn check_range(
    params: &Map<String, Value>,
    name: &str,
    min: Option<f64>,
    max: Option<f64>,
    violations: &mut Vec<Violation>,
) {
    let Some(number) = params.get(name).and_then(Value::as_f64) else {
        return;
    };
    if let Some(min) = min.filter(|min| number < *min) {
        violations.push(Violation::new(name, format!("must be at least {min}")));
    } else if let Some(max) = max.filter(|max| number > *max) {
        violations.push(Violation::new(name, format!("must be at most {max}")));
    }
}

/// Validates the raw `params` object of an automapped method
pub trait Validator: Send + Sync {
    fn validate(&self, params: &Value) -> Vec<Violation>;
}

/// [`Validator`] that binds `T` field by field, then runs `T`'s own checks
pub struct RequestValidator<T> {
    _request: PhantomData<fn() -> T>,
}

impl<T> RequestValidator<T> {
    pub fn new() -> Self {
        Self {
            _request: PhantomData,
        }
    }
}

impl<T> Default for RequestValidator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Validator for RequestValidator<T>
where
    T: FromParams + Validate,
{
    fn validate(&self, params: &Value) -> Vec<Violation> {
        let Value::Object(map) = params else {
            return vec![Violation::new("params", "expected named parameters")];
        };
        match T::from_params(map) {
            Ok(request) => request.validate(),
            Err(violations) => violations,
        }
    }
}

/// Accumulator for [`Validate`] implementations
#[derive(Debug, Default, Clone)]
pub struct Violations {
    items: Vec<Violation>,
}

impl Violations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation for `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.items.push(Violation::new(field, message));
        }
        self
    }

    pub fn push(&mut self, violation: Violation) -> &mut Self {
        self.items.push(violation);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Violation> {
        self.items
    }
}
