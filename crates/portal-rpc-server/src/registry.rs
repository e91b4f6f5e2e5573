//! Method registry
//!
//! Built once at startup from explicit registrations and
//! [`MethodBindingSource`]s, then shared read-only behind an `Arc`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::method::{MethodSignature, RpcMethod};

/// Capability expressions guarding a method
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessRule {
    /// Menu capability of the module the method belongs to
    pub menu: Option<String>,
    /// Action capability of the method itself
    pub action: Option<String>,
}

impl AccessRule {
    /// No rule: access is allowed
    pub fn none() -> Self {
        Self::default()
    }

    pub fn action(expr: impl Into<String>) -> Self {
        Self::none().with_action(expr)
    }

    pub fn menu(expr: impl Into<String>) -> Self {
        Self::none().with_menu(expr)
    }

    pub fn with_action(mut self, expr: impl Into<String>) -> Self {
        self.action = Some(expr.into());
        self
    }

    pub fn with_menu(mut self, expr: impl Into<String>) -> Self {
        self.menu = Some(expr.into());
        self
    }
}

/// One method offered by a [`MethodBindingSource`]
#[derive(Clone)]
pub struct MethodBinding {
    pub name: String,
    pub handler: Arc<dyn RpcMethod>,
    pub access: AccessRule,
}

impl MethodBinding {
    pub fn new(name: impl Into<String>, handler: Arc<dyn RpcMethod>, access: AccessRule) -> Self {
        Self {
            name: name.into(),
            handler,
            access,
        }
    }
}

/// Anything that contributes methods to the registry (a business module,
/// a plugin, ...)
pub trait MethodBindingSource {
    fn bindings(&self) -> Vec<MethodBinding>;
}

/// Resolved method entry
#[derive(Clone)]
pub struct MethodDescriptor {
    pub name: String,
    handler: Arc<dyn RpcMethod>,
    pub access: AccessRule,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>, handler: Arc<dyn RpcMethod>, access: AccessRule) -> Self {
        Self {
            name: name.into(),
            handler,
            access,
        }
    }

    pub fn handler(&self) -> &Arc<dyn RpcMethod> {
        &self.handler
    }

    pub fn signature(&self) -> &MethodSignature {
        self.handler.signature()
    }

    pub fn is_automapped(&self) -> bool {
        self.signature().is_automapped()
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("signature", self.signature())
            .field("access", &self.access)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("method '{0}' is registered more than once")]
    DuplicateMethod(String),

    #[error("method name must not be empty")]
    InvalidMethodName,
}

/// Immutable name → method table
#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: HashMap<String, MethodDescriptor>,
}

impl MethodRegistry {
    pub fn builder() -> MethodRegistryBuilder {
        MethodRegistryBuilder::default()
    }

    /// Build a registry from binding sources only.
    pub fn load<'a, I>(sources: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = &'a dyn MethodBindingSource>,
    {
        sources
            .into_iter()
            .fold(Self::builder(), |builder, source| builder.source(source))
            .build()
    }

    pub fn lookup(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Registered names, sorted
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Collects bindings; conflicts surface in [`build`](Self::build)
#[derive(Default)]
pub struct MethodRegistryBuilder {
    bindings: Vec<MethodBinding>,
}

impl MethodRegistryBuilder {
    /// Register a method without access rules.
    pub fn register(self, name: impl Into<String>, handler: Arc<dyn RpcMethod>) -> Self {
        self.bind(MethodBinding::new(name, handler, AccessRule::none()))
    }

    /// Register a method guarded by `access`.
    pub fn register_with_access(
        self,
        name: impl Into<String>,
        handler: Arc<dyn RpcMethod>,
        access: AccessRule,
    ) -> Self {
        self.bind(MethodBinding::new(name, handler, access))
    }

    pub fn bind(mut self, binding: MethodBinding) -> Self {
        self.bindings.push(binding);
        self
    }

    pub fn source(mut self, source: &dyn MethodBindingSource) -> Self {
        self.bindings.extend(source.bindings());
        self
    }

    pub fn build(self) -> Result<MethodRegistry, RegistryError> {
        let mut methods = HashMap::with_capacity(self.bindings.len());

        for binding in self.bindings {
            if binding.name.trim().is_empty() {
                return Err(RegistryError::InvalidMethodName);
            }
            if methods.contains_key(&binding.name) {
                return Err(RegistryError::DuplicateMethod(binding.name));
            }
            let descriptor = MethodDescriptor::new(binding.name.clone(), binding.handler, binding.access);
            methods.insert(binding.name, descriptor);
        }

        debug!("Method registry built with {} methods", methods.len());
        Ok(MethodRegistry { methods })
    }
}
