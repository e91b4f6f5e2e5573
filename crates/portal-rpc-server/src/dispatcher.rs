//! Request dispatcher
//!
//! Drives every call through
//! `Received → EnvelopeParsed → MethodResolved → Authorized → ArgumentsBound
//! → Invoked → Succeeded | Failed → ResponseBuilt`. A failure at any stage
//! is classified by the [`ErrorMapper`] using the stage it happened in.
//! Batch elements each run their own pipeline, in input order.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use futures::FutureExt;
use serde_json::Value;
use tracing::{Instrument, debug, info_span};

use crate::auth::{AuthorizationGate, AuthorizationStore, StaticAuthorizationStore};
use crate::binder::ArgumentBinder;
use crate::config::{DispatcherConfig, Environment};
use crate::context::{CallContext, CallerIdentity};
use crate::fault::{RpcFault, RpcResult};
use crate::invoker::{DirectInvoker, HandlerInvoker, panic_fault};
use crate::mapper::ErrorMapper;
use crate::registry::MethodRegistry;
use crate::reporter::{ErrorReporter, ExternalErrorFormatter, TracingErrorReporter};
use crate::request::RpcRequest;
use crate::response::{DispatchOutcome, RpcMessage};
use crate::types::RequestId;

/// Lifecycle stage of one call
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Stage {
    Received = 0,
    EnvelopeParsed = 1,
    MethodResolved = 2,
    Authorized = 3,
    ArgumentsBound = 4,
    Invoked = 5,
    Succeeded = 6,
    Failed = 7,
    ResponseBuilt = 8,
}

impl Stage {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Stage::Received,
            1 => Stage::EnvelopeParsed,
            2 => Stage::MethodResolved,
            3 => Stage::Authorized,
            4 => Stage::ArgumentsBound,
            5 => Stage::Invoked,
            6 => Stage::Succeeded,
            7 => Stage::Failed,
            _ => Stage::ResponseBuilt,
        }
    }
}

/// Stage of an in-flight call. Only moves forward.
#[derive(Debug)]
struct StageCell(AtomicU8);

impl StageCell {
    fn new() -> Self {
        Self(AtomicU8::new(Stage::Received as u8))
    }

    fn get(&self) -> Stage {
        Stage::from_u8(self.0.load(Ordering::Acquire))
    }

    fn advance(&self, next: Stage) {
        let previous = Stage::from_u8(self.0.fetch_max(next as u8, Ordering::AcqRel));
        if previous < next {
            debug!(from = ?previous, to = ?next, "Stage transition");
        }
    }
}

struct DispatcherInner {
    registry: Arc<MethodRegistry>,
    gate: AuthorizationGate,
    binder: ArgumentBinder,
    invoker: Arc<dyn HandlerInvoker>,
    mapper: ErrorMapper,
    config: DispatcherConfig,
}

/// JSON-RPC 2.0 endpoint
///
/// Cheap to clone; clones share the same registry and collaborators.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.inner.registry
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.inner.config
    }

    /// Handle a raw request body (single call or batch).
    pub async fn handle_body(&self, body: &str, identity: &CallerIdentity) -> DispatchOutcome {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => self.handle_value(value, identity).await,
            Err(err) => {
                debug!("Rejecting unparseable request body: {}", err);
                let id = RequestId::sentinel();
                let error = self.inner.mapper.map(&RpcFault::Parse(err.to_string()), Stage::Received, &id, None);
                DispatchOutcome::Single(RpcMessage::error(id, error))
            }
        }
    }

    /// Handle an already decoded request body.
    pub async fn handle_value(&self, value: Value, identity: &CallerIdentity) -> DispatchOutcome {
        match AssertUnwindSafe(self.dispatch_value(value, identity))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(payload) => {
                let id = RequestId::sentinel();
                let fault = panic_fault(payload.as_ref());
                let error = self.inner.mapper.map(&fault, Stage::Received, &id, None);
                DispatchOutcome::Single(RpcMessage::error(id, error))
            }
        }
    }

    /// Handle one request whose envelope the transport already validated.
    pub async fn handle_request(&self, request: RpcRequest, identity: &CallerIdentity) -> RpcMessage {
        let id = request.id.clone();
        let method = request.method.clone();
        let stage = StageCell::new();
        stage.advance(Stage::EnvelopeParsed);

        let span = info_span!("rpc_call", method = %method, id = %id);
        let call = self.execute(request, identity, &stage).instrument(span);
        match AssertUnwindSafe(call).catch_unwind().await {
            Ok(message) => message,
            Err(payload) => self.fail(&panic_fault(payload.as_ref()), &stage, id, Some(&method)),
        }
    }

    async fn dispatch_value(&self, value: Value, identity: &CallerIdentity) -> DispatchOutcome {
        match value {
            Value::Array(items) if items.is_empty() => {
                debug!("Rejecting empty batch");
                let id = RequestId::sentinel();
                let fault = RpcFault::InvalidRequest("empty batch".to_string());
                let error = self.inner.mapper.map(&fault, Stage::Received, &id, None);
                DispatchOutcome::Single(RpcMessage::error(id, error))
            }
            Value::Array(items) => {
                debug!("Dispatching batch of {} calls", items.len());
                let mut responses = Vec::with_capacity(items.len());
                for item in &items {
                    responses.push(self.handle_element(item, identity).await);
                }
                DispatchOutcome::Batch(responses)
            }
            single => DispatchOutcome::Single(self.handle_element(&single, identity).await),
        }
    }

    /// Run one call in its own failure boundary.
    async fn handle_element(&self, value: &Value, identity: &CallerIdentity) -> RpcMessage {
        let stage = StageCell::new();
        match AssertUnwindSafe(self.run_call(value, identity, &stage))
            .catch_unwind()
            .await
        {
            Ok(message) => message,
            Err(payload) => {
                let id = RequestId::from_envelope(value.get("id"));
                let method = value.get("method").and_then(Value::as_str);
                self.fail(&panic_fault(payload.as_ref()), &stage, id, method)
            }
        }
    }

    async fn run_call(&self, value: &Value, identity: &CallerIdentity, stage: &StageCell) -> RpcMessage {
        let request = match RpcRequest::from_value(value) {
            Ok(request) => request,
            Err((id, reason)) => {
                debug!(id = %id, "Invalid request envelope: {}", reason);
                return self.fail(&RpcFault::InvalidRequest(reason.to_string()), stage, id, None);
            }
        };
        stage.advance(Stage::EnvelopeParsed);

        let span = info_span!("rpc_call", method = %request.method, id = %request.id);
        self.execute(request, identity, stage).instrument(span).await
    }

    async fn execute(&self, request: RpcRequest, identity: &CallerIdentity, stage: &StageCell) -> RpcMessage {
        let id = request.id.clone();
        let method = request.method.clone();

        match self.pipeline(request, identity, stage).await {
            Ok(result) => {
                stage.advance(Stage::Succeeded);
                let message = RpcMessage::success(id, result);
                stage.advance(Stage::ResponseBuilt);
                message
            }
            Err(fault) => self.fail(&fault, stage, id, Some(&method)),
        }
    }

    async fn pipeline(&self, request: RpcRequest, identity: &CallerIdentity, stage: &StageCell) -> RpcResult<Value> {
        let inner = &self.inner;

        let descriptor = inner
            .registry
            .lookup(&request.method)
            .ok_or_else(|| RpcFault::MethodNotFound(request.method.clone()))?;
        stage.advance(Stage::MethodResolved);

        inner.gate.authorize(identity, &request.method).await?;
        stage.advance(Stage::Authorized);

        let args = inner
            .binder
            .bind(descriptor, request.params.as_ref(), identity)?;
        stage.advance(Stage::ArgumentsBound);

        let ctx = CallContext::new(request.method, request.id, identity.clone());
        let result = inner.invoker.invoke(descriptor, args, ctx).await;
        stage.advance(Stage::Invoked);
        result
    }

    /// Classify `fault` against the stage the call had reached.
    fn fail(&self, fault: &RpcFault, stage: &StageCell, id: RequestId, method: Option<&str>) -> RpcMessage {
        let at = stage.get();
        stage.advance(Stage::Failed);
        let error = self.inner.mapper.map(fault, at, &id, method);
        debug!(code = error.code, "Call failed: {}", fault);
        let message = RpcMessage::error(id, error);
        stage.advance(Stage::ResponseBuilt);
        message
    }
}

/// Assembles a [`Dispatcher`]
pub struct DispatcherBuilder {
    registry: Arc<MethodRegistry>,
    store: Arc<dyn AuthorizationStore>,
    invoker: Arc<dyn HandlerInvoker>,
    reporter: Arc<dyn ErrorReporter>,
    formatter: Option<Arc<dyn ExternalErrorFormatter>>,
    config: DispatcherConfig,
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self {
            registry: Arc::new(MethodRegistry::default()),
            store: Arc::new(StaticAuthorizationStore::new()),
            invoker: Arc::new(DirectInvoker),
            reporter: Arc::new(TracingErrorReporter),
            formatter: None,
            config: DispatcherConfig::default(),
        }
    }
}

impl DispatcherBuilder {
    pub fn registry(mut self, registry: impl Into<Arc<MethodRegistry>>) -> Self {
        self.registry = registry.into();
        self
    }

    pub fn authorization_store(mut self, store: Arc<dyn AuthorizationStore>) -> Self {
        self.store = store;
        self
    }

    pub fn invoker(mut self, invoker: Arc<dyn HandlerInvoker>) -> Self {
        self.invoker = invoker;
        self
    }

    pub fn error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn external_error_formatter(mut self, formatter: Arc<dyn ExternalErrorFormatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    pub fn config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Skip authorization for every call (local development, tests).
    pub fn authorization_disabled(mut self, disabled: bool) -> Self {
        self.config.authorization_disabled = disabled;
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.config.environment = environment;
        self
    }

    pub fn build(self) -> Dispatcher {
        let gate = AuthorizationGate::new(self.store, self.registry.clone())
            .disabled(self.config.authorization_disabled);

        let mut mapper = ErrorMapper::new(self.config.environment).with_reporter(self.reporter);
        if let Some(formatter) = self.formatter {
            mapper = mapper.with_formatter(formatter);
        }

        debug!(
            methods = self.registry.len(),
            environment = %self.config.environment,
            authorization_disabled = self.config.authorization_disabled,
            "Dispatcher built"
        );

        Dispatcher {
            inner: Arc::new(DispatcherInner {
                registry: self.registry,
                gate,
                binder: ArgumentBinder::new(),
                invoker: self.invoker,
                mapper,
                config: self.config,
            }),
        }
    }
}
