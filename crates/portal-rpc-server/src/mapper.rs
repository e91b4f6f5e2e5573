//! Failure classification
//!
//! [`ErrorMapper::map`] turns any [`RpcFault`] into the `(code, message,
//! data)` triple of the wire error. Unexpected failures are handed to the
//! [`ErrorReporter`] and only carry exception detail outside production.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::warn;

use crate::config::Environment;
use crate::dispatcher::Stage;
use crate::error::RpcErrorObject;
use crate::fault::RpcFault;
use crate::reporter::{ErrorReporter, ExternalErrorFormatter, FaultReport, TracingErrorReporter};
use crate::types::RequestId;

#[derive(Clone)]
pub struct ErrorMapper {
    environment: Environment,
    formatter: Option<Arc<dyn ExternalErrorFormatter>>,
    reporter: Arc<dyn ErrorReporter>,
}

impl Default for ErrorMapper {
    fn default() -> Self {
        Self::new(Environment::default())
    }
}

impl ErrorMapper {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            formatter: None,
            reporter: Arc::new(TracingErrorReporter),
        }
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn ExternalErrorFormatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Classify `fault`, raised while the call was at `stage`.
    pub fn map(
        &self,
        fault: &RpcFault,
        stage: Stage,
        id: &RequestId,
        method: Option<&str>,
    ) -> RpcErrorObject {
        match fault {
            RpcFault::Parse(_) => RpcErrorObject::parse_error(),
            RpcFault::InvalidRequest(_) => RpcErrorObject::invalid_request(),
            RpcFault::MethodNotFound(_) => RpcErrorObject::method_not_found(),
            RpcFault::AccessDenied { .. } => RpcErrorObject::http(
                crate::error_codes::FORBIDDEN,
                fault.to_string(),
                None,
            ),
            RpcFault::Validation {
                message,
                violations,
            } => RpcErrorObject::http(
                crate::error_codes::BAD_REQUEST,
                message.clone(),
                Some(json!({
                    "violations": violations,
                    "skipSystemMessage": true,
                })),
            ),
            RpcFault::NotFound(message) => RpcErrorObject::http(
                crate::error_codes::NOT_FOUND,
                message.clone(),
                None,
            ),
            RpcFault::Http { status, message } => RpcErrorObject::http(*status, message.clone(), None),
            RpcFault::Domain {
                code,
                message,
                context,
            } => RpcErrorObject::custom(*code, message.clone(), context.clone()),
            RpcFault::External { code, message } => {
                let text = self
                    .formatter
                    .as_ref()
                    .and_then(|formatter| formatter.format(*code, message))
                    .unwrap_or_else(|| message.clone());
                RpcErrorObject::custom(*code, text, None)
            }
            RpcFault::Internal { .. } | RpcFault::Panic { .. } => {
                self.report(fault, stage, id, method);
                self.unexpected(fault, stage)
            }
        }
    }

    fn unexpected(&self, fault: &RpcFault, stage: Stage) -> RpcErrorObject {
        let error = if stage < Stage::MethodResolved {
            RpcErrorObject::internal_error(None)
        } else {
            RpcErrorObject::http(
                crate::error_codes::SERVER_ERROR,
                "internal server error",
                None,
            )
        };

        if self.environment.is_production() {
            error
        } else {
            error.with_data_entry("exception", exception_detail(fault))
        }
    }

    fn report(&self, fault: &RpcFault, stage: Stage, id: &RequestId, method: Option<&str>) {
        let report = FaultReport {
            fault,
            method,
            request_id: id,
            stage,
        };
        if catch_unwind(AssertUnwindSafe(|| self.reporter.report(&report))).is_err() {
            warn!(id = %id, "Error reporter panicked");
        }
    }
}

fn exception_detail(fault: &RpcFault) -> Value {
    match fault {
        RpcFault::Internal {
            name,
            error,
            location,
        } => {
            let mut trace: Vec<String> = error.chain().skip(1).map(|cause| cause.to_string()).collect();
            let backtrace = error.backtrace();
            if backtrace.status() == std::backtrace::BacktraceStatus::Captured {
                trace.extend(backtrace.to_string().lines().map(str::to_string));
            }
            json!({
                "name": name,
                "message": error.to_string(),
                "code": 0,
                "file": location.file(),
                "line": location.line(),
                "trace": trace,
            })
        }
        other => json!({
            "name": "panic",
            "message": other.to_string(),
            "code": 0,
            "file": null,
            "line": null,
            "trace": [],
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::Violation;
    use crate::reporter::CodeTableFormatter;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn id() -> RequestId {
        RequestId::from("1")
    }

    #[derive(Default)]
    struct CountingReporter(AtomicUsize);

    impl ErrorReporter for CountingReporter {
        fn report(&self, _: &FaultReport<'_>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct PanickingReporter;

    impl ErrorReporter for PanickingReporter {
        fn report(&self, _: &FaultReport<'_>) {
            panic!("reporter down");
        }
    }

    #[test]
    fn test_safe_faults() {
        let mapper = ErrorMapper::default();
        let map = |fault: RpcFault| mapper.map(&fault, Stage::Invoked, &id(), Some("m"));

        let denied = map(RpcFault::access_denied("loans"));
        assert_eq!((denied.code, denied.message.as_str()), (403, "no permission: loans"));
        assert!(denied.data.is_none());

        let missing = map(RpcFault::not_found("Loan 3 not found"));
        assert_eq!((missing.code, missing.message.as_str()), (404, "Loan 3 not found"));

        let teapot = map(RpcFault::http(418, "short and stout"));
        assert_eq!(teapot.code, 418);

        let domain = map(RpcFault::domain(4001, "Loan already closed").with_context(json!({"loanId": 3})));
        assert_eq!(domain.code, 4001);
        assert_eq!(domain.data, Some(json!({"loanId": 3})));
    }

    #[test]
    fn test_validation_data() {
        let error = ErrorMapper::default().map(
            &RpcFault::validation(vec![
                Violation::new("email", "must not be blank"),
                Violation::new("age", "must be positive"),
            ]),
            Stage::MethodResolved,
            &id(),
            None,
        );
        assert_eq!(error.code, 400);
        assert_eq!(
            error.data,
            Some(json!({
                "violations": [
                    {"field": "email", "message": "must not be blank"},
                    {"field": "age", "message": "must be positive"}
                ],
                "skipSystemMessage": true
            }))
        );
    }

    #[test]
    fn test_external_formatting() {
        let mapper = ErrorMapper::default()
            .with_formatter(Arc::new(CodeTableFormatter::new().with_code(1062, "Already exists")));

        let known = mapper.map(&RpcFault::external(1062, "Duplicate entry"), Stage::Invoked, &id(), None);
        assert_eq!((known.code, known.message.as_str()), (1062, "Already exists"));

        let unknown = mapper.map(&RpcFault::external(2006, "server has gone away"), Stage::Invoked, &id(), None);
        assert_eq!(unknown.message, "server has gone away");
    }

    #[test]
    fn test_unexpected_code_depends_on_stage() {
        let mapper = ErrorMapper::new(Environment::Production);
        let early = mapper.map(&RpcFault::internal_msg("x"), Stage::EnvelopeParsed, &id(), None);
        let late = mapper.map(&RpcFault::internal_msg("x"), Stage::Invoked, &id(), Some("m"));

        assert_eq!(early.code, -32603);
        assert_eq!(late.code, 500);
        assert_eq!(late.message, "internal server error");
        assert!(early.data.is_none() && late.data.is_none());
    }

    #[test]
    fn test_exception_detail_outside_production() {
        let error = ErrorMapper::new(Environment::Development).map(
            &RpcFault::internal_msg("ledger mismatch"),
            Stage::Invoked,
            &id(),
            Some("m"),
        );
        let exception = &error.data.unwrap()["exception"];
        assert_eq!(exception["message"], "ledger mismatch");
        assert_eq!(exception["code"], 0);
        assert!(exception["file"].as_str().unwrap().ends_with("mapper.rs"));
        assert!(exception["line"].as_u64().unwrap() > 0);
        assert!(exception["name"].is_string());
    }

    #[test]
    fn test_panics_have_no_location() {
        let error = ErrorMapper::new(Environment::Test).map(
            &RpcFault::Panic { message: "boom".into() },
            Stage::Invoked,
            &id(),
            None,
        );
        let exception = &error.data.unwrap()["exception"];
        assert_eq!(exception["name"], "panic");
        assert!(exception["file"].is_null());
    }

    #[test]
    fn test_only_unexpected_faults_are_reported() {
        let reporter = Arc::new(CountingReporter::default());
        let mapper = ErrorMapper::default().with_reporter(reporter.clone());

        mapper.map(&RpcFault::not_found("x"), Stage::Invoked, &id(), None);
        mapper.map(&RpcFault::access_denied("x"), Stage::MethodResolved, &id(), None);
        assert_eq!(reporter.0.load(Ordering::SeqCst), 0);

        mapper.map(&RpcFault::internal_msg("x"), Stage::Invoked, &id(), None);
        assert_eq!(reporter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_reporter_does_not_change_the_response() {
        let mapper = ErrorMapper::default().with_reporter(Arc::new(PanickingReporter));
        let error = mapper.map(&RpcFault::internal_msg("x"), Stage::Invoked, &id(), None);
        assert_eq!(error.code, 500);
    }
}
