//! Error reporting and external error formatting

use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::{error, warn};

use crate::dispatcher::Stage;
use crate::fault::RpcFault;
use crate::types::RequestId;

/// An unexpected failure handed to the [`ErrorReporter`]
#[derive(Debug)]
pub struct FaultReport<'a> {
    pub fault: &'a RpcFault,
    pub method: Option<&'a str>,
    pub request_id: &'a RequestId,
    pub stage: Stage,
}

/// Fire-and-forget sink for unexpected failures (crash reporting, alerting).
///
/// `report` runs on the response path and must not block: log, or hand an
/// owned [`ReportedFault`] to another task (see [`QueuedErrorReporter`]),
/// but never wait on network or disk here. Whatever an implementation does,
/// including panicking, never changes the response sent to the caller.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, report: &FaultReport<'_>);
}

/// Reports through `tracing` at error level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorReporter;

impl ErrorReporter for TracingErrorReporter {
    fn report(&self, report: &FaultReport<'_>) {
        error!(
            method = report.method.unwrap_or("-"),
            id = %report.request_id,
            stage = ?report.stage,
            "Unexpected RPC failure: {}",
            report.fault
        );
    }
}

/// Owned copy of a [`FaultReport`] that can outlive the call
#[derive(Debug, Clone, PartialEq)]
pub struct ReportedFault {
    pub method: Option<String>,
    pub request_id: RequestId,
    pub stage: Stage,
    pub message: String,
}

impl From<&FaultReport<'_>> for ReportedFault {
    fn from(report: &FaultReport<'_>) -> Self {
        Self {
            method: report.method.map(str::to_string),
            request_id: report.request_id.clone(),
            stage: report.stage,
            message: report.fault.to_string(),
        }
    }
}

/// Queues reports on a bounded channel for a background consumer.
///
/// Reports are dropped with a warning when the queue is full or the
/// receiver is gone, so `report` never waits.
#[derive(Debug, Clone)]
pub struct QueuedErrorReporter {
    sender: mpsc::Sender<ReportedFault>,
}

impl QueuedErrorReporter {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ReportedFault>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

impl ErrorReporter for QueuedErrorReporter {
    fn report(&self, report: &FaultReport<'_>) {
        match self.sender.try_send(ReportedFault::from(report)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                warn!(id = %dropped.request_id, "Error report queue full, dropping report");
            }
            Err(mpsc::error::TrySendError::Closed(dropped)) => {
                warn!(id = %dropped.request_id, "Error report queue closed, dropping report");
            }
        }
    }
}

/// User-facing text for known external-system error codes
pub trait ExternalErrorFormatter: Send + Sync {
    /// `None` when the code is not recognized.
    fn format(&self, code: i64, message: &str) -> Option<String>;
}

/// [`ExternalErrorFormatter`] backed by a code → template table.
///
/// `{message}` in a template is replaced by the raw external message.
#[derive(Debug, Clone, Default)]
pub struct CodeTableFormatter {
    templates: HashMap<i64, String>,
}

impl CodeTableFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_code(mut self, code: i64, template: impl Into<String>) -> Self {
        self.templates.insert(code, template.into());
        self
    }
}

impl ExternalErrorFormatter for CodeTableFormatter {
    fn format(&self, code: i64, message: &str) -> Option<String> {
        self.templates
            .get(&code)
            .map(|template| template.replace("{message}", message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_code_table() {
        let formatter = CodeTableFormatter::new()
            .with_code(1062, "This record already exists")
            .with_code(1451, "Still referenced: {message}");

        assert_eq!(
            formatter.format(1062, "Duplicate entry 'x'").as_deref(),
            Some("This record already exists")
        );
        assert_eq!(
            formatter.format(1451, "fk_loan_employee").as_deref(),
            Some("Still referenced: fk_loan_employee")
        );
        assert_eq!(formatter.format(2002, "gone"), None);
    }

    #[tokio::test]
    async fn test_queued_reporter_hands_off_without_waiting() {
        let (reporter, mut receiver) = QueuedErrorReporter::channel(1);
        let fault = RpcFault::internal_msg("smtp timeout");
        let id = RequestId::from(4);
        let report = FaultReport {
            fault: &fault,
            method: Some("mail.send"),
            request_id: &id,
            stage: Stage::Invoked,
        };

        reporter.report(&report);
        // queue is full now, the second report is dropped instead of blocking
        reporter.report(&report);

        let queued = receiver.recv().await.unwrap();
        assert_eq!(queued.method.as_deref(), Some("mail.send"));
        assert_eq!(queued.request_id, RequestId::from(4));
        assert_eq!(queued.stage, Stage::Invoked);
        assert_eq!(queued.message, "smtp timeout");
        assert!(receiver.try_recv().is_err());

        drop(receiver);
        reporter.report(&report);
    }

    #[traced_test]
    #[test]
    fn test_tracing_reporter_logs_the_fault() {
        let fault = RpcFault::internal_msg("disk full");
        let id = RequestId::from("r-9");
        TracingErrorReporter.report(&FaultReport {
            fault: &fault,
            method: Some("report.export"),
            request_id: &id,
            stage: Stage::Invoked,
        });

        assert!(logs_contain("Unexpected RPC failure: disk full"));
        assert!(logs_contain("report.export"));
    }
}
