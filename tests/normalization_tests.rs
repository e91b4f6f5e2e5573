//! Result normalization through the dispatcher

mod support;

use std::borrow::Cow;

use portal_rpc_server::prelude::*;
use serde::Serialize;
use serde_json::{Value, json};
use support::call;

#[derive(Debug, Clone, Copy, WireEnum)]
enum LeaveStatus {
    #[wire(title = "Waiting for approval")]
    Pending = 1,
    #[wire(title = "Approved")]
    Approved = 2,
    #[wire(title = "Rejected")]
    Rejected = 3,
}

#[derive(Debug, Clone, Copy, WireEnum)]
enum Office {
    #[wire(value = "AMS")]
    Amsterdam,
    #[wire(value = "LIS")]
    Lisbon,
}

#[derive(Debug, Clone, Copy, WireEnum)]
enum Weekday {
    Monday,
    #[wire(name = "FRIDAY")]
    Friday,
}

/// Hand-written enum with a computed title
enum Grade {
    Junior,
    Senior,
}

impl WireEnum for Grade {
    fn wire_name(&self) -> &'static str {
        match self {
            Grade::Junior => "Junior",
            Grade::Senior => "Senior",
        }
    }

    fn wire_value(&self) -> Option<Value> {
        Some(match self {
            Grade::Junior => json!("J"),
            Grade::Senior => json!("S"),
        })
    }

    fn wire_title(&self) -> Option<Cow<'static, str>> {
        Some(Cow::Owned(format!("{} grade", self.wire_name())))
    }
}

impl Serialize for Grade {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_wire_enum(self, serializer)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LeaveOverview {
    employee_name: String,
    office: Office,
    grade: Grade,
    requests: Vec<LeaveEntry>,
}

#[derive(Serialize)]
struct LeaveEntry {
    day: Weekday,
    status: LeaveStatus,
    history: Vec<LeaveStatus>,
}

fn dispatcher() -> Dispatcher {
    let registry = MethodRegistry::builder()
        .register(
            "leave.status",
            positional(vec![], |_: Arguments, _: CallContext| async move {
                Ok(LeaveStatus::Approved)
            }),
        )
        .register(
            "leave.office",
            positional(vec![], |_: Arguments, _: CallContext| async move { Ok(Office::Lisbon) }),
        )
        .register(
            "leave.weekday",
            positional(vec![], |_: Arguments, _: CallContext| async move {
                Ok(vec![Weekday::Monday, Weekday::Friday])
            }),
        )
        .register(
            "leave.overview",
            positional(vec![], |_: Arguments, ctx: CallContext| async move {
                Ok(LeaveOverview {
                    employee_name: ctx.identity.name,
                    office: Office::Amsterdam,
                    grade: Grade::Senior,
                    requests: vec![LeaveEntry {
                        day: Weekday::Friday,
                        status: LeaveStatus::Pending,
                        history: vec![LeaveStatus::Rejected, LeaveStatus::Pending],
                    }],
                })
            }),
        )
        .register(
            "leave.matrix",
            positional(vec![], |_: Arguments, _: CallContext| async move {
                let mut by_quarter = std::collections::HashMap::new();
                by_quarter.insert(1u8, LeaveStatus::Approved);
                Ok(by_quarter)
            }),
        )
        .build()
        .unwrap();

    Dispatcher::builder()
        .registry(registry)
        .environment(Environment::Development)
        .build()
}

async fn result_of(method: &str) -> Value {
    call(&dispatcher(), json!({"jsonrpc": "2.0", "method": method, "id": 1})).await
}

#[tokio::test]
async fn test_titled_scalar_backed_enum() {
    let response = result_of("leave.status").await;
    assert_eq!(
        response["result"],
        json!({"name": "Approved", "value": 2, "title": "Approved"})
    );
}

#[tokio::test]
async fn test_untitled_enum_omits_title() {
    let response = result_of("leave.office").await;
    assert_eq!(response["result"], json!({"name": "Lisbon", "value": "LIS"}));
    assert!(response["result"].get("title").is_none());
}

#[tokio::test]
async fn test_pure_enum_has_only_a_name() {
    let response = result_of("leave.weekday").await;
    assert_eq!(response["result"], json!([{"name": "Monday"}, {"name": "FRIDAY"}]));
}

#[tokio::test]
async fn test_enums_are_normalized_at_any_depth() {
    let response = result_of("leave.overview").await;
    assert_eq!(
        response["result"],
        json!({
            "employeeName": "Clerk",
            "office": {"name": "Amsterdam", "value": "AMS"},
            "grade": {"name": "Senior", "value": "S", "title": "Senior grade"},
            "requests": [{
                "day": {"name": "FRIDAY"},
                "status": {"name": "Pending", "value": 1, "title": "Waiting for approval"},
                "history": [
                    {"name": "Rejected", "value": 3, "title": "Rejected"},
                    {"name": "Pending", "value": 1, "title": "Waiting for approval"}
                ]
            }]
        })
    );
}

#[tokio::test]
async fn test_integer_map_keys_become_strings() {
    let response = result_of("leave.matrix").await;
    assert_eq!(
        response["result"],
        json!({"1": {"name": "Approved", "value": 2, "title": "Approved"}})
    );
}
