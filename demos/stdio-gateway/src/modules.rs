//! Sample business modules served by the gateway

use portal_rpc_server::prelude::*;
use serde_json::json;

pub struct DirectoryModule;

impl MethodBindingSource for DirectoryModule {
    fn bindings(&self) -> Vec<MethodBinding> {
        vec![
            MethodBinding::new(
                "directory.whoami",
                positional(
                    vec![ParamSpec::caller("caller")],
                    |args: Arguments, _ctx: CallContext| async move {
                        let caller: CallerIdentity = args.get("caller")?;
                        Ok(caller)
                    },
                ),
                AccessRule::none(),
            ),
            MethodBinding::new(
                "directory.search",
                automapped(|query: SearchQuery, _ctx: CallContext| async move {
                    let needle = query.text.to_lowercase();
                    let hits: Vec<_> = EMPLOYEES
                        .iter()
                        .filter(|(_, name)| name.to_lowercase().contains(&needle))
                        .take(query.limit.unwrap_or(10))
                        .map(|(id, name)| json!({"id": id, "name": name}))
                        .collect();
                    Ok(hits)
                }),
                AccessRule::menu("menu.directory"),
            ),
        ]
    }
}

const EMPLOYEES: [(u32, &str); 4] = [
    (1, "Ada Lovelace"),
    (2, "Grace Hopper"),
    (3, "Edsger Dijkstra"),
    (4, "Barbara Liskov"),
];

#[derive(FromParams)]
struct SearchQuery {
    text: String,
    #[param(min = 1, max = 50)]
    limit: Option<usize>,
}

impl Validate for SearchQuery {
    fn validate(&self) -> Vec<Violation> {
        let mut violations = Violations::new();
        violations.check(self.text.trim().len() >= 2, "text", "must have at least 2 characters");
        violations.into_vec()
    }
}

#[derive(Debug, Clone, Copy, WireEnum)]
pub enum LeaveStatus {
    #[wire(title = "Waiting for approval")]
    Pending = 1,
    #[wire(title = "Approved")]
    Approved = 2,
}

pub struct LeaveModule;

impl MethodBindingSource for LeaveModule {
    fn bindings(&self) -> Vec<MethodBinding> {
        vec![
            MethodBinding::new(
                "leave.status",
                positional(
                    vec![ParamSpec::required("requestId", ParamKind::Integer)],
                    |args: Arguments, _ctx: CallContext| async move {
                        let request_id: u32 = args.get("requestId")?;
                        match request_id {
                            1 => Ok(json!({"requestId": 1, "status": LeaveStatus::Pending})),
                            2 => Ok(json!({"requestId": 2, "status": LeaveStatus::Approved})),
                            _ => Err(RpcFault::not_found(format!("Leave request {request_id} not found"))),
                        }
                    },
                ),
                AccessRule::menu("menu.leave"),
            ),
            MethodBinding::new(
                "leave.approve",
                positional(
                    vec![ParamSpec::required("requestId", ParamKind::Integer)],
                    |args: Arguments, _ctx: CallContext| async move {
                        let request_id: u32 = args.get("requestId")?;
                        if request_id == 2 {
                            return Err(RpcFault::domain(4090, "Leave request is already approved")
                                .with_context(json!({"requestId": request_id})));
                        }
                        if request_id == 3 {
                            return Err(RpcFault::external(1062, "Duplicate entry '3' for key 'approval'"));
                        }
                        Ok(json!({"requestId": request_id, "status": LeaveStatus::Approved}))
                    },
                ),
                AccessRule::menu("menu.leave").with_action("leave.approve"),
            ),
        ]
    }
}

pub fn authorization_store() -> StaticAuthorizationStore {
    StaticAuthorizationStore::new()
        .grant_role("employee", "menu.directory")
        .grant_role("employee", "menu.leave")
        .grant_role("hr", "menu.directory")
        .grant_role("hr", "menu.leave")
        .grant_role("hr", "leave.approve")
}

pub fn external_errors() -> CodeTableFormatter {
    CodeTableFormatter::new().with_code(1062, "This record already exists ({message})")
}
