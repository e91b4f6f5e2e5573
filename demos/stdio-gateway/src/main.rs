//! # Stdio Gateway
//!
//! Wires the portal dispatcher to stdin/stdout for local manual testing.
//! Every input line is one request body (single call or batch); every
//! output line is the response. Logs go to stderr.
//!
//! ## Usage
//! ```bash
//! echo '{"jsonrpc":"2.0","method":"directory.whoami","id":1}' \
//!   | cargo run --package stdio-gateway -- --user ada --role hr
//!
//! PORTAL_RPC_ENV=development RUST_LOG=debug \
//!   cargo run --package stdio-gateway -- --no-auth
//! ```

mod modules;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use portal_rpc_server::prelude::*;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Caller id used for every request
    #[arg(short, long, default_value = "anonymous")]
    user: String,

    /// Roles of the caller (repeatable)
    #[arg(short, long)]
    role: Vec<String>,

    /// Deployment environment, overrides PORTAL_RPC_ENV
    #[arg(short, long)]
    env: Option<Environment>,

    /// Skip authorization checks, overrides PORTAL_RPC_AUTH_DISABLED
    #[arg(long, default_value = "false")]
    no_auth: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = DispatcherConfig::from_env().context("invalid dispatcher configuration")?;
    if let Some(environment) = args.env {
        config = config.environment(environment);
    }
    if args.no_auth {
        config = config.authorization_disabled(true);
    }

    let sources: [&dyn MethodBindingSource; 2] =
        [&modules::DirectoryModule, &modules::LeaveModule];
    let registry = MethodRegistry::load(sources).context("failed to build method registry")?;
    info!("Registered methods: {}", registry.method_names().join(", "));

    let dispatcher = Dispatcher::builder()
        .registry(registry)
        .authorization_store(Arc::new(modules::authorization_store()))
        .external_error_formatter(Arc::new(modules::external_errors()))
        .config(config)
        .build();

    let identity = args
        .role
        .iter()
        .fold(CallerIdentity::new(&args.user, &args.user), |identity, role| {
            identity.with_role(role)
        });
    info!(
        user = %identity.id,
        environment = %dispatcher.config().environment,
        "Reading JSON-RPC requests from stdin"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        debug!("Request: {}", line);
        let outcome = dispatcher.handle_body(&line, &identity).await;
        stdout.write_all(outcome.to_json_string().as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    Ok(())
}
