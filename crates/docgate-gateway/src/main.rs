//! docgate gateway binary.
//!
//! - Loads the strict YAML config (first CLI arg, `DOCGATE_CONFIG`, or `docgate.yaml`)
//! - Probes the remote connection (startup continues on failure)
//! - Serves line-delimited JSON requests on stdin, one response line per request on stdout

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

use docgate_core::error::Result;
use docgate_gateway::dispatch::Args;
use docgate_gateway::{app_state::AppState, config};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Request {
    operation: String,
    #[serde(default)]
    arguments: Value,
}

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        tracing::error!(code = e.client_code().as_str(), error = %e, "docgate-gateway stopped");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("DOCGATE_CONFIG").ok())
        .unwrap_or_else(|| "docgate.yaml".to_string());

    let cfg = config::load_from_file(&path)?;
    tracing::info!(config = %path, remote = %cfg.remote.url, "config loaded");

    let state = AppState::new(cfg)?;

    if state.client().test_connection().await {
        tracing::info!("remote connection ok");
    } else {
        tracing::warn!("remote connection failed, serving anyway");
    }

    let policy = state.policy();
    tracing::info!(
        doctypes = ?policy.configured_doctypes(),
        operations = state.dispatcher().operations().len(),
        "docgate-gateway ready"
    );

    serve_stdio(&state).await
}

async fn serve_stdio(state: &AppState) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut out = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.map_err(io_err)? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(state, &line).await;
        out.write_all(format!("{response}\n").as_bytes())
            .await
            .map_err(io_err)?;
        out.flush().await.map_err(io_err)?;
    }
    Ok(())
}

async fn handle_line(state: &AppState, line: &str) -> Value {
    let result = match serde_json::from_str::<Request>(line) {
        Ok(req) => match Args::from_value(req.arguments) {
            Ok(args) => state.call(&req.operation, args).await,
            Err(e) => Err(e),
        },
        Err(e) => Err(docgate_core::DocGateError::Validation(format!(
            "invalid request: {e}"
        ))),
    };

    match result {
        Ok(o) => json!({ "ok": true, "message": o.message, "data": o.data }),
        Err(e) => json!({ "ok": false, "code": e.client_code().as_str(), "error": e.to_string() }),
    }
}

fn io_err(e: std::io::Error) -> docgate_core::DocGateError {
    docgate_core::DocGateError::Internal(format!("stdio: {e}"))
}
