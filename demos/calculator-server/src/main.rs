//! # Calculator Server
//!
//! Serves a handful of arithmetic methods over JSON-RPC 2.0 on HTTP.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --package calculator-server -- --bind 127.0.0.1:8080
//!
//! curl -s -H 'Content-Type: application/json' \
//!     -d '{"jsonrpc":"2.0","method":"subtract","params":[42,23],"id":1}' \
//!     http://127.0.0.1:8080/rpc
//! ```
//!
//! ## Methods
//!
//! - `subtract`: `[minuend, subtrahend]` or `{"minuend": .., "subtrahend": ..}`
//! - `sum`: an array of integers
//! - `echo`: returns its params unchanged
//! - `request_id`: returns the textual form of the caller's request id
//! - `update`: notification sink that counts what it receives

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use futures::FutureExt;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use switchboard_http::HttpJsonRpcServerBuilder;
use switchboard_json_rpc::prelude::*;

#[derive(Parser)]
#[command(name = "calculator-server", about = "JSON-RPC 2.0 calculator over HTTP")]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// Path of the JSON-RPC endpoint
    #[arg(short, long, default_value = "/rpc")]
    path: String,

    /// Maximum request body size in bytes
    #[arg(long, default_value_t = 1024 * 1024)]
    max_body_size: usize,

    /// Disable CORS headers
    #[arg(long)]
    no_cors: bool,

    /// Allow a single origin instead of any
    #[arg(long)]
    cors_origin: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Operands for `subtract`, by position or by name
#[derive(Deserialize)]
#[serde(untagged)]
enum SubtractParams {
    Positional(i64, i64),
    Named { minuend: i64, subtrahend: i64 },
}

impl SubtractParams {
    fn difference(&self) -> Option<i64> {
        match *self {
            SubtractParams::Positional(minuend, subtrahend)
            | SubtractParams::Named {
                minuend,
                subtrahend,
            } => minuend.checked_sub(subtrahend),
        }
    }
}

fn overflow() -> MethodError {
    JsonRpcErrorObject::custom(1, "Arithmetic overflow", None).into()
}

fn subtract() -> impl MethodHandler {
    handler_fn(|_ctx, params| {
        async move {
            let operands: SubtractParams = params.parse()?;
            let difference = operands.difference().ok_or_else(overflow)?;
            Ok::<_, MethodError>(json!(difference))
        }
        .boxed()
    })
}

fn sum() -> impl MethodHandler {
    handler_fn(|_ctx, params| {
        async move {
            let values: Vec<i64> = params.parse()?;
            let total = values
                .iter()
                .try_fold(0i64, |acc, v| acc.checked_add(*v))
                .ok_or_else(overflow)?;
            Ok::<_, MethodError>(json!(total))
        }
        .boxed()
    })
}

fn echo() -> impl MethodHandler {
    handler_fn(|_ctx, params| {
        async move {
            if params.is_absent() {
                return Ok::<_, MethodError>(Value::Null);
            }
            Ok(params.parse::<Value>()?)
        }
        .boxed()
    })
}

fn request_id() -> impl MethodHandler {
    handler_fn(|ctx, _params| {
        async move { Ok::<_, MethodError>(json!(ctx.request_id_text())) }.boxed()
    })
}

/// Counts `update` notifications
#[derive(Default)]
struct UpdateSink {
    received: AtomicU64,
}

#[async_trait]
impl MethodHandler for UpdateSink {
    async fn handle(
        &self,
        ctx: &RequestContext,
        params: &Params,
        result: &mut ResultWriter,
    ) -> Result<(), MethodError> {
        let count = self.received.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            count,
            params = %String::from_utf8_lossy(params.as_bytes()),
            "update received"
        );
        // Only read back when called with an id
        if !ctx.request_id().is_notification() {
            result.write_json(&count)?;
        }
        Ok(())
    }
}

fn register_methods(registry: &MethodRegistry) {
    registry.register("subtract", subtract());
    registry.register("sum", sum());
    registry.register("echo", echo());
    registry.register("request_id", request_id());
    registry.register("update", UpdateSink::default());
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            info!("SIGTERM received, starting graceful shutdown");
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let registry = Arc::new(MethodRegistry::new());
    register_methods(&registry);

    let mut builder = HttpJsonRpcServerBuilder::with_registry(registry)
        .bind_address(args.bind)
        .rpc_path(args.path)
        .max_body_size(args.max_body_size)
        .cors(!args.no_cors);
    if let Some(origin) = args.cors_origin {
        builder = builder.cors_origin(origin);
    }

    let server = builder
        .build()
        .context("invalid server configuration")?;

    info!("Starting calculator server on {}", args.bind);
    server
        .run_until(shutdown_signal())
        .await
        .context("server failed")?;

    info!("Calculator server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_json_rpc::JsonRpcDispatcher;
    use tokio_util::sync::CancellationToken;

    async fn call(body: &str) -> Option<Value> {
        let registry = Arc::new(MethodRegistry::new());
        register_methods(&registry);
        let outcome = JsonRpcDispatcher::new(registry)
            .process(body.as_bytes(), CancellationToken::new())
            .await;
        outcome.body().map(|b| serde_json::from_slice(b).unwrap())
    }

    #[tokio::test]
    async fn test_subtract_positional_and_named() {
        let positional =
            call(r#"{"jsonrpc":"2.0","method":"subtract","params":[42,23],"id":1}"#).await;
        assert_eq!(positional.unwrap()["result"], 19);

        let named = call(
            r#"{"jsonrpc":"2.0","method":"subtract","params":{"subtrahend":23,"minuend":42},"id":2}"#,
        )
        .await;
        assert_eq!(named.unwrap()["result"], 19);
    }

    #[tokio::test]
    async fn test_sum_overflow_is_application_error() {
        let body = call(r#"{"jsonrpc":"2.0","method":"sum","params":[1,2,3],"id":1}"#).await;
        assert_eq!(body.unwrap()["result"], 6);

        let body = call(&format!(
            r#"{{"jsonrpc":"2.0","method":"sum","params":[{},1],"id":2}}"#,
            i64::MAX
        ))
        .await
        .unwrap();
        assert_eq!(body["error"]["code"], 1);
    }

    #[tokio::test]
    async fn test_echo_and_request_id() {
        let body = call(r#"{"jsonrpc":"2.0","method":"echo","params":{"a":[1,2]},"id":"e"}"#)
            .await
            .unwrap();
        assert_eq!(body["result"], json!({"a": [1, 2]}));

        let body = call(r#"{"jsonrpc":"2.0","method":"request_id","id":"abc"}"#)
            .await
            .unwrap();
        assert_eq!(body["result"], "\"abc\"");
    }

    #[tokio::test]
    async fn test_update_notification_has_no_response() {
        let body = call(r#"{"jsonrpc":"2.0","method":"update","params":[1,2,3,4,5]}"#).await;
        assert!(body.is_none());
    }
}
