//! # HTTP JSON-RPC Server
//!
//! HTTP/1.1 binding for the `switchboard-json-rpc` dispatcher. Each POST to the
//! configured path carries exactly one JSON-RPC request object; the response
//! body is the dispatcher's output, or empty for notifications.
//!
//! ## Features
//! - Path routing with 404/405 handling and an `Allow` header
//! - Request body size limit (413)
//! - CORS support for browser-based clients
//! - Graceful shutdown that drains in-flight connections
//!
//! ```no_run
//! use switchboard_http::HttpJsonRpcServer;
//!
//! # async fn run() -> switchboard_http::Result<()> {
//! let server = HttpJsonRpcServer::builder()
//!     .bind_address("127.0.0.1:8080".parse().unwrap())
//!     .rpc_path("/rpc")
//!     .build()?;
//! server.run_until(async { tokio::signal::ctrl_c().await.ok(); }).await
//! # }
//! ```

pub mod cors;
pub mod handler;
pub mod prelude;
pub mod server;

#[cfg(test)]
mod tests;

pub use cors::CorsLayer;
pub use handler::JsonRpcHttpHandler;
pub use server::{HttpJsonRpcServer, HttpJsonRpcServerBuilder, ServerConfig};

// Re-export foundational types
pub use switchboard_json_rpc::{JsonRpcDispatcher, MethodHandler, MethodRegistry};

/// Result type for HTTP JSON-RPC operations
pub type Result<T> = std::result::Result<T, HttpJsonRpcError>;

/// HTTP JSON-RPC server errors
#[derive(Debug, thiserror::Error)]
pub enum HttpJsonRpcError {
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] hyper::header::InvalidHeaderValue),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
