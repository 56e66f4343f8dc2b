//! # JSON-RPC 2.0 Dispatch Core
//!
//! A transport-agnostic JSON-RPC 2.0 server core. It turns request bytes into
//! response bytes (or a suppressed non-response for notifications) and knows
//! nothing about HTTP, sockets or process wiring.
//!
//! ## Features
//! - Closed request id type: string, integer, null or absent
//! - Structured error values with the reserved code taxonomy
//! - Concurrent method registry owned by the host
//! - Notification suppression driven only by a successfully decoded id
//!
//! ```rust
//! use std::sync::Arc;
//! use futures::FutureExt;
//! use serde_json::json;
//! use switchboard_json_rpc::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() {
//! let registry = Arc::new(MethodRegistry::new());
//! registry.register(
//!     "subtract",
//!     handler_fn(|_ctx, params| {
//!         async move {
//!             let [a, b]: [i64; 2] = params.parse()?;
//!             Ok::<_, MethodError>(json!(a - b))
//!         }
//!         .boxed()
//!     }),
//! );
//!
//! let dispatcher = JsonRpcDispatcher::new(registry);
//! let outcome = dispatcher
//!     .process(
//!         br#"{"jsonrpc":"2.0","method":"subtract","params":[42,23],"id":1}"#,
//!         CancellationToken::new(),
//!     )
//!     .await;
//! assert_eq!(outcome.body(), Some(&br#"{"jsonrpc":"2.0","result":19,"id":1}"#[..]));
//! # }
//! ```

pub mod context;
pub mod dispatch;
pub mod error;
pub mod prelude;
pub mod registry;
pub mod request;
pub mod response;
pub mod types;

pub mod r#async;

// Re-export main types
pub use context::RequestContext;
pub use dispatch::{DispatchOutcome, JSON_CONTENT_TYPE, JsonRpcDispatcher};
pub use error::{
    DecodeError, EncodeError, JsonRpcErrorCode, JsonRpcErrorObject, MethodError, ToJsonRpcError,
};
pub use r#async::{FnHandler, MethodHandler, handler_fn};
pub use registry::MethodRegistry;
pub use request::{JsonRpcRequest, Params};
pub use response::{JsonRpcResponse, ResultWriter};
pub use types::{IdError, JsonRpcVersion, RequestId};

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    pub const SERVER_ERROR: i64 = -32000;
}
