//! # HTTP JSON-RPC Server Prelude
//!
//! ```rust
//! use switchboard_http::prelude::*;
//! ```

// Core server types
pub use crate::cors::CorsLayer;
pub use crate::handler::JsonRpcHttpHandler;
pub use crate::server::{HttpJsonRpcServer, HttpJsonRpcServerBuilder, ServerConfig};

// Re-export foundational types
pub use switchboard_json_rpc::prelude::*;

// Error types
pub use crate::{HttpJsonRpcError, Result};
