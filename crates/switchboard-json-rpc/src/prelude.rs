//! # JSON-RPC Dispatch Prelude
//!
//! Convenient re-exports of the most commonly used types.
//!
//! ```rust
//! use switchboard_json_rpc::prelude::*;
//! ```

pub use crate::context::RequestContext;
pub use crate::dispatch::{DispatchOutcome, JsonRpcDispatcher};
pub use crate::error::{JsonRpcErrorCode, JsonRpcErrorObject, MethodError};
pub use crate::r#async::{MethodHandler, handler_fn};
pub use crate::registry::MethodRegistry;
pub use crate::request::Params;
pub use crate::response::ResultWriter;
pub use crate::types::RequestId;

// Standard error codes
pub use crate::error_codes::*;
