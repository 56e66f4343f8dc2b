//! Per-request execution context handed to method handlers.

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::types::RequestId;

/// Immutable correlation data for one request plus the caller's cancellation
/// signal.
///
/// Cloning is cheap; clones share the same cancellation token.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    method: String,
    cancellation: CancellationToken,
}

impl RequestContext {
    pub fn new(
        request_id: RequestId,
        method: impl Into<String>,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            request_id,
            method: method.into(),
            cancellation,
        }
    }

    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Textual form of the request id, empty for notifications.
    pub fn request_id_text(&self) -> String {
        self.request_id.to_string()
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Resolves once the caller gives up on the request.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancellation.cancelled()
    }
}
