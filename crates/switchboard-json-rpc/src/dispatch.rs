//! The request lifecycle: precondition, decode, validate, resolve, invoke,
//! emit.
//!
//! Only a request whose id decoded successfully can be classified as a
//! notification. Anything that goes wrong before or while the id is decoded is
//! always answered with a body.

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, warn};

use crate::{
    context::RequestContext,
    error::{JsonRpcErrorObject, ToJsonRpcError},
    registry::MethodRegistry,
    request::JsonRpcRequest,
    response::{JsonRpcResponse, ResultWriter},
    types::RequestId,
};

/// Content type every request must declare and every response carries.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// What the transport should send back for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A serialized response envelope.
    Response(Vec<u8>),
    /// Notification: report generic success with an empty body.
    NoResponse,
    /// Even the error response could not be serialized.
    EncodeFailure,
}

impl DispatchOutcome {
    pub fn body(&self) -> Option<&[u8]> {
        match self {
            DispatchOutcome::Response(bytes) => Some(bytes),
            DispatchOutcome::NoResponse | DispatchOutcome::EncodeFailure => None,
        }
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, DispatchOutcome::NoResponse)
    }

    pub fn into_body(self) -> Option<Vec<u8>> {
        match self {
            DispatchOutcome::Response(bytes) => Some(bytes),
            DispatchOutcome::NoResponse | DispatchOutcome::EncodeFailure => None,
        }
    }
}

/// Transport-independent JSON-RPC dispatcher.
///
/// The registry is owned by the host and shared with the dispatcher; methods
/// may be registered or removed while requests are in flight.
#[derive(Debug, Clone)]
pub struct JsonRpcDispatcher {
    registry: Arc<MethodRegistry>,
}

impl JsonRpcDispatcher {
    pub fn new(registry: Arc<MethodRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<MethodRegistry> {
        &self.registry
    }

    /// Process a request whose content type is already known to be JSON.
    pub async fn process(&self, body: &[u8], cancellation: CancellationToken) -> DispatchOutcome {
        self.dispatch(Some(JSON_CONTENT_TYPE), body, cancellation).await
    }

    /// Process one request end to end.
    ///
    /// `content_type` is what the transport declared for `body`;
    /// `cancellation` is handed to the handler through its [`RequestContext`].
    pub async fn dispatch(
        &self,
        content_type: Option<&str>,
        body: &[u8],
        cancellation: CancellationToken,
    ) -> DispatchOutcome {
        if !is_json_content_type(content_type) {
            warn!("Invalid content type: {}", content_type.unwrap_or(""));
            let error = JsonRpcErrorObject::parse_error(Some(Value::String(format!(
                "Content-Type must be {}",
                JSON_CONTENT_TYPE
            ))));
            return emit_error(RequestId::Null, error, false);
        }

        let request = match JsonRpcRequest::decode(body) {
            Ok(request) => request,
            Err(err) => {
                debug!("Failed to decode JSON-RPC request: {}", err);
                return emit_error(err.response_id(), err.to_error_object(), false);
            }
        };

        let suppress = request.is_notification();

        if let Err(error) = request.validate() {
            debug!(id = %request.id, "Invalid JSON-RPC request: {}", error_detail(&error));
            return emit_error(request.id, error, suppress);
        }

        let Some(handler) = self.registry.lookup(&request.method) else {
            debug!(id = %request.id, method = %request.method, "Method not found");
            return emit_error(request.id, JsonRpcErrorObject::method_not_found(None), suppress);
        };

        let ctx = RequestContext::new(request.id.clone(), request.method.clone(), cancellation);
        let span = tracing::debug_span!("rpc_call", method = %request.method, id = %request.id);
        let mut result = ResultWriter::new();

        if let Err(fault) = handler
            .handle(&ctx, &request.params, &mut result)
            .instrument(span)
            .await
        {
            debug!(id = %request.id, method = %request.method, "Handler failed: {}", fault);
            return emit_error(request.id, fault.to_error_object(), suppress);
        }

        if suppress {
            debug!(method = %request.method, "Notification handled");
            return DispatchOutcome::NoResponse;
        }

        let encoded = JsonRpcResponse::from_writer(request.id.clone(), result)
            .and_then(|response| response.encode());
        match encoded {
            Ok(bytes) => DispatchOutcome::Response(bytes),
            Err(err) => {
                error!(
                    id = %request.id,
                    method = %request.method,
                    "Failed to encode result: {}",
                    err
                );
                emit_error(request.id, err.to_error_object(), false)
            }
        }
    }
}

fn is_json_content_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| {
        ct.trim_start()
            .to_ascii_lowercase()
            .starts_with(JSON_CONTENT_TYPE)
    })
}

fn error_detail(error: &JsonRpcErrorObject) -> String {
    match &error.data {
        Some(Value::String(detail)) => detail.clone(),
        Some(other) => other.to_string(),
        None => error.message.clone(),
    }
}

fn emit_error(id: RequestId, error: JsonRpcErrorObject, suppress: bool) -> DispatchOutcome {
    if suppress {
        return DispatchOutcome::NoResponse;
    }
    match JsonRpcResponse::error(id, error).encode() {
        Ok(bytes) => DispatchOutcome::Response(bytes),
        Err(err) => {
            error!("Failed to encode error response: {}", err);
            DispatchOutcome::EncodeFailure
        }
    }
}
