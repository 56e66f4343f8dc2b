//! HTTP request handler for JSON-RPC
//!
//! A thin adapter: it checks the HTTP framing (path, method, body size), hands
//! the body and declared content type to the dispatcher, and maps the outcome
//! onto a status code.

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::{ALLOW, CONTENT_TYPE, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use switchboard_json_rpc::{DispatchOutcome, JSON_CONTENT_TYPE, JsonRpcDispatcher};

use crate::{CorsLayer, ServerConfig};

/// HTTP handler for JSON-RPC requests
#[derive(Debug, Clone)]
pub struct JsonRpcHttpHandler {
    config: Arc<ServerConfig>,
    dispatcher: Arc<JsonRpcDispatcher>,
    cors: Option<CorsLayer>,
}

impl JsonRpcHttpHandler {
    pub fn new(
        config: Arc<ServerConfig>,
        dispatcher: Arc<JsonRpcDispatcher>,
        cors: Option<CorsLayer>,
    ) -> Self {
        Self {
            config,
            dispatcher,
            cors,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Route and handle one HTTP request.
    pub async fn handle_request<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        debug!("Handling {} {}", req.method(), req.uri().path());

        let mut response = if req.uri().path() != self.config.rpc_path {
            text_response(StatusCode::NOT_FOUND, "Not Found")
        } else {
            match *req.method() {
                Method::POST => self.handle_json_rpc_request(req).await,
                Method::OPTIONS => handle_preflight(),
                _ => method_not_allowed(),
            }
        };

        if let Some(cors) = &self.cors {
            cors.apply_cors_headers(response.headers_mut());
        }
        response
    }

    /// Handle JSON-RPC requests over HTTP POST
    async fn handle_json_rpc_request<B>(&self, req: Request<B>) -> Response<Full<Bytes>>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .map(str::to_owned);

        let body = Limited::new(req.into_body(), self.config.max_body_size);
        let body_bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
                warn!("Request body exceeds {} bytes", self.config.max_body_size);
                return text_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
            }
            Err(err) => {
                error!("Failed to read request body: {}", err);
                return text_response(StatusCode::BAD_REQUEST, "Failed to read request body");
            }
        };

        // Cancelled when this future completes or is dropped by the connection
        let cancellation = CancellationToken::new();
        let _cancel_on_drop = cancellation.clone().drop_guard();

        let outcome = self
            .dispatcher
            .dispatch(content_type.as_deref(), &body_bytes, cancellation)
            .await;

        match outcome {
            DispatchOutcome::Response(bytes) => {
                debug!("Sending JSON-RPC response");
                json_response(StatusCode::OK, Bytes::from(bytes))
            }
            DispatchOutcome::NoResponse => json_response(StatusCode::OK, Bytes::new()),
            DispatchOutcome::EncodeFailure => {
                json_response(StatusCode::INTERNAL_SERVER_ERROR, Bytes::new())
            }
        }
    }
}

fn json_response(status: StatusCode, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    response
}

fn text_response(status: StatusCode, text: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(text.as_bytes())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response
}

/// Handle OPTIONS preflight requests
fn handle_preflight() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static("POST, OPTIONS"));
    response
}

/// Return method not allowed response
fn method_not_allowed() -> Response<Full<Bytes>> {
    let mut response = text_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static("POST, OPTIONS"));
    response
}
