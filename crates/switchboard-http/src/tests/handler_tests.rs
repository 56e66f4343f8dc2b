//! Handler-level tests driven with in-memory request bodies

use bytes::Bytes;
use futures::FutureExt;
use http_body_util::{BodyExt, Full};
use hyper::header::{ACCESS_CONTROL_ALLOW_ORIGIN, ALLOW, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode};
use serde_json::{Value, json};

use crate::server::{HttpJsonRpcServer, HttpJsonRpcServerBuilder};
use crate::JsonRpcHttpHandler;
use switchboard_json_rpc::{MethodError, handler_fn};

fn calculator() -> HttpJsonRpcServerBuilder {
    HttpJsonRpcServer::builder().register_method(
        "subtract",
        handler_fn(|_ctx, params| {
            async move {
                let [a, b]: [i64; 2] = params.parse()?;
                Ok::<_, MethodError>(json!(a - b))
            }
            .boxed()
        }),
    )
}

fn handler_from(builder: HttpJsonRpcServerBuilder) -> JsonRpcHttpHandler {
    builder.build().unwrap().handler().clone()
}

fn post(path: &str, content_type: Option<&str>, body: &str) -> Request<Full<Bytes>> {
    let mut builder = Request::builder().method(Method::POST).uri(path);
    if let Some(content_type) = content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }
    builder
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

async fn body_bytes(response: Response<Full<Bytes>>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

#[tokio::test]
async fn test_post_call_returns_result() {
    let handler = handler_from(calculator());
    let response = handler
        .handle_request(post(
            "/rpc",
            Some("application/json"),
            r#"{"jsonrpc":"2.0","method":"subtract","params":[42,23],"id":1}"#,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(
        body_bytes(response).await,
        Bytes::from_static(br#"{"jsonrpc":"2.0","result":19,"id":1}"#)
    );
}

#[tokio::test]
async fn test_notification_gets_empty_body() {
    let handler = handler_from(calculator());
    let response = handler
        .handle_request(post(
            "/rpc",
            Some("application/json"),
            r#"{"jsonrpc":"2.0","method":"subtract","params":[1,2]}"#,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_wrong_content_type_is_parse_error() {
    let handler = handler_from(calculator());
    let response = handler
        .handle_request(post(
            "/rpc",
            Some("text/plain"),
            r#"{"jsonrpc":"2.0","method":"subtract","params":[1,2],"id":1}"#,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"]["code"], -32700);
    assert_eq!(body["id"], Value::Null);
}

#[tokio::test]
async fn test_missing_content_type_is_parse_error() {
    let handler = handler_from(calculator());
    let response = handler
        .handle_request(post(
            "/rpc",
            None,
            r#"{"jsonrpc":"2.0","method":"subtract","params":[1,2],"id":1}"#,
        ))
        .await;

    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["error"]["code"], -32700);
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let handler = handler_from(calculator());
    let response = handler
        .handle_request(post("/other", Some("application/json"), "{}"))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_is_method_not_allowed() {
    let handler = handler_from(calculator());
    let request = Request::builder()
        .method(Method::GET)
        .uri("/rpc")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let response = handler.handle_request(request).await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers().get(ALLOW).unwrap(), "POST, OPTIONS");
}

#[tokio::test]
async fn test_options_preflight() {
    let handler = handler_from(calculator());
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/rpc")
        .body(Full::new(Bytes::new()))
        .unwrap();
    let response = handler.handle_request(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(ALLOW).unwrap(), "POST, OPTIONS");
    assert_eq!(
        response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let handler = handler_from(calculator().max_body_size(16));
    let response = handler
        .handle_request(post(
            "/rpc",
            Some("application/json"),
            r#"{"jsonrpc":"2.0","method":"subtract","params":[1,2],"id":1}"#,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_cors_disabled_and_custom_origin() {
    let handler = handler_from(calculator().cors(false));
    let response = handler
        .handle_request(post("/rpc", Some("application/json"), "{}"))
        .await;
    assert!(!response.headers().contains_key(ACCESS_CONTROL_ALLOW_ORIGIN));

    let handler = handler_from(calculator().cors_origin("https://app.example"));
    let response = handler
        .handle_request(post("/rpc", Some("application/json"), "{}"))
        .await;
    assert_eq!(
        response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "https://app.example"
    );
}

#[tokio::test]
async fn test_custom_rpc_path() {
    let handler = handler_from(calculator().rpc_path("/api/v1"));
    let response = handler
        .handle_request(post(
            "/api/v1",
            Some("application/json"),
            r#"{"jsonrpc":"2.0","method":"subtract","params":[5,2],"id":"a"}"#,
        ))
        .await;

    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body, json!({"jsonrpc": "2.0", "result": 3, "id": "a"}));
}

#[test]
fn test_build_rejects_bad_config() {
    assert!(HttpJsonRpcServer::builder().rpc_path("rpc").build().is_err());
    assert!(
        HttpJsonRpcServer::builder()
            .cors_origin("bad\norigin")
            .build()
            .is_err()
    );
}
