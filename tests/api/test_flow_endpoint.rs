// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP endpoint tests driving the router with platform-style requests

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use flow_gateway::{
    api::http_server::{create_app, AppState},
    config::KeyMaterial,
    crypto::SIGNATURE_HEADER,
    flow::ScreenRegistry,
    Dispatcher,
};
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot`

use crate::common::{
    platform_request, raw_platform_request, test_key_pem, PlatformRequest, TEST_SECRET,
};

fn app_with_secret(secret: Option<&str>) -> Router {
    let keys = KeyMaterial::new(test_key_pem(), "", secret.map(str::to_string));
    let dispatcher = Dispatcher::new(&keys, ScreenRegistry::default()).unwrap();
    create_app(AppState::new(dispatcher))
}

fn app() -> Router {
    app_with_secret(Some(TEST_SECRET))
}

fn signed_post(request: &PlatformRequest) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/")
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, request.signature(TEST_SECRET))
        .body(Body::from(request.body()))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_init_returns_encrypted_entry_screen() {
    let request = platform_request(&json!({
        "action": "INIT",
        "version": "3.0",
        "flow_token": "tok-1"
    }));

    let response = app().oneshot(signed_post(&request)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert_eq!(
        request.decrypt_response(&body),
        json!({"screen": "screen_lmaspf", "data": {}})
    );
}

#[tokio::test]
async fn test_ping_returns_encrypted_status() {
    let request = platform_request(&json!({"action": "ping", "version": "3.0"}));

    let response = app().oneshot(signed_post(&request)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert_eq!(
        request.decrypt_response(&body),
        json!({"data": {"status": "active"}})
    );
}

#[tokio::test]
async fn test_success_screen_carries_flow_token() {
    let request = platform_request(&json!({
        "action": "data_exchange",
        "screen": "screen_cnktoz",
        "version": "3.0",
        "flow_token": "tok-42",
        "data": {}
    }));

    let response = app().oneshot(signed_post(&request)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let decrypted: Value = request.decrypt_response(&body_string(response).await);
    assert_eq!(decrypted["screen"], "SUCCESS");
    assert_eq!(
        decrypted["data"]["extension_message_response"]["params"]["flow_token"],
        "tok-42"
    );
}

#[tokio::test]
async fn test_bad_signature_returns_432() {
    let request = platform_request(&json!({"action": "ping"}));

    let http_request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(SIGNATURE_HEADER, "sha256=0000")
        .body(Body::from(request.body()))
        .unwrap();

    let response = app().oneshot(http_request).await.unwrap();
    assert_eq!(response.status().as_u16(), 432);
    assert!(body_string(response).await.is_empty());
}

#[tokio::test]
async fn test_missing_signature_returns_432() {
    let request = platform_request(&json!({"action": "ping"}));

    let http_request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .body(Body::from(request.body()))
        .unwrap();

    let response = app().oneshot(http_request).await.unwrap();
    assert_eq!(response.status().as_u16(), 432);
}

#[tokio::test]
async fn test_undecryptable_envelope_returns_421() {
    let mut request = platform_request(&json!({"action": "ping"}));
    // Flow data from a different request: tag no longer verifies
    request.envelope.encrypted_flow_data = platform_request(&json!({"action": "INIT"}))
        .envelope
        .encrypted_flow_data;

    let response = app().oneshot(signed_post(&request)).await.unwrap();
    assert_eq!(response.status().as_u16(), 421);
    assert!(body_string(response).await.is_empty());
}

#[tokio::test]
async fn test_unknown_screen_returns_500() {
    let request = platform_request(&json!({
        "action": "data_exchange",
        "screen": "screen_unknown",
        "version": "3.0",
        "flow_token": "tok-1",
        "data": {}
    }));

    let response = app().oneshot(signed_post(&request)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_string(response).await.is_empty());
}

#[tokio::test]
async fn test_wrong_payload_shape_returns_500() {
    // Decrypts fine, so the caller must not be told to refresh its key
    for payload in [
        json!({"flow_token": "tok-1", "version": "3.0"}),
        json!({"action": "data_exchange", "screen": 5, "flow_token": "tok-1"}),
        json!({"action": 7, "flow_token": "tok-1"}),
    ] {
        let request = platform_request(&payload);

        let response = app().oneshot(signed_post(&request)).await.unwrap();
        assert_eq!(
            response.status(),
            StatusCode::INTERNAL_SERVER_ERROR,
            "payload {}",
            payload
        );
        assert!(body_string(response).await.is_empty());
    }
}

#[tokio::test]
async fn test_numeric_flow_token_accepted() {
    let request = platform_request(&json!({
        "action": "INIT",
        "version": "3.0",
        "flow_token": 12345
    }));

    let response = app().oneshot(signed_post(&request)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert_eq!(request.decrypt_response(&body)["screen"], "screen_lmaspf");
}

#[tokio::test]
async fn test_non_json_plaintext_returns_421() {
    let request = raw_platform_request(b"not json");

    let response = app().oneshot(signed_post(&request)).await.unwrap();
    assert_eq!(response.status().as_u16(), 421);
}

#[tokio::test]
async fn test_non_json_body_returns_500() {
    let body = b"not json at all".to_vec();
    let http_request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(SIGNATURE_HEADER, crate::common::sign(&body, TEST_SECRET))
        .body(Body::from(body))
        .unwrap();

    let response = app().oneshot(http_request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_unsigned_mode_accepts_missing_signature() {
    let request = platform_request(&json!({"action": "ping"}));

    let http_request = Request::builder()
        .method(Method::POST)
        .uri("/")
        .body(Body::from(request.body()))
        .unwrap();

    let response = app_with_secret(None).oneshot(http_request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_banner() {
    let response = app()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[axum::http::header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/html"));
    assert!(body_string(response)
        .await
        .contains("Refer to documentation for usage"));
}

#[tokio::test]
async fn test_health() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let health: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["version"], flow_gateway::version::VERSION_NUMBER);
}

#[tokio::test]
async fn test_other_methods_rejected() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::PUT)
                .uri("/")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
