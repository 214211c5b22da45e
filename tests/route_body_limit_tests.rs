mod common;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use common::*;
use httpmock::prelude::*;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn pageview_route_returns_413_for_oversized_body() {
    let server = MockServer::start_async().await;
    let insert = server
        .mock_async(|when, then| {
            when.method(POST).path("/rest/v1/pageviews");
            then.status(201);
        })
        .await;
    let app = app(&test_config(&server));

    let oversized_path = "a".repeat(128 * 1024);
    let oversized_payload = format!(
        r#"{{"visitor_id":"6f1c9a52-5b0e-4d8e-9f6a-2a1b3c4d5e6f","session_id":"0b7e7f0e-8d6c-4a9b-8c1d-9e8f7a6b5c4d","path":"/{oversized_path}"}}"#
    );

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/analytics/pageview")
                .header("content-type", "application/json")
                .body(Body::from(oversized_payload))
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let body_str = std::str::from_utf8(&body).expect("response body was not utf-8");
    assert!(body_str.contains(r#""code":"PAYLOAD_TOO_LARGE""#));
    assert!(body_str.contains(r#""message":"Request body too large""#));
    assert_eq!(insert.hits_async().await, 0);
}

#[tokio::test]
async fn health_is_open() {
    let server = MockServer::start_async().await;
    let app = app(&test_config(&server));

    let (status, body) = send(&app, get("/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn mistyped_json_body_is_400_in_error_envelope() {
    let server = MockServer::start_async().await;
    let token = user_token();
    let _auth = mock_auth_user(&server, &token).await;
    let lookup = server
        .mock_async(|when, then| {
            when.method(GET).path_contains("/pub/player/");
            then.status(200);
        })
        .await;
    let app = app(&test_config(&server));

    let req = json_request("PATCH", "/api/user", Some(&token), json!({ "chess_username": 5 }));
    let (status, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(!error_message(&body).is_empty());
    assert_eq!(lookup.hits_async().await, 0);
}

#[tokio::test]
async fn mistyped_query_is_400_in_error_envelope() {
    let server = MockServer::start_async().await;
    let app = app(&test_config(&server));

    let (status, body) = send(&app, get("/api/feedback?limit=lots", None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn unknown_routes_and_methods_use_error_envelope() {
    let server = MockServer::start_async().await;
    let app = app(&test_config(&server));

    let (status, body) = send(&app, get("/api/nowhere", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, body) = send(&app, empty_post("/health", None)).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["error"]["code"], "METHOD_NOT_ALLOWED");
}
