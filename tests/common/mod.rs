#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use base64::Engine;
use chessblunders_api::{BlundersState, Config, blunders_router};
use httpmock::prelude::*;
use serde_json::{Value, json};
use tower::ServiceExt;
use url::Url;

pub const ADMIN_KEY: &str = "admin-secret";
pub const USER_ID: &str = "11111111-2222-3333-4444-555555555555";
pub const USER_EMAIL: &str = "player@example.com";

/// Config with every upstream pointed at one mock server.
pub fn test_config(server: &MockServer) -> Config {
    let base = Url::parse(&server.base_url()).expect("mock server url");
    let mut cfg = Config::default();
    cfg.admin_key = ADMIN_KEY.to_string();
    cfg.site_url = Url::parse("https://app.test").expect("site url");
    cfg.supabase.url = base.clone();
    cfg.supabase.anon_key = "anon-key".to_string();
    cfg.supabase.service_role_key = "service-key".to_string();
    cfg.stripe.api_base = base.clone();
    cfg.stripe.secret_key = "sk_test_123".to_string();
    cfg.stripe.price_ids = vec!["price_month".to_string(), "price_year".to_string()];
    cfg.chesscom.api_base = base;
    cfg.chesscom.retries = 0;
    cfg
}

pub fn app(cfg: &Config) -> Router {
    let state = BlundersState::new(cfg).expect("failed to build state");
    blunders_router(state)
}

/// Unsigned JWT with the given expiry; the auth service mock does the real
/// validation.
pub fn token_expiring_at(exp: i64) -> String {
    let enc = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let header = enc.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = enc.encode(json!({ "sub": USER_ID, "exp": exp }).to_string());
    format!("{header}.{payload}.signature")
}

pub fn user_token() -> String {
    token_expiring_at(chrono::Utc::now().timestamp() + 3600)
}

/// Auth service accepts `token` as `USER_ID`.
pub async fn mock_auth_user<'a>(server: &'a MockServer, token: &str) -> httpmock::Mock<'a> {
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/auth/v1/user")
                .header("authorization", format!("Bearer {token}"));
            then.status(200)
                .json_body(json!({ "id": USER_ID, "email": USER_EMAIL, "aud": "authenticated" }));
        })
        .await
}

pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.expect("request failed");
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("response body was not json")
    };
    (status, value)
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("failed to build request")
}

pub fn admin_get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("x-admin-key", ADMIN_KEY)
        .body(Body::empty())
        .expect("failed to build request")
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

pub fn empty_post(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("failed to build request")
}

pub fn error_message(body: &Value) -> &str {
    body["error"]["message"].as_str().unwrap_or_default()
}
