//! Stateless clients for the upstream services.
//!
//! - `supabase.rs`: managed database REST, RPC and auth endpoints
//! - `stripe.rs`: payments provider (customers, checkout, subscriptions, invoices)
//! - `chesscom.rs`: chess platform player lookups
//! - `engine.rs`: hosted analysis engine

pub mod chesscom;
pub mod engine;
pub mod stripe;
pub mod supabase;

pub use chesscom::ChessComClient;
pub use engine::RemoteEngine;
pub use stripe::StripeClient;
pub use supabase::{Access, SupabaseClient};

use crate::config::Config;
use crate::error::BlundersError;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Build the shared upstream HTTP client.
pub fn build_http_client(cfg: &Config) -> Result<reqwest::Client, BlundersError> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("chessblunders-api/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(30));
    if let Some(proxy_url) = cfg.proxy.as_ref() {
        builder = builder.proxy(reqwest::Proxy::all(proxy_url.as_str())?);
    }
    Ok(builder.build()?)
}

/// Turn a non-success response into `BlundersError::Upstream`, otherwise
/// decode the JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(
    service: &'static str,
    resp: reqwest::Response,
) -> Result<T, BlundersError> {
    let resp = ensure_success(service, resp).await?;
    let bytes = resp.bytes().await?;
    // void stored procedures answer 204 with no body
    let bytes: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
    Ok(serde_json::from_slice(bytes)?)
}

pub(crate) async fn ensure_success(
    service: &'static str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, BlundersError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(BlundersError::upstream(service, status, &body))
}
