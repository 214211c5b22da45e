use crate::api::{self, ChessComClient, StripeClient, SupabaseClient};
use crate::config::Config;
use crate::error::BlundersError;
use crate::handlers::{analysis, analytics, billing, feedback, stats, usage, user};
use crate::service::analyzer::Analyzer;
use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde_json::{Value, json};
use std::num::NonZeroU32;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use url::Url;

const BODY_LIMIT: usize = 64 * 1024;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct BlundersState {
    pub supabase: SupabaseClient,
    pub stripe: StripeClient,
    pub chesscom: ChessComClient,
    pub analyzer: Arc<Analyzer>,
    pub pageview_limiter: Arc<DefaultDirectRateLimiter>,
    pub admin_key: Arc<str>,
    pub site_url: Url,
    pub price_ids: Arc<[String]>,
    pub price_cents: i64,
    pub default_depth: u32,
}

impl BlundersState {
    pub fn new(cfg: &Config) -> Result<Self, BlundersError> {
        let http = api::build_http_client(cfg)?;
        let per_minute = NonZeroU32::new(cfg.pageview_rate_per_minute).unwrap_or(NonZeroU32::MIN);
        Ok(Self {
            supabase: SupabaseClient::new(http.clone(), &cfg.supabase)?,
            stripe: StripeClient::new(http.clone(), &cfg.stripe)?,
            chesscom: ChessComClient::new(http.clone(), &cfg.chesscom),
            analyzer: Arc::new(Analyzer::from_config(&cfg.analysis, http)?),
            pageview_limiter: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
            admin_key: Arc::from(cfg.admin_key.as_str()),
            site_url: cfg.site_url.clone(),
            price_ids: cfg.stripe.price_ids.clone().into(),
            price_cents: cfg.stripe.price_cents,
            default_depth: cfg.analysis.default_depth,
        })
    }
}

pub fn blunders_router(state: BlundersState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/analytics/daily", get(analytics::daily_pageviews))
        .route("/api/analytics/pageview", post(analytics::track_pageview))
        .route(
            "/api/feedback",
            get(feedback::list_feedback).post(feedback::submit_feedback),
        )
        .route("/api/stats/chessblunders", get(stats::product_stats))
        .route("/api/usage/{metric}", get(usage::usage_metric))
        .route(
            "/api/analysis",
            get(analysis::list_analyses).post(analysis::create_analysis),
        )
        .route("/api/analysis/evaluate", post(analysis::evaluate_move))
        .route("/api/stripe/checkout", post(billing::checkout))
        .route("/api/stripe/cancel", post(billing::cancel))
        .route("/api/stripe/update-payment", post(billing::update_payment))
        .route("/api/user", get(user::get_profile).patch(user::update_username))
        .fallback(unknown_route)
        .method_not_allowed_fallback(wrong_method)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn unknown_route() -> BlundersError {
    BlundersError::not_found("Not found")
}

async fn wrong_method() -> BlundersError {
    BlundersError::MethodNotAllowed
}
