use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;
use uuid::Uuid;

use crate::api::Access;
use crate::error::BlundersError;
use crate::middleware::{ApiJson, ApiQuery, RequireAdmin};
use crate::router::BlundersState;

pub const DEFAULT_DAYS: u32 = 30;
pub const MAX_DAYS: u32 = 365;
const MAX_URL_LEN: usize = 2048;

#[derive(Debug, Default, Deserialize)]
pub struct DailyQuery {
    pub days: Option<u32>,
}

pub fn clamp_days(days: Option<u32>) -> u32 {
    days.unwrap_or(DEFAULT_DAYS).clamp(1, MAX_DAYS)
}

/// GET /api/analytics/daily?days=N -> pageview counts per day.
pub async fn daily_pageviews(
    _admin: RequireAdmin,
    State(state): State<BlundersState>,
    ApiQuery(query): ApiQuery<DailyQuery>,
) -> Result<Json<Value>, BlundersError> {
    let days = clamp_days(query.days);
    let rows = state
        .supabase
        .rpc("get_daily_pageviews", &json!({ "days": days }), Access::Service)
        .await?;
    Ok(Json(rows))
}

/// Beacon sent by the front end on each page load. Both ids are generated
/// client side and kept in local storage.
#[derive(Debug, Deserialize)]
pub struct PageviewEvent {
    pub visitor_id: Uuid,
    pub session_id: Uuid,
    pub path: String,
    #[serde(default)]
    pub referrer: Option<String>,
}

impl PageviewEvent {
    fn validate(&self) -> Result<(), BlundersError> {
        if !self.path.starts_with('/') || self.path.len() > MAX_URL_LEN {
            return Err(BlundersError::bad_request("Invalid path"));
        }
        if self.referrer.as_ref().is_some_and(|r| r.len() > MAX_URL_LEN) {
            return Err(BlundersError::bad_request("Invalid referrer"));
        }
        Ok(())
    }
}

/// POST /api/analytics/pageview -> 204 once recorded.
pub async fn track_pageview(
    State(state): State<BlundersState>,
    ApiJson(event): ApiJson<PageviewEvent>,
) -> Result<StatusCode, BlundersError> {
    if state.pageview_limiter.check().is_err() {
        return Err(BlundersError::RateLimited);
    }
    event.validate()?;
    debug!(path = %event.path, "pageview");
    state
        .supabase
        .insert(
            "pageviews",
            &json!({
                "visitor_id": event.visitor_id,
                "session_id": event.session_id,
                "path": event.path,
                "referrer": event.referrer,
            }),
            Access::Service,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
