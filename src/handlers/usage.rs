use axum::{
    Json,
    extract::State,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::Access;
use crate::error::BlundersError;
use crate::handlers::analytics::clamp_days;
use crate::middleware::{ApiPath, ApiQuery, RequireAdmin};
use crate::router::BlundersState;

#[derive(Debug, Default, Deserialize)]
pub struct UsageQuery {
    pub days: Option<u32>,
}

/// Stored procedure backing each `/api/usage/{metric}`.
fn usage_procedure(metric: &str) -> Option<&'static str> {
    match metric {
        "summary" => Some("get_usage_summary"),
        "daily" => Some("get_daily_usage"),
        "users" => Some("get_user_stats"),
        _ => None,
    }
}

/// GET /api/usage/{metric} -> aggregate from the database, verbatim.
pub async fn usage_metric(
    _admin: RequireAdmin,
    State(state): State<BlundersState>,
    ApiPath(metric): ApiPath<String>,
    ApiQuery(query): ApiQuery<UsageQuery>,
) -> Result<Json<Value>, BlundersError> {
    let function = usage_procedure(&metric)
        .ok_or_else(|| BlundersError::not_found(format!("Unknown usage metric: {metric}")))?;
    let args = if metric == "daily" {
        json!({ "days": clamp_days(query.days) })
    } else {
        json!({})
    };
    let result = state.supabase.rpc(function, &args, Access::Service).await?;
    Ok(Json(result))
}
