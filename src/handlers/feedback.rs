use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::api::Access;
use crate::error::BlundersError;
use crate::middleware::{ApiJson, ApiQuery, CurrentUser};
use crate::router::BlundersState;

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 200;
const MAX_MESSAGE_CHARS: usize = 5000;
const MAX_NAME_CHARS: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct FeedbackQuery {
    pub limit: Option<u32>,
}

/// GET /api/feedback -> newest feedback, name column only.
pub async fn list_feedback(
    State(state): State<BlundersState>,
    ApiQuery(query): ApiQuery<FeedbackQuery>,
) -> Result<Json<Value>, BlundersError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let rows = state
        .supabase
        .select(
            "feedback",
            &[
                ("select", "name".to_string()),
                ("order", "created_at.desc".to_string()),
                ("limit", limit.to_string()),
            ],
            Access::Service,
        )
        .await?;
    Ok(Json(rows))
}

#[derive(Debug, Deserialize)]
pub struct NewFeedback {
    #[serde(default)]
    pub name: Option<String>,
    pub message: String,
}

/// POST /api/feedback -> 201 with the stored row.
pub async fn submit_feedback(
    State(state): State<BlundersState>,
    caller: CurrentUser,
    ApiJson(body): ApiJson<NewFeedback>,
) -> Result<(StatusCode, Json<Value>), BlundersError> {
    let message = body.message.trim();
    if message.is_empty() || message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(BlundersError::bad_request("Message must be 1-5000 characters"));
    }
    let name = body
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    if name.is_some_and(|n| n.chars().count() > MAX_NAME_CHARS) {
        return Err(BlundersError::bad_request("Name is too long"));
    }

    let row = state
        .supabase
        .insert(
            "feedback",
            &json!({ "user_id": caller.id(), "name": name, "message": message }),
            Access::User(&caller.token),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}
