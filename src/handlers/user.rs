use axum::{Json, extract::State};
use serde_json::{Value, json};
use tracing::info;

use crate::api::Access;
use crate::api::supabase::eq;
use crate::error::BlundersError;
use crate::middleware::{ApiJson, CurrentUser};
use crate::router::BlundersState;
use crate::types::profile::{UsernameUpdate, is_valid_chess_username};

/// GET /api/user -> the caller's `profiles` row, verbatim.
pub async fn get_profile(
    State(state): State<BlundersState>,
    caller: CurrentUser,
) -> Result<Json<Value>, BlundersError> {
    let profile = state
        .supabase
        .select_one(
            "profiles",
            &[("select", "*".to_string()), ("id", eq(caller.id()))],
            Access::User(&caller.token),
        )
        .await?
        .ok_or_else(|| BlundersError::not_found("Profile not found"))?;
    Ok(Json(profile))
}

/// PATCH /api/user -> validate the chess.com handle, then store it through the
/// `update_chess_username` procedure.
pub async fn update_username(
    State(state): State<BlundersState>,
    caller: CurrentUser,
    ApiJson(body): ApiJson<UsernameUpdate>,
) -> Result<Json<Value>, BlundersError> {
    let username = body.chess_username.trim();
    if !is_valid_chess_username(username) {
        return Err(BlundersError::bad_request("Invalid username"));
    }
    if !state.chesscom.player_exists(username).await? {
        return Err(BlundersError::bad_request("Chess.com username not found"));
    }

    let updated = state
        .supabase
        .rpc(
            "update_chess_username",
            &json!({ "new_username": username }),
            Access::User(&caller.token),
        )
        .await?;
    info!(user_id = caller.id(), username, "chess username updated");
    Ok(Json(updated))
}
