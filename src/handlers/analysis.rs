use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde_json::{Value, json};
use tracing::info;

use crate::api::Access;
use crate::api::supabase::eq;
use crate::error::BlundersError;
use crate::middleware::{ApiJson, ApiQuery, CurrentUser};
use crate::router::BlundersState;
use crate::types::analysis::{
    AnalysisListQuery, CreateAnalysis, EvaluateMove, MoveEvaluation, SearchLimits,
};

const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 200;

/// GET /api/analysis -> the caller's analyses, newest first.
pub async fn list_analyses(
    State(state): State<BlundersState>,
    caller: CurrentUser,
    ApiQuery(query): ApiQuery<AnalysisListQuery>,
) -> Result<Json<Value>, BlundersError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let mut filters = vec![
        ("select", "*".to_string()),
        ("user_id", eq(caller.id())),
        ("order", "created_at.desc".to_string()),
        ("limit", limit.to_string()),
    ];
    if let Some(game_id) = query.game_id.as_deref() {
        filters.push(("game_id", eq(game_id)));
    }
    let rows = state
        .supabase
        .select("analysis", &filters, Access::User(&caller.token))
        .await?;
    Ok(Json(rows))
}

/// POST /api/analysis -> analyse a position from one of the caller's games
/// and store the result.
pub async fn create_analysis(
    State(state): State<BlundersState>,
    caller: CurrentUser,
    ApiJson(body): ApiJson<CreateAnalysis>,
) -> Result<(StatusCode, Json<Value>), BlundersError> {
    let access = Access::User(&caller.token);
    state
        .supabase
        .select_one(
            "games",
            &[
                ("select", "id".to_string()),
                ("id", eq(&body.game_id)),
                ("user_id", eq(caller.id())),
            ],
            access,
        )
        .await?
        .ok_or_else(|| BlundersError::not_found("Game not found"))?;

    let limits = SearchLimits::clamped(body.depth, body.multipv, state.default_depth);
    let result = state.analyzer.analyze(body.fen.as_deref(), limits).await?;
    info!(
        user_id = caller.id(),
        game_id = %body.game_id,
        analyzer = state.analyzer.name(),
        lines = result.lines.len(),
        "analysis computed"
    );

    let row = state
        .supabase
        .insert(
            "analysis",
            &json!({
                "user_id": caller.id(),
                "game_id": body.game_id,
                "fen": body.fen,
                "result": result,
            }),
            access,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// POST /api/analysis/evaluate -> how much one move changed the evaluation.
pub async fn evaluate_move(
    State(state): State<BlundersState>,
    caller: CurrentUser,
    ApiJson(body): ApiJson<EvaluateMove>,
) -> Result<Json<MoveEvaluation>, BlundersError> {
    let limits = SearchLimits::clamped(body.depth, Some(1), state.default_depth);
    let eval = state.analyzer.evaluate(&body, limits).await?;
    info!(
        user_id = caller.id(),
        uci_move = %eval.move_uci,
        legal = eval.is_legal,
        drop_cp = ?eval.eval_drop_cp,
        "move evaluated"
    );
    Ok(Json(eval))
}
