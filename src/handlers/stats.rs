use axum::{Json, extract::State};

use crate::error::BlundersError;
use crate::middleware::auth::RequireAdmin;
use crate::router::BlundersState;
use crate::service::stats::{self, ProductStats};

/// GET /api/stats/chessblunders -> subscriber and revenue figures.
pub async fn product_stats(
    _admin: RequireAdmin,
    State(state): State<BlundersState>,
) -> Result<Json<ProductStats>, BlundersError> {
    let stats = stats::collect(
        &state.stripe,
        &state.supabase,
        &state.price_ids,
        state.price_cents,
        chrono::Utc::now(),
    )
    .await?;
    Ok(Json(stats))
}
