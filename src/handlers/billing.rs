use axum::{Json, extract::State};

use crate::error::BlundersError;
use crate::middleware::{ApiJson, CurrentUser};
use crate::router::BlundersState;
use crate::service::billing;
use crate::types::billing::{CheckoutRequest, RedirectUrl, Subscription};

/// POST /api/stripe/checkout -> hosted checkout URL. The body is optional.
pub async fn checkout(
    State(state): State<BlundersState>,
    caller: CurrentUser,
    body: Option<ApiJson<CheckoutRequest>>,
) -> Result<Json<RedirectUrl>, BlundersError> {
    let req = body.map(|ApiJson(b)| b).unwrap_or_default();
    let url = billing::start_checkout(&state, &caller, req.price_id.as_deref()).await?;
    Ok(Json(url))
}

/// POST /api/stripe/cancel -> subscription with `cancel_at_period_end` set.
pub async fn cancel(
    State(state): State<BlundersState>,
    caller: CurrentUser,
) -> Result<Json<Subscription>, BlundersError> {
    Ok(Json(billing::cancel_subscription(&state, &caller).await?))
}

/// POST /api/stripe/update-payment -> hosted payment-method update URL.
pub async fn update_payment(
    State(state): State<BlundersState>,
    caller: CurrentUser,
) -> Result<Json<RedirectUrl>, BlundersError> {
    Ok(Json(billing::payment_update_link(&state, &caller).await?))
}
