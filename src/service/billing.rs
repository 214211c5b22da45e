use crate::api::Access;
use crate::api::supabase::eq;
use crate::error::BlundersError;
use crate::middleware::auth::CurrentUser;
use crate::router::BlundersState;
use crate::types::billing::{RedirectUrl, Subscription};
use crate::types::profile::BillingProfile;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tracing::{info, warn};

const PROFILES: &str = "profiles";

async fn billing_profile(
    state: &BlundersState,
    caller: &CurrentUser,
) -> Result<BillingProfile, BlundersError> {
    let row = state
        .supabase
        .select_one(
            PROFILES,
            &[
                ("select", "stripe_customer_id,stripe_subscription_id".to_string()),
                ("id", eq(caller.id())),
            ],
            Access::User(&caller.token),
        )
        .await?
        .ok_or_else(|| BlundersError::not_found("Profile not found"))?;
    Ok(serde_json::from_value(row)?)
}

/// Reuse the profile's billing customer or create one and remember it.
async fn ensure_customer(
    state: &BlundersState,
    caller: &CurrentUser,
    profile: &BillingProfile,
) -> Result<String, BlundersError> {
    if let Some(id) = profile.stripe_customer_id.as_deref().filter(|s| !s.is_empty()) {
        return Ok(id.to_string());
    }
    let customer = state
        .stripe
        .create_customer(caller.user.email.as_deref(), caller.id())
        .await?;
    let linked = state
        .supabase
        .update(
            PROFILES,
            &[("id", eq(caller.id()))],
            &json!({ "stripe_customer_id": customer.id }),
            Access::Service,
        )
        .await?;
    if !links_any_row(&linked) {
        warn!(
            user_id = caller.id(),
            customer = %customer.id,
            "no profile row updated; billing customer left unlinked"
        );
    }
    Ok(customer.id)
}

/// `return=representation` answers with the rows it touched.
fn links_any_row(updated: &Value) -> bool {
    updated.as_array().is_some_and(|rows| !rows.is_empty())
}

fn site_link(state: &BlundersState, path: &str) -> Result<String, BlundersError> {
    Ok(state.site_url.join(path)?.to_string())
}

/// Pick the requested price, defaulting to the first configured one.
fn resolve_price<'a>(
    price_ids: &'a [String],
    requested: Option<&str>,
) -> Result<&'a str, BlundersError> {
    match requested {
        Some(req) => price_ids
            .iter()
            .find(|id| id.as_str() == req)
            .map(String::as_str)
            .ok_or_else(|| BlundersError::bad_request("Unknown price")),
        None => price_ids
            .first()
            .map(String::as_str)
            .ok_or_else(|| BlundersError::bad_request("No subscription price configured")),
    }
}

pub async fn start_checkout(
    state: &BlundersState,
    caller: &CurrentUser,
    requested_price: Option<&str>,
) -> Result<RedirectUrl, BlundersError> {
    let price = resolve_price(&state.price_ids, requested_price)?;
    let profile = billing_profile(state, caller).await?;
    let customer = ensure_customer(state, caller, &profile).await?;
    let session = state
        .stripe
        .create_checkout_session(
            &customer,
            price,
            caller.id(),
            &site_link(state, "account?checkout=success")?,
            &site_link(state, "pricing?checkout=canceled")?,
        )
        .await?;
    info!(user_id = caller.id(), session = %session.id, "checkout session created");
    let url = session
        .url
        .ok_or_else(|| BlundersError::Upstream {
            service: "payments",
            status: StatusCode::BAD_GATEWAY,
            message: "Checkout session has no URL".to_string(),
        })?;
    Ok(RedirectUrl { url })
}

pub async fn cancel_subscription(
    state: &BlundersState,
    caller: &CurrentUser,
) -> Result<Subscription, BlundersError> {
    let profile = billing_profile(state, caller).await?;
    let sub_id = profile
        .stripe_subscription_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| BlundersError::bad_request("No active subscription"))?;
    let sub = state.stripe.cancel_at_period_end(&sub_id).await?;
    info!(user_id = caller.id(), subscription = %sub.id, "subscription set to cancel at period end");
    Ok(sub)
}

pub async fn payment_update_link(
    state: &BlundersState,
    caller: &CurrentUser,
) -> Result<RedirectUrl, BlundersError> {
    let profile = billing_profile(state, caller).await?;
    let customer = profile
        .stripe_customer_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| BlundersError::bad_request("No billing account"))?;
    let session = state
        .stripe
        .create_payment_update_session(&customer, &site_link(state, "account")?)
        .await?;
    Ok(RedirectUrl { url: session.url })
}
