use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use axum_extra::extract::cookie::CookieJar;
use base64::Engine;
use headers::authorization::Bearer;
use headers::{Authorization, HeaderMapExt};
use serde::Deserialize;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::error::BlundersError;
use crate::router::BlundersState;
use crate::types::profile::AuthUser;

/// Cookie the front end stores the session access token in.
pub const SESSION_COOKIE: &str = "sb-access-token";
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// The authenticated caller plus the token to forward to the database so
/// row-level security applies.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: AuthUser,
    pub token: String,
}

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.user.id
    }
}

impl FromRequestParts<BlundersState> for CurrentUser {
    type Rejection = BlundersError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &BlundersState,
    ) -> Result<Self, Self::Rejection> {
        let token = access_token(&parts.headers).ok_or(BlundersError::Unauthorized)?;
        if !token_is_live(&token, chrono::Utc::now().timestamp()) {
            debug!("rejecting malformed or expired access token");
            return Err(BlundersError::Unauthorized);
        }
        let user = state.supabase.get_user(&token).await?;
        Ok(Self { user, token })
    }
}

/// Bearer header first, then the session cookie.
fn access_token(headers: &HeaderMap) -> Option<String> {
    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// Cheap local check before the auth round trip: three JWT segments, a JSON
/// payload, and an `exp` (when present) in the future. The signature is left to
/// the auth service.
fn token_is_live(token: &str, now: i64) -> bool {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_sig), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return false;
    };
    let Ok(decoded) = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
    else {
        return false;
    };
    let Ok(claims) = serde_json::from_slice::<Claims>(&decoded) else {
        return false;
    };
    claims.exp.is_none_or(|exp| exp > now)
}

/// Guard for operator-only endpoints.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

impl FromRequestParts<BlundersState> for RequireAdmin {
    type Rejection = BlundersError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &BlundersState,
    ) -> Result<Self, Self::Rejection> {
        ensure_admin(&parts.headers, &state.admin_key)?;
        Ok(Self)
    }
}

pub fn ensure_admin(headers: &HeaderMap, expected: &str) -> Result<(), BlundersError> {
    if expected.is_empty() {
        return Err(BlundersError::Unauthorized);
    }

    let presented = headers
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| {
            headers
                .typed_get::<Authorization<Bearer>>()
                .map(|Authorization(bearer)| bearer.token().to_string())
        });

    match presented {
        Some(key) if bool::from(key.as_bytes().ct_eq(expected.as_bytes())) => Ok(()),
        _ => Err(BlundersError::Unauthorized),
    }
}
