use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error as ThisError;
use tracing::{error, warn};

#[derive(Debug, ThisError)]
pub enum BlundersError {
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Too many requests")]
    RateLimited,

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{service} error ({status}): {message}")]
    Upstream {
        service: &'static str,
        status: StatusCode,
        message: String,
    },

    #[error("Engine error: {0}")]
    Engine(String),
}

impl BlundersError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Transient failures worth another attempt: upstream 5xx, timeouts and
    /// refused connections.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Upstream { status, .. } => status.is_server_error(),
            Self::Reqwest(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Build an upstream error from a non-success response body.
    pub fn upstream(service: &'static str, status: StatusCode, body: &str) -> Self {
        Self::Upstream {
            service,
            status,
            message: upstream_message(status, body),
        }
    }
}

/// Pull a human-readable message out of an upstream error body.
///
/// PostgREST uses `message`, the auth service `msg`/`error_description`, the
/// payments provider nests it under `error.message`.
pub fn upstream_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let candidates = [
            value.get("message"),
            value.get("msg"),
            value.get("error_description"),
            value.get("error").and_then(|e| e.get("message")),
            value.get("error"),
        ];
        if let Some(msg) = candidates
            .into_iter()
            .flatten()
            .find_map(|v| v.as_str().filter(|s| !s.is_empty()))
        {
            return msg.to_string();
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("Upstream request failed")
        .to_string()
}

impl IntoResponse for BlundersError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            BlundersError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody::new("UNAUTHORIZED", "Unauthorized"),
            ),
            BlundersError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiErrorBody::new("BAD_REQUEST", msg))
            }
            BlundersError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ApiErrorBody::new("NOT_FOUND", msg))
            }
            BlundersError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                ApiErrorBody::new("RATE_LIMIT", "Too many requests."),
            ),
            BlundersError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ApiErrorBody::new("PAYLOAD_TOO_LARGE", "Request body too large"),
            ),
            BlundersError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                ApiErrorBody::new("METHOD_NOT_ALLOWED", "Method not allowed"),
            ),
            BlundersError::Upstream {
                service,
                status,
                message,
            } => {
                warn!(service, upstream_status = %status, message = %message, "upstream call failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorBody::new("UPSTREAM_ERROR", message),
                )
            }
            BlundersError::Engine(msg) => {
                error!(error = %msg, "analysis engine failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorBody::new("ENGINE_ERROR", msg),
                )
            }
            e @ (BlundersError::Reqwest(_)
            | BlundersError::UrlParse(_)
            | BlundersError::Json(_)
            | BlundersError::Io(_)) => {
                error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorBody::new("INTERNAL_ERROR", "An internal server error occurred."),
                )
            }
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiErrorBody {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
