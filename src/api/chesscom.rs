use crate::config::ChessComConfig;
use crate::error::BlundersError;
use backon::{ExponentialBuilder, Retryable};
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use url::Url;

const SERVICE: &str = "chess.com";

/// Player lookups against the chess platform's public API.
#[derive(Clone)]
pub struct ChessComClient {
    http: reqwest::Client,
    base: Url,
    user_agent: Arc<str>,
    retries: usize,
}

impl ChessComClient {
    pub fn new(http: reqwest::Client, cfg: &ChessComConfig) -> Self {
        Self {
            http,
            base: cfg.api_base.clone(),
            user_agent: Arc::from(cfg.user_agent.as_str()),
            retries: cfg.retries,
        }
    }

    fn retry_policy(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(200))
            .with_max_delay(Duration::from_secs(2))
            .with_max_times(self.retries)
            .with_jitter()
    }

    /// Whether a player profile exists. Server errors are retried; a 404 is a
    /// definite "no".
    pub async fn player_exists(&self, username: &str) -> Result<bool, BlundersError> {
        let url = self
            .base
            .join(&format!("pub/player/{}", username.to_ascii_lowercase()))?;

        let resp = (|| async {
            let resp = self
                .http
                .get(url.clone())
                .header(reqwest::header::USER_AGENT, self.user_agent.as_ref())
                .send()
                .await?;
            let status = resp.status();
            if status.is_server_error() {
                let body = resp.text().await.unwrap_or_default();
                return Err(BlundersError::upstream(SERVICE, status, &body));
            }
            Ok(resp)
        })
        .retry(self.retry_policy())
        .when(BlundersError::is_retryable)
        .notify(|err, dur: Duration| {
            warn!("chess.com lookup retrying after error {}, sleeping {:?}", err, dur);
        })
        .await?;

        match resp.status() {
            StatusCode::OK => {
                info!(username, "chess.com username validated");
                Ok(true)
            }
            StatusCode::NOT_FOUND | StatusCode::GONE => Ok(false),
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(BlundersError::upstream(SERVICE, status, &body))
            }
        }
    }
}
