use super::read_json;
use crate::error::BlundersError;
use crate::types::analysis::{AnalysisResult, MoveEvaluation, SearchLimits};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

const SERVICE: &str = "engine";

/// Hosted engine. `analyze_url` answers `{fen, depth, multipv}` with
/// `{lines, bestmove}`; its sibling `evaluate` answers `{fen, move, depth}`
/// with a move evaluation.
#[derive(Clone)]
pub struct RemoteEngine {
    http: reqwest::Client,
    analyze_url: Url,
    evaluate_url: Url,
    timeout: Duration,
}

#[derive(Serialize)]
struct EngineRequest<'a> {
    fen: &'a str,
    depth: u32,
    multipv: u32,
}

#[derive(Serialize)]
struct EvaluateRequest<'a> {
    fen: &'a str,
    #[serde(rename = "move")]
    uci_move: &'a str,
    depth: u32,
}

impl RemoteEngine {
    pub fn new(http: reqwest::Client, url: Url, timeout: Duration) -> Result<Self, BlundersError> {
        Ok(Self {
            http,
            evaluate_url: url.join("evaluate")?,
            analyze_url: url,
            timeout,
        })
    }

    pub async fn analyze(
        &self,
        fen: &str,
        limits: SearchLimits,
    ) -> Result<AnalysisResult, BlundersError> {
        debug!(depth = limits.depth, multipv = limits.multipv, "remote analysis");
        let resp = self
            .http
            .post(self.analyze_url.clone())
            .timeout(self.timeout)
            .json(&EngineRequest {
                fen,
                depth: limits.depth,
                multipv: limits.multipv,
            })
            .send()
            .await?;
        read_json(SERVICE, resp).await
    }

    pub async fn evaluate(
        &self,
        fen: &str,
        uci_move: &str,
        limits: SearchLimits,
    ) -> Result<MoveEvaluation, BlundersError> {
        debug!(depth = limits.depth, uci_move, "remote move evaluation");
        let resp = self
            .http
            .post(self.evaluate_url.clone())
            .timeout(self.timeout)
            .json(&EvaluateRequest {
                fen,
                uci_move,
                depth: limits.depth,
            })
            .send()
            .await?;
        read_json(SERVICE, resp).await
    }
}
