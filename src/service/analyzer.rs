use crate::api::RemoteEngine;
use crate::config::{AnalysisBackend, AnalysisConfig};
use crate::error::BlundersError;
use crate::service::evaluate;
use crate::service::local_engine::LocalEngine;
use crate::service::uci::is_valid_fen;
use crate::types::analysis::{AnalysisResult, EvaluateMove, MoveEvaluation, SearchLimits};

/// Produces the body of an analysis row.
pub enum Analyzer {
    /// No engine wired up; every analysis is empty.
    Placeholder,
    Remote(RemoteEngine),
    Local(LocalEngine),
}

impl Analyzer {
    pub fn from_config(
        cfg: &AnalysisConfig,
        http: reqwest::Client,
    ) -> Result<Self, BlundersError> {
        match cfg.backend {
            AnalysisBackend::Placeholder => Ok(Self::Placeholder),
            AnalysisBackend::Remote => {
                let url = cfg.engine_url.clone().ok_or_else(|| {
                    BlundersError::Engine("remote analysis needs analysis.engine_url".into())
                })?;
                Ok(Self::Remote(RemoteEngine::new(http, url, cfg.timeout())?))
            }
            AnalysisBackend::Local => {
                let path = cfg.engine_path.clone().ok_or_else(|| {
                    BlundersError::Engine("local analysis needs analysis.engine_path".into())
                })?;
                Ok(Self::Local(LocalEngine::new(path, cfg.timeout())))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Placeholder => "placeholder",
            Self::Remote(_) => "remote",
            Self::Local(_) => "local",
        }
    }

    pub async fn analyze(
        &self,
        fen: Option<&str>,
        limits: SearchLimits,
    ) -> Result<AnalysisResult, BlundersError> {
        match self {
            Self::Placeholder => Ok(AnalysisResult::default()),
            Self::Remote(engine) => engine.analyze(engine_fen(fen)?, limits).await,
            Self::Local(engine) => engine.analyze(engine_fen(fen)?, limits).await,
        }
    }

    /// Judge one move. Malformed input is a `400`; an illegal move is a
    /// normal answer with `is_legal: false` and no engine call.
    pub async fn evaluate(
        &self,
        req: &EvaluateMove,
        limits: SearchLimits,
    ) -> Result<MoveEvaluation, BlundersError> {
        let fen = req.fen.trim();
        let uci_move = req.uci_move.trim();
        let board = evaluate::parse_board(fen)?;
        let mv = evaluate::parse_uci_move(uci_move)?;
        if !evaluate::is_legal(&board, mv) {
            return Ok(MoveEvaluation::unscored(fen, uci_move, false));
        }
        match self {
            Self::Placeholder => Ok(MoveEvaluation::unscored(fen, uci_move, true)),
            Self::Remote(engine) => engine.evaluate(fen, uci_move, limits).await,
            Self::Local(engine) => {
                let (before, after) = engine.analyze_move(fen, uci_move, limits).await?;
                Ok(evaluate::assemble(fen, uci_move, &before, &after))
            }
        }
    }
}

/// Engines need a position to search.
fn engine_fen(fen: Option<&str>) -> Result<&str, BlundersError> {
    let fen = fen.ok_or_else(|| BlundersError::bad_request("FEN position required"))?;
    if !is_valid_fen(fen) {
        return Err(BlundersError::bad_request("Invalid FEN"));
    }
    Ok(fen)
}
