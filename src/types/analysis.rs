use serde::{Deserialize, Serialize};

pub const DEFAULT_MULTIPV: u32 = 1;
pub const MAX_DEPTH: u32 = 25;
pub const MAX_MULTIPV: u32 = 5;

/// Engine score from the side to move's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Score {
    Cp(i32),
    Mate(i32),
}

/// One principal variation at its deepest reported depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PvLine {
    pub depth: u32,
    pub score: Score,
    pub pv: Vec<String>,
    pub multipv: u32,
}

/// Analysis body stored with each analysis row. Empty when no engine is
/// configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub lines: Vec<PvLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bestmove: Option<String>,
}

/// Body of `POST /api/analysis`.
#[derive(Debug, Deserialize)]
pub struct CreateAnalysis {
    pub game_id: String,
    #[serde(default)]
    pub fen: Option<String>,
    #[serde(default)]
    pub depth: Option<u32>,
    #[serde(default)]
    pub multipv: Option<u32>,
}

/// Body of `POST /api/analysis/evaluate`: one move played from `fen`, in UCI
/// notation.
#[derive(Debug, Deserialize)]
pub struct EvaluateMove {
    pub fen: String,
    #[serde(rename = "move")]
    pub uci_move: String,
    #[serde(default)]
    pub depth: Option<u32>,
}

/// Evaluation before and after a move, in centipawns from the mover's side.
/// Mate scores leave the centipawn fields empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveEvaluation {
    pub fen: String,
    pub move_uci: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_san: Option<String>,
    pub is_legal: bool,
    #[serde(default)]
    pub eval_before_cp: Option<i32>,
    #[serde(default)]
    pub eval_after_cp: Option<i32>,
    #[serde(default)]
    pub eval_drop_cp: Option<i32>,
    #[serde(default)]
    pub best_move_uci: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_move_san: Option<String>,
}

impl MoveEvaluation {
    /// A verdict with no engine figures yet.
    pub fn unscored(fen: &str, uci_move: &str, is_legal: bool) -> Self {
        Self {
            fen: fen.to_string(),
            move_uci: uci_move.to_string(),
            move_san: None,
            is_legal,
            eval_before_cp: None,
            eval_after_cp: None,
            eval_drop_cp: None,
            best_move_uci: None,
            best_move_san: None,
        }
    }
}

/// Engine limits after clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchLimits {
    pub depth: u32,
    pub multipv: u32,
}

impl SearchLimits {
    pub fn clamped(depth: Option<u32>, multipv: Option<u32>, default_depth: u32) -> Self {
        Self {
            depth: depth.unwrap_or(default_depth).clamp(1, MAX_DEPTH),
            multipv: multipv.unwrap_or(DEFAULT_MULTIPV).clamp(1, MAX_MULTIPV),
        }
    }
}

/// Query of `GET /api/analysis`.
#[derive(Debug, Default, Deserialize)]
pub struct AnalysisListQuery {
    pub game_id: Option<String>,
    pub limit: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_are_clamped() {
        assert_eq!(
            SearchLimits::clamped(Some(40), Some(9), 20),
            SearchLimits { depth: 25, multipv: 5 }
        );
        assert_eq!(
            SearchLimits::clamped(None, None, 20),
            SearchLimits { depth: 20, multipv: 1 }
        );
        assert_eq!(
            SearchLimits::clamped(Some(0), Some(0), 20),
            SearchLimits { depth: 1, multipv: 1 }
        );
    }

    #[test]
    fn score_serializes_as_tagged_object() {
        assert_eq!(
            serde_json::to_value(Score::Cp(-35)).unwrap(),
            serde_json::json!({"cp": -35})
        );
        assert_eq!(
            serde_json::to_value(Score::Mate(3)).unwrap(),
            serde_json::json!({"mate": 3})
        );
    }

    #[test]
    fn empty_result_has_no_bestmove_key() {
        assert_eq!(
            serde_json::to_value(AnalysisResult::default()).unwrap(),
            serde_json::json!({"lines": []})
        );
    }
}
