//! Move legality and eval-drop arithmetic for single-move evaluation.

use chess::{Board, ChessMove, MoveGen, Piece, Square};
use std::str::FromStr;

use crate::error::BlundersError;
use crate::types::analysis::{AnalysisResult, MoveEvaluation, Score};

pub fn parse_board(fen: &str) -> Result<Board, BlundersError> {
    Board::from_str(fen.trim()).map_err(|_| BlundersError::bad_request("Invalid FEN"))
}

/// Parse `e2e4` / `e7e8q` without checking legality.
pub fn parse_uci_move(uci: &str) -> Result<ChessMove, BlundersError> {
    let invalid = || BlundersError::bad_request("Invalid move format");
    if !(4..=5).contains(&uci.len()) || !uci.is_ascii() {
        return Err(invalid());
    }
    let from = Square::from_str(&uci[0..2]).map_err(|_| invalid())?;
    let to = Square::from_str(&uci[2..4]).map_err(|_| invalid())?;
    let promotion = match uci[4..].chars().next().map(|c| c.to_ascii_lowercase()) {
        None => None,
        Some('q') => Some(Piece::Queen),
        Some('r') => Some(Piece::Rook),
        Some('b') => Some(Piece::Bishop),
        Some('n') => Some(Piece::Knight),
        Some(_) => return Err(invalid()),
    };
    Ok(ChessMove::new(from, to, promotion))
}

pub fn is_legal(board: &Board, mv: ChessMove) -> bool {
    MoveGen::new_legal(board).any(|m| m == mv)
}

fn centipawns(result: &AnalysisResult) -> Option<i32> {
    match result.lines.first()?.score {
        Score::Cp(cp) => Some(cp),
        Score::Mate(_) => None,
    }
}

/// Combine the search before the move (mover to play) with the search after
/// it (opponent to play) into the mover's eval drop.
pub fn assemble(
    fen: &str,
    uci_move: &str,
    before: &AnalysisResult,
    after: &AnalysisResult,
) -> MoveEvaluation {
    let eval_before_cp = centipawns(before);
    let eval_after_cp = centipawns(after).map(|cp| -cp);
    let eval_drop_cp = eval_before_cp.zip(eval_after_cp).map(|(b, a)| b - a);
    MoveEvaluation {
        eval_before_cp,
        eval_after_cp,
        eval_drop_cp,
        best_move_uci: before.bestmove.clone(),
        ..MoveEvaluation::unscored(fen, uci_move, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::analysis::PvLine;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn searched(score: Score, bestmove: &str) -> AnalysisResult {
        AnalysisResult {
            lines: vec![PvLine {
                depth: 18,
                score,
                pv: vec![bestmove.to_string()],
                multipv: 1,
            }],
            bestmove: Some(bestmove.to_string()),
        }
    }

    #[test]
    fn legality_against_the_position() {
        let board = parse_board(START_FEN).unwrap();
        assert!(is_legal(&board, parse_uci_move("e2e4").unwrap()));
        assert!(is_legal(&board, parse_uci_move("g1f3").unwrap()));
        assert!(!is_legal(&board, parse_uci_move("e2e5").unwrap()));
        assert!(!is_legal(&board, parse_uci_move("e7e5").unwrap()));
    }

    #[test]
    fn move_format_and_fen_errors() {
        assert!(parse_uci_move("e2").is_err());
        assert!(parse_uci_move("z9e4").is_err());
        assert!(parse_uci_move("e7e8k").is_err());
        assert!(parse_uci_move("e7e8q").is_ok());
        assert!(parse_board("not a fen").is_err());
    }

    #[test]
    fn drop_is_from_the_movers_side() {
        let before = searched(Score::Cp(31), "e2e4");
        let after = searched(Score::Cp(250), "d8h4");
        let eval = assemble(START_FEN, "f2f3", &before, &after);
        assert!(eval.is_legal);
        assert_eq!(eval.eval_before_cp, Some(31));
        assert_eq!(eval.eval_after_cp, Some(-250));
        assert_eq!(eval.eval_drop_cp, Some(281));
        assert_eq!(eval.best_move_uci.as_deref(), Some("e2e4"));
    }

    #[test]
    fn mate_scores_leave_drop_empty() {
        let before = searched(Score::Cp(-40), "g1f3");
        let after = searched(Score::Mate(1), "d8h4");
        let eval = assemble(START_FEN, "g2g4", &before, &after);
        assert_eq!(eval.eval_before_cp, Some(-40));
        assert_eq!(eval.eval_after_cp, None);
        assert_eq!(eval.eval_drop_cp, None);
    }
}
