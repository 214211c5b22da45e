//! UCI engine output parsing and FEN shape checks.

use crate::types::analysis::{AnalysisResult, PvLine, Score};
use std::collections::BTreeMap;

/// Parse a UCI `go` transcript into the deepest line per `multipv` slot.
///
/// Bound scores and `info` lines without a `pv` are ignored.
pub fn parse_output(output: &str) -> AnalysisResult {
    let mut lines: BTreeMap<u32, PvLine> = BTreeMap::new();
    let mut bestmove = None;

    for raw in output.lines() {
        let raw = raw.trim();
        if let Some(rest) = raw.strip_prefix("bestmove") {
            bestmove = rest
                .split_whitespace()
                .next()
                .filter(|mv| *mv != "(none)")
                .map(str::to_string);
            continue;
        }
        let Some(line) = parse_info(raw) else {
            continue;
        };
        let deeper = lines
            .get(&line.multipv)
            .is_none_or(|existing| line.depth > existing.depth);
        if deeper {
            lines.insert(line.multipv, line);
        }
    }

    let lines: Vec<PvLine> = lines.into_values().collect();
    let bestmove = bestmove.or_else(|| lines.first().and_then(|l| l.pv.first().cloned()));
    AnalysisResult { lines, bestmove }
}

fn parse_info(line: &str) -> Option<PvLine> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.first() != Some(&"info") {
        return None;
    }
    if tokens
        .iter()
        .any(|t| *t == "upperbound" || *t == "lowerbound")
    {
        return None;
    }
    let value_after = |key: &str| {
        tokens
            .iter()
            .position(|t| *t == key)
            .and_then(|i| tokens.get(i + 1))
    };

    let depth = value_after("depth")?.parse().ok()?;
    let score_idx = tokens.iter().position(|t| *t == "score")?;
    let score_value: i32 = tokens.get(score_idx + 2)?.parse().ok()?;
    let score = match *tokens.get(score_idx + 1)? {
        "cp" => Score::Cp(score_value),
        "mate" => Score::Mate(score_value),
        _ => return None,
    };
    let pv_idx = tokens.iter().position(|t| *t == "pv")?;
    let pv: Vec<String> = tokens[pv_idx + 1..].iter().map(|s| s.to_string()).collect();
    if pv.is_empty() {
        return None;
    }
    let multipv = match value_after("multipv") {
        Some(v) => v.parse().ok()?,
        None => 1,
    };

    Some(PvLine {
        depth,
        score,
        pv,
        multipv,
    })
}

/// Structural FEN check: piece placement, side to move, castling, en passant
/// and the two move counters.
pub fn is_valid_fen(fen: &str) -> bool {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    let [placement, side, castling, ep, halfmove, fullmove] = fields.as_slice() else {
        return false;
    };

    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return false;
    }
    for rank in ranks {
        let mut files = 0u32;
        for c in rank.chars() {
            match c {
                '1'..='8' => files += c.to_digit(10).unwrap_or(0),
                'p' | 'n' | 'b' | 'r' | 'q' | 'k' | 'P' | 'N' | 'B' | 'R' | 'Q' | 'K' => {
                    files += 1
                }
                _ => return false,
            }
        }
        if files != 8 {
            return false;
        }
    }
    if placement.matches('K').count() != 1 || placement.matches('k').count() != 1 {
        return false;
    }

    let castling_ok = *castling == "-"
        || (castling.len() <= 4 && castling.chars().all(|c| "KQkq".contains(c)));
    let ep_ok = *ep == "-"
        || matches!(ep.as_bytes(), [f, r] if (b'a'..=b'h').contains(f) && (*r == b'3' || *r == b'6'));

    matches!(*side, "w" | "b")
        && castling_ok
        && ep_ok
        && halfmove.parse::<u32>().is_ok()
        && fullmove.parse::<u32>().is_ok_and(|n| n >= 1)
}
