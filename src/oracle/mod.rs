//! Move-evaluation oracle.
//!
//! An oracle answers two questions about a FEN position: the best move at a
//! given depth, and a centipawn score from the side to move's point of view.
//! Everything here is blocking; callers run it on the blocking pool.

pub mod material;
pub mod uci;

use std::sync::Arc;

use actix_web::web;
use log::{info, warn};
use serde::Serialize;

use crate::config::{OracleConfig, OracleKind};
use crate::error::OracleError;

pub use material::MaterialOracle;
pub use uci::UciOracle;

/// Move suggested when nothing better is available.
pub const FALLBACK_MOVE: &str = "e2e4";

const NO_ORACLE_ADVICE: &str =
    "Chess engine not available. Try developing your pieces towards the center!";
const ORACLE_FAILED_ADVICE: &str = "Consider controlling the center or developing your pieces.";

pub trait MoveOracle: Send + Sync {
    /// Best move for the side to move, in UCI notation.
    fn best_move(&self, fen: &str, depth: u8) -> Result<String, OracleError>;

    /// Score in centipawns for the side to move.
    fn evaluate(&self, fen: &str, depth: u8) -> Result<i32, OracleError>;
}

/// Build the oracle named by `config`, if any.
pub fn from_config(config: &OracleConfig) -> Option<Arc<dyn MoveOracle>> {
    match config.kind {
        OracleKind::None => None,
        OracleKind::Builtin => {
            info!("Using built-in oracle (depth {})", config.builtin_depth);
            Some(Arc::new(MaterialOracle::new(config.builtin_depth)))
        }
        OracleKind::Uci => {
            let path = config.uci_path.clone()?;
            info!("Using UCI oracle at {}", path.display());
            Some(Arc::new(UciOracle::new(path)))
        }
    }
}

/// Run an oracle call on the blocking pool.
pub async fn off_thread<T, F>(call: F) -> Result<T, OracleError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    web::block(call).await.map_err(|_| OracleError::Cancelled)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Classification {
    Excellent,
    Good,
    Inaccuracy,
    Mistake,
    Blunder,
    Unknown,
}

/// Classify a move from the mover's score before and after it.
pub fn classify(score_before: i32, score_after: i32, is_best: bool) -> Classification {
    if is_best {
        return Classification::Excellent;
    }
    match score_after - score_before {
        diff if diff >= -10 => Classification::Good,
        diff if diff >= -50 => Classification::Inaccuracy,
        diff if diff >= -100 => Classification::Mistake,
        _ => Classification::Blunder,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveAnalysis {
    #[serde(rename = "move")]
    pub mv: String,
    pub classification: Classification,
    pub best_move: Option<String>,
    pub score_diff: i32,
    /// Mover's score after the move.
    pub evaluation: i32,
}

/// Analyse one move. `fen_before` is the position the mover faced and
/// `fen_after` the position handed to the opponent.
pub fn analyze_move(
    oracle: &dyn MoveOracle,
    fen_before: &str,
    fen_after: &str,
    mv: &str,
    depth: u8,
) -> MoveAnalysis {
    let best_move = oracle
        .best_move(fen_before, depth)
        .map_err(|e| warn!("Oracle best move failed: {}", e))
        .ok();
    let scores = oracle
        .evaluate(fen_before, depth)
        .and_then(|before| Ok((before, -oracle.evaluate(fen_after, depth)?)));

    match scores {
        Ok((before, after)) => {
            let is_best = best_move.as_deref() == Some(mv);
            MoveAnalysis {
                mv: mv.to_string(),
                classification: classify(before, after, is_best),
                best_move,
                score_diff: after - before,
                evaluation: after,
            }
        }
        Err(e) => {
            warn!("Oracle evaluation failed for {}: {}", mv, e);
            MoveAnalysis {
                mv: mv.to_string(),
                classification: Classification::Unknown,
                best_move,
                score_diff: 0,
                evaluation: 0,
            }
        }
    }
}

/// Whole-game summary built from per-move analyses.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameAnalysis {
    pub accuracy: f64,
    pub blunders: u32,
    pub mistakes: u32,
    pub inaccuracies: u32,
    pub excellent: u32,
    pub good: u32,
    pub moves: Vec<MoveAnalysis>,
}

impl GameAnalysis {
    pub fn summarize(moves: Vec<MoveAnalysis>) -> Self {
        let count = |class: Classification| {
            moves
                .iter()
                .filter(|m| m.classification == class)
                .count() as u32
        };
        let excellent = count(Classification::Excellent);
        let good = count(Classification::Good);
        let inaccuracies = count(Classification::Inaccuracy);
        let mistakes = count(Classification::Mistake);
        let blunders = count(Classification::Blunder);

        let total = moves.len() as u32;
        let accuracy = if total == 0 {
            0.0
        } else {
            let rest = total.saturating_sub(blunders + mistakes + inaccuracies);
            let points = excellent * 100 + good * 80 + rest * 60;
            (f64::from(points) / f64::from(total)).min(100.0)
        };

        Self {
            accuracy,
            blunders,
            mistakes,
            inaccuracies,
            excellent,
            good,
            moves,
        }
    }
}

/// Answer to a `request_hint`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    pub best_move: String,
    pub hint: String,
}

impl Hint {
    /// Hint sent when no oracle is configured, or when it fails.
    pub fn fallback(oracle_configured: bool) -> Self {
        let advice = if oracle_configured {
            ORACLE_FAILED_ADVICE
        } else {
            NO_ORACLE_ADVICE
        };
        Self {
            best_move: FALLBACK_MOVE.to_string(),
            hint: advice.to_string(),
        }
    }
}
