use std::str::FromStr;

use chess::{Board, BoardStatus, MoveGen, Piece, ALL_PIECES};

use super::MoveOracle;
use crate::error::OracleError;

const MATE: i32 = 100_000;

/// Shallow negamax search over material, backed by the `chess` crate's
/// legal move generator. Good enough for hints when no real engine is
/// installed.
pub struct MaterialOracle {
    max_depth: u8,
}

impl MaterialOracle {
    pub fn new(max_depth: u8) -> Self {
        Self {
            max_depth: max_depth.max(1),
        }
    }

    fn depth(&self, requested: u8) -> u8 {
        requested.clamp(1, self.max_depth)
    }
}

fn parse(fen: &str) -> Result<Board, OracleError> {
    Board::from_str(fen).map_err(|_| OracleError::BadPosition(fen.to_string()))
}

fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => 100,
        Piece::Knight => 320,
        Piece::Bishop => 330,
        Piece::Rook => 500,
        Piece::Queen => 900,
        Piece::King => 0,
    }
}

/// Material balance for the side to move.
fn material(board: &Board) -> i32 {
    let us = board.side_to_move();
    ALL_PIECES
        .iter()
        .map(|&piece| {
            let ours = (*board.pieces(piece) & *board.color_combined(us)).popcnt() as i32;
            let theirs = (*board.pieces(piece) & *board.color_combined(!us)).popcnt() as i32;
            piece_value(piece) * (ours - theirs)
        })
        .sum()
}

fn negamax(board: &Board, depth: u8, mut alpha: i32, beta: i32, ply: i32) -> i32 {
    match board.status() {
        BoardStatus::Checkmate => return -MATE + ply,
        BoardStatus::Stalemate => return 0,
        BoardStatus::Ongoing => {}
    }
    if depth == 0 {
        return material(board);
    }

    let mut best = -MATE;
    for mv in MoveGen::new_legal(board) {
        let score = -negamax(&board.make_move_new(mv), depth - 1, -beta, -alpha, ply + 1);
        best = best.max(score);
        alpha = alpha.max(score);
        if alpha >= beta {
            break;
        }
    }
    best
}

impl MoveOracle for MaterialOracle {
    fn best_move(&self, fen: &str, depth: u8) -> Result<String, OracleError> {
        let board = parse(fen)?;
        let depth = self.depth(depth);

        let mut best: Option<(i32, String)> = None;
        for mv in MoveGen::new_legal(&board) {
            let score = -negamax(&board.make_move_new(mv), depth - 1, -MATE, MATE, 1);
            if best.as_ref().map_or(true, |(s, _)| score > *s) {
                best = Some((score, mv.to_string()));
            }
        }
        best.map(|(_, mv)| mv).ok_or(OracleError::NoAnswer("best move"))
    }

    fn evaluate(&self, fen: &str, depth: u8) -> Result<i32, OracleError> {
        let board = parse(fen)?;
        Ok(negamax(&board, self.depth(depth), -MATE, MATE, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1";

    #[test]
    fn test_start_position_is_balanced() {
        let oracle = MaterialOracle::new(2);
        assert_eq!(oracle.evaluate(START, 1).unwrap(), 0);
    }

    #[test]
    fn test_takes_hanging_queen() {
        // Black queen on d5 can be taken by the e4 pawn.
        let fen = "rnb1kbnr/pppp1ppp/8/3q4/4P3/8/PPPP1PPP/RNBQKBNR w - - 0 3";
        let oracle = MaterialOracle::new(2);
        assert_eq!(oracle.best_move(fen, 10).unwrap(), "e4d5");
    }

    #[test]
    fn test_finds_mate_in_one() {
        let fen = "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w - - 4 4";
        let oracle = MaterialOracle::new(2);
        assert_eq!(oracle.best_move(fen, 2).unwrap(), "h5f7");
    }

    #[test]
    fn test_bad_fen() {
        let oracle = MaterialOracle::new(1);
        assert!(matches!(
            oracle.evaluate("not a fen", 1),
            Err(OracleError::BadPosition(_))
        ));
    }
}
