//! Piece movement rules of the reduced model.
//!
//! These are pure predicates over geometry and occupancy. They know nothing
//! about whose turn it is or whether a king is left in check; the engine
//! layers those checks on top.

use super::types::{Color, PieceKind, Square};

/// Whether `kind` of `color` may travel from `from` to `to` by shape alone.
///
/// `capture` tells the pawn rules whether the destination is occupied by an
/// enemy piece. Sliding paths are checked separately by [`path_clear`].
#[must_use]
pub fn shape_allows(kind: PieceKind, color: Color, from: Square, to: Square, capture: bool) -> bool {
    if from == to {
        return false;
    }
    let df = to.file() as i8 - from.file() as i8;
    let dr = to.rank() as i8 - from.rank() as i8;

    match kind {
        PieceKind::Pawn => pawn_allows(color, from, df, dr, capture),
        PieceKind::Knight => matches!((df.abs(), dr.abs()), (1, 2) | (2, 1)),
        PieceKind::Bishop => df.abs() == dr.abs(),
        PieceKind::Rook => df == 0 || dr == 0,
        PieceKind::Queen => df == 0 || dr == 0 || df.abs() == dr.abs(),
        PieceKind::King => df.abs() <= 1 && dr.abs() <= 1,
    }
}

fn pawn_allows(color: Color, from: Square, df: i8, dr: i8, capture: bool) -> bool {
    let step = color.forward();
    if capture {
        df.abs() == 1 && dr == step
    } else {
        df == 0 && (dr == step || (dr == 2 * step && from.rank() == color.pawn_rank()))
    }
}

/// Whether the piece kind must have an empty path between its endpoints.
///
/// The pawn double step counts: it may not jump over the square it skips.
#[must_use]
pub fn needs_clear_path(kind: PieceKind, from: Square, to: Square) -> bool {
    match kind {
        PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen => true,
        PieceKind::Pawn => from.rank().abs_diff(to.rank()) == 2,
        PieceKind::Knight | PieceKind::King => false,
    }
}

/// True when every square strictly between `from` and `to` is empty.
///
/// Only meaningful for straight or diagonal lines; callers check the shape
/// first.
pub fn path_clear(from: Square, to: Square, occupied: impl Fn(Square) -> bool) -> bool {
    let step_file = (to.file() as i8 - from.file() as i8).signum();
    let step_rank = (to.rank() as i8 - from.rank() as i8).signum();

    let mut current = from.offset(step_file, step_rank);
    while let Some(square) = current {
        if square == to {
            return true;
        }
        if occupied(square) {
            return false;
        }
        current = square.offset(step_file, step_rank);
    }
    true
}
