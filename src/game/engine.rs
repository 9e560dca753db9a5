//! The board engine: one mutable position per game.
//!
//! Legality policy: a move that leaves the mover's own king attacked is
//! always rejected, and the checkmate/stalemate scans apply the same filter.

use log::debug;

use super::outcome::{EndReason, GameEnd};
use super::rules;
use super::types::{Color, Move, Piece, PieceKind, Square};
use crate::error::MoveError;

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// An 8x8 grid of optional pieces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    squares: [Option<Piece>; 64],
}

impl Position {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            squares: [None; 64],
        }
    }

    /// The standard starting array.
    #[must_use]
    pub fn standard() -> Self {
        let mut position = Self::empty();
        for (file, kind) in (0u8..).zip(BACK_RANK) {
            for (color, back, pawns) in [(Color::White, 0, 1), (Color::Black, 7, 6)] {
                if let (Some(back), Some(pawns)) = (Square::new(file, back), Square::new(file, pawns)) {
                    position.set(back, Some(Piece::new(color, kind)));
                    position.set(pawns, Some(Piece::new(color, PieceKind::Pawn)));
                }
            }
        }
        position
    }

    /// Parse the piece-placement field of a FEN string (rank 8 first).
    #[must_use]
    pub fn from_placement(placement: &str) -> Option<Self> {
        let mut position = Self::empty();
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return None;
        }
        for (row, text) in ranks.iter().enumerate() {
            let rank = 7 - row as u8;
            let mut file = 0u8;
            for c in text.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file = file.checked_add(u8::try_from(skip).ok()?)?;
                    if file > 8 {
                        return None;
                    }
                    continue;
                }
                let kind = PieceKind::from_letter(c)?;
                let color = if c.is_ascii_uppercase() {
                    Color::White
                } else {
                    Color::Black
                };
                position.set(Square::new(file, rank)?, Some(Piece::new(color, kind)));
                file += 1;
            }
            if file != 8 {
                return None;
            }
        }
        Some(position)
    }

    fn index(square: Square) -> usize {
        usize::from(square.rank()) * 8 + usize::from(square.file())
    }

    #[must_use]
    pub fn get(&self, square: Square) -> Option<Piece> {
        self.squares[Self::index(square)]
    }

    /// Put `piece` on `square`, returning whatever was there.
    pub fn set(&mut self, square: Square, piece: Option<Piece>) -> Option<Piece> {
        std::mem::replace(&mut self.squares[Self::index(square)], piece)
    }

    /// Squares and pieces belonging to `color`.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |square| {
            self.get(square)
                .filter(|piece| piece.color == color)
                .map(|piece| (square, piece))
        })
    }

    #[must_use]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces(color)
            .find(|(_, piece)| piece.kind == PieceKind::King)
            .map(|(square, _)| square)
    }

    /// Pseudo-legal reachability for whatever stands on `from`, ignoring turn
    /// order and king safety.
    pub fn can_reach(&self, from: Square, to: Square) -> Result<Piece, MoveError> {
        let piece = self.get(from).ok_or(MoveError::EmptySquare(from))?;
        let target = self.get(to);
        if target.is_some_and(|t| t.color == piece.color) {
            return Err(MoveError::OwnPieceOnTarget(to));
        }
        if !rules::shape_allows(piece.kind, piece.color, from, to, target.is_some()) {
            return Err(MoveError::IllegalShape {
                kind: piece.kind,
                from,
                to,
            });
        }
        if rules::needs_clear_path(piece.kind, from, to)
            && !rules::path_clear(from, to, |square| self.get(square).is_some())
        {
            return Err(MoveError::PathBlocked { from, to });
        }
        Ok(piece)
    }

    /// True iff some opposing piece can pseudo-legally land on `color`'s king.
    #[must_use]
    pub fn is_in_check(&self, color: Color) -> bool {
        let Some(king) = self.king_square(color) else {
            return false;
        };
        self.pieces(color.opponent())
            .any(|(square, _)| self.can_reach(square, king).is_ok())
    }

    /// Run `test` against the position with the piece on `from` moved to `to`,
    /// then put both squares back exactly as they were.
    pub fn probe<R>(&mut self, from: Square, to: Square, test: impl FnOnce(&Self) -> R) -> R {
        let moving = self.set(from, None);
        let captured = self.set(to, moving);
        let result = test(self);
        self.set(to, captured);
        self.set(from, moving);
        result
    }

    /// Whether `color` has any pseudo-legal move that leaves its king safe.
    pub fn has_safe_move(&mut self, color: Color) -> bool {
        let origins: Vec<Square> = self.pieces(color).map(|(square, _)| square).collect();
        for from in origins {
            for to in Square::all() {
                if self.can_reach(from, to).is_err() {
                    continue;
                }
                if !self.probe(from, to, |p| p.is_in_check(color)) {
                    return true;
                }
            }
        }
        false
    }

    /// FEN piece-placement field.
    #[must_use]
    pub fn placement(&self) -> String {
        let mut out = String::with_capacity(72);
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                match Square::new(file, rank).and_then(|s| self.get(s)) {
                    Some(piece) => {
                        if empty > 0 {
                            out.push_str(&empty.to_string());
                            empty = 0;
                        }
                        out.push(piece.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            if rank > 0 {
                out.push('/');
            }
        }
        out
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::standard()
    }
}

/// One game's rules state: position, side to move, result and move log.
#[derive(Debug, Clone)]
pub struct BoardEngine {
    position: Position,
    side_to_move: Color,
    end: Option<GameEnd>,
    history: Vec<Move>,
}

impl BoardEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::from_position(Position::standard(), Color::White)
    }

    #[must_use]
    pub fn from_position(position: Position, side_to_move: Color) -> Self {
        Self {
            position,
            side_to_move,
            end: None,
            history: Vec::new(),
        }
    }

    #[must_use]
    pub fn position(&self) -> &Position {
        &self.position
    }

    #[must_use]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[must_use]
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    #[must_use]
    pub fn result(&self) -> Option<GameEnd> {
        self.end
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.end.is_some()
    }

    /// Apply `mv` if legal. A `false` return leaves the engine untouched.
    pub fn apply_move(&mut self, mv: &Move) -> bool {
        match self.try_apply(mv) {
            Ok(()) => true,
            Err(err) => {
                debug!("Rejected move {}: {}", mv, err);
                false
            }
        }
    }

    pub fn try_apply(&mut self, mv: &Move) -> Result<(), MoveError> {
        if self.end.is_some() {
            return Err(MoveError::GameOver);
        }
        let mover = self.side_to_move;
        let piece = self
            .position
            .get(mv.from)
            .ok_or(MoveError::EmptySquare(mv.from))?;
        if piece.color != mover {
            return Err(MoveError::WrongSide(mv.from));
        }
        self.position.can_reach(mv.from, mv.to)?;
        if self.position.probe(mv.from, mv.to, |p| p.is_in_check(mover)) {
            return Err(MoveError::KingExposed);
        }

        let promotes = piece.kind == PieceKind::Pawn && mv.to.rank() == mover.promotion_rank();
        let placed = if promotes {
            Piece::new(mover, mv.promotion.unwrap_or(PieceKind::Queen))
        } else {
            piece
        };
        self.position.set(mv.from, None);
        self.position.set(mv.to, Some(placed));

        let recorded = if promotes {
            Move::new(mv.from, mv.to).with_promotion(placed.kind)
        } else {
            Move::new(mv.from, mv.to)
        };
        self.history.push(recorded);
        self.side_to_move = mover.opponent();
        self.end = self.detect_end(mover);
        Ok(())
    }

    fn detect_end(&self, mover: Color) -> Option<GameEnd> {
        let by_rules = if self.is_checkmate() {
            Some(GameEnd::won(mover, EndReason::Checkmate))
        } else if self.is_stalemate() {
            Some(GameEnd::drawn(EndReason::Stalemate))
        } else {
            None
        };

        match (
            self.position.king_square(Color::White),
            self.position.king_square(Color::Black),
        ) {
            (None, _) => Some(GameEnd::won(Color::Black, EndReason::KingCaptured)),
            (_, None) => Some(GameEnd::won(Color::White, EndReason::KingCaptured)),
            _ => by_rules,
        }
    }

    #[must_use]
    pub fn is_in_check(&self, color: Color) -> bool {
        self.position.is_in_check(color)
    }

    /// The side to move is in check and every escape attempt fails.
    #[must_use]
    pub fn is_checkmate(&self) -> bool {
        let side = self.side_to_move;
        self.is_in_check(side) && !self.position.clone().has_safe_move(side)
    }

    /// The side to move is not in check but has no move that keeps it safe.
    #[must_use]
    pub fn is_stalemate(&self) -> bool {
        let side = self.side_to_move;
        !self.is_in_check(side) && !self.position.clone().has_safe_move(side)
    }

    /// Full FEN. The engine has no castling or en-passant, so both fields are
    /// always `-`.
    #[must_use]
    pub fn fen(&self) -> String {
        format!(
            "{} {} - - 0 {}",
            self.position.placement(),
            self.side_to_move.fen_char(),
            self.history.len() / 2 + 1
        )
    }
}

impl Default for BoardEngine {
    fn default() -> Self {
        Self::new()
    }
}
