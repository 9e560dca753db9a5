//! Value types shared by the engine and the wire protocol.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MoveError;

/// Side of the board. White always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// Rank delta of a single pawn step.
    #[must_use]
    pub const fn forward(self) -> i8 {
        match self {
            Self::White => 1,
            Self::Black => -1,
        }
    }

    /// Zero-based rank the pawns start on.
    #[must_use]
    pub const fn pawn_rank(self) -> u8 {
        match self {
            Self::White => 1,
            Self::Black => 6,
        }
    }

    /// Zero-based rank a pawn promotes on.
    #[must_use]
    pub const fn promotion_rank(self) -> u8 {
        match self {
            Self::White => 7,
            Self::Black => 0,
        }
    }

    #[must_use]
    pub const fn fen_char(self) -> char {
        match self {
            Self::White => 'w',
            Self::Black => 'b',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::White => write!(f, "white"),
            Self::Black => write!(f, "black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Lowercase letter used in FEN and UCI notation.
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Pawn => 'p',
            Self::Knight => 'n',
            Self::Bishop => 'b',
            Self::Rook => 'r',
            Self::Queen => 'q',
            Self::King => 'k',
        }
    }

    #[must_use]
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_lowercase() {
            'p' => Some(Self::Pawn),
            'n' => Some(Self::Knight),
            'b' => Some(Self::Bishop),
            'r' => Some(Self::Rook),
            'q' => Some(Self::Queen),
            'k' => Some(Self::King),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pawn => "Pawn",
            Self::Knight => "Knight",
            Self::Bishop => "Bishop",
            Self::Rook => "Rook",
            Self::Queen => "Queen",
            Self::King => "King",
        }
    }

    /// True for the pieces a pawn may turn into.
    #[must_use]
    pub const fn is_promotable(self) -> bool {
        matches!(self, Self::Knight | Self::Bishop | Self::Rook | Self::Queen)
    }
}

impl TryFrom<String> for PieceKind {
    type Error = MoveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let kind = match value.to_ascii_lowercase().as_str() {
            "knight" => Some(Self::Knight),
            "bishop" => Some(Self::Bishop),
            "rook" => Some(Self::Rook),
            "queen" => Some(Self::Queen),
            s if s.len() == 1 => s.chars().next().and_then(Self::from_letter),
            _ => None,
        };
        kind.filter(|k| k.is_promotable())
            .ok_or(MoveError::UnknownPromotion(value))
    }
}

impl From<PieceKind> for String {
    fn from(kind: PieceKind) -> Self {
        kind.letter().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    #[must_use]
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    /// FEN letter: uppercase for White.
    #[must_use]
    pub fn fen_char(self) -> char {
        match self.color {
            Color::White => self.kind.letter().to_ascii_uppercase(),
            Color::Black => self.kind.letter(),
        }
    }
}

/// A board coordinate. `file` 0..8 is a..h, `rank` 0..8 is 1..8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    #[must_use]
    pub const fn new(file: u8, rank: u8) -> Option<Self> {
        if file < 8 && rank < 8 {
            Some(Self { file, rank })
        } else {
            None
        }
    }

    #[must_use]
    pub const fn file(self) -> u8 {
        self.file
    }

    #[must_use]
    pub const fn rank(self) -> u8 {
        self.rank
    }

    /// The square `df` files and `dr` ranks away, if still on the board.
    #[must_use]
    pub fn offset(self, df: i8, dr: i8) -> Option<Self> {
        let file = u8::try_from(i16::from(self.file) + i16::from(df)).ok()?;
        let rank = u8::try_from(i16::from(self.rank) + i16::from(dr)).ok()?;
        Self::new(file, rank)
    }

    /// All 64 squares, a1 first, rank by rank.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|rank| (0..8u8).map(move |file| Square { file, rank }))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file) as char, self.rank + 1)
    }
}

impl FromStr for Square {
    type Err = MoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(MoveError::MalformedSquare(s.to_string()));
        }
        let file = bytes[0].to_ascii_lowercase().wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        Self::new(file, rank).ok_or_else(|| MoveError::MalformedSquare(s.to_string()))
    }
}

impl TryFrom<String> for Square {
    type Error = MoveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Square> for String {
    fn from(square: Square) -> Self {
        square.to_string()
    }
}

/// A requested move. Validity depends on the position it is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceKind>,
}

impl Move {
    #[must_use]
    pub const fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    #[must_use]
    pub const fn with_promotion(mut self, kind: PieceKind) -> Self {
        self.promotion = Some(kind);
        self
    }
}

/// UCI long algebraic form, e.g. `e2e4` or `e7e8q`.
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.letter())?;
        }
        Ok(())
    }
}

impl FromStr for Move {
    type Err = MoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (Some(from), Some(to)) = (s.get(0..2), s.get(2..4)) else {
            return Err(MoveError::MalformedSquare(s.to_string()));
        };
        let promo = s.get(4..).unwrap_or_default();
        let mv = Move::new(from.parse()?, to.parse()?);
        if promo.is_empty() {
            Ok(mv)
        } else {
            Ok(mv.with_promotion(PieceKind::try_from(promo.to_string())?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_parse_and_display() {
        let sq: Square = "e4".parse().unwrap();
        assert_eq!((sq.file(), sq.rank()), (4, 3));
        assert_eq!(sq.to_string(), "e4");
        assert_eq!("H8".parse::<Square>().unwrap().to_string(), "h8");
    }

    #[test]
    fn test_square_rejects_garbage() {
        for bad in ["", "e", "e9", "i1", "e10", "4e"] {
            assert!(bad.parse::<Square>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_square_offset_stays_on_board() {
        let a1: Square = "a1".parse().unwrap();
        assert_eq!(a1.offset(1, 2).map(|s| s.to_string()), Some("b3".into()));
        assert_eq!(a1.offset(-1, 0), None);
        assert_eq!(Square::all().count(), 64);
    }

    #[test]
    fn test_move_uci_round_trip() {
        let mv: Move = "e7e8q".parse().unwrap();
        assert_eq!(mv.promotion, Some(PieceKind::Queen));
        assert_eq!(mv.to_string(), "e7e8q");
        assert!("e7e8k".parse::<Move>().is_err());
        assert!("e7".parse::<Move>().is_err());
    }

    #[test]
    fn test_move_json_shape() {
        let mv: Move = serde_json::from_str(r#"{"from":"g7","to":"g8","promotion":"n"}"#).unwrap();
        assert_eq!(mv.promotion, Some(PieceKind::Knight));

        let plain = Move::new("e2".parse().unwrap(), "e4".parse().unwrap());
        assert_eq!(
            serde_json::to_string(&plain).unwrap(),
            r#"{"from":"e2","to":"e4"}"#
        );
    }

    #[test]
    fn test_color_helpers() {
        assert_eq!(Color::White.opponent(), Color::Black);
        assert_eq!(Color::Black.forward(), -1);
        assert_eq!(Piece::new(Color::White, PieceKind::Knight).fen_char(), 'N');
    }
}
