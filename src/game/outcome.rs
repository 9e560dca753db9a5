use serde::{Deserialize, Serialize};

use super::types::Color;

/// Result classification used for ratings: exactly one of these per game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    WhiteWins,
    BlackWins,
    Draw,
}

impl Outcome {
    #[must_use]
    pub const fn won_by(color: Color) -> Self {
        match color {
            Color::White => Self::WhiteWins,
            Color::Black => Self::BlackWins,
        }
    }

    #[must_use]
    pub const fn winner(self) -> Option<Color> {
        match self {
            Self::WhiteWins => Some(Color::White),
            Self::BlackWins => Some(Color::Black),
            Self::Draw => None,
        }
    }

    /// Score for `color`: 1 for a win, 0.5 for a draw, 0 for a loss.
    #[must_use]
    pub fn score_for(self, color: Color) -> f64 {
        match self.winner() {
            Some(winner) if winner == color => 1.0,
            Some(_) => 0.0,
            None => 0.5,
        }
    }
}

/// Why a game stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Checkmate,
    Stalemate,
    /// A king vanished from the board. Should never happen with correct
    /// move application.
    KingCaptured,
    Resignation,
    Timeout,
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEnd {
    pub outcome: Outcome,
    pub reason: EndReason,
}

impl GameEnd {
    #[must_use]
    pub const fn won(winner: Color, reason: EndReason) -> Self {
        Self {
            outcome: Outcome::won_by(winner),
            reason,
        }
    }

    #[must_use]
    pub const fn drawn(reason: EndReason) -> Self {
        Self {
            outcome: Outcome::Draw,
            reason,
        }
    }
}
