use super::engine::Position;
use super::outcome::{EndReason, GameEnd, Outcome};
use super::types::{Color, Move};

/// Winner field of a `game_over` frame.
pub fn winner_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::WhiteWins => "white",
        Outcome::BlackWins => "black",
        Outcome::Draw => "draw",
    }
}

/// The `msg` field of a `game_over` frame as seen by `viewer`.
pub fn game_over_text(end: GameEnd, viewer: Color) -> String {
    let won = end.outcome.winner().map(|winner| winner == viewer);
    match (end.reason, won) {
        (_, None) => "It's a draw!".to_string(),
        (EndReason::Resignation, Some(true)) => "Opponent resigned".to_string(),
        (EndReason::Resignation, Some(false)) => "You resigned".to_string(),
        (EndReason::Timeout, Some(true)) => "Opponent ran out of time".to_string(),
        (EndReason::Timeout, Some(false)) => "You ran out of time".to_string(),
        (EndReason::Abandoned, Some(true)) => "Opponent disconnected".to_string(),
        (EndReason::Checkmate, Some(true)) => "Checkmate! You win".to_string(),
        (EndReason::Checkmate, Some(false)) => "Checkmate. You lose".to_string(),
        (_, Some(true)) => "You win".to_string(),
        (_, Some(false)) => "You lose".to_string(),
    }
}

/// A sentence describing the oracle's suggestion.
pub fn hint_text(position: &Position, best: &str) -> String {
    match best.parse::<Move>() {
        Ok(mv) => {
            let piece = position
                .get(mv.from)
                .map_or("piece", |p| p.kind.name())
                .to_lowercase();
            format!(
                "Move your {} from {} to {}. This is the strongest move in this position.",
                piece, mv.from, mv.to
            )
        }
        Err(_) => format!("Consider this move: {}", best),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_over_text_perspectives() {
        let resigned = GameEnd::won(Color::White, EndReason::Resignation);
        assert_eq!(game_over_text(resigned, Color::White), "Opponent resigned");
        assert_eq!(game_over_text(resigned, Color::Black), "You resigned");

        let stalemate = GameEnd::drawn(EndReason::Stalemate);
        assert_eq!(game_over_text(stalemate, Color::Black), "It's a draw!");
        assert_eq!(winner_label(stalemate.outcome), "draw");
    }

    #[test]
    fn test_hint_text_names_the_piece() {
        let text = hint_text(&Position::standard(), "g1f3");
        assert_eq!(
            text,
            "Move your knight from g1 to f3. This is the strongest move in this position."
        );
        assert_eq!(hint_text(&Position::standard(), "0000x"), "Consider this move: 0000x");
    }
}
