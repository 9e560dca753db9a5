mod common;

use std::sync::Arc;

use actix::prelude::*;

use chess_server::error::OracleError;
use chess_server::game::{Color, Move};
use chess_server::models::ServerMessage;
use chess_server::oracle::{Classification, MoveOracle};
use chess_server::session::{
    GameSession, PostChat, RequestHint, Resign, SessionState, SessionStatus, SubmitMove,
};

use common::*;

fn mv(text: &str) -> Move {
    text.parse().unwrap()
}

struct FixedOracle;

impl MoveOracle for FixedOracle {
    fn best_move(&self, _fen: &str, _depth: u8) -> Result<String, OracleError> {
        Ok("g1f3".to_string())
    }

    fn evaluate(&self, _fen: &str, _depth: u8) -> Result<i32, OracleError> {
        Ok(20)
    }
}

struct BrokenOracle;

impl MoveOracle for BrokenOracle {
    fn best_move(&self, _fen: &str, _depth: u8) -> Result<String, OracleError> {
        Err(OracleError::NoAnswer("best move"))
    }

    fn evaluate(&self, _fen: &str, _depth: u8) -> Result<i32, OracleError> {
        Err(OracleError::NoAnswer("score"))
    }
}

struct Game {
    session: Addr<GameSession>,
    white: (chess_server::session::Participant, Addr<Probe>),
    black: (chess_server::session::Participant, Addr<Probe>),
}

impl Game {
    async fn start(ctx: chess_server::session::SessionContext) -> Self {
        let white = participant(Some("a@x.io"));
        let black = participant(Some("b@x.io"));
        let session =
            GameSession::new("g1".to_string(), white.0.clone(), black.0.clone(), ctx, None)
                .start();
        settle().await;
        drain(&white.1).await;
        drain(&black.1).await;
        Self {
            session,
            white,
            black,
        }
    }

    async fn play(&self, color: Color, text: &str) {
        let connection = match color {
            Color::White => self.white.0.id,
            Color::Black => self.black.0.id,
        };
        self.session
            .send(SubmitMove {
                connection,
                mv: mv(text),
            })
            .await
            .unwrap();
    }
}

#[actix_rt::test]
async fn test_start_sends_colors_and_opponents() {
    let white = participant(Some("a@x.io"));
    let black = participant(None);
    let _session = GameSession::new(
        "g1".to_string(),
        white.0.clone(),
        black.0.clone(),
        context(settings(60, 1000), None),
        None,
    )
    .start();
    settle().await;

    assert_eq!(
        drain(&white.1).await,
        vec![ServerMessage::InitGame {
            is_your_turn: true,
            color: Color::White,
            game_id: "g1".to_string(),
            opponent: "Unknown Player".to_string(),
        }]
    );
    assert_eq!(
        drain(&black.1).await,
        vec![ServerMessage::InitGame {
            is_your_turn: false,
            color: Color::Black,
            game_id: "g1".to_string(),
            opponent: "a@x.io".to_string(),
        }]
    );
}

#[actix_rt::test]
async fn test_out_of_turn_and_illegal_moves_are_silent() {
    let game = Game::start(context(settings(60, 1000), None)).await;

    game.play(Color::Black, "e7e5").await;
    game.play(Color::White, "e2e5").await;
    settle().await;
    assert!(drain(&game.white.1).await.is_empty());
    assert!(drain(&game.black.1).await.is_empty());

    let status = game.session.send(SessionStatus).await.unwrap();
    assert_eq!(status.move_count, 0);
    assert_eq!(status.side_to_move, Color::White);
    assert_eq!(status.state, SessionState::Active);
}

#[actix_rt::test]
async fn test_accepted_move_is_broadcast_with_turn_owner() {
    let game = Game::start(context(settings(60, 1000), None)).await;

    game.play(Color::White, "e2e4").await;
    settle().await;

    assert_eq!(
        drain(&game.white.1).await,
        vec![ServerMessage::Move {
            is_your_turn: false,
            mv: mv("e2e4"),
        }]
    );
    assert_eq!(
        drain(&game.black.1).await,
        vec![ServerMessage::Move {
            is_your_turn: true,
            mv: mv("e2e4"),
        }]
    );

    let status = game.session.send(SessionStatus).await.unwrap();
    assert_eq!(status.move_count, 1);
    assert_eq!(status.side_to_move, Color::Black);
    assert_eq!(status.time_left, 60);
}

#[actix_rt::test]
async fn test_capture_is_announced_to_both() {
    let game = Game::start(context(settings(60, 1000), None)).await;
    game.play(Color::White, "e2e4").await;
    game.play(Color::Black, "d7d5").await;
    game.play(Color::White, "e4d5").await;
    settle().await;

    for probe in [&game.white.1, &game.black.1] {
        let captures: Vec<_> = drain(probe)
            .await
            .into_iter()
            .filter_map(|m| match m {
                ServerMessage::PieceCaptured(capture) => Some(capture),
                _ => None,
            })
            .collect();
        assert_eq!(captures.len(), 1);
        assert_eq!(captures[0].message, "a@x.io captured Black Pawn!");
        assert_eq!(captures[0].mv, "e4d5");
    }
}

#[actix_rt::test]
async fn test_resign_out_of_turn_credits_opponent() {
    let game = Game::start(context(settings(60, 1000), None)).await;

    // White to move, Black resigns.
    game.session
        .send(Resign {
            connection: game.black.0.id,
        })
        .await
        .unwrap();
    settle().await;

    assert_eq!(
        drain(&game.white.1).await,
        vec![ServerMessage::GameOver {
            winner: "white".to_string(),
            msg: "Opponent resigned".to_string(),
        }]
    );
    assert_eq!(
        drain(&game.black.1).await,
        vec![ServerMessage::GameOver {
            winner: "white".to_string(),
            msg: "You resigned".to_string(),
        }]
    );

    // The session is gone; later moves reach nobody.
    game.session.do_send(SubmitMove {
        connection: game.white.0.id,
        mv: mv("e2e4"),
    });
    settle().await;
    assert!(drain(&game.white.1).await.is_empty());
}

#[actix_rt::test]
async fn test_clock_expiry_side_to_move_loses() {
    let game = Game::start(context(settings(3, 40), None)).await;
    game.play(Color::White, "e2e4").await;

    actix_rt::time::sleep(std::time::Duration::from_millis(300)).await;

    let white = drain(&game.white.1).await;
    let black = drain(&game.black.1).await;
    assert_eq!(game_overs(&white), 1);
    assert_eq!(game_overs(&black), 1);
    assert_eq!(
        black.last(),
        Some(&ServerMessage::GameOver {
            winner: "white".to_string(),
            msg: "You ran out of time".to_string(),
        })
    );
}

#[actix_rt::test]
async fn test_resign_and_clock_race_yields_one_game_over() {
    let white = participant(Some("a@x.io"));
    let black = participant(Some("b@x.io"));
    let session = GameSession::new(
        "g1".to_string(),
        white.0.clone(),
        black.0.clone(),
        context(settings(1, 5), None),
        None,
    )
    .start();
    // The clock may fire before or after the resignation lands.
    session.do_send(Resign {
        connection: white.0.id,
    });
    actix_rt::time::sleep(std::time::Duration::from_millis(100)).await;

    assert_eq!(game_overs(&drain(&white.1).await), 1);
    assert_eq!(game_overs(&drain(&black.1).await), 1);
}

#[actix_rt::test]
async fn test_mating_move_on_a_short_clock_yields_one_game_over() {
    let white = participant(Some("a@x.io"));
    let black = participant(Some("b@x.io"));
    let session = GameSession::new(
        "g1".to_string(),
        white.0.clone(),
        black.0.clone(),
        context(settings(4, 10), None),
        None,
    )
    .start();

    for (seat, text) in [
        (&white, "e2e4"),
        (&black, "e7e5"),
        (&white, "f1c4"),
        (&black, "b8c6"),
        (&white, "d1h5"),
        (&black, "g8f6"),
        (&white, "h5f7"),
    ] {
        session
            .send(SubmitMove {
                connection: seat.0.id,
                mv: mv(text),
            })
            .await
            .unwrap();
    }
    // Well past the turn length, so a surviving clock would have fired.
    actix_rt::time::sleep(std::time::Duration::from_millis(150)).await;

    let white_seen = drain(&white.1).await;
    let black_seen = drain(&black.1).await;
    assert_eq!(game_overs(&white_seen), 1);
    assert_eq!(game_overs(&black_seen), 1);
    assert_eq!(
        white_seen.last(),
        Some(&ServerMessage::GameOver {
            winner: "white".to_string(),
            msg: "Checkmate! You win".to_string(),
        })
    );
    assert_eq!(
        black_seen.last(),
        Some(&ServerMessage::GameOver {
            winner: "white".to_string(),
            msg: "Checkmate. You lose".to_string(),
        })
    );
}

#[actix_rt::test]
async fn test_checkmate_ends_game_once_and_updates_ratings() {
    let ctx = context(settings(60, 1000), None);
    let ratings = Arc::clone(&ctx.ratings);
    let game = Game::start(ctx).await;

    for (color, text) in [
        (Color::White, "e2e4"),
        (Color::Black, "e7e5"),
        (Color::White, "f1c4"),
        (Color::Black, "b8c6"),
        (Color::White, "d1h5"),
        (Color::Black, "g8f6"),
        (Color::White, "h5f7"),
    ] {
        game.play(color, text).await;
    }
    settle().await;

    let white = drain(&game.white.1).await;
    let black = drain(&game.black.1).await;
    assert_eq!(game_overs(&white), 1);
    assert_eq!(game_overs(&black), 1);
    assert_eq!(
        kinds(&white)[white.len() - 3..],
        ["move", "piece_captured", "game_over"]
    );
    assert_eq!(
        white.last(),
        Some(&ServerMessage::GameOver {
            winner: "white".to_string(),
            msg: "Checkmate! You win".to_string(),
        })
    );

    let winner = ratings.store().load("a@x.io");
    let loser = ratings.store().load("b@x.io");
    assert_eq!((winner.elo, winner.wins, winner.current_streak), (1216, 1, 1));
    assert_eq!((loser.elo, loser.losses, loser.current_streak), (1184, 1, -1));
    assert_eq!(winner.game_history, vec!["g1"]);
}

#[actix_rt::test]
async fn test_chat_is_broadcast_and_empty_lines_dropped() {
    let game = Game::start(context(settings(60, 1000), None)).await;
    game.session.do_send(PostChat {
        connection: game.black.0.id,
        message: "   ".to_string(),
    });
    game.session.do_send(PostChat {
        connection: game.black.0.id,
        message: "good luck".to_string(),
    });
    settle().await;

    for probe in [&game.white.1, &game.black.1] {
        let received = drain(probe).await;
        assert_eq!(received.len(), 1);
        match &received[0] {
            ServerMessage::ChatMessage(line) => {
                assert_eq!(line.from, "b@x.io");
                assert_eq!(line.message, "good luck");
                assert_eq!(line.game_id, "g1");
                assert!(chrono::DateTime::parse_from_rfc3339(&line.timestamp).is_ok());
            }
            other => panic!("unexpected message {:?}", other),
        }
    }
    let status = game.session.send(SessionStatus).await.unwrap();
    assert_eq!(status.chat_lines, 1);
}

#[actix_rt::test]
async fn test_hint_without_oracle_falls_back() {
    let game = Game::start(context(settings(60, 1000), None)).await;
    game.session.do_send(RequestHint {
        connection: game.white.0.id,
    });
    settle().await;

    match drain(&game.white.1).await.as_slice() {
        [ServerMessage::HintResponse { best_move, hint }] => {
            assert_eq!(best_move, "e2e4");
            assert!(hint.contains("not available"));
        }
        other => panic!("unexpected messages {:?}", other),
    }
    assert!(drain(&game.black.1).await.is_empty());
}

#[actix_rt::test]
async fn test_hint_from_oracle_names_the_piece() {
    let game = Game::start(context(settings(60, 1000), Some(Arc::new(FixedOracle)))).await;
    game.session.do_send(RequestHint {
        connection: game.white.0.id,
    });
    settle().await;

    assert_eq!(
        drain(&game.white.1).await,
        vec![ServerMessage::HintResponse {
            best_move: "g1f3".to_string(),
            hint: "Move your knight from g1 to f3. This is the strongest move in this position."
                .to_string(),
        }]
    );
}

#[actix_rt::test]
async fn test_failing_oracle_still_answers_hints() {
    let game = Game::start(context(settings(60, 1000), Some(Arc::new(BrokenOracle)))).await;
    game.session.do_send(RequestHint {
        connection: game.black.0.id,
    });
    settle().await;

    match drain(&game.black.1).await.as_slice() {
        [ServerMessage::HintResponse { best_move, .. }] => assert_eq!(best_move, "e2e4"),
        other => panic!("unexpected messages {:?}", other),
    }
}

#[actix_rt::test]
async fn test_mover_gets_move_analysis_and_both_get_game_analysis() {
    let game = Game::start(context(settings(60, 1000), Some(Arc::new(FixedOracle)))).await;
    game.play(Color::White, "g1f3").await;
    settle().await;

    let white = drain(&game.white.1).await;
    let analysis = white.iter().find_map(|m| match m {
        ServerMessage::MoveAnalysis(a) => Some(a.clone()),
        _ => None,
    });
    let analysis = analysis.expect("mover should get an analysis");
    assert_eq!(analysis.mv, "g1f3");
    assert_eq!(analysis.classification, Classification::Excellent);
    assert!(!kinds(&drain(&game.black.1).await).contains(&"move_analysis"));

    game.session.do_send(Resign {
        connection: game.black.0.id,
    });
    settle().await;
    for probe in [&game.white.1, &game.black.1] {
        let received = drain(probe).await;
        let summary = received.iter().find_map(|m| match m {
            ServerMessage::GameAnalysis(summary) => Some(summary.clone()),
            _ => None,
        });
        let summary = summary.expect("both players get the game analysis");
        assert_eq!(summary.moves.len(), 1);
        assert_eq!(summary.excellent, 1);
    }
}
