//! One running game.
//!
//! A [`GameSession`] actor owns a board engine, both seated players and the
//! turn clock. Moves, resignations, chat, hints and clock ticks all arrive in
//! its mailbox, so they are applied one at a time and only the first terminal
//! transition takes effect.

mod handlers;
pub mod messages;

use std::sync::Arc;
use std::time::Duration;

use actix::prelude::*;
use actix_web::web;
use futures::future::join_all;
use log::{debug, info, warn};
use serde::Serialize;
use uuid::Uuid;

use crate::config::GameSettings;
use crate::game::utils::{game_over_text, winner_label};
use crate::game::{BoardEngine, Color, EndReason, GameEnd, Move, Outcome, Piece};
use crate::models::messages::{Capture, ChatLine, ServerMessage};
use crate::oracle::{analyze_move, off_thread, GameAnalysis, MoveOracle};
use crate::rating::RatingUpdater;

pub use messages::*;

/// Identifies one websocket connection.
pub type ConnectionId = Uuid;

/// Shown to a player whose opponent has no known identity.
pub const UNKNOWN_PLAYER: &str = "Unknown Player";

/// One seat at the board.
#[derive(Clone)]
pub struct Participant {
    pub id: ConnectionId,
    pub identity: Option<String>,
    pub addr: Recipient<ServerMessage>,
}

impl Participant {
    pub fn label(&self) -> &str {
        self.identity.as_deref().unwrap_or(UNKNOWN_PLAYER)
    }

    fn send(&self, message: ServerMessage) {
        self.addr.do_send(message);
    }
}

/// Collaborators shared by every session.
#[derive(Clone)]
pub struct SessionContext {
    pub settings: GameSettings,
    pub ratings: Arc<RatingUpdater>,
    pub oracle: Option<Arc<dyn MoveOracle>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Initializing,
    Active,
    Terminal,
}

/// Positions around one accepted move, kept for post-game analysis.
#[derive(Debug, Clone)]
struct PlayedMove {
    fen_before: String,
    fen_after: String,
    uci: String,
}

pub struct GameSession {
    id: String,
    /// White first, then Black.
    players: [Participant; 2],
    engine: BoardEngine,
    state: SessionState,
    move_count: u32,
    time_left: u32,
    clock: Option<SpawnHandle>,
    chat: Vec<ChatLine>,
    played: Vec<PlayedMove>,
    context: SessionContext,
    lobby: Option<Recipient<SessionEnded>>,
}

impl GameSession {
    pub fn new(
        id: String,
        white: Participant,
        black: Participant,
        context: SessionContext,
        lobby: Option<Recipient<SessionEnded>>,
    ) -> Self {
        Self {
            id,
            players: [white, black],
            engine: BoardEngine::new(),
            state: SessionState::Initializing,
            move_count: 0,
            time_left: context.settings.turn_seconds,
            clock: None,
            chat: Vec::new(),
            played: Vec::new(),
            context,
            lobby,
        }
    }

    fn seat_of(&self, connection: ConnectionId) -> Option<usize> {
        self.players.iter().position(|p| p.id == connection)
    }

    fn color_of_seat(seat: usize) -> Color {
        if seat == 0 {
            Color::White
        } else {
            Color::Black
        }
    }

    fn player(&self, color: Color) -> &Participant {
        match color {
            Color::White => &self.players[0],
            Color::Black => &self.players[1],
        }
    }

    fn broadcast(&self, message: ServerMessage) {
        for player in &self.players {
            player.send(message.clone());
        }
    }

    fn restart_clock(&mut self, ctx: &mut Context<Self>) {
        if let Some(handle) = self.clock.take() {
            ctx.cancel_future(handle);
        }
        self.time_left = self.context.settings.turn_seconds;
        let tick = Duration::from_millis(self.context.settings.tick_millis);
        self.clock = Some(ctx.run_interval(tick, |act, ctx| act.tick(ctx)));
    }

    fn stop_clock(&mut self, ctx: &mut Context<Self>) {
        if let Some(handle) = self.clock.take() {
            ctx.cancel_future(handle);
        }
    }

    fn tick(&mut self, ctx: &mut Context<Self>) {
        if self.state != SessionState::Active {
            return;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            let loser = self.engine.side_to_move();
            info!("Game {}: {} ran out of time", self.id, loser);
            self.finish(GameEnd::won(loser.opponent(), EndReason::Timeout), ctx);
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            game_id: self.id.clone(),
            state: self.state,
            move_count: self.move_count,
            time_left: self.time_left,
            side_to_move: self.engine.side_to_move(),
            fen: self.engine.fen(),
            chat_lines: self.chat.len(),
            result: self.engine.result(),
        }
    }

    fn submit_move(&mut self, connection: ConnectionId, mv: Move, ctx: &mut Context<Self>) {
        if self.state != SessionState::Active {
            debug!("Game {}: move {} after the game ended", self.id, mv);
            return;
        }
        let expected = (self.move_count % 2) as usize;
        if self.players[expected].id != connection {
            debug!("Game {}: out-of-turn move {} dropped", self.id, mv);
            return;
        }

        let fen_before = self.engine.fen();
        let captured = self.engine.position().get(mv.to);
        if !self.engine.apply_move(&mv) {
            return;
        }
        self.move_count += 1;
        self.restart_clock(ctx);

        let applied = self.engine.history().last().copied().unwrap_or(mv);
        let fen_after = self.engine.fen();
        info!("Game {}: move {} ({})", self.id, self.move_count, applied);

        let next = self.engine.side_to_move();
        for (seat, player) in self.players.iter().enumerate() {
            player.send(ServerMessage::Move {
                is_your_turn: Self::color_of_seat(seat) == next,
                mv: applied,
            });
        }

        if let Some(piece) = captured {
            self.announce_capture(expected, piece, &applied);
        }

        let played = PlayedMove {
            fen_before,
            fen_after,
            uci: applied.to_string(),
        };
        self.spawn_move_analysis(expected, &played);
        self.played.push(played);

        if let Some(end) = self.engine.result() {
            self.finish(end, ctx);
        }
    }

    fn announce_capture(&self, seat: usize, piece: Piece, mv: &Move) {
        let capturer = self.players[seat].label().to_string();
        let color = match piece.color {
            Color::White => "White",
            Color::Black => "Black",
        };
        let name = piece.kind.name();
        self.broadcast(ServerMessage::PieceCaptured(Capture {
            message: format!("{} captured {} {}!", capturer, color, name),
            capturer,
            piece: name.to_string(),
            color: color.to_string(),
            mv: mv.to_string(),
        }));
    }

    fn spawn_move_analysis(&self, seat: usize, played: &PlayedMove) {
        let Some(oracle) = self.context.oracle.clone() else {
            return;
        };
        let mover = self.players[seat].addr.clone();
        let depth = self.context.settings.analysis_depth;
        let played = played.clone();
        actix::spawn(async move {
            let analysis = off_thread(move || {
                analyze_move(
                    oracle.as_ref(),
                    &played.fen_before,
                    &played.fen_after,
                    &played.uci,
                    depth,
                )
            })
            .await;
            match analysis {
                Ok(analysis) => mover.do_send(ServerMessage::MoveAnalysis(analysis)),
                Err(e) => warn!("Move analysis dropped: {}", e),
            }
        });
    }

    /// Move the session to `Terminal`. Only the first call has any effect.
    fn finish(&mut self, end: GameEnd, ctx: &mut Context<Self>) {
        if self.state == SessionState::Terminal {
            return;
        }
        self.state = SessionState::Terminal;
        self.stop_clock(ctx);
        info!(
            "Game {} over: {:?} by {:?} after {} moves",
            self.id, end.outcome, end.reason, self.move_count
        );

        let winner = winner_label(end.outcome);
        for color in [Color::White, Color::Black] {
            self.player(color).send(ServerMessage::GameOver {
                winner: winner.to_string(),
                msg: game_over_text(end, color),
            });
        }

        self.spawn_rating_update(end.outcome);
        self.spawn_game_analysis();

        if let Some(lobby) = &self.lobby {
            lobby.do_send(SessionEnded {
                game_id: self.id.clone(),
                session: ctx.address(),
            });
        }
        ctx.stop();
    }

    fn spawn_rating_update(&self, outcome: Outcome) {
        let (Some(white), Some(black)) = (
            self.players[0].identity.clone(),
            self.players[1].identity.clone(),
        ) else {
            debug!("Game {}: anonymous player, ratings unchanged", self.id);
            return;
        };
        if white == black {
            warn!("Game {}: {} played themselves, ratings unchanged", self.id, white);
            return;
        }
        let ratings = Arc::clone(&self.context.ratings);
        let game_id = self.id.clone();
        actix::spawn(async move {
            let result =
                web::block(move || ratings.record_game(&white, &black, outcome, &game_id)).await;
            if let Err(e) = result {
                warn!("Rating update dropped: {}", e);
            }
        });
    }

    fn spawn_game_analysis(&self) {
        let Some(oracle) = self.context.oracle.clone() else {
            return;
        };
        if self.played.is_empty() {
            return;
        }
        let played = self.played.clone();
        let recipients: Vec<_> = self.players.iter().map(|p| p.addr.clone()).collect();
        let depth = self.context.settings.analysis_depth;
        let game_id = self.id.clone();

        actix::spawn(async move {
            let jobs = played.into_iter().map(|m| {
                let oracle = Arc::clone(&oracle);
                off_thread(move || {
                    analyze_move(oracle.as_ref(), &m.fen_before, &m.fen_after, &m.uci, depth)
                })
            });
            let moves: Vec<_> = join_all(jobs)
                .await
                .into_iter()
                .filter_map(Result::ok)
                .collect();
            let summary = GameAnalysis::summarize(moves);
            info!(
                "Game {} analysed: accuracy {:.1}, {} blunders",
                game_id, summary.accuracy, summary.blunders
            );
            for addr in recipients {
                addr.do_send(ServerMessage::GameAnalysis(summary.clone()));
            }
        });
    }
}

impl Actor for GameSession {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(
            "Game {} started: {} (white) vs {} (black)",
            self.id,
            self.players[0].label(),
            self.players[1].label()
        );
        for (seat, player) in self.players.iter().enumerate() {
            let opponent = &self.players[1 - seat];
            player.send(ServerMessage::InitGame {
                is_your_turn: seat == 0,
                color: Self::color_of_seat(seat),
                game_id: self.id.clone(),
                opponent: opponent.label().to_string(),
            });
        }
        self.state = SessionState::Active;
        self.restart_clock(ctx);
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        debug!("Game {} actor stopped", self.id);
    }
}
