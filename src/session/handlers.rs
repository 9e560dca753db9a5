use actix::prelude::*;
use chrono::Utc;
use log::{debug, info, warn};

use super::messages::{
    Abandon, PostChat, RequestHint, Resign, SessionStatus, SubmitMove,
};
use super::{GameSession, SessionState};
use crate::game::utils::hint_text;
use crate::game::{EndReason, GameEnd};
use crate::models::messages::{ChatLine, ServerMessage};
use crate::oracle::{off_thread, Hint};

impl Handler<SubmitMove> for GameSession {
    type Result = ();

    fn handle(&mut self, msg: SubmitMove, ctx: &mut Self::Context) {
        self.submit_move(msg.connection, msg.mv, ctx);
    }
}

impl Handler<Resign> for GameSession {
    type Result = ();

    fn handle(&mut self, msg: Resign, ctx: &mut Self::Context) {
        let Some(seat) = self.seat_of(msg.connection) else {
            warn!("Game {}: resign from a non-player", self.id);
            return;
        };
        if self.state != SessionState::Active {
            return;
        }
        let resigned = Self::color_of_seat(seat);
        info!("Game {}: {} resigned", self.id, resigned);
        self.finish(GameEnd::won(resigned.opponent(), EndReason::Resignation), ctx);
    }
}

impl Handler<Abandon> for GameSession {
    type Result = ();

    fn handle(&mut self, msg: Abandon, ctx: &mut Self::Context) {
        let Some(seat) = self.seat_of(msg.connection) else {
            return;
        };
        if self.state != SessionState::Active {
            return;
        }
        let left = Self::color_of_seat(seat);
        info!("Game {}: {} disconnected", self.id, left);
        self.finish(GameEnd::won(left.opponent(), EndReason::Abandoned), ctx);
    }
}

impl Handler<PostChat> for GameSession {
    type Result = ();

    fn handle(&mut self, msg: PostChat, _: &mut Self::Context) {
        let Some(seat) = self.seat_of(msg.connection) else {
            return;
        };
        if msg.message.trim().is_empty() {
            debug!("Game {}: empty chat message ignored", self.id);
            return;
        }
        let line = ChatLine {
            from: self.players[seat].label().to_string(),
            message: msg.message,
            game_id: self.id.clone(),
            timestamp: Utc::now().to_rfc3339(),
        };
        self.chat.push(line.clone());
        self.broadcast(ServerMessage::ChatMessage(line));
    }
}

impl Handler<RequestHint> for GameSession {
    type Result = ();

    fn handle(&mut self, msg: RequestHint, _: &mut Self::Context) {
        let Some(seat) = self.seat_of(msg.connection) else {
            return;
        };
        let requester = self.players[seat].addr.clone();

        let Some(oracle) = self.context.oracle.clone() else {
            let hint = Hint::fallback(false);
            requester.do_send(ServerMessage::HintResponse {
                best_move: hint.best_move,
                hint: hint.hint,
            });
            return;
        };

        let fen = self.engine.fen();
        let position = self.engine.position().clone();
        let depth = self.context.settings.hint_depth;
        let game_id = self.id.clone();
        actix::spawn(async move {
            let best = off_thread(move || oracle.best_move(&fen, depth))
                .await
                .and_then(|answer| answer);
            let hint = match best {
                Ok(best) => Hint {
                    hint: hint_text(&position, &best),
                    best_move: best,
                },
                Err(e) => {
                    warn!("Game {}: oracle failed to suggest a move: {}", game_id, e);
                    Hint::fallback(true)
                }
            };
            requester.do_send(ServerMessage::HintResponse {
                best_move: hint.best_move,
                hint: hint.hint,
            });
        });
    }
}

impl Handler<SessionStatus> for GameSession {
    type Result = MessageResult<SessionStatus>;

    fn handle(&mut self, _: SessionStatus, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.snapshot())
    }
}
