use actix::{Addr, Message};
use serde::Serialize;

use super::{ConnectionId, GameSession, SessionState};
use crate::game::{Color, GameEnd, Move};

/// A move from one of the seated players.
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct SubmitMove {
    pub connection: ConnectionId,
    pub mv: Move,
}

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct Resign {
    pub connection: ConnectionId,
}

/// The player's connection went away; the opponent wins.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct Abandon {
    pub connection: ConnectionId,
}

#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct PostChat {
    pub connection: ConnectionId,
    pub message: String,
}

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct RequestHint {
    pub connection: ConnectionId,
}

/// Sent by a session to its registry once it is over.
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct SessionEnded {
    pub game_id: String,
    pub session: Addr<GameSession>,
}

/// Query for a point-in-time view of a session.
#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "SessionSnapshot")]
pub struct SessionStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub game_id: String,
    pub state: SessionState,
    pub move_count: u32,
    pub time_left: u32,
    pub side_to_move: Color,
    pub fen: String,
    pub chat_lines: usize,
    pub result: Option<GameEnd>,
}
