use actix::Message;
use serde::ser::{Error as _, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ProtocolError;
use crate::game::{Color, Move};
use crate::oracle::{GameAnalysis, MoveAnalysis};

/// Invitation payload of `send_game_request` / `accept_game_request`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameRequest {
    pub to: String,
    pub from: String,
    pub game_id: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload {
    #[serde(default)]
    pub to: Option<String>,
    pub message: String,
    #[serde(default)]
    pub game_id: Option<String>,
}

/// Message sent from client to server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Enter open matchmaking, or leave it if already waiting.
    InitGame,
    SendGameRequest(GameRequest),
    AcceptGameRequest(GameRequest),
    Move(Move),
    Resign,
    ChatMessage(ChatPayload),
    RequestHint,
}

#[derive(Deserialize)]
struct InboundFrame {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

impl ClientMessage {
    /// Decode one text frame of the form `{"type": ..., "payload": ...}`.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let frame: InboundFrame = serde_json::from_str(text)?;
        let message = match frame.kind.as_str() {
            "init_game" => Self::InitGame,
            "send_game_request" => Self::SendGameRequest(serde_json::from_value(frame.payload)?),
            "accept_game_request" => {
                Self::AcceptGameRequest(serde_json::from_value(frame.payload)?)
            }
            // Clients send either `{"move": {...}}` or the move itself.
            "move" => Self::Move(match frame.payload.get("move") {
                Some(inner) => Move::deserialize(inner)?,
                None => serde_json::from_value(frame.payload)?,
            }),
            "resign" => Self::Resign,
            "chat_message" => Self::ChatMessage(serde_json::from_value(frame.payload)?),
            "request_hint" => Self::RequestHint,
            other => return Err(ProtocolError::UnknownType(other.to_string())),
        };
        Ok(message)
    }
}

/// A chat line as stored in the session log and broadcast to players.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatLine {
    pub from: String,
    pub message: String,
    pub game_id: String,
    /// RFC 3339.
    pub timestamp: String,
}

/// Capture notice sent to both players.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub capturer: String,
    /// Display name, e.g. `Queen`.
    pub piece: String,
    /// `White` or `Black`.
    pub color: String,
    #[serde(rename = "move")]
    pub mv: String,
    pub message: String,
}

/// Message sent from server to client
#[derive(Message, Debug, Clone, PartialEq)]
#[rtype(result = "()")]
pub enum ServerMessage {
    InitGame {
        is_your_turn: bool,
        color: Color,
        game_id: String,
        opponent: String,
    },
    Move {
        is_your_turn: bool,
        mv: Move,
    },
    GameOver {
        winner: String,
        msg: String,
    },
    ChatMessage(ChatLine),
    HintResponse {
        best_move: String,
        hint: String,
    },
    MoveAnalysis(MoveAnalysis),
    GameAnalysis(GameAnalysis),
    /// Real-time notice of an invitation.
    GameRequest {
        from: String,
        game_id: String,
    },
    PieceCaptured(Capture),
}

#[derive(Serialize)]
struct OutboundFrame<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    #[serde(rename = "isYourTurn", skip_serializing_if = "Option::is_none")]
    is_your_turn: Option<bool>,
    payload: Value,
}

impl ServerMessage {
    /// The `type` tag on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InitGame { .. } => "init_game",
            Self::Move { .. } => "move",
            Self::GameOver { .. } => "game_over",
            Self::ChatMessage(_) => "chat_message",
            Self::HintResponse { .. } => "hint_response",
            Self::MoveAnalysis(_) => "move_analysis",
            Self::GameAnalysis(_) => "game_analysis",
            Self::GameRequest { .. } => "send_game_request",
            Self::PieceCaptured(_) => "piece_captured",
        }
    }

    fn frame(&self) -> Result<OutboundFrame<'static>, serde_json::Error> {
        let (is_your_turn, payload) = match self {
            Self::InitGame {
                is_your_turn,
                color,
                game_id,
                opponent,
            } => (
                Some(*is_your_turn),
                json!({ "color": color, "gameId": game_id, "opponent": opponent }),
            ),
            Self::Move { is_your_turn, mv } => (Some(*is_your_turn), serde_json::to_value(mv)?),
            Self::GameOver { winner, msg } => (None, json!({ "winner": winner, "msg": msg })),
            Self::ChatMessage(line) => (None, serde_json::to_value(line)?),
            Self::HintResponse { best_move, hint } => {
                (None, json!({ "bestMove": best_move, "hint": hint }))
            }
            Self::MoveAnalysis(analysis) => (None, serde_json::to_value(analysis)?),
            Self::GameAnalysis(analysis) => {
                let mut payload = serde_json::to_value(analysis)?;
                if let Value::Object(fields) = &mut payload {
                    let total = analysis.moves.len();
                    fields.insert("totalMoves".to_string(), json!(total));
                    fields.insert("gameLength".to_string(), json!(total / 2));
                }
                (None, payload)
            }
            Self::GameRequest { from, game_id } => {
                (None, json!({ "from": from, "gameId": game_id }))
            }
            Self::PieceCaptured(capture) => (None, serde_json::to_value(capture)?),
        };
        Ok(OutboundFrame {
            kind: self.kind(),
            is_your_turn,
            payload,
        })
    }
}

impl Serialize for ServerMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.frame()
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}
