//! The registry and matchmaker.
//!
//! [`Lobby`] is a single actor holding every connection, the identity map,
//! the open-matchmaking slot and the running games. It only does
//! bookkeeping and forwarding; gameplay happens inside each
//! [`GameSession`](crate::session::GameSession).

mod handlers;

use std::collections::HashMap;

use actix::prelude::*;
use log::{info, warn};
use serde::Serialize;

use crate::models::messages::{ClientMessage, ServerMessage};
use crate::session::{ConnectionId, GameSession, Participant, SessionContext};

/// A new websocket connection.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    pub id: ConnectionId,
    pub identity: Option<String>,
    pub addr: Recipient<ServerMessage>,
}

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub id: ConnectionId,
}

/// A decoded frame from a connection.
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct ClientEvent {
    pub id: ConnectionId,
    pub message: ClientMessage,
}

#[derive(Message, Debug, Clone, Copy)]
#[rtype(result = "LobbyStats")]
pub struct LobbyStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyStats {
    pub connections: usize,
    pub waiting: bool,
    pub open_games: usize,
    pub invited_games: usize,
}

struct Connection {
    identity: Option<String>,
    addr: Recipient<ServerMessage>,
}

/// A running game as seen by the registry.
struct ActiveGame {
    game_id: String,
    players: [ConnectionId; 2],
    addr: Addr<GameSession>,
}

impl ActiveGame {
    fn seats(&self, id: ConnectionId) -> bool {
        self.players.contains(&id)
    }
}

pub struct Lobby {
    connections: HashMap<ConnectionId, Connection>,
    identities: HashMap<String, ConnectionId>,
    pending: Option<ConnectionId>,
    /// Games paired through open matchmaking.
    open_games: Vec<ActiveGame>,
    /// Games created by accepting an invitation.
    invited_games: Vec<ActiveGame>,
    context: SessionContext,
}

impl Lobby {
    pub fn new(context: SessionContext) -> Self {
        Self {
            connections: HashMap::new(),
            identities: HashMap::new(),
            pending: None,
            open_games: Vec::new(),
            invited_games: Vec::new(),
            context,
        }
    }

    /// The game `id` is seated in. Open games are searched first.
    fn game_of(&self, id: ConnectionId) -> Option<&ActiveGame> {
        self.open_games
            .iter()
            .chain(self.invited_games.iter())
            .find(|game| game.seats(id))
    }

    fn is_seated(&self, id: ConnectionId) -> bool {
        self.game_of(id).is_some()
    }

    fn participant(&self, id: ConnectionId) -> Option<Participant> {
        self.connections.get(&id).map(|conn| Participant {
            id,
            identity: conn.identity.clone(),
            addr: conn.addr.clone(),
        })
    }

    /// Start a session with `white` moving first.
    fn start_game(
        &self,
        game_id: String,
        white: ConnectionId,
        black: ConnectionId,
        ctx: &mut Context<Self>,
    ) -> Option<ActiveGame> {
        let (Some(white_seat), Some(black_seat)) = (self.participant(white), self.participant(black))
        else {
            warn!("Game {} not started: a player is no longer connected", game_id);
            return None;
        };
        let session = GameSession::new(
            game_id.clone(),
            white_seat,
            black_seat,
            self.context.clone(),
            Some(ctx.address().recipient()),
        );
        info!("Starting game {}", game_id);
        Some(ActiveGame {
            game_id,
            players: [white, black],
            addr: session.start(),
        })
    }

    fn game_id_in_use(&self, game_id: &str) -> bool {
        self.open_games
            .iter()
            .chain(self.invited_games.iter())
            .any(|game| game.game_id == game_id)
    }

    /// Drop the registry entry of `session`. Game ids come from clients, so
    /// the session address is the key.
    fn remove_game(&mut self, session: &Addr<GameSession>) -> bool {
        let before = self.open_games.len() + self.invited_games.len();
        self.open_games.retain(|game| game.addr != *session);
        self.invited_games.retain(|game| game.addr != *session);
        before != self.open_games.len() + self.invited_games.len()
    }

    fn stats(&self) -> LobbyStats {
        LobbyStats {
            connections: self.connections.len(),
            waiting: self.pending.is_some(),
            open_games: self.open_games.len(),
            invited_games: self.invited_games.len(),
        }
    }
}

impl Actor for Lobby {
    type Context = Context<Self>;

    fn started(&mut self, _: &mut Self::Context) {
        info!("Lobby started");
    }
}
