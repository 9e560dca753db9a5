use actix::prelude::*;
use log::{debug, info, warn};
use uuid::Uuid;

use super::{ClientEvent, Connect, Connection, Disconnect, Lobby, LobbyStatus};
use crate::models::messages::{ClientMessage, GameRequest, ServerMessage};
use crate::session::{
    Abandon, ConnectionId, GameSession, PostChat, RequestHint, Resign, SessionEnded, SubmitMove,
};

impl Handler<Connect> for Lobby {
    type Result = ();

    fn handle(&mut self, msg: Connect, _: &mut Self::Context) {
        if let Some(identity) = &msg.identity {
            if let Some(old) = self.identities.insert(identity.clone(), msg.id) {
                if old != msg.id {
                    info!("{} reconnected, evicting connection {}", identity, old);
                    self.connections.remove(&old);
                    if self.pending == Some(old) {
                        self.pending = None;
                    }
                }
            }
        }
        self.connections.insert(
            msg.id,
            Connection {
                identity: msg.identity,
                addr: msg.addr,
            },
        );
        info!("Connection {} registered", msg.id);
        info!("Total connections: {}", self.connections.len());
    }
}

impl Handler<Disconnect> for Lobby {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _: &mut Self::Context) {
        if let Some(conn) = self.connections.remove(&msg.id) {
            if let Some(identity) = conn.identity {
                if self.identities.get(&identity) == Some(&msg.id) {
                    self.identities.remove(&identity);
                }
            }
        }
        if self.pending == Some(msg.id) {
            info!("Connection {} left the matchmaking queue", msg.id);
            self.pending = None;
        }
        if let Some(game) = self.game_of(msg.id) {
            let (game_id, session) = (game.game_id.clone(), game.addr.clone());
            session.do_send(Abandon { connection: msg.id });
            self.remove_game(&session);
            info!("Game {} torn down after disconnect of {}", game_id, msg.id);
        }
        info!("Connection {} closed", msg.id);
        info!("Total connections: {}", self.connections.len());
    }
}

impl Handler<ClientEvent> for Lobby {
    type Result = ();

    fn handle(&mut self, msg: ClientEvent, ctx: &mut Self::Context) {
        let ClientEvent { id, message } = msg;
        match message {
            ClientMessage::InitGame => self.handle_init_game(id, ctx),
            ClientMessage::SendGameRequest(request) => self.handle_send_request(request),
            ClientMessage::AcceptGameRequest(request) => {
                self.handle_accept_request(id, request, ctx)
            }
            ClientMessage::Move(mv) => self.route(id, "move", |addr| {
                addr.do_send(SubmitMove { connection: id, mv })
            }),
            ClientMessage::Resign => {
                self.route(id, "resign", |addr| addr.do_send(Resign { connection: id }))
            }
            ClientMessage::ChatMessage(chat) => self.route(id, "chat_message", |addr| {
                addr.do_send(PostChat {
                    connection: id,
                    message: chat.message,
                })
            }),
            ClientMessage::RequestHint => self.route(id, "request_hint", |addr| {
                addr.do_send(RequestHint { connection: id })
            }),
        }
    }
}

impl Handler<SessionEnded> for Lobby {
    type Result = ();

    fn handle(&mut self, msg: SessionEnded, _: &mut Self::Context) {
        if self.remove_game(&msg.session) {
            info!("Game {} removed", msg.game_id);
        }
    }
}

impl Handler<LobbyStatus> for Lobby {
    type Result = MessageResult<LobbyStatus>;

    fn handle(&mut self, _: LobbyStatus, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.stats())
    }
}

impl Lobby {
    fn route(
        &self,
        id: ConnectionId,
        kind: &str,
        forward: impl FnOnce(&Addr<GameSession>),
    ) {
        match self.game_of(id) {
            Some(game) => forward(&game.addr),
            None => debug!("No game for connection {}, {} ignored", id, kind),
        }
    }

    fn handle_init_game(&mut self, id: ConnectionId, ctx: &mut Context<Self>) {
        if !self.connections.contains_key(&id) {
            warn!("init_game from unregistered connection {}", id);
            return;
        }
        if self.is_seated(id) {
            warn!("Connection {} is already playing, init_game ignored", id);
            return;
        }
        match self.pending {
            Some(waiting) if waiting == id => {
                info!("Connection {} left the matchmaking queue", id);
                self.pending = None;
            }
            Some(waiting) => {
                self.pending = None;
                let game_id = Uuid::new_v4().to_string();
                if let Some(game) = self.start_game(game_id, waiting, id, ctx) {
                    self.open_games.push(game);
                }
            }
            None => {
                info!("Connection {} is waiting for an opponent", id);
                self.pending = Some(id);
            }
        }
    }

    fn handle_send_request(&self, request: GameRequest) {
        let target = self
            .identities
            .get(&request.to)
            .and_then(|id| self.connections.get(id));
        match target {
            Some(conn) => {
                info!(
                    "Forwarding game request {} from {} to {}",
                    request.game_id, request.from, request.to
                );
                conn.addr.do_send(ServerMessage::GameRequest {
                    from: request.from,
                    game_id: request.game_id,
                });
            }
            None => debug!("Game request for {} not delivered: not connected", request.to),
        }
    }

    /// `from` accepts the invitation sent by `to`; the inviter plays White.
    fn handle_accept_request(
        &mut self,
        id: ConnectionId,
        request: GameRequest,
        ctx: &mut Context<Self>,
    ) {
        let (Some(&inviter), Some(&accepter)) = (
            self.identities.get(&request.to),
            self.identities.get(&request.from),
        ) else {
            warn!(
                "Game {} not started: {} or {} is not connected",
                request.game_id, request.to, request.from
            );
            return;
        };
        if inviter == accepter {
            warn!("Game {} not started: {} invited themselves", request.game_id, request.to);
            return;
        }
        if accepter != id {
            debug!("Connection {} accepted on behalf of {}", id, request.from);
        }
        if self.is_seated(inviter) || self.is_seated(accepter) {
            warn!("Game {} not started: a player is already in a game", request.game_id);
            return;
        }
        if self.game_id_in_use(&request.game_id) {
            warn!("Game {} already exists", request.game_id);
            return;
        }
        if self.pending == Some(inviter) || self.pending == Some(accepter) {
            self.pending = None;
        }
        if let Some(game) = self.start_game(request.game_id, inviter, accepter, ctx) {
            self.invited_games.push(game);
        }
    }
}
