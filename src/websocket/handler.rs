use actix::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{info, warn};
use serde::Deserialize;
use uuid::Uuid;

use crate::lobby::{ClientEvent, Connect, Disconnect, Lobby};
use crate::models::{AppState, ClientMessage, ServerMessage};
use crate::session::ConnectionId;

/// WebSocket actor for one player connection
pub struct PlayerSocket {
    pub id: ConnectionId,
    pub identity: Option<String>,
    pub lobby: Addr<Lobby>,
}

impl PlayerSocket {
    pub fn new(identity: Option<String>, lobby: Addr<Lobby>) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity,
            lobby,
        }
    }
}

impl Actor for PlayerSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        // Register the connection with the lobby
        self.lobby.do_send(Connect {
            id: self.id,
            identity: self.identity.clone(),
            addr: ctx.address().recipient(),
        });
        info!(
            "WebSocket connection started: {} ({})",
            self.id,
            self.identity.as_deref().unwrap_or("anonymous")
        );
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        self.lobby.do_send(Disconnect { id: self.id });
        info!("WebSocket connection closed: {}", self.id);
        Running::Stop
    }
}

impl Handler<ServerMessage> for PlayerSocket {
    type Result = ();

    fn handle(&mut self, msg: ServerMessage, ctx: &mut Self::Context) {
        match serde_json::to_string(&msg) {
            Ok(text) => ctx.text(text),
            Err(e) => warn!("Failed to serialize {} for {}: {}", msg.kind(), self.id, e),
        }
    }
}

// WebSocket message handler
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for PlayerSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Text(text)) => match ClientMessage::parse(&text) {
                Ok(message) => {
                    self.lobby.do_send(ClientEvent {
                        id: self.id,
                        message,
                    });
                }
                // Malformed frames get no reply.
                Err(e) => warn!("Dropping frame from {}: {}", self.id, e),
            },
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            _ => {
                ctx.stop();
            }
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct ConnectParams {
    /// Stable player identity, usually an email.
    pub email: Option<String>,
}

/// WebSocket connection handler
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    params: web::Query<ConnectParams>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let identity = params
        .into_inner()
        .email
        .map(|email| email.trim().to_string())
        .filter(|email| !email.is_empty());

    let socket = PlayerSocket::new(identity, app_state.lobby.clone());
    let resp = ws::start(socket, &req, stream)?;
    info!("WebSocket upgrade accepted from {:?}", req.peer_addr());
    Ok(resp)
}
