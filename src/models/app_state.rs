use actix::Addr;

use crate::lobby::Lobby;

/// Application state shared between connections
pub struct AppState {
    pub lobby: Addr<Lobby>,
}

impl AppState {
    pub fn new(lobby: Addr<Lobby>) -> Self {
        Self { lobby }
    }
}
