#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use actix::prelude::*;
use uuid::Uuid;

use chess_server::config::GameSettings;
use chess_server::models::ServerMessage;
use chess_server::oracle::MoveOracle;
use chess_server::rating::{MemoryRatingStore, RatingUpdater};
use chess_server::session::{Participant, SessionContext};

/// Stands in for a websocket connection and records what it is sent.
#[derive(Default)]
pub struct Probe {
    received: Vec<ServerMessage>,
}

impl Actor for Probe {
    type Context = Context<Self>;
}

impl Handler<ServerMessage> for Probe {
    type Result = ();

    fn handle(&mut self, msg: ServerMessage, _: &mut Self::Context) {
        self.received.push(msg);
    }
}

/// Take everything received so far.
#[derive(Message)]
#[rtype(result = "Vec<ServerMessage>")]
pub struct Drain;

impl Handler<Drain> for Probe {
    type Result = MessageResult<Drain>;

    fn handle(&mut self, _: Drain, _: &mut Self::Context) -> Self::Result {
        MessageResult(std::mem::take(&mut self.received))
    }
}

pub async fn drain(probe: &Addr<Probe>) -> Vec<ServerMessage> {
    probe.send(Drain).await.unwrap()
}

/// Give spawned futures and mailboxes a chance to run.
pub async fn settle() {
    actix_rt::time::sleep(Duration::from_millis(50)).await;
}

pub fn settings(turn_seconds: u32, tick_millis: u64) -> GameSettings {
    GameSettings {
        turn_seconds,
        tick_millis,
        ..GameSettings::default()
    }
}

pub fn context(settings: GameSettings, oracle: Option<Arc<dyn MoveOracle>>) -> SessionContext {
    SessionContext {
        settings,
        ratings: Arc::new(RatingUpdater::new(Arc::new(MemoryRatingStore::default()))),
        oracle,
    }
}

pub fn participant(identity: Option<&str>) -> (Participant, Addr<Probe>) {
    let probe = Probe::default().start();
    let seat = Participant {
        id: Uuid::new_v4(),
        identity: identity.map(str::to_string),
        addr: probe.clone().recipient(),
    };
    (seat, probe)
}

pub fn kinds(messages: &[ServerMessage]) -> Vec<&'static str> {
    messages.iter().map(ServerMessage::kind).collect()
}

pub fn game_overs(messages: &[ServerMessage]) -> usize {
    messages
        .iter()
        .filter(|m| matches!(m, ServerMessage::GameOver { .. }))
        .count()
}
