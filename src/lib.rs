//! Real-time core of a two-player chess server.
//!
//! Players connect over a websocket, get paired through open matchmaking or
//! a direct invitation, and play on a reduced-rules board engine with a
//! per-move clock. Finished games update ELO ratings and, when a move
//! oracle is configured, get hints and post-game analysis.

pub mod config;
pub mod error;
pub mod game;
pub mod lobby;
pub mod models;
pub mod oracle;
pub mod rating;
pub mod routes;
pub mod session;
pub mod websocket;
