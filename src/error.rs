use std::path::PathBuf;

use crate::game::types::{PieceKind, Square};

/// Reasons the engine refuses a move. None of these reach the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("malformed square: {0:?}")]
    MalformedSquare(String),

    #[error("unknown promotion piece: {0:?}")]
    UnknownPromotion(String),

    #[error("game is already over")]
    GameOver,

    #[error("no piece on {0}")]
    EmptySquare(Square),

    #[error("piece on {0} does not belong to the side to move")]
    WrongSide(Square),

    #[error("{0} is occupied by a friendly piece")]
    OwnPieceOnTarget(Square),

    #[error("{kind:?} cannot move from {from} to {to}")]
    IllegalShape {
        kind: PieceKind,
        from: Square,
        to: Square,
    },

    #[error("path from {from} to {to} is blocked")]
    PathBlocked { from: Square, to: Square },

    #[error("move would leave the king in check")]
    KingExposed,
}

/// Errors raised while decoding an inbound frame.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid message format: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown message type: {0}")]
    UnknownType(String),
}

/// Errors from the external move-evaluation oracle.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("oracle not available at {0}")]
    Unavailable(PathBuf),

    #[error("oracle I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("oracle returned no {0}")]
    NoAnswer(&'static str),

    #[error("oracle rejected position {0:?}")]
    BadPosition(String),

    #[error("could not understand oracle output: {0}")]
    BadOutput(String),

    #[error("blocking pool dropped the oracle call")]
    Cancelled,
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
