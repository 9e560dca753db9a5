pub mod engine;
pub mod outcome;
pub mod rules;
pub mod types;
pub mod utils;

// Re-export important types
pub use engine::{BoardEngine, Position};
pub use outcome::{EndReason, GameEnd, Outcome};
pub use types::{Color, Move, Piece, PieceKind, Square};
