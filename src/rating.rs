//! Rating updates after a finished game.
//!
//! The updater computes new ratings and counters; persistence belongs to a
//! [`RatingStore`] supplied by the caller.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use log::info;
use serde::{Deserialize, Serialize};

use crate::game::{Color, Outcome};

/// K-factor for ELO calculations.
pub const K_FACTOR: f64 = 32.0;

/// Rating given to players the store has never seen.
pub const STARTING_RATING: i32 = 1200;

/// Expected score of a player rated `rating` against `opponent`.
#[must_use]
pub fn expected_score(rating: i32, opponent: i32) -> f64 {
    1.0 / (1.0 + 10_f64.powf(f64::from(opponent - rating) / 400.0))
}

/// New ratings for the first mover (`white`) and second mover (`black`).
#[must_use]
pub fn apply_result(white: i32, black: i32, outcome: Outcome) -> (i32, i32) {
    let adjust = |rating: i32, opponent: i32, color: Color| {
        let delta = K_FACTOR * (outcome.score_for(color) - expected_score(rating, opponent));
        (f64::from(rating) + delta).round() as i32
    };
    (
        adjust(white, black, Color::White),
        adjust(black, white, Color::Black),
    )
}

/// Per-player rating and result counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRecord {
    pub elo: i32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    /// Positive for a win streak, negative for a loss streak.
    pub current_streak: i32,
    pub game_history: Vec<String>,
}

impl RatingRecord {
    #[must_use]
    pub fn new() -> Self {
        Self {
            elo: STARTING_RATING,
            wins: 0,
            losses: 0,
            draws: 0,
            current_streak: 0,
            game_history: Vec::new(),
        }
    }

    #[must_use]
    pub const fn total_games(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    /// Fold one finished game into the record.
    pub fn record(&mut self, new_elo: i32, score: f64, game_id: &str) {
        self.elo = new_elo;
        if score > 0.5 {
            self.wins += 1;
            self.current_streak = self.current_streak.max(0) + 1;
        } else if score < 0.5 {
            self.losses += 1;
            self.current_streak = self.current_streak.min(0) - 1;
        } else {
            self.draws += 1;
            self.current_streak = 0;
        }
        self.game_history.push(game_id.to_string());
    }
}

impl Default for RatingRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Persistence for rating records, keyed by player identity.
pub trait RatingStore: Send + Sync {
    /// The stored record, or a fresh one for an unknown identity.
    fn load(&self, identity: &str) -> RatingRecord;

    fn save(&self, identity: &str, record: RatingRecord);
}

/// Process-local store used when nothing else is configured.
#[derive(Debug, Default)]
pub struct MemoryRatingStore {
    records: Mutex<HashMap<String, RatingRecord>>,
}

impl RatingStore for MemoryRatingStore {
    fn load(&self, identity: &str) -> RatingRecord {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
            .cloned()
            .unwrap_or_default()
    }

    fn save(&self, identity: &str, record: RatingRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(identity.to_string(), record);
    }
}

/// Applies finished games to a [`RatingStore`].
///
/// Updates are serialized so two games finishing at once for the same player
/// cannot lose each other's writes.
pub struct RatingUpdater {
    store: Arc<dyn RatingStore>,
    guard: Mutex<()>,
}

impl RatingUpdater {
    pub fn new(store: Arc<dyn RatingStore>) -> Self {
        Self {
            store,
            guard: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn RatingStore> {
        &self.store
    }

    /// Record `outcome` between `white` and `black` and return both updated
    /// records.
    pub fn record_game(
        &self,
        white: &str,
        black: &str,
        outcome: Outcome,
        game_id: &str,
    ) -> (RatingRecord, RatingRecord) {
        let _lock = self.guard.lock().unwrap_or_else(PoisonError::into_inner);
        let mut white_record = self.store.load(white);
        let mut black_record = self.store.load(black);

        let (old_white, old_black) = (white_record.elo, black_record.elo);
        let (white_elo, black_elo) = apply_result(old_white, old_black, outcome);
        white_record.record(white_elo, outcome.score_for(Color::White), game_id);
        black_record.record(black_elo, outcome.score_for(Color::Black), game_id);

        info!(
            "Game {} rated: {} {} -> {} ({} games), {} {} -> {} ({} games)",
            game_id,
            white,
            old_white,
            white_elo,
            white_record.total_games(),
            black,
            old_black,
            black_elo,
            black_record.total_games()
        );

        self.store.save(white, white_record.clone());
        self.store.save(black, black_record.clone());
        (white_record, black_record)
    }
}
