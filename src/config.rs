//! # Book building configuration

use thiserror::Error;

use crate::{book::ScoringPolicy, key::KeyScheme, polyglot::CastlingConvention};

/// Default ply cutoff per game.
pub const DEFAULT_MAX_PLIES: usize = 1000;
/// Default upper bound of normalized weights.
pub const DEFAULT_MAX_WEIGHT: u16 = 10000;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Hash)]
pub enum ConfigError {
    #[error("Maximum weight must be at least 1")]
    ZeroMaxWeight,
    #[error("At least one worker is needed")]
    ZeroWorkers,
}

/// Builder pattern to configure how a book is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookConfig {
    pub max_plies_per_game: usize,
    pub max_weight: u16,
    pub scoring: ScoringPolicy,
    pub castling: CastlingConvention,
    pub keys: KeyScheme,

    pub workers: usize,
    pub max_games: Option<usize>,
}
impl Default for BookConfig {
    fn default() -> Self {
        Self {
            max_plies_per_game: DEFAULT_MAX_PLIES,
            max_weight: DEFAULT_MAX_WEIGHT,
            scoring: ScoringPolicy::default(),
            castling: CastlingConvention::default(),
            keys: KeyScheme::default(),
            workers: num_cpus::get(),
            max_games: None,
        }
    }
}
impl BookConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the first `plies` moves of each game are recorded.
    pub fn with_max_plies(mut self, plies: usize) -> Self {
        self.max_plies_per_game = plies;
        self
    }

    /// Sets the value the best move of a position is normalized to.
    pub fn with_max_weight(mut self, weight: u16) -> Self {
        self.max_weight = weight;
        self
    }

    /// Sets how each recorded move is scored.
    pub fn with_scoring(mut self, scoring: ScoringPolicy) -> Self {
        self.scoring = scoring;
        self
    }

    /// Sets how castling moves are written to the book.
    pub fn with_castling(mut self, castling: CastlingConvention) -> Self {
        self.castling = castling;
        self
    }

    /// Sets the position key scheme.
    pub fn with_keys(mut self, keys: KeyScheme) -> Self {
        self.keys = keys;
        self
    }

    /// Sets the number of threads games are spread across.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Stops the corpus pass after the given number of games.
    pub fn with_max_games(mut self, games: Option<usize>) -> Self {
        self.max_games = games;
        self
    }

    /// Checks that this configuration can be used to build a book.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_weight == 0 {
            return Err(ConfigError::ZeroMaxWeight);
        }
        if self.workers == 0 {
            return Err(ConfigError::ZeroWorkers);
        }
        Ok(())
    }
}
