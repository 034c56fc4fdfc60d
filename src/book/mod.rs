//! # Book building
//! The pipeline goes through four steps:
//! 1. [`aggregate`]: games are replayed and every move is scored into a [`BookTable`]
//! 2. [`normalize`]: weights of each position are rescaled to a bounded range
//! 3. [`writer`]: entries are sorted and written as PolyGlot records
//! 4. [`reader`]: the resulting [`Book`] is probed by binary search
//!
//! [`BookBuilder`] runs the first step over several threads, then merges their tables.

use std::{
    ops::AddAssign,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use thiserror::Error;

use crate::{
    config::{BookConfig, ConfigError},
    corpus::GameRecord,
    key::PositionKeyer,
    polyglot::{PolyglotEntry, PolyglotError},
};

pub mod aggregate;
pub mod normalize;
pub mod reader;
pub mod writer;

pub use aggregate::{aggregate, record_game, BookTable, GameSummary, ScoringPolicy};
pub use normalize::{normalize, normalize_position};
pub use reader::Book;
pub use writer::{finalize, save, sort_entries, to_bytes, write_book};

/// Errors that may happen when reading or writing a book.
#[derive(Debug, Error)]
pub enum BookError {
    #[error("Could not access book: {0}")]
    Io(#[from] std::io::Error),
    #[error("Book is {0} bytes long, which is not a multiple of 16")]
    Truncated(usize),
    #[error("Record {index} is invalid: {source}")]
    InvalidRecord { index: usize, source: PolyglotError },
    #[error("Record {index} sorts before the record preceding it")]
    Unsorted { index: usize },
}

/// Counters gathered while aggregating a corpus.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct BuildStats {
    /// Games whose moves were recorded.
    pub games: usize,
    /// Games dropped because their starting position was invalid.
    pub skipped: usize,
    /// Games recorded only up to an illegal move.
    pub truncated: usize,
    pub plies: usize,
    /// The corpus pass was stopped before every game was seen.
    pub interrupted: bool,
}
impl AddAssign for BuildStats {
    fn add_assign(&mut self, rhs: Self) {
        self.games += rhs.games;
        self.skipped += rhs.skipped;
        self.truncated += rhs.truncated;
        self.plies += rhs.plies;
        self.interrupted |= rhs.interrupted;
    }
}
impl std::fmt::Display for BuildStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} plies from {} games ({} skipped, {} truncated)",
            self.plies, self.games, self.skipped, self.truncated
        )?;
        if self.interrupted {
            write!(f, ", interrupted")?;
        }
        Ok(())
    }
}

/// Aggregates a corpus into a book according to a [`BookConfig`].
#[derive(Clone, Debug)]
pub struct BookBuilder {
    config: BookConfig,
    should_stop: Arc<AtomicBool>,
}
impl BookBuilder {
    /// Creates a builder.
    /// # Errors
    /// Fails if the configuration does not validate.
    pub fn new(config: BookConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            should_stop: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    /// Shares a stop flag with the builder. Once set, workers finish their current game
    /// and stop, leaving a valid partial table.
    pub fn with_stop_flag(mut self, should_stop: Arc<AtomicBool>) -> Self {
        self.should_stop = should_stop;
        self
    }

    /// Returns the flag that stops the corpus pass when set.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.should_stop.clone()
    }

    /// Aggregates the games with the configured key scheme.
    pub fn aggregate(&self, games: &[GameRecord]) -> (BookTable, BuildStats) {
        self.aggregate_with_keyer(games, &self.config.keys)
    }

    /// Aggregates the games with a custom key scheme.
    pub fn aggregate_with_keyer<K: PositionKeyer + Sync + ?Sized>(
        &self,
        games: &[GameRecord],
        keyer: &K,
    ) -> (BookTable, BuildStats) {
        let games = match self.config.max_games {
            Some(max_games) => &games[..games.len().min(max_games)],
            None => games,
        };
        let workers = self.config.workers.clamp(1, games.len().max(1));

        let (table, stats) = if workers == 1 {
            self.aggregate_games(games, keyer)
        } else {
            let chunk_size = games.len().div_ceil(workers);
            log::debug!("Spreading {} games over {workers} workers", games.len());
            std::thread::scope(|scope| {
                let handles: Vec<_> = games
                    .chunks(chunk_size)
                    .map(|chunk| scope.spawn(move || self.aggregate_games(chunk, keyer)))
                    .collect();

                let mut table = BookTable::new();
                let mut stats = BuildStats::default();
                for handle in handles {
                    let (partial_table, partial_stats) = handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
                    table.merge(partial_table);
                    stats += partial_stats;
                }
                (table, stats)
            })
        };

        log::info!("Aggregated {stats} into {} positions", table.len());
        (table, stats)
    }

    /// Aggregates the games, then normalizes and sorts the result into book entries.
    pub fn build(&self, games: &[GameRecord]) -> (Vec<PolyglotEntry>, BuildStats) {
        let (table, stats) = self.aggregate(games);
        let entries = finalize(&table, self.config.max_weight);
        log::info!(
            "{} entries kept out of {} recorded moves",
            entries.len(),
            table.move_count()
        );
        (entries, stats)
    }

    fn aggregate_games<K: PositionKeyer + ?Sized>(
        &self,
        games: &[GameRecord],
        keyer: &K,
    ) -> (BookTable, BuildStats) {
        let mut table = BookTable::new();
        let mut stats = BuildStats::default();

        for game in games {
            if self.should_stop.load(Ordering::Relaxed) {
                stats.interrupted = true;
                break;
            }
            match record_game(&mut table, game, &self.config, keyer) {
                Ok(summary) => {
                    stats.games += 1;
                    stats.plies += summary.plies;
                    stats.truncated += usize::from(summary.truncated);
                }
                Err(e) => {
                    log::warn!("Skipping game: {e}");
                    stats.skipped += 1;
                }
            }
        }

        (table, stats)
    }
}
