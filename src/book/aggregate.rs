//! # Move statistics
//! Replays games and accumulates, for every (position, move) pair, a weight telling how
//! good the move turned out to be for the side that played it.

use std::collections::HashMap;

use shakmaty::{Color, Position};

use crate::{
    config::BookConfig,
    corpus::{CorpusError, GameRecord, GameResult},
    key::PositionKeyer,
    polyglot::BookMove,
};

/// How a single occurrence of a move contributes to its weight.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum ScoringPolicy {
    /// `2` for a win of the mover, `1` for a draw, `0` for a loss. Games with an
    /// unknown result count as lost by white.
    #[default]
    ResultScored,
    /// Every occurrence counts as `1`, whatever the result.
    Uniform,
}
impl ScoringPolicy {
    /// Weight added to a move played by `mover` in a game that ended with `result`.
    pub fn delta(self, result: GameResult, mover: Color) -> i64 {
        match self {
            Self::Uniform => 1,
            Self::ResultScored => {
                let white_score = match result {
                    GameResult::WhiteWins => 2,
                    GameResult::Draw => 1,
                    GameResult::BlackWins | GameResult::Unknown => 0,
                };
                if mover.is_white() {
                    white_score
                } else {
                    2 - white_score
                }
            }
        }
    }
}

/// Accumulated weights, by position key then by move.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BookTable {
    positions: HashMap<u64, HashMap<BookMove, i64>>,
}
impl BookTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct positions.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of distinct (position, move) pairs.
    pub fn move_count(&self) -> usize {
        self.positions.values().map(HashMap::len).sum()
    }

    /// Iterates over every position and its moves, in no particular order.
    pub fn positions(&self) -> impl Iterator<Item = (u64, &HashMap<BookMove, i64>)> {
        self.positions.iter().map(|(&key, moves)| (key, moves))
    }

    /// Moves recorded for the given position.
    pub fn moves(&self, key: u64) -> Option<&HashMap<BookMove, i64>> {
        self.positions.get(&key)
    }

    /// Accumulated weight of a move in the given position.
    pub fn weight(&self, key: u64, action: BookMove) -> Option<i64> {
        self.moves(key)?.get(&action).copied()
    }

    /// Adds every weight of `other` into this table.
    ///
    /// Merging is associative and commutative, so tables built from any partition of a
    /// corpus merge into the table of the whole corpus.
    pub fn merge(&mut self, other: BookTable) {
        for (key, moves) in other.positions {
            for (action, delta) in moves {
                aggregate(self, key, action, delta);
            }
        }
    }
}

/// Adds `delta` to the weight of `action` in the position `key`, creating the entry if
/// needed.
#[inline]
pub fn aggregate(table: &mut BookTable, key: u64, action: BookMove, delta: i64) {
    *table
        .positions
        .entry(key)
        .or_default()
        .entry(action)
        .or_default() += delta;
}

/// What was recorded from a single game.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct GameSummary {
    pub plies: usize,
    /// The game contained an illegal move, and was only recorded up to it.
    pub truncated: bool,
}

/// Records the moves of a game, up to the configured ply cutoff.
///
/// An illegal move stops the game: plies before it stay recorded.
/// # Errors
/// Fails without touching the table if the game's starting position is invalid.
pub fn record_game<K: PositionKeyer + ?Sized>(
    table: &mut BookTable,
    game: &GameRecord,
    config: &BookConfig,
    keyer: &K,
) -> Result<GameSummary, CorpusError> {
    let mut position = game.start_position()?;
    let mut summary = GameSummary::default();

    for (ply, notation) in game
        .moves
        .iter()
        .take(config.max_plies_per_game)
        .enumerate()
    {
        let Some(action) = notation.to_move(&position) else {
            log::warn!(
                "Illegal move {notation} at ply {}, ignoring the rest of the game",
                ply + 1
            );
            summary.truncated = true;
            break;
        };
        if let Some(book_move) = BookMove::from_move(&action, config.castling) {
            let delta = config.scoring.delta(game.result, position.turn());
            aggregate(table, keyer.key(&position), book_move, delta);
            summary.plies += 1;
        }
        position.play_unchecked(&action);
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use shakmaty::{Chess, Square};

    use super::*;
    use crate::{
        key::{KeyScheme, PolyglotKeyer},
        polyglot::CastlingConvention,
        tests::{game, position_after},
    };

    #[test]
    fn result_scored_deltas() {
        use GameResult::*;
        let policy = ScoringPolicy::ResultScored;
        let cases = [
            (WhiteWins, 2, 0),
            (Draw, 1, 1),
            (BlackWins, 0, 2),
            (Unknown, 0, 2),
        ];
        for (result, white, black) in cases {
            assert_eq!(policy.delta(result, Color::White), white, "{result}");
            assert_eq!(policy.delta(result, Color::Black), black, "{result}");
        }
        assert_eq!(ScoringPolicy::Uniform.delta(BlackWins, Color::White), 1);
    }

    #[test]
    fn repeated_moves_accumulate() {
        let e2e4 = BookMove::new(Square::E2, Square::E4, None);
        let mut table = BookTable::new();
        aggregate(&mut table, 7, e2e4, 2);
        aggregate(&mut table, 7, e2e4, 1);
        aggregate(&mut table, 8, e2e4, 0);
        assert_eq!(table.weight(7, e2e4), Some(3));
        assert_eq!(table.weight(8, e2e4), Some(0));
        assert_eq!(table.len(), 2);
        assert_eq!(table.move_count(), 2);
    }

    #[test]
    fn records_each_ply_before_the_move() {
        let config = BookConfig::default();
        let mut table = BookTable::new();
        let summary = record_game(
            &mut table,
            &game("e2e4 e7e5 1/2-1/2"),
            &config,
            &PolyglotKeyer,
        )
        .unwrap();
        assert_eq!(
            summary,
            GameSummary {
                plies: 2,
                truncated: false
            }
        );

        let start = PolyglotKeyer.key(&Chess::default());
        let after_e4 = PolyglotKeyer.key(&position_after("e2e4"));
        assert_eq!(
            table.weight(start, BookMove::new(Square::E2, Square::E4, None)),
            Some(1)
        );
        assert_eq!(
            table.weight(after_e4, BookMove::new(Square::E7, Square::E5, None)),
            Some(1)
        );
    }

    #[test]
    fn ply_cutoff() {
        let config = BookConfig::default().with_max_plies(2);
        let mut table = BookTable::new();
        let summary = record_game(
            &mut table,
            &game("e2e4 e7e5 g1f3 b8c6 1-0"),
            &config,
            &PolyglotKeyer,
        )
        .unwrap();
        assert_eq!(summary.plies, 2);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn illegal_moves_only_truncate_their_game() {
        let config = BookConfig::default().with_scoring(ScoringPolicy::Uniform);
        let mut table = BookTable::new();
        let broken =
            record_game(&mut table, &game("e2e4 e7e5 e1e3"), &config, &PolyglotKeyer).unwrap();
        assert!(broken.truncated);
        assert_eq!(broken.plies, 2);

        record_game(&mut table, &game("e2e4 c7c5"), &config, &PolyglotKeyer).unwrap();
        let start = PolyglotKeyer.key(&Chess::default());
        assert_eq!(
            table.weight(start, BookMove::new(Square::E2, Square::E4, None)),
            Some(2)
        );
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn invalid_setup_leaves_table_untouched() {
        let mut record = game("e2e4");
        record.setup = Some("8/8/8 w - - 0 1".to_string());
        let mut table = BookTable::new();
        assert!(record_game(&mut table, &record, &BookConfig::default(), &PolyglotKeyer).is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn honours_custom_start_and_castling_convention() {
        let mut record = game("e1g1 1-0");
        record.setup = Some("4k3/8/8/8/8/8/8/4K2R w K - 0 1".to_string());
        let start = record.start_position().unwrap();

        for (convention, target) in [
            (CastlingConvention::KingTakesRook, Square::H1),
            (CastlingConvention::KingToTarget, Square::G1),
        ] {
            let config = BookConfig::default().with_castling(convention);
            let mut table = BookTable::new();
            record_game(&mut table, &record, &config, &KeyScheme::Polyglot).unwrap();
            assert_eq!(
                table.weight(
                    PolyglotKeyer.key(&start),
                    BookMove::new(Square::E1, target, None)
                ),
                Some(2)
            );
        }
    }

    #[test]
    fn merge_sums_weights() {
        let config = BookConfig::default();
        let games = [game("e2e4 e7e5 1-0"), game("e2e4 c7c5 0-1"), game("d2d4 1/2-1/2")];

        let mut whole = BookTable::new();
        for record in &games {
            record_game(&mut whole, record, &config, &PolyglotKeyer).unwrap();
        }

        let mut left = BookTable::new();
        let mut right = BookTable::new();
        record_game(&mut left, &games[0], &config, &PolyglotKeyer).unwrap();
        record_game(&mut right, &games[1], &config, &PolyglotKeyer).unwrap();
        record_game(&mut right, &games[2], &config, &PolyglotKeyer).unwrap();

        let mut left_then_right = left.clone();
        left_then_right.merge(right.clone());
        let mut right_then_left = right;
        right_then_left.merge(left);

        assert_eq!(left_then_right, whole);
        assert_eq!(right_then_left, whole);
    }
}
