//! # Weight normalization
//! Accumulated weights are unbounded. Before being written, the weights of each position
//! are rescaled so that they sum to (at most) the configured maximum weight.
//!
//! Positions are normalized independently from each other.

use std::collections::HashMap;

use super::BookTable;
use crate::polyglot::{BookMove, PolyglotEntry};

/// Rescales the moves of a single position to `floor(weight * max_weight / total)`.
///
/// Moves whose rescaled weight is not positive are dropped, as are all moves of a
/// position whose total weight is not positive. The returned moves are in no
/// particular order.
pub fn normalize_position(moves: &HashMap<BookMove, i64>, max_weight: u16) -> Vec<(BookMove, u16)> {
    let total: i128 = moves.values().map(|&weight| i128::from(weight)).sum();
    if total <= 0 {
        return vec![];
    }

    let max = i128::from(max_weight);
    moves
        .iter()
        .filter_map(|(&action, &weight)| {
            let scaled = (i128::from(weight) * max).div_euclid(total);
            if scaled <= 0 {
                return None;
            }
            // A single weight can only exceed the total when others are negative.
            Some((action, u16::try_from(scaled.min(max)).unwrap_or(max_weight)))
        })
        .collect()
}

/// Normalizes every position of the table into book entries, in no particular order.
pub fn normalize(table: &BookTable, max_weight: u16) -> Vec<PolyglotEntry> {
    table
        .positions()
        .flat_map(|(key, moves)| {
            normalize_position(moves, max_weight)
                .into_iter()
                .map(move |(action, weight)| PolyglotEntry::new(key, action, weight))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use shakmaty::Square;

    use super::*;
    use crate::book::aggregate;

    const E4: BookMove = BookMove::new(Square::E2, Square::E4, None);
    const D4: BookMove = BookMove::new(Square::D2, Square::D4, None);
    const C4: BookMove = BookMove::new(Square::C2, Square::C4, None);

    fn position(weights: &[(BookMove, i64)]) -> HashMap<BookMove, i64> {
        weights.iter().copied().collect()
    }

    fn weight_of(normalized: &[(BookMove, u16)], action: BookMove) -> Option<u16> {
        normalized
            .iter()
            .find(|(candidate, _)| *candidate == action)
            .map(|&(_, weight)| weight)
    }

    #[test]
    fn single_move_gets_full_weight() {
        let normalized = normalize_position(&position(&[(E4, 7)]), 10000);
        assert_eq!(normalized, vec![(E4, 10000)]);
    }

    #[test]
    fn weights_are_floored_shares() {
        let normalized = normalize_position(&position(&[(E4, 1), (D4, 2)]), 10000);
        assert_eq!(weight_of(&normalized, E4), Some(3333));
        assert_eq!(weight_of(&normalized, D4), Some(6666));
    }

    #[test]
    fn non_positive_weights_are_dropped() {
        let normalized = normalize_position(&position(&[(E4, 0), (D4, 4)]), 10000);
        assert_eq!(normalized, vec![(D4, 10000)]);

        // Too small a share also floors to zero.
        let normalized = normalize_position(&position(&[(E4, 1), (D4, 100_000)]), 100);
        assert_eq!(normalized, vec![(D4, 99)]);
    }

    #[test]
    fn empty_totals_drop_the_position() {
        assert!(normalize_position(&position(&[(E4, 0), (D4, 0)]), 10000).is_empty());
        assert!(normalize_position(&position(&[(E4, -3), (D4, 1)]), 10000).is_empty());
    }

    #[test]
    fn negative_weights_cannot_push_past_the_maximum() {
        let normalized = normalize_position(&position(&[(E4, 5), (D4, -4)]), 10000);
        assert_eq!(normalized, vec![(E4, 10000)]);
    }

    #[test]
    fn weights_stay_within_bound() {
        let weights = position(&[(E4, 13), (D4, 29), (C4, 101)]);
        for max_weight in [1, 7, 100, 10000, u16::MAX] {
            let normalized = normalize_position(&weights, max_weight);
            let sum: u32 = normalized.iter().map(|&(_, weight)| u32::from(weight)).sum();
            assert!(sum <= u32::from(max_weight));
            assert!(normalized
                .iter()
                .all(|&(_, weight)| weight > 0 && weight <= max_weight));
        }
    }

    #[test]
    fn positions_are_independent() {
        let mut table = BookTable::new();
        aggregate(&mut table, 1, E4, 1000);
        aggregate(&mut table, 2, E4, 1);
        aggregate(&mut table, 2, D4, 1);

        let entries = normalize(&table, 10000);
        assert_eq!(entries.len(), 3);
        for entry in entries {
            let expected = if entry.key == 1 { 10000 } else { 5000 };
            assert_eq!(entry.weight, expected);
            assert_eq!(entry.learn, 0);
        }
    }
}
