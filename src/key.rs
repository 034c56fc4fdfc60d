//! # Position keys
//! Every book record starts with a 64 bit key identifying the position it applies to.
//!
//! Keys are Zobrist hashes: the XOR of one pseudo-random number per
//! - piece on the board, selected by (kind, colour, square),
//! - available castling right,
//! - en passant file, only when an en passant capture is legal,
//! - side to move (mixed in when white is to move).
//!
//! [`PolyglotKeyer`] uses the random numbers published with the PolyGlot format, which
//! makes books interoperable with every other PolyGlot reader. [`SeededKeyer`] draws its
//! numbers from a fixed-seed generator instead: keys are stable and self-consistent, but
//! books built with it are **not** readable by external PolyGlot consumers.

use std::sync::LazyLock;

use rand::{rngs::SmallRng, Rng, SeedableRng};
use shakmaty::{
    zobrist::{Zobrist64, ZobristHash},
    CastlingSide, Chess, Color, EnPassantMode, Position, Role, Square,
};

/// Computes the identity key of a position.
///
/// Implementations must be deterministic across runs and must distinguish positions
/// that only differ by their side to move.
pub trait PositionKeyer {
    fn key(&self, position: &Chess) -> u64;
}

/// PolyGlot compatible keys.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct PolyglotKeyer;
impl PositionKeyer for PolyglotKeyer {
    #[inline]
    fn key(&self, position: &Chess) -> u64 {
        // shakmaty ships the PolyGlot random table as its 64 bit Zobrist values.
        position.zobrist_hash::<Zobrist64>(EnPassantMode::Legal).0
    }
}

static SEEDED_KEYS: LazyLock<[u64; 781]> = LazyLock::new(|| {
    let mut rng = SmallRng::seed_from_u64(0x6F2DF0EAF362C1ED);
    let mut keys = [0; 781];
    for key in &mut keys {
        *key = rng.gen()
    }
    keys
});

// Same layout as the PolyGlot table:
// - 64 * 12 numbers for pieces, kinds interleaved black/white from pawn to king
// - four numbers for castling rights
// - eight numbers for en passant files
// - one number for white to move
const CASTLING_RIGHTS_OFFSET: usize = 64 * 12;
const EN_PASSANT_OFFSET: usize = CASTLING_RIGHTS_OFFSET + 4;
const SIDE_TO_MOVE_OFFSET: usize = EN_PASSANT_OFFSET + 8;

/// Keys composed from a table drawn out of a fixed-seed [`SmallRng`].
///
/// The table only depends on the seed and on the generator, so keys are identical
/// from one run to the next for a given build. They share nothing with PolyGlot keys.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct SeededKeyer;
impl SeededKeyer {
    #[inline(always)]
    fn piece_hash(role: Role, colour: Color, square: Square) -> u64 {
        let role_index = match role {
            Role::Pawn => 0,
            Role::Knight => 1,
            Role::Bishop => 2,
            Role::Rook => 3,
            Role::Queen => 4,
            Role::King => 5,
        };
        let kind = 2 * role_index + usize::from(colour.is_white());
        SEEDED_KEYS[64 * kind + square as usize]
    }

    #[inline(always)]
    fn castling_rights_hash(colour: Color, side: CastlingSide) -> u64 {
        let offset = match (colour, side) {
            (Color::White, CastlingSide::KingSide) => 0,
            (Color::White, CastlingSide::QueenSide) => 1,
            (Color::Black, CastlingSide::KingSide) => 2,
            (Color::Black, CastlingSide::QueenSide) => 3,
        };
        SEEDED_KEYS[CASTLING_RIGHTS_OFFSET + offset]
    }

    #[inline(always)]
    fn en_passant_file_hash(square: Square) -> u64 {
        SEEDED_KEYS[EN_PASSANT_OFFSET + square.file() as usize]
    }

    #[inline(always)]
    fn side_to_move_hash() -> u64 {
        SEEDED_KEYS[SIDE_TO_MOVE_OFFSET]
    }
}
impl PositionKeyer for SeededKeyer {
    fn key(&self, position: &Chess) -> u64 {
        let board = position.board();
        let mut key = 0;

        for square in board.occupied() {
            if let Some(piece) = board.piece_at(square) {
                key ^= Self::piece_hash(piece.role, piece.color, square);
            }
        }

        let castles = position.castles();
        for colour in [Color::White, Color::Black] {
            for side in [CastlingSide::KingSide, CastlingSide::QueenSide] {
                if castles.has(colour, side) {
                    key ^= Self::castling_rights_hash(colour, side);
                }
            }
        }

        if let Some(square) = position.ep_square(EnPassantMode::Legal) {
            key ^= Self::en_passant_file_hash(square);
        }

        if position.turn().is_white() {
            key ^= Self::side_to_move_hash();
        }

        key
    }
}

/// Key schemes selectable at runtime.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum KeyScheme {
    #[default]
    Polyglot,
    Seeded,
}
impl PositionKeyer for KeyScheme {
    fn key(&self, position: &Chess) -> u64 {
        match self {
            Self::Polyglot => PolyglotKeyer.key(position),
            Self::Seeded => SeededKeyer.key(position),
        }
    }
}
