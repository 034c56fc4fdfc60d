//! # Line verification
//! Walks a reference line move by move and checks that the book knows every position
//! along the way, and that it recommends the move played in the line.

use shakmaty::{fen::Fen, san::San, Chess, EnPassantMode, Move, Position};

use crate::{
    book::Book,
    key::{KeyScheme, PositionKeyer},
    polyglot::{BookMove, CastlingConvention},
};

/// What to do after the first ply that fails.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum VerifyMode {
    #[default]
    StopAtFirstFailure,
    /// Keep checking the remaining plies, still playing the reference moves.
    Continue,
}

/// Outcome of a single ply.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PlyStatus {
    /// The book has the position and recommends the reference move.
    Matched,
    /// The book has no entry for the position.
    NotCovered,
    /// The book has the position but not the reference move.
    Diverged,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PlyReport {
    /// 1-based index of the ply in the reference line.
    pub ply: usize,
    pub key: u64,
    /// Position before the reference move.
    pub fen: String,
    /// Reference move, in SAN.
    pub san: String,
    /// Number of book entries for the position.
    pub candidates: usize,
    pub status: PlyStatus,
}
impl std::fmt::Display for PlyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            PlyStatus::Matched => write!(f, "Move {}: {} found in book", self.ply, self.san),
            PlyStatus::NotCovered => {
                write!(f, "Book has no entries at move {}: {}", self.ply, self.fen)
            }
            PlyStatus::Diverged => write!(
                f,
                "Divergence at move {}: {} not among the {} book moves",
                self.ply, self.san, self.candidates
            ),
        }
    }
}

/// Per-ply results of a verification.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct VerificationReport {
    pub plies: Vec<PlyReport>,
    /// Length of the reference line.
    pub line_length: usize,
}
impl VerificationReport {
    /// Whether every ply of the line was checked and matched.
    pub fn is_success(&self) -> bool {
        self.plies.len() == self.line_length
            && self
                .plies
                .iter()
                .all(|ply| ply.status == PlyStatus::Matched)
    }

    pub fn failures(&self) -> impl Iterator<Item = &PlyReport> {
        self.plies
            .iter()
            .filter(|ply| ply.status != PlyStatus::Matched)
    }

    pub fn first_failure(&self) -> Option<&PlyReport> {
        self.failures().next()
    }
}

/// Checks reference lines against a book.
pub struct Verifier<'a, K = KeyScheme> {
    book: &'a Book,
    keyer: K,
    mode: VerifyMode,
}
impl<'a> Verifier<'a> {
    /// Creates a verifier using PolyGlot keys, stopping at the first failure.
    pub fn new(book: &'a Book) -> Self {
        Self {
            book,
            keyer: KeyScheme::default(),
            mode: VerifyMode::default(),
        }
    }
}
impl<'a, K: PositionKeyer> Verifier<'a, K> {
    /// Uses another key scheme, which must match the one the book was built with.
    pub fn with_keyer<L: PositionKeyer>(self, keyer: L) -> Verifier<'a, L> {
        Verifier {
            book: self.book,
            keyer,
            mode: self.mode,
        }
    }

    pub fn with_mode(mut self, mode: VerifyMode) -> Self {
        self.mode = mode;
        self
    }

    /// Plays `line` from `start`, checking each position against the book before
    /// playing the next reference move.
    ///
    /// The moves of `line` must be legal.
    pub fn verify(&self, start: &Chess, line: &[Move]) -> VerificationReport {
        let mut position = start.clone();
        let mut report = VerificationReport {
            plies: Vec::with_capacity(line.len()),
            line_length: line.len(),
        };

        for (index, action) in line.iter().enumerate() {
            let key = self.keyer.key(&position);
            let candidates = self.book.lookup(key);
            // Books written by other tools may use either castling convention.
            let wanted = [
                BookMove::from_move(action, CastlingConvention::KingTakesRook),
                BookMove::from_move(action, CastlingConvention::KingToTarget),
            ];

            let status = if candidates.is_empty() {
                PlyStatus::NotCovered
            } else if candidates
                .iter()
                .any(|entry| wanted.contains(&Some(entry.action)))
            {
                PlyStatus::Matched
            } else {
                PlyStatus::Diverged
            };

            let ply = PlyReport {
                ply: index + 1,
                key,
                fen: Fen::from_setup(position.clone().into_setup(EnPassantMode::Legal))
                    .to_string(),
                san: San::from_move(&position, action).to_string(),
                candidates: candidates.len(),
                status,
            };
            log::debug!("{ply}");
            report.plies.push(ply);

            if status != PlyStatus::Matched && self.mode == VerifyMode::StopAtFirstFailure {
                break;
            }
            position.play_unchecked(action);
        }

        report
    }
}
