//! # Move encoding
//! PolyGlot packs a move into 16 bits:
//! - bits 0 to 5: target square
//! - bits 6 to 11: origin square
//! - bits 12 to 14: promotion piece (0 for none, then knight, bishop, rook, queen)
//!
//! Castling moves are stored as the king capturing its own rook, so the target square
//! of a castling move is the rook's origin square.

use shakmaty::{uci::UciMove, CastlingMode, Chess, Move, Position, Role, Square};

use super::PolyglotError;

/// Pieces a pawn can promote to, in PolyGlot order.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum PromotionTarget {
    Knight = 0,
    Bishop = 1,
    Rook = 2,
    Queen = 3,
}
impl PromotionTarget {
    /// Converts a promotion role, returning `None` for roles PolyGlot cannot encode.
    pub fn from_role(role: Role) -> Option<Self> {
        Some(match role {
            Role::Knight => Self::Knight,
            Role::Bishop => Self::Bishop,
            Role::Rook => Self::Rook,
            Role::Queen => Self::Queen,
            Role::Pawn | Role::King => return None,
        })
    }

    pub fn role(self) -> Role {
        match self {
            Self::Knight => Role::Knight,
            Self::Bishop => Role::Bishop,
            Self::Rook => Role::Rook,
            Self::Queen => Role::Queen,
        }
    }
}

/// How castling moves are written to the move field.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum CastlingConvention {
    /// King moves onto its rook's square (e1h1). This is what PolyGlot readers expect.
    #[default]
    KingTakesRook,
    /// King moves to its destination square (e1g1).
    KingToTarget,
}
impl CastlingConvention {
    fn castling_mode(self) -> CastlingMode {
        match self {
            Self::KingTakesRook => CastlingMode::Chess960,
            Self::KingToTarget => CastlingMode::Standard,
        }
    }
}

/// A move as stored in a book: origin, target and optional promotion.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BookMove {
    pub origin: Square,
    pub target: Square,
    pub promotion: Option<PromotionTarget>,
}
impl BookMove {
    pub const fn new(origin: Square, target: Square, promotion: Option<PromotionTarget>) -> Self {
        Self {
            origin,
            target,
            promotion,
        }
    }

    /// Converts a legal move, writing castling moves with the given convention.
    ///
    /// Returns `None` for moves PolyGlot cannot represent (drops, null moves and
    /// promotions to pawns or kings).
    pub fn from_move(action: &Move, convention: CastlingConvention) -> Option<Self> {
        match action.to_uci(convention.castling_mode()) {
            UciMove::Normal {
                from,
                to,
                promotion,
            } => {
                let promotion = match promotion {
                    Some(role) => Some(PromotionTarget::from_role(role)?),
                    None => None,
                };
                Some(Self::new(from, to, promotion))
            }
            _ => None,
        }
    }

    /// Packs this move into its 16 bit representation.
    #[inline]
    pub fn encode(self) -> u16 {
        let mut encoding = self.target as u16 | (self.origin as u16) << 6;
        if let Some(promotion) = self.promotion {
            encoding |= (promotion as u16 + 1) << 12;
        }
        encoding
    }

    /// Unpacks a 16 bit move.
    /// # Errors
    /// Fails if the promotion field is greater than 4 or if the unused high bit is set.
    pub fn decode(encoding: u16) -> Result<Self, PolyglotError> {
        if encoding & 0x8000 != 0 {
            return Err(PolyglotError::ReservedBit(encoding));
        }
        let target = Square::new(u32::from(encoding & 0x3f));
        let origin = Square::new(u32::from(encoding >> 6 & 0x3f));
        let promotion_index = (encoding >> 12 & 0b111) as u8;
        let promotion = match promotion_index {
            0 => None,
            1 => Some(PromotionTarget::Knight),
            2 => Some(PromotionTarget::Bishop),
            3 => Some(PromotionTarget::Rook),
            4 => Some(PromotionTarget::Queen),
            _ => return Err(PolyglotError::InvalidPromotion(promotion_index)),
        };
        Ok(Self::new(origin, target, promotion))
    }

    /// Finds the legal move this book move stands for in the given position.
    ///
    /// Castling is recognized in both conventions, so books written by other tools with
    /// king-to-target castling still resolve.
    pub fn to_move(self, position: &Chess) -> Option<Move> {
        position.legal_moves().into_iter().find(|action| {
            [CastlingConvention::KingTakesRook, CastlingConvention::KingToTarget]
                .into_iter()
                .any(|convention| Self::from_move(action, convention) == Some(self))
        })
    }
}
impl std::fmt::Display for BookMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.origin, self.target)?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion.role().char())?;
        }
        Ok(())
    }
}
