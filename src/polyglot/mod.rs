//! # PolyGlot opening book
//!
//! PolyGlot is a compact binary format for opening books, storing a sorted list of 16 byte
//! entries containing:
//! - a **key** to denote the position (see [`crate::key`])
//! - a **move**, its **weight** (how good the move is), and a **learned value** field.
//!
//! Every field is big-endian. Entries are sorted by key then by encoded move, which
//! allows lookups by binary search. There is no header, footer or padding.

use thiserror::Error;

pub mod codec;

pub use codec::{BookMove, CastlingConvention, PromotionTarget};

/// Size of a single PolyGlot entry, in bytes.
pub const ENTRY_SIZE: usize = 16;

/// Errors that may happen when reading a PolyGlot entry from a slice of bytes.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq, Hash)]
pub enum PolyglotError {
    #[error("Only {0} bytes available, PolyGlot entries are 16 bytes long")]
    NotEnoughBytes(usize),
    #[error("Invalid promotion piece index: {0}")]
    InvalidPromotion(u8),
    #[error("Move encoding {0:#06x} sets the reserved high bit")]
    ReservedBit(u16),
}

/// A PolyGlot book entry, containing its key (hash of the corresponding position),
/// move played, weight of the move and learned value.
///
/// Weights are only meaningful relative to the other entries of the same position.
/// Books generated by this crate always leave `learn` at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PolyglotEntry {
    pub key: u64,
    pub action: BookMove,
    pub weight: u16,
    pub learn: u32,
}
impl PolyglotEntry {
    pub fn new(key: u64, action: BookMove, weight: u16) -> Self {
        Self {
            key,
            action,
            weight,
            learn: 0,
        }
    }

    /// Parses an entry from the first 16 bytes of the given slice.
    /// # Errors
    /// Fails if less than 16 bytes are available or if the move field is not a valid
    /// encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PolyglotError> {
        if bytes.len() < ENTRY_SIZE {
            return Err(PolyglotError::NotEnoughBytes(bytes.len()));
        }

        let key = u64::from_be_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]);
        let action = BookMove::decode(u16::from_be_bytes([bytes[8], bytes[9]]))?;
        let weight = u16::from_be_bytes([bytes[10], bytes[11]]);
        let learn = u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);

        Ok(Self {
            key,
            action,
            weight,
            learn,
        })
    }

    /// Serializes this entry into its 16 byte representation.
    pub fn to_bytes(&self) -> [u8; ENTRY_SIZE] {
        let mut bytes = [0; ENTRY_SIZE];
        bytes[0..8].copy_from_slice(&self.key.to_be_bytes());
        bytes[8..10].copy_from_slice(&self.action.encode().to_be_bytes());
        bytes[10..12].copy_from_slice(&self.weight.to_be_bytes());
        bytes[12..16].copy_from_slice(&self.learn.to_be_bytes());
        bytes
    }

    /// The (key, move) prefix that books are sorted by, as raw big-endian bytes.
    ///
    /// Comparing these arrays lexicographically is the same as comparing the key then
    /// the encoded move as unsigned integers.
    #[inline]
    pub fn sort_key(&self) -> [u8; 10] {
        let mut prefix = [0; 10];
        prefix[0..8].copy_from_slice(&self.key.to_be_bytes());
        prefix[8..10].copy_from_slice(&self.action.encode().to_be_bytes());
        prefix
    }
}
impl TryFrom<&[u8]> for PolyglotEntry {
    type Error = PolyglotError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::from_bytes(value)
    }
}
impl From<PolyglotEntry> for [u8; ENTRY_SIZE] {
    fn from(value: PolyglotEntry) -> Self {
        value.to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use shakmaty::Square;

    use super::*;

    #[test]
    fn entry_layout_is_big_endian() {
        let entry = PolyglotEntry {
            key: 0x463b96181691fc9c,
            action: BookMove::new(Square::E2, Square::E4, None),
            weight: 10000,
            learn: 0x01020304,
        };
        assert_eq!(
            entry.to_bytes(),
            [
                0x46, 0x3b, 0x96, 0x18, 0x16, 0x91, 0xfc, 0x9c, // key
                0x03, 0x1c, // e2e4 = 28 + (12 << 6)
                0x27, 0x10, // 10000
                0x01, 0x02, 0x03, 0x04,
            ]
        );
        assert_eq!(PolyglotEntry::from_bytes(&entry.to_bytes()), Ok(entry));
    }

    #[test]
    fn short_slices_are_rejected() {
        assert_eq!(
            PolyglotEntry::try_from(&[0u8; 15][..]),
            Err(PolyglotError::NotEnoughBytes(15))
        );
    }

    #[test]
    fn invalid_promotions_are_rejected() {
        let mut bytes = PolyglotEntry::new(1, BookMove::new(Square::A7, Square::A8, None), 1)
            .to_bytes();
        bytes[8] |= 0b0101_0000;
        assert_eq!(
            PolyglotEntry::from_bytes(&bytes),
            Err(PolyglotError::InvalidPromotion(5))
        );
    }

    #[test]
    fn sort_key_orders_like_integers() {
        let low = PolyglotEntry::new(0x00ff, BookMove::new(Square::H8, Square::H7, None), 1);
        let high = PolyglotEntry::new(0x0100, BookMove::new(Square::A1, Square::A2, None), 1);
        assert!(low.sort_key() < high.sort_key());
        assert!(low.key < high.key);
    }
}
