//! # Book lookups
//! A book is loaded in memory once, validated, then probed by binary search.

use std::path::Path;

use shakmaty::Chess;

use super::BookError;
use crate::{
    key::PositionKeyer,
    polyglot::{PolyglotEntry, ENTRY_SIZE},
};

/// A loaded PolyGlot book.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Book {
    entries: Vec<PolyglotEntry>,
}
impl Book {
    /// Reads and validates a book file.
    /// # Errors
    /// Fails if the file cannot be read or is not a well-formed book (see
    /// [`Book::from_bytes`]).
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BookError> {
        let path = path.as_ref();
        let book = Self::from_bytes(&std::fs::read(path)?)?;
        log::debug!("Loaded {} entries from {}", book.len(), path.display());
        Ok(book)
    }

    /// Parses a book from raw bytes.
    /// # Errors
    /// Fails if the length is not a multiple of 16 bytes, or if any record holds an
    /// invalid move encoding. Nothing of a malformed book is kept.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BookError> {
        if bytes.len() % ENTRY_SIZE != 0 {
            return Err(BookError::Truncated(bytes.len()));
        }
        let entries = bytes
            .chunks_exact(ENTRY_SIZE)
            .enumerate()
            .map(|(index, record)| {
                PolyglotEntry::from_bytes(record)
                    .map_err(|source| BookError::InvalidRecord { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Wraps entries that are already in book order.
    pub fn from_entries(entries: Vec<PolyglotEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PolyglotEntry] {
        &self.entries
    }

    /// Returns every entry of the given position, in book order.
    ///
    /// Positions the book does not know about give an empty slice.
    pub fn lookup(&self, key: u64) -> &[PolyglotEntry] {
        let start = self.entries.partition_point(|entry| entry.key < key);
        let matching = self.entries[start..]
            .iter()
            .take_while(|entry| entry.key == key)
            .count();
        &self.entries[start..start + matching]
    }

    /// Returns every entry of the given position.
    pub fn lookup_position<K: PositionKeyer + ?Sized>(
        &self,
        position: &Chess,
        keyer: &K,
    ) -> &[PolyglotEntry] {
        self.lookup(keyer.key(position))
    }

    /// Checks that entries are in book order, which lookups rely on.
    /// # Errors
    /// Reports the first entry that sorts before its predecessor.
    pub fn check_sorted(&self) -> Result<(), BookError> {
        match self
            .entries
            .windows(2)
            .position(|pair| pair[0].sort_key() > pair[1].sort_key())
        {
            Some(index) => Err(BookError::Unsorted { index: index + 1 }),
            None => Ok(()),
        }
    }
}
