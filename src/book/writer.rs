//! # Book serialization
//! Turns a statistics table into the sorted stream of 16 byte PolyGlot records.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use super::{normalize, BookError, BookTable};
use crate::polyglot::{PolyglotEntry, ENTRY_SIZE};

/// Normalizes the table and sorts the resulting entries in book order.
///
/// The output only depends on the contents of the table, so finalizing the same table
/// twice gives identical entries.
pub fn finalize(table: &BookTable, max_weight: u16) -> Vec<PolyglotEntry> {
    let mut entries = normalize(table, max_weight);
    sort_entries(&mut entries);
    entries
}

/// Sorts entries by key, then by encoded move, comparing big-endian bytes.
pub fn sort_entries(entries: &mut [PolyglotEntry]) {
    entries.sort_by_key(PolyglotEntry::sort_key);
}

/// Writes entries in the given order. Entries must already be sorted for the book to be
/// searchable.
pub fn write_book<W: Write>(entries: &[PolyglotEntry], mut writer: W) -> std::io::Result<()> {
    for entry in entries {
        writer.write_all(&entry.to_bytes())?;
    }
    writer.flush()
}

/// Serializes entries into an in-memory book.
pub fn to_bytes(entries: &[PolyglotEntry]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(entries.len() * ENTRY_SIZE);
    for entry in entries {
        bytes.extend_from_slice(&entry.to_bytes());
    }
    bytes
}

/// Writes entries to a book file, replacing it if it exists.
pub fn save(entries: &[PolyglotEntry], path: &Path) -> Result<(), BookError> {
    write_book(entries, BufWriter::new(File::create(path)?))?;
    log::info!("Saved {} entries to {}", entries.len(), path.display());
    Ok(())
}
