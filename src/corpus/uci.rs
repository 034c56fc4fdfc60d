//! # UCI move lines
//! A lightweight corpus format: one game per line, moves in UCI notation separated by
//! whitespace, optionally followed by a result token.
//!
//! ```text
//! # comments and blank lines are ignored
//! e2e4 e7e5 g1f3 b8c6 1-0
//! d2d4 d7d5 c2c4
//! ```
//!
//! Games always start from the initial position. A malformed line only affects its own
//! game: it is truncated, or skipped when it is not valid UTF-8.

use std::io::BufRead;

use shakmaty::uci::UciMove;

use super::{CorpusError, GameRecord, GameResult, Notation};

/// Parses a single line, returning `None` for blank lines and comments.
///
/// A token that is not a UCI move ends the game: the moves before it are kept. A result
/// token also ends the game, and anything after it is ignored.
pub fn parse_line(line: &str) -> Option<GameRecord> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let mut record = GameRecord::default();
    let mut tokens = line.split_whitespace().peekable();
    while let Some(token) = tokens.next() {
        if let Ok(result) = token.parse::<GameResult>() {
            if tokens.peek().is_some() {
                log::warn!(
                    "Result {token} before the end of the line, ignoring the tokens after it"
                );
            }
            record.result = result;
            break;
        }
        match token.parse::<UciMove>() {
            Ok(uci) => record.moves.push(Notation::Uci(uci)),
            Err(_) => {
                log::warn!(
                    "Unparseable move {token:?} at ply {}, ignoring the rest of the line",
                    record.moves.len() + 1
                );
                break;
            }
        }
    }

    Some(record)
}

/// Iterator over the games of a UCI lines stream.
///
/// Only I/O failures of the underlying reader are reported as errors.
pub struct UciLines<R> {
    reader: R,
    buffer: Vec<u8>,
    line_number: usize,
}
impl<R: BufRead> UciLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: vec![],
            line_number: 0,
        }
    }
}
impl<R: BufRead> Iterator for UciLines<R> {
    type Item = Result<GameRecord, CorpusError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_until(b'\n', &mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => self.line_number += 1,
                Err(e) => return Some(Err(e.into())),
            }

            let Ok(line) = std::str::from_utf8(&self.buffer) else {
                log::warn!("Line {} is not valid UTF-8, skipping it", self.line_number);
                continue;
            };
            if let Some(game) = parse_line(line) {
                return Some(Ok(game));
            }
        }
    }
}
