//! # PGN games
//! Streams [`GameRecord`]s out of PGN text. Only the mainline is kept: variations,
//! comments and annotation glyphs are skipped.
//!
//! The `Result` tag gives the game result, and a `FEN` tag gives the starting position
//! unless the game explicitly sets `SetUp` to `0`. This is looser than the PGN standard,
//! which pairs `FEN` with `SetUp "1"`: a `FEN` tag without any `SetUp` tag is honoured
//! too, as many exporters omit `SetUp`.

use std::io::Read;

use pgn_reader::{BufferedReader, RawHeader, SanPlus, Skip, Visitor};

use super::{CorpusError, GameRecord, GameResult, Notation};

/// Visitor collecting the tags and mainline of one game at a time.
#[derive(Default)]
struct GameCollector {
    record: GameRecord,
    fen: Option<String>,
    setup_disabled: bool,
}
impl Visitor for GameCollector {
    type Result = GameRecord;

    fn begin_game(&mut self) {
        *self = Self::default();
    }

    fn header(&mut self, key: &[u8], value: RawHeader<'_>) {
        match key {
            b"Result" => self.record.result = GameResult::from_tag(&value.decode_utf8_lossy()),
            b"FEN" => self.fen = Some(value.decode_utf8_lossy().trim().to_string()),
            b"SetUp" => self.setup_disabled = value.decode_utf8_lossy().trim() == "0",
            _ => {}
        }
    }

    fn end_headers(&mut self) -> Skip {
        if !self.setup_disabled {
            self.record.setup = self.fen.take();
        }
        Skip(false)
    }

    fn san(&mut self, san_plus: SanPlus) {
        self.record.moves.push(Notation::San(san_plus));
    }

    fn begin_variation(&mut self) -> Skip {
        Skip(true)
    }

    fn end_game(&mut self) -> Self::Result {
        std::mem::take(&mut self.record)
    }
}

/// Iterator over the games of a PGN stream.
pub struct PgnGames<R> {
    reader: BufferedReader<R>,
    collector: GameCollector,
    failed: bool,
}
impl<R: Read> PgnGames<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufferedReader::new(reader),
            collector: GameCollector::default(),
            failed: false,
        }
    }
}
impl<R: Read> Iterator for PgnGames<R> {
    type Item = Result<GameRecord, CorpusError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let game = self.reader.read_game(&mut self.collector);
        self.failed = game.is_err();
        game.map_err(CorpusError::from).transpose()
    }
}
