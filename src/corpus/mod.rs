//! # Game corpus
//! Books are built from collections of played games. Each game provides its result,
//! an optional starting position and the ordered list of moves that were played.
//!
//! Two formats are understood:
//! - PGN, through [`pgn_reader`] (see [`pgn`])
//! - one game per line of UCI moves (see [`uci`])

use std::{fs::File, io::BufReader, path::Path, str::FromStr};

use shakmaty::{
    fen::Fen, san::SanPlus, uci::UciMove, CastlingMode, Chess, Move, Position,
};
use thiserror::Error;

pub mod pgn;
pub mod uci;

/// Errors that may happen while reading games.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Could not read corpus: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid starting position {fen:?}: {reason}")]
    InvalidFen { fen: String, reason: String },
    #[error("Illegal move at ply {ply}: {notation}")]
    IllegalMove { ply: usize, notation: String },
    #[error("Invalid game result: {0}")]
    InvalidResult(String),
    #[error("Corpus contains no game")]
    NoGame,
}

/// Declared outcome of a game.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum GameResult {
    WhiteWins,
    Draw,
    BlackWins,
    #[default]
    Unknown,
}
impl GameResult {
    /// Reads the value of a PGN `Result` tag, falling back to [`GameResult::Unknown`]
    /// for anything unrecognized.
    pub fn from_tag(tag: &str) -> Self {
        tag.parse().unwrap_or(Self::Unknown)
    }
}
impl FromStr for GameResult {
    type Err = CorpusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "1-0" => Self::WhiteWins,
            "0-1" => Self::BlackWins,
            "1/2-1/2" => Self::Draw,
            "*" => Self::Unknown,
            other => return Err(CorpusError::InvalidResult(other.to_string())),
        })
    }
}
impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::WhiteWins => "1-0",
                Self::BlackWins => "0-1",
                Self::Draw => "1/2-1/2",
                Self::Unknown => "*",
            }
        )
    }
}

/// A move as written in a game record, not yet checked against a position.
#[derive(Clone, Debug)]
pub enum Notation {
    San(SanPlus),
    Uci(UciMove),
}
impl Notation {
    /// Resolves this notation to a legal move in the given position.
    pub fn to_move(&self, position: &Chess) -> Option<Move> {
        match self {
            Self::San(san_plus) => san_plus.san.to_move(position).ok(),
            Self::Uci(uci) => uci.to_move(position).ok(),
        }
    }
}
impl std::fmt::Display for Notation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::San(san_plus) => write!(f, "{san_plus}"),
            Self::Uci(uci) => write!(f, "{uci}"),
        }
    }
}

/// A single game of the corpus.
#[derive(Clone, Debug, Default)]
pub struct GameRecord {
    pub result: GameResult,
    /// Starting position as a FEN string, if the game did not start from the initial
    /// position.
    pub setup: Option<String>,
    pub moves: Vec<Notation>,
}
impl GameRecord {
    /// Returns the position this game starts from.
    /// # Errors
    /// Fails if the game declares a starting position that cannot be parsed or set up.
    pub fn start_position(&self) -> Result<Chess, CorpusError> {
        let Some(fen) = &self.setup else {
            return Ok(Chess::default());
        };
        let invalid = |reason: String| CorpusError::InvalidFen {
            fen: fen.clone(),
            reason,
        };
        fen.parse::<Fen>()
            .map_err(|e| invalid(e.to_string()))?
            .into_position(CastlingMode::Standard)
            .map_err(|e| invalid(e.to_string()))
    }

    /// Replays the game, resolving each recorded move to a legal move.
    ///
    /// Replaying stops at the first move that is not legal in its position. Moves
    /// before it are kept, and the offending move is described in
    /// [`ResolvedGame::illegal`].
    /// # Errors
    /// Fails if the starting position is invalid.
    pub fn resolve(&self) -> Result<ResolvedGame, CorpusError> {
        let start = self.start_position()?;
        let mut position = start.clone();
        let mut moves = Vec::with_capacity(self.moves.len());
        let mut illegal = None;

        for (ply, notation) in self.moves.iter().enumerate() {
            match notation.to_move(&position) {
                Some(action) => {
                    position.play_unchecked(&action);
                    moves.push(action);
                }
                None => {
                    illegal = Some(CorpusError::IllegalMove {
                        ply: ply + 1,
                        notation: notation.to_string(),
                    });
                    break;
                }
            }
        }

        Ok(ResolvedGame {
            start,
            moves,
            illegal,
        })
    }
}

/// A game whose moves have been checked for legality.
#[derive(Debug)]
pub struct ResolvedGame {
    pub start: Chess,
    /// Legal moves, in order, up to the first illegal one.
    pub moves: Vec<Move>,
    /// The first move that could not be played, if any.
    pub illegal: Option<CorpusError>,
}
impl ResolvedGame {
    /// Returns the game's moves, failing if any of them was illegal.
    pub fn into_complete(self) -> Result<(Chess, Vec<Move>), CorpusError> {
        match self.illegal {
            Some(error) => Err(error),
            None => Ok((self.start, self.moves)),
        }
    }
}

/// Supported corpus file formats.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum CorpusFormat {
    Pgn,
    UciLines,
}
impl CorpusFormat {
    /// Guesses the format from a file extension: `.pgn` files are PGN, anything else is
    /// read as UCI lines.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|extension| extension.to_str()) {
            Some(extension) if extension.eq_ignore_ascii_case("pgn") => Self::Pgn,
            _ => Self::UciLines,
        }
    }
}

/// Reads every game of a corpus file.
pub fn read_games(path: &Path) -> Result<Vec<GameRecord>, CorpusError> {
    let file = BufReader::new(File::open(path)?);
    let games = match CorpusFormat::from_path(path) {
        CorpusFormat::Pgn => pgn::PgnGames::new(file).collect::<Result<Vec<_>, _>>()?,
        CorpusFormat::UciLines => uci::UciLines::new(file).collect::<Result<Vec<_>, _>>()?,
    };
    log::info!("Read {} games from {}", games.len(), path.display());
    Ok(games)
}

/// Reads the first game of a corpus file.
pub fn read_first_game(path: &Path) -> Result<GameRecord, CorpusError> {
    let file = BufReader::new(File::open(path)?);
    let first = match CorpusFormat::from_path(path) {
        CorpusFormat::Pgn => pgn::PgnGames::new(file).next(),
        CorpusFormat::UciLines => uci::UciLines::new(file).next(),
    };
    first.unwrap_or(Err(CorpusError::NoGame))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_result_tags() {
        assert_eq!(GameResult::from_tag("1-0"), GameResult::WhiteWins);
        assert_eq!(GameResult::from_tag("0-1"), GameResult::BlackWins);
        assert_eq!(GameResult::from_tag("1/2-1/2"), GameResult::Draw);
        assert_eq!(GameResult::from_tag("*"), GameResult::Unknown);
        assert_eq!(GameResult::from_tag("forfeit"), GameResult::Unknown);
        assert!("2-0".parse::<GameResult>().is_err());
    }

    #[test]
    fn resolve_stops_at_illegal_move() {
        let game = uci::parse_line("e2e4 e7e5 e1e3 g8f6").unwrap();
        let resolved = game.resolve().unwrap();
        assert_eq!(resolved.moves.len(), 2);
        assert!(matches!(
            resolved.illegal,
            Some(CorpusError::IllegalMove { ply: 3, .. })
        ));
        assert!(resolved.into_complete().is_err());
    }

    #[test]
    fn custom_start_position() {
        let game = GameRecord {
            setup: Some("4k3/8/8/8/8/8/8/4K2R w K - 0 1".to_string()),
            ..Default::default()
        };
        assert_ne!(
            game.start_position().unwrap().board(),
            Chess::default().board()
        );

        let broken = GameRecord {
            setup: Some("not a fen".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            broken.start_position(),
            Err(CorpusError::InvalidFen { .. })
        ));
    }

    #[test]
    fn one_bad_line_does_not_lose_the_corpus() {
        let path =
            std::env::temp_dir().join(format!("horsey-corpus-{}.txt", std::process::id()));
        std::fs::write(
            &path,
            b"e2e4 e7e5 1-0\ne2e4 1-0 e7e5\ne2e4 \xff\xfe 1-0\nd2d4 d7d5 0-1\n",
        )
        .unwrap();
        let games = read_games(&path);
        std::fs::remove_file(&path).unwrap();

        let games = games.unwrap();
        assert_eq!(games.len(), 3);
        assert_eq!(games[0].moves.len(), 2);
        assert_eq!(games[1].moves.len(), 1);
        assert_eq!(games[2].result, GameResult::BlackWins);
        assert_eq!(games[2].moves.len(), 2);
    }

    #[test]
    fn first_game_of_a_corpus() {
        let path =
            std::env::temp_dir().join(format!("horsey-first-{}.txt", std::process::id()));
        std::fs::write(&path, "# reference line\n\ng1f3 d7d5 *\ne2e4 1-0\n").unwrap();
        let first = read_first_game(&path);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(first.unwrap().moves.len(), 2);

        assert!(matches!(
            read_first_game(&std::env::temp_dir().join("horsey-corpus-missing.txt")),
            Err(CorpusError::Io(_))
        ));
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(CorpusFormat::from_path(Path::new("games.PGN")), CorpusFormat::Pgn);
        assert_eq!(
            CorpusFormat::from_path(Path::new("lines.txt")),
            CorpusFormat::UciLines
        );
    }
}
