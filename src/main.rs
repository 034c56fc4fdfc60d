use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Parser, Subcommand, ValueEnum};
use horsey_book::{
    book::{save, Book, BookBuilder, BookError, ScoringPolicy},
    config::{BookConfig, ConfigError, DEFAULT_MAX_PLIES, DEFAULT_MAX_WEIGHT},
    corpus::{read_first_game, read_games, CorpusError},
    key::KeyScheme,
    polyglot::CastlingConvention,
    verify::{Verifier, VerifyMode},
};
use shakmaty::{fen::Fen, san::San, uci::UciMove, CastlingMode, Chess, Position};
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Arguments {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Builds a book from PGN files or files of UCI move lines
    Build {
        /// Corpus files. Files ending in `.pgn` are read as PGN
        #[arg(required = true)]
        corpus: Vec<PathBuf>,
        /// Where to write the book
        #[arg(short, long)]
        output: PathBuf,
        /// Number of plies recorded per game
        #[arg(long, default_value_t = DEFAULT_MAX_PLIES)]
        max_plies: usize,
        /// Upper bound of the weights of a position
        #[arg(long, default_value_t = DEFAULT_MAX_WEIGHT)]
        max_weight: u16,
        #[arg(long, value_enum, default_value_t = Scoring::Result)]
        scoring: Scoring,
        #[arg(long, value_enum, default_value_t = Castling::KingTakesRook)]
        castling: Castling,
        #[arg(long, value_enum, default_value_t = Keys::Polyglot)]
        keys: Keys,
        /// Number of aggregation threads (defaults to the number of CPUs)
        #[arg(short, long)]
        workers: Option<usize>,
        /// Only reads that many games from the corpus
        #[arg(long)]
        max_games: Option<usize>,
    },
    /// Checks that a book covers the first game of a file, move by move
    Verify {
        book: PathBuf,
        /// PGN file, or file of UCI move lines
        line: PathBuf,
        #[arg(long, value_enum, default_value_t = Keys::Polyglot)]
        keys: Keys,
        /// Keeps checking after the first failure
        #[arg(long = "continue")]
        keep_going: bool,
    },
    /// Lists the book moves of a position
    Probe {
        book: PathBuf,
        /// Starting position as a FEN string
        #[arg(short, long)]
        fen: Option<String>,
        /// UCI moves played from the starting position
        #[arg(short, long, num_args = 0.., value_delimiter = ' ')]
        moves: Vec<String>,
        #[arg(long, value_enum, default_value_t = Keys::Polyglot)]
        keys: Keys,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum Scoring {
    /// Weights moves by the result of the game for the side that played them
    Result,
    /// Every played move counts once
    Uniform,
}
impl From<Scoring> for ScoringPolicy {
    fn from(scoring: Scoring) -> Self {
        match scoring {
            Scoring::Result => Self::ResultScored,
            Scoring::Uniform => Self::Uniform,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum Castling {
    KingTakesRook,
    KingToTarget,
}
impl From<Castling> for CastlingConvention {
    fn from(castling: Castling) -> Self {
        match castling {
            Castling::KingTakesRook => Self::KingTakesRook,
            Castling::KingToTarget => Self::KingToTarget,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum Keys {
    /// PolyGlot compatible keys
    Polyglot,
    /// Keys from a fixed-seed table, not readable by other PolyGlot tools
    Seeded,
}
impl From<Keys> for KeyScheme {
    fn from(keys: Keys) -> Self {
        match keys {
            Keys::Polyglot => Self::Polyglot,
            Keys::Seeded => Self::Seeded,
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Book(#[from] BookError),
    #[error(transparent)]
    Corpus(#[from] CorpusError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Invalid position {fen:?}: {reason}")]
    Position { fen: String, reason: String },
    #[error("Illegal move {0}")]
    IllegalMove(String),
}

fn build(corpus: &[PathBuf], output: &Path, config: BookConfig) -> Result<ExitCode, CliError> {
    let builder = BookBuilder::new(config)?;
    let mut games = vec![];
    for path in corpus {
        games.extend(read_games(path)?);
        if builder
            .config()
            .max_games
            .is_some_and(|max_games| games.len() >= max_games)
        {
            break;
        }
    }

    let (entries, stats) = builder.build(&games);
    println!("{stats}");
    save(&entries, output)?;
    Ok(ExitCode::SUCCESS)
}

fn verify(
    book: &Path,
    line: &Path,
    keys: Keys,
    mode: VerifyMode,
) -> Result<ExitCode, CliError> {
    let book = Book::open(book)?;
    let (start, moves) = read_first_game(line)?.resolve()?.into_complete()?;
    let report = Verifier::new(&book)
        .with_keyer(KeyScheme::from(keys))
        .with_mode(mode)
        .verify(&start, &moves);

    for ply in &report.plies {
        println!("{ply}");
    }
    if report.is_success() {
        println!("Book covers all {} moves", report.line_length);
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{} moves failed", report.failures().count());
        Ok(ExitCode::FAILURE)
    }
}

fn probe(
    book: &Path,
    fen: Option<String>,
    moves: &[String],
    keys: Keys,
) -> Result<ExitCode, CliError> {
    let book = Book::open(book)?;
    let mut position = match fen {
        Some(fen) => {
            let invalid = |reason: String| CliError::Position {
                fen: fen.clone(),
                reason,
            };
            fen.parse::<Fen>()
                .map_err(|e| invalid(e.to_string()))?
                .into_position::<Chess>(CastlingMode::Standard)
                .map_err(|e| invalid(e.to_string()))?
        }
        None => Chess::default(),
    };
    for uci in moves {
        let action = uci
            .parse::<UciMove>()
            .ok()
            .and_then(|uci| uci.to_move(&position).ok())
            .ok_or_else(|| CliError::IllegalMove(uci.clone()))?;
        position.play_unchecked(&action);
    }

    let entries = book.lookup_position(&position, &KeyScheme::from(keys));
    let total: u32 = entries.iter().map(|entry| u32::from(entry.weight)).sum();
    println!("{} book moves", entries.len());
    for entry in entries {
        let san = entry
            .action
            .to_move(&position)
            .map(|action| San::from_move(&position, &action).to_string())
            .unwrap_or_else(|| entry.action.to_string());
        println!(
            "{san:>8} {:>6} {:>6.2}%",
            entry.weight,
            100. * f64::from(entry.weight) / f64::from(total.max(1))
        );
    }
    Ok(ExitCode::SUCCESS)
}

pub fn main() -> ExitCode {
    let args = Arguments::parse();
    env_logger::init();

    let outcome = match args.command {
        Command::Build {
            corpus,
            output,
            max_plies,
            max_weight,
            scoring,
            castling,
            keys,
            workers,
            max_games,
        } => {
            let mut config = BookConfig::new()
                .with_max_plies(max_plies)
                .with_max_weight(max_weight)
                .with_scoring(scoring.into())
                .with_castling(castling.into())
                .with_keys(keys.into())
                .with_max_games(max_games);
            if let Some(workers) = workers {
                config = config.with_workers(workers);
            }
            build(&corpus, &output, config)
        }
        Command::Verify {
            book,
            line,
            keys,
            keep_going,
        } => {
            let mode = if keep_going {
                VerifyMode::Continue
            } else {
                VerifyMode::StopAtFirstFailure
            };
            verify(&book, &line, keys, mode)
        }
        Command::Probe {
            book,
            fen,
            moves,
            keys,
        } => probe(&book, fen, &moves, keys),
    };

    outcome.unwrap_or_else(|e| {
        log::error!("{e}");
        ExitCode::FAILURE
    })
}
