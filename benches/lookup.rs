use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use horsey_book::{
    book::{to_bytes, Book, BookBuilder},
    config::BookConfig,
    corpus::{GameRecord, GameResult, Notation},
    key::{KeyScheme, PolyglotKeyer, PositionKeyer, SeededKeyer},
};
use rand::{rngs::SmallRng, seq::SliceRandom, Rng, SeedableRng};
use shakmaty::{CastlingMode, Chess, Position};

/// Plays random legal games from the initial position.
fn random_games(count: usize, plies: usize) -> Vec<GameRecord> {
    let mut rng = SmallRng::seed_from_u64(0xB00C);
    let results = [GameResult::WhiteWins, GameResult::Draw, GameResult::BlackWins];
    (0..count)
        .map(|_| {
            let mut position = Chess::default();
            let mut moves = vec![];
            for _ in 0..plies {
                let legal = position.legal_moves();
                let Some(action) = legal.choose(&mut rng) else {
                    break;
                };
                moves.push(Notation::Uci(action.to_uci(CastlingMode::Standard)));
                position.play_unchecked(action);
            }
            GameRecord {
                result: results[rng.gen_range(0..results.len())],
                setup: None,
                moves,
            }
        })
        .collect()
}

fn book_and_keys() -> (Book, Vec<u64>) {
    let games = random_games(2000, 16);
    let builder = BookBuilder::new(BookConfig::new()).unwrap();
    let book = Book::from_entries(builder.build(&games).0);
    let keys = book.entries().iter().map(|entry| entry.key).collect();
    (book, keys)
}

fn lookup(c: &mut Criterion) {
    let (book, keys) = book_and_keys();

    c.bench_function("lookup hits", |b| {
        b.iter(|| {
            for &key in &keys {
                black_box(book.lookup(black_box(key)));
            }
        })
    });
    c.bench_function("lookup misses", |b| {
        let mut rng = SmallRng::seed_from_u64(7);
        b.iter(|| black_box(book.lookup(black_box(rng.gen()))))
    });
    c.bench_function("load book", |b| {
        let bytes = to_bytes(book.entries());
        b.iter(|| Book::from_bytes(black_box(&bytes)).unwrap())
    });
}

fn keys(c: &mut Criterion) {
    let positions: Vec<Chess> = random_games(100, 40)
        .into_iter()
        .filter_map(|game| {
            let (start, moves) = game.resolve().ok()?.into_complete().ok()?;
            Some(moves.iter().fold(start, |mut position, action| {
                position.play_unchecked(action);
                position
            }))
        })
        .collect();

    c.bench_function("polyglot keys", |b| {
        b.iter(|| {
            for position in &positions {
                black_box(PolyglotKeyer.key(black_box(position)));
            }
        })
    });
    c.bench_function("seeded keys", |b| {
        b.iter(|| {
            for position in &positions {
                black_box(SeededKeyer.key(black_box(position)));
            }
        })
    });
}

fn build(c: &mut Criterion) {
    let games = random_games(500, 20);
    c.bench_function("build 500 games", |b| {
        b.iter_batched(
            || BookBuilder::new(BookConfig::new().with_keys(KeyScheme::Polyglot)).unwrap(),
            |builder| builder.build(black_box(&games)),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, lookup, keys, build);
criterion_main!(benches);
