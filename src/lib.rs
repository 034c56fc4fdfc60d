//! # Horsey book
//! Builds, reads and verifies PolyGlot opening books.
//!
//! Books are built by replaying a corpus of games, scoring each move by how well
//! the game went for the side that played it, normalizing those scores per position
//! and writing the result as sorted 16 byte records. The same records can then be
//! probed with a binary search, or checked against a reference line.
//!
//! Chess rules (move generation, FEN, SAN) are provided by [`shakmaty`], and PGN
//! parsing by [`pgn_reader`].

pub mod book;
pub mod config;
pub mod corpus;
pub mod key;
pub mod polyglot;
pub mod verify;
