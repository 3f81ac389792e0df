//! reverse-2048: the 2048 tile game played backwards, and two players for it.
//!
//! Merging two equal tiles halves their value; a board is won once it holds
//! the tile `2`. This crate provides:
//! - A packed `Board` and the movement/spawn/terminal rules (`engine`)
//! - A one-ply greedy merge player (`greedy`) and an Expectimax player (`expectimax`)
//! - Matches between two players on identical boards (`session`), batch runs
//!   with summary statistics (`tester`), reports (`report`) and a binary match
//!   trace format (`trace`)
//!
//! Quick start:
//! ```
//! use reverse_2048::engine::{Move, StartConfig};
//! use reverse_2048::expectimax::ExpectimaxConfig;
//! use reverse_2048::session::{Match, MatchOptions};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let start = StartConfig::new(128, 3).unwrap();
//! let mut rng = StdRng::seed_from_u64(42);
//! let b0 = start.initial_board(&mut rng);
//! let b1 = b0.shift(Move::Left);
//! assert!(b1.count_empty() >= b0.count_empty());
//!
//! let search = ExpectimaxConfig { depth: 3, ..Default::default() };
//! let result = Match::with_options(start, MatchOptions { seed: 42, ..Default::default() }, search)
//!     .play_until_over();
//! assert!(result.reasons.iter().all(|r| r.is_over()));
//! ```
pub mod config;
pub mod engine;
pub mod expectimax;
pub mod greedy;
pub mod report;
pub mod session;
pub mod strategy;
pub mod tester;
pub mod trace;
