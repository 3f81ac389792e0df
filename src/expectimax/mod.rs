//! Expectimax search policy for reverse 2048.
//!
//! The search alternates two node types:
//! - Max nodes try every legal move and keep the best value.
//! - Chance nodes average over every (empty cell, spawn value) pair, each with
//!   probability `1 / (empty cells * spawn values)`.
//!
//! Leaves are scored by a position-weighted heuristic (see [`Heuristic`]);
//! boards holding the winning tile score `+inf`. Node values are memoized per
//! decision and the table is cleared before every new top-level decision.
//!
//! Quick start
//! ```
//! use reverse_2048::engine::{Board, Position, StartConfig};
//! use reverse_2048::expectimax::{Expectimax, ExpectimaxConfig};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let start = StartConfig::new(256, 3).unwrap();
//! let mut rng = StdRng::seed_from_u64(123);
//! let b0 = start.initial_board(&mut rng);
//!
//! let cfg = ExpectimaxConfig { depth: 3, ..Default::default() };
//! let mut ex = Expectimax::with_config(start.spawn_set(), cfg);
//! assert!(ex.choose_move(b0, Position::ORIGIN).is_some());
//! ```

use crate::engine::{Board, Move, SpawnSet};

mod heuristic;
mod search_seq;

pub use heuristic::Heuristic;
pub use search_seq::Expectimax;

/// Configurable knobs for Expectimax.
///
/// - `depth`: plies searched below the root; moves and spawns each use one.
/// - `decay`: position weight decay, `decay^(distance to bottom-right corner)`.
/// - `value_weight`, `empty_bonus`, `merge_bonus`: heuristic weights.
/// - `cache_enabled`: enable/disable memoization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpectimaxConfig {
    pub depth: u32,
    pub decay: f64,
    /// Numerator `K` of the per-tile term `K / value`.
    pub value_weight: f64,
    pub empty_bonus: f64,
    pub merge_bonus: f64,
    pub cache_enabled: bool,
}

impl Default for ExpectimaxConfig {
    fn default() -> Self {
        Self {
            depth: 7,
            decay: 0.7,
            value_weight: 1000.0,
            empty_bonus: 4.0,
            merge_bonus: 10.0,
            cache_enabled: true,
        }
    }
}

/// Kind of search node; part of the memoization key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    Max,
    Chance,
}

/// Per-branch expected value at the root.
///
/// - `ev` is the expected value for taking `dir` from the current board.
/// - `legal` is false when the move is a no-op for the current board.
#[derive(Debug, Clone, Copy)]
pub struct BranchEval {
    pub dir: Move,
    pub ev: f64,
    pub legal: bool,
}

/// Basic search stats for a single decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    pub nodes: u64,
    pub cache_hits: u64,
    pub peak_nodes: u64,
}

/// Every board a chance node can lead to, with its probability.
///
/// Cells and values are drawn independently and uniformly, so each of the
/// `empty * values` outcomes has the same weight and the weights sum to one.
///
/// ```
/// use reverse_2048::engine::{Board, SpawnSet};
/// use reverse_2048::expectimax::chance_outcomes;
/// let b = Board::from_rows(&[[64, 0, 0], [0, 0, 0], [0, 0, 0]]).unwrap();
/// let spawns = SpawnSet::for_start(128).unwrap();
/// let total: f64 = chance_outcomes(b, &spawns).map(|(_, p)| p).sum();
/// assert!((total - 1.0).abs() < 1e-12);
/// ```
pub fn chance_outcomes(board: Board, spawns: &SpawnSet) -> impl Iterator<Item = (Board, f64)> + '_ {
    let outcomes = board.count_empty() * spawns.len();
    let prob = if outcomes == 0 { 0.0 } else { 1.0 / outcomes as f64 };
    board
        .empty_cells()
        .flat_map(move |pos| spawns.values().iter().map(move |&value| (board.with_tile(pos, value), prob)))
}
