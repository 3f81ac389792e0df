use std::collections::HashMap;

use log::debug;

use crate::engine::{Board, Move, Position, SpawnSet, TerminalReason};
use crate::greedy::PREFERENCE_ORDER;

use super::heuristic::Heuristic;
use super::{chance_outcomes, BranchEval, ExpectimaxConfig, Node, SearchStats};

type CacheKey = (Board, u32, Node);

/// Single-threaded Expectimax search.
///
/// The memo table is owned by the searcher and keyed by `(board, depth, node)`.
/// It carries no notion of which real position it was built for, so every
/// top-level call ([`Self::choose_move`], [`Self::branch_evals`],
/// [`Self::state_value`]) starts from an empty table.
pub struct Expectimax {
    cfg: ExpectimaxConfig,
    spawns: SpawnSet,
    heuristic: Heuristic,
    cache: HashMap<CacheKey, f64>,
    stats: SearchStats,
}

impl Expectimax {
    pub fn new(spawns: SpawnSet) -> Self {
        Self::with_config(spawns, ExpectimaxConfig::default())
    }

    pub fn with_config(spawns: SpawnSet, cfg: ExpectimaxConfig) -> Self {
        Self { heuristic: Heuristic::new(&cfg), cfg, spawns, cache: HashMap::new(), stats: SearchStats::default() }
    }

    #[inline]
    pub fn config(&self) -> &ExpectimaxConfig {
        &self.cfg
    }

    /// Pick the move with the highest expected value, or `None` when no
    /// direction changes the board. Ties go to Up, Left, Down, Right in that order.
    ///
    /// The cursor is cosmetic and does not influence the search.
    pub fn choose_move(&mut self, board: Board, _cursor: Position) -> Option<Move> {
        self.best_move(board)
    }

    /// Compute the best move using expectimax.
    ///
    /// Example
    /// ```
    /// use reverse_2048::engine::{Board, Move, SpawnSet};
    /// use reverse_2048::expectimax::{Expectimax, ExpectimaxConfig};
    /// let b = Board::from_rows(&[[0, 0, 0], [0, 0, 0], [4, 4, 0]]).unwrap();
    /// let cfg = ExpectimaxConfig { depth: 2, ..Default::default() };
    /// let mut ex = Expectimax::with_config(SpawnSet::for_start(128).unwrap(), cfg);
    /// // Either horizontal merge reaches the winning tile.
    /// assert!(matches!(ex.best_move(b), Some(Move::Left) | Some(Move::Right)));
    /// ```
    pub fn best_move(&mut self, board: Board) -> Option<Move> {
        let branches = self.branch_evals(board);
        let mut best: Option<(Move, f64)> = None;
        for dir in PREFERENCE_ORDER {
            let branch = branches[dir_index(dir)];
            if branch.legal && best.map_or(true, |(_, ev)| branch.ev > ev) {
                best = Some((dir, branch.ev));
            }
        }
        debug!(
            "expectimax picked {:?} after {} nodes ({} cache hits)",
            best.map(|(dir, _)| dir),
            self.stats.nodes,
            self.stats.cache_hits
        );
        best.map(|(dir, _)| dir)
    }

    /// Compute EV for each direction.
    ///
    /// Returns a fixed array in order: `[Up, Down, Left, Right]` and marks
    /// illegal moves as `legal=false`.
    pub fn branch_evals(&mut self, board: Board) -> [BranchEval; 4] {
        self.begin_decision();
        let child_depth = self.cfg.depth.saturating_sub(1);
        let out = Move::ALL.map(|dir| {
            let next = board.shift(dir);
            if next != board {
                let ev = self.expectimax(next, Node::Chance, child_depth);
                BranchEval { dir, ev, legal: true }
            } else {
                BranchEval { dir, ev: 0.0, legal: false }
            }
        });
        self.finish_decision();
        out
    }

    /// Value of `board` as a max node at the configured depth.
    pub fn state_value(&mut self, board: Board) -> f64 {
        self.begin_decision();
        let value = self.expectimax(board, Node::Max, self.cfg.depth);
        self.finish_decision();
        value
    }

    /// Value of a single search node, reusing whatever the memo table holds.
    ///
    /// Unlike the top-level entry points this does not clear the table first.
    pub fn node_value(&mut self, board: Board, node: Node, depth: u32) -> f64 {
        self.expectimax(board, node, depth)
    }

    /// Drop every memoized node value.
    #[inline]
    pub fn reset_cache(&mut self) {
        self.cache.clear();
    }

    /// Number of memoized node values.
    #[inline]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Statistics collected from the last decision.
    #[inline]
    pub fn last_stats(&self) -> SearchStats {
        self.stats
    }

    /// Reset accumulated stats to zero.
    #[inline]
    pub fn reset_stats(&mut self) {
        self.stats = SearchStats::default();
    }

    fn begin_decision(&mut self) {
        self.reset_cache();
        self.stats.nodes = 0;
        self.stats.cache_hits = 0;
    }

    fn finish_decision(&mut self) {
        self.stats.peak_nodes = self.stats.peak_nodes.max(self.stats.nodes);
    }

    fn expectimax(&mut self, board: Board, node: Node, depth: u32) -> f64 {
        self.stats.nodes += 1;
        let key = (board, depth, node);
        if self.cfg.cache_enabled {
            if let Some(&score) = self.cache.get(&key) {
                self.stats.cache_hits += 1;
                return score;
            }
        }
        let score = if board.has_won() {
            f64::INFINITY
        } else if depth == 0 || board.classify() == TerminalReason::StalemateBoardFull {
            self.heuristic.evaluate(board)
        } else {
            match node {
                Node::Max => self.evaluate_max(board, depth),
                Node::Chance => self.evaluate_chance(board, depth),
            }
        };
        if self.cfg.cache_enabled {
            self.cache.insert(key, score);
        }
        score
    }

    fn evaluate_max(&mut self, board: Board, depth: u32) -> f64 {
        let mut best = f64::NEG_INFINITY;
        for dir in Move::ALL {
            let next = board.shift(dir);
            if next != board {
                best = best.max(self.expectimax(next, Node::Chance, depth - 1));
            }
        }
        if best == f64::NEG_INFINITY {
            self.heuristic.evaluate(board)
        } else {
            best
        }
    }

    fn evaluate_chance(&mut self, board: Board, depth: u32) -> f64 {
        if board.count_empty() == 0 {
            return self.expectimax(board, Node::Max, depth - 1);
        }
        let spawns = self.spawns;
        let mut score = 0.0;
        for (next, prob) in chance_outcomes(board, &spawns) {
            score += prob * self.expectimax(next, Node::Max, depth - 1);
        }
        score
    }
}

#[inline]
fn dir_index(dir: Move) -> usize {
    match dir {
        Move::Up => 0,
        Move::Down => 1,
        Move::Left => 2,
        Move::Right => 3,
    }
}
