//! One-ply greedy policy: play the move whose merges score best right now.

use crate::engine::{resolve_with, Board, Move, Position, WIN_VALUE};

/// Bonus for a merge that produces the winning tile.
pub const WIN_MERGE_BONUS: f64 = 10_000.0;
/// Points split over the merges still needed after a non-winning merge.
pub const PROGRESS_POINTS: f64 = 100.0;

/// Order used to break ties between equally scored moves.
pub const PREFERENCE_ORDER: [Move; 4] = [Move::Up, Move::Left, Move::Down, Move::Right];

/// Greedy merge maximizer.
///
/// Every direction is simulated on a copy of the board and scored by the
/// merges it performs; merges closer to the winning tile are worth more.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyMerge;

impl GreedyMerge {
    pub fn new() -> Self {
        GreedyMerge
    }

    /// Merge score for playing `dir`, or `None` if the move changes nothing.
    ///
    /// ```
    /// use reverse_2048::engine::{Board, Move};
    /// use reverse_2048::greedy::GreedyMerge;
    /// let b = Board::from_rows(&[[4, 4, 0], [0, 0, 0], [0, 0, 16]]).unwrap();
    /// assert_eq!(GreedyMerge::merge_score(b, Move::Left), Some(10_000.0));
    /// assert_eq!(GreedyMerge::merge_score(b, Move::Down), Some(0.0));
    /// ```
    pub fn merge_score(board: Board, dir: Move) -> Option<f64> {
        let mut score = 0.0;
        let outcome = resolve_with(board, dir, Position::ORIGIN, |merged| score += merge_points(merged));
        outcome.changed.then_some(score)
    }

    /// Best-scoring legal move, ties broken by [`PREFERENCE_ORDER`].
    /// `None` when no direction changes the board.
    pub fn best_move(&self, board: Board) -> Option<Move> {
        let mut best: Option<(Move, f64)> = None;
        for dir in PREFERENCE_ORDER {
            if let Some(score) = Self::merge_score(board, dir) {
                if best.map_or(true, |(_, top)| score > top) {
                    best = Some((dir, score));
                }
            }
        }
        best.map(|(dir, _)| dir)
    }

    /// Pick a move for `board`.
    ///
    /// Always returns a direction: when nothing is legal the first preferred
    /// direction comes back, so callers must check that it changes the board
    /// before committing it.
    ///
    /// ```
    /// use reverse_2048::engine::{resolve, Board, Position};
    /// use reverse_2048::greedy::GreedyMerge;
    /// use rand::{rngs::StdRng, SeedableRng};
    /// let mut rng = StdRng::seed_from_u64(1);
    /// let b = Board::new(128, 3, &mut rng).unwrap();
    /// let dir = GreedyMerge::new().choose_move(b, Position::ORIGIN);
    /// assert!(resolve(b, dir, Position::ORIGIN).changed);
    /// ```
    pub fn choose_move(&self, board: Board, _cursor: Position) -> Move {
        self.best_move(board).unwrap_or(PREFERENCE_ORDER[0])
    }
}

/// Points for one merge producing `merged`.
fn merge_points(merged: u32) -> f64 {
    if merged == WIN_VALUE {
        return WIN_MERGE_BONUS;
    }
    let merges_needed = merged.trailing_zeros() as i32 - WIN_VALUE.trailing_zeros() as i32;
    if merges_needed > 0 {
        PROGRESS_POINTS / merges_needed as f64
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{resolve, StartConfig};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn merge_points_scale_with_distance_to_win() {
        assert_eq!(merge_points(2), WIN_MERGE_BONUS);
        assert_eq!(merge_points(4), 100.0);
        assert_eq!(merge_points(8), 50.0);
        assert_eq!(merge_points(32), 25.0);
        assert_eq!(merge_points(1), 0.0);
    }

    #[test]
    fn prefers_highest_scoring_merge() {
        // Left merges 64+64 -> 32 (25 points); Up merges 8+8 -> 4 (100 points).
        let b = Board::from_rows(&[[64, 64, 8], [0, 0, 8], [0, 0, 0]]).unwrap();
        assert_eq!(GreedyMerge::merge_score(b, Move::Left), Some(25.0));
        assert_eq!(GreedyMerge::merge_score(b, Move::Up), Some(100.0));
        assert_eq!(GreedyMerge::new().best_move(b), Some(Move::Up));
    }

    #[test]
    fn ties_follow_preference_order() {
        // No merges anywhere; Up is illegal, Left is the next preference.
        let b = Board::from_rows(&[[0, 64, 0], [0, 0, 0], [0, 0, 0]]).unwrap();
        assert_eq!(GreedyMerge::merge_score(b, Move::Up), None);
        assert_eq!(GreedyMerge::new().best_move(b), Some(Move::Left));
        // Up and Left are illegal; Down comes before Right.
        let b = Board::from_rows(&[[64, 0, 0], [0, 0, 0], [0, 0, 0]]).unwrap();
        assert_eq!(GreedyMerge::new().best_move(b), Some(Move::Down));
    }

    #[test]
    fn stuck_board_returns_sentinel() {
        let b = Board::from_rows(&[[64, 32, 64], [32, 64, 32], [64, 32, 64]]).unwrap();
        let greedy = GreedyMerge::new();
        assert_eq!(greedy.best_move(b), None);
        let dir = greedy.choose_move(b, Position::ORIGIN);
        assert_eq!(dir, Move::Up);
        assert!(!resolve(b, dir, Position::ORIGIN).changed);
    }

    #[test]
    fn opening_move_is_always_legal() {
        let cfg = StartConfig::new(128, 3).unwrap();
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let b = cfg.initial_board(&mut rng);
            let dir = GreedyMerge::new().choose_move(b, Position::ORIGIN);
            assert!(resolve(b, dir, Position::ORIGIN).changed, "seed {seed}");
        }
    }
}
