//! Common interface for the move-selection policies a match can seat.

use crate::engine::{Board, Move, Position, SpawnSet};
use crate::expectimax::{Expectimax, ExpectimaxConfig};
use crate::greedy::GreedyMerge;

/// A policy that picks moves for one player.
///
/// `None` means the policy found no legal move; the caller treats it as a
/// stalemate for that player.
pub trait Strategy: Send {
    fn name(&self) -> &str;
    fn next_move(&mut self, board: Board, cursor: Position) -> Option<Move>;
}

impl Strategy for GreedyMerge {
    fn name(&self) -> &str {
        "Greedy"
    }

    fn next_move(&mut self, board: Board, _cursor: Position) -> Option<Move> {
        self.best_move(board)
    }
}

impl Strategy for Expectimax {
    fn name(&self) -> &str {
        "Expectimax"
    }

    fn next_move(&mut self, board: Board, cursor: Position) -> Option<Move> {
        self.choose_move(board, cursor)
    }
}

/// Default line-up: greedy as player 1, expectimax as player 2.
pub fn default_players(spawns: SpawnSet, cfg: ExpectimaxConfig) -> [Box<dyn Strategy>; 2] {
    [Box::new(GreedyMerge::new()), Box::new(Expectimax::with_config(spawns, cfg))]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policies_report_names_and_moves() {
        let b = Board::from_rows(&[[8, 8, 0], [0, 0, 0], [0, 0, 0]]).unwrap();
        let cfg = ExpectimaxConfig { depth: 2, ..Default::default() };
        let mut players = default_players(SpawnSet::for_start(128).unwrap(), cfg);
        assert_eq!(players[0].name(), "Greedy");
        assert_eq!(players[1].name(), "Expectimax");
        for p in players.iter_mut() {
            let dir = p.next_move(b, Position::ORIGIN).unwrap();
            assert_ne!(b.shift(dir), b);
        }
    }

    #[test]
    fn stuck_board_yields_none() {
        let b = Board::from_rows(&[[64, 32, 64], [32, 64, 32], [64, 32, 64]]).unwrap();
        let mut players = default_players(SpawnSet::for_start(128).unwrap(), ExpectimaxConfig { depth: 2, ..Default::default() });
        assert!(players.iter_mut().all(|p| p.next_move(b, Position::ORIGIN).is_none()));
    }
}
