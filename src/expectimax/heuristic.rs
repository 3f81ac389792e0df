use crate::engine::{Board, MAX_GRID_SIZE, MIN_GRID_SIZE};

use super::ExpectimaxConfig;

const CELLS: usize = MAX_GRID_SIZE * MAX_GRID_SIZE;
const SIZES: usize = MAX_GRID_SIZE - MIN_GRID_SIZE + 1;

/// Static evaluation of a board.
///
/// `sum(K / value * decay^d) + empty_bonus * empty + merge_bonus * pairs`, where
/// `d` is the Manhattan distance of the cell to the bottom-right corner and
/// `pairs` counts adjacent equal tiles. Small tiles near the corner score high.
#[derive(Debug, Clone)]
pub struct Heuristic {
    weights: [[f64; CELLS]; SIZES],
    value_weight: f64,
    empty_bonus: f64,
    merge_bonus: f64,
}

impl Heuristic {
    pub fn new(cfg: &ExpectimaxConfig) -> Self {
        let mut weights = [[0.0; CELLS]; SIZES];
        for (slot, table) in weights.iter_mut().enumerate() {
            let n = slot + MIN_GRID_SIZE;
            for row in 0..n {
                for col in 0..n {
                    let distance = (n - 1 - row) + (n - 1 - col);
                    table[row * n + col] = cfg.decay.powi(distance as i32);
                }
            }
        }
        Self {
            weights,
            value_weight: cfg.value_weight,
            empty_bonus: cfg.empty_bonus,
            merge_bonus: cfg.merge_bonus,
        }
    }

    /// Position weight of `(row, col)` on a board of side `size`.
    #[inline]
    pub fn position_weight(&self, size: usize, row: usize, col: usize) -> f64 {
        self.weights[size - MIN_GRID_SIZE][row * size + col]
    }

    pub fn evaluate(&self, board: Board) -> f64 {
        let n = board.size();
        let table = &self.weights[n - MIN_GRID_SIZE];
        let mut score = 0.0;
        let mut empty = 0usize;
        for row in 0..n {
            for col in 0..n {
                match board.tile(row, col) {
                    0 => empty += 1,
                    value => score += self.value_weight / value as f64 * table[row * n + col],
                }
            }
        }
        score + self.empty_bonus * empty as f64 + self.merge_bonus * board.adjacent_pairs() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heuristic() -> Heuristic {
        Heuristic::new(&ExpectimaxConfig::default())
    }

    #[test]
    fn weights_decay_from_bottom_right() {
        let h = heuristic();
        assert_eq!(h.position_weight(3, 2, 2), 1.0);
        assert!((h.position_weight(3, 2, 1) - 0.7).abs() < 1e-12);
        assert!((h.position_weight(3, 0, 0) - 0.7f64.powi(4)).abs() < 1e-12);
        assert!((h.position_weight(5, 0, 0) - 0.7f64.powi(8)).abs() < 1e-12);
    }

    #[test]
    fn evaluates_formula() {
        let h = heuristic();
        // 8 in the corner: 1000/8 * 1; 16 next to it: 1000/16 * 0.7; 7 empties; no pairs.
        let b = Board::from_rows(&[[0, 0, 0], [0, 0, 0], [0, 16, 8]]).unwrap();
        let expected = 125.0 + 62.5 * 0.7 + 4.0 * 7.0;
        assert!((h.evaluate(b) - expected).abs() < 1e-9);
    }

    #[test]
    fn merge_pairs_add_bonus() {
        let h = heuristic();
        let apart = Board::from_rows(&[[0, 0, 0], [0, 0, 0], [16, 0, 16]]).unwrap();
        let together = Board::from_rows(&[[0, 0, 0], [0, 0, 0], [0, 16, 16]]).unwrap();
        let base = |b: Board| -> f64 {
            (0..3)
                .flat_map(|r| (0..3).map(move |c| (r, c)))
                .filter(|&(r, c)| b.tile(r, c) != 0)
                .map(|(r, c)| 1000.0 / b.tile(r, c) as f64 * h.position_weight(3, r, c))
                .sum::<f64>()
                + 4.0 * 7.0
        };
        assert!((h.evaluate(apart) - base(apart)).abs() < 1e-9);
        assert!((h.evaluate(together) - (base(together) + 10.0)).abs() < 1e-9);
    }

    #[test]
    fn prefers_small_tiles_in_corner() {
        let h = heuristic();
        let corner = Board::from_rows(&[[0, 0, 0], [0, 0, 0], [0, 0, 4]]).unwrap();
        let far = Board::from_rows(&[[4, 0, 0], [0, 0, 0], [0, 0, 0]]).unwrap();
        assert!(h.evaluate(corner) > h.evaluate(far));
    }
}
