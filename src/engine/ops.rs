use rand::Rng;

use super::state::{nibble_value, Board, Move, Nibble, Position, TerminalReason};
use super::state::MAX_GRID_SIZE;

/// Result of resolving one move against a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub board: Board,
    pub changed: bool,
    pub cursor: Position,
}

/// Slide and merge every tile in `dir`.
///
/// Equal neighbours merge into one tile of half their value; a tile produced
/// by a merge does not merge again in the same call. The cursor steps in `dir`
/// only when the board changed and the step stays on the board. When nothing
/// moves, the returned board is the input board.
///
/// ```
/// use reverse_2048::engine::{resolve, Board, Move, Position};
/// let b = Board::from_rows(&[[0, 64, 64], [0, 0, 0], [0, 0, 0]]).unwrap();
/// let out = resolve(b, Move::Left, Position::new(0, 1));
/// assert!(out.changed);
/// assert_eq!(out.board.tile(0, 0), 32);
/// assert_eq!(out.cursor, Position::new(0, 0));
/// ```
#[inline]
pub fn resolve(board: Board, dir: Move, cursor: Position) -> MoveOutcome {
    resolve_with(board, dir, cursor, |_| {})
}

/// Like [`resolve`], calling `on_merge` with the value each merge produces.
pub fn resolve_with<F: FnMut(u32)>(board: Board, dir: Move, cursor: Position, mut on_merge: F) -> MoveOutcome {
    let shifted = shift_with(board, dir, &mut on_merge);
    let changed = shifted != board;
    let cursor = if changed { cursor.step(dir, board.size()).unwrap_or(cursor) } else { cursor };
    MoveOutcome { board: shifted, changed, cursor }
}

/// Resolve a move given as an input character (`wasd` / `ijkl`).
///
/// Unrecognized characters are a no-op: `changed == false`, board and cursor untouched.
pub fn resolve_key(board: Board, key: char, cursor: Position) -> MoveOutcome {
    match Move::from_key(key) {
        Some(dir) => resolve(board, dir, cursor),
        None => MoveOutcome { board, changed: false, cursor },
    }
}

/// Slide/merge tiles in the given direction. No randomness.
#[inline]
pub fn shift(board: Board, dir: Move) -> Board {
    shift_with(board, dir, &mut |_| {})
}

/// Classify a board as `NotOver`, `Win` or `StalemateBoardFull`.
///
/// The remaining reasons depend on match state and are assigned by the
/// orchestrator.
///
/// ```
/// use reverse_2048::engine::{classify, Board, TerminalReason};
/// let b = Board::from_rows(&[[2, 0, 0], [0, 0, 0], [0, 0, 0]]).unwrap();
/// assert_eq!(classify(b), TerminalReason::Win);
/// ```
pub fn classify(board: Board) -> TerminalReason {
    if board.has_won() {
        TerminalReason::Win
    } else if board.count_empty() > 0 || board.adjacent_pairs() > 0 {
        TerminalReason::NotOver
    } else {
        TerminalReason::StalemateBoardFull
    }
}

/// Write a uniformly chosen value of `values` into a uniformly chosen empty cell.
pub(crate) fn spawn_tile<R: Rng + ?Sized>(board: Board, values: &[u32], rng: &mut R) -> Board {
    let empty = board.count_empty();
    if empty == 0 || values.is_empty() {
        return board;
    }
    let index = rng.gen_range(0..empty);
    let value = values[rng.gen_range(0..values.len())];
    match board.empty_cells().nth(index) {
        Some(pos) => board.with_tile(pos, value),
        None => board,
    }
}

/// Cell indices of line `line` ordered from the edge tiles travel towards.
fn line_indices(size: usize, dir: Move, line: usize) -> impl Iterator<Item = usize> {
    (0..size).map(move |k| match dir {
        Move::Left => line * size + k,
        Move::Right => line * size + (size - 1 - k),
        Move::Up => k * size + line,
        Move::Down => (size - 1 - k) * size + line,
    })
}

fn shift_with<F: FnMut(u32)>(board: Board, dir: Move, on_merge: &mut F) -> Board {
    let size = board.size();
    let mut out = board;
    let mut tiles: [Nibble; MAX_GRID_SIZE] = [0; MAX_GRID_SIZE];
    for line in 0..size {
        for (slot, idx) in tiles.iter_mut().zip(line_indices(size, dir, line)) {
            *slot = board.nibble(idx);
        }
        shift_line_left(&mut tiles[..size], on_merge);
        for (&tile, idx) in tiles.iter().zip(line_indices(size, dir, line)) {
            out = out.with_nibble(idx, tile);
        }
    }
    out
}

/// Compact one line towards index 0, merging equal neighbours once.
///
/// Nibble `1` (value 1) is the bottom of the chain and never merges, so a
/// merge can never produce an empty cell.
fn shift_line_left<F: FnMut(u32)>(line: &mut [Nibble], on_merge: &mut F) {
    let mut target = 0;
    let mut mergeable = false;
    for idx in 0..line.len() {
        let tile = line[idx];
        if tile == 0 {
            continue;
        }
        line[idx] = 0;
        if mergeable && tile > 1 && line[target - 1] == tile {
            line[target - 1] = tile - 1;
            on_merge(nibble_value(tile - 1));
            mergeable = false;
        } else {
            line[target] = tile;
            target += 1;
            mergeable = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::state::{value_nibble, SpawnSet, EMPTY};
    use rand::{rngs::StdRng, SeedableRng};

    fn line(values: &[u32]) -> Vec<u32> {
        let mut tiles: Vec<Nibble> = values.iter().map(|&v| value_nibble(v)).collect();
        shift_line_left(&mut tiles, &mut |_| {});
        tiles.into_iter().map(nibble_value).collect()
    }

    fn board(rows: &[[u32; 4]]) -> Board {
        Board::from_rows(rows).unwrap()
    }

    #[test]
    fn it_shift_line_left() {
        assert_eq!(line(&[0, 0, 0, 0]), vec![0, 0, 0, 0]);
        assert_eq!(line(&[16, 8, 16, 8]), vec![16, 8, 16, 8]);
        assert_eq!(line(&[16, 16, 8, 8]), vec![8, 4, 0, 0]);
        assert_eq!(line(&[64, 0, 0, 64]), vec![32, 0, 0, 0]);
        assert_eq!(line(&[0, 0, 0, 32]), vec![32, 0, 0, 0]);
    }

    #[test]
    fn merged_tile_does_not_merge_again() {
        // 8+8 -> 4, which must not swallow the following 4.
        assert_eq!(line(&[8, 8, 4, 0]), vec![4, 4, 0, 0]);
        assert_eq!(line(&[32, 32, 32, 0]), vec![16, 32, 0, 0]);
        assert_eq!(line(&[32, 32, 32, 32]), vec![16, 16, 0, 0]);
    }

    #[test]
    fn floor_tiles_never_merge() {
        assert_eq!(line(&[1, 1, 0]), vec![1, 1, 0]);
        assert_eq!(line(&[2, 2, 0]), vec![1, 0, 0]);
    }

    #[test]
    fn test_move_left() {
        let b = board(&[[16, 8, 4, 2], [16, 32, 32, 8], [8, 0, 0, 8], [16, 0, 0, 8]]);
        let out = shift(b, Move::Left);
        assert_eq!(out, board(&[[16, 8, 4, 2], [16, 16, 8, 0], [4, 0, 0, 0], [16, 8, 0, 0]]));
    }

    #[test]
    fn test_move_right() {
        let b = board(&[[16, 8, 4, 2], [16, 32, 32, 8], [8, 0, 0, 8], [16, 0, 0, 8]]);
        let out = shift(b, Move::Right);
        assert_eq!(out, board(&[[16, 8, 4, 2], [0, 16, 16, 8], [0, 0, 0, 4], [0, 0, 16, 8]]));
    }

    #[test]
    fn test_move_up() {
        let b = board(&[[64, 0, 0, 0], [64, 32, 0, 0], [32, 32, 0, 0], [32, 0, 0, 16]]);
        let out = shift(b, Move::Up);
        assert_eq!(out, board(&[[32, 16, 0, 16], [16, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]]));
    }

    #[test]
    fn test_move_down() {
        let b = board(&[[64, 0, 0, 0], [64, 32, 0, 0], [32, 32, 0, 0], [32, 0, 0, 16]]);
        let out = shift(b, Move::Down);
        assert_eq!(out, board(&[[0, 0, 0, 0], [0, 0, 0, 0], [32, 0, 0, 0], [16, 16, 0, 16]]));
    }

    #[test]
    fn unchanged_move_returns_identical_board_and_cursor() {
        let b = Board::from_rows(&[[64, 32, 0], [16, 0, 0], [0, 0, 0]]).unwrap();
        let cursor = Position::new(1, 1);
        let out = resolve(b, Move::Left, cursor);
        assert!(!out.changed);
        assert_eq!(out.board, b);
        assert_eq!(out.board.raw(), b.raw());
        assert_eq!(out.cursor, cursor);
    }

    #[test]
    fn unknown_key_is_noop() {
        let b = Board::from_rows(&[[64, 0, 0], [0, 0, 0], [0, 0, 64]]).unwrap();
        let out = resolve_key(b, 'q', Position::ORIGIN);
        assert!(!out.changed);
        assert_eq!(out.board, b);
        let out = resolve_key(b, 'J', Position::ORIGIN);
        assert!(out.changed);
        assert_eq!(out.cursor, Position::ORIGIN);
    }

    #[test]
    fn cursor_moves_only_on_change() {
        let b = Board::from_rows(&[[0, 0, 0], [0, 0, 0], [0, 0, 128]]).unwrap();
        let out = resolve(b, Move::Up, Position::new(2, 2));
        assert!(out.changed);
        assert_eq!(out.cursor, Position::new(1, 2));
        let again = resolve(out.board, Move::Up, out.cursor);
        assert!(!again.changed);
        assert_eq!(again.cursor, Position::new(1, 2));
    }

    #[test]
    fn repeated_moves_reach_fixed_point() {
        let mut rng = StdRng::seed_from_u64(11);
        let spawns = SpawnSet::for_start(512).unwrap();
        for _ in 0..40 {
            let mut b = Board::empty(5).unwrap();
            for _ in 0..14 {
                b = spawns.spawn(b, &mut rng);
            }
            for dir in Move::ALL {
                let mut cur = b;
                let mut steps = 0;
                loop {
                    let out = resolve(cur, dir, Position::ORIGIN);
                    if !out.changed {
                        break;
                    }
                    cur = out.board;
                    steps += 1;
                    assert!(steps <= 25, "sliding did not settle");
                }
            }
        }
    }

    #[test]
    fn merges_halve_and_stay_powers_of_two() {
        let mut rng = StdRng::seed_from_u64(5);
        let spawns = SpawnSet::for_start(128).unwrap();
        for _ in 0..40 {
            let mut b = Board::empty(4).unwrap();
            for _ in 0..12 {
                b = spawns.spawn(b, &mut rng);
            }
            for dir in Move::ALL {
                let mut merges = Vec::new();
                let out = resolve_with(b, dir, Position::ORIGIN, |v| merges.push(v));
                for &v in &merges {
                    assert!(v.is_power_of_two());
                    assert_ne!(v, EMPTY);
                }
                let before = b.count_empty();
                assert_eq!(out.board.count_empty(), before + merges.len());
                for row in out.board.rows() {
                    for v in row {
                        assert!(v == EMPTY || v.is_power_of_two());
                    }
                }
            }
        }
    }

    #[test]
    fn spawn_fills_exactly_one_cell_from_set() {
        let mut rng = StdRng::seed_from_u64(99);
        let spawns = SpawnSet::for_start(256).unwrap();
        let mut b = Board::empty(3).unwrap();
        for filled in 1..=9 {
            let next = spawns.spawn(b, &mut rng);
            assert_eq!(next.count_empty(), 9 - filled);
            let added: Vec<u32> = next
                .rows()
                .into_iter()
                .flatten()
                .zip(b.rows().into_iter().flatten())
                .filter(|(n, o)| n != o)
                .map(|(n, _)| n)
                .collect();
            assert_eq!(added.len(), 1);
            assert!(spawns.values().contains(&added[0]));
            b = next;
        }
        assert_eq!(spawns.spawn(b, &mut rng), b);
    }

    #[test]
    fn classify_cases() {
        let full = Board::from_rows(&[[64, 32, 64], [32, 64, 32], [64, 32, 64]]).unwrap();
        assert_eq!(classify(full), TerminalReason::StalemateBoardFull);
        let mergeable = Board::from_rows(&[[64, 64, 32], [32, 16, 8], [64, 32, 16]]).unwrap();
        assert_eq!(classify(mergeable), TerminalReason::NotOver);
        let vertical = Board::from_rows(&[[64, 32, 16], [64, 16, 8], [32, 64, 4]]).unwrap();
        assert_eq!(classify(vertical), TerminalReason::NotOver);
        let open = Board::from_rows(&[[64, 32, 16], [32, 0, 8], [64, 32, 16]]).unwrap();
        assert_eq!(classify(open), TerminalReason::NotOver);
        let lone_win = Board::from_rows(&[[0, 0, 0], [0, 2, 0], [0, 0, 0]]).unwrap();
        assert_eq!(classify(lone_win), TerminalReason::Win);
    }
}
