//! Engine module: packed reverse-2048 board and the rules that act on it.
//!
//! - `Board` is the packed state (3x3 up to 5x5) with useful methods.
//! - `resolve` slides/merges tiles (merges halve), `classify` detects terminal
//!   boards, `SpawnSet` places new tiles.
//! - Conventions: empty cells are `0`, the winning tile is `2`.

mod ops;
pub mod state;

pub use state::{
    is_tile_value, Board, Move, Position, SpawnSet, StartConfig, TerminalReason, EMPTY, MAX_GRID_SIZE, MAX_TILE,
    MIN_GRID_SIZE, VALID_START_VALUES, WIN_VALUE,
};

pub use ops::{classify, resolve, resolve_key, resolve_with, shift, MoveOutcome};
