use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ops;
use crate::config::ConfigError;

// Internal type aliases for packed representation
pub(crate) type BoardRaw = u128;
pub(crate) type Nibble = u8;

/// Value of an empty cell.
pub const EMPTY: u32 = 0;
/// Reaching this tile (or anything below it) wins the game.
pub const WIN_VALUE: u32 = 2;
pub const MIN_GRID_SIZE: usize = 3;
pub const MAX_GRID_SIZE: usize = 5;
/// Start values accepted by [`StartConfig::new`].
pub const VALID_START_VALUES: [u32; 3] = [128, 256, 512];
/// Largest tile a nibble can hold (`2^14`).
pub const MAX_TILE: u32 = 1 << 14;

/// A direction to slide/merge tiles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// Every direction, in search order.
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    /// Map an input character to a direction.
    ///
    /// `w/a/s/d` and `i/j/k/l` name the same four directions, one key set per
    /// grid. Case-insensitive.
    ///
    /// ```
    /// use reverse_2048::engine::Move;
    /// assert_eq!(Move::from_key('W'), Some(Move::Up));
    /// assert_eq!(Move::from_key('l'), Some(Move::Right));
    /// assert_eq!(Move::from_key('x'), None);
    /// ```
    pub fn from_key(key: char) -> Option<Move> {
        match key.to_ascii_lowercase() {
            'w' | 'i' => Some(Move::Up),
            's' | 'k' => Some(Move::Down),
            'a' | 'j' => Some(Move::Left),
            'd' | 'l' => Some(Move::Right),
            _ => None,
        }
    }

    /// Row/column delta of one step in this direction.
    #[inline]
    pub fn delta(self) -> (isize, isize) {
        match self {
            Move::Up => (-1, 0),
            Move::Down => (1, 0),
            Move::Left => (0, -1),
            Move::Right => (0, 1),
        }
    }

    #[inline]
    pub fn to_u8(self) -> u8 {
        match self {
            Move::Up => 0,
            Move::Down => 1,
            Move::Left => 2,
            Move::Right => 3,
        }
    }

    #[inline]
    pub fn from_u8(v: u8) -> Option<Move> {
        match v {
            0 => Some(Move::Up),
            1 => Some(Move::Down),
            2 => Some(Move::Left),
            3 => Some(Move::Right),
            _ => None,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Move::Up => "Up",
            Move::Down => "Down",
            Move::Left => "Left",
            Move::Right => "Right",
        };
        f.write_str(s)
    }
}

/// Cursor position on a board, the "last active cell".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const ORIGIN: Position = Position { row: 0, col: 0 };

    #[inline]
    pub fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }

    /// One step in `dir`, or `None` when that leaves a `size`×`size` board.
    pub fn step(self, dir: Move, size: usize) -> Option<Position> {
        let (dr, dc) = dir.delta();
        let row = self.row.checked_add_signed(dr)?;
        let col = self.col.checked_add_signed(dc)?;
        (row < size && col < size).then_some(Position { row, col })
    }
}

/// Why a board stopped (or has not stopped) accepting moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminalReason {
    NotOver,
    Win,
    StalemateBoardFull,
    StalemateNoMoves,
    MoveLimitReached,
    OpponentWon,
}

impl TerminalReason {
    #[inline]
    pub fn is_over(self) -> bool {
        self != TerminalReason::NotOver
    }

    /// Short human-readable label used by reports.
    pub fn label(self) -> &'static str {
        match self {
            TerminalReason::NotOver => "Not Over",
            TerminalReason::Win => "Win",
            TerminalReason::StalemateBoardFull => "Board Full",
            TerminalReason::StalemateNoMoves => "No Moves",
            TerminalReason::MoveLimitReached => "Move Limit",
            TerminalReason::OpponentWon => "Opponent Won",
        }
    }

    pub(crate) fn to_u8(self) -> u8 {
        match self {
            TerminalReason::NotOver => 0,
            TerminalReason::Win => 1,
            TerminalReason::StalemateBoardFull => 2,
            TerminalReason::StalemateNoMoves => 3,
            TerminalReason::MoveLimitReached => 4,
            TerminalReason::OpponentWon => 5,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(TerminalReason::NotOver),
            1 => Some(TerminalReason::Win),
            2 => Some(TerminalReason::StalemateBoardFull),
            3 => Some(TerminalReason::StalemateNoMoves),
            4 => Some(TerminalReason::MoveLimitReached),
            5 => Some(TerminalReason::OpponentWon),
            _ => None,
        }
    }
}

impl fmt::Display for TerminalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Values that may spawn after a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpawnSet {
    values: [u32; 3],
    len: usize,
}

impl SpawnSet {
    /// Spawn values for a start value: `start/2, start/4, start/8` for the known
    /// start values, otherwise just `start` itself.
    ///
    /// The fallback must itself be a tile a board can hold (a power of two no
    /// larger than [`MAX_TILE`]).
    ///
    /// ```
    /// use reverse_2048::engine::SpawnSet;
    /// assert_eq!(SpawnSet::for_start(512).unwrap().values(), &[256, 128, 64]);
    /// assert_eq!(SpawnSet::for_start(1024).unwrap().values(), &[1024]);
    /// assert!(SpawnSet::for_start(1000).is_err());
    /// ```
    pub fn for_start(start_value: u32) -> Result<Self, ConfigError> {
        if VALID_START_VALUES.contains(&start_value) {
            Ok(SpawnSet::thirds(start_value))
        } else if start_value != EMPTY && is_tile_value(start_value) {
            Ok(SpawnSet { values: [start_value, 0, 0], len: 1 })
        } else {
            Err(ConfigError::InvalidStartValue(start_value))
        }
    }

    #[inline]
    fn thirds(start_value: u32) -> Self {
        SpawnSet { values: [start_value / 2, start_value / 4, start_value / 8], len: 3 }
    }

    #[inline]
    pub fn values(&self) -> &[u32] {
        &self.values[..self.len]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Place one value from this set into a uniformly chosen empty cell.
    /// No-op when the board is full.
    ///
    /// ```
    /// use reverse_2048::engine::{Board, SpawnSet};
    /// use rand::{rngs::StdRng, SeedableRng};
    /// let mut rng = StdRng::seed_from_u64(3);
    /// let b = SpawnSet::for_start(256).unwrap().spawn(Board::empty(4).unwrap(), &mut rng);
    /// assert_eq!(b.count_empty(), 15);
    /// ```
    pub fn spawn<R: Rng + ?Sized>(&self, board: Board, rng: &mut R) -> Board {
        ops::spawn_tile(board, self.values(), rng)
    }
}

/// A validated `(start value, grid size)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StartConfig {
    start_value: u32,
    grid_size: usize,
}

impl StartConfig {
    pub fn new(start_value: u32, grid_size: usize) -> Result<Self, ConfigError> {
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&grid_size) {
            return Err(ConfigError::InvalidGridSize(grid_size));
        }
        if !VALID_START_VALUES.contains(&start_value) {
            return Err(ConfigError::InvalidStartValue(start_value));
        }
        Ok(StartConfig { start_value, grid_size })
    }

    #[inline]
    pub fn start_value(&self) -> u32 {
        self.start_value
    }

    #[inline]
    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    #[inline]
    pub fn spawn_set(&self) -> SpawnSet {
        SpawnSet::thirds(self.start_value)
    }

    /// Empty board with the start value in two distinct random cells.
    pub fn initial_board<R: Rng + ?Sized>(&self, rng: &mut R) -> Board {
        let n = self.grid_size;
        let first = rng.gen_range(0..n * n);
        let mut second = rng.gen_range(0..n * n - 1);
        if second >= first {
            second += 1;
        }
        Board::blank(n)
            .with_tile(Position::new(first / n, first % n), self.start_value)
            .with_tile(Position::new(second / n, second % n), self.start_value)
    }
}

/// Packed square board: one 4-bit nibble per cell in a `u128`, row-major from
/// the low bits. Nibble `0` is empty, nibble `n` holds the value `2^(n-1)`.
///
/// Boards are `Copy`; simulating a move never touches the original.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    raw: BoardRaw,
    size: u8,
}

impl Board {
    /// Validate `(start_value, grid_size)` and build the opening board.
    ///
    /// ```
    /// use reverse_2048::engine::Board;
    /// use rand::{rngs::StdRng, SeedableRng};
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let b = Board::new(128, 3, &mut rng).unwrap();
    /// assert_eq!(b.count_empty(), 7);
    /// assert!(Board::new(100, 3, &mut rng).is_err());
    /// ```
    pub fn new<R: Rng + ?Sized>(start_value: u32, grid_size: usize, rng: &mut R) -> Result<Self, ConfigError> {
        Ok(StartConfig::new(start_value, grid_size)?.initial_board(rng))
    }

    /// An empty board of the given side length.
    pub fn empty(size: usize) -> Result<Self, ConfigError> {
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&size) {
            return Err(ConfigError::InvalidGridSize(size));
        }
        Ok(Board::blank(size))
    }

    #[inline]
    pub(crate) fn blank(size: usize) -> Self {
        debug_assert!((MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&size));
        Board { raw: 0, size: size as u8 }
    }

    /// Build a board from explicit rows of tile values (`0` = empty).
    ///
    /// ```
    /// use reverse_2048::engine::Board;
    /// let b = Board::from_rows(&[[16, 0, 0], [0, 8, 0], [0, 0, 4]]).unwrap();
    /// assert_eq!(b.tile(1, 1), 8);
    /// ```
    pub fn from_rows<R: AsRef<[u32]>>(rows: &[R]) -> Result<Self, ConfigError> {
        let size = rows.len();
        let mut board = Board::empty(size)?;
        for (row, cells) in rows.iter().enumerate() {
            let cells = cells.as_ref();
            if cells.len() != size {
                return Err(ConfigError::NotSquare { row, len: cells.len(), size });
            }
            for (col, &value) in cells.iter().enumerate() {
                board = board.try_with_tile(Position::new(row, col), value)?;
            }
        }
        Ok(board)
    }

    /// Construct a `Board` from its raw packed representation.
    #[inline]
    pub fn from_raw(raw: BoardRaw, size: usize) -> Result<Self, ConfigError> {
        let board = Board::empty(size)?;
        let mask: BoardRaw = (1 << (4 * size * size)) - 1;
        Ok(Board { raw: raw & mask, ..board })
    }

    /// Borrow the raw packed `u128` for this `Board`.
    #[inline]
    pub fn raw(&self) -> BoardRaw {
        self.raw
    }

    /// Side length.
    #[inline]
    pub fn size(&self) -> usize {
        self.size as usize
    }

    #[inline]
    pub(crate) fn nibble(&self, idx: usize) -> Nibble {
        ((self.raw >> (4 * idx)) & 0xf) as Nibble
    }

    #[inline]
    pub(crate) fn with_nibble(self, idx: usize, nibble: Nibble) -> Self {
        let shift = 4 * idx;
        let raw = (self.raw & !((0xf as BoardRaw) << shift)) | (((nibble & 0xf) as BoardRaw) << shift);
        Board { raw, ..self }
    }

    /// Tile value at `(row, col)`; `0` if empty.
    #[inline]
    pub fn tile(&self, row: usize, col: usize) -> u32 {
        nibble_value(self.nibble(row * self.size() + col))
    }

    /// Copy of this board with `value` written at `pos`.
    ///
    /// `value` must satisfy [`is_tile_value`]; use [`Board::try_with_tile`] for
    /// unchecked input.
    #[inline]
    pub fn with_tile(self, pos: Position, value: u32) -> Self {
        debug_assert!(is_tile_value(value), "{value} is not a tile value");
        self.with_nibble(pos.row * self.size() + pos.col, value_nibble(value))
    }

    /// Checked [`Board::with_tile`].
    ///
    /// ```
    /// use reverse_2048::engine::{Board, Position};
    /// let b = Board::empty(3).unwrap();
    /// assert_eq!(b.try_with_tile(Position::new(0, 0), 8).unwrap().tile(0, 0), 8);
    /// assert!(b.try_with_tile(Position::new(0, 0), 3).is_err());
    /// ```
    pub fn try_with_tile(self, pos: Position, value: u32) -> Result<Self, ConfigError> {
        if !is_tile_value(value) {
            return Err(ConfigError::InvalidTile { row: pos.row, col: pos.col, value });
        }
        Ok(self.with_tile(pos, value))
    }

    /// Rows of tile values, top to bottom.
    pub fn rows(&self) -> Vec<Vec<u32>> {
        let n = self.size();
        (0..n).map(|r| (0..n).map(|c| self.tile(r, c)).collect()).collect()
    }

    /// Count the number of empty cells on the board.
    #[inline]
    pub fn count_empty(&self) -> usize {
        let n = self.size();
        (0..n * n).filter(|&idx| self.nibble(idx) == 0).count()
    }

    /// Empty cells in row-major order.
    pub fn empty_cells(self) -> impl Iterator<Item = Position> {
        let n = self.size();
        (0..n * n).filter(move |&idx| self.nibble(idx) == 0).map(move |idx| Position::new(idx / n, idx % n))
    }

    /// True if a tile at or below [`WIN_VALUE`] is on the board.
    #[inline]
    pub fn has_won(&self) -> bool {
        let n = self.size();
        let win = value_nibble(WIN_VALUE);
        (0..n * n).any(|idx| {
            let t = self.nibble(idx);
            t != 0 && t <= win
        })
    }

    /// Number of horizontally or vertically adjacent equal, non-empty pairs.
    pub fn adjacent_pairs(&self) -> usize {
        let n = self.size();
        let mut pairs = 0;
        for r in 0..n {
            for c in 0..n {
                let t = self.nibble(r * n + c);
                if t == 0 {
                    continue;
                }
                if c + 1 < n && self.nibble(r * n + c + 1) == t {
                    pairs += 1;
                }
                if r + 1 < n && self.nibble((r + 1) * n + c) == t {
                    pairs += 1;
                }
            }
        }
        pairs
    }

    /// Smallest tile on the board, if any.
    pub fn lowest_tile(&self) -> Option<u32> {
        let n = self.size();
        (0..n * n).map(|idx| self.nibble(idx)).filter(|&t| t != 0).min().map(nibble_value)
    }

    /// Slide/merge in `dir` without spawning. See [`ops::resolve`].
    #[inline]
    pub fn shift(self, dir: Move) -> Self {
        ops::shift(self, dir)
    }

    /// Classify this board. See [`ops::classify`].
    #[inline]
    pub fn classify(self) -> TerminalReason {
        ops::classify(self)
    }

    /// True if no direction changes the board.
    #[inline]
    pub fn is_stuck(self) -> bool {
        Move::ALL.iter().all(|&dir| self.shift(dir) == self)
    }
}

/// True for `EMPTY` and for every power of two a cell can hold.
#[inline]
pub fn is_tile_value(value: u32) -> bool {
    value == EMPTY || (value.is_power_of_two() && value <= MAX_TILE)
}

#[inline]
pub(crate) fn nibble_value(nibble: Nibble) -> u32 {
    if nibble == 0 { EMPTY } else { 1 << (nibble - 1) }
}

#[inline]
pub(crate) fn value_nibble(value: u32) -> Nibble {
    if value == EMPTY { 0 } else { (value.trailing_zeros() + 1) as Nibble }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board{}({:#x})", self.size, self.raw)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.size();
        let rule = "-".repeat(n * 6 + 1);
        writeln!(f, "{rule}")?;
        for r in 0..n {
            write!(f, "|")?;
            for c in 0..n {
                match self.tile(r, c) {
                    EMPTY => write!(f, "{:^5}|", "-")?,
                    v => write!(f, "{v:^5}|")?,
                }
            }
            writeln!(f)?;
        }
        write!(f, "{rule}")
    }
}
