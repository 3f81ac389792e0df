//! A match: two strategies race on identical boards toward the winning tile.
//!
//! Both boards start from the same opening position. Each round lets player
//! one, then player two, play one ply on its own board. A board stops taking
//! moves once it carries a terminal reason, and the match ends when both have
//! stopped.

use std::time::{Duration, Instant};

use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::engine::{resolve, Board, Move, Position, SpawnSet, StartConfig, TerminalReason};
use crate::expectimax::ExpectimaxConfig;
use crate::strategy::{default_players, Strategy};

/// Default cap on moves per player.
pub const DEFAULT_MAX_MOVES: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOptions {
    /// A player reaching this many moves stops with `MoveLimitReached`.
    pub max_moves: u32,
    pub seed: u64,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self { max_moves: DEFAULT_MAX_MOVES, seed: 0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub const BOTH: [Player; 2] = [Player::One, Player::Two];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }

    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }
}

/// Outcome of a finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    /// Only this player reached the winning tile.
    Outright(Player),
    /// Both won; this one needed fewer moves (ties go to player one).
    ByMoves(Player),
    Draw,
}

impl Winner {
    /// Decide the winner from both final reasons and move counts.
    ///
    /// ```
    /// use reverse_2048::engine::TerminalReason::{OpponentWon, Win};
    /// use reverse_2048::session::{Player, Winner};
    /// assert_eq!(Winner::decide([Win, OpponentWon], [12, 9]), Winner::Outright(Player::One));
    /// assert_eq!(Winner::decide([Win, Win], [12, 9]), Winner::ByMoves(Player::Two));
    /// assert_eq!(Winner::decide([Win, Win], [9, 9]), Winner::ByMoves(Player::One));
    /// ```
    pub fn decide(reasons: [TerminalReason; 2], moves: [u32; 2]) -> Winner {
        let won = reasons.map(|r| r == TerminalReason::Win);
        match won {
            [true, false] => Winner::Outright(Player::One),
            [false, true] => Winner::Outright(Player::Two),
            [true, true] if moves[0] <= moves[1] => Winner::ByMoves(Player::One),
            [true, true] => Winner::ByMoves(Player::Two),
            [false, false] => Winner::Draw,
        }
    }

    pub fn player(self) -> Option<Player> {
        match self {
            Winner::Outright(p) | Winner::ByMoves(p) => Some(p),
            Winner::Draw => None,
        }
    }

    /// Human-readable label given the two player names.
    pub fn label(self, names: [&str; 2]) -> String {
        match self {
            Winner::Outright(p) => names[p.index()].to_string(),
            Winner::ByMoves(p) => format!("{} (by moves)", names[p.index()]),
            Winner::Draw => "Draw".to_string(),
        }
    }
}

/// One committed move: who played what, and both boards right after the spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameStep {
    pub index: u32,
    pub player: Player,
    pub dir: Move,
    pub boards: [Board; 2],
}

#[derive(Debug, Clone, Copy)]
struct Seat {
    board: Board,
    cursor: Position,
    reason: TerminalReason,
    moves: u32,
    think: Duration,
}

impl Seat {
    fn new(board: Board) -> Self {
        Seat { board, cursor: Position::ORIGIN, reason: TerminalReason::NotOver, moves: 0, think: Duration::ZERO }
    }
}

#[derive(Debug, Clone)]
pub struct MatchResult {
    pub start: StartConfig,
    pub names: [String; 2],
    pub initial: [Board; 2],
    pub finals: [Board; 2],
    pub reasons: [TerminalReason; 2],
    pub moves: [u32; 2],
    /// Total time each strategy spent choosing moves.
    pub think_time: [Duration; 2],
    pub history: Vec<GameStep>,
    pub winner: Winner,
}

impl MatchResult {
    pub fn winner_label(&self) -> String {
        self.winner.label([self.names[0].as_str(), self.names[1].as_str()])
    }
}

pub struct Match {
    start: StartConfig,
    spawns: SpawnSet,
    options: MatchOptions,
    rng: StdRng,
    players: [Box<dyn Strategy>; 2],
    seats: [Seat; 2],
    initial: [Board; 2],
    history: Vec<GameStep>,
}

impl Match {
    /// Greedy versus expectimax with default settings.
    pub fn new(start: StartConfig, seed: u64) -> Self {
        Self::with_options(start, MatchOptions { seed, ..Default::default() }, ExpectimaxConfig::default())
    }

    pub fn with_options(start: StartConfig, options: MatchOptions, cfg: ExpectimaxConfig) -> Self {
        Self::with_players(start, options, default_players(start.spawn_set(), cfg))
    }

    /// Seat arbitrary strategies; `players[0]` plays board one.
    pub fn with_players(start: StartConfig, options: MatchOptions, players: [Box<dyn Strategy>; 2]) -> Self {
        let mut rng = StdRng::seed_from_u64(options.seed);
        let board = start.initial_board(&mut rng);
        debug!("match seed={} start={} grid={}", options.seed, start.start_value(), start.grid_size());
        Match {
            start,
            spawns: start.spawn_set(),
            options,
            rng,
            players,
            seats: [Seat::new(board); 2],
            initial: [board; 2],
            history: Vec::new(),
        }
    }

    #[inline]
    pub fn board(&self, player: Player) -> Board {
        self.seats[player.index()].board
    }

    #[inline]
    pub fn cursor(&self, player: Player) -> Position {
        self.seats[player.index()].cursor
    }

    #[inline]
    pub fn reason(&self, player: Player) -> TerminalReason {
        self.seats[player.index()].reason
    }

    #[inline]
    pub fn move_count(&self, player: Player) -> u32 {
        self.seats[player.index()].moves
    }

    pub fn name(&self, player: Player) -> &str {
        self.players[player.index()].name()
    }

    pub fn history(&self) -> &[GameStep] {
        &self.history
    }

    pub fn is_over(&self) -> bool {
        self.seats.iter().all(|s| s.reason.is_over())
    }

    /// Let `player` play one ply. Returns whether a move was committed.
    pub fn step_player(&mut self, player: Player) -> bool {
        let idx = player.index();
        let seat = self.seats[idx];
        if seat.reason.is_over() {
            return false;
        }

        let began = Instant::now();
        let choice = self.players[idx].next_move(seat.board, seat.cursor);
        let think = began.elapsed();
        self.seats[idx].think += think;

        let (dir, outcome) = match choice.map(|dir| (dir, resolve(seat.board, dir, seat.cursor))) {
            Some((dir, outcome)) if outcome.changed => (dir, outcome),
            _ => {
                debug!("{} has no legal move after {} moves", self.name(player), seat.moves);
                self.seats[idx].reason = TerminalReason::StalemateNoMoves;
                return false;
            }
        };

        let board = self.spawns.spawn(outcome.board, &mut self.rng);
        let seat = &mut self.seats[idx];
        seat.board = board;
        seat.cursor = outcome.cursor;
        seat.moves += 1;
        let moves = seat.moves;

        let reason = board.classify();
        if reason.is_over() {
            seat.reason = reason;
        } else if moves >= self.options.max_moves {
            seat.reason = TerminalReason::MoveLimitReached;
        }

        self.history.push(GameStep {
            index: self.history.len() as u32 + 1,
            player,
            dir,
            boards: [self.seats[0].board, self.seats[1].board],
        });
        debug!("{} played {dir} in {think:?} (move {moves})", self.players[idx].name());
        true
    }

    /// One round: player one, then player two. A sole winner ends the other
    /// board with `OpponentWon`.
    pub fn play_round(&mut self) {
        for player in Player::BOTH {
            self.step_player(player);
        }
        let won = self.seats.map(|s| s.reason == TerminalReason::Win);
        for player in Player::BOTH {
            let (mine, theirs) = (won[player.index()], won[player.opponent().index()]);
            let seat = &mut self.seats[player.index()];
            if theirs && !mine && seat.reason == TerminalReason::NotOver {
                seat.reason = TerminalReason::OpponentWon;
            }
        }
    }

    pub fn play_until_over(mut self) -> MatchResult {
        while !self.is_over() {
            self.play_round();
        }
        let reasons = self.seats.map(|s| s.reason);
        let moves = self.seats.map(|s| s.moves);
        let winner = Winner::decide(reasons, moves);
        let names = [self.players[0].name().to_string(), self.players[1].name().to_string()];
        let result = MatchResult {
            start: self.start,
            initial: self.initial,
            finals: self.seats.map(|s| s.board),
            reasons,
            moves,
            think_time: self.seats.map(|s| s.think),
            history: self.history,
            winner,
            names,
        };
        info!(
            "start={} grid={}: {} {} in {} moves, {} {} in {} moves -> {}",
            self.start.start_value(),
            self.start.grid_size(),
            result.names[0],
            reasons[0],
            moves[0],
            result.names[1],
            reasons[1],
            moves[1],
            result.winner_label()
        );
        result
    }
}
