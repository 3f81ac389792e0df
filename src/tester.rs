//! Batch runs of many matches and their summary statistics.

use std::time::{Duration, Instant};

use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::engine::{StartConfig, TerminalReason};
use crate::expectimax::ExpectimaxConfig;
use crate::session::{Match, MatchOptions, MatchResult, Player, Winner};
use crate::trace;

/// Settings shared by every game of a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchOptions {
    pub max_moves: u32,
    /// Game `i` is seeded with `base_seed + i`.
    pub base_seed: u64,
    pub search: ExpectimaxConfig,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { max_moves: MatchOptions::default().max_moves, base_seed: 0, search: ExpectimaxConfig::default() }
    }
}

/// Flat per-game record, suitable for tables and CSV rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    /// 1-based game number within its batch.
    pub game: u32,
    pub start_value: u32,
    pub grid_size: usize,
    pub seed: u64,
    pub names: [String; 2],
    pub reasons: [TerminalReason; 2],
    pub moves: [u32; 2],
    /// Total think time per player in milliseconds.
    pub total_ms: [f64; 2],
    pub winner: Winner,
}

impl GameRecord {
    pub fn from_result(game: u32, seed: u64, result: &MatchResult) -> Self {
        GameRecord {
            game,
            start_value: result.start.start_value(),
            grid_size: result.start.grid_size(),
            seed,
            names: result.names.clone(),
            reasons: result.reasons,
            moves: result.moves,
            total_ms: result.think_time.map(|d| d.as_secs_f64() * 1000.0),
            winner: result.winner,
        }
    }

    pub fn winner_label(&self) -> String {
        self.winner.label([self.names[0].as_str(), self.names[1].as_str()])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub games: usize,
    pub wins: [usize; 2],
    pub draws: usize,
    pub win_rate: [f64; 2],
    pub avg_moves: [f64; 2],
    /// Average think time per move in milliseconds; zero for a player that never moved.
    pub avg_ms_per_move: [f64; 2],
}

/// One finished game of a batch.
#[derive(Debug, Clone)]
pub struct GameRun {
    pub record: GameRecord,
    pub result: MatchResult,
    /// Wall-clock time the game started, in Unix seconds.
    pub started_unix_s: u64,
    pub elapsed: Duration,
}

/// Play one match and flatten it into a record.
pub fn run_game(game: u32, start: StartConfig, opts: &BatchOptions) -> GameRun {
    let seed = opts.base_seed.wrapping_add(u64::from(game.saturating_sub(1)));
    let options = MatchOptions { max_moves: opts.max_moves, seed };
    let started_unix_s = trace::now_unix_seconds();
    let t0 = Instant::now();
    let result = Match::with_options(start, options, opts.search).play_until_over();
    let elapsed = t0.elapsed();
    GameRun { record: GameRecord::from_result(game, seed, &result), result, started_unix_s, elapsed }
}

/// Play `games` matches of one configuration in parallel, returned in game order.
pub fn run_batch(games: u32, start: StartConfig, opts: &BatchOptions) -> Vec<GameRun> {
    run_batch_with(games, start, opts, |_| {})
}

/// [`run_batch`], calling `on_game` from the worker thread as each game finishes.
pub fn run_batch_with<F>(games: u32, start: StartConfig, opts: &BatchOptions, on_game: F) -> Vec<GameRun>
where
    F: Fn(&GameRun) + Sync,
{
    info!(
        "running {games} games with start {} on {}x{}",
        start.start_value(),
        start.grid_size(),
        start.grid_size()
    );
    (1..=games)
        .into_par_iter()
        .map(|game| {
            let run = run_game(game, start, opts);
            on_game(&run);
            run
        })
        .collect()
}

/// Run a batch per configuration, in the order given.
pub fn run_configs<F>(games: u32, starts: &[StartConfig], opts: &BatchOptions, on_game: F) -> Vec<(StartConfig, Vec<GameRun>)>
where
    F: Fn(&GameRun) + Sync,
{
    starts.iter().map(|&start| (start, run_batch_with(games, start, opts, &on_game))).collect()
}

/// Aggregate wins, draws and averages over a set of records.
///
/// ```
/// use reverse_2048::tester::summarize;
/// let s = summarize(&[]);
/// assert_eq!(s.games, 0);
/// assert_eq!(s.avg_ms_per_move, [0.0, 0.0]);
/// ```
pub fn summarize(records: &[GameRecord]) -> Summary {
    let mut wins = [0usize; 2];
    let mut draws = 0;
    let mut moves = [0u64; 2];
    let mut ms = [0f64; 2];
    for rec in records {
        match rec.winner.player() {
            Some(p) => wins[p.index()] += 1,
            None => draws += 1,
        }
        for p in Player::BOTH {
            let i = p.index();
            moves[i] += u64::from(rec.moves[i]);
            ms[i] += rec.total_ms[i];
        }
    }
    let games = records.len();
    let per_game = |n: f64| if games == 0 { 0.0 } else { n / games as f64 };
    let per_move = |i: usize| if moves[i] == 0 { 0.0 } else { ms[i] / moves[i] as f64 };
    Summary {
        games,
        wins,
        draws,
        win_rate: wins.map(|w| per_game(w as f64)),
        avg_moves: moves.map(|m| per_game(m as f64)),
        avg_ms_per_move: [per_move(0), per_move(1)],
    }
}
