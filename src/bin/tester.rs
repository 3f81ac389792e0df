use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use reverse_2048::config::read_game_list;
use reverse_2048::engine::StartConfig;
use reverse_2048::expectimax::ExpectimaxConfig;
use reverse_2048::report;
use reverse_2048::session::DEFAULT_MAX_MOVES;
use reverse_2048::tester::{run_configs, summarize, BatchOptions, GameRecord, GameRun, Summary};
use reverse_2048::trace::{self, MatchTrace};

#[derive(Debug, Parser)]
#[command(name = "tester", about = "Batch greedy vs expectimax matches and report statistics")]
struct Args {
    /// Games per configuration
    #[arg(long, default_value_t = 10)]
    games: u32,

    /// Start values to test (repeatable)
    #[arg(long = "start", default_values_t = [512])]
    starts: Vec<u32>,

    /// Grid sizes to test (repeatable)
    #[arg(long = "grid", default_values_t = [4])]
    grids: Vec<usize>,

    /// Read configurations from a game list instead of --start/--grid
    #[arg(long)]
    config: Option<PathBuf>,

    /// Expectimax search depth
    #[arg(long, default_value_t = ExpectimaxConfig::default().depth)]
    depth: u32,

    /// Base seed; game i of each configuration uses seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Per-player move cap
    #[arg(long, default_value_t = DEFAULT_MAX_MOVES)]
    max_moves: u32,

    /// Write per-game results as CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write per-configuration summaries as CSV
    #[arg(long)]
    summary_csv: Option<PathBuf>,

    /// Write a binary trace of every game into this directory
    #[arg(long)]
    trace_dir: Option<PathBuf>,

    /// Suppress the progress bar and tables
    #[arg(long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let starts = configurations(&args)?;
    let opts = BatchOptions {
        max_moves: args.max_moves,
        base_seed: args.seed,
        search: ExpectimaxConfig { depth: args.depth, ..Default::default() },
    };
    if let Some(dir) = &args.trace_dir {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let total = u64::from(args.games) * starts.len() as u64;
    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::with_template("{spinner} {elapsed_precise} [{bar:40}] {pos}/{len} games | {msg}")?
                .progress_chars("=> ")
                .tick_chars("⠁⠃⠇⠧⠷⠿⠻⠟⠯⠷⠧⠇⠃"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    };

    let started = Instant::now();
    let batches = run_configs(args.games, &starts, &opts, |run| {
        let n = run.record.grid_size;
        pb.set_message(format!("start {} on {n}x{n}", run.record.start_value));
        pb.inc(1);
    });
    pb.finish_and_clear();

    let mut all_records: Vec<GameRecord> = Vec::new();
    let mut summaries: Vec<(StartConfig, Summary)> = Vec::new();
    for (start, runs) in batches {
        if let Some(dir) = &args.trace_dir {
            for run in &runs {
                write_trace(dir, run);
            }
        }
        let records: Vec<GameRecord> = runs.into_iter().map(|run| run.record).collect();
        let summary = summarize(&records);
        info!(
            "start={} grid={}: {} wins {}, {} wins {}, draws {}",
            start.start_value(),
            start.grid_size(),
            records.first().map_or("Player1", |r| r.names[0].as_str()),
            summary.wins[0],
            records.first().map_or("Player2", |r| r.names[1].as_str()),
            summary.wins[1],
            summary.draws
        );
        summaries.push((start, summary));
        all_records.extend(records);
    }

    let names = match all_records.first() {
        Some(rec) => [rec.names[0].clone(), rec.names[1].clone()],
        None => ["Player1".to_string(), "Player2".to_string()],
    };
    let names = [names[0].as_str(), names[1].as_str()];

    if !args.quiet {
        let mut out = std::io::stdout().lock();
        report::write_records_table(&mut out, &all_records)?;
        for (start, summary) in &summaries {
            let n = start.grid_size();
            writeln!(out, "\nstart {} on {n}x{n}", start.start_value())?;
            report::write_summary(&mut out, names, summary)?;
        }
        writeln!(out, "{} games in {:.1}s", all_records.len(), started.elapsed().as_secs_f64())?;
    }

    if let Some(path) = &args.csv {
        report::export_records_csv(path, &all_records)?;
        info!("results written to {}", path.display());
    }
    if let Some(path) = &args.summary_csv {
        report::export_summary_csv(path, names, &summaries)?;
        info!("summary written to {}", path.display());
    }
    Ok(())
}

fn configurations(args: &Args) -> anyhow::Result<Vec<StartConfig>> {
    if let Some(path) = &args.config {
        return read_game_list(path).with_context(|| format!("reading {}", path.display()));
    }
    let mut starts = Vec::with_capacity(args.starts.len() * args.grids.len());
    for &start in &args.starts {
        for &grid in &args.grids {
            starts.push(StartConfig::new(start, grid)?);
        }
    }
    Ok(starts)
}

fn write_trace(dir: &Path, run: &GameRun) {
    let record = &run.record;
    let name = format!("game-{}-{}x{}-{:04}.r2t", record.start_value, record.grid_size, record.grid_size, record.game);
    let path = dir.join(name);
    let label = format!("{} vs {} seed {}", record.names[0], record.names[1], record.seed);
    let trace = MatchTrace::from_result(&run.result, run.started_unix_s, run.elapsed.as_secs_f32(), Some(label));
    if let Err(e) = trace::write_match_to_path(&path, &trace) {
        warn!("failed to write trace {}: {e}", path.display());
    }
}
