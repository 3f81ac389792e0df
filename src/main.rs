use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use rand::Rng;
use reverse_2048::config::read_game_list;
use reverse_2048::expectimax::ExpectimaxConfig;
use reverse_2048::report::{self, side_by_side};
use reverse_2048::session::{Match, MatchOptions};

#[derive(Debug, Parser)]
#[command(name = "reverse-2048", about = "Greedy vs expectimax on every game of a game list")]
struct Args {
    /// Game list: one `start_value grid_size` pair per line
    #[arg(default_value = "reverse2048.txt")]
    config: PathBuf,

    /// Text log of every game
    #[arg(long, default_value = "output.txt")]
    out: PathBuf,

    /// Expectimax search depth
    #[arg(long, default_value_t = ExpectimaxConfig::default().depth)]
    depth: u32,

    /// Base seed; random when omitted
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let games = read_game_list(&args.config).with_context(|| format!("reading {}", args.config.display()))?;
    let base_seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let search = ExpectimaxConfig { depth: args.depth, ..Default::default() };

    let mut results = Vec::with_capacity(games.len());
    for (i, start) in games.into_iter().enumerate() {
        let n = start.grid_size();
        println!("Game {}: reverse {} ({n}x{n})", i + 1, start.start_value());
        let options = MatchOptions { seed: base_seed.wrapping_add(i as u64), ..Default::default() };
        let result = Match::with_options(start, options, search).play_until_over();
        println!("{}", side_by_side(result.finals[0], result.finals[1]));
        println!(
            "{}: {} ({} moves) | {}: {} ({} moves) | Winner: {}\n",
            result.names[0],
            report::reason_text(result.reasons[0], result.moves[0]),
            result.moves[0],
            result.names[1],
            report::reason_text(result.reasons[1], result.moves[1]),
            result.moves[1],
            result.winner_label()
        );
        results.push(result);
    }

    report::export_game_log(&args.out, &results)?;
    println!("Game log written to {}", args.out.display());
    Ok(())
}
