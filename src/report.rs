//! Console tables, CSV exports and the text game log.
//!
//! Everything writes to a generic `io::Write` so the same code serves stdout,
//! files and in-memory buffers in tests.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::engine::{Board, StartConfig, TerminalReason};
use crate::session::{MatchResult, Player};
use crate::tester::{GameRecord, Summary};

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error("could not write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

const GAP: &str = "     ";

/// Reason label, with the move count appended for the move limit.
pub fn reason_text(reason: TerminalReason, moves: u32) -> String {
    match reason {
        TerminalReason::MoveLimitReached => format!("{} ({moves})", reason.label()),
        other => other.label().to_string(),
    }
}

/// Two boards rendered next to each other.
///
/// ```
/// use reverse_2048::engine::Board;
/// use reverse_2048::report::side_by_side;
/// let a = Board::from_rows(&[[4, 0, 0], [0, 0, 0], [0, 0, 0]]).unwrap();
/// let text = side_by_side(a, a);
/// assert_eq!(text.lines().count(), 5);
/// assert!(text.lines().nth(1).unwrap().matches("4").count() == 2);
/// ```
pub fn side_by_side(left: Board, right: Board) -> String {
    let (left, right) = (left.to_string(), right.to_string());
    left.lines()
        .zip(right.lines())
        .map(|(l, r)| format!("{l}{GAP}{r}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn write_records_table<W: Write>(w: &mut W, records: &[GameRecord]) -> io::Result<()> {
    let names = names_of(records);
    writeln!(w, "========== Detailed Results ==========")?;
    writeln!(
        w,
        "{:<5}{:<7}{:<5}{:<15}{:<15}{:<7}{:<7}{:<11}{:<11}Winner",
        "Game", "Start", "Grid", names[0], names[1], "Moves1", "Moves2", "Time1(ms)", "Time2(ms)"
    )?;
    writeln!(w, "{}", "-".repeat(92))?;
    for rec in records {
        writeln!(
            w,
            "{:<5}{:<7}{:<5}{:<15}{:<15}{:<7}{:<7}{:<11.2}{:<11.2}{}",
            rec.game,
            rec.start_value,
            rec.grid_size,
            reason_text(rec.reasons[0], rec.moves[0]),
            reason_text(rec.reasons[1], rec.moves[1]),
            rec.moves[0],
            rec.moves[1],
            rec.total_ms[0],
            rec.total_ms[1],
            rec.winner_label()
        )?;
    }
    writeln!(w, "{}", "-".repeat(92))
}

pub fn write_summary<W: Write>(w: &mut W, names: [&str; 2], summary: &Summary) -> io::Result<()> {
    writeln!(w, "========== Summary Statistics ==========")?;
    writeln!(w, "{:<28}{}", "Games played:", summary.games)?;
    for p in Player::BOTH {
        let i = p.index();
        writeln!(
            w,
            "{:<28}{} ({:.1}%)",
            format!("{} wins:", names[i]),
            summary.wins[i],
            summary.win_rate[i] * 100.0
        )?;
    }
    writeln!(w, "{:<28}{}", "Draws:", summary.draws)?;
    for p in Player::BOTH {
        let i = p.index();
        writeln!(w, "{:<28}{:.2}", format!("{} avg moves:", names[i]), summary.avg_moves[i])?;
        writeln!(w, "{:<28}{:.3}", format!("{} avg ms/move:", names[i]), summary.avg_ms_per_move[i])?;
    }
    writeln!(w, "========================================")
}

/// One row per game.
pub fn write_records_csv<W: Write>(w: &mut W, records: &[GameRecord]) -> io::Result<()> {
    let [a, b] = names_of(records);
    writeln!(
        w,
        "Game,StartNumber,GridSize,{a}_Reason,{b}_Reason,{a}_MoveCount,{b}_MoveCount,\
         {a}_TotalTime(ms),{b}_TotalTime(ms),{a}_Win,{b}_Win,Winner"
    )?;
    for rec in records {
        let won = rec.reasons.map(|r| u8::from(r == TerminalReason::Win));
        writeln!(
            w,
            "{},{},{},{},{},{},{},{:.3},{:.3},{},{},{}",
            rec.game,
            rec.start_value,
            rec.grid_size,
            reason_text(rec.reasons[0], rec.moves[0]),
            reason_text(rec.reasons[1], rec.moves[1]),
            rec.moves[0],
            rec.moves[1],
            rec.total_ms[0],
            rec.total_ms[1],
            won[0],
            won[1],
            rec.winner_label()
        )?;
    }
    Ok(())
}

/// One row per configuration.
pub fn write_summary_csv<W: Write>(w: &mut W, names: [&str; 2], rows: &[(StartConfig, Summary)]) -> io::Result<()> {
    let [a, b] = names;
    writeln!(
        w,
        "StartNumber,GridSize,GamesPlayed,{a}_Wins,{b}_Wins,Draws,{a}_WinRate,{b}_WinRate,\
         {a}_AvgMoves,{b}_AvgMoves,{a}_AvgTimePerMove(ms),{b}_AvgTimePerMove(ms)"
    )?;
    for (start, s) in rows {
        writeln!(
            w,
            "{},{},{},{},{},{},{:.3},{:.3},{:.2},{:.2},{:.3},{:.3}",
            start.start_value(),
            start.grid_size(),
            s.games,
            s.wins[0],
            s.wins[1],
            s.draws,
            s.win_rate[0],
            s.win_rate[1],
            s.avg_moves[0],
            s.avg_moves[1],
            s.avg_ms_per_move[0],
            s.avg_ms_per_move[1]
        )?;
    }
    Ok(())
}

/// Full log of one match: header, initial boards, every move, final outcome.
pub fn write_game_log<W: Write>(w: &mut W, game: u32, result: &MatchResult) -> io::Result<()> {
    let n = result.start.grid_size();
    writeln!(w, "{}", "=".repeat(73))?;
    writeln!(w, "Game {game}: reverse {} ({n}x{n})", result.start.start_value())?;
    writeln!(w, "Initial boards: {} | {}", result.names[0], result.names[1])?;
    writeln!(w, "{}", side_by_side(result.initial[0], result.initial[1]))?;
    for step in &result.history {
        writeln!(w, "Move {}: {} {}", step.index, result.names[step.player.index()], step.dir)?;
        writeln!(w, "{}", side_by_side(step.boards[0], step.boards[1]))?;
    }
    writeln!(w, "Final boards:")?;
    writeln!(w, "{}", side_by_side(result.finals[0], result.finals[1]))?;
    for p in Player::BOTH {
        let i = p.index();
        writeln!(w, "{}: {} after {} moves", result.names[i], reason_text(result.reasons[i], result.moves[i]), result.moves[i])?;
    }
    match result.winner.player() {
        Some(p) => writeln!(w, "Winner: {}, total moves {}", result.winner_label(), result.moves[p.index()])?,
        None => writeln!(w, "Outcome: Draw")?,
    }
    writeln!(w)
}

pub fn export_records_csv<P: AsRef<Path>>(path: P, records: &[GameRecord]) -> Result<(), ReportError> {
    write_file(path.as_ref(), |w| write_records_csv(w, records))
}

pub fn export_summary_csv<P: AsRef<Path>>(
    path: P,
    names: [&str; 2],
    rows: &[(StartConfig, Summary)],
) -> Result<(), ReportError> {
    write_file(path.as_ref(), |w| write_summary_csv(w, names, rows))
}

/// Write the log of every match to `path`, numbering games from one.
pub fn export_game_log<P: AsRef<Path>>(path: P, results: &[MatchResult]) -> Result<(), ReportError> {
    write_file(path.as_ref(), |w| {
        for (i, result) in results.iter().enumerate() {
            write_game_log(w, i as u32 + 1, result)?;
        }
        Ok(())
    })
}

fn write_file<F>(path: &Path, body: F) -> Result<(), ReportError>
where
    F: FnOnce(&mut BufWriter<fs::File>) -> io::Result<()>,
{
    let wrap = |source| ReportError::Write { path: path.to_path_buf(), source };
    let file = fs::File::create(path).map_err(wrap)?;
    let mut w = BufWriter::new(file);
    body(&mut w).map_err(wrap)?;
    w.flush().map_err(wrap)?;
    Ok(())
}

fn names_of(records: &[GameRecord]) -> [&str; 2] {
    match records.first() {
        Some(rec) => [rec.names[0].as_str(), rec.names[1].as_str()],
        None => ["Player1", "Player2"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expectimax::ExpectimaxConfig;
    use crate::session::{Match, MatchOptions, Winner};
    use tempfile::tempdir;

    fn sample_records() -> Vec<GameRecord> {
        use TerminalReason::*;
        let names = ["Greedy".to_string(), "Expectimax".to_string()];
        vec![
            GameRecord {
                game: 1,
                start_value: 256,
                grid_size: 4,
                seed: 0,
                names: names.clone(),
                reasons: [OpponentWon, Win],
                moves: [20, 18],
                total_ms: [0.5, 120.25],
                winner: Winner::Outright(Player::Two),
            },
            GameRecord {
                game: 2,
                start_value: 256,
                grid_size: 4,
                seed: 1,
                names,
                reasons: [MoveLimitReached, StalemateBoardFull],
                moves: [1000, 40],
                total_ms: [3.0, 200.0],
                winner: Winner::Draw,
            },
        ]
    }

    #[test]
    fn reason_text_mentions_move_limit() {
        assert_eq!(reason_text(TerminalReason::MoveLimitReached, 1000), "Move Limit (1000)");
        assert_eq!(reason_text(TerminalReason::StalemateNoMoves, 3), "No Moves");
    }

    #[test]
    fn records_csv_layout() {
        let mut out = Vec::new();
        write_records_csv(&mut out, &sample_records()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("Game,StartNumber,GridSize,Greedy_Reason,Expectimax_Reason,"));
        assert!(lines[0].ends_with(",Winner"));
        assert_eq!(lines[1], "1,256,4,Opponent Won,Win,20,18,0.500,120.250,0,1,Expectimax");
        assert_eq!(lines[2], "2,256,4,Move Limit (1000),Board Full,1000,40,3.000,200.000,0,0,Draw");
    }

    #[test]
    fn summary_outputs() {
        let records = sample_records();
        let summary = crate::tester::summarize(&records);
        let start = StartConfig::new(256, 4).unwrap();
        let mut csv = Vec::new();
        write_summary_csv(&mut csv, ["Greedy", "Expectimax"], &[(start, summary.clone())]).unwrap();
        let csv = String::from_utf8(csv).unwrap();
        assert_eq!(csv.lines().nth(1), Some("256,4,2,0,1,1,0.000,0.500,510.00,29.00,0.003,5.522"));

        let mut console = Vec::new();
        write_summary(&mut console, ["Greedy", "Expectimax"], &summary).unwrap();
        let console = String::from_utf8(console).unwrap();
        assert!(console.contains("Expectimax wins:"));
        assert!(console.contains("1 (50.0%)"));

        let mut table = Vec::new();
        write_records_table(&mut table, &records).unwrap();
        assert_eq!(String::from_utf8(table).unwrap().lines().count(), 6);
    }

    #[test]
    fn game_log_lists_every_move() {
        let start = StartConfig::new(128, 3).unwrap();
        let result = Match::with_options(start, MatchOptions { seed: 9, ..Default::default() }, ExpectimaxConfig {
            depth: 2,
            ..Default::default()
        })
        .play_until_over();
        let mut out = Vec::new();
        write_game_log(&mut out, 1, &result).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Game 1: reverse 128 (3x3)"));
        assert_eq!(text.matches("\nMove ").count(), result.history.len());
        assert!(text.contains("Winner:") || text.contains("Outcome: Draw"));
    }

    #[test]
    fn exports_to_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.csv");
        export_records_csv(&path, &sample_records()).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);

        let missing = dir.path().join("nope").join("results.csv");
        match export_records_csv(&missing, &sample_records()) {
            Err(ReportError::Write { path, .. }) => assert_eq!(path, missing),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
