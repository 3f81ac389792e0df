//! Game configuration: validation errors and the plain-text game list.
//!
//! The game list holds one game per line as two integers, `start_value grid_size`:
//!
//! ```text
//! # start grid
//! 512 5
//! 256 4
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::fs;
use std::io::{self, BufRead};
use std::path::Path;

use log::debug;

use crate::engine::StartConfig;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("grid size must be between 3 and 5, got {0}")]
    InvalidGridSize(usize),
    #[error("start value must be 128, 256 or 512, got {0}")]
    InvalidStartValue(u32),
    #[error("row {row} has {len} cells, expected {size}")]
    NotSquare { row: usize, len: usize, size: usize },
    #[error("cell ({row}, {col}) holds {value}, not a power of two tile")]
    InvalidTile { row: usize, col: usize, value: u32 },
    #[error("line {line}: expected `start_value grid_size`, got {text:?}")]
    Malformed { line: usize, text: String },
    #[error("line {line}: {source}")]
    Invalid {
        line: usize,
        #[source]
        source: Box<ConfigError>,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Parse a game list from any buffered reader.
///
/// ```
/// use reverse_2048::config::parse_game_list;
/// let games = parse_game_list("512 5\n\n# comment\n128 3\n".as_bytes()).unwrap();
/// assert_eq!(games.len(), 2);
/// assert_eq!(games[1].grid_size(), 3);
/// ```
pub fn parse_game_list<R: BufRead>(reader: R) -> Result<Vec<StartConfig>, ConfigError> {
    let mut games = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        let text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let mut fields = text.split_whitespace();
        let parsed = match (fields.next(), fields.next(), fields.next()) {
            (Some(start), Some(size), None) => start.parse::<u32>().ok().zip(size.parse::<usize>().ok()),
            _ => None,
        };
        let (start, size) = parsed.ok_or_else(|| ConfigError::Malformed { line: line_no, text: text.to_string() })?;
        let cfg = StartConfig::new(start, size)
            .map_err(|e| ConfigError::Invalid { line: line_no, source: Box::new(e) })?;
        debug!("line {line_no}: start={start} grid={size}");
        games.push(cfg);
    }
    Ok(games)
}

/// Read and parse a game list file.
pub fn read_game_list<P: AsRef<Path>>(path: P) -> Result<Vec<StartConfig>, ConfigError> {
    let file = fs::File::open(path)?;
    parse_game_list(io::BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parses_pairs_and_skips_noise() {
        let text = "  512 5 \n\n# header\n256\t4\n128 3\n";
        let games = parse_game_list(text.as_bytes()).unwrap();
        let pairs: Vec<(u32, usize)> = games.iter().map(|g| (g.start_value(), g.grid_size())).collect();
        assert_eq!(pairs, vec![(512, 5), (256, 4), (128, 3)]);
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let err = parse_game_list("512 5\n512\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { line: 2, .. }));
        let err = parse_game_list("512 5 1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { line: 1, .. }));
        let err = parse_game_list("abc 5\n".as_bytes()).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { line: 1, .. }));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = parse_game_list("512 5\n\n100 4\n".as_bytes()).unwrap_err();
        match err {
            ConfigError::Invalid { line, source } => {
                assert_eq!(line, 3);
                assert!(matches!(*source, ConfigError::InvalidStartValue(100)));
            }
            other => panic!("unexpected error: {other}"),
        }
        let err = parse_game_list("256 7\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("grid size"));
    }

    #[test]
    fn reads_from_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "128 4").unwrap();
        writeln!(tmp, "256 3").unwrap();
        let games = read_game_list(tmp.path()).unwrap();
        assert_eq!(games.len(), 2);
        assert!(matches!(read_game_list("/definitely/not/here.txt"), Err(ConfigError::Io(_))));
    }
}
