//! Compact binary trace of a finished match.
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! magic "R2T1" | version u8 | endian u8 | steps u32 | start_unix_s u64 | elapsed_s f32
//! | start_value u32 | grid_size u8 | reasons [u8; 2] | label_len u16 | label bytes
//! | states: (steps + 1) x [u128; 2] | moves: steps x [u8; 2] | crc32c u32
//! ```
//!
//! State 0 holds the opening boards; state `i` holds both boards after step `i`.
//! Each step moves exactly one board, the other move byte is `NO_MOVE`.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::engine::{Board, Move, TerminalReason, MAX_GRID_SIZE, MIN_GRID_SIZE};
use crate::session::MatchResult;

const MAGIC: &[u8; 4] = b"R2T1";
const VERSION: u8 = 1;
const ENDIAN_LE: u8 = 0;
// magic + version + endian + steps + start + elapsed + start_value + grid + reasons + label_len
const HEADER_LEN: usize = 4 + 1 + 1 + 4 + 8 + 4 + 4 + 1 + 2 + 2;
const CHECKSUM_LEN: usize = 4;

/// Move byte for the board that did not move in a step.
pub const NO_MOVE: u8 = 0xFF;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub steps: u32,
    pub start_unix_s: u64,
    pub elapsed_s: f32,
    pub start_value: u32,
    pub grid_size: u8,
    pub reasons: [TerminalReason; 2],
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchTrace {
    pub meta: Meta,
    pub states: Vec<[u128; 2]>, // length = steps + 1
    pub moves: Vec<[u8; 2]>,    // length = steps
}

impl MatchTrace {
    pub fn from_result(result: &MatchResult, start_unix_s: u64, elapsed_s: f32, label: Option<String>) -> Self {
        let mut states = Vec::with_capacity(result.history.len() + 1);
        let mut moves = Vec::with_capacity(result.history.len());
        states.push(result.initial.map(|b| b.raw()));
        for step in &result.history {
            states.push(step.boards.map(|b| b.raw()));
            let mut pair = [NO_MOVE; 2];
            pair[step.player.index()] = step.dir.to_u8();
            moves.push(pair);
        }
        let meta = Meta {
            steps: moves.len() as u32,
            start_unix_s,
            elapsed_s,
            start_value: result.start.start_value(),
            grid_size: result.start.grid_size() as u8,
            reasons: result.reasons,
            label,
        };
        MatchTrace { meta, states, moves }
    }

    /// Decoded boards for state `i`.
    pub fn boards(&self, i: usize) -> Option<[Board; 2]> {
        let [a, b] = *self.states.get(i)?;
        let size = self.meta.grid_size as usize;
        Some([Board::from_raw(a, size).ok()?, Board::from_raw(b, size).ok()?])
    }

    /// Decoded moves for step `i` (1-based, matching the state index it leads to).
    pub fn step_moves(&self, i: usize) -> Option<[Option<Move>; 2]> {
        let pair = self.moves.get(i.checked_sub(1)?)?;
        Some(pair.map(Move::from_u8))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TraceError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid magic or version")]
    MagicOrVersion,
    #[error("unsupported endianness")]
    Endianness,
    #[error("file too short or malformed")]
    Malformed,
    #[error("checksum mismatch")]
    Checksum,
}

/// Sequential little-endian reader over a byte slice.
struct Cursor<'a> {
    bytes: &'a [u8],
    off: usize,
}

impl<'a> Cursor<'a> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N], TraceError> {
        let end = self.off.checked_add(N).ok_or(TraceError::Malformed)?;
        let slice = self.bytes.get(self.off..end).ok_or(TraceError::Malformed)?;
        self.off = end;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8], TraceError> {
        let end = self.off.checked_add(len).ok_or(TraceError::Malformed)?;
        let slice = self.bytes.get(self.off..end).ok_or(TraceError::Malformed)?;
        self.off = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, TraceError> {
        Ok(self.take::<1>()?[0])
    }
}

pub fn encode_match(meta: &Meta, states: &[[u128; 2]], moves: &[[u8; 2]]) -> Result<Vec<u8>, TraceError> {
    if states.len() != meta.steps as usize + 1 || moves.len() != meta.steps as usize {
        return Err(TraceError::Malformed);
    }
    let label = meta.label.as_deref().map(str::as_bytes).unwrap_or(&[]);
    let label_len: u16 = label.len().try_into().map_err(|_| TraceError::Malformed)?;

    let payload_len = label.len() + states.len() * 32 + moves.len() * 2;
    let mut buf = Vec::with_capacity(HEADER_LEN + payload_len + CHECKSUM_LEN);

    buf.extend_from_slice(MAGIC);
    buf.push(VERSION);
    buf.push(ENDIAN_LE);
    buf.extend_from_slice(&meta.steps.to_le_bytes());
    buf.extend_from_slice(&meta.start_unix_s.to_le_bytes());
    buf.extend_from_slice(&meta.elapsed_s.to_bits().to_le_bytes());
    buf.extend_from_slice(&meta.start_value.to_le_bytes());
    buf.push(meta.grid_size);
    buf.extend(meta.reasons.map(TerminalReason::to_u8));
    buf.extend_from_slice(&label_len.to_le_bytes());
    buf.extend_from_slice(label);

    for pair in states {
        for raw in pair {
            buf.extend_from_slice(&raw.to_le_bytes());
        }
    }
    for pair in moves {
        buf.extend_from_slice(pair);
    }

    // Trailer: CRC32C of all preceding bytes
    let checksum = crc32c::crc32c(&buf);
    buf.extend_from_slice(&checksum.to_le_bytes());
    Ok(buf)
}

pub fn write_match_to_path<P: AsRef<Path>>(path: P, trace: &MatchTrace) -> Result<(), TraceError> {
    let data = encode_match(&trace.meta, &trace.states, &trace.moves)?;
    let mut f = fs::File::create(path)?;
    f.write_all(&data)?;
    Ok(())
}

pub fn parse_match_bytes(bytes: &[u8]) -> Result<MatchTrace, TraceError> {
    if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(TraceError::Malformed);
    }

    // Validate checksum first
    let (content, trailer) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    let file_crc = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    if file_crc != crc32c::crc32c(content) {
        return Err(TraceError::Checksum);
    }

    let mut cur = Cursor { bytes: content, off: 0 };
    if &cur.take::<4>()? != MAGIC || cur.u8()? != VERSION {
        return Err(TraceError::MagicOrVersion);
    }
    if cur.u8()? != ENDIAN_LE {
        return Err(TraceError::Endianness);
    }

    let steps = u32::from_le_bytes(cur.take()?);
    let start_unix_s = u64::from_le_bytes(cur.take()?);
    let elapsed_s = f32::from_bits(u32::from_le_bytes(cur.take()?));
    let start_value = u32::from_le_bytes(cur.take()?);
    let grid_size = cur.u8()?;
    if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&(grid_size as usize)) {
        return Err(TraceError::Malformed);
    }
    let reason_bytes: [u8; 2] = cur.take()?;
    let mut reasons = [TerminalReason::NotOver; 2];
    for (slot, &b) in reasons.iter_mut().zip(&reason_bytes) {
        *slot = TerminalReason::from_u8(b).ok_or(TraceError::Malformed)?;
    }
    let label_len = u16::from_le_bytes(cur.take()?) as usize;
    let label_bytes = cur.bytes(label_len)?;
    let label = if label_len > 0 {
        Some(std::str::from_utf8(label_bytes).map_err(|_| TraceError::Malformed)?.to_string())
    } else {
        None
    };

    let states_count = steps as usize + 1;
    let needed = states_count.checked_mul(32).and_then(|s| s.checked_add(steps as usize * 2)).ok_or(TraceError::Malformed)?;
    if content.len() - cur.off != needed {
        return Err(TraceError::Malformed);
    }

    let mut states = Vec::with_capacity(states_count);
    for _ in 0..states_count {
        let a = u128::from_le_bytes(cur.take()?);
        let b = u128::from_le_bytes(cur.take()?);
        states.push([a, b]);
    }
    let mut moves = Vec::with_capacity(steps as usize);
    for _ in 0..steps {
        moves.push(cur.take::<2>()?);
    }

    let meta = Meta { steps, start_unix_s, elapsed_s, start_value, grid_size, reasons, label };
    Ok(MatchTrace { meta, states, moves })
}

pub fn parse_match_file<P: AsRef<Path>>(path: P) -> Result<MatchTrace, TraceError> {
    let data = fs::read(path)?;
    parse_match_bytes(&data)
}

pub fn now_unix_seconds() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}
