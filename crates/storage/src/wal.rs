// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only write-ahead log of [`Event`]s, one JSON object per line.
//!
//! Every mutation is durable the moment it is flushed to the WAL;
//! [`crate::state::MaterializedState`] is derived from replaying it.
//! A corrupt tail (partial write from a crash mid-`fsync`) is rotated
//! out to a `.bak` file at open time so recovery always starts from a
//! clean log; the daemon logs a warning rather than refusing to start.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backup::rotate_bak_path;
use crate::event::Event;

/// Entries buffered since the last flush before the WAL forces a sync.
const FLUSH_THRESHOLD: usize = 100;
/// Maximum time an entry may sit unflushed before `needs_flush` trips.
const FLUSH_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum WalError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub event: Event,
}

pub struct Wal {
    path: PathBuf,
    writer: BufWriter<File>,
    write_seq: u64,
    processed_seq: u64,
    read_offset: u64,
    pending_since_flush: usize,
    last_flush: Instant,
}

impl Wal {
    /// Open (or create) the WAL at `path`. `processed_seq` is the
    /// sequence number already reflected in the last-loaded snapshot;
    /// entries at or below it are skipped by [`Wal::next_unprocessed`].
    pub fn open(path: impl AsRef<Path>, processed_seq: u64) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut entries = Vec::new();
        let mut corrupted = false;
        if path.exists() {
            let bytes = fs::read(&path)?;
            for line in bytes.split(|&b| b == b'\n') {
                if line.is_empty() {
                    continue;
                }
                match std::str::from_utf8(line).ok().and_then(|s| serde_json::from_str::<WalEntry>(s).ok()) {
                    Some(entry) => entries.push(entry),
                    None => {
                        corrupted = true;
                        break;
                    }
                }
            }
        }

        if corrupted {
            let bak = rotate_bak_path(&path);
            fs::rename(&path, &bak).or_else(|_| fs::copy(&path, &bak).map(|_| ()))?;
            write_clean(&path, &entries)?;
        } else if !path.exists() {
            File::create(&path)?;
        }

        let write_seq = entries.last().map(|e| e.seq).unwrap_or(0);
        let writer = BufWriter::new(OpenOptions::new().append(true).create(true).open(&path)?);

        Ok(Self {
            path,
            writer,
            write_seq,
            processed_seq,
            read_offset: 0,
            pending_since_flush: 0,
            last_flush: Instant::now(),
        })
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    pub fn mark_processed(&mut self, seq: u64) {
        self.processed_seq = seq;
    }

    pub fn append(&mut self, event: &Event) -> Result<u64, WalError> {
        self.write_seq += 1;
        let entry = WalEntry { seq: self.write_seq, event: event.clone() };
        let line = serde_json::to_string(&entry)?;
        writeln!(self.writer, "{line}")?;
        self.pending_since_flush += 1;
        Ok(entry.seq)
    }

    pub fn flush(&mut self) -> Result<(), WalError> {
        self.writer.flush()?;
        self.pending_since_flush = 0;
        self.last_flush = Instant::now();
        Ok(())
    }

    pub fn needs_flush(&self) -> bool {
        self.pending_since_flush >= FLUSH_THRESHOLD || self.last_flush.elapsed() >= FLUSH_INTERVAL
    }

    /// Read and return the next unprocessed entry, advancing the
    /// internal read cursor. Corrupt or non-UTF-8 lines encountered
    /// mid-stream (e.g. a partial write racing a reader) are skipped
    /// rather than surfaced as an error, so a live engine loop keeps
    /// making progress; the next call resumes past them.
    pub fn next_unprocessed(&mut self) -> Result<Option<WalEntry>, WalError> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(self.read_offset))?;
        let mut reader = BufReader::new(file);

        loop {
            let mut line = Vec::new();
            let n = reader.read_until(b'\n', &mut line)?;
            if n == 0 {
                return Ok(None);
            }
            self.read_offset += n as u64;

            let trimmed = if line.last() == Some(&b'\n') { &line[..line.len() - 1] } else { &line[..] };
            if trimmed.is_empty() {
                continue;
            }
            match std::str::from_utf8(trimmed).ok().and_then(|s| serde_json::from_str::<WalEntry>(s).ok()) {
                Some(entry) => return Ok(Some(entry)),
                None => continue,
            }
        }
    }

    /// Replay every valid entry with `seq > after_seq`, stopping at the
    /// first corrupt or non-UTF-8 line rather than skipping past it —
    /// unlike [`Wal::next_unprocessed`], this is used for bulk recovery
    /// where silently dropping a gap in the middle of the log would be
    /// worse than stopping short.
    pub fn entries_after(&self, after_seq: u64) -> Result<Vec<WalEntry>, WalError> {
        let file = File::open(&self.path)?;
        let mut reader = BufReader::new(file);
        let mut out = Vec::new();

        loop {
            let mut line = Vec::new();
            let n = reader.read_until(b'\n', &mut line)?;
            if n == 0 {
                break;
            }
            let trimmed = if line.last() == Some(&b'\n') { &line[..line.len() - 1] } else { &line[..] };
            if trimmed.is_empty() {
                continue;
            }
            match std::str::from_utf8(trimmed).ok().and_then(|s| serde_json::from_str::<WalEntry>(s).ok()) {
                Some(entry) => {
                    if entry.seq > after_seq {
                        out.push(entry);
                    }
                }
                None => break,
            }
        }

        Ok(out)
    }

    /// Drop all entries with `seq < keep_from_seq`, rewriting the file
    /// in place. Used after a checkpoint to bound WAL growth.
    pub fn truncate_before(&mut self, keep_from_seq: u64) -> Result<(), WalError> {
        let keep = self.entries_after(keep_from_seq.saturating_sub(1))?;
        self.flush()?;
        write_clean(&self.path, &keep)?;
        self.writer = BufWriter::new(OpenOptions::new().append(true).create(true).open(&self.path)?);
        self.read_offset = 0;
        Ok(())
    }
}

fn write_clean(path: &Path, entries: &[WalEntry]) -> Result<(), WalError> {
    let mut buf = String::new();
    for entry in entries {
        buf.push_str(&serde_json::to_string(entry)?);
        buf.push('\n');
    }
    fs::write(path, buf)?;
    Ok(())
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
