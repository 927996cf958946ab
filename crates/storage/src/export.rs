// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot exporter (§6.1, §6.2): the canonical on-disk JSONL
//! representation the Change Detector watches for external edits.
//! Distinct from [`crate::checkpoint`]'s zstd-compressed internal
//! snapshot — this format is meant to be read and hand-edited outside
//! the daemon.

use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use bd_core::{Issue, Status};

use crate::state::MaterializedState;

/// Write every non-tombstone issue as one JSON object per line, sorted
/// by ID (§3.2 invariant 4), so a re-export of unchanged state produces
/// byte-identical output. Writes through a temp file and renames into
/// place so a reader never observes a half-written snapshot.
pub fn write_snapshot(path: &Path, state: &MaterializedState) -> std::io::Result<()> {
    let mut issues: Vec<&Issue> = state.issues.values().filter(|i| !matches!(i.status, Status::Tombstone)).collect();
    issues.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));

    let tmp_path = path.with_extension("jsonl.tmp");
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp = std::fs::File::create(&tmp_path)?;
    for issue in issues {
        serde_json::to_writer(&mut tmp, issue)?;
        tmp.write_all(b"\n")?;
    }
    tmp.flush()?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Parse a line-delimited snapshot back into individual issues. Blank
/// lines are skipped so a file edited by hand doesn't trip on trailing
/// whitespace.
pub fn read_snapshot(path: &Path) -> std::io::Result<Vec<Issue>> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let mut issues = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let issue: Issue = serde_json::from_str(&line)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        issues.push(issue);
    }
    Ok(issues)
}
