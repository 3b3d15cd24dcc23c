use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Run log entry (JSONL)
// ---------------------------------------------------------------------------

/// One analysis run in `~/.topiclens/run-log.jsonl`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub timestamp: String,
    pub topic_count: i64,
    /// `"rendered"` or an error kind (`"timeout"`, `"server"`, ...).
    pub outcome: String,
    pub latency_ms: u64,
    #[serde(default)]
    pub stores: usize,
    #[serde(default)]
    pub topics: usize,
    /// The notification shown for failed runs.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
}

impl RunLogEntry {
    pub fn new(topic_count: i64, outcome: &str, latency_ms: u64) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            topic_count,
            outcome: outcome.to_string(),
            latency_ms,
            stores: 0,
            topics: 0,
            message: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.outcome == "rendered"
    }
}

// ---------------------------------------------------------------------------
// Logging functions
// ---------------------------------------------------------------------------

/// Append a run to the run log. Best-effort: failures are only logged.
pub fn log_run(entry: &RunLogEntry) {
    let Some(path) = run_log_path() else {
        return;
    };
    if let Err(e) = append_entry(&path, entry) {
        log::debug!("failed to append run log {}: {e}", path.display());
    }
}

/// Read all run log entries, oldest first.
///
/// Silently skips malformed lines. Returns an empty vec if the file does not
/// exist or cannot be read.
pub fn read_all_entries() -> Vec<RunLogEntry> {
    run_log_path()
        .map(|path| read_entries(&path))
        .unwrap_or_default()
}

fn read_entries(path: &Path) -> Vec<RunLogEntry> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(std::result::Result::ok)
        .filter_map(|line| serde_json::from_str::<RunLogEntry>(&line).ok())
        .collect()
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

fn append_entry(path: &Path, entry: &RunLogEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

/// Return the path to the run log file.
pub fn run_log_path() -> Option<PathBuf> {
    crate::config::data_dir().map(|dir| dir.join("run-log.jsonl"))
}
