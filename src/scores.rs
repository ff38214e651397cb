//! Run summary submission
//!
//! Fire-and-forget from the game's side: a sink that fails logs the problem
//! and the run carries on.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::persistence::PersistenceError;
use crate::sim::RunSummary;

/// Destination for finished runs
pub trait ScoreSink: Send {
    fn submit(&mut self, summary: &RunSummary);
}

/// Keeps summaries in memory; clones share the same list
#[derive(Debug, Clone, Default)]
pub struct MemoryScoreSink {
    runs: Arc<Mutex<Vec<RunSummary>>>,
}

impl MemoryScoreSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn runs(&self) -> Vec<RunSummary> {
        self.runs.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl ScoreSink for MemoryScoreSink {
    fn submit(&mut self, summary: &RunSummary) {
        if let Ok(mut runs) = self.runs.lock() {
            runs.push(summary.clone());
        }
    }
}

/// Appends one JSON object per line
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, summary: &RunSummary) -> Result<(), PersistenceError> {
        let line = serde_json::to_string(summary)?;
        let io_err = |source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(io_err)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        writeln!(file, "{}", line).map_err(io_err)?;
        Ok(())
    }
}

impl ScoreSink for JsonLinesSink {
    fn submit(&mut self, summary: &RunSummary) {
        match self.append(summary) {
            Ok(()) => log::info!("Submitted score {} to {}", summary.score, self.path.display()),
            Err(e) => log::warn!("Score submission failed: {}", e),
        }
    }
}

/// Best `limit` runs from a JSON-lines file, highest score first. Lines that
/// don't parse are skipped.
pub fn top_runs(path: &Path, limit: usize) -> Result<Vec<RunSummary>, PersistenceError> {
    let text = fs::read_to_string(path).map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut runs: Vec<RunSummary> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| match serde_json::from_str(l) {
            Ok(run) => Some(run),
            Err(e) => {
                log::warn!("Skipping bad score line: {}", e);
                None
            }
        })
        .collect();
    // Stable: equal scores keep submission order
    runs.sort_by(|a, b| b.score.cmp(&a.score));
    runs.truncate(limit);
    Ok(runs)
}
