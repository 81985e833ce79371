//! Job state tracking for bulk tile downloads.
//!
//! A job's coordinates are always partitioned into three disjoint sets:
//! pending, completed and failed. A coordinate leaves `pending` exactly once,
//! when a worker records its outcome.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::coord::TileCoord;

use super::progress::DownloadProgress;

/// Lifecycle state of a download job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Running,
    /// Every tile is cached.
    Completed,
    /// Every tile was attempted and at least one could not be fetched.
    Failed,
    /// Cancelled while tiles were still pending.
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Running)
    }

    pub fn name(&self) -> &'static str {
        match self {
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tile that could not be downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTile {
    pub coord: TileCoord,
    /// Fetch attempts made, including retries.
    pub attempts: u32,
    /// Last error observed.
    pub error: String,
}

/// Terminal report for a download job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: u64,
    pub state: JobState,
    pub total: usize,
    /// Tiles present in the store at the end, including cache hits.
    pub completed: usize,
    /// Tiles that were already cached and not fetched.
    pub cached_hits: usize,
    pub failed: Vec<FailedTile>,
    pub bytes_downloaded: u64,
    pub elapsed: Duration,
}

impl JobReport {
    /// Whether every tile ended up in the store.
    pub fn is_success(&self) -> bool {
        self.state == JobState::Completed
    }

    /// Tiles neither completed nor failed (only non-zero when cancelled).
    pub fn pending(&self) -> usize {
        self.total - self.completed - self.failed.len()
    }
}

impl fmt::Display for JobReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "job {} {}: {}/{} tiles ({} cached, {} failed, {} pending), {} bytes in {:.1}s",
            self.job_id,
            self.state,
            self.completed,
            self.total,
            self.cached_hits,
            self.failed.len(),
            self.pending(),
            self.bytes_downloaded,
            self.elapsed.as_secs_f64()
        )
    }
}

/// Mutable bookkeeping for one job.
///
/// Lives behind a mutex shared by the job's workers; every method is a short
/// critical section.
#[derive(Debug)]
pub(crate) struct JobTracker {
    total: usize,
    /// Coordinates not yet claimed by a worker.
    queue: VecDeque<TileCoord>,
    /// Coordinates without an outcome, claimed or not.
    pending: BTreeSet<TileCoord>,
    completed: BTreeSet<TileCoord>,
    failed: BTreeMap<TileCoord, FailedTile>,
    cached_hits: usize,
    bytes_downloaded: u64,
    state: JobState,
}

impl JobTracker {
    pub(crate) fn new(coordinates: BTreeSet<TileCoord>) -> Self {
        Self {
            total: coordinates.len(),
            queue: coordinates.iter().copied().collect(),
            pending: coordinates,
            completed: BTreeSet::new(),
            failed: BTreeMap::new(),
            cached_hits: 0,
            bytes_downloaded: 0,
            state: JobState::Running,
        }
    }

    /// Claim the next coordinate. It stays pending until an outcome is recorded.
    pub(crate) fn next(&mut self) -> Option<TileCoord> {
        self.queue.pop_front()
    }

    /// Record a tile that was already in the store.
    pub(crate) fn record_cached(&mut self, coord: TileCoord) {
        if self.pending.remove(&coord) {
            self.cached_hits += 1;
            self.completed.insert(coord);
        }
    }

    /// Record a tile that was fetched and stored.
    pub(crate) fn record_downloaded(&mut self, coord: TileCoord, bytes: u64) {
        if self.pending.remove(&coord) {
            self.bytes_downloaded += bytes;
            self.completed.insert(coord);
        }
    }

    /// Record a tile whose fetch or store failed.
    pub(crate) fn record_failed(&mut self, coord: TileCoord, attempts: u32, error: String) {
        if self.pending.remove(&coord) {
            self.failed.insert(
                coord,
                FailedTile {
                    coord,
                    attempts,
                    error,
                },
            );
        }
    }

    /// Settle the terminal state once all workers have stopped.
    pub(crate) fn finish(&mut self) -> JobState {
        self.state = if !self.pending.is_empty() {
            JobState::Cancelled
        } else if self.failed.is_empty() {
            JobState::Completed
        } else {
            JobState::Failed
        };
        self.state
    }

    pub(crate) fn progress(&self, job_id: u64) -> DownloadProgress {
        DownloadProgress {
            job_id,
            total: self.total,
            completed: self.completed.len(),
            failed: self.failed.len(),
            pending: self.pending.len(),
            cached_hits: self.cached_hits,
            bytes_downloaded: self.bytes_downloaded,
            state: self.state,
        }
    }

    pub(crate) fn report(&self, job_id: u64, elapsed: Duration) -> JobReport {
        JobReport {
            job_id,
            state: self.state,
            total: self.total,
            completed: self.completed.len(),
            cached_hits: self.cached_hits,
            failed: self.failed.values().cloned().collect(),
            bytes_downloaded: self.bytes_downloaded,
            elapsed,
        }
    }
}
