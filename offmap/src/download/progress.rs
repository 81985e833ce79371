//! Progress snapshots for download jobs.

use serde::{Deserialize, Serialize};

use super::state::JobState;

/// Point-in-time view of a job, published after every tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadProgress {
    pub job_id: u64,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub pending: usize,
    pub cached_hits: usize,
    pub bytes_downloaded: u64,
    pub state: JobState,
}

impl DownloadProgress {
    /// Fraction of tiles with an outcome, `(total - pending) / total`.
    ///
    /// An empty job is fully done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (self.total - self.pending) as f64 / self.total as f64
        }
    }

    /// Tiles with an outcome, successful or not.
    pub fn processed(&self) -> usize {
        self.total - self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(total: usize, pending: usize) -> DownloadProgress {
        DownloadProgress {
            job_id: 1,
            total,
            completed: total - pending,
            failed: 0,
            pending,
            cached_hits: 0,
            bytes_downloaded: 0,
            state: JobState::Running,
        }
    }

    #[test]
    fn test_fraction() {
        assert_eq!(progress(4, 4).fraction(), 0.0);
        assert_eq!(progress(4, 1).fraction(), 0.75);
        assert_eq!(progress(4, 0).fraction(), 1.0);
    }

    #[test]
    fn test_fraction_empty_job() {
        assert_eq!(progress(0, 0).fraction(), 1.0);
    }

    #[test]
    fn test_processed_counts_failures() {
        let mut p = progress(10, 3);
        p.completed = 5;
        p.failed = 2;
        assert_eq!(p.processed(), 7);
    }
}
