//! Bulk tile downloads.
//!
//! This module fetches sets of tiles into the [`TileStore`](crate::cache::TileStore):
//! - Per-job state and terminal reports (`state`)
//! - Progress snapshots (`progress`)
//! - Per-tile retry policy (`retry`)
//! - The worker pool and job handles (`coordinator`)
//!
//! # Example
//!
//! ```ignore
//! use offmap::download::DownloadCoordinator;
//!
//! let coordinator = DownloadCoordinator::new(store, source);
//! let handle = coordinator.download(tiles, 8)?;
//! let report = handle.wait().await?;
//! println!("{}", report);
//! ```

mod coordinator;
mod progress;
mod retry;
mod state;

pub use coordinator::{DownloadCoordinator, DownloadError, DownloadHandle};
pub use progress::DownloadProgress;
pub use retry::{RetryPolicy, DEFAULT_ATTEMPT_TIMEOUT, DEFAULT_BASE_BACKOFF, DEFAULT_MAX_RETRIES};
pub use state::{FailedTile, JobReport, JobState};
