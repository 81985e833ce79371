//! Bounded-concurrency bulk tile downloader.
//!
//! A job's coordinates are placed in a shared queue and drained by up to
//! `max_concurrency` worker tasks. Each worker:
//!
//! 1. Stops if the job was cancelled
//! 2. Claims the next coordinate
//! 3. Skips it if the store already has it
//! 4. Otherwise fetches it with retries and writes it to the store
//!
//! A tile that cannot be fetched or stored is recorded as failed and the
//! worker moves on. A supervisor task waits for all workers, settles the
//! terminal state and produces the [`JobReport`].

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::TileStore;
use crate::coord::TileCoord;
use crate::provider::{ProviderError, TileSource};

use super::progress::DownloadProgress;
use super::retry::RetryPolicy;
use super::state::{JobReport, JobTracker};

/// Errors from running a download job.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// `download` was called outside a tokio runtime.
    #[error("No tokio runtime available to run the download")]
    NoRuntime,

    /// The supervisor or a worker task panicked or was aborted.
    #[error("Download task failed: {0}")]
    TaskFailed(String),
}

/// Outcome of fetching one tile with retries.
enum FetchOutcome {
    Fetched { bytes: Vec<u8>, attempts: u32 },
    Failed { error: ProviderError, attempts: u32 },
    /// Cancelled during a backoff wait; the tile stays pending.
    Cancelled,
}

/// Shared state of one running job.
struct Job {
    id: u64,
    tracker: Mutex<JobTracker>,
    cancel: CancellationToken,
    progress_tx: watch::Sender<DownloadProgress>,
}

impl Job {
    /// Apply a tracker update and publish the new progress snapshot.
    fn update(&self, apply: impl FnOnce(&mut JobTracker)) {
        let progress = {
            let mut tracker = self.tracker.lock();
            apply(&mut tracker);
            tracker.progress(self.id)
        };
        self.progress_tx.send_replace(progress);
    }
}

/// Dependencies shared by every worker of every job.
struct WorkerContext {
    store: Arc<TileStore>,
    source: Arc<dyn TileSource>,
    retry: RetryPolicy,
}

/// Downloads sets of tiles into a [`TileStore`].
pub struct DownloadCoordinator {
    context: Arc<WorkerContext>,
    next_job_id: AtomicU64,
}

impl DownloadCoordinator {
    /// Create a coordinator with the default retry policy.
    pub fn new(store: Arc<TileStore>, source: Arc<dyn TileSource>) -> Self {
        Self::with_retry_policy(store, source, RetryPolicy::default())
    }

    pub fn with_retry_policy(
        store: Arc<TileStore>,
        source: Arc<dyn TileSource>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            context: Arc::new(WorkerContext {
                store,
                source,
                retry,
            }),
            next_job_id: AtomicU64::new(1),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.context.retry
    }

    /// Start downloading `coordinates` on the current tokio runtime.
    pub fn download(
        &self,
        coordinates: BTreeSet<TileCoord>,
        max_concurrency: usize,
    ) -> Result<DownloadHandle, DownloadError> {
        let runtime = Handle::try_current().map_err(|_| DownloadError::NoRuntime)?;
        Ok(self.download_on(&runtime, coordinates, max_concurrency))
    }

    /// Start downloading `coordinates` on the given runtime.
    ///
    /// At most `max_concurrency` fetches run at once; zero is treated as one.
    /// Returns immediately; the job runs in the background.
    pub fn download_on(
        &self,
        runtime: &Handle,
        coordinates: BTreeSet<TileCoord>,
        max_concurrency: usize,
    ) -> DownloadHandle {
        let id = self.next_job_id.fetch_add(1, Ordering::Relaxed);
        let total = coordinates.len();
        let workers = max_concurrency.max(1).min(total);

        let tracker = JobTracker::new(coordinates);
        let (progress_tx, progress_rx) = watch::channel(tracker.progress(id));
        let cancel = CancellationToken::new();
        let job = Arc::new(Job {
            id,
            tracker: Mutex::new(tracker),
            cancel: cancel.clone(),
            progress_tx,
        });

        info!(job_id = id, tiles = total, workers = workers, "Download job started");

        let context = Arc::clone(&self.context);
        let supervisor = runtime.spawn(run_job(context, Arc::clone(&job), workers));

        DownloadHandle {
            id,
            progress_rx,
            cancel,
            task: supervisor,
        }
    }
}

/// Run all workers of a job and settle its terminal state.
async fn run_job(
    context: Arc<WorkerContext>,
    job: Arc<Job>,
    workers: usize,
) -> Result<JobReport, DownloadError> {
    let started = Instant::now();

    let handles: Vec<JoinHandle<()>> = (0..workers)
        .map(|_| tokio::spawn(run_worker(Arc::clone(&context), Arc::clone(&job))))
        .collect();

    let mut task_error = None;
    for result in futures::future::join_all(handles).await {
        if let Err(e) = result {
            warn!(job_id = job.id, error = %e, "Download worker failed");
            task_error = Some(e.to_string());
        }
    }

    let report = {
        let mut tracker = job.tracker.lock();
        tracker.finish();
        job.progress_tx.send_replace(tracker.progress(job.id));
        tracker.report(job.id, started.elapsed())
    };

    if let Some(error) = task_error {
        return Err(DownloadError::TaskFailed(error));
    }

    info!(
        job_id = report.job_id,
        state = %report.state,
        completed = report.completed,
        cached = report.cached_hits,
        failed = report.failed.len(),
        pending = report.pending(),
        bytes = report.bytes_downloaded,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Download job finished"
    );

    Ok(report)
}

async fn run_worker(context: Arc<WorkerContext>, job: Arc<Job>) {
    loop {
        if job.cancel.is_cancelled() {
            debug!(job_id = job.id, "Worker stopping, job cancelled");
            break;
        }

        let Some(coord) = job.tracker.lock().next() else {
            break;
        };

        match context.store.contains(&coord).await {
            Ok(true) => {
                debug!(job_id = job.id, tile = %coord, "Tile already cached");
                job.update(|t| t.record_cached(coord));
                continue;
            }
            Ok(false) => {}
            Err(e) => {
                // Fall through to a fetch; the put will surface a persistent fault
                debug!(job_id = job.id, tile = %coord, error = %e, "Cache lookup failed");
            }
        }

        match fetch_with_retry(&context, &job, coord).await {
            FetchOutcome::Fetched { bytes, attempts } => {
                let len = bytes.len() as u64;
                match context.store.put(&coord, bytes).await {
                    Ok(()) => {
                        debug!(
                            job_id = job.id,
                            tile = %coord,
                            bytes = len,
                            attempts,
                            "Tile downloaded"
                        );
                        job.update(|t| t.record_downloaded(coord, len));
                    }
                    Err(e) => {
                        warn!(job_id = job.id, tile = %coord, error = %e, "Failed to store tile");
                        job.update(|t| t.record_failed(coord, attempts, e.to_string()));
                    }
                }
            }
            FetchOutcome::Failed { error, attempts } => {
                warn!(
                    job_id = job.id,
                    tile = %coord,
                    attempts,
                    error = %error,
                    "Tile download failed"
                );
                job.update(|t| t.record_failed(coord, attempts, error.to_string()));
            }
            FetchOutcome::Cancelled => {
                debug!(job_id = job.id, tile = %coord, "Tile left pending by cancellation");
                break;
            }
        }
    }
}

/// Fetch one tile, retrying retryable errors with exponential backoff.
///
/// A fetch already in flight is never aborted by cancellation; only the
/// backoff wait between attempts is.
async fn fetch_with_retry(context: &WorkerContext, job: &Job, coord: TileCoord) -> FetchOutcome {
    let policy = context.retry;
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        let result =
            match tokio::time::timeout(policy.attempt_timeout, context.source.fetch_tile(coord))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(format!(
                    "no response within {}ms",
                    policy.attempt_timeout.as_millis()
                ))),
            };

        let error = match result {
            Ok(bytes) => {
                return FetchOutcome::Fetched {
                    bytes,
                    attempts: attempt,
                }
            }
            Err(error) => error,
        };

        if !error.is_retryable() || attempt >= policy.max_attempts() {
            return FetchOutcome::Failed {
                error,
                attempts: attempt,
            };
        }

        let backoff = policy.backoff(attempt - 1);
        debug!(
            job_id = job.id,
            tile = %coord,
            attempt,
            backoff_ms = backoff.as_millis() as u64,
            error = %error,
            "Retrying tile fetch"
        );

        tokio::select! {
            biased;
            _ = job.cancel.cancelled() => return FetchOutcome::Cancelled,
            _ = tokio::time::sleep(backoff) => {}
        }
    }
}

/// Handle to a running download job.
///
/// Dropping the handle does not stop the job.
pub struct DownloadHandle {
    id: u64,
    progress_rx: watch::Receiver<DownloadProgress>,
    cancel: CancellationToken,
    task: JoinHandle<Result<JobReport, DownloadError>>,
}

impl DownloadHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Latest progress snapshot.
    pub fn progress(&self) -> DownloadProgress {
        *self.progress_rx.borrow()
    }

    /// Receiver notified after every tile outcome and at the end of the job.
    pub fn subscribe(&self) -> watch::Receiver<DownloadProgress> {
        self.progress_rx.clone()
    }

    /// Request cooperative cancellation.
    ///
    /// Workers stop claiming new tiles; fetches already in flight complete
    /// or time out normally.
    pub fn cancel(&self) {
        info!(job_id = self.id, "Download cancellation requested");
        self.cancel.cancel();
    }

    /// A token that cancels this job when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the job to reach a terminal state.
    pub async fn wait(self) -> Result<JobReport, DownloadError> {
        self.task
            .await
            .map_err(|e| DownloadError::TaskFailed(e.to_string()))?
    }
}

impl std::fmt::Debug for DownloadHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadHandle")
            .field("id", &self.id)
            .field("progress", &self.progress())
            .finish()
    }
}
