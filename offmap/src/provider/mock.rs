//! Scriptable in-process tile source for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::cache::BoxFuture;
use crate::coord::TileCoord;
use crate::provider::{ProviderError, TileSource};

/// Tile source returning a fixed payload, optionally failing first.
pub struct MockTileSource {
    payload: Vec<u8>,
    error: Option<ProviderError>,
    /// Attempts per tile that fail with `error` before succeeding.
    /// `None` fails every attempt.
    failures_per_tile: Option<u32>,
    delay: Duration,
    fetches: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    attempts: Mutex<HashMap<TileCoord, u32>>,
}

impl MockTileSource {
    /// Always succeeds with `payload`.
    pub fn ok(payload: Vec<u8>) -> Self {
        Self {
            payload,
            error: None,
            failures_per_tile: Some(0),
            delay: Duration::ZERO,
            fetches: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            attempts: Mutex::new(HashMap::new()),
        }
    }

    /// Always fails with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self {
            error: Some(error),
            failures_per_tile: None,
            ..Self::ok(Vec::new())
        }
    }

    /// Fails the first `failures` attempts for every tile, then succeeds.
    pub fn flaky(payload: Vec<u8>, failures: u32, error: ProviderError) -> Self {
        Self {
            error: Some(error),
            failures_per_tile: Some(failures),
            ..Self::ok(payload)
        }
    }

    /// Sleep this long inside every fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Total number of fetch attempts.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Highest number of fetches observed running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Fetch attempts made for one tile.
    pub fn attempts_for(&self, coord: &TileCoord) -> u32 {
        self.attempts.lock().get(coord).copied().unwrap_or(0)
    }
}

impl TileSource for MockTileSource {
    fn fetch_tile(&self, coord: TileCoord) -> BoxFuture<'_, Result<Vec<u8>, ProviderError>> {
        Box::pin(async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            let attempt = {
                let mut attempts = self.attempts.lock();
                let count = attempts.entry(coord).or_insert(0);
                *count += 1;
                *count
            };

            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match (&self.error, self.failures_per_tile) {
                (Some(error), None) => Err(error.clone()),
                (Some(error), Some(failures)) if attempt <= failures => Err(error.clone()),
                _ => Ok(self.payload.clone()),
            }
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
