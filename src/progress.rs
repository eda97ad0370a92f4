//! Progress event types, callback interface and the shared byte counter.
//!
//! Transfers report every chunk to a [`ProgressCounter`]. The counter is the
//! source of truth for how many bytes a measurement actually moved, and it
//! forwards each update to an optional [`ProgressCallback`].

use crate::cloudflare::tests::Direction;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Phases of a single download or upload measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestPhase {
    /// Running the adaptive sizing probe
    Probing,
    /// Running the timed attempts
    Measuring,
    /// Waiting on latency and assembling the result
    Finalizing,
    /// Result is ready
    Complete,
}

/// Progress events emitted during test execution.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Test phase has changed
    PhaseChange { direction: Direction, phase: TestPhase },
    /// More bytes have been moved
    Transferred {
        direction: Direction,
        /// Bytes moved by the current measurement so far
        total_bytes: u64,
    },
    /// A timed attempt finished
    AttemptComplete {
        direction: Direction,
        /// Current attempt number (1-indexed)
        current: usize,
        /// Configured number of attempts
        total: usize,
        elapsed: Duration,
    },
}

/// Callback interface for progress updates.
///
/// Implementations must be non-blocking to avoid affecting
/// measurement accuracy.
pub trait ProgressCallback: Send + Sync {
    /// Called when a progress event occurs.
    fn on_progress(&self, event: ProgressEvent);
}

/// Cumulative byte counter shared by every writer of one measurement.
///
/// Parallel upload workers all advance the same counter, so every update
/// goes through the mutex.
pub struct ProgressCounter {
    direction: Direction,
    bytes: Mutex<u64>,
    callback: Option<Arc<dyn ProgressCallback>>,
}

impl ProgressCounter {
    pub fn new(
        direction: Direction,
        callback: Option<Arc<dyn ProgressCallback>>,
    ) -> Self {
        Self { direction, bytes: Mutex::new(0), callback }
    }

    /// Record `bytes` more bytes and return the new total.
    pub fn advance(&self, bytes: u64) -> u64 {
        let total = {
            let mut guard =
                self.bytes.lock().unwrap_or_else(|poison| poison.into_inner());
            *guard += bytes;
            *guard
        };

        if let Some(callback) = &self.callback {
            callback.on_progress(ProgressEvent::Transferred {
                direction: self.direction,
                total_bytes: total,
            });
        }

        total
    }

    pub fn total(&self) -> u64 {
        *self.bytes.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}
