//! Timing samples and the math that turns them into speed and jitter.

use crate::stats::mean_f64;
use std::time::Duration;

/// One timed transfer attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransferSample {
    /// Wall-clock duration of the attempt
    pub elapsed: Duration,
    /// Bytes actually moved during the attempt
    pub bytes: u64,
}

impl TransferSample {
    pub const fn new(elapsed: Duration, bytes: u64) -> Self {
        Self { elapsed, bytes }
    }
}

/// Mean absolute difference between successive attempt durations, in
/// seconds.
///
/// With a single sample the sample's own duration is returned. That is
/// not a real jitter figure, but it is what earlier releases reported and
/// downstream consumers expect a number for single-attempt runs.
pub fn jitter_seconds(samples: &[TransferSample]) -> Option<f64> {
    match samples {
        [] => None,
        [only] => Some(only.elapsed.as_secs_f64()),
        _ => {
            let jitters: Vec<f64> = samples
                .windows(2)
                .map(|pair| pair[1].elapsed.abs_diff(pair[0].elapsed))
                .map(|duration| duration.as_secs_f64())
                .collect();

            mean_f64(&jitters)
        }
    }
}

/// Throughput over the whole measured window, in Mbps.
///
/// Returns `None` when nothing was measured.
pub fn throughput_mbps(bytes: u64, samples: &[TransferSample]) -> Option<f64> {
    let elapsed: Duration = samples.iter().map(|s| s.elapsed).sum();

    if samples.is_empty() || elapsed.is_zero() {
        return None;
    }

    Some(calculate_speed_mbps(bytes, elapsed))
}

/// Convert a byte count moved in `elapsed` into megabits per second.
pub fn calculate_speed_mbps(bytes: u64, elapsed: Duration) -> f64 {
    (bytes as f64 * 8.0) / (elapsed.as_secs_f64() * 1_000_000.0)
}

pub fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
