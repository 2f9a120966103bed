//! Periodic reporting of the average upload speed.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::history::ThroughputHistory;
use crate::rate::format_bps;

/// Stand-in mean when no uploads have completed yet.
///
/// Keeps the rate computation well-defined before the first sample arrives;
/// the resulting (implausibly slow) rate is reported as-is.
const EMPTY_HISTORY_MEAN: Duration = Duration::from_secs(1);

/// Computes the arithmetic mean of `samples`, or the one-second stand-in for
/// an empty slice.
pub fn average_upload_time(samples: &[Duration]) -> Duration {
    if samples.is_empty() {
        return EMPTY_HISTORY_MEAN;
    }
    samples.iter().sum::<Duration>() / samples.len() as u32
}

/// Reports the mean upload time as a sustained bit rate on every tick.
///
/// The rate is computed over `redundant_slab_size`, the bytes actually
/// transmitted per slab including parity. Returns once `token` is cancelled.
pub async fn run(
    history: Arc<ThroughputHistory>,
    redundant_slab_size: u64,
    interval: Duration,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately; skip it so reports start one
    // full interval in.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = ticker.tick() => {
                let samples = history.snapshot();
                let average = average_upload_time(&samples);
                tracing::info!(
                    samples = samples.len(),
                    average_upload_time = ?average,
                    speed = %format_bps(redundant_slab_size, average),
                    "average upload speed"
                );
            }
        }
    }
}
