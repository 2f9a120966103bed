//! The upload worker pool.
//!
//! Each worker uploads slab-sized random payloads in a loop until the
//! cancellation token fires. Failures back off for a fixed interval and the
//! worker tries again indefinitely; a receipt with anything other than
//! exactly one slab stops that worker for good.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use futures::StreamExt;
use junkd_client::{Client, ClientError, Redundancy, UploadReceipt};
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::history::ThroughputHistory;
use crate::payload::Payload;
use crate::rate::format_bps;
use crate::reporter;

/// The submission seam between workers and the storage client.
#[async_trait]
pub trait SlabUploader {
    /// Uploads one payload as a single slab with the given redundancy.
    async fn upload_slab(
        &self,
        payload: Payload,
        redundancy: Redundancy,
    ) -> Result<UploadReceipt, ClientError>;
}

#[async_trait]
impl SlabUploader for Client {
    async fn upload_slab(
        &self,
        payload: Payload,
        redundancy: Redundancy,
    ) -> Result<UploadReceipt, ClientError> {
        let stream = ReaderStream::new(payload).boxed();
        self.upload(stream, redundancy).await
    }
}

/// Per-worker settings, shared by the whole pool.
#[derive(Clone, Copy, Debug)]
struct WorkerOptions {
    slab_size: u64,
    redundant_slab_size: u64,
    redundancy: Redundancy,
    backoff: std::time::Duration,
}

impl WorkerOptions {
    fn from_config(config: &Config) -> Self {
        Self {
            slab_size: config.slab_size(),
            redundant_slab_size: config.redundant_slab_size(),
            redundancy: config.redundancy(),
            backoff: config.backoff,
        }
    }
}

/// Runs the configured number of upload workers plus the speed reporter, and
/// waits for every worker to stop.
///
/// The reporter is not waited on; it exits on its own once `token` fires.
/// Returns an error if any worker task panicked.
pub async fn run<C>(client: Arc<C>, config: &Config, token: CancellationToken) -> anyhow::Result<()>
where
    C: SlabUploader + Send + Sync + 'static,
{
    let history = Arc::new(ThroughputHistory::new(config.history_capacity));
    let opts = WorkerOptions::from_config(config);

    let workers: Vec<_> = (1..=config.threads)
        .map(|n| {
            let client = Arc::clone(&client);
            let history = Arc::clone(&history);
            let token = token.clone();
            tokio::spawn(async move { run_worker(n, &*client, &history, token, opts).await })
        })
        .collect();

    tokio::spawn(reporter::run(
        Arc::clone(&history),
        opts.redundant_slab_size,
        config.report_interval,
        token.clone(),
    ));

    for worker in futures::future::join_all(workers).await {
        worker?;
    }
    Ok(())
}

async fn run_worker<C: SlabUploader>(
    n: usize,
    client: &C,
    history: &ThroughputHistory,
    token: CancellationToken,
    opts: WorkerOptions,
) {
    tracing::debug!(worker = n, "starting upload worker");

    loop {
        if token.is_cancelled() {
            return;
        }

        let payload = Payload::new(opts.slab_size);
        let start = Instant::now();
        let result = tokio::select! {
            _ = token.cancelled() => return,
            result = client.upload_slab(payload, opts.redundancy) => result,
        };

        match result {
            Ok(receipt) => {
                if receipt.slabs.len() != 1 {
                    tracing::error!(
                        worker = n,
                        slabs = receipt.slabs.len(),
                        "expected 1 slab in upload receipt, stopping worker"
                    );
                    return;
                }

                let elapsed = start.elapsed();
                history.record(elapsed);
                tracing::info!(
                    worker = n,
                    key = %receipt.key,
                    slab_id = %receipt.slabs[0].id,
                    duration = ?elapsed,
                    speed = %format_bps(opts.redundant_slab_size, elapsed),
                    "upload completed"
                );
            }
            Err(err) => {
                tracing::error!(
                    worker = n,
                    error = %err,
                    duration = ?start.elapsed(),
                    "failed to upload slab, backing off for {:?}", opts.backoff,
                );
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(opts.backoff) => {}
                }
            }
        }
    }
}
