//! Configuration for the junkd load generator.
//!
//! Loaded from a YAML file selected with `-c`/`--config`. All fields except
//! `app_secret` have defaults:
//!
//! ```yaml
//! indexer_url: http://localhost:9982
//! app_secret: my-secret
//! threads: 4
//! data_shards: 2
//! parity_shards: 4
//! backoff: 5m
//! report_interval: 2m
//! history_capacity: 1000
//! ```

use std::time::Duration;

use anyhow::bail;
use junkd_client::Redundancy;
use serde::Deserialize;

/// Size of one backend sector in bytes.
pub const SECTOR_SIZE: u64 = 1 << 22;

/// Runtime configuration of the load generator.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Base URL of the indexer API.
    #[serde(default = "default_indexer_url")]
    pub indexer_url: String,

    /// Secret used to derive the application key. Required.
    pub app_secret: String,

    /// Number of parallel upload workers.
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Data shards per slab.
    #[serde(default = "default_data_shards")]
    pub data_shards: usize,

    /// Parity shards per slab.
    #[serde(default = "default_parity_shards")]
    pub parity_shards: usize,

    /// How long a worker waits after a failed upload before retrying.
    #[serde(default = "default_backoff", with = "humantime_serde")]
    pub backoff: Duration,

    /// How often the average upload speed is reported.
    #[serde(default = "default_report_interval", with = "humantime_serde")]
    pub report_interval: Duration,

    /// Maximum number of upload durations kept for rate estimation.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_indexer_url() -> String {
    "http://localhost:9982".into()
}

fn default_threads() -> usize {
    1
}

fn default_data_shards() -> usize {
    2
}

fn default_parity_shards() -> usize {
    4
}

fn default_backoff() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_report_interval() -> Duration {
    Duration::from_secs(2 * 60)
}

fn default_history_capacity() -> usize {
    1000
}

impl Config {
    /// Checks that all counts are positive.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.threads == 0 {
            bail!("threads must be positive");
        }
        if self.data_shards == 0 || self.parity_shards == 0 {
            bail!("data_shards and parity_shards must be positive");
        }
        if self.history_capacity == 0 {
            bail!("history_capacity must be positive");
        }
        Ok(())
    }

    /// Logical size of one uploaded slab, in bytes.
    pub fn slab_size(&self) -> u64 {
        self.data_shards as u64 * SECTOR_SIZE
    }

    /// Bytes actually transmitted per slab, including parity.
    pub fn redundant_slab_size(&self) -> u64 {
        (self.data_shards + self.parity_shards) as u64 * SECTOR_SIZE
    }

    /// The redundancy parameters passed to the client on every upload.
    pub fn redundancy(&self) -> Redundancy {
        Redundancy {
            data_shards: self.data_shards,
            parity_shards: self.parity_shards,
        }
    }
}
