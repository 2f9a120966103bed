//! A load generator for erasure-coded object storage.
//!
//! `junkd` keeps a pool of upload workers busy pushing slab-sized chunks of
//! random data at an indexer service, forever. Completed upload timings feed
//! a bounded [`ThroughputHistory`], which a background reporter summarizes
//! as a sustained bit rate every couple of minutes.
//!
//! Failed uploads are treated as transient: the worker backs off for a fixed
//! interval and tries again, with no retry ceiling. The only fatal condition
//! for a worker is a backend receipt that does not contain exactly one slab.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod history;
pub mod observability;
pub mod payload;
pub mod rate;
pub mod reporter;
pub mod uploader;

pub use crate::config::Config;
pub use crate::history::ThroughputHistory;
pub use crate::uploader::run;
