//! The indexer storage client.
//!
//! The [`Client`] uploads erasure-coded slabs to a remote indexer service.
//! It signs every request with a JWT derived from the configured app secret,
//! and hands back a typed receipt describing the slabs the backend produced.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod client;
mod error;
mod key;

pub use client::*;
pub use error::*;
pub use key::*;

#[cfg(test)]
mod tests;
