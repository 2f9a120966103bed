//! Random slab contents for upload attempts.

use std::pin::Pin;
use std::{io, task};

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use tokio::io::{AsyncRead, ReadBuf};

/// A fixed amount of pseudo-random bytes, produced on demand.
///
/// The contents only need to defeat deduplication and compression on the
/// backend, so a freshly seeded [`SmallRng`] is enough.
#[derive(Debug)]
pub struct Payload {
    remaining: u64,
    rng: SmallRng,
}

impl Payload {
    /// Creates a payload yielding exactly `len` random bytes.
    pub fn new(len: u64) -> Self {
        Self {
            remaining: len,
            rng: SmallRng::seed_from_u64(rand::random()),
        }
    }
}

impl AsyncRead for Payload {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut task::Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> task::Poll<io::Result<()>> {
        let len_to_fill = (buf.remaining() as u64).min(self.remaining) as usize;

        let fill_buf = buf.initialize_unfilled_to(len_to_fill);
        self.rng.fill_bytes(fill_buf);

        self.remaining -= len_to_fill as u64;
        buf.advance(len_to_fill);

        task::Poll::Ready(Ok(()))
    }
}
