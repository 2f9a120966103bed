//! A bounded window of recent upload timings.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// A sliding window of the most recent per-slab upload durations.
///
/// Shared by all upload workers and the reporter. One mutex serializes both
/// recording and snapshotting; the capacity bound keeps the reported average
/// representative of recent uploads rather than the whole run.
#[derive(Debug)]
pub struct ThroughputHistory {
    samples: Mutex<VecDeque<Duration>>,
    capacity: usize,
}

impl ThroughputHistory {
    /// Creates an empty history holding at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Appends one sample, evicting the oldest samples while over capacity.
    pub fn record(&self, duration: Duration) {
        let mut samples = self.samples.lock().unwrap();
        samples.push_back(duration);
        while samples.len() > self.capacity {
            samples.pop_front();
        }
    }

    /// Returns a copy of the current samples in insertion order.
    pub fn snapshot(&self) -> Vec<Duration> {
        self.samples.lock().unwrap().iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let history = ThroughputHistory::new(10);
        for secs in 1..=5 {
            history.record(Duration::from_secs(secs));
        }

        let expected: Vec<_> = (1..=5).map(Duration::from_secs).collect();
        assert_eq!(history.snapshot(), expected);
    }

    #[test]
    fn evicts_oldest_beyond_capacity() {
        let history = ThroughputHistory::new(100);
        for secs in 0..250 {
            history.record(Duration::from_secs(secs));
        }

        let snapshot = history.snapshot();
        assert_eq!(snapshot.len(), 100);

        // Only the most recent 100 samples remain, in order.
        let expected: Vec<_> = (150..250).map(Duration::from_secs).collect();
        assert_eq!(snapshot, expected);
    }

    #[test]
    fn concurrent_records_are_not_lost() {
        const WRITERS: usize = 8;
        const RECORDS: usize = 500;

        let history = Arc::new(ThroughputHistory::new(WRITERS * RECORDS));

        let handles: Vec<_> = (0..WRITERS)
            .map(|_| {
                let history = Arc::clone(&history);
                thread::spawn(move || {
                    for _ in 0..RECORDS {
                        history.record(Duration::from_millis(1));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(history.snapshot().len(), WRITERS * RECORDS);
    }

    #[test]
    fn concurrent_records_respect_capacity() {
        const WRITERS: usize = 8;
        const RECORDS: usize = 500;
        const CAPACITY: usize = 100;

        let history = Arc::new(ThroughputHistory::new(CAPACITY));

        let handles: Vec<_> = (0..WRITERS)
            .map(|_| {
                let history = Arc::clone(&history);
                thread::spawn(move || {
                    for _ in 0..RECORDS {
                        history.record(Duration::from_millis(1));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(history.snapshot().len(), CAPACITY);
    }
}
