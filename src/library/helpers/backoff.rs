//! Backoff iterators used for retries and crash loops

use std::{iter::Iterator, time::Duration};

/// Backoff iterator
///
/// This struct implements the iterator trait and returns monotonically non-decreasing values until a specified limit of iterations, specified by the `limit` field, is reached.
/// Each element in the Iterator is the previous element multiplied by the `multiplier` property.
#[derive(Debug, Clone)]
pub struct Backoff {
    retries: u32,
    limit: u32,
    multiplier: u32,
    current: Duration,
}

impl Backoff {
    /// Creates an iterator which yields the same interval `limit` times
    pub fn fixed(interval: Duration, limit: u32) -> Self {
        Self {
            retries: 0,
            limit,
            multiplier: 1,
            current: interval,
        }
    }
}

impl Default for Backoff {
    /// Exponential backoff starting at 50ms, doubling thirteen times
    fn default() -> Self {
        Self {
            retries: 0,
            limit: 13,
            multiplier: 2,
            current: Duration::from_millis(25),
        }
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Self::Item> {
        self.retries += 1;

        if self.retries > self.limit {
            None
        } else {
            self.current *= self.multiplier;
            Some(self.current)
        }
    }
}
