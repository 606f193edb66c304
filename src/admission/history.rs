//! Bounded per-IP request history.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// Maximum timestamps kept per IP.
pub const HISTORY_CAPACITY: usize = 1000;

/// Fixed-capacity ring of request timestamps, oldest evicted first.
#[derive(Debug, Clone)]
pub struct RequestHistory {
    entries: VecDeque<Instant>,
    capacity: usize,
}

impl RequestHistory {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    pub fn record(&mut self, at: Instant) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(at);
    }

    /// Number of recorded requests strictly younger than `window` as of `now`.
    pub fn count_within(&self, now: Instant, window: Duration) -> usize {
        self.entries
            .iter()
            .filter(|t| now.saturating_duration_since(**t) < window)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RequestHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_at_capacity() {
        let start = Instant::now();
        let mut history = RequestHistory::with_capacity(3);
        for i in 0..5 {
            history.record(start + Duration::from_secs(i));
        }
        assert_eq!(history.len(), 3);
        // Only t=2,3,4 remain.
        assert_eq!(history.count_within(start + Duration::from_secs(4), Duration::from_millis(2500)), 3);
        assert_eq!(history.count_within(start + Duration::from_secs(4), Duration::from_millis(1500)), 2);
    }

    #[test]
    fn window_is_exclusive_at_the_edge() {
        let start = Instant::now();
        let mut history = RequestHistory::new();
        history.record(start);
        history.record(start + Duration::from_secs(5));

        let now = start + Duration::from_secs(10);
        assert_eq!(history.count_within(now, Duration::from_secs(10)), 1);
    }

    #[test]
    fn default_capacity_is_bounded() {
        let now = Instant::now();
        let mut history = RequestHistory::default();
        for _ in 0..(HISTORY_CAPACITY + 10) {
            history.record(now);
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(history.count_within(now, Duration::from_secs(10)), HISTORY_CAPACITY);
    }
}
