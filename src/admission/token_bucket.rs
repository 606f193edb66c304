//! Continuous-refill token bucket.

use tokio::time::Instant;

/// A token bucket rate limiter for a single key.
///
/// Refill is real-valued: `elapsed * rate` tokens are credited on every
/// call, capped at `capacity`. The bucket has no internal locking; callers
/// serialize access.
#[derive(Debug, Clone)]
pub struct TokenBucket {
    rate: f64,
    capacity: f64,
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a full bucket.
    pub fn new(rate: f64, capacity: f64) -> Self {
        Self::new_at(rate, capacity, Instant::now())
    }

    pub fn new_at(rate: f64, capacity: f64, now: Instant) -> Self {
        Self {
            rate,
            capacity,
            tokens: capacity,
            last_refill: now,
        }
    }

    /// Try to take `amount` tokens, refilling from the wall clock first.
    pub fn consume(&mut self, amount: f64) -> bool {
        self.consume_at(amount, Instant::now())
    }

    /// Try to take `amount` tokens as of `now`.
    ///
    /// On failure the balance is left as refilled; nothing is subtracted.
    pub fn consume_at(&mut self, amount: f64, now: Instant) -> bool {
        self.refill(now);

        if self.tokens >= amount {
            self.tokens -= amount;
            true
        } else {
            false
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_refill = now;
    }

    /// Current balance, without refilling.
    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }
}
