//! Decision counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Monotonic decision counters.
///
/// Relaxed ordering: the counters are statistics, not synchronization, and
/// a snapshot taken under load may be slightly skewed between fields.
#[derive(Debug, Default)]
pub struct AdmissionStats {
    total: AtomicU64,
    allowed: AtomicU64,
    blocked: AtomicU64,
    blocked_by_geo: AtomicU64,
}

impl AdmissionStats {
    pub fn record_total(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_allowed(&self) {
        self.allowed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_blocked(&self) {
        self.blocked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_blocked_by_geo(&self) {
        self.blocked_by_geo.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, blacklisted: usize) -> MetricsSnapshot {
        MetricsSnapshot {
            total: self.total.load(Ordering::Relaxed),
            allowed: self.allowed.load(Ordering::Relaxed),
            blocked: self.blocked.load(Ordering::Relaxed),
            blocked_by_geo: self.blocked_by_geo.load(Ordering::Relaxed),
            blacklisted,
        }
    }
}

/// Point-in-time view of the engine counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub total: u64,
    pub allowed: u64,
    /// Blacklist, rate-limit and connection-limit denials.
    pub blocked: u64,
    pub blocked_by_geo: u64,
    /// Current blacklist size, including expired entries not yet swept.
    pub blacklisted: usize,
}
