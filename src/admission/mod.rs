//! Admission control subsystem.
//!
//! # Data Flow
//! ```text
//! decide(ip):
//!     → blacklist check (skipped for whitelisted IPs)
//!     → geo pass (country window, country blocks)
//!     → per-IP lock: history + token_bucket.rs
//!         → on denial, burst check may blacklist the IP
//!
//! on_connection_open / on_connection_close:
//!     → per-IP lock: connection counter
//!         → over the limit blacklists the IP
//!
//! sweeper.rs (every interval):
//!     → drop expired blacklist / country blocks
//!     → drop idle per-IP state
//! ```
//!
//! # Design Decisions
//! - Escalation is two-stage: the bucket says "slow down", sustained
//!   violation inside the burst window says "go away" (blacklist)
//! - Expiry is checked at decision time; the sweep only reclaims memory
//! - Whitelisting bypasses the blacklist only, not geo or rate limits

use std::time::Duration;

pub mod decision;
pub mod engine;
pub mod history;
pub mod stats;
pub mod sweeper;
pub mod token_bucket;

pub use decision::Decision;
pub use engine::{AdmissionEngine, BlockEntry, Limits, SweepReport};
pub use stats::MetricsSnapshot;
pub use sweeper::ExpirySweeper;
pub use token_bucket::TokenBucket;

/// Trailing window in which more than `burst_capacity` requests from one
/// rate-limited IP get it blacklisted.
pub const BURST_WINDOW: Duration = Duration::from_secs(10);

/// Length of a per-country traffic window.
pub const COUNTRY_WINDOW: Duration = Duration::from_secs(1);

/// Longest block, sweep interval or idle period accepted (ten years).
/// Longer TTLs passed to the engine directly are clamped to it.
pub const MAX_DURATION: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);
