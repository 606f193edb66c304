//! The admission engine.
//!
//! # Responsibilities
//! - Blacklist check (whitelist-aware)
//! - Per-country one-second traffic windows and country blocks
//! - Per-IP token bucket with burst escalation to the blacklist
//! - Per-IP open connection counting
//! - Expiry and idle-state sweeping
//!
//! # Concurrency
//! Per-IP state sits behind its own `Mutex`, reached through a `DashMap`
//! whose shard lock is held only while fetching or creating the entry.
//! Country windows are updated through the `DashMap` entry API so each
//! country's read-modify-write is atomic.

use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use dashmap::{DashMap, DashSet};
use serde::Serialize;
use tokio::time::Instant;

use crate::admission::decision::Decision;
use crate::admission::history::RequestHistory;
use crate::admission::stats::{AdmissionStats, MetricsSnapshot};
use crate::admission::token_bucket::TokenBucket;
use crate::admission::{BURST_WINDOW, COUNTRY_WINDOW, MAX_DURATION};
use crate::config::{AdmissionConfig, GeoConfig};
use crate::geo::CountryResolver;
use crate::observability::metrics;

/// Limits the engine enforces, resolved from configuration.
#[derive(Debug, Clone)]
pub struct Limits {
    pub rate: f64,
    pub burst_capacity: u32,
    pub connection_limit: u32,
    pub block_ttl: Duration,
    pub trusted_countries: HashSet<String>,
    pub country_rate_limit: u32,
    pub country_block_ttl: Duration,
}

impl Limits {
    pub fn from_config(admission: &AdmissionConfig, geo: &GeoConfig) -> Self {
        Self {
            rate: admission.rate,
            burst_capacity: admission.burst_capacity,
            connection_limit: admission.connection_limit,
            block_ttl: admission.block_duration(),
            trusted_countries: geo
                .trusted_countries
                .iter()
                .map(|c| c.to_ascii_uppercase())
                .collect(),
            country_rate_limit: geo.country_rate_limit,
            country_block_ttl: geo.country_block_duration(),
        }
    }
}

/// Mutable state for one IP, guarded by that IP's lock.
#[derive(Debug)]
struct IpState {
    /// Created on the first `decide`; connection tracking alone leaves it empty.
    bucket: Option<TokenBucket>,
    history: RequestHistory,
    connections: u32,
    last_seen: Instant,
}

impl IpState {
    fn new(now: Instant) -> Self {
        Self {
            bucket: None,
            history: RequestHistory::new(),
            connections: 0,
            last_seen: now,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CountryWindow {
    count: u32,
    started: Instant,
}

/// What a sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub expired_ips: usize,
    pub expired_countries: usize,
    pub idle_ips: usize,
    pub idle_country_windows: usize,
}

impl SweepReport {
    pub fn expired(&self) -> usize {
        self.expired_ips + self.expired_countries
    }
}

/// A time-bounded block, as listed by the admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockEntry<K> {
    pub key: K,
    pub remaining_secs: u64,
}

/// Owns all per-IP and per-country admission state.
///
/// Construct one per process and share it behind an `Arc`.
pub struct AdmissionEngine {
    limits: Limits,
    geo: Arc<dyn CountryResolver>,
    ips: DashMap<IpAddr, Arc<Mutex<IpState>>>,
    blacklist: DashMap<IpAddr, Instant>,
    whitelist: DashSet<IpAddr>,
    country_traffic: DashMap<String, CountryWindow>,
    blocked_countries: DashMap<String, Instant>,
    stats: AdmissionStats,
}

impl AdmissionEngine {
    pub fn new(limits: Limits, geo: Arc<dyn CountryResolver>) -> Self {
        tracing::info!(
            rate = limits.rate,
            burst_capacity = limits.burst_capacity,
            connection_limit = limits.connection_limit,
            block_secs = limits.block_ttl.as_secs(),
            country_rate_limit = limits.country_rate_limit,
            "Admission engine initialized"
        );

        Self {
            limits,
            geo,
            ips: DashMap::new(),
            blacklist: DashMap::new(),
            whitelist: DashSet::new(),
            country_traffic: DashMap::new(),
            blocked_countries: DashMap::new(),
            stats: AdmissionStats::default(),
        }
    }

    /// Build an engine from configuration, seeding the whitelist.
    pub fn from_config(
        admission: &AdmissionConfig,
        geo_config: &GeoConfig,
        geo: Arc<dyn CountryResolver>,
    ) -> Self {
        let engine = Self::new(Limits::from_config(admission, geo_config), geo);
        for ip in &admission.whitelist {
            engine.whitelist.insert(*ip);
        }
        engine
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Decide whether a request from `ip` may proceed.
    pub fn decide(&self, ip: IpAddr) -> Decision {
        self.stats.record_total();
        let now = Instant::now();

        let decision = if self.is_blocked_at(ip, now) {
            self.stats.record_blocked();
            Decision::Blacklisted
        } else if self.geo_blocked(ip, now) {
            Decision::RegionLimited
        } else {
            self.rate_limit(ip, now)
        };

        metrics::record_decision(decision);
        tracing::debug!(ip = %ip, decision = %decision, "Admission decision");
        decision
    }

    fn rate_limit(&self, ip: IpAddr, now: Instant) -> Decision {
        let entry = self.ip_entry(ip, now);
        let mut state = lock(&entry);
        state.last_seen = now;
        state.history.record(now);

        let (rate, capacity) = (self.limits.rate, f64::from(self.limits.burst_capacity));
        let bucket = state
            .bucket
            .get_or_insert_with(|| TokenBucket::new_at(rate, capacity, now));

        if bucket.consume_at(1.0, now) {
            drop(state);
            self.stats.record_allowed();
            return Decision::Allowed;
        }

        let recent = state.history.count_within(now, BURST_WINDOW);
        if recent > self.limits.burst_capacity as usize {
            self.blacklist.insert(ip, expiry_after(now, self.limits.block_ttl));
            tracing::warn!(
                ip = %ip,
                recent_requests = recent,
                block_secs = self.limits.block_ttl.as_secs(),
                "IP blacklisted (rate limit burst)"
            );
            metrics::record_blacklist_size(self.blacklist.len());
        }
        drop(state);

        self.stats.record_blocked();
        Decision::RateLimited
    }

    /// Returns true when the country of `ip` is over its limit or blocked.
    fn geo_blocked(&self, ip: IpAddr, now: Instant) -> bool {
        let Some(country) = self.geo.country(ip) else {
            return false;
        };
        if self.limits.trusted_countries.contains(&country) {
            return false;
        }

        let blocked = self
            .blocked_countries
            .get(&country)
            .is_some_and(|expiry| *expiry > now);
        if blocked {
            self.stats.record_blocked_by_geo();
            return true;
        }

        let count = {
            let mut window = self
                .country_traffic
                .entry(country.clone())
                .or_insert(CountryWindow { count: 0, started: now });
            if now.saturating_duration_since(window.started) > COUNTRY_WINDOW {
                *window = CountryWindow { count: 1, started: now };
            } else {
                window.count += 1;
            }
            window.count
        };

        if count > self.limits.country_rate_limit {
            self.blocked_countries
                .insert(country.clone(), expiry_after(now, self.limits.country_block_ttl));
            tracing::warn!(
                country = %country,
                requests = count,
                block_secs = self.limits.country_block_ttl.as_secs(),
                "Country traffic limit exceeded, country blocked"
            );
            metrics::record_country_blocks(self.blocked_countries.len());
            self.stats.record_blocked_by_geo();
            return true;
        }

        false
    }

    /// Count a newly opened connection from `ip`.
    ///
    /// Returns false, and blacklists the IP, when this connection takes it
    /// over the connection limit. The counter is still incremented in that
    /// case; callers pair every open with a close.
    pub fn on_connection_open(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let entry = self.ip_entry(ip, now);
        let mut state = lock(&entry);
        state.last_seen = now;
        state.connections += 1;

        if state.connections > self.limits.connection_limit {
            self.blacklist.insert(ip, expiry_after(now, self.limits.block_ttl));
            tracing::warn!(
                ip = %ip,
                connections = state.connections,
                "IP blacklisted (connection limit)"
            );
            drop(state);

            metrics::record_blacklist_size(self.blacklist.len());
            metrics::record_connection_rejected();
            self.stats.record_blocked();
            return false;
        }

        true
    }

    /// Count a closed connection from `ip`. Never goes below zero.
    pub fn on_connection_close(&self, ip: IpAddr) {
        // Clone out of the map so the shard lock is not held while waiting
        // on the per-IP lock.
        let Some(entry) = self.ips.get(&ip).map(|e| Arc::clone(e.value())) else {
            return;
        };
        let mut state = lock(&entry);
        state.connections = state.connections.saturating_sub(1);
        state.last_seen = Instant::now();
    }

    /// Open connections currently counted for `ip`.
    pub fn connections(&self, ip: IpAddr) -> u32 {
        match self.ips.get(&ip).map(|e| Arc::clone(e.value())) {
            Some(entry) => {
                let state = lock(&entry);
                state.connections
            }
            None => 0,
        }
    }

    /// Number of IPs with live per-IP state.
    pub fn tracked_ips(&self) -> usize {
        self.ips.len()
    }

    /// Whether `ip` is currently denied by the blacklist check.
    pub fn is_blocked(&self, ip: IpAddr) -> bool {
        self.is_blocked_at(ip, Instant::now())
    }

    fn is_blocked_at(&self, ip: IpAddr, now: Instant) -> bool {
        if self.whitelist.contains(&ip) {
            return false;
        }
        self.blacklist.get(&ip).is_some_and(|expiry| *expiry > now)
    }

    /// Blacklist `ip` for `ttl`, replacing any existing entry.
    pub fn blacklist(&self, ip: IpAddr, ttl: Duration) {
        self.blacklist.insert(ip, expiry_after(Instant::now(), ttl));
        tracing::info!(ip = %ip, ttl_secs = ttl.as_secs(), "IP blacklisted manually");
        metrics::record_blacklist_size(self.blacklist.len());
    }

    /// Remove `ip` from the blacklist. Returns whether it was listed.
    pub fn unblock(&self, ip: IpAddr) -> bool {
        let removed = self.blacklist.remove(&ip).is_some();
        if removed {
            tracing::info!(ip = %ip, "IP removed from blacklist");
            metrics::record_blacklist_size(self.blacklist.len());
        }
        removed
    }

    pub fn whitelist(&self, ip: IpAddr) -> bool {
        self.whitelist.insert(ip)
    }

    pub fn remove_whitelist(&self, ip: IpAddr) -> bool {
        self.whitelist.remove(&ip).is_some()
    }

    pub fn is_whitelisted(&self, ip: IpAddr) -> bool {
        self.whitelist.contains(&ip)
    }

    /// Unexpired blacklist entries.
    pub fn blacklisted(&self) -> Vec<BlockEntry<IpAddr>> {
        let now = Instant::now();
        self.blacklist
            .iter()
            .filter(|e| *e.value() > now)
            .map(|e| BlockEntry {
                key: *e.key(),
                remaining_secs: e.value().saturating_duration_since(now).as_secs(),
            })
            .collect()
    }

    /// Unexpired country blocks.
    pub fn blocked_countries(&self) -> Vec<BlockEntry<String>> {
        let now = Instant::now();
        self.blocked_countries
            .iter()
            .filter(|e| *e.value() > now)
            .map(|e| BlockEntry {
                key: e.key().clone(),
                remaining_secs: e.value().saturating_duration_since(now).as_secs(),
            })
            .collect()
    }

    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.stats.snapshot(self.blacklist.len())
    }

    /// Remove expired blocks, and per-IP state idle for at least `idle_after`.
    ///
    /// Only expired or idle entries are ever removed, so running this
    /// concurrently with decisions cannot change any verdict.
    pub fn sweep(&self, idle_after: Duration) -> SweepReport {
        let now = Instant::now();
        let mut report = SweepReport::default();

        self.blacklist.retain(|_, expiry| {
            let keep = *expiry > now;
            if !keep {
                report.expired_ips += 1;
            }
            keep
        });

        self.blocked_countries.retain(|_, expiry| {
            let keep = *expiry > now;
            if !keep {
                report.expired_countries += 1;
            }
            keep
        });

        // retain holds the shard write lock, so no caller can clone an entry
        // out while its reference count is checked.
        self.ips.retain(|_, entry| {
            if Arc::strong_count(entry) > 1 {
                return true;
            }
            let Ok(state) = entry.try_lock() else {
                return true;
            };
            let idle = state.connections == 0
                && now.saturating_duration_since(state.last_seen) >= idle_after;
            if idle {
                report.idle_ips += 1;
            }
            !idle
        });

        self.country_traffic.retain(|_, window| {
            let idle = now.saturating_duration_since(window.started) >= idle_after;
            if idle {
                report.idle_country_windows += 1;
            }
            !idle
        });

        metrics::record_blacklist_size(self.blacklist.len());
        metrics::record_country_blocks(self.blocked_countries.len());
        report
    }

    fn ip_entry(&self, ip: IpAddr, now: Instant) -> Arc<Mutex<IpState>> {
        if let Some(entry) = self.ips.get(&ip) {
            return Arc::clone(entry.value());
        }
        Arc::clone(
            self.ips
                .entry(ip)
                .or_insert_with(|| Arc::new(Mutex::new(IpState::new(now))))
                .value(),
        )
    }
}

/// `now + ttl`, with `ttl` clamped to `MAX_DURATION`. Never panics.
fn expiry_after(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl.min(MAX_DURATION)).unwrap_or(now)
}

/// Lock per-IP state, recovering the guard if a holder panicked.
fn lock(entry: &Mutex<IpState>) -> MutexGuard<'_, IpState> {
    entry.lock().unwrap_or_else(PoisonError::into_inner)
}
