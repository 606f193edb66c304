//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the admission gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Per-IP rate, burst and connection limits.
    pub admission: AdmissionConfig,

    /// Country-level traffic shaping.
    pub geo: GeoConfig,

    /// Background expiry sweep.
    pub sweeper: SweeperConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// Per-IP admission limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Tokens added to each IP's bucket per second.
    pub rate: f64,

    /// Bucket capacity. Also the number of requests within the burst
    /// window above which a rate-limited IP gets blacklisted.
    pub burst_capacity: u32,

    /// Maximum concurrently open connections per IP.
    pub connection_limit: u32,

    /// Blacklist TTL in seconds.
    pub block_secs: u64,

    /// IPs that are never denied by the blacklist check.
    pub whitelist: Vec<IpAddr>,
}

impl AdmissionConfig {
    pub fn block_duration(&self) -> Duration {
        Duration::from_secs(self.block_secs)
    }
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            rate: 15.0,
            burst_capacity: 40,
            connection_limit: 100,
            block_secs: 300,
            whitelist: Vec::new(),
        }
    }
}

/// Country-level traffic shaping.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeoConfig {
    /// Path to a MaxMind country database. Defaults to
    /// `GeoLite2-Country.mmdb` next to the executable.
    pub database_path: Option<PathBuf>,

    /// ISO country codes exempt from geo-blocking.
    pub trusted_countries: Vec<String>,

    /// Maximum requests per country per one-second window.
    pub country_rate_limit: u32,

    /// Country block TTL in seconds.
    pub country_block_secs: u64,
}

impl GeoConfig {
    pub fn country_block_duration(&self) -> Duration {
        Duration::from_secs(self.country_block_secs)
    }
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            trusted_countries: vec!["TR".to_string()],
            country_rate_limit: 100,
            country_block_secs: 900,
        }
    }
}

/// Expiry sweep configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SweeperConfig {
    /// Seconds between sweeps.
    pub interval_secs: u64,

    /// Per-IP state idle longer than this is evicted by the sweep.
    pub idle_evict_secs: u64,
}

impl SweeperConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn idle_evict(&self) -> Duration {
        Duration::from_secs(self.idle_evict_secs)
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            idle_evict_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Prometheus endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
