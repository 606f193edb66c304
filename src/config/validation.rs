//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and the
//! relationships between limits. All errors are collected, not just the first.

use thiserror::Error;

use crate::admission::{BURST_WINDOW, MAX_DURATION};
use crate::config::schema::GateConfig;

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("admission.rate must be a positive finite number, got {0}")]
    InvalidRate(f64),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} must be at most {max} seconds")]
    TooLarge { field: &'static str, max: u64 },

    #[error("geo.trusted_countries entry {0:?} is not a two-letter ISO code")]
    InvalidCountryCode(String),

    #[error(
        "sweeper.idle_evict_secs ({idle}) must cover the burst window and the bucket refill time ({min}s)"
    )]
    IdleEvictTooShort { idle: u64, min: u64 },

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },
}

/// Check a configuration, returning every problem found.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let admission = &config.admission;

    if !(admission.rate.is_finite() && admission.rate > 0.0) {
        errors.push(ValidationError::InvalidRate(admission.rate));
    }

    let non_zero = [
        ("admission.burst_capacity", u64::from(admission.burst_capacity)),
        ("admission.connection_limit", u64::from(admission.connection_limit)),
        ("admission.block_secs", admission.block_secs),
        ("geo.country_rate_limit", u64::from(config.geo.country_rate_limit)),
        ("geo.country_block_secs", config.geo.country_block_secs),
        ("sweeper.interval_secs", config.sweeper.interval_secs),
    ];
    for (field, value) in non_zero {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    let durations = [
        ("admission.block_secs", admission.block_secs),
        ("geo.country_block_secs", config.geo.country_block_secs),
        ("sweeper.interval_secs", config.sweeper.interval_secs),
        ("sweeper.idle_evict_secs", config.sweeper.idle_evict_secs),
    ];
    let max = MAX_DURATION.as_secs();
    for (field, value) in durations {
        if value > max {
            errors.push(ValidationError::TooLarge { field, max });
        }
    }

    for code in &config.geo.trusted_countries {
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            errors.push(ValidationError::InvalidCountryCode(code.clone()));
        }
    }

    // Evicting earlier than this would forget a partially drained bucket or
    // history still inside the burst window.
    if admission.rate > 0.0 && admission.rate.is_finite() {
        let refill_secs = (f64::from(admission.burst_capacity) / admission.rate).ceil() as u64;
        let min = refill_secs.max(BURST_WINDOW.as_secs());
        if config.sweeper.idle_evict_secs < min {
            errors.push(ValidationError::IdleEvictTooShort {
                idle: config.sweeper.idle_evict_secs,
                min,
            });
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }
    if config.admin.enabled && config.admin.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "admin.bind_address",
            value: config.admin.bind_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
