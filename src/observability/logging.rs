//! Structured logging.
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to this
//! crate and `warn` to everything else.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber. Call once, at startup.
pub fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn default_filter(log_level: &str) -> EnvFilter {
    EnvFilter::new(format!("warn,admission_gate={log_level},gate_cli={log_level}"))
}
