//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Engine, sweeper and admin API produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and gauges via the metrics facade)
//!
//! Consumers:
//!     → stdout
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Escalations (blacklisting, country blocks) log at warn
//! - Metrics are cheap when no exporter is installed

pub mod logging;
pub mod metrics;
