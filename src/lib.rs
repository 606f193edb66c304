//! Admission control engine: per-IP rate limiting, burst blacklisting,
//! connection limits and country-level traffic shaping.

pub mod admin;
pub mod admission;
pub mod config;
pub mod geo;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use admission::{AdmissionEngine, Decision, MetricsSnapshot};
pub use config::GateConfig;
pub use lifecycle::Shutdown;
