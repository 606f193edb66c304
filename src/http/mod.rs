//! HTTP integration subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP dispatcher (external)
//!     → middleware.rs (decide on the peer IP)
//!         → denied: 403 / 429 with the reason as body
//!         → allowed: inner service (forwarding, out of scope here)
//! ```

pub mod middleware;

pub use middleware::admission_middleware;
