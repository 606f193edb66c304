//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Geo database → Engine → Exporter/Admin API → Sweeper
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → sweeper and admin API exit → final counters logged
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
