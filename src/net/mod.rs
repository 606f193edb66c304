//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher accepts a TCP connection
//!     → connection.rs (admit_connection: count against the IP's limit)
//!     → ConnectionGuard held for the connection's lifetime
//!     → guard dropped: slot released
//! ```
//!
//! # Design Decisions
//! - The guard makes open/close pairing structural; handlers cannot leak slots
//! - Rejected connections never hold a slot

pub mod connection;

pub use connection::{ConnectionGuard, ConnectionId};
