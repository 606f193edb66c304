//! Per-connection admission tracking.
//!
//! # Responsibilities
//! - Count a connection against its IP's limit when it opens
//! - Release the slot when the connection's handler drops the guard
//! - Generate unique connection IDs for tracing

use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::admission::AdmissionEngine;

/// Relaxed ordering is sufficient: only uniqueness matters.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

impl AdmissionEngine {
    /// Admit a new connection from `ip`.
    ///
    /// Returns a guard holding the connection's slot, or `None` when the IP
    /// is over its connection limit (it is blacklisted in that case). A
    /// rejected connection's slot is released immediately.
    pub fn admit_connection(self: &Arc<Self>, ip: IpAddr) -> Option<ConnectionGuard> {
        if !self.on_connection_open(ip) {
            self.on_connection_close(ip);
            return None;
        }

        let guard = ConnectionGuard {
            engine: Arc::clone(self),
            ip,
            id: ConnectionId::new(),
        };
        tracing::trace!(connection_id = %guard.id, ip = %ip, "Connection admitted");
        Some(guard)
    }
}

/// Holds one connection slot for an IP. Releases it when dropped.
pub struct ConnectionGuard {
    engine: Arc<AdmissionEngine>,
    ip: IpAddr,
    id: ConnectionId,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }
}

impl std::fmt::Debug for ConnectionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionGuard")
            .field("ip", &self.ip)
            .field("id", &self.id)
            .finish()
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.engine.on_connection_close(self.ip);
        tracing::trace!(connection_id = %self.id, ip = %self.ip, "Connection closed");
    }
}
