//! Country resolution seam.

use std::collections::HashMap;
use std::net::IpAddr;

/// Maps an address to its ISO country code.
///
/// Implementations never fail: an address that cannot be resolved, for any
/// reason, yields `None` and is treated as an unknown country.
pub trait CountryResolver: Send + Sync {
    fn country(&self, ip: IpAddr) -> Option<String>;
}

/// Fixed address-to-country table.
///
/// Useful for embedding the engine where addresses are already classified
/// upstream, and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    table: HashMap<IpAddr, String>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `country` to `ip`, replacing any previous assignment.
    pub fn with(mut self, ip: IpAddr, country: &str) -> Self {
        self.insert(ip, country);
        self
    }

    pub fn insert(&mut self, ip: IpAddr, country: &str) {
        self.table.insert(ip, country.to_ascii_uppercase());
    }
}

impl CountryResolver for StaticResolver {
    fn country(&self, ip: IpAddr) -> Option<String> {
        self.table.get(&ip).cloned()
    }
}
