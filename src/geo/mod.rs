//! Country lookup subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     geo.database_path (or GeoLite2-Country.mmdb next to the binary)
//!     → database.rs (open once, or degrade)
//!
//! Per request:
//!     AdmissionEngine geo pass
//!     → resolver.rs (CountryResolver::country)
//!     → ISO code, or None for unknown
//! ```
//!
//! # Design Decisions
//! - Lookups never fail; faults resolve to unknown
//! - Unknown countries are never geo-blocked

pub mod database;
pub mod resolver;

pub use database::{GeoDatabase, GeoError};
pub use resolver::{CountryResolver, StaticResolver};
