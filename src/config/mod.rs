//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GateConfig (validated, immutable)
//!     → handed to the engine, sweeper and admin API at startup
//! ```
//!
//! # Design Decisions
//! - Config is static once loaded; limits do not change at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{AdminConfig, AdmissionConfig, GateConfig, GeoConfig, ObservabilityConfig, SweeperConfig};
