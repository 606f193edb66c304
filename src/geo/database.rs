//! MaxMind country database.
//!
//! The database is opened once at startup. A missing or unreadable file, or
//! a build without the `geoip` feature, leaves the lookup degraded: every
//! address resolves to unknown and geo-blocking is effectively off. The
//! degradation is logged once here, never per lookup.

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::geo::resolver::CountryResolver;

/// File name looked up next to the executable when no path is configured.
pub const DEFAULT_DATABASE_FILE: &str = "GeoLite2-Country.mmdb";

/// Errors that can occur while opening the database.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("GeoIP database not found: {0:?}")]
    NotFound(PathBuf),

    #[cfg(feature = "geoip")]
    #[error("failed to open GeoIP database {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: maxminddb::MaxMindDBError,
    },

    #[error("built without the `geoip` feature")]
    Unsupported,
}

/// Country lookup backed by a MaxMind database, or degraded.
pub struct GeoDatabase {
    #[cfg(feature = "geoip")]
    reader: Option<maxminddb::Reader<Vec<u8>>>,
}

impl GeoDatabase {
    /// Open the configured database, falling back to degraded mode.
    pub fn open_or_degraded(path: Option<&Path>) -> Self {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_database_path(),
        };

        match Self::open(&path) {
            Ok(db) => {
                tracing::info!(path = ?path, "GeoIP database loaded");
                db
            }
            Err(GeoError::Unsupported) => {
                tracing::warn!("GeoIP support not compiled in. Geo-blocking disabled.");
                Self::degraded()
            }
            Err(e) => {
                tracing::error!(error = %e, "GeoIP database unavailable. Geo-blocking disabled.");
                Self::degraded()
            }
        }
    }

    /// Open a database file.
    #[cfg(feature = "geoip")]
    pub fn open(path: &Path) -> Result<Self, GeoError> {
        if !path.exists() {
            return Err(GeoError::NotFound(path.to_path_buf()));
        }
        let reader = maxminddb::Reader::open_readfile(path).map_err(|source| GeoError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { reader: Some(reader) })
    }

    #[cfg(not(feature = "geoip"))]
    pub fn open(_path: &Path) -> Result<Self, GeoError> {
        Err(GeoError::Unsupported)
    }

    /// A lookup that resolves nothing.
    pub fn degraded() -> Self {
        Self {
            #[cfg(feature = "geoip")]
            reader: None,
        }
    }

    pub fn is_available(&self) -> bool {
        #[cfg(feature = "geoip")]
        {
            self.reader.is_some()
        }
        #[cfg(not(feature = "geoip"))]
        {
            false
        }
    }
}

impl CountryResolver for GeoDatabase {
    #[cfg(feature = "geoip")]
    fn country(&self, ip: IpAddr) -> Option<String> {
        #[derive(serde::Deserialize)]
        struct Record {
            country: Option<Country>,
        }

        #[derive(serde::Deserialize)]
        struct Country {
            iso_code: Option<String>,
        }

        let reader = self.reader.as_ref()?;
        match reader.lookup::<Record>(ip) {
            Ok(record) => record.country.and_then(|c| c.iso_code),
            // Private and local ranges have no entry.
            Err(maxminddb::MaxMindDBError::AddressNotFoundError(_)) => None,
            Err(e) => {
                tracing::error!(ip = %ip, error = %e, "GeoIP lookup failed");
                None
            }
        }
    }

    #[cfg(not(feature = "geoip"))]
    fn country(&self, _ip: IpAddr) -> Option<String> {
        None
    }
}

/// `GeoLite2-Country.mmdb` in the directory of the running executable.
pub fn default_database_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_DATABASE_FILE)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_resolves_nothing() {
        let db = GeoDatabase::degraded();
        assert!(!db.is_available());
        assert_eq!(db.country("8.8.8.8".parse().unwrap()), None);
    }

    #[test]
    fn missing_file_degrades() {
        let db = GeoDatabase::open_or_degraded(Some(Path::new("/nonexistent/GeoLite2-Country.mmdb")));
        assert!(!db.is_available());
        assert_eq!(db.country("1.1.1.1".parse().unwrap()), None);
    }

    #[cfg(feature = "geoip")]
    #[test]
    fn open_reports_missing_file() {
        let err = GeoDatabase::open(Path::new("/nonexistent/db.mmdb")).err().unwrap();
        assert!(matches!(err, GeoError::NotFound(_)));
    }

    #[test]
    fn default_path_names_the_country_database() {
        assert!(default_database_path().ends_with(DEFAULT_DATABASE_FILE));
    }
}
