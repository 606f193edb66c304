//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GateConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<GateConfig, ConfigError> {
    let mut config: GateConfig = toml::from_str(content)?;
    for code in &mut config.geo.trusted_countries {
        code.make_ascii_uppercase();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GateConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_country_codes() {
        let config = parse_config("[geo]\ntrusted_countries = [\"tr\", \"De\"]\n").unwrap();
        assert_eq!(config.geo.trusted_countries, vec!["TR".to_string(), "DE".to_string()]);
    }

    #[test]
    fn reports_validation_failures() {
        let err = parse_config("[admission]\nconnection_limit = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("admission.connection_limit"));
    }

    #[test]
    fn rejects_block_ttl_beyond_the_clock() {
        let err = parse_config("[admission]\nblock_secs = 9223372036854775807\n").unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert!(matches!(
                errors.as_slice(),
                [ValidationError::TooLarge { field: "admission.block_secs", .. }]
            )),
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn reports_parse_failures() {
        let err = parse_config("[admission\nrate = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/admission-gate.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
