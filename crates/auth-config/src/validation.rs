//! Configuration validation utilities

use crate::config::AppConfig;
use secrecy::ExposeSecret;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationErrors),

    #[error("Token validation failed: {message}")]
    TokenValidationFailed { message: String },

    #[error("Database validation failed: {message}")]
    DatabaseValidationFailed { message: String },
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate_config(config: &AppConfig) -> Result<(), ConfigValidationError> {
        config.validate()?;
        Self::validate_token_config(config)?;
        Self::validate_database_config(config)?;
        Ok(())
    }

    fn validate_token_config(config: &AppConfig) -> Result<(), ConfigValidationError> {
        let tokens = &config.tokens;

        if tokens.secret.expose_secret().is_empty() {
            return Err(ConfigValidationError::TokenValidationFailed {
                message: "tokens.secret must not be empty".to_string(),
            });
        }

        if tokens.refresh_lifetime_seconds <= tokens.access_lifetime_seconds {
            return Err(ConfigValidationError::TokenValidationFailed {
                message: "tokens.refresh.lifetime must exceed tokens.access.lifetime".to_string(),
            });
        }

        Ok(())
    }

    fn validate_database_config(config: &AppConfig) -> Result<(), ConfigValidationError> {
        let db = &config.database;

        if db.max_connections < db.min_connections {
            return Err(ConfigValidationError::DatabaseValidationFailed {
                message: "Max connections must be greater than or equal to min connections"
                    .to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = AppConfig::default();
        assert!(ConfigValidator::validate_config(&config).is_ok());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let mut config = AppConfig::default();
        config.tokens.secret = secrecy::Secret::new(String::new());

        let result = ConfigValidator::validate_config(&config);
        assert!(matches!(
            result,
            Err(ConfigValidationError::TokenValidationFailed { .. })
        ));
    }

    #[test]
    fn test_refresh_lifetime_must_exceed_access_lifetime() {
        let mut config = AppConfig::default();
        config.tokens.refresh_lifetime_seconds = 60;
        config.tokens.access_lifetime_seconds = 3600;

        let result = ConfigValidator::validate_config(&config);
        assert!(matches!(
            result,
            Err(ConfigValidationError::TokenValidationFailed { .. })
        ));
    }

    #[test]
    fn test_invalid_db_connections() {
        let mut config = AppConfig::default();
        config.database.max_connections = 5;
        config.database.min_connections = 10;

        let result = ConfigValidator::validate_config(&config);
        assert!(matches!(
            result,
            Err(ConfigValidationError::DatabaseValidationFailed { .. })
        ));
    }

    #[test]
    fn test_basic_validation() {
        let mut config = AppConfig::default();
        config.server.port = 0;

        let result = ConfigValidator::validate_config(&config);
        assert!(matches!(
            result,
            Err(ConfigValidationError::ValidationFailed(_))
        ));
    }
}
