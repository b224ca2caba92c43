//! Core configuration structures

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub tokens: TokenConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    #[validate(range(min = 1, max = 65535))]
    pub port: u16,
    pub host: String,
    pub shutdown_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatabaseConfig {
    #[serde(skip_serializing)]
    pub mysql_url: secrecy::Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout: u64,
}

/// Which request-borne attributes `TokenService::refresh` compares
/// against the stored token on refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshCheckField {
    Ip,
    Fingerprint,
    UserAgent,
}

/// The side effect `TokenService::refresh` applies when an anti-replay
/// check fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessViolationAction {
    DisableAll,
    DisableCurrent,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TokenConfig {
    /// HMAC signing key for access-token JWTs.
    #[serde(skip_serializing)]
    pub secret: secrecy::Secret<String>,

    /// Per-account live-token cap.
    #[validate(range(min = 1))]
    pub maximum_tokens: u32,

    /// Expiry-sweep interval, in seconds.
    pub delay_clear_seconds: u64,
    /// Revoke-buffer drain interval, in seconds.
    pub delay_blocker_seconds: u64,
    /// Insert-buffer drain interval, in seconds.
    pub delay_saver_seconds: u64,

    /// Access-JWT TTL, in seconds.
    pub access_lifetime_seconds: i64,
    /// Refresh-handle TTL, in seconds.
    pub refresh_lifetime_seconds: i64,

    pub refresh_check_fields: Vec<RefreshCheckField>,
    pub access_violation_action: AccessViolationAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: 8081,
                host: "0.0.0.0".to_string(),
                shutdown_timeout_seconds: 30,
            },
            database: DatabaseConfig {
                mysql_url: secrecy::Secret::new(
                    "mysql://root@localhost/refresh_tokens".to_string(),
                ),
                max_connections: 200,
                min_connections: 20,
                connection_timeout: 30,
            },
            tokens: TokenConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: secrecy::Secret::new("fpbxsfhdYzd3U908O5hQ".to_string()),
            maximum_tokens: 5,
            delay_clear_seconds: 10,
            delay_blocker_seconds: 10,
            delay_saver_seconds: 5,
            access_lifetime_seconds: 30 * 60,
            refresh_lifetime_seconds: 60 * 24 * 60 * 60,
            refresh_check_fields: vec![
                RefreshCheckField::Fingerprint,
                RefreshCheckField::UserAgent,
            ],
            access_violation_action: AccessViolationAction::DisableCurrent,
        }
    }
}
