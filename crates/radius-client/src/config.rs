use crate::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// RADIUS server address, e.g. "127.0.0.1:1812"
    pub server: String,

    /// Shared secret for the server
    pub secret: String,

    /// Local address to bind (default: "0.0.0.0:0")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Retry policy (`max_attempts`, `retry_wait_ms`)
    #[serde(flatten)]
    pub retry: RetryConfig,

    /// Log level: "trace", "debug", "info", "warn", "error" (default: "info")
    #[serde(default)]
    pub log_level: Option<String>,
}

fn default_bind_address() -> String {
    "0.0.0.0:0".to_string()
}

impl ClientConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: ClientConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn server_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("Invalid server address: {}", self.server)))
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_address.parse().map_err(|_| {
            ConfigError::Invalid(format!("Invalid bind address: {}", self.bind_address))
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server_addr()?;
        self.bind_addr()?;

        if self.secret.is_empty() {
            return Err(ConfigError::Invalid("Secret cannot be empty".to_string()));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        if self.retry.retry_wait_ms == 0 {
            return Err(ConfigError::Invalid(
                "retry_wait_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Create an example configuration file
    pub fn example() -> Self {
        ClientConfig {
            server: "127.0.0.1:1812".to_string(),
            secret: "testing123".to_string(),
            bind_address: default_bind_address(),
            retry: RetryConfig::default(),
            log_level: Some("info".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_example_config_is_valid() {
        let config = ClientConfig::example();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.retry_wait_ms, 3000);
    }

    #[test]
    fn test_defaults_applied() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"server": "10.0.0.1:1812", "secret": "s3cret"}"#).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:0");
        assert_eq!(config.retry, RetryConfig::default());
        assert_eq!(config.log_level, None);
        assert_eq!(
            config.server_addr().unwrap(),
            "10.0.0.1:1812".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_retry_fields_are_top_level() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"server": "10.0.0.1:1812", "secret": "s", "max_attempts": 5, "retry_wait_ms": 250}"#,
        )
        .unwrap();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.retry_wait_ms, 250);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = ClientConfig::example();
        config.secret.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ClientConfig::example();
        config.server = "not an address".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ClientConfig::example();
        config.retry.max_attempts = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = ClientConfig::example();
        config.retry.retry_wait_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_file_round_trip() {
        let file = NamedTempFile::new().unwrap();
        let config = ClientConfig::example();
        config.to_file(file.path()).unwrap();

        let loaded = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{"server": "127.0.0.1:1812", "secret": ""}"#).unwrap();
        assert!(matches!(
            ClientConfig::from_file(file.path()),
            Err(ConfigError::Invalid(_))
        ));

        std::fs::write(file.path(), "not json").unwrap();
        assert!(matches!(
            ClientConfig::from_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
