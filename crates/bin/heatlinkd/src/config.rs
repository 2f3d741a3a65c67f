//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `heatlink.toml` in the working directory. Every field has a
//! default so the file is optional, but the cloud credentials must be
//! supplied one way or the other. Environment variables take precedence
//! over file values.

use heatlink_adapter_cloud::CloudConfig;
use heatlink_adapter_mqtt::MqttConfig;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Vendor cloud settings.
    pub cloud: CloudConfig,
    /// Broker settings.
    pub mqtt: MqttConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Optional path to a TOML name catalog (`"feature.path" = "Title"`).
    pub names_file: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "heatlinkd=info,heatlink=info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `heatlink.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// cloud credentials are missing after overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("heatlink.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HEATLINK_CLIENT_ID") {
            self.cloud.client_id = val;
        }
        if let Ok(val) = std::env::var("HEATLINK_REFRESH_TOKEN") {
            self.cloud.refresh_token = val;
        }
        if let Ok(val) = std::env::var("HEATLINK_MQTT_HOST") {
            self.mqtt.host = val;
        }
        if let Ok(val) = std::env::var("HEATLINK_MQTT_PORT") {
            if let Ok(port) = val.parse() {
                self.mqtt.port = port;
            }
        }
        if let Ok(val) = std::env::var("HEATLINK_BASE_TOPIC") {
            self.mqtt.base_topic = val;
        }
        if let Ok(val) = std::env::var("HEATLINK_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.cloud.has_credentials() {
            return Err(ConfigError::Validation(
                "cloud.client_id and cloud.refresh_token are required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            names_file = 'names.toml'

            [cloud]
            client_id = 'abc'
            refresh_token = 'xyz'
            poll_interval_secs = 300

            [mqtt]
            host = 'broker.lan'
            base_topic = 'heating'

            [logging]
            filter = 'debug'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.cloud.poll_interval_secs, 300);
        assert_eq!(config.mqtt.base_topic, "heating");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.names_file.as_deref(), Some("names.toml"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn should_reject_missing_credentials() {
        let config = Config::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.mqtt.port, 1883);
    }
}
