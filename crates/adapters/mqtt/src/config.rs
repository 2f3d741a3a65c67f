//! MQTT adapter configuration.

use std::time::Duration;

use rumqttc::MqttOptions;
use serde::Deserialize;

/// Configuration for the broker connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Broker hostname or IP.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// MQTT client id.
    pub client_id: String,
    /// Optional broker credentials.
    pub username: Option<String>,
    pub password: Option<String>,
    /// Base prefix for state and command topics.
    pub base_topic: String,
    /// Keep-alive interval, in seconds.
    pub keep_alive_secs: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "heatlink".to_string(),
            username: None,
            password: None,
            base_topic: "heatlink".to_string(),
            keep_alive_secs: 30,
        }
    }
}

impl MqttConfig {
    /// Translate into rumqttc connection options.
    #[must_use]
    pub fn to_options(&self) -> MqttOptions {
        let mut options = MqttOptions::new(self.client_id.clone(), self.host.clone(), self.port);
        options.set_keep_alive(Duration::from_secs(self.keep_alive_secs));
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            options.set_credentials(username.clone(), password.clone());
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = MqttConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 1883);
        assert_eq!(config.base_topic, "heatlink");
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let config: MqttConfig = toml::from_str(
            "
            host = 'broker.lan'
            username = 'ha'
            password = 'secret'
            ",
        )
        .unwrap();
        assert_eq!(config.host, "broker.lan");
        assert_eq!(config.port, 1883);
        assert_eq!(config.username.as_deref(), Some("ha"));
    }

    #[test]
    fn should_build_broker_options() {
        let config = MqttConfig {
            keep_alive_secs: 45,
            ..MqttConfig::default()
        };
        let options = config.to_options();
        assert_eq!(options.keep_alive(), Duration::from_secs(45));
        assert_eq!(options.broker_address(), ("localhost".to_string(), 1883));
    }
}
