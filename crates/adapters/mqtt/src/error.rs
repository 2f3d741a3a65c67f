//! MQTT adapter error types.

use heatlink_domain::error::HeatlinkError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The rumqttc client rejected a publish or subscribe.
    #[error("mqtt client error")]
    Client(#[from] rumqttc::ClientError),

    /// A payload could not be encoded as JSON.
    #[error("failed to encode mqtt payload")]
    Encode(#[from] serde_json::Error),
}

impl From<MqttError> for HeatlinkError {
    fn from(err: MqttError) -> Self {
        HeatlinkError::Mqtt(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_into_domain_mqtt_error() {
        let encode_failure =
            serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: HeatlinkError = MqttError::Encode(encode_failure).into();
        assert!(matches!(err, HeatlinkError::Mqtt(_)));
    }
}
