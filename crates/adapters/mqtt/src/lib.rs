//! # heatlink-adapter-mqtt
//!
//! MQTT adapter. Publishes retained discovery documents and feature state
//! through rumqttc, and relays inbound command topics back to the daemon as
//! parsed [`CommandRequest`]s.
//!
//! ## Dependency rule
//!
//! Depends on `heatlink-app` (ports, topic scheme) and `heatlink-domain`
//! only.

mod config;
mod error;

pub use config::MqttConfig;
pub use error::MqttError;

use rumqttc::{AsyncClient, Event, EventLoop, Packet, QoS};
use tokio::sync::mpsc;

use heatlink_app::ports::{CommandRequest, DiscoveryPublisher};
use heatlink_app::topics::Topics;
use heatlink_domain::device::DeviceAddress;
use heatlink_domain::discovery::DiscoveryDocument;
use heatlink_domain::error::HeatlinkError;
use heatlink_domain::feature::Feature;

/// Outstanding-request capacity of the rumqttc client channel.
const CLIENT_CAPACITY: usize = 64;

/// Broker-facing half of the bridge, implementing the publisher port.
pub struct MqttBridge {
    client: AsyncClient,
    topics: Topics,
}

impl MqttBridge {
    /// Build the bridge and the event loop the caller must drive.
    #[must_use]
    pub fn new(config: &MqttConfig, topics: Topics) -> (Self, EventLoop) {
        let (client, event_loop) = AsyncClient::new(config.to_options(), CLIENT_CAPACITY);
        (Self { client, topics }, event_loop)
    }

    /// Subscribe to every command topic under the configured base.
    ///
    /// # Errors
    ///
    /// Returns an error when the client channel is closed.
    pub async fn subscribe_commands(&self) -> Result<(), MqttError> {
        let filter = self.topics.command_filter();
        tracing::info!(filter, "subscribing to command topics");
        self.client.subscribe(filter, QoS::AtLeastOnce).await?;
        Ok(())
    }
}

impl DiscoveryPublisher for MqttBridge {
    async fn publish_discovery(
        &self,
        address: &DeviceAddress,
        document: &DiscoveryDocument,
    ) -> Result<(), HeatlinkError> {
        let topic = self.topics.discovery(address);
        let payload = serde_json::to_vec(document).map_err(MqttError::Encode)?;
        tracing::debug!(
            topic,
            components = document.components.len(),
            "publishing discovery document"
        );
        self.client
            .publish(topic, QoS::AtLeastOnce, true, payload)
            .await
            .map_err(MqttError::Client)?;
        Ok(())
    }

    async fn publish_feature_state(
        &self,
        address: &DeviceAddress,
        feature: &Feature,
    ) -> Result<(), HeatlinkError> {
        let topic = self.topics.feature_state(address, &feature.path);
        let payload = serde_json::to_vec(&feature.properties).map_err(MqttError::Encode)?;
        self.client
            .publish(topic, QoS::AtLeastOnce, true, payload)
            .await
            .map_err(MqttError::Client)?;
        Ok(())
    }
}

/// Drive the broker connection forever, forwarding parsed command requests.
///
/// Connection errors are logged and retried; rumqttc reconnects on the next
/// poll. The loop ends when the receiving side of `commands` is dropped.
pub async fn run_event_loop(
    mut event_loop: EventLoop,
    topics: Topics,
    commands: mpsc::Sender<CommandRequest>,
) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let Some((address, feature_path, command)) =
                    topics.parse_command(&publish.topic)
                else {
                    tracing::debug!(topic = publish.topic, "ignoring non-command publish");
                    continue;
                };
                let params: serde_json::Value = match serde_json::from_slice(&publish.payload) {
                    Ok(params) => params,
                    Err(err) => {
                        tracing::warn!(
                            topic = publish.topic,
                            error = %err,
                            "discarding command with malformed payload"
                        );
                        continue;
                    }
                };
                let request = CommandRequest {
                    address,
                    feature_path,
                    command,
                    params,
                };
                if commands.send(request).await.is_err() {
                    tracing::info!("command receiver dropped, stopping event loop");
                    return;
                }
            }
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                tracing::info!("connected to broker");
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(error = %err, "broker connection error, retrying");
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            }
        }
    }
}
