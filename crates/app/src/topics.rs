//! MQTT topic scheme shared by the synthesizer and the MQTT adapter.
//!
//! The synthesizer wires `state_topic`/`command_topic` strings into
//! discovery components; the adapter must parse inbound command topics back
//! into [`crate::ports::CommandRequest`]s. Keeping both directions in one
//! place prevents the two from drifting apart.

use heatlink_domain::device::DeviceAddress;

/// Discovery prefix Home Assistant listens on by default.
pub const DISCOVERY_PREFIX: &str = "homeassistant";

/// Topic builder rooted at a configurable base prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    base: String,
}

impl Default for Topics {
    fn default() -> Self {
        Self::new("heatlink")
    }
}

impl Topics {
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Retained discovery-document topic for one device.
    #[must_use]
    pub fn discovery(&self, address: &DeviceAddress) -> String {
        format!(
            "{DISCOVERY_PREFIX}/device/{}/config",
            address.composite_id()
        )
    }

    /// Retained state topic carrying one feature's raw property payload.
    #[must_use]
    pub fn feature_state(&self, address: &DeviceAddress, feature_path: &str) -> String {
        format!(
            "{}/installations/{}/gateways/{}/devices/{}/features/{feature_path}",
            self.base, address.installation_id, address.gateway_id, address.device_id
        )
    }

    /// Command topic for one executable command of one feature.
    #[must_use]
    pub fn feature_command(
        &self,
        address: &DeviceAddress,
        feature_path: &str,
        command: &str,
    ) -> String {
        format!(
            "{}/commands/{command}/set",
            self.feature_state(address, feature_path)
        )
    }

    /// Wildcard filter matching every command topic under this base.
    #[must_use]
    pub fn command_filter(&self) -> String {
        format!("{}/installations/+/gateways/+/devices/+/features/+/commands/+/set", self.base)
    }

    /// Parse a command topic back into its address/path/command parts.
    ///
    /// Returns `None` for topics that do not match the scheme.
    #[must_use]
    pub fn parse_command(&self, topic: &str) -> Option<(DeviceAddress, String, String)> {
        let rest = topic.strip_prefix(self.base.as_str())?.strip_prefix('/')?;
        let segments: Vec<&str> = rest.split('/').collect();
        // installations/{i}/gateways/{g}/devices/{d}/features/{path}/commands/{name}/set
        if segments.len() != 11
            || segments[0] != "installations"
            || segments[2] != "gateways"
            || segments[4] != "devices"
            || segments[6] != "features"
            || segments[8] != "commands"
            || segments[10] != "set"
        {
            return None;
        }
        let address = DeviceAddress {
            installation_id: segments[1].to_string(),
            gateway_id: segments[3].to_string(),
            device_id: segments[5].to_string(),
        };
        Some((address, segments[7].to_string(), segments[9].to_string()))
    }
}
