//! Port traits — the IO boundaries the mapping engine is wired between.
//!
//! Adapters (cloud, MQTT) implement these; the binary crate owns the
//! concrete wiring. The engine itself only ever sees already-fetched,
//! immutable inputs and returns plain values.

use std::future::Future;

use heatlink_domain::device::DeviceAddress;
use heatlink_domain::discovery::DiscoveryDocument;
use heatlink_domain::error::HeatlinkError;
use heatlink_domain::feature::Feature;

/// A raw device descriptor as enumerated by the vendor cloud, before
/// classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub address: DeviceAddress,
    /// Free-form vendor model identifier, e.g. `Vitodens 200-W`.
    pub model_id: String,
    /// Vendor role strings, e.g. `type:boiler;gas`.
    pub roles: Vec<String>,
}

/// Driven port: vendor cloud feature access.
pub trait FeatureSource: Send + Sync {
    /// Enumerate all devices across all installations and gateways.
    fn get_devices(
        &self,
    ) -> impl Future<Output = Result<Vec<DeviceDescriptor>, HeatlinkError>> + Send;

    /// Fetch the full feature list of one device.
    fn get_features(
        &self,
        address: &DeviceAddress,
    ) -> impl Future<Output = Result<Vec<Feature>, HeatlinkError>> + Send;
}

/// A command invocation parsed from an inbound command topic.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    pub address: DeviceAddress,
    pub feature_path: String,
    pub command: String,
    /// JSON parameter object, already shaped by the component's
    /// `command_template`.
    pub params: serde_json::Value,
}

/// Driven port: vendor command execution.
pub trait CommandExecutor: Send + Sync {
    fn execute_command(
        &self,
        request: &CommandRequest,
    ) -> impl Future<Output = Result<(), HeatlinkError>> + Send;
}

/// Driven port: broker publishing.
pub trait DiscoveryPublisher: Send + Sync {
    /// Publish one device's discovery document (retained).
    fn publish_discovery(
        &self,
        address: &DeviceAddress,
        document: &DiscoveryDocument,
    ) -> impl Future<Output = Result<(), HeatlinkError>> + Send;

    /// Publish one feature's raw property payload (retained).
    fn publish_feature_state(
        &self,
        address: &DeviceAddress,
        feature: &Feature,
    ) -> impl Future<Output = Result<(), HeatlinkError>> + Send;
}
