//! Discovery document — the Home Assistant device-discovery payload shape.
//!
//! One document is synthesized per physical device per generation cycle and
//! published (retained) to `homeassistant/device/{composite_id}/config`.
//! Documents are never persisted; they are regenerated from scratch each
//! cycle, so the component map uses a `BTreeMap` for a stable serialization
//! order that diffs cleanly across runs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Home Assistant MQTT platforms emitted by the synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Sensor,
    BinarySensor,
    Climate,
    Number,
    Select,
    Switch,
    Button,
    Text,
}

impl Platform {
    /// Read-only platforms may never carry `entity_category: config`
    /// (Home Assistant rejects the document).
    #[must_use]
    pub fn is_read_only(self) -> bool {
        matches!(self, Self::Sensor | Self::BinarySensor)
    }
}

/// Home Assistant device classes used by this bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Temperature,
    Pressure,
    Energy,
    Power,
    Gas,
    SignalStrength,
    Duration,
}

/// Home Assistant sensor state classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    Measurement,
    Total,
    TotalIncreasing,
}

/// Home Assistant entity categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Config,
    Diagnostic,
}

/// One publishable entity inside a discovery document.
///
/// A single struct covers all platforms; platform-specific fields stay
/// `None` (and are skipped during serialization) when not applicable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Home Assistant platform tag, serialized as the short `p` key the
    /// device-based discovery schema expects.
    #[serde(rename = "p")]
    pub platform: Platform,
    pub unique_id: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_attributes_topic: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_press: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_off: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_off: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_class: Option<DeviceClass>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_class: Option<StateClass>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_category: Option<EntityCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled_by_default: Option<bool>,

    // number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,

    // select
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,

    // climate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_state_topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_state_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_command_topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_command_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_temperature_topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_temperature_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_state_topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_state_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_command_topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_command_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_temp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_step: Option<f64>,
}

impl Component {
    /// A bare component of the given platform; everything optional unset.
    #[must_use]
    pub fn new(platform: Platform, unique_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            platform,
            unique_id: unique_id.into(),
            name: name.into(),
            state_topic: None,
            value_template: None,
            json_attributes_topic: None,
            command_topic: None,
            command_template: None,
            payload_press: None,
            payload_on: None,
            payload_off: None,
            state_on: None,
            state_off: None,
            device_class: None,
            state_class: None,
            unit_of_measurement: None,
            entity_category: None,
            enabled_by_default: None,
            min: None,
            max: None,
            step: None,
            options: None,
            modes: None,
            mode_state_topic: None,
            mode_state_template: None,
            mode_command_topic: None,
            mode_command_template: None,
            current_temperature_topic: None,
            current_temperature_template: None,
            temperature_state_topic: None,
            temperature_state_template: None,
            temperature_command_topic: None,
            temperature_command_template: None,
            min_temp: None,
            max_temp: None,
            temp_step: None,
        }
    }
}

/// Device block of the discovery document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub identifiers: Vec<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Origin block identifying the publishing application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sw_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_url: Option<String>,
}

impl Default for Origin {
    fn default() -> Self {
        Self {
            name: "heatlink".to_string(),
            sw_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            support_url: None,
        }
    }
}

/// One discovery document per physical device per generation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    pub device: DeviceInfo,
    pub origin: Origin,
    pub components: BTreeMap<String, Component>,
}

impl DiscoveryDocument {
    /// Look up a component's resolved state payload root, i.e. the feature
    /// path encoded in its `state_topic`, if it has one.
    #[must_use]
    pub fn feature_path_of(component: &Component) -> Option<&str> {
        let topic = component.state_topic.as_deref()?;
        topic.split("/features/").nth(1)
    }
}
