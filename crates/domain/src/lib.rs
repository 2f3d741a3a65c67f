//! # heatlink-domain
//!
//! Pure domain model for the heatlink cloud-to-MQTT bridge.
//!
//! ## Responsibilities
//! - Define **Features** (vendor sensor/command descriptors with a
//!   dynamically shaped property tree) and the read-only [`feature::store::FeatureStore`]
//! - Define **Commands** (executable vendor operations with typed parameter
//!   constraints)
//! - Classify raw device descriptors into [`device::DeviceVariant`]s
//! - Define the **discovery document** shape published for Home Assistant
//!   (components, platforms, device classes, entity categories)
//! - Normalize vendor units and derive human-readable entity names
//!
//! ## Dependency rule
//! This crate has **no internal dependencies** and performs no IO.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;

pub mod device;
pub mod discovery;
pub mod feature;
pub mod names;
pub mod units;
