//! # heatlinkd — heatlink daemon
//!
//! Composition root that wires the cloud and MQTT adapters around the
//! mapping engine and runs the poll loop.
//!
//! ## Responsibilities
//! - Parse configuration (TOML file, env vars)
//! - Construct the cloud client and the MQTT bridge
//! - Periodically enumerate devices, fetch features, synthesize discovery
//!   documents, and publish documents plus feature state
//! - Relay inbound command topics back to the cloud
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates. It is the
//! wiring layer — no mapping logic belongs here.

mod config;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use heatlink_adapter_cloud::CloudClient;
use heatlink_adapter_mqtt::MqttBridge;
use heatlink_app::ports::{CommandExecutor, DiscoveryPublisher, FeatureSource};
use heatlink_app::synth::{synthesize, DeviceContext};
use heatlink_app::topics::Topics;
use heatlink_domain::device::classify;
use heatlink_domain::feature::store::FeatureStore;
use heatlink_domain::names::NameCatalog;

use config::Config;

/// Manufacturer reported in every discovery document's device block.
const MANUFACTURER: &str = "Viessmann";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.logging.filter)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let catalog = config
        .names_file
        .as_deref()
        .map(load_catalog)
        .transpose()?;

    let topics = Topics::new(config.mqtt.base_topic.clone());
    let cloud = Arc::new(CloudClient::new(config.cloud.clone())?);
    let (bridge, event_loop) = MqttBridge::new(&config.mqtt, topics.clone());
    bridge.subscribe_commands().await?;

    // Inbound command topics flow from the event loop to the cloud.
    let (command_tx, mut command_rx) = mpsc::channel(32);
    tokio::spawn(heatlink_adapter_mqtt::run_event_loop(
        event_loop,
        topics.clone(),
        command_tx,
    ));
    let executor = Arc::clone(&cloud);
    tokio::spawn(async move {
        while let Some(request) = command_rx.recv().await {
            tracing::info!(
                device = %request.address,
                feature = request.feature_path,
                command = request.command,
                "relaying command"
            );
            if let Err(err) = executor.execute_command(&request).await {
                tracing::error!(error = %err, "command execution failed");
            }
        }
    });

    let mut interval =
        tokio::time::interval(Duration::from_secs(config.cloud.poll_interval_secs));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(err) =
                    run_cycle(cloud.as_ref(), &bridge, &topics, catalog.as_ref()).await
                {
                    tracing::error!(error = %err, "poll cycle failed");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received");
                break;
            }
        }
    }
    Ok(())
}

/// One full generation cycle: enumerate, fetch, synthesize, publish.
async fn run_cycle(
    source: &(impl FeatureSource + Sync),
    publisher: &(impl DiscoveryPublisher + Sync),
    topics: &Topics,
    catalog: Option<&NameCatalog>,
) -> Result<(), heatlink_domain::error::HeatlinkError> {
    let devices = source.get_devices().await?;
    for descriptor in devices {
        let features = source.get_features(&descriptor.address).await?;
        let store = FeatureStore::new(features);
        let variant = classify(&descriptor.model_id, &descriptor.roles);
        let ctx = DeviceContext {
            address: descriptor.address.clone(),
            variant,
            model_id: descriptor.model_id.clone(),
            manufacturer: MANUFACTURER.to_string(),
        };
        let document = synthesize(&ctx, &store, catalog, topics);
        publisher
            .publish_discovery(&descriptor.address, &document)
            .await?;
        for feature in store.iter().filter(|f| f.is_eligible()) {
            publisher
                .publish_feature_state(&descriptor.address, feature)
                .await?;
        }
        tracing::info!(
            device = %descriptor.address,
            variant = variant.label(),
            components = document.components.len(),
            "device synchronized"
        );
    }
    Ok(())
}

/// Load a `"feature.path" = "Title"` catalog from a TOML file.
fn load_catalog(path: &str) -> Result<NameCatalog, config::ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let entries: HashMap<String, String> = toml::from_str(&content)?;
    tracing::debug!(count = entries.len(), "name catalog loaded");
    Ok(NameCatalog::new(entries))
}
