//! End-to-end synthesis tests over a realistic gas-boiler fixture.
//!
//! The fixture mirrors what the vendor cloud returns for a condensing
//! boiler with one heating circuit: the full document is synthesized
//! exactly as the daemon would, then checked for the structural guarantees
//! Home Assistant relies on.

use std::collections::BTreeMap;

use heatlink_app::synth::{synthesize, DeviceContext};
use heatlink_app::topics::Topics;
use heatlink_domain::device::{classify, DeviceAddress};
use heatlink_domain::discovery::{DiscoveryDocument, Platform};
use heatlink_domain::feature::store::FeatureStore;
use heatlink_domain::feature::{Command, CommandParam, Constraints, Feature};
use serde_json::{json, Value};

fn feature(path: &str, properties: Value) -> Feature {
    Feature {
        path: path.to_string(),
        is_enabled: true,
        is_ready: true,
        properties: properties.as_object().cloned().unwrap_or_default(),
        commands: BTreeMap::new(),
    }
}

fn with_command(mut feature: Feature, name: &str, params: Vec<(&str, CommandParam)>) -> Feature {
    feature.commands.insert(
        name.to_string(),
        Command {
            name: name.to_string(),
            is_executable: true,
            params: params
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        },
    );
    feature
}

fn numeric(min: f64, max: f64, stepping: f64) -> CommandParam {
    CommandParam {
        param_type: "number".to_string(),
        required: true,
        constraints: Some(Constraints::Numeric {
            min: Some(min),
            max: Some(max),
            stepping: Some(stepping),
        }),
    }
}

fn mode_enum(values: &[&str]) -> CommandParam {
    CommandParam {
        param_type: "string".to_string(),
        required: true,
        constraints: Some(Constraints::Enum {
            values: values.iter().map(ToString::to_string).collect(),
        }),
    }
}

fn boiler_store() -> FeatureStore {
    FeatureStore::new(vec![
        feature("heating.circuits", json!({ "enabled": { "value": ["0"] } })),
        feature(
            "heating.circuits.0",
            json!({ "name": { "value": "Ground floor" } }),
        ),
        with_command(
            feature(
                "heating.circuits.0.operating.modes.active",
                json!({ "value": { "value": "heating" } }),
            ),
            "setMode",
            vec![("mode", mode_enum(&["standby", "heating"]))],
        ),
        feature(
            "heating.circuits.0.operating.programs.active",
            json!({ "value": { "value": "normal" } }),
        ),
        with_command(
            feature(
                "heating.circuits.0.operating.programs.normal",
                json!({ "temperature": { "value": 21.0, "unit": "celsius" } }),
            ),
            "setTemperature",
            vec![("targetTemperature", numeric(3.0, 37.0, 1.0))],
        ),
        feature(
            "heating.circuits.0.sensors.temperature.room",
            json!({ "value": { "value": 20.1, "unit": "celsius" } }),
        ),
        feature(
            "heating.sensors.temperature.outside",
            json!({ "value": { "value": 5.0, "unit": "celsius" } }),
        ),
        feature(
            "heating.boiler.sensors.temperature.main",
            json!({ "value": { "value": 55.0, "unit": "celsius" } }),
        ),
        feature(
            "heating.gas.consumption.heating",
            json!({
                "day": { "value": [1.2], "unit": "cubicMeter" },
                "week": { "value": [8.0], "unit": "cubicMeter" }
            }),
        ),
        with_command(
            feature(
                "heating.dhw.temperature.main",
                json!({ "value": { "value": 50.0, "unit": "celsius" } }),
            ),
            "setTargetTemperature",
            vec![("targetTemperature", numeric(10.0, 60.0, 1.0))],
        ),
        Feature {
            is_enabled: false,
            ..feature(
                "heating.solar.sensors.temperature.collector",
                json!({ "value": { "value": 60.0, "unit": "celsius" } }),
            )
        },
    ])
}

fn context() -> DeviceContext {
    let roles = vec!["type:boiler".to_string()];
    let model_id = "Vitodens 200-W".to_string();
    DeviceContext {
        address: DeviceAddress {
            installation_id: "100".to_string(),
            gateway_id: "200".to_string(),
            device_id: "0".to_string(),
        },
        variant: classify(&model_id, &roles),
        model_id,
        manufacturer: "Viessmann".to_string(),
    }
}

fn document() -> DiscoveryDocument {
    synthesize(&context(), &boiler_store(), None, &Topics::default())
}

#[test]
fn should_synthesize_identical_documents_for_identical_inputs() {
    assert_eq!(document(), document());
}

#[test]
fn should_assign_unique_prefixed_ids_to_every_component() {
    let document = document();
    let mut seen = std::collections::HashSet::new();
    for component in document.components.values() {
        assert!(
            component.unique_id.starts_with("heatlink_100_200_0_"),
            "{}",
            component.unique_id
        );
        assert!(seen.insert(component.unique_id.clone()));
    }
}

#[test]
fn should_reference_only_enabled_features_from_state_topics() {
    let store = boiler_store();
    let document = document();
    for component in document.components.values() {
        let Some(path) = DiscoveryDocument::feature_path_of(component) else {
            continue;
        };
        assert!(
            store.lookup(path).is_some(),
            "state topic references unknown or disabled feature {path}"
        );
    }
}

#[test]
fn should_not_surface_disabled_features_at_all() {
    let document = document();
    assert!(!document.components.values().any(|c| {
        c.state_topic
            .as_deref()
            .is_some_and(|t| t.contains("heating.solar"))
    }));
}

#[test]
fn should_drop_energy_class_for_volume_based_gas_meter() {
    let document = document();
    let gas = document.components.get("gas_consumption_heating").unwrap();
    assert_eq!(gas.device_class, None);
    assert_eq!(gas.unit_of_measurement.as_deref(), Some("m³"));
}

#[test]
fn should_build_fully_wired_climate_for_the_circuit() {
    let document = document();
    let climate = document.components.get("circuit_0_climate").unwrap();
    assert_eq!(climate.platform, Platform::Climate);
    assert_eq!(climate.name, "Ground floor");
    let modes = climate.modes.as_ref().unwrap();
    assert!(modes.iter().any(|m| m == "off") && modes.iter().any(|m| m == "heat"));
    assert!(climate.mode_command_topic.is_some());
    assert!(climate
        .temperature_command_topic
        .as_deref()
        .is_some_and(|t| t.ends_with("programs.normal/commands/setTemperature/set")));
    assert_eq!(climate.min_temp, Some(3.0));
}

#[test]
fn should_make_dhw_target_temperature_writable() {
    let document = document();
    let number = document.components.get("dhw_target_temperature").unwrap();
    assert_eq!(number.platform, Platform::Number);
    assert!(number
        .command_topic
        .as_deref()
        .is_some_and(|t| t.ends_with(
            "heating.dhw.temperature.main/commands/setTargetTemperature/set"
        )));
    assert_eq!(number.max, Some(60.0));
}

#[test]
fn should_serialize_components_under_the_short_platform_key() {
    let document = document();
    let json = serde_json::to_value(&document).unwrap();
    let components = json["components"].as_object().unwrap();
    assert!(!components.is_empty());
    for component in components.values() {
        assert!(component.get("p").is_some());
    }
    assert_eq!(json["device"]["manufacturer"], "Viessmann");
    assert_eq!(
        json["device"]["identifiers"][0],
        "heatlink_100_200_0"
    );
}

#[test]
fn should_emit_boiler_sensors_for_classified_gas_boiler() {
    let document = document();
    assert!(document.components.contains_key("boiler_temperature"));
    assert!(document.components.contains_key("outside_temperature"));
}
