//! Pass 4: auto-detection of leftover enabled features.
//!
//! Every enabled feature with non-empty properties that no earlier pass
//! claimed gets one component (or a small expansion), so new vendor
//! features surface without code changes. Platform, representative
//! property, and device class all come from fixed rule tables evaluated in
//! order — first match wins.

use heatlink_domain::discovery::{Component, DeviceClass, EntityCategory, Platform, StateClass};
use heatlink_domain::feature::Feature;
use heatlink_domain::names::snake_case;
use heatlink_domain::units::normalize_unit;

use super::variant::TIME_WINDOWS;
use super::{is_container_path, sensor_component, value_expr_for, Builder};

/// Number of slots in the fixed counter shape (`count1..count7`).
const COUNTER_SLOTS: usize = 7;

impl Builder<'_> {
    pub(crate) fn run_autodetect_pass(&mut self) {
        let features: Vec<Feature> = self.store.iter().cloned().collect();
        for feature in &features {
            if !feature.is_eligible()
                || self.claimed.contains(&feature.path)
                || is_container_path(&feature.path)
            {
                continue;
            }
            if feature.path == "device.configuration" {
                self.expand_configuration(feature);
            } else if has_counter_shape(feature) {
                self.expand_counters(feature);
            } else if time_windows_of(feature).len() >= 2 {
                self.expand_windows(feature);
            } else {
                self.emit_generic(feature);
            }
        }
    }

    /// `device.configuration` aggregates unrelated installer settings; one
    /// diagnostic entity per sub-property beats a single aggregate sensor.
    fn expand_configuration(&mut self, feature: &Feature) {
        let keys: Vec<String> = feature.properties.keys().cloned().collect();
        for property in keys {
            let key = format!("device_configuration_{}", snake_case(&property));
            let name = format!("Configuration {}", heatlink_domain::names::human_name(&property, None));
            let Some(mut component) = sensor_component(
                self,
                Platform::Sensor,
                &key,
                name,
                feature,
                &property,
            ) else {
                continue;
            };
            component.entity_category = Some(EntityCategory::Diagnostic);
            let backing = (feature.path.clone(), property);
            self.insert(key, component, Some(backing));
        }
    }

    /// `count1..count7 + timestamp1..timestamp7` shapes become seven
    /// independent counter sensors instead of one.
    fn expand_counters(&mut self, feature: &Feature) {
        let base_key = snake_case(&feature.path);
        let base_name = self.display_name(&feature.path);
        for slot in 1..=COUNTER_SLOTS {
            let property = format!("count{slot}");
            let key = format!("{base_key}_count{slot}");
            let name = format!("{base_name} {slot}");
            let Some(mut component) = sensor_component(
                self,
                Platform::Sensor,
                &key,
                name,
                feature,
                &property,
            ) else {
                continue;
            };
            component.state_class = Some(StateClass::TotalIncreasing);
            component.entity_category = Some(EntityCategory::Diagnostic);
            let backing = (feature.path.clone(), property);
            self.insert(key, component, Some(backing));
        }
    }

    /// Several simultaneous time windows on one feature: one sensor per
    /// window, never a single multi-valued sensor.
    fn expand_windows(&mut self, feature: &Feature) {
        let base_key = snake_case(&feature.path);
        let base_name = self.display_name(&feature.path);
        for window in time_windows_of(feature) {
            let key = format!("{base_key}_{window}");
            let name = format!("{base_name} {window}");
            let Some(mut component) = sensor_component(
                self,
                Platform::Sensor,
                &key,
                name,
                feature,
                window,
            ) else {
                continue;
            };
            let (device_class, unit) = detect_class(&feature.path, feature, window);
            component.device_class = device_class;
            component.unit_of_measurement = unit;
            component.state_class = Some(StateClass::TotalIncreasing);
            let backing = (feature.path.clone(), window.to_string());
            self.insert(key, component, Some(backing));
        }
    }

    fn emit_generic(&mut self, feature: &Feature) {
        let key = snake_case(&feature.path);
        let name = self.display_name(&feature.path);

        if let Some((platform, template, property)) = detect_binary(feature) {
            let mut component = Component::new(platform, self.unique_id(&key), name);
            component.state_topic = Some(self.state_topic(&feature.path));
            component.value_template = Some(template);
            let backing = (feature.path.clone(), property.to_string());
            self.insert(key, component, Some(backing));
            return;
        }

        let Some(property) = representative_property(feature) else {
            return;
        };
        let Some(mut component) = sensor_component(
            self,
            Platform::Sensor,
            &key,
            name,
            feature,
            property,
        ) else {
            return;
        };
        let (device_class, unit) = detect_class(&feature.path, feature, property);
        component.device_class = device_class;
        component.unit_of_measurement = unit;
        if matches!(
            component.device_class,
            Some(DeviceClass::Temperature | DeviceClass::Pressure | DeviceClass::SignalStrength)
        ) {
            component.state_class = Some(StateClass::Measurement);
        }
        let backing = (feature.path.clone(), property.to_string());
        self.insert(key, component, Some(backing));
    }
}

fn has_counter_shape(feature: &Feature) -> bool {
    (1..=COUNTER_SLOTS).all(|slot| {
        feature.properties.contains_key(&format!("count{slot}"))
            && feature.properties.contains_key(&format!("timestamp{slot}"))
    })
}

fn time_windows_of(feature: &Feature) -> Vec<&'static str> {
    TIME_WINDOWS
        .iter()
        .copied()
        .filter(|window| feature.property_node(window).is_some())
        .collect()
}

/// Platform detection table, evaluated in fixed order; first match wins.
///
/// Returns the platform, value template, and backing property. Templates
/// address the property through the same unwrap rule as detection, so a
/// bare boolean leaf and a `{value}`-wrapped one both work.
fn detect_binary(feature: &Feature) -> Option<(Platform, String, &'static str)> {
    if feature.property("active").is_some_and(serde_json::Value::is_boolean) {
        let expr = value_expr_for(feature, "active")?;
        return Some((
            Platform::BinarySensor,
            format!("{{% if {expr} %}}ON{{% else %}}OFF{{% endif %}}"),
            "active",
        ));
    }
    if let Some(status) = feature.property("status").and_then(|v| v.as_str()) {
        if matches!(status, "on" | "off" | "connected" | "disconnected") {
            let expr = value_expr_for(feature, "status")?;
            return Some((
                Platform::BinarySensor,
                format!("{{% if {expr} in ['on', 'connected'] %}}ON{{% else %}}OFF{{% endif %}}"),
                "status",
            ));
        }
    }
    None
}

/// Representative-property priority lists, tuned per feature category.
fn representative_priority(path: &str) -> &'static [&'static str] {
    if path.contains("temperature") || path.contains("pressure") {
        &["value"]
    } else if path.contains("summary") {
        &["value", "currentDay"]
    } else {
        &["value", "strength", "status", "day", "week", "month", "year"]
    }
}

/// Pick the property a generic sensor should surface.
///
/// Numeric properties carrying a unit are preferred over array-valued
/// candidates earlier in the priority list.
fn representative_property(feature: &Feature) -> Option<&'static str> {
    let priority = representative_priority(&feature.path);
    let existing: Vec<&'static str> = priority
        .iter()
        .copied()
        .filter(|p| feature.property(p).is_some())
        .collect();

    existing
        .iter()
        .copied()
        .find(|p| {
            feature.property(p).is_some_and(serde_json::Value::is_number)
                && feature.property_unit(p).is_some()
        })
        .or_else(|| existing.first().copied())
}

/// Device-class/unit detection keyed on feature-path substrings, with unit
/// validation and safe fallbacks (`bar` for pressure, `kWh` for energy).
fn detect_class(
    path: &str,
    feature: &Feature,
    property: &str,
) -> (Option<DeviceClass>, Option<String>) {
    let vendor_unit = feature.property_unit(property);
    let lower = path.to_ascii_lowercase();

    if lower.contains("temperature") {
        let unit = vendor_unit
            .and_then(|u| normalize_unit(u, None))
            .unwrap_or("°C");
        return (Some(DeviceClass::Temperature), Some(unit.to_string()));
    }
    if lower.contains("pressure") {
        let unit = vendor_unit
            .and_then(|u| normalize_unit(u, Some(DeviceClass::Pressure)))
            .unwrap_or("bar");
        return (Some(DeviceClass::Pressure), Some(unit.to_string()));
    }
    if lower.contains("consumption") || lower.contains("production") {
        return match vendor_unit {
            Some(vendor) => match normalize_unit(vendor, Some(DeviceClass::Energy)) {
                Some(display) => (Some(DeviceClass::Energy), Some(display.to_string())),
                None => (None, normalize_unit(vendor, None).map(ToString::to_string)),
            },
            None => (Some(DeviceClass::Energy), Some("kWh".to_string())),
        };
    }
    if lower.contains("wifi") || lower.contains("rssi") || property == "strength" {
        let unit = vendor_unit.and_then(|u| normalize_unit(u, None));
        return match unit {
            // signal_strength accepts dB/dBm only; percent strength stays
            // a plain sensor.
            Some(display @ ("dB" | "dBm")) => {
                (Some(DeviceClass::SignalStrength), Some(display.to_string()))
            }
            other => (None, other.map(ToString::to_string)),
        };
    }

    (None, vendor_unit.and_then(|u| normalize_unit(u, None)).map(ToString::to_string))
}

#[cfg(test)]
mod tests {
    use heatlink_domain::device::DeviceVariant;
    use heatlink_domain::discovery::{DeviceClass, EntityCategory, Platform};
    use heatlink_domain::feature::store::FeatureStore;
    use serde_json::json;

    use crate::synth::testutil::{context, feature};
    use crate::synth::synthesize;
    use crate::topics::Topics;

    #[test]
    fn should_emit_binary_sensor_for_boolean_active_property() {
        let ctx = context(DeviceVariant::Heating);
        let store = FeatureStore::new(vec![feature(
            "heating.circuits.0.circulation.pump",
            json!({ "status": { "value": "on" }, "active": { "value": true } }),
        )]);
        let document = synthesize(&ctx, &store, None, &Topics::default());
        let component = document
            .components
            .get("heating_circuits_0_circulation_pump")
            .unwrap();
        assert_eq!(component.platform, Platform::BinarySensor);
        assert!(component
            .value_template
            .as_deref()
            .unwrap()
            .contains("value_json.active.value"));
    }

    #[test]
    fn should_template_bare_boolean_active_leaf_without_wrapper() {
        let ctx = context(DeviceVariant::Heating);
        let store = FeatureStore::new(vec![feature(
            "heating.circuits.0.circulation.pump",
            json!({ "active": true }),
        )]);
        let document = synthesize(&ctx, &store, None, &Topics::default());
        let component = document
            .components
            .get("heating_circuits_0_circulation_pump")
            .unwrap();
        assert_eq!(component.platform, Platform::BinarySensor);
        assert_eq!(
            component.value_template.as_deref(),
            Some("{% if value_json.active %}ON{% else %}OFF{% endif %}")
        );
    }

    #[test]
    fn should_fall_back_to_sensor_with_representative_property() {
        let ctx = context(DeviceVariant::Heating);
        let store = FeatureStore::new(vec![feature(
            "device.wifi",
            json!({ "strength": { "value": -62, "unit": "decibelMilliwatt" } }),
        )]);
        let document = synthesize(&ctx, &store, None, &Topics::default());
        let component = document.components.get("device_wifi").unwrap();
        assert_eq!(component.platform, Platform::Sensor);
        assert_eq!(component.device_class, Some(DeviceClass::SignalStrength));
        assert_eq!(component.unit_of_measurement.as_deref(), Some("dBm"));
    }

    #[test]
    fn should_not_assign_signal_class_to_percent_strength() {
        let ctx = context(DeviceVariant::Heating);
        let store = FeatureStore::new(vec![feature(
            "device.wifi",
            json!({ "strength": { "value": 74, "unit": "percent" } }),
        )]);
        let document = synthesize(&ctx, &store, None, &Topics::default());
        let component = document.components.get("device_wifi").unwrap();
        assert_eq!(component.device_class, None);
        assert_eq!(component.unit_of_measurement.as_deref(), Some("%"));
    }

    #[test]
    fn should_default_pressure_unit_to_bar_when_unit_invalid() {
        let ctx = context(DeviceVariant::Heating);
        let store = FeatureStore::new(vec![feature(
            "heating.sensors.pressure.supply",
            json!({ "value": { "value": 1.9 } }),
        )]);
        let document = synthesize(&ctx, &store, None, &Topics::default());
        let component = document
            .components
            .get("heating_sensors_pressure_supply")
            .unwrap();
        assert_eq!(component.device_class, Some(DeviceClass::Pressure));
        assert_eq!(component.unit_of_measurement.as_deref(), Some("bar"));
    }

    #[test]
    fn should_expand_multi_window_feature_into_one_sensor_per_window() {
        let ctx = context(DeviceVariant::Heating);
        let store = FeatureStore::new(vec![feature(
            "heating.power.consumption.dhw",
            json!({
                "day": { "value": [1.2], "unit": "kilowattHour" },
                "week": { "value": [8.4], "unit": "kilowattHour" }
            }),
        )]);
        let document = synthesize(&ctx, &store, None, &Topics::default());
        assert!(document
            .components
            .contains_key("heating_power_consumption_dhw_day"));
        assert!(document
            .components
            .contains_key("heating_power_consumption_dhw_week"));
        assert!(!document
            .components
            .contains_key("heating_power_consumption_dhw"));
    }

    #[test]
    fn should_expand_counter_shape_into_seven_sensors() {
        let mut properties = serde_json::Map::new();
        for slot in 1..=7 {
            properties.insert(format!("count{slot}"), json!({ "value": slot }));
            properties.insert(
                format!("timestamp{slot}"),
                json!({ "value": "2024-01-01T00:00:00Z" }),
            );
        }
        let ctx = context(DeviceVariant::Heating);
        let store = FeatureStore::new(vec![feature(
            "device.messages.errors.raw",
            serde_json::Value::Object(properties),
        )]);
        let document = synthesize(&ctx, &store, None, &Topics::default());
        for slot in 1..=7 {
            let key = format!("device_messages_errors_raw_count{slot}");
            let component = document.components.get(&key).unwrap();
            assert_eq!(component.entity_category, Some(EntityCategory::Diagnostic));
        }
    }

    #[test]
    fn should_expand_device_configuration_per_sub_property() {
        let ctx = context(DeviceVariant::Heating);
        let store = FeatureStore::new(vec![feature(
            "device.configuration",
            json!({
                "altitude": { "value": 320 },
                "houseType": { "value": "detached" }
            }),
        )]);
        let document = synthesize(&ctx, &store, None, &Topics::default());
        let altitude = document
            .components
            .get("device_configuration_altitude")
            .unwrap();
        assert_eq!(altitude.entity_category, Some(EntityCategory::Diagnostic));
        assert!(document
            .components
            .contains_key("device_configuration_house_type"));
    }

    #[test]
    fn should_skip_container_features() {
        let ctx = context(DeviceVariant::Heating);
        let store = FeatureStore::new(vec![
            feature("heating.circuits", json!({ "enabled": { "value": ["0"] } })),
            feature("heating.circuits.0", json!({ "name": { "value": "Main" } })),
        ]);
        let document = synthesize(&ctx, &store, None, &Topics::default());
        assert!(document.components.is_empty());
    }

    #[test]
    fn should_prefer_unit_bearing_numeric_over_array_candidate() {
        let ctx = context(DeviceVariant::Heating);
        let store = FeatureStore::new(vec![feature(
            "heating.buffer.charging.level",
            json!({
                "day": { "value": [3.0] },
                "value": { "value": 55, "unit": "percent" }
            }),
        )]);
        let document = synthesize(&ctx, &store, None, &Topics::default());
        let component = document
            .components
            .get("heating_buffer_charging_level")
            .unwrap();
        assert!(component
            .value_template
            .as_deref()
            .unwrap()
            .contains("value_json.value.value"));
    }
}
