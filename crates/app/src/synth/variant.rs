//! Pass 3: variant-specific templated expansion.
//!
//! Circuits, heating curves, burners/compressors, and declared time-series
//! all expand over dynamically discovered id lists. A templated component
//! is skipped when its backing feature is absent/disabled or its required
//! property does not exist; every feature path touched is claimed so the
//! auto-detection pass leaves it alone.

use heatlink_domain::discovery::{Component, DeviceClass, Platform, StateClass};
use heatlink_domain::units::normalize_unit;

use super::decorated::member_key;
use super::{sensor_component, value_template_for, Builder};
use crate::accessor::substitute_id;
use crate::registry::TimeSeriesMeta;

/// Time windows a consumption/production feature may report.
pub(crate) static TIME_WINDOWS: &[&str] = &["day", "week", "month", "year"];

/// Map a vendor operating mode onto Home Assistant's canonical vocabulary.
pub(crate) fn ha_mode_for(vendor_mode: &str) -> &'static str {
    let lower = vendor_mode.to_ascii_lowercase();
    if lower == "standby" || lower == "off" || lower.contains("reduced") {
        "off"
    } else if lower.contains("heating") || lower.contains("normal") || lower.contains("comfort") {
        "heat"
    } else {
        "auto"
    }
}

/// Energy class/unit derivation shared by gas and power time-series: only
/// watt-hour variants keep the declared energy class, anything else drops
/// the class and keeps the plain display unit.
fn derive_windowed_class(
    declared: Option<DeviceClass>,
    fallback_unit: Option<&'static str>,
    vendor_unit: Option<&str>,
) -> (Option<DeviceClass>, Option<String>) {
    let Some(vendor) = vendor_unit else {
        return (declared, fallback_unit.map(ToString::to_string));
    };
    match declared {
        Some(DeviceClass::Energy) => match normalize_unit(vendor, Some(DeviceClass::Energy)) {
            Some(display) => (Some(DeviceClass::Energy), Some(display.to_string())),
            None => (None, normalize_unit(vendor, None).map(ToString::to_string)),
        },
        other => (
            other,
            normalize_unit(vendor, None)
                .map(ToString::to_string)
                .or_else(|| fallback_unit.map(ToString::to_string)),
        ),
    }
}

impl Builder<'_> {
    pub(crate) fn run_variant_pass(&mut self) {
        self.expand_circuit_sensors();
        self.expand_heating_curves();
        self.expand_climates();
        self.expand_burner_sensors();
        self.expand_time_series();
    }

    /// Display label for a circuit: its vendor-assigned name when one
    /// resolves, a positional fallback otherwise.
    pub(crate) fn circuit_label(&self, id: u32) -> String {
        self.accessor
            .retrieve("getCircuitName", Some(id))
            .and_then(|v| v.as_str().map(ToString::to_string))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("Circuit {id}"))
    }

    fn expand_circuit_sensors(&mut self) {
        let entries: Vec<_> = self
            .registry
            .circuit_sensors()
            .map(|(_, meta)| *meta)
            .collect();
        for meta in entries {
            for id in self.store.available_ids(meta.id_source) {
                let path = substitute_id(meta.feature_template, Some(id));
                let Some(feature) = self.store.lookup(&path) else {
                    continue;
                };
                let key = substitute_id(meta.key_template, Some(id));
                let label = self.circuit_label(id);
                let name = meta.name_template.replacen("{}", &label, 1);
                let Some(mut component) = sensor_component(
                    self,
                    Platform::Sensor,
                    &key,
                    name,
                    feature,
                    meta.property,
                ) else {
                    continue;
                };
                component.device_class = meta.device_class;
                component.state_class = meta.state_class;
                component.unit_of_measurement = meta.unit.map(ToString::to_string);
                let backing = (path.clone(), meta.property.to_string());
                self.claim(&path);
                self.insert(key, component, Some(backing));
            }
        }
    }

    fn expand_heating_curves(&mut self) {
        let entries: Vec<_> = self
            .registry
            .heating_curves()
            .map(|(_, meta)| *meta)
            .collect();
        for meta in entries {
            for id in self.store.available_ids(meta.id_source) {
                let path = substitute_id(meta.feature_template, Some(id));
                let Some(feature) = self.store.lookup(&path) else {
                    continue;
                };
                let label = self.circuit_label(id);
                for property in ["slope", "shift"] {
                    let key = format!("{}_{property}", substitute_id(meta.key_template, Some(id)));
                    let name = format!("{label} heating curve {property}");
                    let Some(component) = sensor_component(
                        self,
                        Platform::Sensor,
                        &key,
                        name,
                        feature,
                        property,
                    ) else {
                        continue;
                    };
                    let backing = (path.clone(), property.to_string());
                    self.insert(key, component, Some(backing));
                }
                self.claim(&path);
            }
        }
    }

    fn expand_climates(&mut self) {
        let entries: Vec<_> = self.registry.climates().map(|(_, meta)| *meta).collect();
        for meta in entries {
            for id in self.store.available_ids(meta.id_source) {
                let mode_path = substitute_id(meta.mode_feature_template, Some(id));
                let Some(mode_feature) = self.store.lookup(&mode_path).cloned() else {
                    continue;
                };
                if mode_feature.property("value").is_none() {
                    continue;
                }

                let vendor_modes: Vec<String> = mode_feature
                    .commands
                    .values()
                    .find(|c| c.name == "setMode" || c.single_param().is_some_and(|(n, _)| n == "mode"))
                    .and_then(|c| c.single_param())
                    .and_then(|(_, p)| p.enum_values())
                    .map(<[String]>::to_vec)
                    .unwrap_or_default();

                let mut modes: Vec<String> = Vec::new();
                for vendor_mode in &vendor_modes {
                    let mapped = ha_mode_for(vendor_mode).to_string();
                    if !modes.contains(&mapped) {
                        modes.push(mapped);
                    }
                }
                for required in ["off", "heat"] {
                    if !modes.iter().any(|m| m == required) {
                        modes.push(required.to_string());
                    }
                }

                let key = substitute_id(meta.key_template, Some(id));
                let label = self.circuit_label(id);
                let mut component =
                    Component::new(Platform::Climate, self.unique_id(&key), label);
                component.modes = Some(modes);
                component.mode_state_topic = Some(self.state_topic(&mode_path));
                component.mode_state_template = Some(mode_state_template(&vendor_modes));

                if let Some((current_path, current_property)) = self
                    .accessor
                    .resolve_target(meta.current_temperature_member, Some(id))
                {
                    if let Some(current_feature) = self.store.lookup(&current_path) {
                        if let Some(template) =
                            value_template_for(current_feature, current_property)
                        {
                            component.current_temperature_topic =
                                Some(self.state_topic(&current_path));
                            component.current_temperature_template = Some(template);
                            self.claim(&current_path);
                        }
                    }
                }

                if let Some((target_path, target_property)) = self
                    .accessor
                    .resolve_target(meta.target_temperature_member, Some(id))
                {
                    if let Some(target_feature) = self.store.lookup(&target_path) {
                        if let Some(template) = value_template_for(target_feature, target_property)
                        {
                            component.temperature_state_topic =
                                Some(self.state_topic(&target_path));
                            component.temperature_state_template = Some(template);
                            self.claim(&target_path);
                        }
                    }
                }

                let backing = (mode_path.clone(), "value".to_string());
                self.claim(&mode_path);
                self.insert(key, component, Some(backing));
            }
        }
    }

    fn expand_burner_sensors(&mut self) {
        let entries: Vec<_> = self
            .registry
            .burner_sensors()
            .map(|(_, meta)| *meta)
            .collect();
        for meta in entries {
            for id in self.store.available_ids(meta.id_source) {
                let path = substitute_id(meta.feature_template, Some(id));
                let Some(feature) = self.store.lookup(&path) else {
                    continue;
                };
                let key = substitute_id(meta.key_template, Some(id));
                let name = meta.name_template.replacen("{}", &id.to_string(), 1);
                let Some(mut component) = sensor_component(
                    self,
                    Platform::Sensor,
                    &key,
                    name,
                    feature,
                    meta.property,
                ) else {
                    continue;
                };
                component.device_class = meta.device_class;
                component.state_class = meta.state_class;
                component.unit_of_measurement = meta.unit.map(ToString::to_string);
                let backing = (path.clone(), meta.property.to_string());
                self.claim(&path);
                self.insert(key, component, Some(backing));
            }
        }
    }

    fn expand_time_series(&mut self) {
        let entries: Vec<(&'static str, TimeSeriesMeta)> = self
            .registry
            .time_series()
            .map(|(member, meta)| (member, *meta))
            .collect();
        for (member, meta) in entries {
            let Some(feature) = self.store.lookup(meta.feature).cloned() else {
                continue;
            };
            let base_key = member_key(member);
            let base_name = self.display_name(meta.feature);
            let mut touched = false;
            for window in TIME_WINDOWS {
                if feature.property_node(window).is_none() {
                    continue;
                }
                let (key, name) = if *window == "day" {
                    (base_key.clone(), base_name.clone())
                } else {
                    (format!("{base_key}_{window}"), format!("{base_name} {window}"))
                };
                let Some(mut component) = sensor_component(
                    self,
                    Platform::Sensor,
                    &key,
                    name,
                    &feature,
                    window,
                ) else {
                    continue;
                };
                let vendor_unit = feature.property_unit(window);
                let (device_class, unit) =
                    derive_windowed_class(meta.device_class, meta.unit, vendor_unit);
                component.device_class = device_class;
                component.unit_of_measurement = unit;
                component.state_class = Some(StateClass::TotalIncreasing);
                let backing = (meta.feature.to_string(), (*window).to_string());
                self.insert(key, component, Some(backing));
                touched = true;
            }
            if touched {
                self.claim(meta.feature);
            }
        }
    }
}

/// Template translating the vendor mode string in the state payload to
/// Home Assistant's `off|heat|auto` vocabulary.
fn mode_state_template(vendor_modes: &[String]) -> String {
    let mut template = String::from("{% set mode = value_json.value.value %}");
    let mut first = true;
    for vendor_mode in vendor_modes {
        let keyword = if first { "if" } else { "elif" };
        template.push_str(&format!(
            "{{% {keyword} mode == '{vendor_mode}' %}}{}",
            ha_mode_for(vendor_mode)
        ));
        first = false;
    }
    if first {
        // No enum available; fall back to the shared vocabulary rules.
        template.push_str("{% if mode == 'standby' %}off{% elif 'heating' in mode %}heat");
    }
    template.push_str("{% else %}auto{% endif %}");
    template
}
