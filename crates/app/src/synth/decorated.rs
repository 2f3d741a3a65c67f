//! Passes 1 and 2: registry-declared sensors and their enhancement.

use heatlink_domain::discovery::{DeviceClass, Platform};
use heatlink_domain::names::snake_case;
use heatlink_domain::units::normalize_unit;

use super::{sensor_component, value_template_for, Builder};

/// Time-window sibling suffixes synthesized next to a `day`-shaped sensor.
static SIBLING_WINDOWS: &[&str] = &["week", "month", "year"];

/// Component key for a registry member: `getOutsideTemperature` →
/// `outside_temperature`.
pub(crate) fn member_key(member: &str) -> String {
    snake_case(member.strip_prefix("get").unwrap_or(member))
}

impl Builder<'_> {
    /// Pass 1: one sensor per `Sensor`-kind registry entry whose feature is
    /// present and enabled. Claims the feature path.
    pub(crate) fn run_decorated_pass(&mut self) {
        let entries: Vec<_> = self
            .registry
            .sensors()
            .map(|(member, meta)| (member, *meta))
            .collect();

        for (member, meta) in entries {
            let Some(feature) = self.store.lookup(meta.feature) else {
                continue;
            };
            if !feature.is_eligible() {
                continue;
            }
            let key = member_key(member);
            let name = self.display_name(meta.feature);
            let Some(mut component) =
                sensor_component(self, Platform::Sensor, &key, name, feature, meta.property)
            else {
                continue;
            };
            component.device_class = meta.device_class;
            component.state_class = meta.state_class;
            component.unit_of_measurement = meta.unit.map(ToString::to_string);

            let backing = (meta.feature.to_string(), meta.property.to_string());
            self.claim(meta.feature);
            self.insert(key, component, Some(backing));
        }
    }

    /// Pass 2: re-derive device class and unit from the *actual* backing
    /// property, and synthesize week/month/year siblings next to
    /// `day`-shaped sensors.
    pub(crate) fn run_enhancement_pass(&mut self) {
        let backed: Vec<(String, String, String)> = self
            .components
            .keys()
            .filter_map(|key| {
                let (path, property) = self.backing.get(key)?;
                Some((key.clone(), path.clone(), property.clone()))
            })
            .collect();

        for (key, path, property) in backed {
            self.enhance_component(&key, &path, &property);
            if property == "day" || property == "currentDay" {
                self.expand_time_windows(&key, &path);
            }
        }
    }

    fn enhance_component(&mut self, key: &str, path: &str, property: &str) {
        let Some(feature) = self.store.lookup(path) else {
            return;
        };
        let vendor_unit = feature.property_unit(property).map(ToString::to_string);
        let Some(component) = self.components.get_mut(key) else {
            return;
        };

        if path.contains("gas.consumption") {
            // Gas features report volume or energy depending on gateway
            // firmware; only watt-hour variants may carry the energy class.
            match vendor_unit
                .as_deref()
                .and_then(|u| normalize_unit(u, Some(DeviceClass::Energy)))
            {
                Some(display) => {
                    component.device_class = Some(DeviceClass::Energy);
                    component.unit_of_measurement = Some(display.to_string());
                }
                None => {
                    component.device_class = None;
                    component.unit_of_measurement = vendor_unit
                        .as_deref()
                        .and_then(|u| normalize_unit(u, None))
                        .map(ToString::to_string);
                }
            }
            return;
        }

        if path.contains(".power.production") && property == "value" {
            component.device_class = Some(DeviceClass::Power);
            if let Some(display) = vendor_unit.as_deref().and_then(|u| normalize_unit(u, None)) {
                component.unit_of_measurement = Some(display.to_string());
            }
            return;
        }

        let Some(vendor) = vendor_unit.as_deref() else {
            return;
        };
        match normalize_unit(vendor, component.device_class) {
            Some(display) => component.unit_of_measurement = Some(display.to_string()),
            None => {
                // The annotated unit is invalid for the declared class:
                // trust the data over the static metadata.
                if matches!(
                    component.device_class,
                    Some(DeviceClass::Energy | DeviceClass::Pressure)
                ) {
                    component.device_class = None;
                    component.unit_of_measurement =
                        normalize_unit(vendor, None).map(ToString::to_string);
                }
            }
        }
    }

    fn expand_time_windows(&mut self, key: &str, path: &str) {
        let Some(feature) = self.store.lookup(path).cloned() else {
            return;
        };
        let Some(base) = self.components.get(key).cloned() else {
            return;
        };
        for window in SIBLING_WINDOWS {
            if feature.property_node(window).is_none() {
                continue;
            }
            let Some(template) = value_template_for(&feature, window) else {
                continue;
            };
            let sibling_key = format!("{key}_{window}");
            let mut sibling = base.clone();
            sibling.unique_id = self.unique_id(&sibling_key);
            sibling.name = format!("{} {window}", base.name);
            sibling.value_template = Some(template);
            self.insert(
                sibling_key,
                sibling,
                Some((path.to_string(), (*window).to_string())),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use heatlink_domain::device::DeviceVariant;
    use heatlink_domain::discovery::DeviceClass;
    use heatlink_domain::feature::store::FeatureStore;
    use serde_json::json;

    use crate::synth::testutil::{context, disabled_feature, feature};
    use crate::synth::{synthesize, DeviceContext};
    use crate::topics::Topics;

    fn synthesize_for(
        ctx: &DeviceContext,
        features: Vec<heatlink_domain::feature::Feature>,
    ) -> heatlink_domain::discovery::DiscoveryDocument {
        let store = FeatureStore::new(features);
        synthesize(ctx, &store, None, &Topics::default())
    }

    #[test]
    fn should_emit_declared_sensor_for_enabled_feature() {
        let ctx = context(DeviceVariant::Heating);
        let document = synthesize_for(
            &ctx,
            vec![feature(
                "heating.sensors.temperature.outside",
                json!({ "value": { "value": -3.5, "unit": "celsius" } }),
            )],
        );
        let component = document.components.get("outside_temperature").unwrap();
        assert_eq!(component.device_class, Some(DeviceClass::Temperature));
        assert_eq!(component.unit_of_measurement.as_deref(), Some("°C"));
        assert_eq!(
            component.value_template.as_deref(),
            Some("{{ value_json.value.value }}")
        );
    }

    #[test]
    fn should_skip_declared_sensor_for_disabled_feature() {
        let ctx = context(DeviceVariant::Heating);
        let document = synthesize_for(
            &ctx,
            vec![disabled_feature(
                "heating.sensors.temperature.outside",
                json!({ "value": { "value": -3.5 } }),
            )],
        );
        assert!(!document.components.contains_key("outside_temperature"));
    }

    #[test]
    fn should_prefix_unique_id_with_device_address() {
        let ctx = context(DeviceVariant::Heating);
        let document = synthesize_for(
            &ctx,
            vec![feature(
                "heating.sensors.temperature.outside",
                json!({ "value": { "value": 1.0 } }),
            )],
        );
        let component = document.components.get("outside_temperature").unwrap();
        assert_eq!(
            component.unique_id,
            "heatlink_100_200_0_outside_temperature"
        );
    }
}
