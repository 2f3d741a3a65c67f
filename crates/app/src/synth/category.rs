//! Passes 7 and 8: entity categorization, enablement, and the final
//! container filter.

use heatlink_domain::discovery::{EntityCategory, Platform};

use super::{is_container_path, Builder};

/// Feature-path fragments that belong to service technicians, not end
/// users. Matching entities stay published but disabled by default.
static SERVICE_PATH_FRAGMENTS: &[&str] = &[
    ".configuration",
    ".screedDrying",
    ".hysteresis",
    ".minimumLimit",
    ".maximumLimit",
    ".defaultLimit",
    ".normalRange",
];

/// Read-only features that are useful but secondary: device health,
/// connectivity, and firmware details.
static DIAGNOSTIC_PATH_FRAGMENTS: &[&str] =
    &["status", "error", "signal", "firmware", "version", "wifi", "rssi"];

fn is_service_path(path: &str) -> bool {
    SERVICE_PATH_FRAGMENTS
        .iter()
        .any(|fragment| path.contains(fragment))
}

fn is_diagnostic_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    DIAGNOSTIC_PATH_FRAGMENTS
        .iter()
        .any(|fragment| lower.contains(fragment))
}

impl Builder<'_> {
    /// Pass 7: assign entity categories and default enablement.
    ///
    /// Read-only entities may never carry `config` (Home Assistant rejects
    /// the document), so service-technician sensors become diagnostic and
    /// disabled instead. Historical time windows are demoted to diagnostic
    /// but stay enabled.
    pub(crate) fn run_category_pass(&mut self) {
        let keys: Vec<String> = self.components.keys().cloned().collect();
        for key in keys {
            let Some(platform) = self.components.get(&key).map(|c| c.platform) else {
                continue;
            };
            if platform == Platform::Climate {
                continue;
            }
            let (path, property) = match self.backing.get(&key) {
                Some((path, property)) => (path.clone(), property.clone()),
                None => continue,
            };
            let service = is_service_path(&path) || self.service_controls.contains(&key);
            let Some(component) = self.components.get_mut(&key) else {
                continue;
            };
            if platform.is_read_only() {
                if service {
                    component.entity_category = Some(EntityCategory::Diagnostic);
                    component.enabled_by_default = Some(false);
                } else if is_diagnostic_path(&path)
                    || matches!(property.as_str(), "week" | "month" | "year")
                {
                    component.entity_category = Some(EntityCategory::Diagnostic);
                }
            } else if service {
                component.entity_category = Some(EntityCategory::Config);
                component.enabled_by_default = Some(false);
            }
        }
    }

    /// Pass 8: drop anything whose backing feature turned out to be a list
    /// or sub-entity container. Containers only supply ids and labels.
    pub(crate) fn run_container_filter_pass(&mut self) {
        let doomed: Vec<String> = self
            .components
            .keys()
            .filter(|key| {
                self.backing
                    .get(*key)
                    .is_some_and(|(path, _)| is_container_path(path))
            })
            .cloned()
            .collect();
        for key in doomed {
            tracing::debug!(key, "dropping container-backed component");
            self.components.remove(&key);
            self.backing.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use heatlink_domain::device::DeviceVariant;
    use heatlink_domain::discovery::{EntityCategory, Platform};
    use heatlink_domain::feature::store::FeatureStore;
    use serde_json::json;

    use crate::synth::testutil::{command, context, feature, numeric_param, with_command};
    use crate::synth::synthesize;
    use crate::topics::Topics;

    #[test]
    fn should_mark_hysteresis_control_config_and_disabled() {
        let ctx = context(DeviceVariant::Heating);
        let store = FeatureStore::new(vec![with_command(
            feature(
                "heating.dhw.temperature.hysteresis",
                json!({ "value": { "value": 5.0, "unit": "kelvin" } }),
            ),
            command(
                "setHysteresis",
                &[("hysteresis", numeric_param(1.0, 10.0, 0.5))],
            ),
        )]);
        let document = synthesize(&ctx, &store, None, &Topics::default());
        let control = document
            .components
            .get("heating_dhw_temperature_hysteresis")
            .unwrap();
        assert_eq!(control.platform, Platform::Number);
        assert_eq!(control.entity_category, Some(EntityCategory::Config));
        assert_eq!(control.enabled_by_default, Some(false));
    }

    #[test]
    fn should_mark_service_sensor_diagnostic_never_config() {
        let ctx = context(DeviceVariant::Heating);
        let store = FeatureStore::new(vec![feature(
            "heating.operating.programs.screedDrying",
            json!({ "value": { "value": 0 } }),
        )]);
        let document = synthesize(&ctx, &store, None, &Topics::default());
        let sensor = document
            .components
            .get("heating_operating_programs_screed_drying")
            .unwrap();
        assert_eq!(sensor.entity_category, Some(EntityCategory::Diagnostic));
        assert_eq!(sensor.enabled_by_default, Some(false));
    }

    #[test]
    fn should_mark_reset_button_config_and_disabled() {
        let ctx = context(DeviceVariant::Heating);
        let store = FeatureStore::new(vec![with_command(
            feature(
                "device.messages.errors.raw",
                json!({ "value": { "value": [] } }),
            ),
            command("reset", &[]),
        )]);
        let document = synthesize(&ctx, &store, None, &Topics::default());
        let button = document
            .components
            .get("device_messages_errors_raw_reset")
            .unwrap();
        assert_eq!(button.entity_category, Some(EntityCategory::Config));
        assert_eq!(button.enabled_by_default, Some(false));
    }

    #[test]
    fn should_keep_schedule_reset_button_uncategorized() {
        let ctx = context(DeviceVariant::Heating);
        let store = FeatureStore::new(vec![with_command(
            feature(
                "heating.circuits.0.heating.schedule",
                json!({ "active": { "value": true } }),
            ),
            command("reset", &[]),
        )]);
        let document = synthesize(&ctx, &store, None, &Topics::default());
        let button = document
            .components
            .get("heating_circuits_0_heating_schedule_reset")
            .unwrap();
        assert_eq!(button.entity_category, None);
        assert_eq!(button.enabled_by_default, None);
    }

    #[test]
    fn should_demote_historical_windows_to_diagnostic() {
        let ctx = context(DeviceVariant::GasBoiler);
        let store = FeatureStore::new(vec![feature(
            "heating.gas.consumption.total",
            json!({
                "day": { "value": [3.1], "unit": "kilowattHour" },
                "week": { "value": [18.0], "unit": "kilowattHour" }
            }),
        )]);
        let document = synthesize(&ctx, &store, None, &Topics::default());
        let day = document.components.get("gas_consumption_total").unwrap();
        assert_eq!(day.entity_category, None);
        let week = document
            .components
            .get("gas_consumption_total_week")
            .unwrap();
        assert_eq!(week.entity_category, Some(EntityCategory::Diagnostic));
    }

    #[test]
    fn should_drop_components_backed_by_containers() {
        let ctx = context(DeviceVariant::Heating);
        let store = FeatureStore::new(vec![with_command(
            feature("heating.burners.0", json!({ "active": { "value": false } })),
            command("reset", &[]),
        )]);
        let document = synthesize(&ctx, &store, None, &Topics::default());
        assert!(document.components.is_empty());
    }
}
