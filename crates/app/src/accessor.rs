//! Property accessors — registry-driven value retrieval.
//!
//! A member read (`getActiveProgram` on circuit 1) re-evaluates against the
//! current feature store on every call; features are immutable for the
//! lifetime of one device instance, so no caching is needed and call sites
//! stay simple.

use heatlink_domain::feature::store::FeatureStore;
use serde_json::Value;

use crate::registry::{Metadata, VariantRegistry};

/// Substitute the positional `{}` placeholder with a sub-entity id.
#[must_use]
pub fn substitute_id(template: &str, id: Option<u32>) -> String {
    match id {
        Some(id) => template.replacen("{}", &id.to_string(), 1),
        None => template.to_string(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Number(_) | Value::Object(_) => true,
    }
}

fn dependent_segment(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Registry-driven evaluator bound to one device's feature store.
#[derive(Debug, Clone, Copy)]
pub struct Accessor<'a> {
    registry: &'static VariantRegistry,
    store: &'a FeatureStore,
}

impl<'a> Accessor<'a> {
    #[must_use]
    pub fn new(registry: &'static VariantRegistry, store: &'a FeatureStore) -> Self {
        Self { registry, store }
    }

    /// Resolve the member's backing `(feature path, property path)` without
    /// reading the value. Dependent members resolve their dependency first,
    /// so the returned path reflects the *current* dependent value.
    #[must_use]
    pub fn resolve_target(&self, member: &str, id: Option<u32>) -> Option<(String, &'static str)> {
        match self.registry.metadata_for(member)? {
            Metadata::Sensor(meta) => Some((meta.feature.to_string(), meta.property)),
            Metadata::CircuitSensor(meta) | Metadata::BurnerSensor(meta) => {
                Some((substitute_id(meta.feature_template, id), meta.property))
            }
            Metadata::Retrieval(meta) => {
                Some((substitute_id(meta.feature_template, id), meta.property))
            }
            Metadata::Dependent(meta) => {
                let dependent = self.retrieve(meta.depends_on, id)?;
                let passes = meta.guard.map_or_else(|| truthy(&dependent), |g| g(&dependent));
                if !passes {
                    return None;
                }
                let segment = dependent_segment(&dependent)?;
                let path = substitute_id(meta.feature_template, id).replacen("{dep}", &segment, 1);
                Some((path, meta.property))
            }
            Metadata::CircuitClimate(_) | Metadata::HeatingCurve(_) | Metadata::TimeSeries(_) => {
                None
            }
        }
    }

    /// Read the member's current value against the store.
    ///
    /// Absent features, absent properties, failed guards, and disabled
    /// features all resolve to `None` — absence is a value here, never an
    /// error.
    #[must_use]
    pub fn retrieve(&self, member: &str, id: Option<u32>) -> Option<Value> {
        let boolean = matches!(
            self.registry.metadata_for(member)?,
            Metadata::Retrieval(meta) if meta.boolean
        );
        let (path, property) = self.resolve_target(member, id)?;
        let value = self.store.value(&path, property)?;
        if boolean {
            Some(Value::Bool(truthy(value)))
        } else {
            Some(value.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heatlink_domain::device::DeviceVariant;
    use heatlink_domain::feature::Feature;
    use serde_json::json;

    use crate::registry::registry_for;

    fn feature(path: &str, properties: Value) -> Feature {
        Feature {
            path: path.to_string(),
            is_enabled: true,
            is_ready: true,
            properties: properties.as_object().cloned().unwrap_or_default(),
            commands: std::collections::BTreeMap::new(),
        }
    }

    fn store() -> FeatureStore {
        FeatureStore::new(vec![
            feature(
                "heating.circuits.1",
                json!({ "name": { "value": "Ground floor" } }),
            ),
            feature(
                "heating.circuits.1.operating.programs.active",
                json!({ "value": { "value": "comfort" } }),
            ),
            feature(
                "heating.circuits.1.operating.programs.comfort",
                json!({ "temperature": { "value": 21.0, "unit": "celsius" } }),
            ),
        ])
    }

    #[test]
    fn should_retrieve_templated_property() {
        let store = store();
        let accessor = Accessor::new(registry_for(DeviceVariant::Heating), &store);
        assert_eq!(
            accessor.retrieve("getCircuitName", Some(1)),
            Some(json!("Ground floor"))
        );
    }

    #[test]
    fn should_resolve_dependent_property_through_active_program() {
        let store = store();
        let accessor = Accessor::new(registry_for(DeviceVariant::Heating), &store);
        assert_eq!(
            accessor.retrieve("getDesiredTemperature", Some(1)),
            Some(json!(21.0))
        );
    }

    #[test]
    fn should_resolve_dependent_target_path() {
        let store = store();
        let accessor = Accessor::new(registry_for(DeviceVariant::Heating), &store);
        let (path, property) = accessor.resolve_target("getDesiredTemperature", Some(1)).unwrap();
        assert_eq!(path, "heating.circuits.1.operating.programs.comfort");
        assert_eq!(property, "temperature");
    }

    #[test]
    fn should_fail_guard_when_program_is_standby() {
        let standby_store = FeatureStore::new(vec![feature(
            "heating.circuits.1.operating.programs.active",
            json!({ "value": { "value": "standby" } }),
        )]);
        let accessor = Accessor::new(registry_for(DeviceVariant::Heating), &standby_store);
        assert_eq!(accessor.retrieve("getDesiredTemperature", Some(1)), None);
    }

    #[test]
    fn should_return_none_when_dependency_is_absent() {
        let empty = FeatureStore::new(vec![]);
        let accessor = Accessor::new(registry_for(DeviceVariant::Heating), &empty);
        assert_eq!(accessor.retrieve("getDesiredTemperature", Some(1)), None);
    }

    #[test]
    fn should_return_none_for_unknown_member() {
        let store = store();
        let accessor = Accessor::new(registry_for(DeviceVariant::Heating), &store);
        assert_eq!(accessor.retrieve("getWarpDrive", None), None);
    }
}
