//! Feature — a vendor sensor/command descriptor with a dynamic property tree.
//!
//! The vendor API describes a device as a flat list of features, each
//! identified by a dotted path (`heating.circuits.0.sensors.temperature.room`).
//! Properties are a heterogeneous JSON tree; leaves are usually wrapped as
//! `{"type": "number", "value": 21.5, "unit": "celsius"}` but nothing in the
//! schema guarantees that shape, so all access is defensive.

pub mod store;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single vendor feature: one node of the device's capability tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Dotted feature path, e.g. `heating.circuits.0.operating.modes.active`.
    pub path: String,
    /// Whether the vendor reports this feature as enabled on the device.
    #[serde(default)]
    pub is_enabled: bool,
    /// Whether the feature's data is ready to be read.
    #[serde(default)]
    pub is_ready: bool,
    /// Raw property tree as delivered by the vendor.
    #[serde(default)]
    pub properties: serde_json::Map<String, Value>,
    /// Executable operations exposed by this feature, keyed by command name.
    #[serde(default)]
    pub commands: BTreeMap<String, Command>,
}

impl Feature {
    /// Whether this feature may produce discovery components at all:
    /// enabled and owning at least one property key.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.is_enabled && !self.properties.is_empty()
    }

    /// Read the raw node at a dot-separated path, without unwrapping.
    ///
    /// Returns `None` the instant a segment is missing or the current node
    /// is not an object.
    #[must_use]
    pub fn property_node(&self, property_path: &str) -> Option<&Value> {
        let (first, rest) = match property_path.split_once('.') {
            Some((first, rest)) => (first, Some(rest)),
            None => (property_path, None),
        };
        let node = self.properties.get(first)?;
        match rest {
            Some(rest) => walk(node, rest),
            None => Some(node),
        }
    }

    /// Read a property by dot-separated path.
    ///
    /// When the terminal node is an object containing a `value` key, that
    /// key is unwrapped and returned instead — call sites rely on "last
    /// segment may point either at a leaf or at a `{value, unit}` wrapper"
    /// being handled transparently.
    #[must_use]
    pub fn property(&self, property_path: &str) -> Option<&Value> {
        let mut current = self.property_node(property_path)?;
        if let Value::Object(map) = current {
            if let Some(inner) = map.get("value") {
                current = inner;
            }
        }
        Some(current)
    }

    /// Read the vendor `unit` annotation next to a property, if any.
    ///
    /// For a path pointing at a `{value, unit}` wrapper this returns the
    /// wrapper's `unit`; for a bare leaf it returns `None`.
    #[must_use]
    pub fn property_unit(&self, property_path: &str) -> Option<&str> {
        self.property_node(property_path)?
            .as_object()?
            .get("unit")?
            .as_str()
    }

    /// The feature's executable commands, in stable (sorted) order.
    pub fn executable_commands(&self) -> impl Iterator<Item = &Command> {
        self.commands.values().filter(|c| c.is_executable)
    }
}

fn walk<'a>(mut node: &'a Value, path: &str) -> Option<&'a Value> {
    for segment in path.split('.') {
        node = node.as_object()?.get(segment)?;
    }
    Some(node)
}

/// An executable vendor operation attached to a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
    #[serde(default)]
    pub is_executable: bool,
    /// Parameters keyed by name, in stable (sorted) order.
    #[serde(default)]
    pub params: BTreeMap<String, CommandParam>,
}

impl Command {
    /// The sole parameter, when the command takes exactly one.
    #[must_use]
    pub fn single_param(&self) -> Option<(&str, &CommandParam)> {
        if self.params.len() == 1 {
            self.params.iter().next().map(|(k, v)| (k.as_str(), v))
        } else {
            None
        }
    }
}

/// A single command parameter with its vendor-declared constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandParam {
    /// Vendor type tag: `number`, `string`, `boolean`, `Schedule`, …
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
}

impl CommandParam {
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.param_type == "number"
    }

    #[must_use]
    pub fn is_boolean(&self) -> bool {
        self.param_type == "boolean"
    }

    /// The enum constraint values, when this is an enumerated string param.
    #[must_use]
    pub fn enum_values(&self) -> Option<&[String]> {
        match &self.constraints {
            Some(Constraints::Enum { values }) if !values.is_empty() => Some(values),
            _ => None,
        }
    }
}

/// Vendor parameter constraints: either a numeric range or a string enum.
///
/// Untagged, so the enum variant (which requires the `enum` key) must be
/// tried before the numeric one, whose fields are all optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Constraints {
    Enum {
        #[serde(rename = "enum")]
        values: Vec<String>,
    },
    Numeric {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stepping: Option<f64>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature_with(properties: Value) -> Feature {
        Feature {
            path: "heating.sensors.temperature.outside".to_string(),
            is_enabled: true,
            is_ready: true,
            properties: properties.as_object().cloned().unwrap_or_default(),
            commands: BTreeMap::new(),
        }
    }

    #[test]
    fn should_unwrap_value_wrapper_on_terminal_segment() {
        let feature = feature_with(json!({
            "value": { "type": "number", "value": -3.2, "unit": "celsius" }
        }));
        assert_eq!(feature.property("value"), Some(&json!(-3.2)));
    }

    #[test]
    fn should_return_bare_leaf_without_wrapper() {
        let feature = feature_with(json!({ "active": { "value": true } }));
        assert_eq!(feature.property("active"), Some(&json!(true)));
    }

    #[test]
    fn should_walk_nested_segments() {
        let feature = feature_with(json!({
            "day": { "value": [12.5, 11.0], "unit": "kilowattHour" }
        }));
        assert_eq!(feature.property("day"), Some(&json!([12.5, 11.0])));
    }

    #[test]
    fn should_return_none_when_segment_missing() {
        let feature = feature_with(json!({ "value": { "value": 1 } }));
        assert_eq!(feature.property("slope"), None);
        assert_eq!(feature.property("value.missing.deep"), None);
    }

    #[test]
    fn should_return_none_when_intermediate_is_not_object() {
        let feature = feature_with(json!({ "value": 3 }));
        assert_eq!(feature.property("value.inner"), None);
    }

    #[test]
    fn should_read_unit_annotation() {
        let feature = feature_with(json!({
            "day": { "value": [12.5], "unit": "cubicMeter" }
        }));
        assert_eq!(feature.property_unit("day"), Some("cubicMeter"));
        assert_eq!(feature.property_unit("week"), None);
    }

    #[test]
    fn should_report_eligibility_only_when_enabled_with_properties() {
        let mut feature = feature_with(json!({ "value": { "value": 1 } }));
        assert!(feature.is_eligible());
        feature.is_enabled = false;
        assert!(!feature.is_eligible());
        feature.is_enabled = true;
        feature.properties.clear();
        assert!(!feature.is_eligible());
    }

    #[test]
    fn should_expose_single_param() {
        let command = Command {
            name: "setMode".to_string(),
            is_executable: true,
            params: BTreeMap::from([(
                "mode".to_string(),
                CommandParam {
                    param_type: "string".to_string(),
                    required: true,
                    constraints: Some(Constraints::Enum {
                        values: vec!["standby".to_string(), "heating".to_string()],
                    }),
                },
            )]),
        };
        let (name, param) = command.single_param().unwrap();
        assert_eq!(name, "mode");
        assert_eq!(
            param.enum_values(),
            Some(&["standby".to_string(), "heating".to_string()][..])
        );
    }

    #[test]
    fn should_deserialize_numeric_constraints_from_vendor_json() {
        let param: CommandParam = serde_json::from_value(json!({
            "type": "number",
            "required": true,
            "constraints": { "min": 3.0, "max": 37.0, "stepping": 1.0 }
        }))
        .unwrap();
        assert!(param.is_numeric());
        match param.constraints.unwrap() {
            Constraints::Numeric { min, max, stepping } => {
                assert_eq!(min, Some(3.0));
                assert_eq!(max, Some(37.0));
                assert_eq!(stepping, Some(1.0));
            }
            Constraints::Enum { .. } => panic!("expected numeric constraints"),
        }
    }

    #[test]
    fn should_deserialize_enum_constraints_from_vendor_json() {
        let param: CommandParam = serde_json::from_value(json!({
            "type": "string",
            "required": true,
            "constraints": { "enum": ["standby", "heating"] }
        }))
        .unwrap();
        assert_eq!(
            param.enum_values(),
            Some(&["standby".to_string(), "heating".to_string()][..])
        );
    }
}
