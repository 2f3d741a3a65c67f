//! Feature store — read-only index over one device's feature list.
//!
//! Built once per device from the fetched feature list and never mutated
//! afterwards; a store instance is exclusively owned by the device it was
//! constructed for, so no synchronization is needed.

use std::collections::HashMap;

use super::Feature;

/// In-memory map from feature path to feature record.
///
/// Iteration order always follows the input list order — discovery output
/// must be reproducible across runs for payload diffing.
#[derive(Debug, Clone, Default)]
pub struct FeatureStore {
    features: Vec<Feature>,
    index: HashMap<String, usize>,
}

impl FeatureStore {
    /// Build a store from the vendor feature list, keeping list order.
    ///
    /// Duplicate paths keep the first occurrence; the vendor API does not
    /// produce duplicates in practice.
    #[must_use]
    pub fn new(features: Vec<Feature>) -> Self {
        let mut index = HashMap::with_capacity(features.len());
        for (position, feature) in features.iter().enumerate() {
            index.entry(feature.path.clone()).or_insert(position);
        }
        Self { features, index }
    }

    /// Look up an enabled feature by path.
    ///
    /// Returns `None` both when the path is unknown and when the feature
    /// exists but is disabled — callers cannot distinguish "missing" from
    /// "disabled", both mean "do not surface".
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Feature> {
        let feature = &self.features[*self.index.get(path)?];
        feature.is_enabled.then_some(feature)
    }

    /// Convenience: read a property of an enabled feature in one step.
    #[must_use]
    pub fn value(&self, path: &str, property_path: &str) -> Option<&serde_json::Value> {
        self.lookup(path)?.property(property_path)
    }

    /// All features in input order, enabled or not.
    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Ids of repeated sub-entities under a list container, in ascending
    /// numeric order.
    ///
    /// For `heating.circuits` this scans for enabled `heating.circuits.{n}`
    /// features and collects each `n`. The container feature itself does
    /// not need to exist (some gateway firmwares omit it).
    #[must_use]
    pub fn available_ids(&self, container_path: &str) -> Vec<u32> {
        let prefix = format!("{container_path}.");
        let mut ids: Vec<u32> = self
            .features
            .iter()
            .filter(|f| f.is_enabled)
            .filter_map(|f| f.path.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('.'))
            .filter_map(|rest| rest.parse().ok())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

impl<'a> IntoIterator for &'a FeatureStore {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(path: &str, enabled: bool) -> Feature {
        Feature {
            path: path.to_string(),
            is_enabled: enabled,
            is_ready: true,
            properties: json!({ "value": { "value": 1 } })
                .as_object()
                .cloned()
                .unwrap(),
            commands: std::collections::BTreeMap::new(),
        }
    }

    #[test]
    fn should_find_enabled_feature_by_path() {
        let store = FeatureStore::new(vec![feature("heating.boiler.serial", true)]);
        assert!(store.lookup("heating.boiler.serial").is_some());
    }

    #[test]
    fn should_hide_disabled_feature_from_lookup() {
        let store = FeatureStore::new(vec![feature("heating.boiler.serial", false)]);
        assert!(store.lookup("heating.boiler.serial").is_none());
    }

    #[test]
    fn should_return_none_for_unknown_path() {
        let store = FeatureStore::new(vec![]);
        assert!(store.lookup("heating.unknown").is_none());
    }

    #[test]
    fn should_read_value_through_store() {
        let store = FeatureStore::new(vec![feature("heating.boiler.serial", true)]);
        assert_eq!(
            store.value("heating.boiler.serial", "value"),
            Some(&json!(1))
        );
    }

    #[test]
    fn should_collect_available_ids_in_ascending_order() {
        let store = FeatureStore::new(vec![
            feature("heating.circuits", true),
            feature("heating.circuits.2", true),
            feature("heating.circuits.0", true),
            feature("heating.circuits.0.heating.curve", true),
            feature("heating.circuits.1", false),
        ]);
        assert_eq!(store.available_ids("heating.circuits"), vec![0, 2]);
    }

    #[test]
    fn should_keep_input_order_when_iterating() {
        let store = FeatureStore::new(vec![
            feature("b.second", true),
            feature("a.first", true),
        ]);
        let paths: Vec<&str> = store.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["b.second", "a.first"]);
    }
}
