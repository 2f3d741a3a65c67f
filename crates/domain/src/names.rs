//! Human-readable entity names derived from feature paths.
//!
//! Preference order: an exact (or circuit-normalized) hit in the externally
//! supplied name catalog, then a heuristic derivation that strips structural
//! path segments and title-cases the remainder. The heuristic is a fallback
//! for features the catalog has never seen; a miss is a normal case, not an
//! error.

use std::collections::HashMap;

/// Path segments that carry no meaning for display names.
static STRUCTURAL_SEGMENTS: &[&str] = &[
    "heating",
    "sensors",
    "value",
    "active",
    "status",
    "settings",
    "levels",
    "temperature",
    "consumption",
    "pressure",
];

/// Externally supplied static catalog: feature path → display title.
#[derive(Debug, Clone, Default)]
pub struct NameCatalog {
    entries: HashMap<String, String>,
}

impl NameCatalog {
    #[must_use]
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    /// Exact lookup, then a circuit-normalized retry with every numeric
    /// path segment collapsed to `0` (catalog entries are written against
    /// circuit 0).
    #[must_use]
    pub fn lookup(&self, feature_path: &str) -> Option<&str> {
        if let Some(title) = self.entries.get(feature_path) {
            return Some(title);
        }
        let normalized = normalize_ids(feature_path);
        self.entries.get(&normalized).map(String::as_str)
    }
}

fn normalize_ids(path: &str) -> String {
    path.split('.')
        .map(|segment| {
            if segment.chars().all(|c| c.is_ascii_digit()) {
                "0"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// Derive a display name for a feature path.
///
/// Tries the catalog first; otherwise strips structural segments and
/// digits, splits camelCase words, title-cases the result, and appends a
/// category suffix (`Temperature` / `Consumption` / `Pressure`) when the
/// path implies one the derived name omits.
#[must_use]
pub fn human_name(feature_path: &str, catalog: Option<&NameCatalog>) -> String {
    if let Some(title) = catalog.and_then(|c| c.lookup(feature_path)) {
        return title.to_string();
    }

    let words: Vec<String> = feature_path
        .split('.')
        .filter(|segment| !STRUCTURAL_SEGMENTS.contains(segment))
        .filter(|segment| !segment.chars().all(|c| c.is_ascii_digit()))
        .flat_map(split_camel)
        .map(|word| title_case(&word))
        .collect();

    let mut name = if words.is_empty() {
        title_case(feature_path)
    } else {
        words.join(" ")
    };

    for (marker, suffix) in [
        ("temperature", "Temperature"),
        ("consumption", "Consumption"),
        ("pressure", "Pressure"),
    ] {
        if feature_path.to_ascii_lowercase().contains(marker)
            && !name.to_ascii_lowercase().contains(marker)
        {
            name.push(' ');
            name.push_str(suffix);
            break;
        }
    }

    name
}

/// Convert a camelCase member name to snake_case (component-key form).
#[must_use]
pub fn snake_case(member: &str) -> String {
    let mut out = String::with_capacity(member.len() + 4);
    for c in member.chars() {
        if c.is_ascii_uppercase() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if c == '.' || c == ' ' || c == '-' {
            if !out.ends_with('_') {
                out.push('_');
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn split_camel(segment: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    for c in segment.chars() {
        if c.is_ascii_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(c.to_ascii_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_prefer_catalog_title_when_present() {
        let catalog = NameCatalog::new(HashMap::from([(
            "heating.sensors.temperature.outside".to_string(),
            "Outside Temperature".to_string(),
        )]));
        assert_eq!(
            human_name("heating.sensors.temperature.outside", Some(&catalog)),
            "Outside Temperature"
        );
    }

    #[test]
    fn should_normalize_circuit_id_for_catalog_lookup() {
        let catalog = NameCatalog::new(HashMap::from([(
            "heating.circuits.0.sensors.temperature.room".to_string(),
            "Room Temperature".to_string(),
        )]));
        assert_eq!(
            catalog.lookup("heating.circuits.2.sensors.temperature.room"),
            Some("Room Temperature")
        );
    }

    #[test]
    fn should_strip_structural_segments_and_title_case() {
        assert_eq!(
            human_name("heating.dhw.sensors.temperature.hotWaterStorage", None),
            "Dhw Hot Water Storage Temperature"
        );
    }

    #[test]
    fn should_append_consumption_suffix_when_implied() {
        let name = human_name("heating.gas.consumption.summary.dhw", None);
        assert!(name.to_ascii_lowercase().contains("consumption"), "{name}");
    }

    #[test]
    fn should_not_duplicate_existing_suffix() {
        let name = human_name("heating.sensors.pressure.supply", None);
        assert_eq!(name.matches("Pressure").count(), 1, "{name}");
    }

    #[test]
    fn should_snake_case_camel_members() {
        assert_eq!(snake_case("getOutsideTemperature"), "get_outside_temperature");
        assert_eq!(snake_case("burners.0.modulation"), "burners_0_modulation");
    }
}
