//! Device classification — mapping a raw device descriptor onto a variant.
//!
//! The vendor reports a free-form model identifier plus a list of role
//! strings per device. Classification is rule-based: an ordered list of
//! `(model regex, role sets)` rules where the first matching rule wins.
//! Rule order is significant and must be preserved exactly; ties are broken
//! by rule priority, not specificity.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// The five supported device-type variants.
///
/// Each variant owns a fixed set of declared metadata entries (see the
/// `app` crate's registry); `Hybrid` is a refinement of [`GasBoiler`](Self::GasBoiler)
/// with additional heat-pump-shaped declarations merged in explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceVariant {
    /// Generic heating device — the fallback when no rule matches.
    Heating,
    GasBoiler,
    HeatPump,
    FuelCell,
    Hybrid,
}

impl DeviceVariant {
    /// Human-readable label used in logs and device names.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Heating => "heating device",
            Self::GasBoiler => "gas boiler",
            Self::HeatPump => "heat pump",
            Self::FuelCell => "fuel cell",
            Self::Hybrid => "hybrid heat pump",
        }
    }
}

/// Addressing triple for one physical device behind one gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceAddress {
    pub installation_id: String,
    pub gateway_id: String,
    pub device_id: String,
}

impl DeviceAddress {
    /// Composite id used in discovery topics and unique ids.
    #[must_use]
    pub fn composite_id(&self) -> String {
        format!(
            "{}_{}_{}",
            self.installation_id, self.gateway_id, self.device_id
        )
    }
}

impl std::fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.installation_id, self.gateway_id, self.device_id
        )
    }
}

struct Rule {
    variant: DeviceVariant,
    model: &'static LazyLock<Regex>,
    /// Role sets: the rule matches when any one set is a subset of the
    /// device's roles.
    role_sets: &'static [&'static [&'static str]],
}

static FUEL_CELL_MODEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Vitovalor|fuelcell").expect("hard-coded regex"));
static GAS_BOILER_MODEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(Vitodens|Vitocrossal|Vitoladens|Vitoplex)").expect("hard-coded regex")
});
static HEAT_PUMP_MODEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Vitocal|heatpump").expect("hard-coded regex"));
static HYBRID_MODEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)hybrid").expect("hard-coded regex"));

/// Priority-ordered classification rules. Order is load-bearing: the fuel
/// cell rule must run before the gas boiler rule because fuel cell devices
/// also carry boiler roles.
static RULES: &[Rule] = &[
    Rule {
        variant: DeviceVariant::FuelCell,
        model: &FUEL_CELL_MODEL,
        role_sets: &[&["type:fuelcell"]],
    },
    Rule {
        variant: DeviceVariant::GasBoiler,
        model: &GAS_BOILER_MODEL,
        role_sets: &[&["type:boiler"], &["type:boiler;gas"]],
    },
    Rule {
        variant: DeviceVariant::HeatPump,
        model: &HEAT_PUMP_MODEL,
        role_sets: &[&["type:heatpump"]],
    },
    Rule {
        variant: DeviceVariant::Hybrid,
        model: &HYBRID_MODEL,
        role_sets: &[&["type:boiler", "type:heatpump"]],
    },
];

const BOILER_ROLE_MARKERS: &[&str] = &["type:boiler", "type:boiler;gas"];
const HEAT_PUMP_ROLE_MARKERS: &[&str] = &["type:heatpump"];

/// Classify a device descriptor into its variant.
///
/// A device carrying both a boiler-type and a heat-pump-type role marker is
/// a hybrid regardless of its model string. Otherwise the ordered rule list
/// applies: a rule matches when its model regex matches `model_id` OR one
/// of its role sets is fully contained in `roles`. No match falls back to
/// the generic [`DeviceVariant::Heating`] — classification never fails.
#[must_use]
pub fn classify(model_id: &str, roles: &[String]) -> DeviceVariant {
    let has_role = |marker: &str| roles.iter().any(|r| r == marker);

    if BOILER_ROLE_MARKERS.iter().any(|m| has_role(m))
        && HEAT_PUMP_ROLE_MARKERS.iter().any(|m| has_role(m))
    {
        return DeviceVariant::Hybrid;
    }

    for rule in RULES {
        if rule.model.is_match(model_id) {
            return rule.variant;
        }
        if rule
            .role_sets
            .iter()
            .any(|set| set.iter().all(|m| has_role(m)))
        {
            return rule.variant;
        }
    }

    DeviceVariant::Heating
}
