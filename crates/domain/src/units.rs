//! Vendor-unit normalization.
//!
//! The vendor annotates property leaves with spelled-out unit names
//! (`celsius`, `kilowattHour`, `cubicMeter`). Home Assistant expects the
//! display abbreviation and, for some device classes, accepts only a fixed
//! set of units — a `cubicMeter` gas volume must never be labelled as an
//! `energy` sensor, so normalization validates against per-class whitelists
//! and suppresses the unit entirely when it would be invalid.

use crate::discovery::DeviceClass;

/// Vendor unit name → display unit table.
static UNIT_TABLE: &[(&str, &str)] = &[
    ("celsius", "°C"),
    ("kelvin", "K"),
    ("percent", "%"),
    ("watt", "W"),
    ("kilowatt", "kW"),
    ("wattHour", "Wh"),
    ("kilowattHour", "kWh"),
    ("megawattHour", "MWh"),
    ("cubicMeter", "m³"),
    ("liter", "l"),
    ("literPerMinute", "l/min"),
    ("bar", "bar"),
    ("pascal", "Pa"),
    ("hour", "h"),
    ("minute", "min"),
    ("seconds", "s"),
    ("decibel", "dB"),
    ("decibelMilliwatt", "dBm"),
    ("revolutionsPerMinute", "rpm"),
];

/// Display units Home Assistant accepts for `device_class: energy`.
static ENERGY_UNITS: &[&str] = &["Wh", "kWh", "MWh", "GJ", "MJ"];

/// Display units Home Assistant accepts for `device_class: pressure`.
static PRESSURE_UNITS: &[&str] = &["Pa", "kPa", "hPa", "bar", "cbar", "mbar", "psi", "inHg", "mmHg"];

/// Normalize a vendor unit to its display form.
///
/// With a target `device_class` of [`DeviceClass::Energy`] or
/// [`DeviceClass::Pressure`], the result is additionally validated against
/// the class whitelist and suppressed (`None`) when invalid.
#[must_use]
pub fn normalize_unit(vendor_unit: &str, device_class: Option<DeviceClass>) -> Option<&'static str> {
    let display = UNIT_TABLE
        .iter()
        .find(|(vendor, _)| *vendor == vendor_unit)
        .map(|(_, display)| *display)?;

    match device_class {
        Some(DeviceClass::Energy) if !ENERGY_UNITS.contains(&display) => None,
        Some(DeviceClass::Pressure) if !PRESSURE_UNITS.contains(&display) => None,
        _ => Some(display),
    }
}

/// Whether a display unit is a watt-hour energy variant.
///
/// Gas-consumption features report either volumes (`m³`) or energy
/// (`kWh`) depending on gateway firmware; only the latter may carry the
/// `energy` device class.
#[must_use]
pub fn is_energy_unit(display_unit: &str) -> bool {
    ENERGY_UNITS.contains(&display_unit)
}

/// Whether a display unit is valid for `device_class: pressure`.
#[must_use]
pub fn is_pressure_unit(display_unit: &str) -> bool {
    PRESSURE_UNITS.contains(&display_unit)
}
