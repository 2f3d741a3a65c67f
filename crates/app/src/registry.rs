//! Declarative metadata registry.
//!
//! Each device variant owns a fixed table associating a member name
//! (`getOutsideTemperature`, `getBurnerHours`, …) with structured metadata.
//! The tables are the single source of truth consumed both by the runtime
//! property accessors and by the component synthesizer.
//!
//! Tables are built exactly once at first use (process-wide, read-only
//! thereafter) and are therefore safe for concurrent reads by devices
//! synthesized in parallel. Subtype tables are constructed by merging the
//! base table with the subtype's own entries — composition, not
//! inheritance. A subtype entry with the same member name replaces the base
//! entry; everything else is additive, so a subtype never erases the base's
//! declarations wholesale.

use std::sync::LazyLock;

use heatlink_domain::device::DeviceVariant;
use heatlink_domain::discovery::{DeviceClass, StateClass};
use serde_json::Value;

/// Typed guard over a dependent value. Registered at definition time;
/// never a textual predicate.
pub type Guard = fn(&Value) -> bool;

/// Fixed-path sensor mapping (pass 1 of the synthesizer).
#[derive(Debug, Clone, Copy)]
pub struct SensorMeta {
    /// Feature path backing the sensor.
    pub feature: &'static str,
    /// Property path inside the feature, usually `value`.
    pub property: &'static str,
    pub device_class: Option<DeviceClass>,
    pub state_class: Option<StateClass>,
    /// Display-unit hint; the enhancement pass may override it from the
    /// actual backing property.
    pub unit: Option<&'static str>,
}

/// Sub-entity-templated sensor mapping (circuits, burners, compressors).
///
/// `feature_template` and `key_template` carry one positional `{}`
/// placeholder for the sub-entity id, discovered at synthesis time from
/// `id_source`.
#[derive(Debug, Clone, Copy)]
pub struct TemplatedMeta {
    /// List container whose indexed children supply the id list.
    pub id_source: &'static str,
    pub feature_template: &'static str,
    pub property: &'static str,
    pub key_template: &'static str,
    /// Display name template with a `{}` placeholder for the id (or for
    /// the circuit name, when one resolves).
    pub name_template: &'static str,
    pub device_class: Option<DeviceClass>,
    pub state_class: Option<StateClass>,
    pub unit: Option<&'static str>,
}

/// One climate entity per circuit, wired from the circuit's operating mode
/// plus the current/target temperature members named here.
#[derive(Debug, Clone, Copy)]
pub struct ClimateMeta {
    pub id_source: &'static str,
    /// Feature holding the active operating mode, templated on the id.
    pub mode_feature_template: &'static str,
    pub key_template: &'static str,
    /// Member (of this same registry) resolving the current room temperature.
    pub current_temperature_member: &'static str,
    /// Member resolving the writable target temperature.
    pub target_temperature_member: &'static str,
}

/// Slope+shift sensor pair per circuit.
#[derive(Debug, Clone, Copy)]
pub struct CurveMeta {
    pub id_source: &'static str,
    pub feature_template: &'static str,
    pub key_template: &'static str,
}

/// Time-series consumption/production mapping; the variant pass expands it
/// into `day`/`week`/`month`/`year` window sensors.
#[derive(Debug, Clone, Copy)]
pub struct TimeSeriesMeta {
    pub feature: &'static str,
    pub device_class: Option<DeviceClass>,
    pub unit: Option<&'static str>,
}

/// Plain property retrieval installed as an accessor member.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalMeta {
    /// Feature path, optionally templated on a sub-entity id.
    pub feature_template: &'static str,
    pub property: &'static str,
    /// Coerce the resolved value to a boolean.
    pub boolean: bool,
}

/// Property whose feature path depends on the current value of another
/// member of the same instance (e.g. desired temperature depends on the
/// active program).
#[derive(Debug, Clone, Copy)]
pub struct DependentMeta {
    /// Feature path template containing `{dep}` (and optionally `{}`).
    pub feature_template: &'static str,
    pub property: &'static str,
    /// Member name whose resolved value substitutes `{dep}`.
    pub depends_on: &'static str,
    /// Optional predicate over the dependent value; when it fails, the
    /// dependent property resolves to absent. Absent guard means any
    /// truthy (non-null, non-empty) dependent value passes.
    pub guard: Option<Guard>,
}

/// Tagged metadata union. Lifetime: registered once at table-definition
/// time, never mutated per instance.
#[derive(Debug, Clone, Copy)]
pub enum Metadata {
    Sensor(SensorMeta),
    CircuitSensor(TemplatedMeta),
    BurnerSensor(TemplatedMeta),
    CircuitClimate(ClimateMeta),
    HeatingCurve(CurveMeta),
    TimeSeries(TimeSeriesMeta),
    Retrieval(RetrievalMeta),
    Dependent(DependentMeta),
}

/// One registered member.
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    pub member: &'static str,
    pub metadata: Metadata,
}

/// Read-only metadata table of one device variant, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct VariantRegistry {
    entries: Vec<Entry>,
}

impl VariantRegistry {
    fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// Merge `own` entries into a copy of this table. Same-name entries
    /// replace the base one in place (most specific wins); new members are
    /// appended in declaration order.
    fn extended_with(&self, own: Vec<Entry>) -> Self {
        let mut entries = self.entries.clone();
        for entry in own {
            match entries.iter_mut().find(|e| e.member == entry.member) {
                Some(existing) => *existing = entry,
                None => entries.push(entry),
            }
        }
        Self { entries }
    }

    /// All entries in declaration order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Metadata of one member, if declared.
    #[must_use]
    pub fn metadata_for(&self, member: &str) -> Option<&Metadata> {
        self.entries
            .iter()
            .find(|e| e.member == member)
            .map(|e| &e.metadata)
    }

    pub fn sensors(&self) -> impl Iterator<Item = (&'static str, &SensorMeta)> {
        self.entries.iter().filter_map(|e| match &e.metadata {
            Metadata::Sensor(meta) => Some((e.member, meta)),
            _ => None,
        })
    }

    pub fn circuit_sensors(&self) -> impl Iterator<Item = (&'static str, &TemplatedMeta)> {
        self.entries.iter().filter_map(|e| match &e.metadata {
            Metadata::CircuitSensor(meta) => Some((e.member, meta)),
            _ => None,
        })
    }

    pub fn burner_sensors(&self) -> impl Iterator<Item = (&'static str, &TemplatedMeta)> {
        self.entries.iter().filter_map(|e| match &e.metadata {
            Metadata::BurnerSensor(meta) => Some((e.member, meta)),
            _ => None,
        })
    }

    pub fn climates(&self) -> impl Iterator<Item = (&'static str, &ClimateMeta)> {
        self.entries.iter().filter_map(|e| match &e.metadata {
            Metadata::CircuitClimate(meta) => Some((e.member, meta)),
            _ => None,
        })
    }

    pub fn heating_curves(&self) -> impl Iterator<Item = (&'static str, &CurveMeta)> {
        self.entries.iter().filter_map(|e| match &e.metadata {
            Metadata::HeatingCurve(meta) => Some((e.member, meta)),
            _ => None,
        })
    }

    pub fn time_series(&self) -> impl Iterator<Item = (&'static str, &TimeSeriesMeta)> {
        self.entries.iter().filter_map(|e| match &e.metadata {
            Metadata::TimeSeries(meta) => Some((e.member, meta)),
            _ => None,
        })
    }
}

fn program_is_active(value: &Value) -> bool {
    value.as_str().is_some_and(|p| !p.is_empty() && p != "standby")
}

fn heating_entries() -> Vec<Entry> {
    vec![
        Entry {
            member: "getOutsideTemperature",
            metadata: Metadata::Sensor(SensorMeta {
                feature: "heating.sensors.temperature.outside",
                property: "value",
                device_class: Some(DeviceClass::Temperature),
                state_class: Some(StateClass::Measurement),
                unit: Some("°C"),
            }),
        },
        Entry {
            member: "getDhwStorageTemperature",
            metadata: Metadata::Sensor(SensorMeta {
                feature: "heating.dhw.sensors.temperature.hotWaterStorage",
                property: "value",
                device_class: Some(DeviceClass::Temperature),
                state_class: Some(StateClass::Measurement),
                unit: Some("°C"),
            }),
        },
        Entry {
            member: "getDhwTargetTemperature",
            metadata: Metadata::Sensor(SensorMeta {
                feature: "heating.dhw.temperature.main",
                property: "value",
                device_class: Some(DeviceClass::Temperature),
                state_class: None,
                unit: Some("°C"),
            }),
        },
        Entry {
            member: "getCircuitName",
            metadata: Metadata::Retrieval(RetrievalMeta {
                feature_template: "heating.circuits.{}",
                property: "name",
                boolean: false,
            }),
        },
        Entry {
            member: "getActiveProgram",
            metadata: Metadata::Retrieval(RetrievalMeta {
                feature_template: "heating.circuits.{}.operating.programs.active",
                property: "value",
                boolean: false,
            }),
        },
        Entry {
            member: "getActiveMode",
            metadata: Metadata::Retrieval(RetrievalMeta {
                feature_template: "heating.circuits.{}.operating.modes.active",
                property: "value",
                boolean: false,
            }),
        },
        Entry {
            member: "getDesiredTemperature",
            metadata: Metadata::Dependent(DependentMeta {
                feature_template: "heating.circuits.{}.operating.programs.{dep}",
                property: "temperature",
                depends_on: "getActiveProgram",
                guard: Some(program_is_active),
            }),
        },
        Entry {
            member: "getRoomTemperature",
            metadata: Metadata::CircuitSensor(TemplatedMeta {
                id_source: "heating.circuits",
                feature_template: "heating.circuits.{}.sensors.temperature.room",
                property: "value",
                key_template: "circuit_{}_room_temperature",
                name_template: "{} room temperature",
                device_class: Some(DeviceClass::Temperature),
                state_class: Some(StateClass::Measurement),
                unit: Some("°C"),
            }),
        },
        Entry {
            member: "getSupplyTemperature",
            metadata: Metadata::CircuitSensor(TemplatedMeta {
                id_source: "heating.circuits",
                feature_template: "heating.circuits.{}.sensors.temperature.supply",
                property: "value",
                key_template: "circuit_{}_supply_temperature",
                name_template: "{} supply temperature",
                device_class: Some(DeviceClass::Temperature),
                state_class: Some(StateClass::Measurement),
                unit: Some("°C"),
            }),
        },
        Entry {
            member: "getCircuitClimate",
            metadata: Metadata::CircuitClimate(ClimateMeta {
                id_source: "heating.circuits",
                mode_feature_template: "heating.circuits.{}.operating.modes.active",
                key_template: "circuit_{}_climate",
                current_temperature_member: "getRoomTemperature",
                target_temperature_member: "getDesiredTemperature",
            }),
        },
        Entry {
            member: "getHeatingCurve",
            metadata: Metadata::HeatingCurve(CurveMeta {
                id_source: "heating.circuits",
                feature_template: "heating.circuits.{}.heating.curve",
                key_template: "circuit_{}_heating_curve",
            }),
        },
    ]
}

fn gas_boiler_entries() -> Vec<Entry> {
    vec![
        Entry {
            member: "getBoilerTemperature",
            metadata: Metadata::Sensor(SensorMeta {
                feature: "heating.boiler.sensors.temperature.main",
                property: "value",
                device_class: Some(DeviceClass::Temperature),
                state_class: Some(StateClass::Measurement),
                unit: Some("°C"),
            }),
        },
        Entry {
            member: "getBoilerCommonSupplyTemperature",
            metadata: Metadata::Sensor(SensorMeta {
                feature: "heating.boiler.sensors.temperature.commonSupply",
                property: "value",
                device_class: Some(DeviceClass::Temperature),
                state_class: Some(StateClass::Measurement),
                unit: Some("°C"),
            }),
        },
        Entry {
            member: "getBurnerHours",
            metadata: Metadata::BurnerSensor(TemplatedMeta {
                id_source: "heating.burners",
                feature_template: "heating.burners.{}.statistics",
                property: "hours",
                key_template: "burner_{}_hours",
                name_template: "Burner {} hours",
                device_class: Some(DeviceClass::Duration),
                state_class: Some(StateClass::TotalIncreasing),
                unit: Some("h"),
            }),
        },
        Entry {
            member: "getBurnerStarts",
            metadata: Metadata::BurnerSensor(TemplatedMeta {
                id_source: "heating.burners",
                feature_template: "heating.burners.{}.statistics",
                property: "starts",
                key_template: "burner_{}_starts",
                name_template: "Burner {} starts",
                device_class: None,
                state_class: Some(StateClass::TotalIncreasing),
                unit: None,
            }),
        },
        Entry {
            member: "getBurnerModulation",
            metadata: Metadata::BurnerSensor(TemplatedMeta {
                id_source: "heating.burners",
                feature_template: "heating.burners.{}.modulation",
                property: "value",
                key_template: "burner_{}_modulation",
                name_template: "Burner {} modulation",
                device_class: None,
                state_class: Some(StateClass::Measurement),
                unit: Some("%"),
            }),
        },
        Entry {
            member: "getBurnerDemandModulation",
            metadata: Metadata::BurnerSensor(TemplatedMeta {
                id_source: "heating.burners",
                feature_template: "heating.burners.{}.modulation",
                property: "demand",
                key_template: "burner_{}_demand_modulation",
                name_template: "Burner {} demand modulation",
                device_class: None,
                state_class: Some(StateClass::Measurement),
                unit: Some("%"),
            }),
        },
        Entry {
            member: "getGasConsumptionHeating",
            metadata: Metadata::TimeSeries(TimeSeriesMeta {
                feature: "heating.gas.consumption.heating",
                device_class: Some(DeviceClass::Energy),
                unit: Some("kWh"),
            }),
        },
        Entry {
            member: "getGasConsumptionDhw",
            metadata: Metadata::TimeSeries(TimeSeriesMeta {
                feature: "heating.gas.consumption.dhw",
                device_class: Some(DeviceClass::Energy),
                unit: Some("kWh"),
            }),
        },
        Entry {
            member: "getGasConsumptionTotal",
            metadata: Metadata::TimeSeries(TimeSeriesMeta {
                feature: "heating.gas.consumption.total",
                device_class: Some(DeviceClass::Energy),
                unit: Some("kWh"),
            }),
        },
    ]
}

fn heat_pump_entries() -> Vec<Entry> {
    vec![
        Entry {
            member: "getReturnTemperature",
            metadata: Metadata::Sensor(SensorMeta {
                feature: "heating.sensors.temperature.return",
                property: "value",
                device_class: Some(DeviceClass::Temperature),
                state_class: Some(StateClass::Measurement),
                unit: Some("°C"),
            }),
        },
        Entry {
            member: "getCompressorHours",
            metadata: Metadata::BurnerSensor(TemplatedMeta {
                id_source: "heating.compressors",
                feature_template: "heating.compressors.{}.statistics",
                property: "hours",
                key_template: "compressor_{}_hours",
                name_template: "Compressor {} hours",
                device_class: Some(DeviceClass::Duration),
                state_class: Some(StateClass::TotalIncreasing),
                unit: Some("h"),
            }),
        },
        Entry {
            member: "getCompressorStarts",
            metadata: Metadata::BurnerSensor(TemplatedMeta {
                id_source: "heating.compressors",
                feature_template: "heating.compressors.{}.statistics",
                property: "starts",
                key_template: "compressor_{}_starts",
                name_template: "Compressor {} starts",
                device_class: None,
                state_class: Some(StateClass::TotalIncreasing),
                unit: None,
            }),
        },
        Entry {
            member: "getPowerConsumptionTotal",
            metadata: Metadata::TimeSeries(TimeSeriesMeta {
                feature: "heating.power.consumption.total",
                device_class: Some(DeviceClass::Energy),
                unit: Some("kWh"),
            }),
        },
    ]
}

fn fuel_cell_entries() -> Vec<Entry> {
    vec![
        Entry {
            member: "getFuelCellOperatingMode",
            metadata: Metadata::Sensor(SensorMeta {
                feature: "heating.fuelCell.operating.modes.active",
                property: "value",
                device_class: None,
                state_class: None,
                unit: None,
            }),
        },
        Entry {
            member: "getFuelCellPowerProduction",
            metadata: Metadata::Sensor(SensorMeta {
                feature: "heating.fuelCell.power.production",
                property: "value",
                device_class: Some(DeviceClass::Power),
                state_class: Some(StateClass::Measurement),
                unit: Some("W"),
            }),
        },
        Entry {
            member: "getPowerProduction",
            metadata: Metadata::TimeSeries(TimeSeriesMeta {
                feature: "heating.power.production",
                device_class: Some(DeviceClass::Energy),
                unit: Some("kWh"),
            }),
        },
    ]
}

static HEATING: LazyLock<VariantRegistry> = LazyLock::new(|| VariantRegistry::new(heating_entries()));
static GAS_BOILER: LazyLock<VariantRegistry> =
    LazyLock::new(|| HEATING.extended_with(gas_boiler_entries()));
static HEAT_PUMP: LazyLock<VariantRegistry> =
    LazyLock::new(|| HEATING.extended_with(heat_pump_entries()));
static FUEL_CELL: LazyLock<VariantRegistry> =
    LazyLock::new(|| GAS_BOILER.extended_with(fuel_cell_entries()));
// Hybrid owns a gas-boiler-shaped table with heat-pump-shaped declarations
// merged explicitly; there is no inheritance chain to walk.
static HYBRID: LazyLock<VariantRegistry> =
    LazyLock::new(|| GAS_BOILER.extended_with(heat_pump_entries()));

/// The read-only metadata table of a variant.
#[must_use]
pub fn registry_for(variant: DeviceVariant) -> &'static VariantRegistry {
    match variant {
        DeviceVariant::Heating => &HEATING,
        DeviceVariant::GasBoiler => &GAS_BOILER,
        DeviceVariant::HeatPump => &HEAT_PUMP,
        DeviceVariant::FuelCell => &FUEL_CELL,
        DeviceVariant::Hybrid => &HYBRID,
    }
}
