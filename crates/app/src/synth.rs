//! Component synthesizer — feature list in, discovery document out.
//!
//! `synthesize` is a pure function of its inputs: no network IO, no shared
//! mutable state, bounded time proportional to the feature count. The
//! pipeline runs a strict pass order over one accumulating component map
//! plus a side-set of already-claimed feature paths:
//!
//! 1. decorated-method pass (registry `Sensor` entries)
//! 2. enhancement pass (device-class/unit re-derivation, time-window siblings)
//! 3. variant-specific templated expansion (circuits, curves, burners,
//!    time-series)
//! 4. auto-detection of leftover enabled features
//! 5. command synthesis (buttons, numbers, selects, switches, texts)
//! 6. climate command enrichment
//! 7. entity categorization and enablement
//! 8. final container filter
//!
//! Pass order is load-bearing: the `setMode`-into-climate suppression in
//! pass 5 relies on climates existing before commands are examined, and the
//! auto-detection pass relies on every templated path being claimed first.

mod autodetect;
mod category;
mod commands;
mod decorated;
mod variant;

use std::collections::{BTreeMap, HashMap, HashSet};

use heatlink_domain::device::{DeviceAddress, DeviceVariant};
use heatlink_domain::discovery::{
    Component, DeviceInfo, DiscoveryDocument, Origin, Platform,
};
use heatlink_domain::feature::store::FeatureStore;
use heatlink_domain::feature::Feature;
use heatlink_domain::names::NameCatalog;

use crate::accessor::Accessor;
use crate::registry::{registry_for, VariantRegistry};
use crate::topics::Topics;

/// Unique-id prefix for every component this bridge publishes.
pub const UNIQUE_ID_PREFIX: &str = "heatlink";

/// Everything known about one classified device before synthesis.
#[derive(Debug, Clone)]
pub struct DeviceContext {
    pub address: DeviceAddress,
    pub variant: DeviceVariant,
    pub model_id: String,
    pub manufacturer: String,
}

impl DeviceContext {
    /// Display name of the physical device.
    #[must_use]
    pub fn device_name(&self) -> String {
        format!("{} ({})", self.model_id, self.variant.label())
    }
}

/// List containers that only supply ids/names to other entities and must
/// never surface as entities themselves.
static LIST_CONTAINERS: &[&str] = &[
    "heating.circuits",
    "heating.burners",
    "heating.compressors",
];

/// Whether a feature path is an un-indexed list container or a bare
/// sub-entity container (`heating.circuits.1`).
#[must_use]
pub fn is_container_path(path: &str) -> bool {
    if LIST_CONTAINERS.contains(&path) {
        return true;
    }
    LIST_CONTAINERS.iter().any(|container| {
        path.strip_prefix(container)
            .and_then(|rest| rest.strip_prefix('.'))
            .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
    })
}

/// Synthesize the discovery document for one device.
///
/// Deterministic given identical inputs: features iterate in list order,
/// registry entries in declaration order, and the component map is ordered
/// by key, so repeated runs produce structurally identical documents.
#[must_use]
pub fn synthesize(
    ctx: &DeviceContext,
    store: &FeatureStore,
    catalog: Option<&NameCatalog>,
    topics: &Topics,
) -> DiscoveryDocument {
    let registry = registry_for(ctx.variant);
    let mut builder = Builder::new(ctx, store, registry, catalog, topics);

    builder.run_decorated_pass();
    builder.run_enhancement_pass();
    builder.run_variant_pass();
    builder.run_autodetect_pass();
    builder.run_command_pass();
    builder.run_climate_enrichment_pass();
    builder.run_category_pass();
    builder.run_container_filter_pass();

    builder.into_document()
}

/// Accumulating synthesis state shared by the pipeline passes.
pub(crate) struct Builder<'a> {
    pub(crate) ctx: &'a DeviceContext,
    pub(crate) store: &'a FeatureStore,
    pub(crate) registry: &'static VariantRegistry,
    pub(crate) accessor: Accessor<'a>,
    pub(crate) catalog: Option<&'a NameCatalog>,
    pub(crate) topics: &'a Topics,
    pub(crate) components: BTreeMap<String, Component>,
    /// Feature paths already represented by a component.
    pub(crate) claimed: HashSet<String>,
    /// Component key → (backing feature path, backing property path).
    pub(crate) backing: HashMap<String, (String, String)>,
    /// Keys of controls synthesized from service-technician commands.
    pub(crate) service_controls: HashSet<String>,
}

impl<'a> Builder<'a> {
    fn new(
        ctx: &'a DeviceContext,
        store: &'a FeatureStore,
        registry: &'static VariantRegistry,
        catalog: Option<&'a NameCatalog>,
        topics: &'a Topics,
    ) -> Self {
        Self {
            ctx,
            store,
            registry,
            accessor: Accessor::new(registry, store),
            catalog,
            topics,
            components: BTreeMap::new(),
            claimed: HashSet::new(),
            backing: HashMap::new(),
            service_controls: HashSet::new(),
        }
    }

    pub(crate) fn unique_id(&self, key: &str) -> String {
        format!(
            "{UNIQUE_ID_PREFIX}_{}_{key}",
            self.ctx.address.composite_id()
        )
    }

    pub(crate) fn state_topic(&self, feature_path: &str) -> String {
        self.topics.feature_state(&self.ctx.address, feature_path)
    }

    pub(crate) fn command_topic(&self, feature_path: &str, command: &str) -> String {
        self.topics
            .feature_command(&self.ctx.address, feature_path, command)
    }

    /// Insert a component under `key`, recording its backing property.
    ///
    /// First writer wins: later passes never overwrite an existing key, so
    /// `unique_id`s stay unique within the document.
    pub(crate) fn insert(
        &mut self,
        key: String,
        component: Component,
        backing: Option<(String, String)>,
    ) {
        if self.components.contains_key(&key) {
            tracing::debug!(key, "component key already taken, skipping");
            return;
        }
        if let Some(backing) = backing {
            self.backing.insert(key.clone(), backing);
        }
        self.components.insert(key, component);
    }

    pub(crate) fn claim(&mut self, feature_path: &str) {
        self.claimed.insert(feature_path.to_string());
    }

    /// Display name for a feature path, catalog first.
    pub(crate) fn display_name(&self, feature_path: &str) -> String {
        heatlink_domain::names::human_name(feature_path, self.catalog)
    }

    fn into_document(self) -> DiscoveryDocument {
        DiscoveryDocument {
            device: DeviceInfo {
                identifiers: vec![format!(
                    "{UNIQUE_ID_PREFIX}_{}",
                    self.ctx.address.composite_id()
                )],
                name: self.ctx.device_name(),
                manufacturer: Some(self.ctx.manufacturer.clone()),
                model: Some(self.ctx.model_id.clone()),
            },
            origin: Origin::default(),
            components: self.components,
        }
    }
}

/// Template expression addressing one feature property, mirroring the
/// property unwrap rule.
///
/// The state payload published for a feature is its raw `properties`
/// object, so the expression must append `.value` when the node is a
/// `{value, unit}` wrapper and `[0]` when the (unwrapped) value is an
/// array — time-window properties report single-element arrays.
#[must_use]
pub fn value_expr_for(feature: &Feature, property_path: &str) -> Option<String> {
    let raw = feature.property_node(property_path)?;
    let mut expr = format!("value_json.{property_path}");
    let mut node = raw;
    if let Some(map) = node.as_object() {
        let inner = map.get("value")?;
        expr.push_str(".value");
        node = inner;
    }
    if node.is_array() {
        expr.push_str("[0]");
    }
    Some(expr)
}

/// The expression of [`value_expr_for`], wrapped as a full value template.
#[must_use]
pub fn value_template_for(feature: &Feature, property_path: &str) -> Option<String> {
    value_expr_for(feature, property_path).map(|expr| format!("{{{{ {expr} }}}}"))
}

/// Plain sensor component wired to one feature property.
///
/// Returns `None` when the property is absent — the candidate is skipped,
/// never an error.
pub(crate) fn sensor_component(
    builder: &Builder<'_>,
    platform: Platform,
    key: &str,
    name: String,
    feature: &Feature,
    property_path: &str,
) -> Option<Component> {
    let template = value_template_for(feature, property_path)?;
    let mut component = Component::new(platform, builder.unique_id(key), name);
    component.state_topic = Some(builder.state_topic(&feature.path));
    component.value_template = Some(template);
    Some(component)
}
