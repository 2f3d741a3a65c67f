//! Passes 5 and 6: writable controls from vendor commands, then climate
//! command enrichment.
//!
//! Every executable command on an enabled feature becomes a control unless
//! a climate entity already absorbs it. Controls prefer upgrading the
//! read-only component that already surfaces the written property, so the
//! entity keeps its name, class, and unique id when it becomes writable.

use heatlink_domain::discovery::{Component, Platform};
use heatlink_domain::feature::{Command, CommandParam, Constraints, Feature};
use heatlink_domain::names::{human_name, snake_case};

use super::variant::ha_mode_for;
use super::Builder;

/// Commands reserved for service technicians. Their controls are still
/// published, but categorized as config and disabled by default.
fn is_service_command(feature_path: &str, name: &str) -> bool {
    if name == "reset" {
        // Schedule resets are an end-user operation.
        return !feature_path.contains("schedule");
    }
    matches!(
        name,
        "setAltitude" | "setOrientation" | "setNormalRange" | "removeController"
            | "removeZigbeeController"
    ) || name.starts_with("setHysteresis")
        || (name.starts_with("set") && name.ends_with("Limit"))
}

fn is_curve_command(command: &Command) -> bool {
    command.params.len() == 2
        && ["slope", "shift"].iter().all(|p| {
            command
                .params
                .get(*p)
                .is_some_and(CommandParam::is_numeric)
        })
}

fn numeric_bounds(param: &CommandParam) -> (Option<f64>, Option<f64>, Option<f64>) {
    match &param.constraints {
        Some(Constraints::Numeric { min, max, stepping }) => (*min, *max, *stepping),
        _ => (None, None, None),
    }
}

/// `{"<param>": {{ value }}}` — numeric payload for one command parameter.
fn numeric_command_template(param: &str) -> String {
    format!("{{\"{param}\": {{{{ value }}}}}}")
}

/// `{"<param>": "{{ value }}"}` — string payload for one command parameter.
fn string_command_template(param: &str) -> String {
    format!("{{\"{param}\": \"{{{{ value }}}}\"}}")
}

impl Builder<'_> {
    /// Pass 5: synthesize one control per executable command parameter.
    ///
    /// Commands a climate entity absorbs — `setMode` on its mode feature
    /// and the numeric target-temperature command on its temperature
    /// feature — are left to the enrichment pass; every other command on
    /// those features still gets its own control.
    pub(crate) fn run_command_pass(&mut self) {
        let (mode_paths, target_paths) = self.climate_absorbed_paths();
        let features: Vec<Feature> = self
            .store
            .iter()
            .filter(|f| f.is_enabled)
            .cloned()
            .collect();
        for feature in &features {
            let commands: Vec<Command> = feature.executable_commands().cloned().collect();
            for command in &commands {
                if mode_paths.contains(&feature.path) && command.name == "setMode" {
                    continue;
                }
                if target_paths.contains(&feature.path)
                    && command
                        .single_param()
                        .is_some_and(|(_, param)| param.is_numeric())
                {
                    continue;
                }
                self.synthesize_command(feature, command);
            }
        }
    }

    /// Feature paths whose commands a climate entity absorbs: its mode
    /// backing and its target-temperature wiring.
    fn climate_absorbed_paths(
        &self,
    ) -> (
        std::collections::HashSet<String>,
        std::collections::HashSet<String>,
    ) {
        let mut mode_paths = std::collections::HashSet::new();
        let mut target_paths = std::collections::HashSet::new();
        for (key, component) in self
            .components
            .iter()
            .filter(|(_, c)| c.platform == Platform::Climate)
        {
            if let Some((path, _)) = self.backing.get(key) {
                mode_paths.insert(path.clone());
            }
            if let Some(path) = component
                .temperature_state_topic
                .as_deref()
                .and_then(|t| t.split("/features/").nth(1))
            {
                target_paths.insert(path.to_string());
            }
        }
        (mode_paths, target_paths)
    }

    fn synthesize_command(&mut self, feature: &Feature, command: &Command) {
        let service = is_service_command(&feature.path, &command.name);

        if command.params.is_empty() {
            self.emit_button(feature, command, service);
            return;
        }
        if is_curve_command(command) {
            for property in ["slope", "shift"] {
                if let Some(param) = command.params.get(property).cloned() {
                    self.emit_param_control(feature, command, property, &param, service);
                }
            }
            return;
        }
        if let Some((param_name, param)) = command.single_param() {
            if param.param_type == "Schedule" {
                self.emit_schedule_summary(feature, command, service);
                return;
            }
            let (param_name, param) = (param_name.to_string(), param.clone());
            self.emit_param_control(feature, command, &param_name, &param, service);
            return;
        }
        let params: Vec<(String, CommandParam)> = command
            .params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (param_name, param) in params {
            self.emit_param_control(feature, command, &param_name, &param, service);
        }
    }

    fn emit_button(&mut self, feature: &Feature, command: &Command, service: bool) {
        let key = format!(
            "{}_{}",
            snake_case(&feature.path),
            snake_case(&command.name)
        );
        let name = format!(
            "{} {}",
            self.display_name(&feature.path),
            human_name(&command.name, None)
        );
        let mut component = Component::new(Platform::Button, self.unique_id(&key), name);
        component.command_topic = Some(self.command_topic(&feature.path, &command.name));
        component.payload_press = Some("{}".to_string());
        if service {
            self.service_controls.insert(key.clone());
        }
        self.insert(key, component, Some((feature.path.clone(), String::new())));
    }

    /// A `Schedule`-typed command has no sensible single-topic control; the
    /// schedule surfaces as an entry-count summary with the raw payload
    /// attached as attributes. Requires a non-empty `entries` value.
    fn emit_schedule_summary(&mut self, feature: &Feature, _command: &Command, service: bool) {
        let has_entries = feature
            .property("entries")
            .and_then(serde_json::Value::as_array)
            .is_some_and(|entries| !entries.is_empty());
        if !has_entries {
            return;
        }
        let key = format!("{}_entries", snake_case(&feature.path));
        let name = format!("{} entries", self.display_name(&feature.path));
        let mut component = Component::new(Platform::Sensor, self.unique_id(&key), name);
        component.state_topic = Some(self.state_topic(&feature.path));
        component.value_template = Some("{{ value_json.entries.value | length }}".to_string());
        component.json_attributes_topic = Some(self.state_topic(&feature.path));
        if service {
            self.service_controls.insert(key.clone());
        }
        self.insert(
            key,
            component,
            Some((feature.path.clone(), "entries".to_string())),
        );
    }

    fn emit_param_control(
        &mut self,
        feature: &Feature,
        command: &Command,
        param_name: &str,
        param: &CommandParam,
        service: bool,
    ) {
        let command_topic = self.command_topic(&feature.path, &command.name);
        let candidates = backing_candidates(param_name);
        let backing_property = candidates
            .iter()
            .copied()
            .find(|p| feature.property_node(p).is_some());

        // A read-only component already surfacing the written property is
        // upgraded in place so the entity id stays stable.
        let existing = self.components.iter().find_map(|(key, component)| {
            let (path, property) = self.backing.get(key)?;
            (component.platform.is_read_only()
                && path == &feature.path
                && candidates.contains(&property.as_str()))
            .then(|| key.clone())
        });

        if let Some(key) = existing {
            if let Some(component) = self.components.get_mut(&key) {
                apply_control(component, param_name, param, command_topic);
            }
            if service {
                self.service_controls.insert(key);
            }
            return;
        }

        // A control must reflect a readable state; no backing property
        // means no component.
        let Some(property) = backing_property else {
            return;
        };

        let key = format!("{}_{}", snake_case(&feature.path), snake_case(param_name));
        let name = format!(
            "{} {}",
            self.display_name(&feature.path),
            human_name(param_name, None)
        );
        let mut component = Component::new(Platform::Sensor, self.unique_id(&key), name);
        component.state_topic = Some(self.state_topic(&feature.path));
        component.value_template = super::value_template_for(feature, property);
        apply_control(&mut component, param_name, param, command_topic);
        if service {
            self.service_controls.insert(key.clone());
        }
        self.insert(
            key,
            component,
            Some((feature.path.clone(), property.to_string())),
        );
    }

    /// Pass 6: wire mode and target-temperature commands into climates.
    pub(crate) fn run_climate_enrichment_pass(&mut self) {
        let keys: Vec<String> = self
            .components
            .iter()
            .filter(|(_, c)| c.platform == Platform::Climate)
            .map(|(key, _)| key.clone())
            .collect();
        for key in keys {
            self.enrich_climate(&key);
        }
    }

    fn enrich_climate(&mut self, key: &str) {
        let Some((mode_path, _)) = self.backing.get(key).cloned() else {
            return;
        };
        if let Some(mode_feature) = self.store.lookup(&mode_path) {
            let mode_command = mode_feature
                .commands
                .get("setMode")
                .filter(|c| c.is_executable)
                .and_then(Command::single_param)
                .and_then(|(param_name, param)| {
                    param
                        .enum_values()
                        .map(|values| (param_name.to_string(), values.to_vec()))
                });
            if let Some((param_name, vendor_modes)) = mode_command {
                let topic = self.command_topic(&mode_path, "setMode");
                if let Some(component) = self.components.get_mut(key) {
                    component.mode_command_topic = Some(topic);
                    component.mode_command_template =
                        Some(mode_command_template(&param_name, &vendor_modes));
                }
            }
        }

        let target_path = self
            .components
            .get(key)
            .and_then(|c| c.temperature_state_topic.as_deref())
            .and_then(|t| t.split("/features/").nth(1))
            .map(ToString::to_string);
        let Some(target_path) = target_path else {
            return;
        };
        let Some(target) = self.store.lookup(&target_path) else {
            return;
        };
        let temperature_command = target.executable_commands().find_map(|command| {
            command
                .single_param()
                .filter(|(_, param)| param.is_numeric())
                .map(|(param_name, param)| {
                    (command.name.clone(), param_name.to_string(), param.clone())
                })
        });
        let Some((command_name, param_name, param)) = temperature_command else {
            return;
        };
        let topic = self.command_topic(&target_path, &command_name);
        let (min, max, step) = numeric_bounds(&param);
        if let Some(component) = self.components.get_mut(key) {
            component.temperature_command_topic = Some(topic);
            component.temperature_command_template =
                Some(numeric_command_template(&param_name));
            component.min_temp = min;
            component.max_temp = max;
            component.temp_step = step;
        }
    }
}

/// State-property candidates for a command parameter, most specific first.
fn backing_candidates(param_name: &str) -> Vec<&str> {
    match param_name {
        "targetTemperature" => vec!["targetTemperature", "temperature", "value"],
        other => vec![other, "value"],
    }
}

/// Turn a component into the control matching one command parameter.
fn apply_control(
    component: &mut Component,
    param_name: &str,
    param: &CommandParam,
    command_topic: String,
) {
    component.command_topic = Some(command_topic);
    if let Some(values) = param.enum_values() {
        component.platform = Platform::Select;
        component.options = Some(values.to_vec());
        component.command_template = Some(string_command_template(param_name));
        // A select carries no sensor-only metadata.
        component.state_class = None;
    } else if param.is_boolean() {
        component.platform = Platform::Switch;
        component.payload_on = Some(format!("{{\"{param_name}\": true}}"));
        component.payload_off = Some(format!("{{\"{param_name}\": false}}"));
        component.state_class = None;
    } else if param.is_numeric() {
        component.platform = Platform::Number;
        component.command_template = Some(numeric_command_template(param_name));
        let (min, max, step) = numeric_bounds(param);
        component.min = min;
        component.max = max;
        component.step = step;
        component.state_class = None;
    } else {
        component.platform = Platform::Text;
        component.command_template = Some(string_command_template(param_name));
        component.state_class = None;
    }
}

/// Translate Home Assistant's `off|heat|auto` back into the first vendor
/// mode that maps onto it.
fn mode_command_template(param_name: &str, vendor_modes: &[String]) -> String {
    let mut template = String::new();
    let mut first = true;
    for ha_mode in ["off", "heat", "auto"] {
        let Some(vendor) = vendor_modes.iter().find(|v| ha_mode_for(v) == ha_mode) else {
            continue;
        };
        let keyword = if first { "if" } else { "elif" };
        template.push_str(&format!(
            "{{% {keyword} value == '{ha_mode}' %}}{{\"{param_name}\": \"{vendor}\"}}"
        ));
        first = false;
    }
    template.push_str("{% endif %}");
    template
}
