//! Configuration merging
//!
//! Layers are merged as raw YAML documents before deserialization so that a
//! drop-in only overrides the keys it actually sets:
//! 1. built-in defaults
//! 2. /etc/orchestrate/orchestrate.yaml
//! 3. /etc/orchestrate/orchestrate.d/*.yaml (sorted alphabetically)
//! 4. explicit config file
//!
//! Mappings merge recursively, scalars from later layers win and lists are
//! appended without duplicates.

use super::OrchestrateConfig;
use serde_yaml::Value;
use tracing::debug;

/// Merge two YAML values recursively, `overlay` taking precedence
pub fn merge_yaml_values(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            let mut result = base_map.clone();

            for (key, overlay_value) in overlay_map {
                let merged = match result.get(key) {
                    Some(base_value) => merge_yaml_values(base_value, overlay_value),
                    None => overlay_value.clone(),
                };
                result.insert(key.clone(), merged);
            }

            Value::Mapping(result)
        }

        (Value::Sequence(base_seq), Value::Sequence(overlay_seq)) => {
            let mut result = base_seq.clone();
            for item in overlay_seq {
                if !result.contains(item) {
                    result.push(item.clone());
                }
            }
            Value::Sequence(result)
        }

        // Overlay is null - keep base value
        (base_value, Value::Null) => base_value.clone(),

        (_, overlay_value) => overlay_value.clone(),
    }
}

/// Merge layers in order (later layers have higher priority) on top of the defaults
pub fn merge_layers(layers: &[Value]) -> Result<OrchestrateConfig, serde_yaml::Error> {
    let mut merged = serde_yaml::to_value(OrchestrateConfig::default())?;
    for layer in layers {
        debug!("Merging configuration layer");
        merged = merge_yaml_values(&merged, layer);
    }
    serde_yaml::from_value(merged)
}
