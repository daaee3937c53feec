//! Template metadata splitting
//!
//! A template stores two kinds of metadata in one list: items meant for the
//! instance itself, and extended items (reserved prefix) that configure the
//! resolver. Request overrides are appended to the instance items as given;
//! duplicate keys are left for the remote API to settle.

use std::collections::BTreeMap;

use crate::compute::{InstanceTemplate, MetadataItem};

/// Extended key holding a custom instance name pattern
pub const NAME_PATTERN_KEY: &str = "instance_name_pattern";
/// Extended key naming the network (and subnetwork)
pub const NETWORK_KEY: &str = "network";
/// Extended key overriding the template machine type
pub const MACHINE_TYPE_KEY: &str = "machine_type";
pub const GPU_TYPE_KEY: &str = "gpu_type";
pub const GPU_COUNT_KEY: &str = "gpu_count";

/// Extended metadata with the reserved prefix stripped from every key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedMetadata(BTreeMap<String, String>);

impl ExtendedMetadata {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Custom name pattern, if set and non-empty
    pub fn name_pattern(&self) -> Option<&str> {
        self.get(NAME_PATTERN_KEY).filter(|p| !p.is_empty())
    }

    pub fn network(&self) -> Option<&str> {
        self.get(NETWORK_KEY).filter(|n| !n.is_empty())
    }

    pub fn machine_type(&self) -> Option<&str> {
        self.get(MACHINE_TYPE_KEY).filter(|m| !m.is_empty())
    }

    pub fn gpu_type(&self) -> &str {
        self.get(GPU_TYPE_KEY).unwrap_or_default()
    }

    pub fn gpu_count(&self) -> &str {
        self.get(GPU_COUNT_KEY).unwrap_or("0")
    }
}

impl FromIterator<(String, String)> for ExtendedMetadata {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Split template metadata into instance items and extended metadata,
/// then append the request overrides to the instance items
pub fn split_metadata(
    template: &InstanceTemplate,
    overrides: &[MetadataItem],
    prefix: &str,
) -> (Vec<MetadataItem>, ExtendedMetadata) {
    let mut instance = Vec::new();
    let mut extended = ExtendedMetadata::default();

    for item in template.metadata_items() {
        match item.key.strip_prefix(prefix) {
            Some(key) if !prefix.is_empty() => extended.insert(key, item.value.clone()),
            _ => instance.push(item.clone()),
        }
    }

    instance.extend(overrides.iter().cloned());

    (instance, extended)
}
