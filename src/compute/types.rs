//! Compute Engine API resource models
//!
//! Only the fields the resolver reads are typed. Nested objects that are
//! copied into the instance descriptor keep their remaining fields in an
//! `extra` map so nothing is lost on the way through.
//! <https://cloud.google.com/compute/docs/reference/rest/v1>

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// An instance template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstanceTemplate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    pub properties: TemplateProperties,
}

impl InstanceTemplate {
    /// Metadata items of the template, in order
    pub fn metadata_items(&self) -> &[MetadataItem] {
        &self.properties.metadata.items
    }
}

/// `properties` of an instance template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateProperties {
    pub machine_type: Option<String>,
    pub tags: Option<Tags>,
    pub can_ip_forward: Option<bool>,
    pub network_interfaces: Vec<NetworkInterface>,
    pub labels: Option<BTreeMap<String, String>>,
    pub scheduling: Option<Scheduling>,
    pub deletion_protection: Option<bool>,
    pub service_accounts: Vec<ServiceAccount>,
    pub guest_accelerators: Vec<AcceleratorConfig>,
    pub disks: Vec<AttachedDisk>,
    pub metadata: Metadata,
}

/// Network tags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tags {
    pub items: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

/// A network interface
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkInterface {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnetwork: Option<String>,
    /// accessConfigs, networkIP, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Scheduling policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scheduling {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_host_maintenance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automatic_restart: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preemptible: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A service account attached to the instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceAccount {
    pub email: String,
    pub scopes: Vec<String>,
}

/// A guest accelerator (GPU)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AcceleratorConfig {
    pub accelerator_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accelerator_count: Option<u32>,
}

/// A disk attached to the instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttachedDisk {
    pub boot: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initialize_params: Option<InitializeParams>,
    /// autoDelete, type, mode, deviceName, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `initializeParams` of an attached disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InitializeParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_type: Option<String>,
    /// diskSizeGb, diskName, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Instance metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    pub items: Vec<MetadataItem>,
}

/// A metadata key/value pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataItem {
    pub key: String,
    pub value: String,
}

impl MetadataItem {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A disk image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Image {
    pub name: String,
    /// Canonical link of the image
    pub self_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// A long-running operation handle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Operation {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_link: Option<String>,
}

/// A page of `instanceTemplates.list`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstanceTemplateList {
    pub items: Vec<InstanceTemplate>,
    pub next_page_token: Option<String>,
}
