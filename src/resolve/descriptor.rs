//! Instance descriptor assembly
//!
//! Builds the `instances.insert` body from a located template: copies the
//! allowed template properties, qualifies every resource identifier, picks
//! the boot image, names the instance and appends the startup script entry.
//! <https://cloud.google.com/compute/docs/reference/rest/v1/instances/insert>

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::images::BootImages;
use super::locator::LocatedTemplate;
use super::metadata::ExtendedMetadata;
use super::naming::{UniqueToken, resolve_name};
use super::os_type::OsClassifier;
use super::startup::StartupScripts;
use super::urls::ResourceUrls;
use crate::compute::MetadataItem;
use crate::compute::types::{
    AcceleratorConfig, AttachedDisk, Metadata, NetworkInterface, Scheduling, ServiceAccount, Tags,
};
use crate::config::OrchestrateConfig;
use crate::{CreationRequest, OrchestrateError};

/// Submission-ready instance creation body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstanceDescriptor {
    pub name: String,
    pub description: String,
    pub machine_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_ip_forward: Option<bool>,
    pub network_interfaces: Vec<NetworkInterface>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduling: Option<Scheduling>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deletion_protection: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub service_accounts: Vec<ServiceAccount>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub guest_accelerators: Vec<AcceleratorConfig>,
    pub disks: Vec<AttachedDisk>,
    pub metadata: Metadata,
}

impl InstanceDescriptor {
    /// The boot disk, if any
    pub fn boot_disk(&self) -> Option<&AttachedDisk> {
        self.disks.iter().find(|d| d.boot)
    }

    /// Value of the last metadata item with `key`
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .items
            .iter()
            .rev()
            .find(|item| item.key == key)
            .map(|item| item.value.as_str())
    }
}

/// Everything resolved before assembly
pub struct DescriptorInputs<'a> {
    pub request: &'a CreationRequest,
    pub located: &'a LocatedTemplate,
    pub instance_metadata: Vec<MetadataItem>,
    pub extended: &'a ExtendedMetadata,
    pub images: &'a BootImages,
    pub token: &'a UniqueToken,
}

/// Assemble the instance descriptor
pub fn assemble(
    inputs: DescriptorInputs<'_>,
    config: &OrchestrateConfig,
) -> Result<InstanceDescriptor, OrchestrateError> {
    let DescriptorInputs {
        request,
        located,
        mut instance_metadata,
        extended,
        images,
        token,
    } = inputs;

    let name = resolve_name(request, &located.size, extended, &config.naming, token)?;
    let urls = ResourceUrls::new(&config.compute.resource_base, &request.project, &request.zone);
    let properties = &located.template.properties;

    let machine_type = extended
        .machine_type()
        .or(properties.machine_type.as_deref())
        .unwrap_or(&config.defaults.machine_type);
    debug!("Machine type {}", machine_type);

    let guest_accelerators = properties
        .guest_accelerators
        .iter()
        .map(|accelerator| AcceleratorConfig {
            accelerator_type: urls.accelerator_type(&accelerator.accelerator_type),
            ..accelerator.clone()
        })
        .collect();

    let mut disks = properties.disks.clone();
    for disk in &mut disks {
        let boot = disk.boot;
        if let Some(params) = disk.initialize_params.as_mut() {
            if let Some(disk_type) = params.disk_type.take() {
                params.disk_type = Some(urls.disk_type(&disk_type));
            }
            if boot && request.use_latest_image {
                debug!("Booting latest image {}", images.latest.self_link);
                params.source_image = Some(images.latest.self_link.clone());
            }
        }
    }

    let network = extended.network().unwrap_or(&config.defaults.network);
    let network_interfaces = properties
        .network_interfaces
        .iter()
        .map(|interface| NetworkInterface {
            network: Some(urls.network(network)),
            subnetwork: Some(urls.subnetwork(network)),
            ..interface.clone()
        })
        .collect();

    let booted = images.selected(request.use_latest_image);
    let os = OsClassifier::new(&config.os).classify(booted)?;
    info!("Image {} runs {}", booted.name, os);
    instance_metadata.push(StartupScripts::new(&config.startup).select(os, &request.project)?);

    Ok(InstanceDescriptor {
        name,
        description: format!(
            "Orchestrate instance created from template {} size {}",
            request.template, located.size
        ),
        machine_type: urls.machine_type(machine_type),
        tags: properties.tags.clone(),
        can_ip_forward: properties.can_ip_forward,
        network_interfaces,
        labels: properties.labels.clone(),
        scheduling: properties.scheduling.clone(),
        deletion_protection: properties.deletion_protection,
        service_accounts: properties.service_accounts.clone(),
        guest_accelerators,
        disks,
        metadata: Metadata {
            items: instance_metadata,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::types::{InitializeParams, InstanceTemplate, TemplateProperties};
    use crate::compute::Image;

    const BASE: &str = "https://www.googleapis.com/compute/v1";

    fn image(name: &str, family: &str) -> Image {
        Image {
            name: name.to_string(),
            self_link: format!("{}/projects/media/global/images/{}", BASE, name),
            family: Some(family.to_string()),
            ..Default::default()
        }
    }

    fn located() -> LocatedTemplate {
        let disk = |boot: bool, image: Option<&str>| AttachedDisk {
            boot,
            initialize_params: Some(InitializeParams {
                source_image: image.map(str::to_string),
                disk_type: Some("pd-ssd".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        LocatedTemplate {
            template: InstanceTemplate {
                name: "render-8".to_string(),
                properties: TemplateProperties {
                    machine_type: Some("n1-standard-8".to_string()),
                    network_interfaces: vec![NetworkInterface::default()],
                    disks: vec![
                        disk(true, Some("projects/media/global/images/centos-7-v1")),
                        disk(false, None),
                    ],
                    guest_accelerators: vec![AcceleratorConfig {
                        accelerator_type: "nvidia-tesla-t4-vws".to_string(),
                        accelerator_count: Some(1),
                    }],
                    ..Default::default()
                },
                ..Default::default()
            },
            size: "8".to_string(),
        }
    }

    fn request(use_latest_image: bool) -> CreationRequest {
        CreationRequest {
            project: "media".to_string(),
            zone: "us-central1-a".to_string(),
            template: "render".to_string(),
            size: Some("8".to_string()),
            use_latest_image,
            ..Default::default()
        }
    }

    fn images() -> BootImages {
        BootImages {
            exact: image("centos-7-v1", "centos-7"),
            latest: image("centos-7-v2", "centos-7"),
        }
    }

    fn config() -> OrchestrateConfig {
        let mut config = OrchestrateConfig::default();
        config.startup.bucket = "bucket".to_string();
        config
    }

    fn build(
        request: &CreationRequest,
        extended: &ExtendedMetadata,
        metadata: Vec<MetadataItem>,
    ) -> InstanceDescriptor {
        let located = located();
        let images = images();
        let token = UniqueToken::from("abcde");
        assemble(
            DescriptorInputs {
                request,
                located: &located,
                instance_metadata: metadata,
                extended,
                images: &images,
                token: &token,
            },
            &config(),
        )
        .unwrap()
    }

    #[test]
    fn test_assemble_qualifies_resources() {
        let descriptor = build(&request(false), &ExtendedMetadata::default(), vec![]);

        assert_eq!(descriptor.name, "render-8-abcde");
        assert_eq!(
            descriptor.description,
            "Orchestrate instance created from template render size 8"
        );
        assert_eq!(
            descriptor.machine_type,
            format!("{}/projects/media/zones/us-central1-a/machineTypes/n1-standard-8", BASE)
        );
        assert_eq!(
            descriptor.guest_accelerators[0].accelerator_type,
            format!(
                "{}/projects/media/zones/us-central1-a/acceleratorTypes/nvidia-tesla-t4-vws",
                BASE
            )
        );
        for disk in &descriptor.disks {
            let params = disk.initialize_params.as_ref().unwrap();
            assert_eq!(
                params.disk_type.as_deref(),
                Some(format!("{}/projects/media/zones/us-central1-a/diskTypes/pd-ssd", BASE).as_str())
            );
        }

        let interface = &descriptor.network_interfaces[0];
        assert_eq!(
            interface.network.as_deref(),
            Some(format!("{}/projects/media/global/networks/default", BASE).as_str())
        );
        assert_eq!(
            interface.subnetwork.as_deref(),
            Some(format!("{}/projects/media/regions/us-central1/subnetworks/default", BASE).as_str())
        );
    }

    #[test]
    fn test_keeps_template_image_without_latest_flag() {
        let descriptor = build(&request(false), &ExtendedMetadata::default(), vec![]);
        let boot = descriptor.boot_disk().unwrap();
        assert_eq!(
            boot.initialize_params.as_ref().unwrap().source_image.as_deref(),
            Some("projects/media/global/images/centos-7-v1")
        );
    }

    #[test]
    fn test_latest_image_replaces_boot_source() {
        let descriptor = build(&request(true), &ExtendedMetadata::default(), vec![]);

        let boot = descriptor.boot_disk().unwrap();
        assert_eq!(
            boot.initialize_params.as_ref().unwrap().source_image.as_deref(),
            Some(images().latest.self_link.as_str())
        );
        let data = &descriptor.disks[1];
        assert!(data.initialize_params.as_ref().unwrap().source_image.is_none());
    }

    #[test]
    fn test_extended_overrides() {
        let mut extended = ExtendedMetadata::default();
        extended.insert("machine_type", "n1-highmem-16");
        extended.insert("network", "workstations");

        let descriptor = build(&request(false), &extended, vec![]);
        assert!(descriptor.machine_type.ends_with("/machineTypes/n1-highmem-16"));
        let interface = &descriptor.network_interfaces[0];
        assert!(interface.network.as_deref().unwrap().ends_with("/global/networks/workstations"));
        assert!(
            interface
                .subnetwork
                .as_deref()
                .unwrap()
                .ends_with("/regions/us-central1/subnetworks/workstations")
        );
    }

    #[test]
    fn test_startup_script_appended_last() {
        let metadata = vec![MetadataItem::new("color", "red")];
        let descriptor = build(&request(false), &ExtendedMetadata::default(), metadata);

        let items = &descriptor.metadata.items;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], MetadataItem::new("color", "red"));
        assert_eq!(
            items[1],
            MetadataItem::new("startup-script-url", "gs://bucket/remotedesktopconfigure.py")
        );
        assert_eq!(
            descriptor.metadata_value("startup-script-url"),
            Some("gs://bucket/remotedesktopconfigure.py")
        );
    }

    #[test]
    fn test_os_follows_booted_image() {
        let located = located();
        let images = BootImages {
            exact: image("centos-7-v1", "centos-7"),
            latest: image("windows-2019-v2", "windows-2019"),
        };
        let token = UniqueToken::from("abcde");
        let request = request(true);

        let descriptor = assemble(
            DescriptorInputs {
                request: &request,
                located: &located,
                instance_metadata: vec![],
                extended: &ExtendedMetadata::default(),
                images: &images,
                token: &token,
            },
            &config(),
        )
        .unwrap();

        assert!(descriptor.metadata_value("windows-startup-script-url").is_some());
        assert!(descriptor.metadata_value("startup-script-url").is_none());
    }

    #[test]
    fn test_serialized_body_shape() {
        let descriptor = build(&request(false), &ExtendedMetadata::default(), vec![]);
        let body = serde_json::to_value(&descriptor).unwrap();

        assert!(body.get("machineType").is_some());
        assert!(body.get("networkInterfaces").is_some());
        assert!(body["metadata"]["items"].is_array());
        assert!(body.get("serviceAccounts").is_none());
        assert!(body.get("labels").is_none());
    }
}
