//! Fully-qualified Compute Engine resource URLs

use super::region_of;

/// Builds resource URLs scoped to one project and zone
#[derive(Debug, Clone)]
pub struct ResourceUrls {
    base: String,
    project: String,
    zone: String,
}

impl ResourceUrls {
    pub fn new(base: &str, project: &str, zone: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            project: project.to_string(),
            zone: zone.to_string(),
        }
    }

    /// Region the zone belongs to
    pub fn region(&self) -> &str {
        region_of(&self.zone)
    }

    /// Qualify `value`, building `{scope}/{collection}/{value}` for bare names.
    /// Absolute URLs are kept and `projects/...` paths are put under the base.
    fn qualify(&self, scope: &str, collection: &str, value: &str) -> String {
        if value.starts_with("https://") || value.starts_with("http://") {
            value.to_string()
        } else if value.starts_with("projects/") {
            format!("{}/{}", self.base, value)
        } else {
            format!(
                "{}/projects/{}/{}/{}/{}",
                self.base, self.project, scope, collection, value
            )
        }
    }

    fn zone_scope(&self) -> String {
        format!("zones/{}", self.zone)
    }

    pub fn machine_type(&self, machine_type: &str) -> String {
        self.qualify(&self.zone_scope(), "machineTypes", machine_type)
    }

    pub fn accelerator_type(&self, accelerator_type: &str) -> String {
        self.qualify(&self.zone_scope(), "acceleratorTypes", accelerator_type)
    }

    pub fn disk_type(&self, disk_type: &str) -> String {
        self.qualify(&self.zone_scope(), "diskTypes", disk_type)
    }

    pub fn network(&self, network: &str) -> String {
        self.qualify("global", "networks", network)
    }

    /// Subnetwork in the zone's region
    pub fn subnetwork(&self, subnetwork: &str) -> String {
        let scope = format!("regions/{}", self.region());
        self.qualify(&scope, "subnetworks", subnetwork)
    }
}
