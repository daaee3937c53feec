//! Boot image resolution
//!
//! Finds the template's boot disk, parses its source image reference and
//! fetches both that exact image and the latest image of its family.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, info};

use crate::compute::types::AttachedDisk;
use crate::compute::{ComputeClient, Image, InstanceTemplate};
use crate::OrchestrateError;

/// A parsed `.../projects/{project}/global/images/{version}` reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub project: String,
    pub version: String,
}

impl FromStr for ImageReference {
    type Err = OrchestrateError;

    fn from_str(link: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            OrchestrateError::InvalidImageReference(format!(
                "'{}' does not match .../projects/PROJECT/global/images/IMAGE",
                link
            ))
        };

        // Either a bare `projects/...` path or anything ending in `/projects/...`
        let rest = match link.strip_prefix("projects/") {
            Some(rest) => rest,
            None => {
                let idx = link.rfind("/projects/").ok_or_else(invalid)?;
                &link[idx + "/projects/".len()..]
            }
        };

        let (project, version) = rest.split_once("/global/images/").ok_or_else(invalid)?;

        if project.is_empty() || project.contains('/') || version.is_empty() || version.contains('/')
        {
            return Err(invalid());
        }

        Ok(Self {
            project: project.to_string(),
            version: version.to_string(),
        })
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "projects/{}/global/images/{}", self.project, self.version)
    }
}

/// The image a template references and the latest image of its family
#[derive(Debug, Clone, PartialEq)]
pub struct BootImages {
    pub exact: Image,
    pub latest: Image,
}

impl BootImages {
    /// The image that will actually be booted
    pub fn selected(&self, use_latest_image: bool) -> &Image {
        if use_latest_image {
            &self.latest
        } else {
            &self.exact
        }
    }
}

/// The single disk flagged as boot
pub fn find_boot_disk(disks: &[AttachedDisk]) -> Result<&AttachedDisk, OrchestrateError> {
    let mut boot = disks.iter().filter(|d| d.boot);
    match (boot.next(), boot.next()) {
        (Some(disk), None) => Ok(disk),
        (None, _) => Err(OrchestrateError::MissingBootDisk { found: 0 }),
        (Some(_), Some(_)) => Err(OrchestrateError::MissingBootDisk {
            found: disks.iter().filter(|d| d.boot).count(),
        }),
    }
}

/// Source image reference of the template's boot disk
pub fn boot_image_reference(template: &InstanceTemplate) -> Result<ImageReference, OrchestrateError> {
    let disk = find_boot_disk(&template.properties.disks)?;
    let link = disk
        .initialize_params
        .as_ref()
        .and_then(|p| p.source_image.as_deref())
        .ok_or_else(|| {
            OrchestrateError::InvalidImageReference(format!(
                "boot disk of template {} has no source image",
                template.name
            ))
        })?;

    link.parse()
}

/// Resolve the boot image and the latest image of its family
pub async fn resolve_boot_images(
    client: &dyn ComputeClient,
    template: &InstanceTemplate,
) -> Result<BootImages, OrchestrateError> {
    let reference = boot_image_reference(template)?;
    debug!("Boot image reference: {}", reference);

    let exact = client.get_image(&reference.project, &reference.version).await?;

    let family = exact.family.as_deref().filter(|f| !f.is_empty()).ok_or_else(|| {
        OrchestrateError::InvalidImageReference(format!(
            "image {} does not belong to an image family",
            exact.self_link
        ))
    })?;

    let latest = client
        .get_image_from_family(&reference.project, family)
        .await?;

    info!(
        "Boot image {} (latest in family {}: {})",
        exact.name, family, latest.name
    );

    Ok(BootImages { exact, latest })
}
