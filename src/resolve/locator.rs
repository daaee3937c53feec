//! Template lookup
//!
//! Templates are named `{family}-{size}`. Without a size, the first template
//! of the family carrying the default size marker wins, in listing order.

use tracing::{debug, info, warn};

use crate::compute::{ComputeClient, InstanceTemplate};
use crate::config::MetadataConfig;
use crate::OrchestrateError;

/// A located template and the size it was resolved for
#[derive(Debug, Clone)]
pub struct LocatedTemplate {
    pub template: InstanceTemplate,
    pub size: String,
}

/// Find the template for `family` and `size`, or the family default
pub async fn locate_template(
    client: &dyn ComputeClient,
    metadata: &MetadataConfig,
    project: &str,
    family: &str,
    size: Option<&str>,
) -> Result<LocatedTemplate, OrchestrateError> {
    match size.filter(|s| !s.is_empty()) {
        Some(size) => {
            let name = format!("{}-{}", family, size);
            info!("Finding instance template {}", name);

            let template = client
                .get_instance_template(project, &name)
                .await
                .map_err(|e| {
                    if e.is_not_found() {
                        OrchestrateError::TemplateNotFound {
                            project: project.to_string(),
                            name: name.clone(),
                        }
                    } else {
                        e
                    }
                })?;

            Ok(LocatedTemplate {
                template,
                size: size.to_string(),
            })
        }
        None => locate_default(client, metadata, project, family).await,
    }
}

async fn locate_default(
    client: &dyn ComputeClient,
    metadata: &MetadataConfig,
    project: &str,
    family: &str,
) -> Result<LocatedTemplate, OrchestrateError> {
    info!("Locating default size for template {}", family);

    let prefix = format!("{}-", family);
    let marker = metadata.default_size_marker();
    let templates = client.list_instance_templates(project, &prefix).await?;
    debug!("Scanning {} templates for {}", templates.len(), marker);

    let mut defaults = templates.into_iter().filter(|template| {
        template
            .metadata_items()
            .iter()
            .any(|item| item.key == marker && item.value == metadata.default_size_value)
    });

    let Some(template) = defaults.next() else {
        return Err(OrchestrateError::NoDefaultSizeConfigured {
            project: project.to_string(),
            family: family.to_string(),
        });
    };

    if let Some(other) = defaults.next() {
        warn!(
            "Templates {} and {} are both marked as default size; using {}",
            template.name, other.name, template.name
        );
    }

    info!("Found instance template {}", template.name);
    let size = match template.name.strip_prefix(&prefix) {
        Some(size) if !size.is_empty() => size.to_string(),
        _ => {
            warn!(
                "Default template {} is not named {}SIZE; size is left empty",
                template.name, prefix
            );
            String::new()
        }
    };

    Ok(LocatedTemplate { template, size })
}
