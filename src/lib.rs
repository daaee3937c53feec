//! orchestrate-rs library
//!
//! Resolves "create an instance of size S from template T" into a fully
//! qualified Compute Engine instance creation request and submits it.
//!
//! # Pipeline
//!
//! - **Locate** the instance template `{template}-{size}`, or the family default
//! - **Split** template metadata into instance and extended metadata
//! - **Resolve** the boot image and the latest image in its family
//! - **Assemble** the descriptor: name, URLs, startup script
//! - **Submit** it through a [`compute::ComputeClient`]
//!
//! Nothing is submitted unless every stage succeeds.

pub mod compute;
pub mod config;
pub mod instances;
pub mod resolve;

mod error;

pub use error::OrchestrateError;
pub use instances::InstanceCreator;
pub use resolve::InstanceDescriptor;

use compute::MetadataItem;
use serde::{Deserialize, Serialize};

/// A request to create one instance from a template family
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreationRequest {
    pub project: String,
    pub zone: String,
    /// Template family, e.g. `render` for `render-8`
    pub template: String,
    /// Size suffix; the family default is used when absent
    pub size: Option<String>,
    /// Explicit instance name, used verbatim
    pub name: Option<String>,
    /// Appended to the template's instance metadata in this order
    pub metadata: Vec<MetadataItem>,
    /// Boot the latest image of the template image's family
    pub use_latest_image: bool,
}

impl CreationRequest {
    pub fn new(
        project: impl Into<String>,
        zone: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            zone: zone.into(),
            template: template.into(),
            ..Default::default()
        }
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push(MetadataItem::new(key, value));
        self
    }

    pub fn with_latest_image(mut self, use_latest_image: bool) -> Self {
        self.use_latest_image = use_latest_image;
        self
    }

    /// Check required fields
    pub fn validate(&self) -> Result<(), OrchestrateError> {
        for (field, value) in [
            ("project", &self.project),
            ("zone", &self.zone),
            ("template", &self.template),
        ] {
            if value.trim().is_empty() {
                return Err(OrchestrateError::InvalidRequest(format!(
                    "{} must not be empty",
                    field
                )));
            }
        }
        Ok(())
    }
}

/// Creation status as seen by this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreationStatus {
    /// Accepted by the remote API; completion is not tracked here
    Submitted,
}

impl std::fmt::Display for CreationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CreationStatus::Submitted => write!(f, "SUBMITTED"),
        }
    }
}

/// Result of a successful creation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateInstanceResponse {
    pub status: CreationStatus,
    /// Random correlation id, not used for deduplication
    pub request_id: String,
    /// Resolved instance name
    pub name: String,
    /// Remote operation name
    pub operation: String,
}
