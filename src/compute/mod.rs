//! Compute Engine collaborator
//!
//! The resolver only talks to the provisioning API through [`ComputeClient`],
//! which the caller constructs once and hands in. Implementations must be
//! safe to share between concurrent creation requests.

pub mod mock;
pub mod rest;
pub mod types;

use async_trait::async_trait;

use crate::{InstanceDescriptor, OrchestrateError};
pub use types::{Image, InstanceTemplate, MetadataItem, Operation};

/// Operations the resolver needs from the provisioning API
#[async_trait]
pub trait ComputeClient: Send + Sync {
    /// Fetch an instance template by exact name
    async fn get_instance_template(
        &self,
        project: &str,
        name: &str,
    ) -> Result<InstanceTemplate, OrchestrateError>;

    /// List instance templates whose name starts with `prefix`, in listing order
    async fn list_instance_templates(
        &self,
        project: &str,
        prefix: &str,
    ) -> Result<Vec<InstanceTemplate>, OrchestrateError>;

    /// Fetch an image by exact name
    async fn get_image(&self, project: &str, image: &str) -> Result<Image, OrchestrateError>;

    /// Fetch the most recent image of a family
    async fn get_image_from_family(
        &self,
        project: &str,
        family: &str,
    ) -> Result<Image, OrchestrateError>;

    /// Submit an instance for creation
    ///
    /// A name collision must surface as `OrchestrateError::Compute` with status 409.
    async fn insert_instance(
        &self,
        project: &str,
        zone: &str,
        descriptor: &InstanceDescriptor,
    ) -> Result<Operation, OrchestrateError>;
}
