//! Instance creation
//!
//! Runs the resolution pipeline against a [`ComputeClient`] and submits the
//! resulting descriptor. No remote write happens unless every stage succeeds.

use std::sync::Arc;
use tracing::{debug, info};

use crate::compute::ComputeClient;
use crate::config::OrchestrateConfig;
use crate::resolve::{
    DescriptorInputs, InstanceDescriptor, UniqueToken, assemble, locate_template,
    resolve_boot_images, split_metadata,
};
use crate::{CreateInstanceResponse, CreationRequest, CreationStatus, OrchestrateError};

/// Creates instances from template families
pub struct InstanceCreator {
    client: Arc<dyn ComputeClient>,
    config: OrchestrateConfig,
}

impl InstanceCreator {
    pub fn new(client: Arc<dyn ComputeClient>, config: OrchestrateConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &OrchestrateConfig {
        &self.config
    }

    /// Resolve a request into a descriptor without submitting it
    pub async fn build_descriptor(
        &self,
        request: &CreationRequest,
    ) -> Result<InstanceDescriptor, OrchestrateError> {
        let token = {
            let mut rng = rand::thread_rng();
            UniqueToken::generate(&mut rng, self.config.naming.token_length)
        };
        self.build_descriptor_with_token(request, &token).await
    }

    /// Resolve a request using a caller-supplied unique token
    pub async fn build_descriptor_with_token(
        &self,
        request: &CreationRequest,
        token: &UniqueToken,
    ) -> Result<InstanceDescriptor, OrchestrateError> {
        request.validate()?;
        let client = self.client.as_ref();

        let located = locate_template(
            client,
            &self.config.metadata,
            &request.project,
            &request.template,
            request.size.as_deref(),
        )
        .await?;

        let (instance_metadata, extended) = split_metadata(
            &located.template,
            &request.metadata,
            &self.config.metadata.prefix,
        );
        debug!(
            "Template {}: {} instance metadata items, {} extended",
            located.template.name,
            instance_metadata.len(),
            extended.len()
        );

        let images = resolve_boot_images(client, &located.template).await?;

        assemble(
            DescriptorInputs {
                request,
                located: &located,
                instance_metadata,
                extended: &extended,
                images: &images,
                token,
            },
            &self.config,
        )
    }

    /// Resolve and submit a creation request
    pub async fn create(
        &self,
        request: &CreationRequest,
    ) -> Result<CreateInstanceResponse, OrchestrateError> {
        let request_id = uuid::Uuid::new_v4().simple().to_string();
        info!(
            "Creation request {}: template {} in {}",
            request_id, request.template, request.project
        );

        let descriptor = self.build_descriptor(request).await?;
        self.submit(request, &descriptor, request_id).await
    }

    /// Submit an already-assembled descriptor
    pub async fn submit(
        &self,
        request: &CreationRequest,
        descriptor: &InstanceDescriptor,
        request_id: String,
    ) -> Result<CreateInstanceResponse, OrchestrateError> {
        let operation = self
            .client
            .insert_instance(&request.project, &request.zone, descriptor)
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    OrchestrateError::InstanceNameConflict {
                        name: descriptor.name.clone(),
                    }
                } else {
                    e
                }
            })?;

        info!(
            "Submitted instance {} in {} (operation {})",
            descriptor.name, request.zone, operation.name
        );

        Ok(CreateInstanceResponse {
            status: CreationStatus::Submitted,
            request_id,
            name: descriptor.name.clone(),
            operation: operation.name,
        })
    }
}
