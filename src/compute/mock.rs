//! Mock Compute client for testing
//!
//! Serves templates and images from memory and records every call so tests
//! can assert on the exact remote traffic a resolution produced.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::ComputeClient;
use super::types::{Image, InstanceTemplate, Operation};
use crate::{InstanceDescriptor, OrchestrateError};

/// A call received by [`MockCompute`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComputeCall {
    GetTemplate { project: String, name: String },
    ListTemplates { project: String, prefix: String },
    GetImage { project: String, image: String },
    GetImageFromFamily { project: String, family: String },
    InsertInstance { project: String, zone: String, name: String },
}

/// Mock Compute client
///
/// # Example
/// ```
/// use orchestrate_rs::compute::mock::MockCompute;
/// use orchestrate_rs::compute::types::{Image, InstanceTemplate};
///
/// let mock = MockCompute::new()
///     .with_template(InstanceTemplate {
///         name: "render-8".to_string(),
///         ..Default::default()
///     })
///     .with_image("images-project", Image {
///         name: "centos-7-v1".to_string(),
///         family: Some("centos-7".to_string()),
///         ..Default::default()
///     });
/// ```
pub struct MockCompute {
    templates: Vec<InstanceTemplate>,
    images: HashMap<(String, String), Image>,
    families: HashMap<(String, String), Image>,
    insert_error: Option<(u16, String)>,
    calls: Mutex<Vec<ComputeCall>>,
    inserted: Mutex<Vec<InstanceDescriptor>>,
}

impl MockCompute {
    /// Create an empty mock
    pub fn new() -> Self {
        Self {
            templates: Vec::new(),
            images: HashMap::new(),
            families: HashMap::new(),
            insert_error: None,
            calls: Mutex::new(Vec::new()),
            inserted: Mutex::new(Vec::new()),
        }
    }

    /// Add a template (listing returns templates in insertion order)
    pub fn with_template(mut self, template: InstanceTemplate) -> Self {
        self.templates.push(template);
        self
    }

    /// Add an image, fetchable by name
    pub fn with_image(mut self, project: &str, image: Image) -> Self {
        self.images
            .insert((project.to_string(), image.name.clone()), image);
        self
    }

    /// Set the latest image of a family
    pub fn with_family_latest(mut self, project: &str, family: &str, image: Image) -> Self {
        self.families
            .insert((project.to_string(), family.to_string()), image);
        self
    }

    /// Make `insert_instance` fail with the given HTTP status
    pub fn with_insert_error(mut self, status: u16, message: &str) -> Self {
        self.insert_error = Some((status, message.to_string()));
        self
    }

    /// Calls received so far
    pub fn calls(&self) -> Vec<ComputeCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Descriptors accepted by `insert_instance`
    pub fn inserted(&self) -> Vec<InstanceDescriptor> {
        self.inserted.lock().map(|i| i.clone()).unwrap_or_default()
    }

    /// Whether a listing call was made
    pub fn listed(&self) -> bool {
        self.calls()
            .iter()
            .any(|call| matches!(call, ComputeCall::ListTemplates { .. }))
    }

    fn record(&self, call: ComputeCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn not_found(what: String) -> OrchestrateError {
        OrchestrateError::Compute {
            status: 404,
            message: format!("The resource '{}' was not found", what),
        }
    }
}

impl Default for MockCompute {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ComputeClient for MockCompute {
    async fn get_instance_template(
        &self,
        project: &str,
        name: &str,
    ) -> Result<InstanceTemplate, OrchestrateError> {
        self.record(ComputeCall::GetTemplate {
            project: project.to_string(),
            name: name.to_string(),
        });

        self.templates
            .iter()
            .find(|t| t.name == name)
            .cloned()
            .ok_or_else(|| Self::not_found(format!("instanceTemplates/{}", name)))
    }

    async fn list_instance_templates(
        &self,
        project: &str,
        prefix: &str,
    ) -> Result<Vec<InstanceTemplate>, OrchestrateError> {
        self.record(ComputeCall::ListTemplates {
            project: project.to_string(),
            prefix: prefix.to_string(),
        });

        Ok(self
            .templates
            .iter()
            .filter(|t| t.name.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn get_image(&self, project: &str, image: &str) -> Result<Image, OrchestrateError> {
        self.record(ComputeCall::GetImage {
            project: project.to_string(),
            image: image.to_string(),
        });

        self.images
            .get(&(project.to_string(), image.to_string()))
            .cloned()
            .ok_or_else(|| Self::not_found(format!("images/{}", image)))
    }

    async fn get_image_from_family(
        &self,
        project: &str,
        family: &str,
    ) -> Result<Image, OrchestrateError> {
        self.record(ComputeCall::GetImageFromFamily {
            project: project.to_string(),
            family: family.to_string(),
        });

        self.families
            .get(&(project.to_string(), family.to_string()))
            .cloned()
            .ok_or_else(|| Self::not_found(format!("images/family/{}", family)))
    }

    async fn insert_instance(
        &self,
        project: &str,
        zone: &str,
        descriptor: &InstanceDescriptor,
    ) -> Result<Operation, OrchestrateError> {
        self.record(ComputeCall::InsertInstance {
            project: project.to_string(),
            zone: zone.to_string(),
            name: descriptor.name.clone(),
        });

        if let Some((status, message)) = &self.insert_error {
            return Err(OrchestrateError::Compute {
                status: *status,
                message: message.clone(),
            });
        }

        if let Ok(mut inserted) = self.inserted.lock() {
            inserted.push(descriptor.clone());
        }

        Ok(Operation {
            name: format!("operation-{}", descriptor.name),
            status: Some("PENDING".to_string()),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(name: &str) -> InstanceTemplate {
        InstanceTemplate {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_mock_get_template_records_call() {
        let mock = MockCompute::new().with_template(template("render-8"));

        let found = mock.get_instance_template("p", "render-8").await.unwrap();
        assert_eq!(found.name, "render-8");
        assert_eq!(
            mock.calls(),
            vec![ComputeCall::GetTemplate {
                project: "p".to_string(),
                name: "render-8".to_string(),
            }]
        );
        assert!(!mock.listed());
    }

    #[tokio::test]
    async fn test_mock_missing_template_is_not_found() {
        let mock = MockCompute::new();
        let err = mock.get_instance_template("p", "nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_mock_list_filters_by_prefix_in_order() {
        let mock = MockCompute::new()
            .with_template(template("render-16"))
            .with_template(template("other-8"))
            .with_template(template("render-8"));

        let listed = mock.list_instance_templates("p", "render-").await.unwrap();
        let names: Vec<_> = listed.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["render-16", "render-8"]);
        assert!(mock.listed());
    }

    #[tokio::test]
    async fn test_mock_insert_error() {
        let mock = MockCompute::new().with_insert_error(409, "already exists");
        let descriptor = InstanceDescriptor {
            name: "vm".to_string(),
            ..Default::default()
        };

        let err = mock.insert_instance("p", "z", &descriptor).await.unwrap_err();
        assert!(err.is_conflict());
        assert!(mock.inserted().is_empty());
    }
}
