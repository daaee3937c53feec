//! Compute Engine REST client
//!
//! Talks to the Compute Engine v1 JSON API.
//! <https://cloud.google.com/compute/docs/reference/rest/v1>

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::ComputeClient;
use super::types::{Image, InstanceTemplate, InstanceTemplateList, Operation};
use crate::config::ComputeConfig;
use crate::{InstanceDescriptor, OrchestrateError};

/// Google API error envelope
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Compute Engine client over HTTPS
pub struct RestComputeClient {
    client: Client,
    base_url: String,
    access_token: Option<String>,
}

impl RestComputeClient {
    /// Create a client for the configured endpoint
    pub fn new(config: &ComputeConfig) -> Result<Self, OrchestrateError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            access_token: None,
        })
    }

    /// Create with a custom base URL (for testing)
    pub fn with_base_url(base_url: &str) -> Result<Self, OrchestrateError> {
        let config = ComputeConfig {
            endpoint: base_url.to_string(),
            ..Default::default()
        };
        Self::new(&config)
    }

    /// Authenticate requests with an OAuth2 bearer token
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, OrchestrateError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self
            .authorize(self.client.get(&url).query(query))
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }
}

/// Turn a non-success response into `OrchestrateError::Compute`
async fn check_status(response: Response) -> Result<Response, OrchestrateError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ if body.is_empty() => status.to_string(),
        _ => body,
    };

    Err(OrchestrateError::Compute {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ComputeClient for RestComputeClient {
    async fn get_instance_template(
        &self,
        project: &str,
        name: &str,
    ) -> Result<InstanceTemplate, OrchestrateError> {
        self.get_json(
            &format!("projects/{}/global/instanceTemplates/{}", project, name),
            &[],
        )
        .await
    }

    async fn list_instance_templates(
        &self,
        project: &str,
        prefix: &str,
    ) -> Result<Vec<InstanceTemplate>, OrchestrateError> {
        let path = format!("projects/{}/global/instanceTemplates", project);
        let filter = format!("name = \"{}*\"", prefix);

        let mut templates = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query = vec![("filter", filter.as_str())];
            if let Some(token) = &page_token {
                query.push(("pageToken", token.as_str()));
            }

            let page: InstanceTemplateList = self.get_json(&path, &query).await?;
            templates.extend(page.items);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        debug!("Listed {} templates matching {}", templates.len(), filter);
        Ok(templates)
    }

    async fn get_image(&self, project: &str, image: &str) -> Result<Image, OrchestrateError> {
        self.get_json(&format!("projects/{}/global/images/{}", project, image), &[])
            .await
    }

    async fn get_image_from_family(
        &self,
        project: &str,
        family: &str,
    ) -> Result<Image, OrchestrateError> {
        self.get_json(
            &format!("projects/{}/global/images/family/{}", project, family),
            &[],
        )
        .await
    }

    async fn insert_instance(
        &self,
        project: &str,
        zone: &str,
        descriptor: &InstanceDescriptor,
    ) -> Result<Operation, OrchestrateError> {
        let url = format!("{}/projects/{}/zones/{}/instances", self.base_url, project, zone);
        debug!("POST {}", url);

        let response = self
            .authorize(self.client.post(&url).json(descriptor))
            .send()
            .await?;

        Ok(check_status(response).await?.json().await?)
    }
}
