//! Error types for orchestrate-rs

use thiserror::Error;

/// Main error type for orchestrate-rs operations
#[derive(Error, Debug)]
pub enum OrchestrateError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Instance template {name} not found in project {project}")]
    TemplateNotFound { project: String, name: String },

    #[error(
        "Could not locate default size for project {project} template {family}. \
         Please specify an explicit size in the request."
    )]
    NoDefaultSizeConfigured { project: String, family: String },

    #[error("Template must have exactly one boot disk, found {found}")]
    MissingBootDisk { found: usize },

    #[error("Invalid image reference: {0}")]
    InvalidImageReference(String),

    #[error("Cannot determine the base OS of image {image}: {reason}")]
    UnknownOsType { image: String, reason: String },

    #[error("Invalid instance name pattern '{pattern}': {message}")]
    NamePattern { pattern: String, message: String },

    #[error("An instance with name {name} already exists.")]
    InstanceNameConflict { name: String },

    #[error("Compute API returned {status}: {message}")]
    Compute { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OrchestrateError {
    /// Create a name pattern error
    pub fn name_pattern(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NamePattern {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Whether this is a remote "resource not found" reply
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Compute { status: 404, .. })
    }

    /// Whether this is a remote "already exists" reply
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Compute { status: 409, .. })
    }
}
