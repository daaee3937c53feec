//! Base OS classification of boot images
//!
//! An explicit OS label on the image wins. Otherwise the first token of the
//! image family is matched against the configured prefix lists, following
//! public image naming (`centos-7`, `ubuntu-1804-lts`, `windows-2019`).

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::compute::Image;
use crate::config::OsConfig;
use crate::OrchestrateError;

/// Base operating system of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsType {
    Linux,
    Windows,
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsType::Linux => write!(f, "linux"),
            OsType::Windows => write!(f, "windows"),
        }
    }
}

impl FromStr for OsType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linux" => Ok(OsType::Linux),
            "windows" => Ok(OsType::Windows),
            other => Err(format!("unknown OS type '{}'", other)),
        }
    }
}

/// Classifies images using an explicit label and family prefix lists
#[derive(Debug, Clone)]
pub struct OsClassifier {
    label: String,
    linux_prefixes: Vec<String>,
    windows_prefixes: Vec<String>,
}

impl OsClassifier {
    pub fn new(config: &OsConfig) -> Self {
        Self {
            label: config.label.clone(),
            linux_prefixes: config.linux_prefixes.iter().map(|p| p.to_lowercase()).collect(),
            windows_prefixes: config
                .windows_prefixes
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
        }
    }

    /// Classify an image
    pub fn classify(&self, image: &Image) -> Result<OsType, OrchestrateError> {
        if let Some(value) = image.labels.get(&self.label).filter(|v| !v.trim().is_empty()) {
            return value.parse().map_err(|e| OrchestrateError::UnknownOsType {
                image: image.self_link.clone(),
                reason: format!(
                    "{} label: {}. Set it to \"linux\" or \"windows\".",
                    self.label, e
                ),
            });
        }

        let family = image.family.as_deref().unwrap_or_default();
        let prefix = family.split('-').next().unwrap_or_default().to_lowercase();
        debug!("Guessing OS from family prefix '{}'", prefix);

        if self.windows_prefixes.contains(&prefix) {
            Ok(OsType::Windows)
        } else if self.linux_prefixes.contains(&prefix) {
            Ok(OsType::Linux)
        } else {
            Err(OrchestrateError::UnknownOsType {
                image: image.self_link.clone(),
                reason: format!(
                    "it has no {label} label and family '{family}' does not start with a \
                     recognized OS prefix (e.g. windows-, centos-). Add a {label} label set \
                     to \"linux\" or \"windows\", or rename the image family to start with \
                     the base OS name.",
                    label = self.label,
                    family = family,
                ),
            })
        }
    }
}

impl Default for OsClassifier {
    fn default() -> Self {
        Self::new(&OsConfig::default())
    }
}
