//! Configuration loader
//!
//! Loads and merges configuration layers from standard locations, an explicit
//! file and the environment.

use super::{CONFIG_VERSION, OrchestrateConfig, merge};
use crate::OrchestrateError;
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// System configuration directory
pub const CONFIG_DIR: &str = "/etc/orchestrate";

/// Overrides the startup script bucket
pub const ENV_BUCKET: &str = "ORCHESTRATE_BUCKET";

/// Overrides the Compute API endpoint
pub const ENV_COMPUTE_ENDPOINT: &str = "ORCHESTRATE_COMPUTE_ENDPOINT";

/// Load a single configuration layer
///
/// Missing, empty and unparseable files yield `None`.
async fn load_layer_file(path: impl AsRef<Path>) -> Result<Option<Value>, OrchestrateError> {
    let path = path.as_ref();

    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).await?;
    if content.trim().is_empty() {
        return Ok(None);
    }

    match serde_yaml::from_str::<Value>(&content) {
        Ok(value @ Value::Mapping(_)) => Ok(Some(value)),
        Ok(_) => {
            warn!("Ignoring {}: not a YAML mapping", path.display());
            Ok(None)
        }
        Err(e) => {
            warn!("Failed to parse {}: {}", path.display(), e);
            Ok(None)
        }
    }
}

/// Load all drop-in layers from a directory (sorted alphabetically)
async fn load_dropin_layers(dir: impl AsRef<Path>) -> Result<Vec<Value>, OrchestrateError> {
    let dir = dir.as_ref();

    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    let mut read_dir = fs::read_dir(dir).await?;
    while let Some(entry) = read_dir.next_entry().await? {
        let path = entry.path();
        if path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml")
        {
            entries.push(path);
        }
    }
    entries.sort();

    let mut layers = Vec::new();
    for path in entries {
        if let Some(layer) = load_layer_file(&path).await? {
            debug!("Loaded drop-in config from {}", path.display());
            layers.push(layer);
        }
    }

    info!("Loaded {} drop-in configs", layers.len());
    Ok(layers)
}

/// Apply environment overrides using the given variable lookup
pub fn apply_env_overrides<F>(config: &mut OrchestrateConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(bucket) = lookup(ENV_BUCKET).filter(|v| !v.is_empty()) {
        debug!("Using startup bucket from {}", ENV_BUCKET);
        config.startup.bucket = bucket;
    }

    if let Some(endpoint) = lookup(ENV_COMPUTE_ENDPOINT).filter(|v| !v.is_empty()) {
        debug!("Using compute endpoint from {}", ENV_COMPUTE_ENDPOINT);
        config.compute.endpoint = endpoint;
    }
}

/// Configuration loader builder
pub struct ConfigLoader {
    config_dir: PathBuf,
    include_system: bool,
    include_env: bool,
    file: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader reading /etc/orchestrate and the environment
    pub fn new() -> Self {
        Self {
            config_dir: PathBuf::from(CONFIG_DIR),
            include_system: true,
            include_env: true,
            file: None,
        }
    }

    /// Use a custom configuration directory
    pub fn with_config_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Add an explicit configuration file on top of the system layers
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Skip the system file and drop-ins
    pub fn skip_system(mut self) -> Self {
        self.include_system = false;
        self
    }

    /// Skip environment overrides
    pub fn skip_env(mut self) -> Self {
        self.include_env = false;
        self
    }

    /// Main configuration file
    pub fn main_config(&self) -> PathBuf {
        self.config_dir.join("orchestrate.yaml")
    }

    /// Drop-in directory
    pub fn config_d(&self) -> PathBuf {
        self.config_dir.join("orchestrate.d")
    }

    /// Load and merge all layers
    pub async fn load(self) -> Result<OrchestrateConfig, OrchestrateError> {
        let mut layers = Vec::new();

        if self.include_system {
            if let Some(layer) = load_layer_file(self.main_config()).await? {
                debug!("Loaded base config from {}", self.main_config().display());
                layers.push(layer);
            }
            layers.extend(load_dropin_layers(self.config_d()).await?);
        }

        if let Some(file) = &self.file {
            if !file.exists() {
                return Err(OrchestrateError::Config(format!(
                    "config file {} does not exist",
                    file.display()
                )));
            }
            let content = fs::read_to_string(file).await?;
            if !content.trim().is_empty() {
                layers.push(serde_yaml::from_str(&content)?);
            }
        }

        let mut config = merge::merge_layers(&layers)?;

        if config.version > CONFIG_VERSION {
            warn!(
                "Config version {} is newer than supported version {}; unknown keys are ignored",
                config.version, CONFIG_VERSION
            );
        }

        if self.include_env {
            apply_env_overrides(&mut config, |key| std::env::var(key).ok());
        }

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_layer_file_not_exists() {
        let result = load_layer_file("/nonexistent/path").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_load_layer_file_invalid_is_skipped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.yaml");
        fs::write(&path, "startup: [unclosed").await.unwrap();

        assert!(load_layer_file(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_dropin_layers_sorted() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("orchestrate.d");
        fs::create_dir_all(&dir).await.unwrap();

        fs::write(dir.join("10-override.yaml"), "startup:\n  bucket: override")
            .await
            .unwrap();
        fs::write(dir.join("00-base.yml"), "startup:\n  bucket: base")
            .await
            .unwrap();
        fs::write(dir.join("ignored.txt"), "startup:\n  bucket: ignored")
            .await
            .unwrap();

        let layers = load_dropin_layers(&dir).await.unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0]["startup"]["bucket"].as_str(), Some("base"));
        assert_eq!(layers[1]["startup"]["bucket"].as_str(), Some("override"));
    }

    #[tokio::test]
    async fn test_loader_merges_system_dropins_and_file() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("etc");
        fs::create_dir_all(dir.join("orchestrate.d")).await.unwrap();

        fs::write(
            dir.join("orchestrate.yaml"),
            "startup:\n  bucket: system\ndefaults:\n  network: workstations",
        )
        .await
        .unwrap();
        fs::write(
            dir.join("orchestrate.d/50-os.yaml"),
            "os:\n  linux_prefixes: [rocky]",
        )
        .await
        .unwrap();

        let explicit = temp.path().join("explicit.yaml");
        fs::write(&explicit, "startup:\n  bucket: explicit")
            .await
            .unwrap();

        let config = ConfigLoader::new()
            .with_config_dir(&dir)
            .with_file(&explicit)
            .skip_env()
            .load()
            .await
            .unwrap();

        assert_eq!(config.startup.bucket, "explicit");
        assert_eq!(config.defaults.network, "workstations");
        assert!(config.os.linux_prefixes.contains(&"rocky".to_string()));
        assert!(config.os.linux_prefixes.contains(&"ubuntu".to_string()));
    }

    #[tokio::test]
    async fn test_loader_missing_explicit_file_fails() {
        let result = ConfigLoader::new()
            .skip_system()
            .skip_env()
            .with_file("/nonexistent/orchestrate.yaml")
            .load()
            .await;

        assert!(matches!(result, Err(OrchestrateError::Config(_))));
    }

    #[tokio::test]
    async fn test_loader_malformed_explicit_file_fails() {
        let temp = TempDir::new().unwrap();
        let explicit = temp.path().join("explicit.yaml");
        fs::write(&explicit, "startup: [unclosed").await.unwrap();

        let result = ConfigLoader::new()
            .skip_system()
            .skip_env()
            .with_file(&explicit)
            .load()
            .await;

        assert!(matches!(result, Err(OrchestrateError::Yaml(_))));
    }

    #[tokio::test]
    async fn test_loader_defaults_without_layers() {
        let config = ConfigLoader::new().skip_system().skip_env().load().await.unwrap();
        assert_eq!(config, OrchestrateConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_BUCKET, "env-bucket"),
            (ENV_COMPUTE_ENDPOINT, "http://localhost:8080"),
        ]);

        let mut config = OrchestrateConfig::default();
        apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.startup.bucket, "env-bucket");
        assert_eq!(config.compute.endpoint, "http://localhost:8080");
    }

    #[test]
    fn test_env_empty_value_ignored() {
        let mut config = OrchestrateConfig::default();
        apply_env_overrides(&mut config, |_| Some(String::new()));
        assert_eq!(config, OrchestrateConfig::default());
    }
}
