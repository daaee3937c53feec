//! Orchestrate configuration
//!
//! Settings that shape how templates are resolved: the reserved metadata
//! prefix, naming defaults, the OS heuristic allow-list and startup script
//! locations. Loaded from YAML and layered by [`loader`].

pub mod loader;
pub mod merge;

use serde::{Deserialize, Serialize};

pub use loader::ConfigLoader;

/// Highest config schema version understood by this build
pub const CONFIG_VERSION: u32 = 1;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestrateConfig {
    /// Schema version of the config file
    pub version: u32,

    /// Compute API access
    pub compute: ComputeConfig,

    /// Extended metadata conventions
    pub metadata: MetadataConfig,

    /// Instance naming
    pub naming: NamingConfig,

    /// OS classification
    pub os: OsConfig,

    /// Post-boot configuration scripts
    pub startup: StartupConfig,

    /// Fallback values
    pub defaults: DefaultsConfig,
}

impl Default for OrchestrateConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            compute: ComputeConfig::default(),
            metadata: MetadataConfig::default(),
            naming: NamingConfig::default(),
            os: OsConfig::default(),
            startup: StartupConfig::default(),
            defaults: DefaultsConfig::default(),
        }
    }
}

impl OrchestrateConfig {
    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

/// Compute API endpoint settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeConfig {
    /// REST endpoint the client talks to
    pub endpoint: String,
    /// Prefix for fully-qualified resource URLs in the descriptor
    pub resource_base: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://compute.googleapis.com/compute/v1".to_string(),
            resource_base: "https://www.googleapis.com/compute/v1".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 5,
        }
    }
}

/// Extended metadata conventions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Reserved key prefix marking extended metadata
    pub prefix: String,
    /// Extended key (unprefixed) marking a template as the family default
    pub default_size_key: String,
    /// Value the default size key must carry
    pub default_size_value: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            prefix: "orchestrate_".to_string(),
            default_size_key: "default_size".to_string(),
            default_size_value: "true".to_string(),
        }
    }
}

impl MetadataConfig {
    /// Full template metadata key of the default size marker
    pub fn default_size_marker(&self) -> String {
        format!("{}{}", self.prefix, self.default_size_key)
    }
}

/// What to do with placeholders a name pattern references but nobody knows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedPlaceholder {
    /// Leave `{unknown}` in the name as written
    #[default]
    Keep,
    /// Reject the pattern
    Fail,
}

/// Instance naming settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Pattern used when neither the request nor the template names the instance
    pub default_pattern: String,
    pub unresolved: UnresolvedPlaceholder,
    /// Length of the random `{id}` / `{user}` token
    pub token_length: usize,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            default_pattern: "{template}-{size}-{id}".to_string(),
            unresolved: UnresolvedPlaceholder::Keep,
            token_length: 5,
        }
    }
}

/// OS classification settings
///
/// The prefix lists are matched against the first hyphen-delimited token of
/// an image family (`centos-7` -> `centos`). Drop-in configs append to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsConfig {
    /// Image label that states the OS explicitly
    pub label: String,
    pub linux_prefixes: Vec<String>,
    pub windows_prefixes: Vec<String>,
}

impl Default for OsConfig {
    fn default() -> Self {
        Self {
            label: "orchestrate_os".to_string(),
            linux_prefixes: ["centos", "debian", "rhel", "sles", "cos", "coreos", "ubuntu"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            windows_prefixes: vec!["windows".to_string()],
        }
    }
}

/// One startup script entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Instance metadata key
    pub key: String,
    /// Script location, a Jinja template over `bucket`, `project` and `os`
    pub url: String,
}

/// Startup script settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    /// Bucket holding the configuration scripts
    pub bucket: String,
    pub linux: ScriptConfig,
    pub windows: ScriptConfig,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            linux: ScriptConfig {
                key: "startup-script-url".to_string(),
                url: "gs://{{ bucket }}/remotedesktopconfigure.py".to_string(),
            },
            windows: ScriptConfig {
                key: "windows-startup-script-url".to_string(),
                url: "gs://{{ bucket }}/remotedesktopconfigure.ps1".to_string(),
            },
        }
    }
}

/// Fallback values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Network used when the template carries no network override
    pub network: String,
    /// Machine type used when neither override nor template declares one
    pub machine_type: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            network: "default".to_string(),
            machine_type: "n1-standard-8".to_string(),
        }
    }
}
