//! Post-boot configuration script selection
//!
//! Every instance gets exactly one startup script entry pointing at the
//! remote desktop configuration script for its OS. Script locations are
//! Jinja templates rendered over `bucket`, `project` and `os`.
//!
//! Clients cannot bring their own startup script through this path.

use minijinja::{Environment, context};

use super::os_type::OsType;
use crate::compute::MetadataItem;
use crate::config::{ScriptConfig, StartupConfig};
use crate::OrchestrateError;

/// Selects and renders the startup script entry for an OS
pub struct StartupScripts<'a> {
    config: &'a StartupConfig,
}

impl<'a> StartupScripts<'a> {
    pub fn new(config: &'a StartupConfig) -> Self {
        Self { config }
    }

    fn script(&self, os: OsType) -> &ScriptConfig {
        match os {
            OsType::Linux => &self.config.linux,
            OsType::Windows => &self.config.windows,
        }
    }

    /// Metadata item launching the configuration script for `os`
    pub fn select(&self, os: OsType, project: &str) -> Result<MetadataItem, OrchestrateError> {
        let script = self.script(os);
        if self.config.bucket.trim().is_empty() && script.url.contains("bucket") {
            return Err(OrchestrateError::Config(
                "startup.bucket is not set (ORCHESTRATE_BUCKET)".to_string(),
            ));
        }
        let url = render_url(&script.url, &self.config.bucket, project, os)?;
        Ok(MetadataItem::new(script.key.clone(), url))
    }
}

fn render_url(
    template: &str,
    bucket: &str,
    project: &str,
    os: OsType,
) -> Result<String, OrchestrateError> {
    let env = Environment::new();
    env.render_str(
        template,
        context! { bucket => bucket, project => project, os => os.to_string() },
    )
    .map_err(|e| {
        OrchestrateError::Config(format!(
            "Startup script location '{}' render error: {}",
            template, e
        ))
    })
}
