//! orchestrate-rs - create Compute Engine instances from template families
//!
//! Resolves a template family and size into a fully-qualified instance
//! creation request and submits it, or prints it with `--dry-run`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use orchestrate_rs::compute::MetadataItem;
use orchestrate_rs::compute::rest::RestComputeClient;
use orchestrate_rs::config::{ConfigLoader, OrchestrateConfig};
use orchestrate_rs::{CreationRequest, InstanceCreator};

#[derive(Parser)]
#[command(name = "orchestrate-rs")]
#[command(author, version, about = "Create instances from Compute Engine instance templates", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Additional configuration file, applied last
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an instance from a template family
    Create {
        /// Project owning the templates and the new instance
        #[arg(long)]
        project: String,
        /// Zone to create the instance in
        #[arg(long)]
        zone: String,
        /// Template family, e.g. `render`
        #[arg(long)]
        template: String,
        /// Template size; the family default is used when omitted
        #[arg(long)]
        size: Option<String>,
        /// Explicit instance name
        #[arg(long)]
        name: Option<String>,
        /// Extra instance metadata
        #[arg(long = "metadata", value_name = "KEY=VALUE", value_parser = parse_metadata)]
        metadata: Vec<MetadataItem>,
        /// Boot the latest image of the template image's family
        #[arg(long)]
        use_latest_image: bool,
        /// Print the instance body instead of submitting it
        #[arg(long)]
        dry_run: bool,
        /// OAuth2 access token for the Compute Engine API
        #[arg(long, env = "ORCHESTRATE_ACCESS_TOKEN", hide_env_values = true)]
        access_token: Option<String>,
    },
    /// Print the effective configuration
    Config,
}

fn parse_metadata(s: &str) -> Result<MetadataItem, String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok(MetadataItem::new(key, value)),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

fn init_logging(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    // stdout carries the JSON result
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

async fn load_config(path: Option<PathBuf>) -> Result<OrchestrateConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = path {
        loader = loader.with_file(path);
    }
    Ok(loader.load().await?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = load_config(cli.config).await?;

    match cli.command {
        Commands::Create {
            project,
            zone,
            template,
            size,
            name,
            metadata,
            use_latest_image,
            dry_run,
            access_token,
        } => {
            let request = CreationRequest {
                project,
                zone,
                template,
                size,
                name,
                metadata,
                use_latest_image,
            };

            let mut client = RestComputeClient::new(&config.compute)?;
            if let Some(token) = access_token {
                client = client.with_access_token(token);
            }
            let creator = InstanceCreator::new(Arc::new(client), config);

            if dry_run {
                info!("Dry run, nothing will be submitted");
                let descriptor = creator.build_descriptor(&request).await?;
                println!("{}", serde_json::to_string_pretty(&descriptor)?);
            } else {
                let response = creator.create(&request).await?;
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
        }
        Commands::Config => {
            print!("{}", config.to_yaml()?);
        }
    }

    Ok(())
}
