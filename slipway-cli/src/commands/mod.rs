//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod init;
mod inspect;
mod release;

pub use init::InitArgs;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde_json::Value as JsonValue;
use slipway_core::domain::{PipelineConfig, RawParameters};
use std::path::PathBuf;
use tracing::debug;

use crate::config::SettingsArgs;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Create a pipeline definition and editor support files
    Init(InitArgs),
    /// Resolve and print the effective configuration
    Resolve {
        #[command(flatten)]
        definition: DefinitionArgs,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the release plan of a build
    Plan {
        #[command(flatten)]
        release: ReleaseArgs,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Deploy an already published image to the cluster
    Deploy {
        #[command(flatten)]
        release: ReleaseArgs,
    },
    /// Build, scan and deploy
    Run {
        #[command(flatten)]
        release: ReleaseArgs,
    },
}

/// Where the pipeline definition comes from
#[derive(Args, Debug, Clone)]
pub struct DefinitionArgs {
    /// Path to the pipeline definition
    #[arg(short, long, default_value = "pipeline.lua")]
    pub file: PathBuf,

    /// Parameter overrides as key=value pairs (e.g., environment=prod)
    #[arg(short, long, value_parser = parse_key_val)]
    pub param: Vec<(String, String)>,
}

/// A definition plus the build being released
#[derive(Args, Debug, Clone)]
pub struct ReleaseArgs {
    #[command(flatten)]
    pub definition: DefinitionArgs,

    /// Build identifier used in the image tag
    #[arg(short, long, env = "BUILD_NUMBER")]
    pub build_id: u64,
}

/// Parse a single key=value pair
fn parse_key_val(s: &str) -> Result<(String, String)> {
    let pos = s
        .find('=')
        .ok_or_else(|| anyhow::anyhow!("invalid KEY=value: no `=` found in `{}`", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Loads the definition, applies overrides and resolves the configuration
fn load_config(args: &DefinitionArgs) -> Result<PipelineConfig> {
    let mut raw = slipway_lua::load_definition(&args.file)?;
    merge_overrides(&mut raw, &args.param);
    debug!("Resolved {} raw parameter(s) from {}", raw.len(), args.file.display());

    slipway_core::resolve(&raw)
        .with_context(|| format!("Invalid configuration in {}", args.file.display()))
}

/// Overrides replace file values and are passed on as strings
fn merge_overrides(raw: &mut RawParameters, overrides: &[(String, String)]) {
    for (key, value) in overrides {
        raw.insert(key.clone(), JsonValue::String(value.clone()));
    }
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `settings` - Runner settings flags, only read by commands that deploy
pub async fn handle_command(command: Commands, settings: SettingsArgs) -> Result<()> {
    match command {
        Commands::Init(args) => init::handle_init(args),
        Commands::Resolve { definition, json } => inspect::resolve(&definition, json),
        Commands::Plan { release, json } => inspect::plan(&release, json),
        Commands::Deploy { release } => {
            release::deploy(&release, settings.into_settings()?).await
        }
        Commands::Run { release } => release::run(&release, settings.into_settings()?).await,
    }
}
