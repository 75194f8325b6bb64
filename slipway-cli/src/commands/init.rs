//! Init command handler
//!
//! Writes a starter `pipeline.lua` plus the files a Lua language server
//! needs to offer completion for it (.luarc.json and the `slipway` stubs).

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use slipway_core::domain::ApplicationType;
use std::fs;
use std::path::Path;

/// Init arguments
#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    /// Application name (deployment, service and container name)
    #[arg(value_parser = parse_app_name)]
    pub app_name: String,

    /// Application type
    #[arg(value_parser = parse_app_type)]
    pub app_type: ApplicationType,

    /// Output directory for generated files
    #[arg(short, long, default_value = ".")]
    pub output: String,

    /// Overwrite an existing pipeline.lua
    #[arg(long)]
    pub force: bool,
}

fn parse_app_type(s: &str) -> std::result::Result<ApplicationType, String> {
    s.parse().map_err(|_| {
        format!(
            "unknown application type '{}' (expected one of: {})",
            s,
            ApplicationType::valid_names()
        )
    })
}

/// Accepts a DNS-1123 label: at most 63 lowercase alphanumerics or '-',
/// starting and ending with an alphanumeric
fn parse_app_name(s: &str) -> std::result::Result<String, String> {
    let valid_char = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    let valid = !s.is_empty()
        && s.len() <= 63
        && s.chars().all(|c| valid_char(c) || c == '-')
        && s.starts_with(valid_char)
        && s.ends_with(valid_char);

    if valid {
        Ok(s.to_string())
    } else {
        Err(format!(
            "invalid application name '{}' (expected lowercase letters, digits and '-', \
             at most 63 characters, starting and ending with a letter or digit)",
            s
        ))
    }
}

/// Handle the init command
pub fn handle_init(args: InitArgs) -> Result<()> {
    parse_app_name(&args.app_name).map_err(anyhow::Error::msg)?;

    let output_path = Path::new(&args.output);
    fs::create_dir_all(output_path)
        .with_context(|| format!("Failed to create output directory {:?}", output_path))?;

    generate_definition(output_path, &args)?;
    generate_luarc_json(output_path)?;
    generate_stub_file(output_path)?;

    println!("{}", "✓ Pipeline definition generated!".green().bold());
    println!();
    println!("{}", "Next steps:".bold());
    println!("  1. Adjust the parameters in pipeline.lua");
    println!(
        "  2. Check the result with {}",
        "slipway resolve".cyan()
    );
    println!(
        "  3. Preview the image with {}",
        "slipway plan --build-id 1".cyan()
    );

    Ok(())
}

/// Starter definition for an application
fn definition_template(app_name: &str, app_type: ApplicationType) -> String {
    format!(
        r#"-- Pipeline definition for {name}
return slipway.define {{
    appName = "{name}",
    appType = "{app_type}",
    environment = "stg",
    namespace = "intsys",
    exposePort = {port},
    memoryLimit = "512Mi",
    sonarEnabled = false,
}}
"#,
        name = app_name,
        app_type = app_type,
        port = app_type.default_expose_port()
    )
}

fn generate_definition(output_path: &Path, args: &InitArgs) -> Result<()> {
    let definition_path = output_path.join("pipeline.lua");

    if definition_path.exists() && !args.force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            definition_path.display()
        );
    }

    fs::write(
        &definition_path,
        definition_template(&args.app_name, args.app_type),
    )
    .with_context(|| format!("Failed to write pipeline definition to {:?}", definition_path))?;

    println!("  {} pipeline.lua", "Created".green());

    Ok(())
}

/// Generate .luarc.json for Lua LSP configuration
fn generate_luarc_json(output_path: &Path) -> Result<()> {
    let luarc_path = output_path.join(".luarc.json");

    let luarc_content = r#"{
  "$schema": "https://raw.githubusercontent.com/sumneko/vscode-lua/master/setting/schema.json",
  "runtime": {
    "version": "Lua 5.4"
  },
  "diagnostics": {
    "globals": ["slipway"]
  },
  "workspace": {
    "library": [".slipway/stubs"],
    "checkThirdParty": false
  }
}
"#;

    fs::write(&luarc_path, luarc_content)
        .with_context(|| format!("Failed to write .luarc.json to {:?}", luarc_path))?;

    println!("  {} .luarc.json", "Created".green());

    Ok(())
}

fn generate_stub_file(output_path: &Path) -> Result<()> {
    let stubs_dir = output_path.join(".slipway").join("stubs");
    fs::create_dir_all(&stubs_dir)
        .with_context(|| format!("Failed to create stubs directory at {:?}", stubs_dir))?;

    let stub_path = stubs_dir.join("slipway.lua");
    fs::write(&stub_path, slipway_lua::stubs::stubs())
        .with_context(|| format!("Failed to write stub file {:?}", stub_path))?;

    println!(
        "  {} in {}",
        "Stubs ready".green(),
        stubs_dir.display().to_string().cyan()
    );

    Ok(())
}
