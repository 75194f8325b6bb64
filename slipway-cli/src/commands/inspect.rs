//! Resolve and plan command handlers
//!
//! Both are dry runs: nothing outside the definition file is touched.

use anyhow::Result;
use colored::*;
use slipway_core::domain::{PipelineConfig, ReleasePlan};

use super::{DefinitionArgs, ReleaseArgs, load_config};

/// Print the effective configuration
pub fn resolve(args: &DefinitionArgs, json: bool) -> Result<()> {
    let config = load_config(args)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print_config(&config);
    }

    Ok(())
}

/// Print the release plan for the given build
pub fn plan(args: &ReleaseArgs, json: bool) -> Result<()> {
    let config = load_config(&args.definition)?;
    let plan = slipway_core::plan(&config, args.build_id);

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&config, &plan);
    }

    Ok(())
}

fn print_config(config: &PipelineConfig) {
    println!("{}", "Pipeline Configuration:".bold());
    println!("  App:         {}", config.app_name.bold());
    println!("  Type:        {}", config.app_type.to_string().cyan());
    println!("  Environment: {}", config.environment);
    println!("  Namespace:   {}", config.namespace);
    println!("  Project:     {}", config.project);
    println!("  Port:        {}", config.expose_port);
    println!("  Registry:    {}", config.registry_host.dimmed());
    println!("  Pull secret: {}", config.harbour_secret);
    println!(
        "  Resources:   memory={} cpu={}",
        config.resources.memory,
        config.resources.cpu.as_deref().unwrap_or("-")
    );

    if config.sonar.enabled {
        println!(
            "  Sonar:       {} ({})",
            config.sonar.project_key.cyan(),
            config.sonar.project_name
        );
    } else {
        println!("  Sonar:       {}", "disabled".dimmed());
    }

    println!("\n{}", "Tool images:".bold());
    println!("  build:  {}", config.tools.build.dimmed());
    println!("  scan:   {}", config.tools.scan.dimmed());
    println!("  deploy: {}", config.tools.deploy.dimmed());

    println!("\n{}", "Notifications:".bold());
    println!("  success:    {}", config.notifications.success);
    println!("  failure:    {}", config.notifications.failure);
    println!("  failure cc: {}", config.notifications.failure_cc);
}

fn print_plan(config: &PipelineConfig, plan: &ReleasePlan) {
    println!("{}", "Release Plan:".bold());
    println!("  App:      {} ({})", config.app_name.bold(), config.app_type);
    println!("  Build:    {}", plan.build_id);
    println!("  Image:    {}", plan.image_reference.cyan());
    println!("  Registry: {}", plan.registry_host);
    println!("  Port:     {}", plan.exposed_port);
    println!(
        "  Compile:  {}",
        if plan.requires_compile_step {
            "yes".green()
        } else {
            "no".dimmed()
        }
    );
    println!(
        "  Target:   deployment/{} in namespace {}",
        config.app_name, config.namespace
    );
}
