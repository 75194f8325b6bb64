//! Deploy and run command handlers

use anyhow::Result;
use colored::*;
use slipway_core::domain::{PipelineConfig, ReleasePlan};
use slipway_runner::notify::notifier_for;
use slipway_runner::pipeline::{RunReport, RunStatus, StageStatus};
use slipway_runner::{PipelineRunner, Settings, ShellExecutor};
use std::sync::Arc;

use super::{ReleaseArgs, load_config};

/// Deploy an already published image
pub async fn deploy(args: &ReleaseArgs, settings: Settings) -> Result<()> {
    let (runner, config, plan) = prepare(args, settings)?;
    let report = runner.deploy(&config, &plan).await;
    finish(&report)
}

/// Run every stage
pub async fn run(args: &ReleaseArgs, settings: Settings) -> Result<()> {
    let (runner, config, plan) = prepare(args, settings)?;
    let report = runner.run(&config, &plan).await;
    finish(&report)
}

fn prepare(
    args: &ReleaseArgs,
    settings: Settings,
) -> Result<(PipelineRunner, PipelineConfig, ReleasePlan)> {
    let config = load_config(&args.definition)?;
    let plan = slipway_core::plan(&config, args.build_id);

    let host = ShellExecutor::new()
        .with_working_dir(&settings.workspace)
        .with_default_timeout(settings.command_timeout);
    let notifier = notifier_for(&settings);
    let runner = PipelineRunner::new(settings, Arc::new(host), notifier);

    Ok((runner, config, plan))
}

/// Prints the report; a failed run becomes an error so the exit code is non-zero
fn finish(report: &RunReport) -> Result<()> {
    print_report(report);

    match report.failed_stage() {
        Some(failed) => anyhow::bail!("Run failed at stage '{}'", failed.stage),
        None => Ok(()),
    }
}

fn print_report(report: &RunReport) {
    println!();
    match report.status() {
        RunStatus::Success => println!("{}", "✓ Run completed successfully!".green().bold()),
        RunStatus::Failure => println!("{}", "✗ Run failed".red().bold()),
    }
    println!("  Run ID: {}", report.run_id.to_string().cyan());
    println!("  Image:  {}", report.image_reference);
    if let Some(outcome) = report.deployment {
        println!("  Deployment: {}", outcome.to_string().yellow());
    }

    println!("\n{}", "Stages:".bold());
    for stage in &report.stages {
        let status = match stage.status {
            StageStatus::Succeeded => "✓".green(),
            StageStatus::Skipped => "-".dimmed(),
            StageStatus::Failed => "✗".red(),
        };
        let detail = stage.detail.as_deref().unwrap_or_default();
        println!(
            "  {} {:<13} {}",
            status,
            stage.stage.to_string(),
            detail.dimmed()
        );
    }
}
