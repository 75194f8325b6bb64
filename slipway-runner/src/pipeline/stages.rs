//! Pipeline stages
//!
//! The fixed stage order and the tool invocations behind each stage. Stage
//! commands are built here as plain [`Command`] values; where they run
//! (host or tool container) is decided by the runner.

use serde::{Deserialize, Serialize};
use slipway_core::domain::{PipelineConfig, ReleasePlan};
use std::time::Duration;

use crate::command::Command;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Checkout,
    Build,
    Analysis,
    Containerize,
    Scan,
    Deploy,
    Annotate,
}

impl Stage {
    /// Every stage of a full run, in execution order
    pub const FULL: [Stage; 7] = [
        Stage::Checkout,
        Stage::Build,
        Stage::Analysis,
        Stage::Containerize,
        Stage::Scan,
        Stage::Deploy,
        Stage::Annotate,
    ];

    /// Stages of a deploy-only run (image already built and pushed)
    pub const DEPLOY_ONLY: [Stage; 3] = [Stage::Checkout, Stage::Deploy, Stage::Annotate];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Checkout => "checkout",
            Stage::Build => "build",
            Stage::Analysis => "analysis",
            Stage::Containerize => "containerize",
            Stage::Scan => "scan",
            Stage::Deploy => "deploy",
            Stage::Annotate => "annotate",
        }
    }

    /// Why this stage does not apply to the run, if it does not
    pub fn skip_reason(
        &self,
        config: &PipelineConfig,
        plan: &ReleasePlan,
        settings: &Settings,
    ) -> Option<String> {
        match self {
            Stage::Build if !plan.requires_compile_step => {
                Some(format!("no compile step for {}", config.app_type))
            }
            Stage::Analysis if !config.sonar.enabled => Some("sonar disabled".to_string()),
            Stage::Annotate if settings.build_url.is_none() => {
                Some("no build URL available".to_string())
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Maven package (compile and test) in the build tool image
pub fn build_command() -> Command {
    Command::new("mvn").args(["-B", "clean", "package"])
}

/// Static analysis with the configured sonar project
pub fn analysis_command(config: &PipelineConfig, plan: &ReleasePlan) -> Command {
    let project = [
        format!("-Dsonar.projectKey={}", config.sonar.project_key),
        format!("-Dsonar.projectName={}", config.sonar.project_name),
    ];

    if plan.requires_compile_step {
        Command::new("mvn").args(["-B", "sonar:sonar"]).args(project)
    } else {
        Command::new("sonar-scanner")
            .args(project)
            .arg("-Dsonar.sources=.")
    }
}

/// Image build on the host docker daemon
pub fn image_build_command(config: &PipelineConfig, plan: &ReleasePlan) -> Command {
    Command::new("docker").args([
        "build".to_string(),
        "-t".to_string(),
        plan.image_reference.clone(),
        "--build-arg".to_string(),
        format!("APP_TYPE={}", config.app_type),
        "--build-arg".to_string(),
        format!("EXPOSE_PORT={}", plan.exposed_port),
        ".".to_string(),
    ])
}

pub fn image_push_command(plan: &ReleasePlan) -> Command {
    Command::new("docker").args(["push", plan.image_reference.as_str()])
}

/// Vulnerability scan failing on HIGH or CRITICAL findings, bounded by `timeout`
pub fn scan_command(plan: &ReleasePlan, timeout: Duration) -> Command {
    Command::new("trivy")
        .args([
            "image",
            "--no-progress",
            "--exit-code",
            "1",
            "--severity",
            "HIGH,CRITICAL",
            plan.image_reference.as_str(),
        ])
        .timeout(timeout)
}
