//! Pipeline execution
//!
//! Runs the stages of a release in order:
//! - checkout facts from git
//! - compile and analysis in the build tool image
//! - image build and push on the host docker daemon
//! - vulnerability scan in the scan tool image
//! - cluster reconciliation and origin annotation in the deploy tool image
//!
//! The first failing stage stops the run. Whatever the outcome, exactly one
//! notification is sent once the run ends.

pub mod report;
pub mod stages;

use anyhow::{Context, Result};
use slipway_core::domain::{PipelineConfig, ReleasePlan};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::cluster::{AnnotationOutcome, Annotator, Reconciler};
use crate::command::CommandExecutor;
use crate::notify::{Notification, Notifier};
use crate::settings::Settings;
use crate::source::GitSource;
use crate::toolbox::ToolContainer;

pub use report::{RunReport, RunStatus, StageReport, StageStatus};
pub use stages::Stage;

/// Docker daemon socket shared with the scan tool container
pub const DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// Where the kubeconfig is mounted inside the deploy tool container
pub const KUBECONFIG_MOUNT: &str = "/kube/config";

/// Runs pipeline stages for one resolved configuration and release plan
pub struct PipelineRunner {
    settings: Settings,
    host: Arc<dyn CommandExecutor>,
    notifier: Arc<dyn Notifier>,
}

impl PipelineRunner {
    /// Creates a runner
    ///
    /// # Arguments
    /// * `settings` - Host settings (workspace, timeouts, build URL)
    /// * `host` - Executor for commands on the build host
    /// * `notifier` - Receives the single end-of-run notification
    pub fn new(
        settings: Settings,
        host: Arc<dyn CommandExecutor>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            settings,
            host,
            notifier,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Builds, scans and deploys the release
    pub async fn run(&self, config: &PipelineConfig, plan: &ReleasePlan) -> RunReport {
        self.execute(&Stage::FULL, config, plan).await
    }

    /// Deploys an already published image
    pub async fn deploy(&self, config: &PipelineConfig, plan: &ReleasePlan) -> RunReport {
        self.execute(&Stage::DEPLOY_ONLY, config, plan).await
    }

    async fn execute(
        &self,
        stages: &[Stage],
        config: &PipelineConfig,
        plan: &ReleasePlan,
    ) -> RunReport {
        let mut report = RunReport::start(config, plan);
        info!(
            "Starting run {} of {} ({}) for {}",
            report.run_id, config.app_name, config.app_type, plan.image_reference
        );

        for (idx, stage) in stages.iter().enumerate() {
            info!("Executing stage {}/{}: {}", idx + 1, stages.len(), stage);

            if let Some(reason) = stage.skip_reason(config, plan, &self.settings) {
                if *stage == Stage::Annotate {
                    warn!("Skipping stage '{}': {}", stage, reason);
                } else {
                    info!("Skipping stage '{}': {}", stage, reason);
                }
                report.record(*stage, StageStatus::Skipped, Some(reason), Duration::ZERO);
                continue;
            }

            let started = Instant::now();
            match self.execute_stage(*stage, config, plan, &mut report).await {
                Ok(detail) => {
                    debug!("Stage '{}' completed", stage);
                    report.record(*stage, StageStatus::Succeeded, detail, started.elapsed());
                }
                Err(e) => {
                    error!("Stage '{}' failed: {:#}", stage, e);
                    report.record(
                        *stage,
                        StageStatus::Failed,
                        Some(format!("{:#}", e)),
                        started.elapsed(),
                    );
                    break;
                }
            }
        }

        report.finish();
        match report.status() {
            RunStatus::Success => info!("Run {} completed successfully", report.run_id),
            RunStatus::Failure => error!("Run {} failed", report.run_id),
        }

        let notification = Notification::for_run(&report, config);
        if let Err(e) = self.notifier.send(&notification).await {
            warn!("Failed to send notification: {:#}", e);
        }

        report
    }

    /// Executes a single stage, returning a short result for the report
    async fn execute_stage(
        &self,
        stage: Stage,
        config: &PipelineConfig,
        plan: &ReleasePlan,
        report: &mut RunReport,
    ) -> Result<Option<String>> {
        match stage {
            Stage::Checkout => {
                let source = GitSource::new(self.host.clone())
                    .describe()
                    .await
                    .context("Failed to read the checked-out sources")?;
                let detail = format!("{} ({})", source.origin_url, source.author_email);
                report.source = Some(source);
                Ok(Some(detail))
            }
            Stage::Build => {
                self.tool(&config.tools.build)
                    .run_checked(&stages::build_command())
                    .await?;
                Ok(None)
            }
            Stage::Analysis => {
                let command = stages::analysis_command(config, plan);
                if plan.requires_compile_step {
                    self.tool(&config.tools.build).run_checked(&command).await?;
                } else {
                    self.host.run_checked(&command).await?;
                }
                Ok(None)
            }
            Stage::Containerize => {
                self.host
                    .run_checked(&stages::image_build_command(config, plan))
                    .await?;
                self.host
                    .run_checked(&stages::image_push_command(plan))
                    .await?;
                Ok(Some(format!("pushed {}", plan.image_reference)))
            }
            Stage::Scan => {
                self.scan_tool(config)
                    .run_checked(&stages::scan_command(plan, self.settings.scan_timeout))
                    .await?;
                Ok(Some("no HIGH or CRITICAL findings".to_string()))
            }
            Stage::Deploy => {
                let outcome = Reconciler::new(Arc::new(self.deploy_tool(config)))
                    .reconcile(plan, config)
                    .await?;
                report.deployment = Some(outcome);
                Ok(Some(outcome.to_string()))
            }
            Stage::Annotate => {
                let build_url = self
                    .settings
                    .build_url
                    .as_deref()
                    .context("No build URL available")?;
                let repository_url = report
                    .source
                    .as_ref()
                    .map(|s| s.origin_url.as_str())
                    .context("Source repository unknown")?;

                let outcome = Annotator::new(Arc::new(self.deploy_tool(config)))
                    .annotate(config, build_url, repository_url)
                    .await?;
                let detail = match outcome {
                    AnnotationOutcome::Set => "annotation set",
                    AnnotationOutcome::AlreadyPresent => "annotation already present",
                };
                Ok(Some(detail.to_string()))
            }
        }
    }

    fn tool(&self, image: &str) -> ToolContainer {
        if self.settings.use_tool_images {
            ToolContainer::new(self.host.clone(), image, &self.settings.workspace)
        } else {
            ToolContainer::passthrough(self.host.clone())
        }
    }

    fn scan_tool(&self, config: &PipelineConfig) -> ToolContainer {
        let tool = self.tool(&config.tools.scan);
        if tool.image().is_some() {
            tool.volume(DOCKER_SOCKET, DOCKER_SOCKET)
        } else {
            tool
        }
    }

    fn deploy_tool(&self, config: &PipelineConfig) -> ToolContainer {
        let tool = self.tool(&config.tools.deploy);
        match &self.settings.kubeconfig {
            Some(path) if tool.image().is_some() => tool
                .volume(path.display().to_string(), KUBECONFIG_MOUNT)
                .env("KUBECONFIG", KUBECONFIG_MOUNT),
            Some(path) => tool.env("KUBECONFIG", path.display().to_string()),
            None => tool,
        }
    }
}
