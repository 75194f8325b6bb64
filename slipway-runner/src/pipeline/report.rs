//! Run reports
//!
//! A [`RunReport`] accumulates stage results during a run and renders the
//! summary sent in the final notification. Only exists at runtime; it is
//! printed or serialized but never read back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slipway_core::domain::{ApplicationType, PipelineConfig, ReleasePlan};
use std::fmt::Write as _;
use std::time::Duration;
use uuid::Uuid;

use super::stages::Stage;
use crate::cluster::ReconcileOutcome;
use crate::source::SourceInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageStatus {
    Succeeded,
    Skipped,
    Failed,
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageStatus::Succeeded => write!(f, "succeeded"),
            StageStatus::Skipped => write!(f, "skipped"),
            StageStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Overall result; any failed stage fails the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
    Success,
    Failure,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Success => write!(f, "SUCCESS"),
            RunStatus::Failure => write!(f, "FAILURE"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage: Stage,
    pub status: StageStatus,
    /// Skip reason, failure message or a short result
    pub detail: Option<String>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub app_name: String,
    pub app_type: ApplicationType,
    pub environment: String,
    pub namespace: String,
    pub image_reference: String,
    pub build_id: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub stages: Vec<StageReport>,
    pub deployment: Option<ReconcileOutcome>,
    pub source: Option<SourceInfo>,
}

impl RunReport {
    pub fn start(config: &PipelineConfig, plan: &ReleasePlan) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            app_name: config.app_name.clone(),
            app_type: config.app_type,
            environment: config.environment.clone(),
            namespace: config.namespace.clone(),
            image_reference: plan.image_reference.clone(),
            build_id: plan.build_id,
            started_at: Utc::now(),
            finished_at: None,
            stages: Vec::new(),
            deployment: None,
            source: None,
        }
    }

    pub fn record(
        &mut self,
        stage: Stage,
        status: StageStatus,
        detail: Option<String>,
        duration: Duration,
    ) {
        self.stages.push(StageReport {
            stage,
            status,
            detail,
            duration_ms: duration.as_millis() as u64,
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn status(&self) -> RunStatus {
        if self.failed_stage().is_some() {
            RunStatus::Failure
        } else {
            RunStatus::Success
        }
    }

    pub fn failed_stage(&self) -> Option<&StageReport> {
        self.stages
            .iter()
            .find(|s| s.status == StageStatus::Failed)
    }

    /// Plain-text summary used as the notification body
    pub fn summary(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(
            out,
            "Pipeline run {} for {} ({}) in {}/{}: {}",
            self.run_id,
            self.app_name,
            self.app_type,
            self.environment,
            self.namespace,
            self.status()
        );
        let _ = writeln!(out, "Image:      {}", self.image_reference);
        if let Some(outcome) = self.deployment {
            let _ = writeln!(out, "Deployment: {}", outcome);
        }
        if let Some(source) = &self.source {
            let _ = writeln!(out, "Source:     {}", source.origin_url);
            let _ = writeln!(out, "Author:     {}", source.author_email);
        }
        let _ = writeln!(out, "Started:    {}", self.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
        if let Some(finished) = self.finished_at {
            let _ = writeln!(out, "Finished:   {}", finished.format("%Y-%m-%d %H:%M:%S UTC"));
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "Stages:");
        for stage in &self.stages {
            let _ = write!(
                out,
                "  {:<13} {:<10} {:>7.1}s",
                stage.stage.to_string(),
                stage.status.to_string(),
                stage.duration_ms as f64 / 1000.0
            );
            if let Some(detail) = &stage.detail {
                let _ = write!(out, "  {}", detail);
            }
            let _ = writeln!(out);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::config;

    fn report() -> RunReport {
        let config = config("orders", "springboot", &[]);
        let plan = slipway_core::plan(&config, 42);
        RunReport::start(&config, &plan)
    }

    #[test]
    fn test_status_follows_failed_stages() {
        let mut report = report();
        report.record(Stage::Checkout, StageStatus::Succeeded, None, Duration::ZERO);
        report.record(
            Stage::Analysis,
            StageStatus::Skipped,
            Some("disabled".to_string()),
            Duration::ZERO,
        );
        assert_eq!(report.status(), RunStatus::Success);

        report.record(
            Stage::Scan,
            StageStatus::Failed,
            Some("HIGH vulnerabilities".to_string()),
            Duration::from_millis(1500),
        );
        assert_eq!(report.status(), RunStatus::Failure);
        assert_eq!(report.failed_stage().unwrap().stage, Stage::Scan);
    }

    #[test]
    fn test_summary_lists_stages() {
        let mut report = report();
        report.record(
            Stage::Build,
            StageStatus::Succeeded,
            None,
            Duration::from_millis(2500),
        );
        report.record(
            Stage::Deploy,
            StageStatus::Failed,
            Some("boom".to_string()),
            Duration::ZERO,
        );
        report.deployment = None;
        report.finish();

        let summary = report.summary();
        assert!(summary.contains("orders (springboot) in stg/intsys: FAILURE"));
        assert!(summary.contains("stg-docker-reg.intsys.local/intsys/orders:stg.42"));
        assert!(summary.contains("build"));
        assert!(summary.contains("2.5s"));
        assert!(summary.contains("boom"));
    }
}
