//! Cluster reconciler
//!
//! Drives the deployment named after the application towards the release
//! plan with the fewest mutations:
//!
//! ```text
//! Unknown --exists, same image--> Unchanged
//! Unknown --exists-------------> set image --> Updated
//! Unknown --absent-------------> Creating --> Patching --> Created
//! ```
//!
//! Existence is decided by a read-only query. Every external call's exit
//! status is the only success signal and nothing is retried here. There is
//! no locking: two overlapping runs for the same application race and the
//! last writer wins.

use serde::{Deserialize, Serialize};
use slipway_core::domain::{DeploymentState, PipelineConfig, ReleasePlan};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::kubectl::{self, Kubectl};
use crate::command::CommandExecutor;
use crate::error::{PatchKind, ReconcileError};

/// Terminal result of a successful reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReconcileOutcome {
    /// The workload already ran the planned image; nothing was changed
    Unchanged,
    /// The existing workload was moved to the planned image
    Updated,
    /// The workload was created, exposed and patched
    Created,
}

impl std::fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileOutcome::Unchanged => write!(f, "unchanged"),
            ReconcileOutcome::Updated => write!(f, "updated"),
            ReconcileOutcome::Created => write!(f, "created"),
        }
    }
}

#[derive(Debug)]
enum ReconcileState {
    Unknown,
    Creating,
    Patching,
    Done(ReconcileOutcome),
}

/// Reconciles one workload through an injected command executor
pub struct Reconciler {
    executor: Arc<dyn CommandExecutor>,
}

impl Reconciler {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    /// Queries the live state of the deployment
    ///
    /// Only an empty answer from a successful query means absent. Any
    /// non-zero exit is an error, so an unreachable cluster, a missing
    /// context or an unavailable kubectl image never leads to a create.
    pub async fn observe(&self, kubectl: &Kubectl) -> Result<DeploymentState, ReconcileError> {
        let output = self
            .executor
            .run_checked(&kubectl.get_image())
            .await
            .map_err(|source| ReconcileError::QueryFailed {
                name: kubectl.name().to_string(),
                source,
            })?;

        Ok(kubectl::parse_observed(&output.stdout))
    }

    /// Reconciles the deployment towards `plan`
    ///
    /// # Returns
    /// The terminal outcome; on `PatchFailed` the workload stays created.
    pub async fn reconcile(
        &self,
        plan: &ReleasePlan,
        config: &PipelineConfig,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let kubectl = Kubectl::for_config(config);
        let mut state = ReconcileState::Unknown;

        loop {
            debug!("Deployment {} reconcile state: {:?}", kubectl.name(), state);

            state = match state {
                ReconcileState::Unknown => {
                    let observed = self.observe(&kubectl).await?;
                    if observed.runs_image(&plan.image_reference) {
                        info!(
                            "Deployment {} already runs {}",
                            kubectl.name(),
                            plan.image_reference
                        );
                        ReconcileState::Done(ReconcileOutcome::Unchanged)
                    } else if observed.exists {
                        self.update(&kubectl, plan).await?;
                        ReconcileState::Done(ReconcileOutcome::Updated)
                    } else {
                        info!(
                            "Deployment {} not found in namespace {}",
                            kubectl.name(),
                            config.namespace
                        );
                        ReconcileState::Creating
                    }
                }
                ReconcileState::Creating => {
                    self.create(&kubectl, plan).await?;
                    ReconcileState::Patching
                }
                ReconcileState::Patching => {
                    self.patch(&kubectl, config).await?;
                    ReconcileState::Done(ReconcileOutcome::Created)
                }
                ReconcileState::Done(outcome) => {
                    info!("Deployment {} reconciled: {}", kubectl.name(), outcome);
                    return Ok(outcome);
                }
            };
        }
    }

    async fn update(&self, kubectl: &Kubectl, plan: &ReleasePlan) -> Result<(), ReconcileError> {
        info!(
            "Updating deployment {} to {}",
            kubectl.name(),
            plan.image_reference
        );

        self.executor
            .run_checked(&kubectl.set_image(&plan.image_reference))
            .await
            .map_err(|source| ReconcileError::UpdateFailed {
                name: kubectl.name().to_string(),
                source,
            })?;

        Ok(())
    }

    async fn create(&self, kubectl: &Kubectl, plan: &ReleasePlan) -> Result<(), ReconcileError> {
        let create_failed = |source| ReconcileError::CreateFailed {
            name: kubectl.name().to_string(),
            source,
        };

        info!(
            "Creating deployment {} from {}",
            kubectl.name(),
            plan.image_reference
        );
        self.executor
            .run_checked(&kubectl.create(&plan.image_reference))
            .await
            .map_err(create_failed)?;

        info!(
            "Exposing deployment {} on port {}",
            kubectl.name(),
            plan.exposed_port
        );
        self.executor
            .run_checked(&kubectl.expose(plan.exposed_port))
            .await
            .map_err(create_failed)?;

        Ok(())
    }

    async fn patch(&self, kubectl: &Kubectl, config: &PipelineConfig) -> Result<(), ReconcileError> {
        let patches = [
            (
                PatchKind::ImagePullSecret,
                kubectl::image_pull_secret_patch(&config.harbour_secret),
            ),
            (
                PatchKind::ResourceLimits,
                kubectl::resource_limits_patch(kubectl.name(), &config.resources),
            ),
        ];

        for (kind, patch) in patches {
            info!("Applying {} patch to deployment {}", kind, kubectl.name());

            if let Err(source) = self.executor.run_checked(&kubectl.patch(&patch)).await {
                warn!(
                    "Deployment {} is live but the {} patch failed",
                    kubectl.name(),
                    kind
                );
                return Err(ReconcileError::PatchFailed {
                    name: kubectl.name().to_string(),
                    patch: kind,
                    source,
                });
            }
        }

        Ok(())
    }
}
