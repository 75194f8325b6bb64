//! Error types for command execution and cluster reconciliation

use std::time::Duration;
use thiserror::Error;

/// An external command that could not be run or did not succeed
#[derive(Debug, Error)]
pub enum CommandError {
    /// The program could not be started at all
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// The command exceeded its time budget and was killed
    #[error("`{command}` timed out after {timeout:?}")]
    TimedOut { command: String, timeout: Duration },

    /// The command ran and exited with a non-zero status
    #[error("`{command}` exited with code {exit_code}: {stderr}")]
    Failed {
        command: String,
        exit_code: i32,
        stderr: String,
    },
}

/// Which metadata patch of a newly created workload failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchKind {
    ImagePullSecret,
    ResourceLimits,
}

impl std::fmt::Display for PatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatchKind::ImagePullSecret => write!(f, "image-pull-secret"),
            PatchKind::ResourceLimits => write!(f, "resource-limits"),
        }
    }
}

/// Reconciliation of the target workload failed
///
/// Nothing is rolled back: a `PatchFailed` leaves the created workload live.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The existence query failed for a reason other than "not found"
    #[error("failed to query deployment {name}: {source}")]
    QueryFailed { name: String, source: CommandError },

    #[error("failed to update image of deployment {name}: {source}")]
    UpdateFailed { name: String, source: CommandError },

    /// Creating the workload or exposing its service failed
    #[error("failed to create deployment {name}: {source}")]
    CreateFailed { name: String, source: CommandError },

    #[error("deployment {name} was created but the {patch} patch failed: {source}")]
    PatchFailed {
        name: String,
        patch: PatchKind,
        source: CommandError,
    },
}

/// The descriptive annotation could not be read or written
#[derive(Debug, Error)]
pub enum AnnotationError {
    #[error("failed to read annotation of deployment {name}: {source}")]
    Query { name: String, source: CommandError },

    #[error("failed to annotate deployment {name}: {source}")]
    Set { name: String, source: CommandError },
}
