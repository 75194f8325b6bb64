//! Slipway runner
//!
//! Executes a resolved release against the outside world: git, Maven,
//! docker, trivy and kubectl, all driven through [`command::CommandExecutor`]
//! so every stage can be exercised without a cluster.

pub mod cluster;
pub mod command;
pub mod error;
pub mod notify;
pub mod pipeline;
pub mod settings;
pub mod source;
pub mod toolbox;

#[cfg(test)]
mod testing;

pub use command::{Command, CommandExecutor, CommandOutput, ShellExecutor};
pub use error::{AnnotationError, CommandError, ReconcileError};
pub use notify::{LogNotifier, Notification, Notifier, WebhookNotifier};
pub use pipeline::{PipelineRunner, RunReport, RunStatus};
pub use settings::Settings;
