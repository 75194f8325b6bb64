//! Runner settings
//!
//! Host-provided values that are not part of a pipeline definition: where
//! the workspace is, how long external commands may run, which build URL
//! to record and where notifications go.

use std::path::PathBuf;
use std::time::Duration;

/// Default wall-clock budget of the vulnerability scan
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(600);

/// Runner settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Checked-out sources; mounted into tool containers
    pub workspace: PathBuf,

    /// URL of the CI build driving this run (recorded in the origin annotation)
    pub build_url: Option<String>,

    /// Budget for each external command; `None` blocks until exit
    pub command_timeout: Option<Duration>,

    /// Budget for the vulnerability scan
    pub scan_timeout: Duration,

    /// kubeconfig mounted into the deploy tool container
    pub kubeconfig: Option<PathBuf>,

    /// Run build, scan and deploy tools inside their configured images
    pub use_tool_images: bool,

    /// HTTP endpoint receiving notifications; log only when unset
    pub notify_webhook: Option<String>,
}

impl Settings {
    /// Creates settings for `workspace` with defaults for everything else
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
            build_url: None,
            command_timeout: None,
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
            kubeconfig: None,
            use_tool_images: true,
            notify_webhook: None,
        }
    }

    pub fn with_build_url(mut self, build_url: impl Into<String>) -> Self {
        self.build_url = Some(build_url.into());
        self
    }

    /// Validates the settings
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.workspace.as_os_str().is_empty() {
            anyhow::bail!("workspace cannot be empty");
        }

        if self.scan_timeout.is_zero() {
            anyhow::bail!("scan_timeout must be greater than 0");
        }

        if self.command_timeout.is_some_and(|t| t.is_zero()) {
            anyhow::bail!("command_timeout must be greater than 0");
        }

        if let Some(url) = &self.notify_webhook {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("notify_webhook must start with http:// or https://");
            }
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(".")
    }
}
