//! Configuration module
//!
//! Host settings for the runner, taken from flags with environment
//! fallbacks so CI jobs can configure slipway without changing the command.

use anyhow::{Context, Result};
use clap::{ArgAction, Args};
use slipway_runner::Settings;
use std::path::PathBuf;
use std::time::Duration;

/// Runner settings flags
#[derive(Args, Debug, Clone)]
pub struct SettingsArgs {
    /// Checked-out sources
    #[arg(long, env = "SLIPWAY_WORKSPACE", default_value = ".", global = true)]
    pub workspace: PathBuf,

    /// URL of the CI build, recorded in the deployment annotation
    #[arg(long, env = "BUILD_URL", global = true)]
    pub build_url: Option<String>,

    /// Timeout in seconds for each external command
    #[arg(long, env = "SLIPWAY_COMMAND_TIMEOUT", global = true)]
    pub command_timeout: Option<u64>,

    /// Timeout in seconds for the vulnerability scan
    #[arg(long, env = "SLIPWAY_SCAN_TIMEOUT", default_value = "600", global = true)]
    pub scan_timeout: u64,

    /// kubeconfig used by kubectl
    #[arg(long, env = "KUBECONFIG", global = true)]
    pub kubeconfig: Option<PathBuf>,

    /// Run build, scan and deploy tools inside their images
    #[arg(
        long,
        env = "SLIPWAY_USE_TOOL_IMAGES",
        default_value_t = true,
        action = ArgAction::Set,
        global = true
    )]
    pub use_tool_images: bool,

    /// HTTP endpoint receiving run notifications
    #[arg(long, env = "SLIPWAY_NOTIFY_WEBHOOK", global = true)]
    pub notify_webhook: Option<String>,
}

impl SettingsArgs {
    /// Builds validated runner settings
    ///
    /// The workspace is made absolute since it is bind-mounted into tool
    /// containers.
    pub fn into_settings(self) -> Result<Settings> {
        let workspace = self
            .workspace
            .canonicalize()
            .with_context(|| format!("Workspace not found: {}", self.workspace.display()))?;

        let mut settings = Settings::new(workspace);
        settings.build_url = self.build_url.filter(|url| !url.trim().is_empty());
        settings.command_timeout = self.command_timeout.map(Duration::from_secs);
        settings.scan_timeout = Duration::from_secs(self.scan_timeout);
        settings.kubeconfig = self.kubeconfig;
        settings.use_tool_images = self.use_tool_images;
        settings.notify_webhook = self.notify_webhook;

        settings.validate().context("Invalid runner settings")?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> SettingsArgs {
        SettingsArgs {
            workspace: PathBuf::from("."),
            build_url: Some("https://ci.example.com/job/orders/42/".to_string()),
            command_timeout: Some(300),
            scan_timeout: 600,
            kubeconfig: None,
            use_tool_images: true,
            notify_webhook: None,
        }
    }

    #[test]
    fn test_into_settings() {
        let settings = args().into_settings().unwrap();

        assert!(settings.workspace.is_absolute());
        assert_eq!(settings.command_timeout, Some(Duration::from_secs(300)));
        assert_eq!(settings.scan_timeout, Duration::from_secs(600));
        assert_eq!(
            settings.build_url.as_deref(),
            Some("https://ci.example.com/job/orders/42/")
        );
    }

    #[test]
    fn test_blank_build_url_is_unset() {
        let mut args = args();
        args.build_url = Some("  ".to_string());
        assert_eq!(args.into_settings().unwrap().build_url, None);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut zero_scan = args();
        zero_scan.scan_timeout = 0;
        assert!(zero_scan.into_settings().is_err());

        let mut missing = args();
        missing.workspace = PathBuf::from("/nonexistent/slipway/workspace");
        assert!(missing.into_settings().is_err());
    }
}
