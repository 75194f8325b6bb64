//! Tool containers
//!
//! Build, scan and deploy tools run inside their configured images rather
//! than on the host. [`ToolContainer`] rewrites each command into a
//! throwaway `docker run` with the workspace mounted at `/workspace`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::command::{Command, CommandExecutor, CommandOutput};
use crate::error::CommandError;

/// Mount point of the workspace inside tool containers
pub const CONTAINER_WORKSPACE: &str = "/workspace";

/// Executor decorator running commands inside a tool image
///
/// When built with [`ToolContainer::passthrough`] commands reach the inner
/// executor unchanged, which is how hosts that already provide the tools
/// run the pipeline.
pub struct ToolContainer {
    inner: Arc<dyn CommandExecutor>,
    image: Option<String>,
    workspace: PathBuf,
    volumes: Vec<(String, String)>,
    env: Vec<(String, String)>,
}

impl ToolContainer {
    /// Creates a container wrapper for `image` with `workspace` mounted
    pub fn new(inner: Arc<dyn CommandExecutor>, image: &str, workspace: &Path) -> Self {
        Self {
            inner,
            image: Some(image.to_string()),
            workspace: workspace.to_path_buf(),
            volumes: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Runs commands directly through `inner`
    pub fn passthrough(inner: Arc<dyn CommandExecutor>) -> Self {
        Self {
            inner,
            image: None,
            workspace: PathBuf::new(),
            volumes: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Adds a bind mount (ignored in passthrough mode)
    pub fn volume(mut self, host: impl Into<String>, container: impl Into<String>) -> Self {
        self.volumes.push((host.into(), container.into()));
        self
    }

    /// Adds an environment variable for every command
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Rewrites `command` into the invocation actually executed
    ///
    /// The image entrypoint is replaced by the command's program so tool
    /// images with a fixed entrypoint (kubectl, trivy) behave the same as
    /// generic ones.
    pub fn wrap(&self, command: &Command) -> Command {
        let Some(image) = &self.image else {
            let mut passthrough = command.clone();
            passthrough.env.extend(self.env.iter().cloned());
            return passthrough;
        };

        let mut wrapped = Command::new("docker").args(["run", "--rm"]).args([
            "-v".to_string(),
            format!("{}:{}", self.workspace.display(), CONTAINER_WORKSPACE),
            "-w".to_string(),
            CONTAINER_WORKSPACE.to_string(),
        ]);

        for (host, container) in &self.volumes {
            wrapped = wrapped.arg("-v").arg(format!("{}:{}", host, container));
        }

        for (key, value) in self.env.iter().chain(command.env.iter()) {
            wrapped = wrapped.arg("-e").arg(format!("{}={}", key, value));
        }

        wrapped = wrapped
            .arg("--entrypoint")
            .arg(&command.program)
            .arg(image)
            .args(command.args.iter().cloned());

        wrapped.timeout = command.timeout;
        wrapped
    }
}

#[async_trait]
impl CommandExecutor for ToolContainer {
    async fn run(&self, command: &Command) -> Result<CommandOutput, CommandError> {
        let wrapped = self.wrap(command);
        if let Some(image) = &self.image {
            debug!("Running `{}` in {}", command.program, image);
        }
        self.inner.run(&wrapped).await
    }
}
