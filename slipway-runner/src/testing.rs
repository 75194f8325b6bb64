//! Test doubles for command execution and notification

use async_trait::async_trait;
use serde_json::json;
use slipway_core::domain::{PipelineConfig, RawParameters};
use std::sync::Mutex;

use crate::command::{Command, CommandExecutor, CommandOutput};
use crate::error::CommandError;
use crate::notify::{Notification, Notifier};

pub fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        exit_code: 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub fn failed(exit_code: i32, stderr: &str) -> CommandOutput {
    CommandOutput {
        exit_code,
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}

/// Resolves a minimal configuration plus extra parameters
pub fn config(app_name: &str, app_type: &str, extra: &[(&str, &str)]) -> PipelineConfig {
    let mut raw = RawParameters::new();
    raw.insert("appName".into(), json!(app_name));
    raw.insert("appType".into(), json!(app_type));
    for (key, value) in extra {
        raw.insert(key.to_string(), json!(value));
    }
    slipway_core::resolve(&raw).unwrap()
}

type Responder = Box<dyn Fn(&Command) -> CommandOutput + Send + Sync>;

/// Records every command and answers with a fixed responder
pub struct RecordingExecutor {
    calls: Mutex<Vec<Command>>,
    responder: Responder,
}

impl RecordingExecutor {
    pub fn succeeding() -> Self {
        Self::with_responder(|_| ok(""))
    }

    pub fn with_responder(
        responder: impl Fn(&Command) -> CommandOutput + Send + Sync + 'static,
    ) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    pub fn calls(&self) -> Vec<Command> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandExecutor for RecordingExecutor {
    async fn run(&self, command: &Command) -> Result<CommandOutput, CommandError> {
        self.calls.lock().unwrap().push(command.clone());
        Ok((self.responder)(command))
    }
}

/// What the fake cluster currently holds for the single workload
#[derive(Debug, Clone, Default)]
pub struct ClusterState {
    pub exists: bool,
    pub image: Option<String>,
    pub annotation: Option<String>,
    pub patches: Vec<String>,
}

/// Interprets the kubectl commands issued by the reconciler against an
/// in-memory deployment
pub struct FakeCluster {
    state: Mutex<ClusterState>,
    calls: Mutex<Vec<Command>>,
    failing: Vec<String>,
}

impl FakeCluster {
    pub fn empty() -> Self {
        Self {
            state: Mutex::new(ClusterState::default()),
            calls: Mutex::new(Vec::new()),
            failing: Vec::new(),
        }
    }

    pub fn with_deployment(image: &str) -> Self {
        let cluster = Self::empty();
        {
            let mut state = cluster.state.lock().unwrap();
            state.exists = true;
            state.image = Some(image.to_string());
        }
        cluster
    }

    /// Any command whose rendering contains `fragment` exits with code 1
    pub fn fail_when(mut self, fragment: &str) -> Self {
        self.failing.push(fragment.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Command> {
        self.calls.lock().unwrap().clone()
    }

    /// kubectl verb of every issued command (`get`, `create`, ...)
    pub fn verbs(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| c.args.get(2).cloned().unwrap_or_default())
            .collect()
    }

    pub fn state(&self) -> ClusterState {
        self.state.lock().unwrap().clone()
    }
}

const NOT_FOUND: &str =
    "Error from server (NotFound): deployments.apps \"orders\" not found";

#[async_trait]
impl CommandExecutor for FakeCluster {
    async fn run(&self, command: &Command) -> Result<CommandOutput, CommandError> {
        self.calls.lock().unwrap().push(command.clone());

        let rendered = command.to_string();
        if self.failing.iter().any(|f| rendered.contains(f.as_str())) {
            return Ok(failed(1, "error: injected failure"));
        }

        let mut state = self.state.lock().unwrap();
        let last = command.args.last().cloned().unwrap_or_default();
        let verb = command.args.get(2).map(String::as_str).unwrap_or_default();

        let output = match verb {
            "get" if !state.exists && rendered.contains("--ignore-not-found") => ok(""),
            "get" if !state.exists => failed(1, NOT_FOUND),
            "get" if rendered.contains("annotations") => {
                ok(state.annotation.as_deref().unwrap_or_default())
            }
            "get" => {
                let name = command.args.get(4).cloned().unwrap_or_default();
                ok(&format!(
                    "{}\n{}",
                    name,
                    state.image.as_deref().unwrap_or_default()
                ))
            }
            "set" if !state.exists => failed(1, NOT_FOUND),
            "set" => {
                state.image = last.split_once('=').map(|(_, image)| image.to_string());
                ok("deployment.apps/orders image updated")
            }
            "create" if state.exists => failed(1, "AlreadyExists"),
            "create" => {
                state.exists = true;
                state.image = last.strip_prefix("--image=").map(str::to_string);
                ok("deployment.apps/orders created")
            }
            "patch" => {
                state.patches.push(last);
                ok("deployment.apps/orders patched")
            }
            "annotate" => {
                state.annotation = last.split_once('=').map(|(_, value)| value.to_string());
                ok("deployment.apps/orders annotated")
            }
            _ => ok(""),
        };

        Ok(output)
    }
}

/// Collects notifications instead of delivering them
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    fail: bool,
}

impl RecordingNotifier {
    /// Records every notification, then reports a delivery failure
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, notification: &Notification) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(notification.clone());
        if self.fail {
            anyhow::bail!("mail relay unavailable");
        }
        Ok(())
    }
}
