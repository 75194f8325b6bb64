//! kubectl command construction
//!
//! The cluster is only ever reached through kubectl invocations. Every
//! command is scoped to the configured namespace and to the deployment
//! (and service) named after the application.

use serde_json::{Value, json};
use slipway_core::domain::{DeploymentState, PipelineConfig, ResourceLimits};

use crate::command::Command;

/// Annotation key holding the build and source origin of a workload
pub const DESCRIPTION_ANNOTATION: &str = "description";

/// Builds kubectl commands for one application's deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kubectl {
    namespace: String,
    name: String,
}

impl Kubectl {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn for_config(config: &PipelineConfig) -> Self {
        Self::new(&config.namespace, &config.app_name)
    }

    /// Deployment, service and container name
    pub fn name(&self) -> &str {
        &self.name
    }

    fn base(&self) -> Command {
        Command::new("kubectl").args(["-n", self.namespace.as_str()])
    }

    /// Read-only query printing the deployment name and the image of the
    /// container named after it, one per line
    ///
    /// A missing deployment prints nothing and exits 0; any non-zero exit
    /// is a failure to reach or query the cluster.
    pub fn get_image(&self) -> Command {
        self.base().args([
            "get".to_string(),
            "deployment".to_string(),
            self.name.clone(),
            "--ignore-not-found".to_string(),
            "-o".to_string(),
            format!(
                "jsonpath={{.metadata.name}}{{\"\\n\"}}{{.spec.template.spec.containers[?(@.name==\"{}\")].image}}",
                self.name
            ),
        ])
    }

    /// Read-only query printing one annotation (empty when unset)
    pub fn get_annotation(&self, key: &str) -> Command {
        let escaped = key.replace('.', "\\.");
        self.base().args([
            "get".to_string(),
            "deployment".to_string(),
            self.name.clone(),
            "-o".to_string(),
            format!("jsonpath={{.metadata.annotations.{}}}", escaped),
        ])
    }

    pub fn set_image(&self, image: &str) -> Command {
        self.base().args([
            "set".to_string(),
            "image".to_string(),
            format!("deployment/{}", self.name),
            format!("{}={}", self.name, image),
        ])
    }

    /// Creates the deployment; kubectl names the container after the image,
    /// which is the application name
    pub fn create(&self, image: &str) -> Command {
        self.base().args([
            "create".to_string(),
            "deployment".to_string(),
            self.name.clone(),
            format!("--image={}", image),
        ])
    }

    /// Exposes the deployment as a service with the same name
    pub fn expose(&self, port: u16) -> Command {
        self.base().args([
            "expose".to_string(),
            "deployment".to_string(),
            self.name.clone(),
            format!("--name={}", self.name),
            format!("--port={}", port),
            format!("--target-port={}", port),
        ])
    }

    /// Strategic merge patch of the deployment
    pub fn patch(&self, patch: &Value) -> Command {
        self.base().args([
            "patch".to_string(),
            "deployment".to_string(),
            self.name.clone(),
            "--type=strategic".to_string(),
            "-p".to_string(),
            patch.to_string(),
        ])
    }

    pub fn annotate(&self, key: &str, value: &str) -> Command {
        self.base().args([
            "annotate".to_string(),
            "deployment".to_string(),
            self.name.clone(),
            format!("{}={}", key, value),
        ])
    }
}

/// Pod template patch adding the registry pull secret
pub fn image_pull_secret_patch(secret: &str) -> Value {
    json!({
        "spec": {
            "template": {
                "spec": {
                    "imagePullSecrets": [{ "name": secret }]
                }
            }
        }
    })
}

/// Container resource limits patch; `cpu` is left out entirely when unset
pub fn resource_limits_patch(container: &str, limits: &ResourceLimits) -> Value {
    let mut resource_limits = json!({ "memory": limits.memory });
    if let Some(cpu) = limits.cpu.as_deref().filter(|cpu| !cpu.is_empty()) {
        resource_limits["cpu"] = json!(cpu);
    }

    json!({
        "spec": {
            "template": {
                "spec": {
                    "containers": [{
                        "name": container,
                        "resources": { "limits": resource_limits }
                    }]
                }
            }
        }
    })
}

/// Reads the output of a successful [`Kubectl::get_image`]
pub fn parse_observed(stdout: &str) -> DeploymentState {
    let mut lines = stdout.lines().map(str::trim);

    match lines.next() {
        Some(name) if !name.is_empty() => DeploymentState::present(
            lines
                .next()
                .filter(|image| !image.is_empty())
                .map(str::to_string),
        ),
        _ => DeploymentState::absent(),
    }
}
