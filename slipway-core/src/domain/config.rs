//! Pipeline configuration domain types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::app_type::ApplicationType;

/// Unvalidated parameters as read from a pipeline definition or the command line
pub type RawParameters = HashMap<String, serde_json::Value>;

pub const DEFAULT_ENVIRONMENT: &str = "stg";
pub const DEFAULT_NAMESPACE: &str = "intsys";
pub const DEFAULT_PROJECT: &str = "intsys";
pub const DEFAULT_HARBOUR_SECRET: &str = "harbor-intsys";
pub const DEFAULT_MEMORY_LIMIT: &str = "512Mi";
pub const DEFAULT_REGISTRY_HOST: &str = "{environment}-docker-reg.intsys.local";
pub const DEFAULT_SUCCESS_EMAIL: &str = "devops@intsys.local";
pub const DEFAULT_FAILURE_EMAIL: &str = "devops@intsys.local";
pub const DEFAULT_FAILURE_CC: &str = "devops-oncall@intsys.local";
pub const DEFAULT_BUILD_TOOL_IMAGE: &str = "maven:3.9-eclipse-temurin-17";
pub const DEFAULT_SCAN_TOOL_IMAGE: &str = "aquasec/trivy:0.50.1";
pub const DEFAULT_DEPLOY_TOOL_IMAGE: &str = "bitnami/kubectl:1.29";

/// Resolved, validated pipeline configuration
///
/// Built once per run by the resolver and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    pub app_name: String,
    pub app_type: ApplicationType,
    pub environment: String,
    pub project: String,
    pub namespace: String,
    pub expose_port: u16,
    pub harbour_secret: String,
    /// Registry host template; `{environment}` is substituted when planning
    pub registry_host: String,
    pub tools: ToolImages,
    pub sonar: SonarSettings,
    pub notifications: NotificationAddresses,
    pub resources: ResourceLimits,
}

/// Images the build, scan and deploy tools run in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolImages {
    pub build: String,
    pub scan: String,
    pub deploy: String,
}

impl Default for ToolImages {
    fn default() -> Self {
        Self {
            build: DEFAULT_BUILD_TOOL_IMAGE.to_string(),
            scan: DEFAULT_SCAN_TOOL_IMAGE.to_string(),
            deploy: DEFAULT_DEPLOY_TOOL_IMAGE.to_string(),
        }
    }
}

/// Static analysis settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SonarSettings {
    pub enabled: bool,
    pub project_key: String,
    pub project_name: String,
}

/// Recipients of the end-of-run notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationAddresses {
    pub success: String,
    pub failure: String,
    pub failure_cc: String,
}

impl Default for NotificationAddresses {
    fn default() -> Self {
        Self {
            success: DEFAULT_SUCCESS_EMAIL.to_string(),
            failure: DEFAULT_FAILURE_EMAIL.to_string(),
            failure_cc: DEFAULT_FAILURE_CC.to_string(),
        }
    }
}

/// Container resource limits applied to newly created workloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLimits {
    pub memory: String,
    /// Never `Some("")`: an empty value resolves to `None`
    pub cpu: Option<String>,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            memory: DEFAULT_MEMORY_LIMIT.to_string(),
            cpu: None,
        }
    }
}
