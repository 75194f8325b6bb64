//! Configuration resolver
//!
//! Turns raw, loosely typed parameters into a [`PipelineConfig`], filling
//! defaults and rejecting anything the pipeline could not act on. Pure and
//! deterministic: the same parameters always resolve to the same result.

use serde_json::Value;

use crate::domain::config::{
    DEFAULT_ENVIRONMENT, DEFAULT_HARBOUR_SECRET, DEFAULT_NAMESPACE, DEFAULT_PROJECT,
    DEFAULT_REGISTRY_HOST,
};
use crate::domain::{
    ApplicationType, NotificationAddresses, PipelineConfig, RawParameters, ResourceLimits,
    SonarSettings, ToolImages,
};
use crate::error::{Result, ValidationError};

pub const APP_NAME: &str = "appName";
pub const APP_TYPE: &str = "appType";

/// Every key a pipeline definition may set
pub const RECOGNIZED_KEYS: &[&str] = &[
    APP_TYPE,
    APP_NAME,
    "environment",
    "namespace",
    "exposePort",
    "harbourSecret",
    "project",
    "registryHost",
    "memoryLimit",
    "cpuLimit",
    "sonarEnabled",
    "sonarProjectKey",
    "sonarProjectName",
    "successEmail",
    "failureEmail",
    "failureCC",
    "buildToolImage",
    "scanToolImage",
    "deployToolImage",
];

/// Resolve raw parameters into a validated configuration
///
/// Checks run in a fixed order: missing required keys (all of them reported
/// together), then the application type, then unknown keys, then the types
/// of the remaining values.
pub fn resolve(raw: &RawParameters) -> Result<PipelineConfig> {
    let missing: Vec<String> = [APP_NAME, APP_TYPE]
        .into_iter()
        .filter(|key| is_blank(raw.get(*key)))
        .map(str::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(ValidationError::MissingRequired(missing));
    }

    let app_type = parse_app_type(&raw[APP_TYPE])?;

    let mut unknown: Vec<String> = raw
        .keys()
        .filter(|key| !RECOGNIZED_KEYS.contains(&key.as_str()))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        unknown.sort();
        return Err(ValidationError::UnknownParameters(unknown));
    }

    let app_name = text(raw, APP_NAME)?.unwrap_or_default();
    let expose_port = match port(raw, "exposePort")? {
        Some(port) => port,
        None => app_type.default_expose_port(),
    };

    let sonar = SonarSettings {
        enabled: flag(raw, "sonarEnabled")?.unwrap_or(false),
        project_key: text(raw, "sonarProjectKey")?.unwrap_or_else(|| app_name.clone()),
        project_name: text(raw, "sonarProjectName")?.unwrap_or_else(|| app_name.clone()),
    };

    let notification_defaults = NotificationAddresses::default();
    let notifications = NotificationAddresses {
        success: text(raw, "successEmail")?.unwrap_or(notification_defaults.success),
        failure: text(raw, "failureEmail")?.unwrap_or(notification_defaults.failure),
        failure_cc: text(raw, "failureCC")?.unwrap_or(notification_defaults.failure_cc),
    };

    let tool_defaults = ToolImages::default();
    let tools = ToolImages {
        build: text(raw, "buildToolImage")?.unwrap_or(tool_defaults.build),
        scan: text(raw, "scanToolImage")?.unwrap_or(tool_defaults.scan),
        deploy: text(raw, "deployToolImage")?.unwrap_or(tool_defaults.deploy),
    };

    let resources = ResourceLimits {
        memory: text(raw, "memoryLimit")?.unwrap_or(ResourceLimits::default().memory),
        cpu: text(raw, "cpuLimit")?,
    };

    Ok(PipelineConfig {
        app_name,
        app_type,
        environment: text(raw, "environment")?.unwrap_or_else(|| DEFAULT_ENVIRONMENT.into()),
        project: text(raw, "project")?.unwrap_or_else(|| DEFAULT_PROJECT.into()),
        namespace: text(raw, "namespace")?.unwrap_or_else(|| DEFAULT_NAMESPACE.into()),
        expose_port,
        harbour_secret: text(raw, "harbourSecret")?
            .unwrap_or_else(|| DEFAULT_HARBOUR_SECRET.into()),
        registry_host: text(raw, "registryHost")?.unwrap_or_else(|| DEFAULT_REGISTRY_HOST.into()),
        tools,
        sonar,
        notifications,
        resources,
    })
}

/// Absent, null and whitespace-only strings all count as unset
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn parse_app_type(value: &Value) -> Result<ApplicationType> {
    let name = match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    name.parse()
        .map_err(|_| ValidationError::InvalidAppType {
            value: name,
            valid: ApplicationType::valid_names(),
        })
}

fn text(raw: &RawParameters, key: &str) -> Result<Option<String>> {
    match raw.get(key) {
        value if is_blank(value) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(other) => Err(ValidationError::invalid_value(
            key,
            format!("expected a string, got {}", other),
        )),
        None => Ok(None),
    }
}

fn port(raw: &RawParameters, key: &str) -> Result<Option<u16>> {
    let invalid = |shown: &dyn std::fmt::Display| {
        ValidationError::invalid_value(
            key,
            format!("expected a port between 1 and 65535, got {}", shown),
        )
    };

    match raw.get(key) {
        value if is_blank(value) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .filter(|n| *n > 0)
            .map(Some)
            .ok_or_else(|| invalid(n)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u16>()
            .ok()
            .filter(|n| *n > 0)
            .map(Some)
            .ok_or_else(|| invalid(&format!("'{}'", s))),
        Some(other) => Err(invalid(other)),
        None => Ok(None),
    }
}

fn flag(raw: &RawParameters, key: &str) -> Result<Option<bool>> {
    match raw.get(key) {
        value if is_blank(value) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(ValidationError::invalid_value(
                key,
                format!("expected true or false, got '{}'", s),
            )),
        },
        Some(other) => Err(ValidationError::invalid_value(
            key,
            format!("expected a boolean, got {}", other),
        )),
        None => Ok(None),
    }
}
