//! Release planner
//!
//! Derives the image reference and port policy for one build. No I/O.

use crate::domain::{PipelineConfig, ReleasePlan};

/// Placeholder substituted in the registry host template
pub const ENVIRONMENT_PLACEHOLDER: &str = "{environment}";

/// Plan a release of `config` for the caller-supplied build identifier
///
/// The image is tagged `{environment}.{build_id}` and pushed under
/// `{registry_host}/{project}/{app_name}`.
pub fn plan(config: &PipelineConfig, build_id: u64) -> ReleasePlan {
    let registry_host = render_registry_host(&config.registry_host, &config.environment);
    let image_reference = format!(
        "{}/{}/{}:{}.{}",
        registry_host, config.project, config.app_name, config.environment, build_id
    );

    ReleasePlan {
        build_id,
        registry_host,
        image_reference,
        exposed_port: config.expose_port,
        requires_compile_step: config.app_type.requires_compile_step(),
    }
}

/// Substitute the environment into a registry host template
pub fn render_registry_host(template: &str, environment: &str) -> String {
    template.replace(ENVIRONMENT_PLACEHOLDER, environment)
}
