//! Core domain types
//!
//! Shared between the definition loader (produces raw parameters), the
//! runner (plans and reconciles) and the CLI (displays them).

pub mod app_type;
pub mod config;
pub mod deployment;
pub mod release;

pub use app_type::ApplicationType;
pub use config::{
    NotificationAddresses, PipelineConfig, RawParameters, ResourceLimits, SonarSettings,
    ToolImages,
};
pub use deployment::DeploymentState;
pub use release::ReleasePlan;
