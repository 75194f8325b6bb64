//! Validation errors raised while resolving a pipeline configuration

use thiserror::Error;

/// Result type alias for configuration resolution
pub type Result<T> = std::result::Result<T, ValidationError>;

/// A pipeline definition that cannot be turned into a configuration
///
/// Always raised before any external command runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// One or more required parameters are absent or empty
    #[error("missing required parameter(s): {}", .0.join(", "))]
    MissingRequired(Vec<String>),

    /// appType is set but not a known application type
    #[error("invalid appType '{value}', expected one of: {valid}")]
    InvalidAppType {
        /// The rejected value
        value: String,
        /// Comma-separated list of accepted values
        valid: String,
    },

    /// Keys that the resolver does not recognize (usually typos)
    #[error("unknown parameter(s): {}", .0.join(", "))]
    UnknownParameters(Vec<String>),

    /// A recognized key with a value of the wrong type or range
    #[error("invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

impl ValidationError {
    pub fn invalid_value(key: &str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
