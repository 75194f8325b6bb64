//! Live workload state

use serde::{Deserialize, Serialize};

/// Observed state of the target workload
///
/// Fetched fresh for every reconciliation and dropped once the decision is made.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentState {
    pub exists: bool,
    pub current_image: Option<String>,
}

impl DeploymentState {
    pub fn absent() -> Self {
        Self {
            exists: false,
            current_image: None,
        }
    }

    pub fn present(current_image: Option<String>) -> Self {
        Self {
            exists: true,
            current_image,
        }
    }

    /// True when the workload exists and already runs `image`
    pub fn runs_image(&self, image: &str) -> bool {
        self.exists && self.current_image.as_deref() == Some(image)
    }
}
