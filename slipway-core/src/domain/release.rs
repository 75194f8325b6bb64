//! Release plan domain types

use serde::{Deserialize, Serialize};

/// Everything derived from a configuration and a build identifier
///
/// Read-only once planned. Two plans built from the same inputs are equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleasePlan {
    pub build_id: u64,
    /// Registry host with the environment substituted in
    pub registry_host: String,
    /// Fully qualified tagged image, e.g. `stg-docker-reg.intsys.local/intsys/orders:stg.42`
    pub image_reference: String,
    pub exposed_port: u16,
    pub requires_compile_step: bool,
}
