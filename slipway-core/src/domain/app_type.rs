//! Application type taxonomy

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Category of application a pipeline builds and deploys
///
/// Chosen once per run. Drives the default exposed port and whether the
/// sources must be compiled before containerization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationType {
    AngularNginx,
    ReactNginx,
    ReactNormal,
    Springboot,
    TomcatWar,
}

impl ApplicationType {
    /// Every supported application type, in declaration order
    pub const ALL: [ApplicationType; 5] = [
        ApplicationType::AngularNginx,
        ApplicationType::ReactNginx,
        ApplicationType::ReactNormal,
        ApplicationType::Springboot,
        ApplicationType::TomcatWar,
    ];

    /// Wire name used in pipeline definitions (e.g. "angular-nginx")
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationType::AngularNginx => "angular-nginx",
            ApplicationType::ReactNginx => "react-nginx",
            ApplicationType::ReactNormal => "react-normal",
            ApplicationType::Springboot => "springboot",
            ApplicationType::TomcatWar => "tomcat-war",
        }
    }

    /// Port the workload listens on when the definition does not set one
    pub fn default_expose_port(&self) -> u16 {
        match self {
            ApplicationType::AngularNginx | ApplicationType::ReactNginx => 80,
            ApplicationType::Springboot | ApplicationType::TomcatWar => 8080,
            ApplicationType::ReactNormal => 3000,
        }
    }

    /// Whether a Maven compile/test step runs before the image build
    pub fn requires_compile_step(&self) -> bool {
        matches!(
            self,
            ApplicationType::Springboot | ApplicationType::TomcatWar
        )
    }

    /// Comma-separated list of valid wire names, for error messages
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for ApplicationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when a string is not one of the known application types
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownApplicationType(pub String);

impl FromStr for ApplicationType {
    type Err = UnknownApplicationType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownApplicationType(s.to_string()))
    }
}
