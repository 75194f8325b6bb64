//! Source-control queries
//!
//! The pipeline needs two facts from the checked-out repository: where it
//! came from (for the origin annotation) and who made the last commit (CC'd
//! on failure notifications).

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::command::{Command, CommandExecutor};
use crate::error::CommandError;

/// Facts about the checked-out sources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub origin_url: String,
    pub author_email: String,
}

/// Queries git in the workspace through the command executor
pub struct GitSource {
    executor: Arc<dyn CommandExecutor>,
}

impl GitSource {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    /// Remote URL of `origin`
    pub async fn origin_url(&self) -> Result<String, CommandError> {
        let command = Command::new("git").args(["remote", "get-url", "origin"]);
        let output = self.executor.run_checked(&command).await?;
        Ok(output.stdout.trim().to_string())
    }

    /// Author email of the last commit
    pub async fn last_author_email(&self) -> Result<String, CommandError> {
        let command = Command::new("git").args(["log", "-1", "--pretty=format:%ae"]);
        let output = self.executor.run_checked(&command).await?;
        Ok(output.stdout.trim().to_string())
    }

    pub async fn describe(&self) -> Result<SourceInfo, CommandError> {
        Ok(SourceInfo {
            origin_url: self.origin_url().await?,
            author_email: self.last_author_email().await?,
        })
    }
}
