//! Origin annotation
//!
//! Records where a workload came from (the build that first deployed it and
//! its source repository). Set at most once: an existing annotation is
//! never overwritten.

use serde::{Deserialize, Serialize};
use slipway_core::domain::PipelineConfig;
use std::sync::Arc;
use tracing::info;

use super::kubectl::{DESCRIPTION_ANNOTATION, Kubectl};
use crate::command::CommandExecutor;
use crate::error::AnnotationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnnotationOutcome {
    Set,
    AlreadyPresent,
}

/// Annotation value combining build and source origins
pub fn describe_origin(build_url: &str, repository_url: &str) -> String {
    format!("build: {}; source: {}", build_url, repository_url)
}

pub struct Annotator {
    executor: Arc<dyn CommandExecutor>,
}

impl Annotator {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    /// Sets the origin annotation unless one is already present
    pub async fn annotate(
        &self,
        config: &PipelineConfig,
        build_url: &str,
        repository_url: &str,
    ) -> Result<AnnotationOutcome, AnnotationError> {
        let kubectl = Kubectl::for_config(config);

        let current = self
            .executor
            .run_checked(&kubectl.get_annotation(DESCRIPTION_ANNOTATION))
            .await
            .map_err(|source| AnnotationError::Query {
                name: kubectl.name().to_string(),
                source,
            })?;

        if !current.stdout.trim().is_empty() {
            info!(
                "Deployment {} already annotated: {}",
                kubectl.name(),
                current.stdout.trim()
            );
            return Ok(AnnotationOutcome::AlreadyPresent);
        }

        let value = describe_origin(build_url, repository_url);
        self.executor
            .run_checked(&kubectl.annotate(DESCRIPTION_ANNOTATION, &value))
            .await
            .map_err(|source| AnnotationError::Set {
                name: kubectl.name().to_string(),
                source,
            })?;

        info!("Annotated deployment {}: {}", kubectl.name(), value);
        Ok(AnnotationOutcome::Set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeCluster, config};

    const BUILD_URL: &str = "https://ci.example.com/job/orders/42/";
    const REPO_URL: &str = "git@git.example.com:intsys/orders.git";

    #[tokio::test]
    async fn test_annotation_set_exactly_once() {
        let config = config("orders", "springboot", &[]);
        let cluster = Arc::new(FakeCluster::with_deployment("img"));
        let annotator = Annotator::new(cluster.clone());

        let first = annotator.annotate(&config, BUILD_URL, REPO_URL).await.unwrap();
        let second = annotator
            .annotate(&config, "https://ci.example.com/job/orders/43/", REPO_URL)
            .await
            .unwrap();

        assert_eq!(first, AnnotationOutcome::Set);
        assert_eq!(second, AnnotationOutcome::AlreadyPresent);
        assert_eq!(cluster.verbs(), vec!["get", "annotate", "get"]);
        assert_eq!(
            cluster.state().annotation.as_deref(),
            Some(describe_origin(BUILD_URL, REPO_URL).as_str())
        );
    }

    #[tokio::test]
    async fn test_query_failure() {
        let config = config("orders", "springboot", &[]);
        let cluster = Arc::new(FakeCluster::empty());

        let err = Annotator::new(cluster.clone())
            .annotate(&config, BUILD_URL, REPO_URL)
            .await
            .unwrap_err();

        assert!(matches!(err, AnnotationError::Query { .. }));
        assert_eq!(cluster.verbs(), vec!["get"]);
    }

    #[tokio::test]
    async fn test_set_failure() {
        let config = config("orders", "springboot", &[]);
        let cluster = Arc::new(FakeCluster::with_deployment("img").fail_when("annotate"));

        let err = Annotator::new(cluster)
            .annotate(&config, BUILD_URL, REPO_URL)
            .await
            .unwrap_err();

        assert!(matches!(err, AnnotationError::Set { .. }));
    }

    #[test]
    fn test_describe_origin_format() {
        assert_eq!(
            describe_origin("https://ci/1/", "https://git/repo.git"),
            "build: https://ci/1/; source: https://git/repo.git"
        );
    }
}
