//! Run notifications
//!
//! Every run ends with exactly one notification. Delivery is best effort:
//! a failed delivery is logged and never changes the run's outcome.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use slipway_core::domain::PipelineConfig;
use std::sync::Arc;
use tracing::info;

use crate::pipeline::report::{RunReport, RunStatus};
use crate::settings::Settings;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub status: RunStatus,
    pub recipients: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl Notification {
    /// Builds the notification closing `report`
    ///
    /// Success goes to the success list. Failure goes to the failure list
    /// with the failure CC list and the last commit's author copied.
    pub fn for_run(report: &RunReport, config: &PipelineConfig) -> Self {
        let status = report.status();
        let addresses = &config.notifications;

        let (recipients, cc) = match status {
            RunStatus::Success => (split_addresses(&addresses.success), Vec::new()),
            RunStatus::Failure => {
                let mut cc = split_addresses(&addresses.failure_cc);
                if let Some(source) = &report.source {
                    let author = source.author_email.trim();
                    if !author.is_empty() && !cc.iter().any(|a| a == author) {
                        cc.push(author.to_string());
                    }
                }
                (split_addresses(&addresses.failure), cc)
            }
        };

        let mut subject = format!(
            "[slipway] {}: {} {} build #{}",
            status, report.app_name, report.environment, report.build_id
        );
        if let Some(failed) = report.failed_stage() {
            subject.push_str(&format!(" (failed at {})", failed.stage));
        }

        Self {
            status,
            recipients,
            cc,
            subject,
            body: report.summary(),
        }
    }
}

/// Splits a comma or semicolon separated address list
pub fn split_addresses(list: &str) -> Vec<String> {
    list.split([',', ';'])
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

/// Delivers run notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short name of the delivery channel, for logs
    fn name(&self) -> &'static str;

    async fn send(&self, notification: &Notification) -> Result<()>;
}

/// Writes notifications to the log only
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        info!(
            "Notification to {} (cc: {}): {}",
            notification.recipients.join(", "),
            notification.cc.join(", "),
            notification.subject
        );
        Ok(())
    }
}

/// Posts notifications as JSON to an HTTP endpoint (mail relay, chat hook)
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    url: String,
    client: Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(url, Client::new())
    }

    pub fn with_client(url: impl Into<String>, client: Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, notification: &Notification) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(notification)
            .send()
            .await
            .with_context(|| format!("Failed to reach notification webhook {}", self.url))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!(
                "Notification webhook returned {}: {}",
                status.as_u16(),
                error_text
            );
        }

        info!("Notification delivered: {}", notification.subject);
        Ok(())
    }
}

/// Webhook notifier when one is configured, log notifier otherwise
pub fn notifier_for(settings: &Settings) -> Arc<dyn Notifier> {
    match &settings.notify_webhook {
        Some(url) => Arc::new(WebhookNotifier::new(url.clone())),
        None => Arc::new(LogNotifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::report::StageStatus;
    use crate::pipeline::stages::Stage;
    use crate::source::SourceInfo;
    use crate::testing::config;
    use std::time::Duration;

    fn report_for(config: &PipelineConfig) -> RunReport {
        let plan = slipway_core::plan(config, 7);
        let mut report = RunReport::start(config, &plan);
        report.source = Some(SourceInfo {
            origin_url: "git@git.example.com:intsys/orders.git".to_string(),
            author_email: "dev@example.com".to_string(),
        });
        report.record(Stage::Checkout, StageStatus::Succeeded, None, Duration::ZERO);
        report
    }

    #[test]
    fn test_success_notification() {
        let config = config(
            "orders",
            "springboot",
            &[("successEmail", "team@example.com, lead@example.com")],
        );
        let notification = Notification::for_run(&report_for(&config), &config);

        assert_eq!(notification.status, RunStatus::Success);
        assert_eq!(
            notification.recipients,
            vec!["team@example.com", "lead@example.com"]
        );
        assert!(notification.cc.is_empty());
        assert_eq!(notification.subject, "[slipway] SUCCESS: orders stg build #7");
    }

    #[test]
    fn test_failure_notification_copies_author() {
        let config = config("orders", "springboot", &[("failureEmail", "oncall@example.com")]);
        let mut report = report_for(&config);
        report.record(
            Stage::Scan,
            StageStatus::Failed,
            Some("vulnerabilities found".to_string()),
            Duration::ZERO,
        );

        let notification = Notification::for_run(&report, &config);

        assert_eq!(notification.status, RunStatus::Failure);
        assert_eq!(notification.recipients, vec!["oncall@example.com"]);
        assert_eq!(
            notification.cc,
            vec!["devops-oncall@intsys.local", "dev@example.com"]
        );
        assert!(notification.subject.ends_with("(failed at scan)"));
        assert!(notification.body.contains("vulnerabilities found"));
    }

    #[test]
    fn test_failure_without_source_has_no_author() {
        let config = config("orders", "springboot", &[]);
        let plan = slipway_core::plan(&config, 7);
        let mut report = RunReport::start(&config, &plan);
        report.record(
            Stage::Checkout,
            StageStatus::Failed,
            Some("not a git repository".to_string()),
            Duration::ZERO,
        );

        let notification = Notification::for_run(&report, &config);
        assert_eq!(notification.cc, vec!["devops-oncall@intsys.local"]);
    }

    #[test]
    fn test_split_addresses() {
        assert_eq!(split_addresses("a@x; b@x ,,c@x "), vec!["a@x", "b@x", "c@x"]);
        assert!(split_addresses("  ").is_empty());
    }

    #[test]
    fn test_notifier_selection() {
        let mut settings = Settings::default();
        assert_eq!(notifier_for(&settings).name(), "log");

        settings.notify_webhook = Some("https://hooks.example.com/ci".to_string());
        assert_eq!(notifier_for(&settings).name(), "webhook");
    }

    /// Serves one HTTP request with `status` and returns the request body
    async fn serve_once(status: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/hook", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 4096];

            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);

                let text = String::from_utf8_lossy(&request);
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
            }

            let body = "relay says no";
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            let text = String::from_utf8_lossy(&request).to_string();
            text.split_once("\r\n\r\n")
                .map(|(_, body)| body.to_string())
                .unwrap_or_default()
        });

        (url, handle)
    }

    fn local_notifier(url: String) -> WebhookNotifier {
        let client = Client::builder().no_proxy().build().unwrap();
        WebhookNotifier::with_client(url, client)
    }

    #[tokio::test]
    async fn test_webhook_posts_json() {
        let config = config("orders", "springboot", &[]);
        let notification = Notification::for_run(&report_for(&config), &config);
        let (url, server) = serve_once("200 OK").await;

        local_notifier(url).send(&notification).await.unwrap();

        let body = server.await.unwrap();
        let posted: Notification = serde_json::from_str(&body).unwrap();
        assert_eq!(posted, notification);
    }

    #[tokio::test]
    async fn test_webhook_error_status_is_error() {
        let config = config("orders", "springboot", &[]);
        let notification = Notification::for_run(&report_for(&config), &config);
        let (url, server) = serve_once("500 Internal Server Error").await;

        let err = local_notifier(url)
            .send(&notification)
            .await
            .unwrap_err()
            .to_string();

        assert!(err.contains("500"), "{}", err);
        assert!(err.contains("relay says no"), "{}", err);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_webhook_unreachable_is_error() {
        let config = config("orders", "springboot", &[]);
        let notification = Notification::for_run(&report_for(&config), &config);

        let notifier = WebhookNotifier::new("http://127.0.0.1:9/hook");
        assert!(notifier.send(&notification).await.is_err());
    }
}
