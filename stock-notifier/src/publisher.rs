use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sns::error::DisplayErrorContext;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    Delivered { message_id: String },
    Failed { reason: String },
}

impl PublishOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, PublishOutcome::Delivered { .. })
    }

    /// Metric label.
    pub fn label(&self) -> &'static str {
        match self {
            PublishOutcome::Delivered { .. } => "delivered",
            PublishOutcome::Failed { .. } => "failed",
        }
    }
}

/// One-shot delivery of the low-stock summary. Implementations report failure
/// through [`PublishOutcome::Failed`] and never retry.
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    async fn publish(&self, message: &str) -> PublishOutcome;
}

pub struct SnsPublisher {
    client: aws_sdk_sns::Client,
    topic_arn: String,
}

impl SnsPublisher {
    pub fn new(client: aws_sdk_sns::Client, topic_arn: impl Into<String>) -> Self {
        Self {
            client,
            topic_arn: topic_arn.into(),
        }
    }

    /// Loads AWS settings from the default provider chain, with optional overrides
    /// (LocalStack and the like).
    pub async fn from_env(
        topic_arn: impl Into<String>,
        region: Option<&str>,
        endpoint_url: Option<&str>,
    ) -> Self {
        let mut builder = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            builder = builder.region(aws_config::Region::new(region.to_string()));
        }
        if let Some(endpoint) = endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }
        let sdk_config = builder.load().await;
        Self::new(aws_sdk_sns::Client::new(&sdk_config), topic_arn)
    }

    pub fn topic_arn(&self) -> &str {
        &self.topic_arn
    }
}

#[async_trait]
impl NotificationPublisher for SnsPublisher {
    async fn publish(&self, message: &str) -> PublishOutcome {
        let result = self
            .client
            .publish()
            .topic_arn(&self.topic_arn)
            .message(message)
            .send()
            .await;
        match result {
            Ok(output) => {
                let message_id = output.message_id().unwrap_or("unknown").to_string();
                debug!(topic_arn = %self.topic_arn, %message_id, "Published to SNS");
                PublishOutcome::Delivered { message_id }
            }
            Err(err) => PublishOutcome::Failed {
                reason: format!("SNS publish failed: {}", DisplayErrorContext(&err)),
            },
        }
    }
}

/// Posts `{"text": message}` to a chat-style webhook.
pub struct WebhookPublisher {
    client: Client,
    url: String,
    bearer: Option<String>,
}

impl WebhookPublisher {
    pub fn new(url: impl Into<String>, bearer: Option<String>) -> Self {
        Self::with_client(Client::new(), url, bearer)
    }

    pub fn with_client(client: Client, url: impl Into<String>, bearer: Option<String>) -> Self {
        Self {
            client,
            url: url.into(),
            bearer,
        }
    }
}

#[async_trait]
impl NotificationPublisher for WebhookPublisher {
    async fn publish(&self, message: &str) -> PublishOutcome {
        let mut req = self.client.post(&self.url).json(&json!({ "text": message }));
        if let Some(token) = self.bearer.as_deref() {
            req = req.bearer_auth(token);
        }

        let response = match req.send().await {
            Ok(response) => response,
            Err(err) => {
                return PublishOutcome::Failed {
                    reason: format!("webhook request failed: {err}"),
                }
            }
        };
        let status = response.status();
        if !status.is_success() {
            warn!(status = ?status, "Low-stock webhook returned failure status");
            return PublishOutcome::Failed {
                reason: format!("webhook returned status {status}"),
            };
        }

        // Chat webhooks rarely return an id; fall back to the status code.
        let message_id = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body.get("id").and_then(|id| id.as_str()).map(str::to_string))
            .unwrap_or_else(|| format!("http-{}", status.as_u16()));
        PublishOutcome::Delivered { message_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn webhook_posts_text_with_bearer() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/hooks/stock")
                    .header("authorization", "Bearer tok")
                    .json_body(json!({ "text": "A,B" }));
                then.status(200).json_body(json!({ "id": "msg-42" }));
            })
            .await;

        let publisher = WebhookPublisher::new(server.url("/hooks/stock"), Some("tok".into()));
        let outcome = publisher.publish("A,B").await;
        mock.assert_async().await;
        assert_eq!(outcome, PublishOutcome::Delivered { message_id: "msg-42".into() });
    }

    #[tokio::test]
    async fn webhook_without_id_uses_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/hooks/stock");
                then.status(204);
            })
            .await;

        let publisher = WebhookPublisher::new(server.url("/hooks/stock"), None);
        let outcome = publisher.publish("A").await;
        assert_eq!(outcome, PublishOutcome::Delivered { message_id: "http-204".into() });
    }

    #[tokio::test]
    async fn webhook_failure_status_is_reported() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/hooks/stock");
                then.status(503);
            })
            .await;

        let publisher = WebhookPublisher::new(server.url("/hooks/stock"), None);
        let outcome = publisher.publish("A").await;
        assert!(!outcome.is_delivered());
        assert_eq!(outcome.label(), "failed");
        match outcome {
            PublishOutcome::Failed { reason } => assert!(reason.contains("503"), "{reason}"),
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
