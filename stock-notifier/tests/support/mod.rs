#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use stock_notifier::{
    CatalogClient, NotificationPublisher, NotifierConfig, NotifierMetrics, PublishOutcome,
    StockNotifier,
};

pub const PRODUCTS_PATH: &str = "/admin/api/2022-04/products.json";
/// base64("key:secret")
pub const BASIC_AUTH: &str = "Basic a2V5OnNlY3JldA==";

/// Publisher double that records every message and answers with a fixed outcome.
pub struct RecordingPublisher {
    pub messages: Mutex<Vec<String>>,
    outcome: PublishOutcome,
}

impl RecordingPublisher {
    pub fn delivering() -> Arc<Self> {
        Arc::new(Self {
            messages: Mutex::new(Vec::new()),
            outcome: PublishOutcome::Delivered { message_id: "msg-1".into() },
        })
    }

    pub fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self {
            messages: Mutex::new(Vec::new()),
            outcome: PublishOutcome::Failed { reason: reason.into() },
        })
    }

    pub fn sent(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationPublisher for RecordingPublisher {
    async fn publish(&self, message: &str) -> PublishOutcome {
        self.messages.lock().unwrap().push(message.to_string());
        self.outcome.clone()
    }
}

pub fn config(base_url: &str, extra: &[(&str, &str)]) -> NotifierConfig {
    let mut vars: HashMap<String, String> = [
        ("SHOPIFY_API_KEY", "key"),
        ("SHOPIFY_API_PASSWORD", "secret"),
        ("SHOPIFY_DOMAIN", "acme"),
        ("NOTIFY_TOPIC_ARN", "arn:aws:sns:us-east-1:123456789012:low-stock"),
        ("SHOPIFY_BASE_URL", base_url),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    NotifierConfig::from_lookup(|name| vars.get(name).cloned()).expect("test config")
}

pub fn notifier(config: &NotifierConfig, publisher: Arc<RecordingPublisher>) -> (StockNotifier, Arc<NotifierMetrics>) {
    let metrics = Arc::new(NotifierMetrics::new().expect("metrics"));
    let client = CatalogClient::new(config).expect("client");
    let notifier = StockNotifier::new(config.threshold, client, publisher, metrics.clone());
    (notifier, metrics)
}
