use std::sync::Arc;
use std::time::Instant;

use common_observability::NotifierMetrics;
use tracing::{error, info, warn};

use crate::catalog::{extract_low_stock, format_message, SkippedVariant};
use crate::client::CatalogClient;
use crate::error::NotifierError;
use crate::publisher::{NotificationPublisher, PublishOutcome};

/// Result of one completed pass.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub low_stock_skus: Vec<String>,
    pub skipped_variants: Vec<SkippedVariant>,
    pub variants_seen: usize,
    /// `None` when nothing was at or below the threshold.
    pub notification: Option<PublishOutcome>,
}

pub struct StockNotifier {
    threshold: i64,
    client: CatalogClient,
    publisher: Arc<dyn NotificationPublisher>,
    metrics: Arc<NotifierMetrics>,
}

impl StockNotifier {
    pub fn new(
        threshold: i64,
        client: CatalogClient,
        publisher: Arc<dyn NotificationPublisher>,
        metrics: Arc<NotifierMetrics>,
    ) -> Self {
        Self {
            threshold,
            client,
            publisher,
            metrics,
        }
    }

    /// Fetch, scan, and publish at most once. Only a failed fetch is an error.
    pub async fn run_once(&self) -> Result<RunReport, NotifierError> {
        let started = Instant::now();
        let fetched = self.client.fetch().await;
        self.metrics
            .fetch_duration_seconds
            .observe(started.elapsed().as_secs_f64());
        let catalog = match fetched {
            Ok(catalog) => catalog,
            Err(err) => {
                self.metrics.record_run("fetch_error");
                return Err(err.into());
            }
        };

        let scan = extract_low_stock(&catalog, self.threshold);
        self.metrics
            .skipped_variants_total
            .inc_by(scan.skipped.len() as u64);
        self.metrics.low_stock_skus.set(scan.low_stock.len() as i64);
        if !scan.skipped.is_empty() {
            warn!(skipped = scan.skipped.len(), "Some catalog entries were skipped");
        }

        let notification = match format_message(&scan.low_stock) {
            None => {
                info!(
                    variants = scan.variants_seen,
                    threshold = self.threshold,
                    "No SKUs at or below threshold; nothing to publish"
                );
                None
            }
            Some(message) => {
                let outcome = self.publisher.publish(&message).await;
                match &outcome {
                    PublishOutcome::Delivered { message_id } => info!(
                        %message_id,
                        skus = scan.low_stock.len(),
                        "Published low-stock notification"
                    ),
                    PublishOutcome::Failed { reason } => error!(
                        %reason,
                        skus = scan.low_stock.len(),
                        "Failed to publish low-stock notification"
                    ),
                }
                self.metrics.record_publish(outcome.label());
                Some(outcome)
            }
        };

        self.metrics.record_run("ok");
        Ok(RunReport {
            low_stock_skus: scan.low_stock,
            skipped_variants: scan.skipped,
            variants_seen: scan.variants_seen,
            notification,
        })
    }
}
