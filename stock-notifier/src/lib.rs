pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod notifier;
pub mod publisher;

pub use crate::catalog::{extract_low_stock, format_message, Catalog, LowStockScan, SkippedVariant};
pub use crate::client::CatalogClient;
pub use crate::config::{Destination, NotifierConfig, DEFAULT_THRESHOLD};
pub use crate::error::{CatalogError, NotifierError};
pub use crate::notifier::{RunReport, StockNotifier};
pub use crate::publisher::{NotificationPublisher, PublishOutcome, SnsPublisher, WebhookPublisher};
pub use common_observability::NotifierMetrics;
