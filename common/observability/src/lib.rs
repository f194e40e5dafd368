use anyhow::Result;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct NotifierMetrics {
    pub registry: Registry,
    pub runs_total: IntCounterVec,
    pub low_stock_skus: IntGauge,
    pub skipped_variants_total: IntCounter,
    pub publish_total: IntCounterVec,
    pub fetch_duration_seconds: Histogram,
}

impl NotifierMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let runs_total = IntCounterVec::new(
            Opts::new("stock_notifier_runs_total", "Low-stock check passes grouped by result"),
            &["result"],
        )?;
        let low_stock_skus = IntGauge::new(
            "stock_notifier_low_stock_skus",
            "SKUs at or below the threshold in the most recent pass",
        )?;
        let skipped_variants_total = IntCounter::new(
            "stock_notifier_skipped_variants_total",
            "Catalog variants skipped because they could not be decoded",
        )?;
        let publish_total = IntCounterVec::new(
            Opts::new("stock_notifier_publish_total", "Notification publish attempts grouped by outcome"),
            &["outcome"],
        )?;
        let fetch_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "stock_notifier_fetch_duration_seconds",
                "Time spent fetching the product catalog",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )?;
        registry.register(Box::new(runs_total.clone()))?;
        registry.register(Box::new(low_stock_skus.clone()))?;
        registry.register(Box::new(skipped_variants_total.clone()))?;
        registry.register(Box::new(publish_total.clone()))?;
        registry.register(Box::new(fetch_duration_seconds.clone()))?;
        Ok(Self {
            registry,
            runs_total,
            low_stock_skus,
            skipped_variants_total,
            publish_total,
            fetch_duration_seconds,
        })
    }

    pub fn record_run(&self, result: &str) {
        self.runs_total.with_label_values(&[result]).inc();
    }

    pub fn record_publish(&self, outcome: &str) {
        self.publish_total.with_label_values(&[outcome]).inc();
    }

    /// Prometheus text exposition of every registered family.
    pub fn render(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
