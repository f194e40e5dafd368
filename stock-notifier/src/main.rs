use anyhow::Context;
use axum::{extract::State, http::StatusCode, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use stock_notifier::{
    CatalogClient, Destination, NotificationPublisher, NotifierConfig, NotifierMetrics,
    RunReport, SnsPublisher, StockNotifier, WebhookPublisher,
};
use structopt::StructOpt;
use tokio::net::TcpListener;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(StructOpt, Debug)]
#[structopt(name = "stock-notifier", about = "Publishes a summary of low-stock SKUs")]
struct Cli {
    /// Keep running, checking every CHECK_INTERVAL_SECONDS and serving /metrics.
    /// Without it a single pass runs and the process exits.
    #[structopt(long = "loop")]
    run_loop: bool,
}

async fn health() -> &'static str {
    "ok"
}

async fn metrics_endpoint(State(metrics): State<Arc<NotifierMetrics>>) -> (StatusCode, String) {
    match metrics.render() {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        ),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::from_args();
    let config = NotifierConfig::from_env().context("invalid stock-notifier configuration")?;
    info!(?config, "Loaded stock-notifier configuration");

    let metrics = Arc::new(NotifierMetrics::new()?);
    let client = CatalogClient::new(&config)?;
    let publisher = build_publisher(&config).await?;
    let notifier = StockNotifier::new(config.threshold, client, publisher, metrics.clone());

    if !cli.run_loop {
        let report = notifier.run_once().await?;
        log_report(&report);
        return Ok(());
    }

    spawn_metrics_server(config.metrics_port, metrics).await?;
    run_every(&notifier, config.check_interval).await;
    Ok(())
}

async fn build_publisher(config: &NotifierConfig) -> anyhow::Result<Arc<dyn NotificationPublisher>> {
    let publisher: Arc<dyn NotificationPublisher> = match &config.destination {
        Destination::SnsTopic { topic_arn } => {
            let publisher = SnsPublisher::from_env(
                topic_arn.clone(),
                config.aws_region.as_deref(),
                config.aws_endpoint_url.as_deref(),
            )
            .await;
            info!(topic_arn = %publisher.topic_arn(), "Publishing low-stock notifications to SNS");
            Arc::new(publisher)
        }
        Destination::Webhook { url, bearer } => {
            let client = reqwest::Client::builder()
                .timeout(config.http_timeout)
                .build()
                .context("failed to build webhook client")?;
            info!(webhook_url = %url, "Publishing low-stock notifications to webhook");
            Arc::new(WebhookPublisher::with_client(client, url.clone(), bearer.clone()))
        }
    };
    Ok(publisher)
}

async fn spawn_metrics_server(port: u16, metrics: Arc<NotifierMetrics>) -> anyhow::Result<()> {
    let app = Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics_endpoint))
        .with_state(metrics);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {addr}"))?;
    info!(%addr, "Serving /healthz and /metrics");
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            error!(error = %err, "Metrics listener stopped");
        }
    });
    Ok(())
}

async fn run_every(notifier: &StockNotifier, every: Duration) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                return;
            }
        }
        match notifier.run_once().await {
            Ok(report) => log_report(&report),
            Err(err) => warn!(error = %err, "Low-stock check failed; retrying on next tick"),
        }
    }
}

fn log_report(report: &RunReport) {
    info!(
        variants = report.variants_seen,
        low_stock = report.low_stock_skus.len(),
        skipped = report.skipped_variants.len(),
        published = report.notification.as_ref().map(|outcome| outcome.label()),
        "Low-stock check complete"
    );
}
