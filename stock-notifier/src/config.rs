use anyhow::{bail, Context, Result};
use std::env;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_THRESHOLD: i64 = 10;
pub const DEFAULT_API_VERSION: &str = "2022-04";

/// Where the low-stock summary goes.
#[derive(Clone)]
pub enum Destination {
    SnsTopic { topic_arn: String },
    Webhook { url: String, bearer: Option<String> },
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::SnsTopic { topic_arn } => {
                f.debug_struct("SnsTopic").field("topic_arn", topic_arn).finish()
            }
            Destination::Webhook { url, bearer } => f
                .debug_struct("Webhook")
                .field("url", url)
                .field("bearer", &bearer.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

#[derive(Clone)]
pub struct NotifierConfig {
    pub api_key: String,
    pub api_password: String,
    pub domain: String,
    pub base_url: String,
    pub api_version: String,
    pub threshold: i64,
    pub page_limit: u32,
    pub http_timeout: Duration,
    pub destination: Destination,
    pub aws_region: Option<String>,
    pub aws_endpoint_url: Option<String>,
    pub check_interval: Duration,
    pub metrics_port: u16,
}

impl NotifierConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |name: &str| get(name).with_context(|| format!("{name} must be set"));

        let api_key = required("SHOPIFY_API_KEY")?;
        let api_password = required("SHOPIFY_API_PASSWORD")?;
        let domain = required("SHOPIFY_DOMAIN")?;

        let destination = match (get("NOTIFY_TOPIC_ARN"), get("NOTIFY_WEBHOOK_URL")) {
            (Some(topic_arn), _) => Destination::SnsTopic { topic_arn },
            (None, Some(url)) => Destination::Webhook {
                url,
                bearer: get("NOTIFY_WEBHOOK_BEARER"),
            },
            (None, None) => bail!("NOTIFY_TOPIC_ARN must be set (or NOTIFY_WEBHOOK_URL)"),
        };

        let base_url = get("SHOPIFY_BASE_URL")
            .unwrap_or_else(|| format!("https://{domain}.myshopify.com"))
            .trim_end_matches('/')
            .to_string();
        let api_version =
            get("SHOPIFY_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        let threshold = get("LOW_STOCK_THRESHOLD")
            .and_then(|value| value.parse::<i64>().ok())
            .unwrap_or(DEFAULT_THRESHOLD);
        let page_limit = get("CATALOG_PAGE_LIMIT")
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(1);
        let http_timeout_secs = get("HTTP_TIMEOUT_SECONDS")
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(30);
        let check_interval_secs = get("CHECK_INTERVAL_SECONDS")
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(3600);
        let metrics_port = get("METRICS_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(9102);

        Ok(Self {
            api_key,
            api_password,
            domain,
            base_url,
            api_version,
            threshold,
            page_limit: page_limit.max(1),
            http_timeout: Duration::from_secs(http_timeout_secs.max(1)),
            destination,
            aws_region: get("AWS_REGION"),
            aws_endpoint_url: get("AWS_ENDPOINT_URL"),
            check_interval: Duration::from_secs(check_interval_secs.max(60)),
            metrics_port,
        })
    }

    /// Products endpoint. Credentials travel as basic auth, not in the URL.
    pub fn catalog_url(&self) -> String {
        format!("{}/admin/api/{}/products.json", self.base_url, self.api_version)
    }
}

impl fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifierConfig")
            .field("api_key", &"<redacted>")
            .field("api_password", &"<redacted>")
            .field("domain", &self.domain)
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("threshold", &self.threshold)
            .field("page_limit", &self.page_limit)
            .field("http_timeout", &self.http_timeout)
            .field("destination", &self.destination)
            .field("aws_region", &self.aws_region)
            .field("aws_endpoint_url", &self.aws_endpoint_url)
            .field("check_interval", &self.check_interval)
            .field("metrics_port", &self.metrics_port)
            .finish()
    }
}
