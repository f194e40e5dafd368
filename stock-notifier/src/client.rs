use reqwest::header::{ACCEPT, LINK};
use reqwest::{Client, Url};
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::NotifierConfig;
use crate::error::CatalogError;

#[derive(Clone)]
pub struct CatalogClient {
    client: Client,
    url: String,
    api_key: String,
    api_password: String,
    page_limit: u32,
}

impl CatalogClient {
    pub fn new(config: &NotifierConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|err| CatalogError::ClientBuild(err.to_string()))?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &NotifierConfig) -> Self {
        Self {
            client,
            url: config.catalog_url(),
            api_key: config.api_key.clone(),
            api_password: config.api_password.clone(),
            page_limit: config.page_limit.max(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetches the catalog, following `rel="next"` links up to the page limit.
    pub async fn fetch(&self) -> Result<Catalog, CatalogError> {
        let mut catalog = Catalog::default();
        let mut next = Some(self.url.clone());
        let mut pages = 0u32;

        while let Some(url) = next.take() {
            let response = self
                .client
                .get(&url)
                .basic_auth(&self.api_key, Some(&self.api_password))
                .header(ACCEPT, "application/json")
                .send()
                .await
                .map_err(|err| CatalogError::Transport(err.to_string()))?;

            if !response.status().is_success() {
                return Err(CatalogError::Status {
                    status: response.status().as_u16(),
                    url,
                });
            }

            let link = response
                .headers()
                .get(LINK)
                .and_then(|value| value.to_str().ok())
                .and_then(next_page_url);

            let page: Catalog = response
                .json()
                .await
                .map_err(|err| CatalogError::Decode(err.to_string()))?;
            pages += 1;
            debug!(page = pages, products = page.products.len(), "Fetched catalog page");
            catalog.merge(page);

            if pages >= self.page_limit {
                if link.is_some() {
                    info!(pages, "Catalog has more pages than CATALOG_PAGE_LIMIT; stopping");
                }
                break;
            }
            next = match link {
                Some(link) if same_origin(&self.url, &link) => Some(link),
                Some(link) => {
                    warn!(next = %link, "Next catalog page is on another origin; not following");
                    None
                }
                None => None,
            };
        }

        Ok(catalog)
    }
}

/// Credentials are only sent back to the scheme, host and port of the first request.
fn same_origin(base: &str, candidate: &str) -> bool {
    match (Url::parse(base), Url::parse(candidate)) {
        (Ok(base), Ok(candidate)) => {
            base.scheme() == candidate.scheme()
                && base.host_str() == candidate.host_str()
                && base.port_or_known_default() == candidate.port_or_known_default()
        }
        _ => false,
    }
}

/// Extracts the `rel="next"` target from an RFC 8288 `Link` header.
pub fn next_page_url(header: &str) -> Option<String> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let url = target.strip_prefix('<')?.strip_suffix('>')?;
        let is_next = parts.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        is_next.then(|| url.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_next_relation_only() {
        let header = "<https://acme.myshopify.com/admin/api/2022-04/products.json?page_info=abc>; rel=\"previous\", \
                      <https://acme.myshopify.com/admin/api/2022-04/products.json?page_info=def>; rel=\"next\"";
        assert_eq!(
            next_page_url(header).as_deref(),
            Some("https://acme.myshopify.com/admin/api/2022-04/products.json?page_info=def")
        );
    }

    #[test]
    fn origin_comparison() {
        let base = "https://acme.myshopify.com/admin/api/2022-04/products.json";
        assert!(same_origin(base, "https://acme.myshopify.com/admin/api/2022-04/products.json?page_info=x"));
        assert!(same_origin(base, "https://acme.myshopify.com:443/next"));
        assert!(!same_origin(base, "https://evil.example.com/admin/api/2022-04/products.json"));
        assert!(!same_origin(base, "http://acme.myshopify.com/next"));
        assert!(!same_origin(base, "https://acme.myshopify.com:8443/next"));
        assert!(!same_origin(base, "/relative/only"));
    }

    #[test]
    fn no_next_relation() {
        assert_eq!(next_page_url("<https://x/y>; rel=\"previous\""), None);
        assert_eq!(next_page_url("garbage"), None);
        assert_eq!(next_page_url(""), None);
    }
}
