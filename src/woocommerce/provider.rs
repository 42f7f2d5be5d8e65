use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::{FetchError, OrderSource, RawOrder, RemotePage};

fn truncate_for_log(mut s: String, max_len: usize) -> String {
    if s.len() > max_len {
        let mut cut = max_len;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push('…');
    }
    s
}

fn basic_auth_header(consumer_key: &str, consumer_secret: &str) -> Result<HeaderValue> {
    let token = STANDARD.encode(format!("{consumer_key}:{consumer_secret}"));
    let mut value = HeaderValue::from_str(&format!("Basic {token}"))
        .map_err(|e| anyhow!("invalid WooCommerce credentials header: {e}"))?;
    value.set_sensitive(true);
    Ok(value)
}

/// WooCommerce REST v3 orders collection client.
///
/// Every request carries HTTP Basic credentials built from the store's
/// consumer key/secret pair. Requests are `GET <orders_url>?per_page=N&page=P`
/// and the response body is a JSON array of orders.
#[derive(Debug, Clone)]
pub struct WooCommerceProvider {
    orders_url: String,
    http: Client,
}

impl WooCommerceProvider {
    pub fn new(
        orders_url: &str,
        consumer_key: &str,
        consumer_secret: &str,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        let orders_url = orders_url.trim().trim_end_matches('/').to_string();
        url::Url::parse(&orders_url).map_err(|e| anyhow!("invalid orders url {orders_url}: {e}"))?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, basic_auth_header(consumer_key, consumer_secret)?);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .user_agent(concat!("wc-order-sync/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(timeout_secs.unwrap_or(30)))
            .default_headers(headers)
            .build()?;

        Ok(Self { orders_url, http })
    }

    pub fn orders_url(&self) -> &str {
        &self.orders_url
    }
}

#[async_trait::async_trait]
impl OrderSource for WooCommerceProvider {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<RemotePage, FetchError> {
        let resp = self
            .http
            .get(&self.orders_url)
            .query(&[("per_page", per_page), ("page", page)])
            .send()
            .await
            .map_err(|source| FetchError::Transport { page, source })?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|source| FetchError::Transport { page, source })?;
        debug!(page, status = status.as_u16(), bytes = body.len(), "orders page received");

        if !status.is_success() {
            return Ok(RemotePage::Rejected {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                body: truncate_for_log(body, 2000),
            });
        }

        let orders: Vec<RawOrder> =
            serde_json::from_str(&body).map_err(|source| FetchError::Decode { page, source })?;
        Ok(RemotePage::Orders(orders))
    }
}
