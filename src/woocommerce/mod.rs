pub mod provider;
pub mod raw;

pub use provider::WooCommerceProvider;
pub use raw::{RawBilling, RawLineItem, RawMeta, RawOrder, RawShipping, RawShippingLine};

use thiserror::Error;

/// One response from the paginated orders collection.
#[derive(Debug)]
pub enum RemotePage {
    /// 2xx with a decoded body; an empty vec marks the end of the collection.
    Orders(Vec<RawOrder>),
    /// The server answered with a non-2xx status.
    Rejected {
        status: u16,
        reason: String,
        body: String,
    },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("orders page {page}: transport error: {source}")]
    Transport {
        page: u32,
        #[source]
        source: reqwest::Error,
    },
    #[error("orders page {page}: malformed response body: {source}")]
    Decode {
        page: u32,
        #[source]
        source: serde_json::Error,
    },
}

/// Paginated source of raw order documents. Pages are 1-based.
#[async_trait::async_trait]
pub trait OrderSource: Send + Sync {
    async fn fetch_page(&self, page: u32, per_page: u32) -> Result<RemotePage, FetchError>;
}
