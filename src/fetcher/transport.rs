//! Single-attempt HTTP access to the owners endpoint
//!
//! Endpoint: {base_url}/erc20/{token_address}/owners
//! Query: chain, limit, order, cursor (omitted on the first page)
//! Auth: `X-API-Key` header

use super::error::TransportError;
use crate::config::{HarvestConfig, SortOrder};
use crate::holders::HolderPage;
use async_trait::async_trait;
use reqwest::{header::ACCEPT, StatusCode};

/// One request for one page, no retries
#[async_trait]
pub trait PageTransport: Send + Sync {
    async fn request_page(&self, cursor: Option<&str>) -> Result<HolderPage, TransportError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    api_key: String,
    chain: String,
    page_size: u32,
    order: SortOrder,
}

impl HttpTransport {
    pub fn new(config: &HarvestConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            url: config.owners_url(),
            api_key: config.api_key.clone(),
            chain: config.chain.clone(),
            page_size: config.page_size,
            order: config.order,
        })
    }
}

#[async_trait]
impl PageTransport for HttpTransport {
    async fn request_page(&self, cursor: Option<&str>) -> Result<HolderPage, TransportError> {
        let mut query: Vec<(&str, String)> = vec![
            ("chain", self.chain.clone()),
            ("limit", self.page_size.to_string()),
            ("order", self.order.as_str().to_string()),
        ];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }

        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .header("X-API-Key", &self.api_key)
            .query(&query)
            .send()
            .await
            .map_err(TransportError::from_reqwest)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TransportError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                code: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(TransportError::from_reqwest)?;
        serde_json::from_slice::<HolderPage>(&bytes).map_err(|e| TransportError::Decode(e.to_string()))
    }
}
