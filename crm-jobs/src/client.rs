//! HTTP client for the CRM API as seen by the scheduled jobs.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use crm_catalog::RestockReport;
use crm_core::{Customer, Page};
use crm_order::Order;
use crm_store::app_config::JobsConfig;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::{JobError, JobResult};

/// The API operations the jobs depend on.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn hello(&self) -> JobResult<String>;

    async fn restock_low_stock(&self) -> JobResult<RestockReport>;

    /// Orders with `from <= order_date <= to`; a missing bound is open.
    async fn orders_between(&self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> JobResult<Page<Order>>;

    async fn customers(&self) -> JobResult<Page<Customer>>;
}

#[derive(Deserialize)]
struct HelloBody {
    hello: String,
}

#[derive(Clone)]
pub struct HttpApiClient {
    client: Client,
    base_url: String,
    retries: u32,
}

impl std::fmt::Debug for HttpApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpApiClient")
            .field("base_url", &self.base_url)
            .field("retries", &self.retries)
            .finish_non_exhaustive()
    }
}

impl HttpApiClient {
    pub fn new(config: &JobsConfig) -> JobResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| JobError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            retries: config.retries,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends the request built by `build`, retrying transport failures. HTTP error
    /// statuses are returned as-is and never retried.
    async fn send(&self, build: impl Fn() -> RequestBuilder) -> JobResult<Response> {
        let attempts = self.retries.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match build().send().await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    warn!(attempt, attempts, "API request failed: {}", e);
                    last_error = e.to_string();
                }
            }
        }

        Err(JobError::Transport(last_error))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> JobResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JobError::Status { status: status.as_u16(), body });
        }

        response.json::<T>().await.map_err(|e| JobError::Decode(e.to_string()))
    }
}

/// `/orders` with the date bounds as query parameters.
fn orders_path(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> String {
    // `Z` suffix keeps the timestamps free of characters that need escaping
    let params: Vec<String> = [("order_date_gte", from), ("order_date_lte", to)]
        .into_iter()
        .filter_map(|(key, ts)| ts.map(|ts| format!("{}={}", key, ts.to_rfc3339_opts(SecondsFormat::Secs, true))))
        .collect();

    if params.is_empty() {
        "/orders".to_string()
    } else {
        format!("/orders?{}", params.join("&"))
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    #[instrument(skip(self))]
    async fn hello(&self) -> JobResult<String> {
        let url = self.url("/hello");
        let response = self.send(|| self.client.get(&url)).await?;
        let body: HelloBody = Self::decode(response).await?;
        Ok(body.hello)
    }

    #[instrument(skip(self))]
    async fn restock_low_stock(&self) -> JobResult<RestockReport> {
        let url = self.url("/products/restock");
        let response = self.send(|| self.client.post(&url)).await?;
        Self::decode(response).await
    }

    #[instrument(skip(self))]
    async fn orders_between(&self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> JobResult<Page<Order>> {
        let url = self.url(&orders_path(from, to));
        debug!(%url, "Fetching orders");
        let response = self.send(|| self.client.get(&url)).await?;
        Self::decode(response).await
    }

    #[instrument(skip(self))]
    async fn customers(&self) -> JobResult<Page<Customer>> {
        let url = self.url("/customers");
        let response = self.send(|| self.client.get(&url)).await?;
        Self::decode(response).await
    }
}
