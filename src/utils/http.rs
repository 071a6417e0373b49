//! HTTP transport shared by all source adapters.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::{FetchError, Result};
use crate::models::HttpConfig;

/// Fetches the body of a URL as text.
///
/// Implementations must be stateless across requests: no cookies or
/// sessions carried from one source to another.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_text(&self, url: &Url, timeout: Duration)
    -> std::result::Result<String, FetchError>;
}

/// Create a configured asynchronous HTTP client.
///
/// No cookie store and no idle connection pool, so nothing survives
/// between aggregation runs.
pub fn create_async_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .pool_max_idle_per_host(0)
        .build()?;
    Ok(client)
}

/// [`Transport`] backed by `reqwest`.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_text(
        &self,
        url: &Url,
        timeout: Duration,
    ) -> std::result::Result<String, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}
