use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;

use crate::app::{MimicError, Result};
use crate::fetcher::Transport;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn retrieve(&self, url: &str, user_agent: &str) -> Result<String> {
        let user_agent = HeaderValue::from_str(user_agent)
            .map_err(|e| MimicError::Transport(format!("Invalid user agent header: {}", e)))?;

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, user_agent)
            .header(ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await?;

        response.error_for_status_ref()?;

        Ok(response.text().await?)
    }
}
