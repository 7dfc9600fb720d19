use crate::{CapacityError, PageFetcher};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<HttpFetcher, CapacityError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(CapacityError::HttpClient)?;
        Ok(HttpFetcher { client })
    }
}

fn fetch_error(url: &str, source: reqwest::Error) -> CapacityError {
    if source.is_timeout() {
        CapacityError::FetchTimeout {
            url: url.to_string(),
        }
    } else {
        CapacityError::FetchFailed {
            url: url.to_string(),
            source,
        }
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, CapacityError> {
        debug!("Visit {}", url);
        let html = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| fetch_error(url, e))?
            .text()
            .await
            .map_err(|e| fetch_error(url, e))?;
        debug!("Fetched {} bytes from {}", html.len(), url);
        Ok(html)
    }
}
