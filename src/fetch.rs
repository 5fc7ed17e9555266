use reqwest::blocking::Client;
use tracing::{error, info};

use crate::error::{PipelineError, Result};

/// Anything that can hand back the raw HTML behind a URL.
pub trait PageSource {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// One blocking GET per call. No retries and no explicit timeout.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| PipelineError::fetch("<client>", e))?;
        Ok(Self { client })
    }
}

impl PageSource for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        info!("Fetching page: {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                error!("Failed to fetch the page: {}", e);
                PipelineError::fetch(url, e)
            })?;

        let body = response
            .text()
            .map_err(|e| PipelineError::fetch(url, format!("unreadable body: {}", e)))?;
        info!("Fetched {} bytes", body.len());
        Ok(body)
    }
}
