//! HTTP fetch adapter.
//!
//! The scraper only needs three capabilities from the network: GET a page,
//! POST a form, and GET raw bytes for pictures. Tests swap in an in-memory
//! implementation.

use std::time::Duration;

use tracing::debug;

use crate::error::{Result, ScrapeError};

#[allow(async_fn_in_trait)]
pub trait Fetcher {
    async fn get_text(&self, url: &str) -> Result<String>;

    async fn post_form(&self, url: &str, fields: &[(String, String)]) -> Result<String>;

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|source| ScrapeError::Http {
            url: String::new(),
            source,
        })?;
        Ok(Self { client })
    }

    async fn send(&self, url: &str, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(|source| ScrapeError::Http {
            url: url.to_string(),
            source,
        })?;

        if !response.status().is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }
        Ok(response)
    }
}

impl Fetcher for HttpFetcher {
    async fn get_text(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let request = self.client.get(url).header("Accept", "text/html");
        let response = self.send(url, request).await?;
        response.text().await.map_err(|source| ScrapeError::Http {
            url: url.to_string(),
            source,
        })
    }

    async fn post_form(&self, url: &str, fields: &[(String, String)]) -> Result<String> {
        debug!("POST {} fields={:?}", url, fields);
        let request = self
            .client
            .post(url)
            .header("Accept", "text/html")
            .form(fields);
        let response = self.send(url, request).await?;
        response.text().await.map_err(|source| ScrapeError::Http {
            url: url.to_string(),
            source,
        })
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        debug!("GET {} (bytes)", url);
        let response = self.send(url, self.client.get(url)).await?;
        let bytes = response.bytes().await.map_err(|source| ScrapeError::Http {
            url: url.to_string(),
            source,
        })?;
        Ok(bytes.to_vec())
    }
}
