//! HTTP fetching for remote repo metadata
//!
//! DLRN hash lookups, compose metadata, and `--down-url` repo files are all
//! small GET requests against public mirrors. One blocking client with a
//! short timeout covers every caller.

use std::time::Duration;

use log::debug;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

const HTTP_TIMEOUT_SECS: u64 = 30;
const HTTP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Blocking HTTP client shared by every remote lookup.
pub struct Fetcher {
    client: reqwest::blocking::Client,
}

impl Fetcher {
    /// Create a fetcher with the default timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns an error when the TLS backend fails to initialize.
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent(HTTP_USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// GET a URL and return the response body as text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedStatus`] for any non-2xx response, so a
    /// mirror's HTML error page is never mistaken for repo metadata.
    pub fn fetch_text(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text()?)
    }

    /// GET a URL and deserialize the body as YAML.
    pub fn fetch_yaml<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.fetch_text(url)?;
        Ok(serde_yaml::from_str(&body)?)
    }

    /// GET a URL and deserialize the body as JSON.
    pub fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.fetch_text(url)?;
        Ok(serde_json::from_str(&body)?)
    }
}
